//! HTML pages for the browser upload flow.
use std::fmt::Write;

use crate::pipeline::ResumeOutcome;

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:60rem}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #ccc;padding:.4rem .6rem;text-align:left}\
.error{color:#b00020}";

pub fn index_page() -> String {
    page(
        "Resume Matcher",
        r#"<h1>Resume Matcher</h1>
<form action="/upload" method="post" enctype="multipart/form-data">
  <p><label>Job description <input type="file" name="job_description" required></label></p>
  <p><label>Resumes <input type="file" name="resumes" multiple required></label></p>
  <p><button type="submit">Match</button></p>
</form>"#,
    )
}

pub fn results_page(job_name: &str, outcomes: &[ResumeOutcome], snapshot: Option<&str>) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        "<h1>Results</h1>\n<p>Job description: <strong>{}</strong></p>\n\
         <table>\n<tr><th>Candidate</th><th>Similarity (%)</th><th>Skills</th><th>Suitability</th></tr>\n",
        escape(job_name)
    );

    for outcome in outcomes {
        match outcome {
            ResumeOutcome::Scored(result) => {
                let _ = writeln!(
                    body,
                    "<tr><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td></tr>",
                    escape(&result.name),
                    result.similarity,
                    escape(&result.skills.joined()),
                    result.suitability
                );
            }
            ResumeOutcome::Failed { name, error } => {
                let _ = writeln!(
                    body,
                    "<tr class=\"error\"><td>{}</td><td colspan=\"3\">{}</td></tr>",
                    escape(name),
                    escape(&error.to_string())
                );
            }
        }
    }
    body.push_str("</table>\n");

    if let Some(href) = snapshot {
        let _ = writeln!(body, "<p><a href=\"{}\">Download CSV</a></p>", escape(href));
    }
    body.push_str("<p><a href=\"/\">Match again</a></p>");

    page("Resume Matcher: Results", &body)
}

pub fn error_page(message: &str) -> String {
    page(
        "Resume Matcher: Error",
        &format!(
            "<h1>Could not match</h1>\n<p class=\"error\">{}</p>\n\
             <p><a href=\"/\">Back to the upload form</a></p>",
            escape(message)
        ),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ItemError, ScoreResult};
    use crate::scoring::Suitability;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn test_error_page_escapes_message() {
        let html = error_page("bad <input>");
        assert!(html.contains("<p class=\"error\">bad &lt;input&gt;</p>"));
        assert!(html.contains("href=\"/\""));
    }

    #[test]
    fn test_results_page_rows() {
        let outcomes = vec![
            ResumeOutcome::Scored(ScoreResult {
                name: "<b>jane</b>.pdf".to_string(),
                similarity: 81.5,
                skills: ["Rust"].into_iter().collect(),
                suitability: Suitability::HighlySuitable,
            }),
            ResumeOutcome::Failed {
                name: "bob.pdf".to_string(),
                error: ItemError::Staging(std::io::Error::other("disk full")),
            },
        ];
        let html = results_page("job.txt", &outcomes, Some("/download/ranked_candidates.csv"));

        assert!(html.contains("&lt;b&gt;jane&lt;/b&gt;.pdf"));
        assert!(html.contains("<td>81.50</td>"));
        assert!(html.contains("Highly Suitable"));
        assert!(html.contains("failed to stage upload: disk full"));
        assert!(html.contains("/download/ranked_candidates.csv"));
    }

    #[test]
    fn test_index_page_form_fields() {
        let html = index_page();
        assert!(html.contains("name=\"job_description\""));
        assert!(html.contains("name=\"resumes\" multiple"));
    }
}
