//! Skill keyword dictionary and substring-based extraction.
//!
//! Matching is plain case-insensitive containment of each dictionary entry in
//! the text, with no word-boundary check: `"go"` also matches inside
//! `"google"`. Richer matchers can replace [`SkillDictionary`] behind the
//! [`SkillExtractor`] trait.
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::info;

use crate::normalizer::clean_text;

/// Errors raised while loading the skill dictionary.
#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("failed to read skill dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid skill dictionary {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("skill dictionary entry #{index} is empty")]
    EmptyEntry { index: usize },

    #[error("skill dictionary entry #{index} ({name:?}) has no matchable text after cleaning")]
    Unmatchable { index: usize, name: String },
}

/// Extracts known skills from a text.
pub trait SkillExtractor: Send + Sync {
    fn extract(&self, text: &str) -> SkillSet;

    /// Number of skills the extractor knows about.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deduplicated set of skill names, ordered for stable rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillSet(BTreeSet<String>);

impl SkillSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, skill: impl Into<String>) -> bool {
        self.0.insert(skill.into())
    }

    /// Case-insensitive membership test.
    #[must_use]
    pub fn contains(&self, skill: &str) -> bool {
        let wanted = skill.to_lowercase();
        self.0.iter().any(|s| s.to_lowercase() == wanted)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Skills joined with `", "`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.iter().collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for SkillSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl Serialize for SkillSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<S: Into<String>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone)]
struct Skill {
    name: String,
    needle: String,
}

/// Static list of known skills, loaded once at startup.
#[derive(Debug, Clone)]
pub struct SkillDictionary {
    skills: Vec<Skill>,
}

impl SkillDictionary {
    /// Build a dictionary from skill names.
    ///
    /// Names are trimmed and an empty name is rejected, as is a name that
    /// cleans down to nothing. Names that clean to the same text (case,
    /// spacing, stripped punctuation) collapse into the first spelling seen.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut skills = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let name = entry.as_ref().trim();
            if name.is_empty() {
                return Err(DictionaryError::EmptyEntry { index });
            }
            // Same cleaning as document text, so punctuation and spacing agree
            let needle = clean_text(name);
            if needle.is_empty() {
                return Err(DictionaryError::Unmatchable {
                    index,
                    name: name.to_string(),
                });
            }
            if seen.insert(needle.clone()) {
                skills.push(Skill {
                    name: name.to_string(),
                    needle,
                });
            }
        }

        Ok(Self { skills })
    }

    /// Parse a JSON array of strings.
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self, DictionaryError> {
        let entries: Vec<String> =
            serde_json::from_str(json).map_err(|source| DictionaryError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::from_entries(entries)
    }

    /// Load the dictionary file at `path`.
    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        let json = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dictionary = Self::from_json_str(&json, path)?;
        info!(
            "Loaded {} skills from {}",
            dictionary.skills.len(),
            path.display()
        );
        Ok(dictionary)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.name.as_str())
    }
}

impl SkillExtractor for SkillDictionary {
    fn extract(&self, text: &str) -> SkillSet {
        if text.is_empty() {
            return SkillSet::new();
        }
        let haystack = clean_text(text);
        self.skills
            .iter()
            .filter(|skill| haystack.contains(&skill.needle))
            .map(|skill| skill.name.as_str())
            .collect()
    }

    fn len(&self) -> usize {
        self.skills.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary(entries: &[&str]) -> SkillDictionary {
        SkillDictionary::from_entries(entries).unwrap()
    }

    #[test]
    fn test_extract_known_skills() {
        let dict = dictionary(&["Python", "SQL", "Java"]);
        let found = dict.extract("I know Python and SQL well");
        let expected: SkillSet = ["Python", "SQL"].into_iter().collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_extract_empty_text() {
        let dict = dictionary(&["Python", "SQL"]);
        assert!(dict.extract("").is_empty());
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        let dict = dictionary(&["JavaScript", "AWS"]);
        let found = dict.extract("javascript on aws lambda");
        assert_eq!(found.joined(), "AWS, JavaScript");
    }

    #[test]
    fn test_substring_without_word_boundary() {
        let dict = dictionary(&["Go"]);
        assert!(dict.extract("worked at google").contains("go"));
    }

    #[test]
    fn test_symbol_skills() {
        let dict = dictionary(&["C++", "C#", "Node.js", "CI/CD"]);
        let found = dict.extract("c++ and c# services on node.js with ci/cd");
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_duplicate_entries_collapse() {
        let dict = dictionary(&["Python", "python", " PYTHON "]);
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.names().collect::<Vec<_>>(), vec!["Python"]);
        assert_eq!(dict.extract("python python").len(), 1);
    }

    #[test]
    fn test_empty_entry_rejected() {
        let err = SkillDictionary::from_entries(["Rust", "  "]).unwrap_err();
        assert!(matches!(err, DictionaryError::EmptyEntry { index: 1 }));
    }

    #[test]
    fn test_entries_cleaned_like_documents() {
        let dict = dictionary(&["R&D", "Power BI (DAX)", "Machine  Learning"]);
        let text = crate::normalizer::clean_text(
            "Led R&D; built Power BI (DAX) reports and machine learning models.",
        );
        assert_eq!(dict.extract(&text).len(), 3);
        assert_eq!(dict.extract("machine\nlearning").joined(), "Machine  Learning");
    }

    #[test]
    fn test_symbol_only_entry_rejected() {
        let err = SkillDictionary::from_entries(["Rust", "&&"]).unwrap_err();
        assert!(matches!(err, DictionaryError::Unmatchable { index: 1, .. }));
    }

    #[test]
    fn test_contains_is_unicode_case_insensitive() {
        let set: SkillSet = ["Ölçme", "SQL"].into_iter().collect();
        assert!(set.contains("ÖLÇME"));
        assert!(set.contains("sql"));
        assert!(!set.contains("rust"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skills.json");
        std::fs::write(&path, r#"["Rust", "Docker", "Kubernetes"]"#).unwrap();

        let dict = SkillDictionary::load(&path).unwrap();
        assert_eq!(dict.len(), 3);
        assert!(dict.extract("rust services in docker").contains("Docker"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SkillDictionary::load(Path::new("/nonexistent/skills.json")).unwrap_err();
        assert!(matches!(err, DictionaryError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skills.json");
        std::fs::write(&path, r#"{"skills": "Rust"}"#).unwrap();
        let err = SkillDictionary::load(&path).unwrap_err();
        assert!(matches!(err, DictionaryError::Parse { .. }));
    }

    #[test]
    fn test_skill_set_serializes_joined() {
        let set: SkillSet = ["SQL", "Python"].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), "\"Python, SQL\"");
        assert_eq!(SkillSet::new().to_string(), "");
    }
}
