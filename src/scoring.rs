/// Similarity scoring and suitability classification.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Cosine similarity between two embedding vectors.
///
/// Returns exactly `0.0` when either vector has zero magnitude, or when the
/// vectors are empty or of different lengths. Accumulates in `f64` and clamps
/// the result to `[-1, 1]`.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Ordinal suitability label derived from a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suitability {
    #[serde(rename = "Low Fit")]
    LowFit,
    #[serde(rename = "Moderately Suitable")]
    ModeratelySuitable,
    #[serde(rename = "Highly Suitable")]
    HighlySuitable,
}

impl Suitability {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::HighlySuitable => "Highly Suitable",
            Self::ModeratelySuitable => "Moderately Suitable",
            Self::LowFit => "Low Fit",
        }
    }
}

impl fmt::Display for Suitability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

fn default_highly_suitable() -> f64 {
    0.8
}

fn default_moderately_suitable() -> f64 {
    0.6
}

/// Inclusive lower bounds for the two upper suitability bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_highly_suitable")]
    pub highly_suitable: f64,

    #[serde(default = "default_moderately_suitable")]
    pub moderately_suitable: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            highly_suitable: default_highly_suitable(),
            moderately_suitable: default_moderately_suitable(),
        }
    }
}

impl Thresholds {
    /// Map a score to its band. Total over all inputs, NaN included (→ `LowFit`).
    #[must_use]
    pub fn classify(&self, score: f64) -> Suitability {
        if score >= self.highly_suitable {
            Suitability::HighlySuitable
        } else if score >= self.moderately_suitable {
            Suitability::ModeratelySuitable
        } else {
            Suitability::LowFit
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.moderately_suitable)
                && (0.0..=1.0).contains(&self.highly_suitable),
            "thresholds must lie in [0, 1]"
        );
        anyhow::ensure!(
            self.moderately_suitable <= self.highly_suitable,
            "thresholds.moderately_suitable must not exceed thresholds.highly_suitable"
        );
        Ok(())
    }
}

/// Classify with the default 0.8 / 0.6 thresholds.
#[must_use]
pub fn classify(score: f64) -> Suitability {
    Thresholds::default().classify(score)
}

/// Scale a `[0, 1]` score to a percentage rounded to two decimals.
#[must_use]
pub fn to_percent(score: f64) -> f64 {
    (score * 10_000.0).round() / 100.0
}
