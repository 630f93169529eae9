//! # Emotion Scores
//!
//! Raw classifier output and the normalizer that prepares it for mood
//! resolution.
//!
//! A classifier reports one confidence (0-100) per [`EmotionCategory`]. The
//! values are not guaranteed to sum to 100, and "neutral" tends to soak up
//! confidence that belongs to a more informative category. [`EmotionScores::normalize`]
//! drops neutral unless it dominates and rescales the rest to 100.
//!
//! ```
//! use moodlist::emotion::{EmotionCategory, EmotionScores};
//!
//! let raw: EmotionScores = "happy=85,sad=5,angry=3,neutral=7".parse()?;
//! let normalized = raw.normalize();
//!
//! assert!(normalized.get(EmotionCategory::Neutral).is_none());
//! assert!((normalized.total() - 100.0).abs() < 1e-9);
//! # Ok::<(), moodlist::emotion::ParseScoresError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raw emotion category as reported by a face-expression classifier.
///
/// Declaration order doubles as the tie-break order when two categories have
/// the same confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionCategory {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl EmotionCategory {
    pub const ALL: [EmotionCategory; 7] = [
        EmotionCategory::Angry,
        EmotionCategory::Disgust,
        EmotionCategory::Fear,
        EmotionCategory::Happy,
        EmotionCategory::Sad,
        EmotionCategory::Surprise,
        EmotionCategory::Neutral,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EmotionCategory::Angry => "angry",
            EmotionCategory::Disgust => "disgust",
            EmotionCategory::Fear => "fear",
            EmotionCategory::Happy => "happy",
            EmotionCategory::Sad => "sad",
            EmotionCategory::Surprise => "surprise",
            EmotionCategory::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionCategory {
    type Err = ParseScoresError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        EmotionCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| ParseScoresError::UnknownCategory(s.trim().to_string()))
    }
}

/// Error returned when a textual score list cannot be parsed.
#[derive(Debug, Error, PartialEq)]
pub enum ParseScoresError {
    #[error("unknown emotion category '{0}'")]
    UnknownCategory(String),
    #[error("expected 'category=score', got '{0}'")]
    MalformedPair(String),
    #[error("invalid score '{value}' for {category}")]
    InvalidScore { category: String, value: String },
}

/// Confidence per emotion category.
///
/// Scores are always finite and non-negative; anything else is clamped to
/// zero on construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<EmotionCategory, f64>", into = "BTreeMap<EmotionCategory, f64>")]
pub struct EmotionScores {
    scores: BTreeMap<EmotionCategory, f64>,
}

impl EmotionScores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence for one category, clamping invalid values to zero.
    pub fn insert(&mut self, category: EmotionCategory, score: f64) {
        self.scores.insert(category, sanitize(score));
    }

    #[must_use]
    pub fn get(&self, category: EmotionCategory) -> Option<f64> {
        self.scores.get(&category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionCategory, f64)> + '_ {
        self.scores.iter().map(|(category, score)| (*category, *score))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.scores.values().sum()
    }

    /// True when at least one category carries a positive confidence.
    #[must_use]
    pub fn has_signal(&self) -> bool {
        self.scores.values().any(|score| *score > 0.0)
    }

    #[must_use]
    pub fn max_score(&self) -> f64 {
        self.scores.values().copied().fold(0.0, f64::max)
    }

    /// Categories ordered by confidence, highest first.
    ///
    /// The sort is stable over [`EmotionCategory`] declaration order, so equal
    /// confidences always come out in the same order for the same input.
    #[must_use]
    pub fn ranked(&self) -> Vec<(EmotionCategory, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// Drop "neutral" unless it is the strongest category, then rescale the
    /// remaining categories so they sum to 100.
    ///
    /// The input comes back unchanged when neutral is (or ties for) the
    /// maximum, and when nothing but neutral carries any confidence.
    #[must_use]
    pub fn normalize(&self) -> EmotionScores {
        if let Some(neutral) = self.get(EmotionCategory::Neutral) {
            if neutral >= self.max_score() {
                log::trace!("Neutral dominates ({neutral:.2}), keeping scores as-is");
                return self.clone();
            }
        }

        let remaining: f64 = self
            .iter()
            .filter(|(category, _)| *category != EmotionCategory::Neutral)
            .map(|(_, score)| score)
            .sum();

        if remaining <= 0.0 {
            return self.clone();
        }

        let scores = self
            .iter()
            .filter(|(category, _)| *category != EmotionCategory::Neutral)
            .map(|(category, score)| (category, score / remaining * 100.0))
            .collect();

        EmotionScores { scores }
    }
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

impl From<BTreeMap<EmotionCategory, f64>> for EmotionScores {
    fn from(raw: BTreeMap<EmotionCategory, f64>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<EmotionScores> for BTreeMap<EmotionCategory, f64> {
    fn from(scores: EmotionScores) -> Self {
        scores.scores
    }
}

impl FromIterator<(EmotionCategory, f64)> for EmotionScores {
    fn from_iter<I: IntoIterator<Item = (EmotionCategory, f64)>>(iter: I) -> Self {
        let mut scores = EmotionScores::new();
        for (category, score) in iter {
            scores.insert(category, score);
        }
        scores
    }
}

/// Parses `happy=85,sad=5,neutral=10`. Whitespace around items is ignored.
impl FromStr for EmotionScores {
    type Err = ParseScoresError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| -> Result<(EmotionCategory, f64), ParseScoresError> {
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| ParseScoresError::MalformedPair(pair.to_string()))?;
                let category = name.parse::<EmotionCategory>()?;
                let score = value.trim().parse::<f64>().map_err(|_| ParseScoresError::InvalidScore {
                    category: category.to_string(),
                    value: value.trim().to_string(),
                })?;
                Ok((category, score))
            })
            .collect()
    }
}

impl fmt::Display for EmotionScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .ranked()
            .into_iter()
            .map(|(category, score)| format!("{category}: {score:.2}"))
            .collect();
        f.write_str(&rendered.join(", "))
    }
}
