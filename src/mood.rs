//! Mood labels: the discrete, human-facing categories that drive playlist
//! generation. Exactly one label comes out of each pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of playlist moods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoodLabel {
    Happy,
    Sad,
    Angry,
    Excited,
    Peaceful,
    Neutral,
    Calm,
    Romantic,
    Nostalgic,
    Confident,
    Dreamy,
    Energetic,
    Melancholic,
    Hopeful,
    Determined,
    Relaxed,
    Nervous,
    Triumphant,
    Mysterious,
    Passionate,
    Rebellious,
    Soulful,
    Fierce,
    Euphoric,
    Contemplative,
    Empowered,
}

impl MoodLabel {
    pub const ALL: [MoodLabel; 26] = [
        MoodLabel::Happy,
        MoodLabel::Sad,
        MoodLabel::Angry,
        MoodLabel::Excited,
        MoodLabel::Peaceful,
        MoodLabel::Neutral,
        MoodLabel::Calm,
        MoodLabel::Romantic,
        MoodLabel::Nostalgic,
        MoodLabel::Confident,
        MoodLabel::Dreamy,
        MoodLabel::Energetic,
        MoodLabel::Melancholic,
        MoodLabel::Hopeful,
        MoodLabel::Determined,
        MoodLabel::Relaxed,
        MoodLabel::Nervous,
        MoodLabel::Triumphant,
        MoodLabel::Mysterious,
        MoodLabel::Passionate,
        MoodLabel::Rebellious,
        MoodLabel::Soulful,
        MoodLabel::Fierce,
        MoodLabel::Euphoric,
        MoodLabel::Contemplative,
        MoodLabel::Empowered,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MoodLabel::Happy => "Happy",
            MoodLabel::Sad => "Sad",
            MoodLabel::Angry => "Angry",
            MoodLabel::Excited => "Excited",
            MoodLabel::Peaceful => "Peaceful",
            MoodLabel::Neutral => "Neutral",
            MoodLabel::Calm => "Calm",
            MoodLabel::Romantic => "Romantic",
            MoodLabel::Nostalgic => "Nostalgic",
            MoodLabel::Confident => "Confident",
            MoodLabel::Dreamy => "Dreamy",
            MoodLabel::Energetic => "Energetic",
            MoodLabel::Melancholic => "Melancholic",
            MoodLabel::Hopeful => "Hopeful",
            MoodLabel::Determined => "Determined",
            MoodLabel::Relaxed => "Relaxed",
            MoodLabel::Nervous => "Nervous",
            MoodLabel::Triumphant => "Triumphant",
            MoodLabel::Mysterious => "Mysterious",
            MoodLabel::Passionate => "Passionate",
            MoodLabel::Rebellious => "Rebellious",
            MoodLabel::Soulful => "Soulful",
            MoodLabel::Fierce => "Fierce",
            MoodLabel::Euphoric => "Euphoric",
            MoodLabel::Contemplative => "Contemplative",
            MoodLabel::Empowered => "Empowered",
        }
    }

    /// Neutral is valid everywhere else but too vague to name or search a
    /// playlist by, so playlists use Peaceful instead.
    #[must_use]
    pub const fn for_playlist(self) -> MoodLabel {
        match self {
            MoodLabel::Neutral => MoodLabel::Peaceful,
            other => other,
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown mood '{0}'")]
pub struct UnknownMood(pub String);

/// Case-insensitive: `"sad"`, `"SAD"` and `"Sad"` all parse.
impl FromStr for MoodLabel {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        MoodLabel::ALL
            .into_iter()
            .find(|mood| mood.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownMood(trimmed.to_string()))
    }
}
