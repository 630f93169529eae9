//! # Mood Parameter Table
//!
//! Static configuration keyed by [`MoodLabel`]: the seed search terms the
//! Track Finder samples from, plus advisory audio-feature targets and seed
//! genres for recommendation-style catalog calls.
//!
//! Targets are never enforced locally. They are only used to annotate how
//! well a found track fits its mood (see [`MoodProfile::feature_distance`]).
//!
//! Moods without a dedicated entry (for instance [`MoodLabel::Calm`]) fall back
//! to a generic pop profile, so a profile never has empty seed terms.

use crate::catalog::AudioFeatures;
use crate::mood::MoodLabel;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Seed terms and feature hints for one mood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodProfile {
    /// Search keywords, in table order. Never empty.
    pub seed_terms: &'static [&'static str],
    pub seed_genres: &'static [&'static str],
    /// Audio-feature name to target value.
    pub target_features: &'static [(&'static str, f64)],
}

const MID_RANGE: &[(&str, f64)] = &[
    ("valence", 0.5),
    ("energy", 0.5),
    ("danceability", 0.5),
    ("tempo", 100.0),
];

/// Used for any mood without a table entry.
pub const GENERIC_PROFILE: MoodProfile = MoodProfile {
    seed_terms: &[
        "pop", "hits", "popular", "top", "chart", "mainstream", "radio hits", "current hits",
    ],
    seed_genres: &["pop"],
    target_features: MID_RANGE,
};

lazy_static! {
    static ref PROFILES: HashMap<MoodLabel, MoodProfile> = {
        let mut table = HashMap::new();

        table.insert(MoodLabel::Happy, MoodProfile {
            seed_terms: &[
                "dance pop", "happy", "party", "joy", "celebration", "feel good", "upbeat",
                "sunshine", "summer hits", "euphoric", "cheerful", "energetic pop",
                "good vibes", "uplifting", "fun", "disco", "groove", "positive",
            ],
            seed_genres: &["pop", "dance", "happy"],
            target_features: &[("valence", 0.8), ("energy", 0.7), ("danceability", 0.7), ("tempo", 120.0)],
        });
        table.insert(MoodLabel::Sad, MoodProfile {
            seed_terms: &[
                "sad", "ballad", "slow", "melancholy", "heartbreak", "emotional", "sad songs",
                "piano ballad", "acoustic sad", "breakup songs", "lonely", "depression", "dark",
                "emotional ballad", "sad pop", "crying", "tears",
            ],
            seed_genres: &["acoustic", "piano", "sad"],
            target_features: &[
                ("valence", 0.3), ("energy", 0.3), ("danceability", 0.4), ("tempo", 80.0),
                ("acousticness", 0.7), ("instrumentalness", 0.2),
            ],
        });
        table.insert(MoodLabel::Angry, MoodProfile {
            seed_terms: &[
                "rock", "metal", "intense", "rage", "anger", "heavy metal", "hard rock",
                "aggressive", "fury", "powerful", "intense rock", "screamo", "hardcore",
                "angry rock", "rebellion", "protest", "fight",
            ],
            seed_genres: &["rock", "metal", "hard-rock"],
            target_features: &[
                ("valence", 0.3), ("energy", 0.9), ("danceability", 0.5), ("tempo", 130.0),
                ("loudness", -4.0),
            ],
        });
        table.insert(MoodLabel::Excited, MoodProfile {
            seed_terms: &[
                "edm", "dance", "club", "party anthem", "festival", "rave", "electronic", "hype",
                "energy", "bounce", "big room", "dance floor", "club hits", "party music",
                "festival hits", "dance party", "club anthem",
            ],
            seed_genres: &["electronic", "dance"],
            target_features: &[("valence", 0.7), ("energy", 0.8), ("danceability", 0.7)],
        });
        table.insert(MoodLabel::Peaceful, MoodProfile {
            seed_terms: &[
                "ambient", "meditation", "calm", "relaxing", "peaceful music", "zen", "tranquil",
                "serenity", "soft instrumental", "nature sounds", "peaceful piano", "calming",
                "gentle", "soothing", "relaxation",
            ],
            seed_genres: &["indie", "alternative", "ambient"],
            target_features: &[
                ("valence", 0.5), ("energy", 0.5), ("danceability", 0.5), ("tempo", 110.0),
                ("acousticness", 0.5),
            ],
        });
        table.insert(MoodLabel::Romantic, MoodProfile {
            seed_terms: &[
                "love songs", "romantic", "romance", "slow dance", "love ballad", "romantic jazz",
                "romantic piano", "love pop", "romantic evening", "date night", "romantic mood",
                "love theme", "romantic dinner",
            ],
            seed_genres: &["romance", "soul"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Nostalgic, MoodProfile {
            seed_terms: &[
                "oldies", "retro", "vintage", "classic hits", "throwback", "memories",
                "old school", "classic pop", "80s hits", "90s hits", "golden oldies",
                "vintage pop",
            ],
            seed_genres: &["pop"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Confident, MoodProfile {
            seed_terms: &[
                "empowerment", "confidence", "powerful", "strong", "motivation", "success",
                "triumph", "victory", "confident pop", "power anthem", "girl power",
                "empowerment anthem", "success music",
            ],
            seed_genres: &["pop", "hip-hop"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Dreamy, MoodProfile {
            seed_terms: &[
                "dream pop", "ethereal", "atmospheric", "dreamy pop", "shoegaze", "dream wave",
                "ethereal vocals", "dreamy atmosphere", "ambient pop", "dream folk",
            ],
            seed_genres: &["indie", "ambient"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Energetic, MoodProfile {
            seed_terms: &[
                "workout", "running", "gym", "fitness", "cardio", "sports", "training",
                "exercise", "pump up", "motivation", "high energy", "power workout",
            ],
            seed_genres: &["work-out", "dance"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Melancholic, MoodProfile {
            seed_terms: &[
                "indie folk", "alternative", "melancholic pop", "bittersweet", "gentle sadness",
                "soft sad", "indie sad", "alternative sad", "melancholic mood",
            ],
            seed_genres: &["indie", "folk"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Hopeful, MoodProfile {
            seed_terms: &[
                "inspirational", "hope", "optimistic", "uplifting pop", "inspiring",
                "motivational", "encouraging", "bright future", "positive vibes", "hopeful pop",
                "inspiring anthem",
            ],
            seed_genres: &["pop"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Determined, MoodProfile {
            seed_terms: &[
                "motivation", "determination", "perseverance", "strength", "power",
                "achievement", "success", "workout motivation", "determination anthem",
            ],
            seed_genres: &["rock", "hip-hop"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Relaxed, MoodProfile {
            seed_terms: &[
                "lofi", "chill", "laid back", "easy listening", "smooth", "relaxing beats",
                "chill hop", "mellow", "relaxed vibes", "smooth jazz", "chill music",
            ],
            seed_genres: &["chill", "jazz"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Nervous, MoodProfile {
            seed_terms: &[
                "anxiety pop", "alternative rock", "indie rock", "nervous energy", "tense music",
                "fast tempo", "racing thoughts", "heart racing", "panic pop",
            ],
            seed_genres: &["dark", "ambient"],
            target_features: &[("valence", 0.2), ("energy", 0.4), ("danceability", 0.3)],
        });
        table.insert(MoodLabel::Triumphant, MoodProfile {
            seed_terms: &[
                "victory", "triumph", "celebration", "winning", "champion", "success story",
                "achievement", "victorious", "epic", "conquering", "glory",
            ],
            seed_genres: &["soundtracks"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Mysterious, MoodProfile {
            seed_terms: &[
                "dark pop", "mysterious", "enigmatic", "dark ambient", "suspense", "cinematic",
                "mysterious mood", "dark wave", "ethereal dark", "mystical", "supernatural",
            ],
            seed_genres: &["ambient"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Passionate, MoodProfile {
            seed_terms: &[
                "latin pop", "flamenco", "tango", "passionate", "intense love", "deep emotion",
                "passionate dance", "sensual", "intense feeling", "passionate mood",
            ],
            seed_genres: &["latin"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Rebellious, MoodProfile {
            seed_terms: &[
                "punk", "rebel rock", "alternative punk", "rebellion", "protest songs",
                "anarchist", "rebel music", "revolutionary", "defiant", "resistance",
            ],
            seed_genres: &["punk"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Soulful, MoodProfile {
            seed_terms: &[
                "soul", "r&b", "gospel", "blues", "neo soul", "emotional soul", "deep soul",
                "soul jazz", "spiritual", "heartfelt", "soul mood",
            ],
            seed_genres: &["soul", "r-n-b", "blues"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Fierce, MoodProfile {
            seed_terms: &[
                "power metal", "fierce", "intense rock", "warrior", "battle music",
                "fierce electronic", "aggressive pop", "powerful anthem", "fierce mood",
                "intense beats",
            ],
            seed_genres: &["metal"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Euphoric, MoodProfile {
            seed_terms: &[
                "trance", "euphoric trance", "uplifting trance", "euphoric dance",
                "festival anthem", "euphoric state", "blissful", "ecstatic", "pure joy",
                "euphoria",
            ],
            seed_genres: &["trance", "edm"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Contemplative, MoodProfile {
            seed_terms: &[
                "ambient piano", "thoughtful", "introspective", "philosophical", "deep thinking",
                "contemplation", "mindful music", "reflective", "meditation music",
            ],
            seed_genres: &["piano", "ambient"],
            target_features: MID_RANGE,
        });
        table.insert(MoodLabel::Empowered, MoodProfile {
            seed_terms: &[
                "power pop", "empowerment rock", "strong woman", "confidence boost",
                "self empowerment", "powerful mood", "strength music", "empowering anthem",
                "rise up",
            ],
            seed_genres: &["power-pop"],
            target_features: MID_RANGE,
        });

        table
    };
}

/// Profile for a mood, or [`GENERIC_PROFILE`] when the table has no entry.
#[must_use]
pub fn profile_for(mood: MoodLabel) -> &'static MoodProfile {
    PROFILES.get(&mood).unwrap_or(&GENERIC_PROFILE)
}

/// Whether the table has a dedicated entry for `mood`.
#[must_use]
pub fn has_dedicated_profile(mood: MoodLabel) -> bool {
    PROFILES.contains_key(&mood)
}

impl MoodProfile {
    #[must_use]
    pub fn target(&self, feature: &str) -> Option<f64> {
        self.target_features
            .iter()
            .find(|(name, _)| *name == feature)
            .map(|(_, value)| *value)
    }

    /// Mean absolute gap between a track's features and this profile's targets.
    ///
    /// Unit-interval features compare directly; tempo is scaled by 1/200 BPM and
    /// loudness by 1/60 dB so every term lands roughly in 0..1. Targets the
    /// track has no value for are skipped. `None` when nothing was comparable.
    #[must_use]
    pub fn feature_distance(&self, features: &AudioFeatures) -> Option<f64> {
        let gaps: Vec<f64> = self
            .target_features
            .iter()
            .filter_map(|(name, target)| {
                let actual = features.value(name)?;
                let scale = match *name {
                    "tempo" => 200.0,
                    "loudness" => 60.0,
                    _ => 1.0,
                };
                Some((actual - target).abs() / scale)
            })
            .collect();

        if gaps.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        Some(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mood_has_seed_terms() {
        for mood in MoodLabel::ALL {
            let profile = profile_for(mood);
            assert!(!profile.seed_terms.is_empty(), "{mood} has no seed terms");
            assert!(!profile.target_features.is_empty(), "{mood} has no targets");
        }
    }

    #[test]
    fn test_unmapped_mood_uses_generic_profile() {
        assert!(!has_dedicated_profile(MoodLabel::Calm));
        assert_eq!(profile_for(MoodLabel::Calm), &GENERIC_PROFILE);
        assert!(GENERIC_PROFILE.seed_terms.contains(&"pop"));
        assert_eq!(GENERIC_PROFILE.target("valence"), Some(0.5));
    }

    #[test]
    fn test_resolvable_moods_have_dedicated_profiles() {
        // Every mood the resolver can emit, except Calm, has its own terms.
        for mood in [
            MoodLabel::Happy,
            MoodLabel::Sad,
            MoodLabel::Angry,
            MoodLabel::Excited,
            MoodLabel::Peaceful,
            MoodLabel::Confident,
            MoodLabel::Determined,
            MoodLabel::Energetic,
            MoodLabel::Nervous,
            MoodLabel::Melancholic,
            MoodLabel::Hopeful,
            MoodLabel::Relaxed,
        ] {
            assert!(has_dedicated_profile(mood), "{mood} should have a profile");
        }
    }

    #[test]
    fn test_sad_profile_targets() {
        let sad = profile_for(MoodLabel::Sad);
        assert_eq!(sad.seed_terms.len(), 17);
        assert_eq!(sad.target("tempo"), Some(80.0));
        assert_eq!(sad.target("mode"), None);
    }

    #[test]
    fn test_feature_distance() {
        let happy = profile_for(MoodLabel::Happy);
        let perfect = AudioFeatures {
            id: "t1".to_string(),
            valence: Some(0.8),
            energy: Some(0.7),
            danceability: Some(0.7),
            tempo: Some(120.0),
            ..AudioFeatures::default()
        };
        assert_eq!(happy.feature_distance(&perfect), Some(0.0));

        let gloomy = AudioFeatures {
            valence: Some(0.2),
            ..perfect.clone()
        };
        let distance = happy.feature_distance(&gloomy).unwrap();
        assert!((distance - 0.15).abs() < 1e-9);

        let blank = AudioFeatures::default();
        assert_eq!(happy.feature_distance(&blank), None);
    }
}
