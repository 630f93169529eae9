//! # Mood Resolver
//!
//! Turns normalized [`EmotionScores`] into exactly one [`MoodLabel`].
//!
//! ## Strategy
//!
//! Each emotion category owns a short list of candidate moods. The resolver
//! ranks categories by confidence and:
//!
//! - if the top category clears the high-confidence threshold (80), picks a
//!   mood uniformly from that category's list;
//! - otherwise blends: 70% of the time from the top category's list, 30% from
//!   the runner-up's list, whatever the runner-up scored. A lone category
//!   always resolves from its own list.
//!
//! Randomness is deliberate and keeps repeated requests for the same face from
//! producing the same playlist. The random source is always passed in, so a
//! seeded RNG makes resolution reproducible.
//!
//! ```
//! use moodlist::emotion::EmotionScores;
//! use moodlist::mood::MoodLabel;
//! use moodlist::resolver::MoodResolver;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let scores: EmotionScores = "neutral=90,happy=5,sad=5".parse()?;
//! let mut rng = StdRng::seed_from_u64(7);
//! let mood = MoodResolver::default().resolve(&scores.normalize(), &mut rng)?;
//!
//! assert!([MoodLabel::Peaceful, MoodLabel::Calm, MoodLabel::Relaxed].contains(&mood));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::emotion::{EmotionCategory, EmotionScores};
use crate::mood::MoodLabel;
use lazy_static::lazy_static;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;

lazy_static! {
    /// Candidate moods for each raw emotion category.
    static ref CATEGORY_MOODS: HashMap<EmotionCategory, &'static [MoodLabel]> = {
        use MoodLabel::*;
        let table: [(EmotionCategory, &'static [MoodLabel]); 7] = [
            (EmotionCategory::Angry, &[Angry, Determined]),
            (EmotionCategory::Disgust, &[Angry, Energetic]),
            (EmotionCategory::Fear, &[Nervous, Melancholic]),
            (EmotionCategory::Happy, &[Happy, Excited, Confident]),
            (EmotionCategory::Sad, &[Sad, Melancholic]),
            (EmotionCategory::Surprise, &[Excited, Energetic, Hopeful]),
            (EmotionCategory::Neutral, &[Peaceful, Calm, Relaxed]),
        ];
        table.into_iter().collect()
    };
}

/// Candidate moods for an emotion category. Never empty.
#[must_use]
pub fn candidate_moods(category: EmotionCategory) -> &'static [MoodLabel] {
    CATEGORY_MOODS
        .get(&category)
        .copied()
        .unwrap_or(&[MoodLabel::Peaceful])
}

/// Resolution could not produce a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Scores were empty or all zero.
    #[error("no usable emotion signal")]
    InsufficientSignal,
}

/// Tunable resolver parameters.
#[derive(Debug, Clone, Copy)]
pub struct MoodResolver {
    /// Top confidence strictly above this resolves from the top category only.
    pub high_confidence_threshold: f64,
    /// Probability of drawing from the top category when blending.
    pub primary_weight: f64,
}

impl Default for MoodResolver {
    fn default() -> Self {
        Self {
            high_confidence_threshold: 80.0,
            primary_weight: 0.7,
        }
    }
}

impl MoodResolver {
    /// Resolve normalized scores to a single mood.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InsufficientSignal`] when no category has a
    /// positive confidence.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        scores: &EmotionScores,
        rng: &mut R,
    ) -> Result<MoodLabel, ResolveError> {
        let ranked = scores.ranked();
        let (primary, primary_score) = match ranked.first() {
            Some(&(category, score)) if score > 0.0 => (category, score),
            _ => return Err(ResolveError::InsufficientSignal),
        };

        let pool = if primary_score > self.high_confidence_threshold {
            debug!("High confidence {primary} ({primary_score:.2}), resolving directly");
            candidate_moods(primary)
        } else {
            match ranked.get(1) {
                Some(&(secondary, _)) => {
                    if rng.gen_bool(self.primary_weight.clamp(0.0, 1.0)) {
                        debug!("Blending {primary}/{secondary}, drew from {primary}");
                        candidate_moods(primary)
                    } else {
                        debug!("Blending {primary}/{secondary}, drew from {secondary}");
                        candidate_moods(secondary)
                    }
                }
                None => candidate_moods(primary),
            }
        };

        pool.choose(rng)
            .copied()
            .ok_or(ResolveError::InsufficientSignal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scores(pairs: &[(EmotionCategory, f64)]) -> EmotionScores {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_every_category_has_one_to_three_candidates() {
        for category in EmotionCategory::ALL {
            let moods = candidate_moods(category);
            assert!(
                (1..=3).contains(&moods.len()),
                "{category} has {} candidates",
                moods.len()
            );
        }
    }

    #[test]
    fn test_same_seed_same_label() {
        let input = scores(&[
            (EmotionCategory::Fear, 45.0),
            (EmotionCategory::Surprise, 35.0),
            (EmotionCategory::Sad, 20.0),
        ]);
        let resolver = MoodResolver::default();

        for seed in 0..50 {
            let first = resolver.resolve(&input, &mut StdRng::seed_from_u64(seed));
            let second = resolver.resolve(&input, &mut StdRng::seed_from_u64(seed));
            assert_eq!(first, second, "seed {seed} diverged");
        }
    }

    #[test]
    fn test_high_confidence_draws_only_from_top_category() {
        let input = scores(&[(EmotionCategory::Happy, 91.0), (EmotionCategory::Sad, 9.0)]);
        let resolver = MoodResolver::default();
        let mut rng = StdRng::seed_from_u64(42);
        let allowed = candidate_moods(EmotionCategory::Happy);

        for _ in 0..1_000 {
            let mood = resolver.resolve(&input, &mut rng).unwrap();
            assert!(allowed.contains(&mood), "{mood} is not a happy mood");
        }
    }

    #[test]
    fn test_blend_follows_seventy_thirty_split() {
        // Angry and neutral share no candidates, so every draw is attributable.
        let input = scores(&[(EmotionCategory::Angry, 60.0), (EmotionCategory::Neutral, 40.0)]);
        let resolver = MoodResolver::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 20_000;

        let from_primary = (0..trials)
            .map(|_| resolver.resolve(&input, &mut rng).unwrap())
            .filter(|mood| candidate_moods(EmotionCategory::Angry).contains(mood))
            .count();

        #[allow(clippy::cast_precision_loss)]
        let ratio = from_primary as f64 / f64::from(trials);
        assert!((ratio - 0.7).abs() < 0.02, "primary ratio was {ratio:.3}");
    }

    #[test]
    fn test_threshold_is_strict() {
        let input = scores(&[(EmotionCategory::Sad, 80.0), (EmotionCategory::Angry, 20.0)]);
        let resolver = MoodResolver::default();
        let mut rng = StdRng::seed_from_u64(9);

        let saw_secondary = (0..500)
            .map(|_| resolver.resolve(&input, &mut rng).unwrap())
            .any(|mood| matches!(mood, MoodLabel::Angry | MoodLabel::Determined));
        assert!(saw_secondary, "80 exactly should still blend");
    }

    #[test]
    fn test_zero_runner_up_still_blends() {
        let input = scores(&[(EmotionCategory::Fear, 50.0), (EmotionCategory::Happy, 0.0)]);
        let resolver = MoodResolver::default();
        let mut rng = StdRng::seed_from_u64(1);
        let trials = 10_000;

        let from_secondary = (0..trials)
            .map(|_| resolver.resolve(&input, &mut rng).unwrap())
            .filter(|mood| candidate_moods(EmotionCategory::Happy).contains(mood))
            .count();

        #[allow(clippy::cast_precision_loss)]
        let ratio = from_secondary as f64 / f64::from(trials);
        assert!((ratio - 0.3).abs() < 0.02, "secondary ratio was {ratio:.3}");
    }

    #[test]
    fn test_single_category_draws_from_its_own_list() {
        let input = scores(&[(EmotionCategory::Fear, 50.0)]);
        let resolver = MoodResolver::default();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let mood = resolver.resolve(&input, &mut rng).unwrap();
            assert!(candidate_moods(EmotionCategory::Fear).contains(&mood));
        }
    }

    #[test]
    fn test_no_signal_fails() {
        let resolver = MoodResolver::default();
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            resolver.resolve(&EmotionScores::new(), &mut rng),
            Err(ResolveError::InsufficientSignal)
        );
        let zeros = scores(&[(EmotionCategory::Happy, 0.0), (EmotionCategory::Neutral, 0.0)]);
        assert_eq!(
            resolver.resolve(&zeros, &mut rng),
            Err(ResolveError::InsufficientSignal)
        );
    }
}
