//! # Pipeline
//!
//! One request, start to finish:
//!
//! ```text
//! image -> FaceLocator -> EmotionClassifier -> normalize -> MoodResolver
//!       -> PlaylistAssembler (TrackFinder + catalog mutations) -> mood + URL
//! ```
//!
//! Face localization and classification are external collaborators reached
//! through the [`FaceLocator`] and [`EmotionClassifier`] traits. The adapters
//! here ([`FullFrameLocator`], [`PrecomputedClassifier`]) let the pipeline run
//! on pre-cropped images with scores supplied by the caller.

use crate::assembler::{PlaylistAssembler, PlaylistResult};
use crate::catalog::Catalog;
use crate::emotion::EmotionScores;
use crate::error::PipelineError;
use crate::mood::MoodLabel;
use crate::resolver::MoodResolver;
use image::{DynamicImage, GenericImageView};
use log::{debug, info, warn};
use rand::Rng;

/// Finds the face region in a source image.
pub trait FaceLocator {
    /// Cropped face region, or `None` when no face is present.
    fn locate_face(&self, image: &DynamicImage) -> Option<DynamicImage>;
}

/// Scores a face region per emotion category.
pub trait EmotionClassifier {
    /// # Errors
    ///
    /// A human-readable reason when the classifier could not run.
    fn classify(&self, face: &DynamicImage) -> Result<EmotionScores, String>;
}

/// Treats the whole image as the face. Only an empty image has no face.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullFrameLocator;

impl FaceLocator for FullFrameLocator {
    fn locate_face(&self, image: &DynamicImage) -> Option<DynamicImage> {
        let (width, height) = image.dimensions();
        (width > 0 && height > 0).then(|| image.clone())
    }
}

/// Returns the same scores for any face.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedClassifier {
    scores: EmotionScores,
}

impl PrecomputedClassifier {
    #[must_use]
    pub fn new(scores: EmotionScores) -> Self {
        Self { scores }
    }
}

impl EmotionClassifier for PrecomputedClassifier {
    fn classify(&self, _face: &DynamicImage) -> Result<EmotionScores, String> {
        Ok(self.scores.clone())
    }
}

/// What the caller gets back from a successful request.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub mood: MoodLabel,
    pub playlist_url: String,
    pub playlist: PlaylistResult,
}

pub struct Pipeline<L, E> {
    locator: L,
    classifier: E,
    resolver: MoodResolver,
    assembler: PlaylistAssembler,
    fallback_mood: Option<MoodLabel>,
}

impl<L: FaceLocator, E: EmotionClassifier> Pipeline<L, E> {
    /// Pipeline with default resolver and assembler settings, falling back to
    /// [`MoodLabel::Peaceful`] when the scores carry no signal.
    pub fn new(locator: L, classifier: E) -> Self {
        Self {
            locator,
            classifier,
            resolver: MoodResolver::default(),
            assembler: PlaylistAssembler::default(),
            fallback_mood: Some(MoodLabel::Peaceful),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: MoodResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_assembler(mut self, assembler: PlaylistAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// `None` surfaces [`PipelineError::InsufficientSignal`] instead of
    /// substituting a mood.
    #[must_use]
    pub fn with_fallback_mood(mut self, fallback: Option<MoodLabel>) -> Self {
        self.fallback_mood = fallback;
        self
    }

    /// Normalize raw scores and resolve them to one mood.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InsufficientSignal`] when the scores carry no signal
    /// and no fallback mood is configured.
    pub fn resolve_mood<R: Rng + ?Sized>(
        &self,
        raw: &EmotionScores,
        rng: &mut R,
    ) -> Result<MoodLabel, PipelineError> {
        let normalized = raw.normalize();
        debug!("Raw scores: {raw}");
        debug!("Normalized scores: {normalized}");

        match self.resolver.resolve(&normalized, rng) {
            Ok(mood) => Ok(mood),
            Err(e) => match self.fallback_mood {
                Some(fallback) => {
                    warn!("{e}, falling back to {fallback}");
                    Ok(fallback)
                }
                None => Err(e.into()),
            },
        }
    }

    /// Build a playlist for the face in `image`.
    ///
    /// # Errors
    ///
    /// Exactly one [`PipelineError`]; collaborator failures abort before any
    /// catalog call is made.
    pub fn build_playlist_for_image<C, R>(
        &self,
        image: &DynamicImage,
        catalog: &C,
        rng: &mut R,
    ) -> Result<PipelineOutcome, PipelineError>
    where
        C: Catalog + ?Sized,
        R: Rng + ?Sized,
    {
        let face = self
            .locator
            .locate_face(image)
            .ok_or(PipelineError::NoFaceDetected)?;
        let raw = self
            .classifier
            .classify(&face)
            .map_err(PipelineError::ClassificationFailed)?;

        let mood = self.resolve_mood(&raw, rng)?;
        info!("Resolved mood: {mood}");

        let playlist = self.assembler.assemble(catalog, mood, Some(&face), rng)?;
        info!("Playlist ready: {}", playlist.url);

        Ok(PipelineOutcome {
            mood: playlist.mood,
            playlist_url: playlist.url.clone(),
            playlist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AudioFeatures, CatalogError, PlaylistHandle, TrackCandidate};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;

    struct NoFace;

    impl FaceLocator for NoFace {
        fn locate_face(&self, _: &DynamicImage) -> Option<DynamicImage> {
            None
        }
    }

    struct BrokenModel;

    impl EmotionClassifier for BrokenModel {
        fn classify(&self, _: &DynamicImage) -> Result<EmotionScores, String> {
            Err("model weights missing".to_string())
        }
    }

    /// Counts calls and answers every search with one track.
    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl Counting {
        fn tick(&self) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    impl Catalog for Counting {
        fn search_tracks(&self, term: &str, _: usize, _: &str) -> Result<Vec<TrackCandidate>, CatalogError> {
            self.tick();
            Ok(vec![TrackCandidate {
                uri: format!("spotify:track:{term}"),
                title: term.to_string(),
                artists: Vec::new(),
            }])
        }
        fn current_user_id(&self) -> Result<String, CatalogError> {
            self.tick();
            Ok("me".to_string())
        }
        fn create_playlist(&self, _: &str, name: &str, _: &str, _: bool) -> Result<PlaylistHandle, CatalogError> {
            self.tick();
            Ok(PlaylistHandle {
                id: "p".to_string(),
                name: name.to_string(),
                url: "https://open.spotify.com/playlist/p".to_string(),
            })
        }
        fn add_tracks(&self, _: &str, _: &[String]) -> Result<(), CatalogError> {
            self.tick();
            Ok(())
        }
        fn upload_cover_image(&self, _: &str, _: &[u8]) -> Result<(), CatalogError> {
            self.tick();
            Ok(())
        }
        fn audio_features(&self, _: &[String]) -> Result<Vec<AudioFeatures>, CatalogError> {
            Ok(Vec::new())
        }
        fn user_playlists(&self) -> Result<Vec<PlaylistHandle>, CatalogError> {
            Ok(Vec::new())
        }
        fn unfollow_playlist(&self, _: &str) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::new_rgb8(64, 64)
    }

    fn scores(raw: &str) -> EmotionScores {
        raw.parse().unwrap()
    }

    #[test]
    fn test_full_frame_locator() {
        assert!(FullFrameLocator.locate_face(&image()).is_some());
        assert!(FullFrameLocator.locate_face(&DynamicImage::new_rgb8(0, 0)).is_none());
    }

    #[test]
    fn test_missing_face_aborts_before_catalog() {
        let catalog = Counting::default();
        let pipeline = Pipeline::new(NoFace, PrecomputedClassifier::new(scores("happy=90")));

        let err = pipeline
            .build_playlist_for_image(&image(), &catalog, &mut StdRng::seed_from_u64(0))
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoFaceDetected));
        assert_eq!(catalog.calls.get(), 0);
    }

    #[test]
    fn test_classifier_failure_is_surfaced() {
        let catalog = Counting::default();
        let pipeline = Pipeline::new(FullFrameLocator, BrokenModel);

        let err = pipeline
            .build_playlist_for_image(&image(), &catalog, &mut StdRng::seed_from_u64(0))
            .unwrap_err();

        assert!(matches!(err, PipelineError::ClassificationFailed(ref reason) if reason.contains("weights")));
        assert_eq!(catalog.calls.get(), 0);
    }

    #[test]
    fn test_no_signal_uses_fallback() {
        let pipeline = Pipeline::new(FullFrameLocator, PrecomputedClassifier::default());
        let mood = pipeline
            .resolve_mood(&EmotionScores::new(), &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(mood, MoodLabel::Peaceful);
    }

    #[test]
    fn test_no_signal_without_fallback_fails() {
        let catalog = Counting::default();
        let pipeline = Pipeline::new(FullFrameLocator, PrecomputedClassifier::new(scores("happy=0,sad=0")))
            .with_fallback_mood(None);

        let err = pipeline
            .build_playlist_for_image(&image(), &catalog, &mut StdRng::seed_from_u64(0))
            .unwrap_err();

        assert!(matches!(err, PipelineError::InsufficientSignal));
        assert_eq!(catalog.calls.get(), 0);
    }

    #[test]
    fn test_end_to_end_returns_mood_and_url() {
        let catalog = Counting::default();
        let pipeline = Pipeline::new(FullFrameLocator, PrecomputedClassifier::new(scores("sad=95,happy=5")));

        let outcome = pipeline
            .build_playlist_for_image(&image(), &catalog, &mut StdRng::seed_from_u64(4))
            .unwrap();

        assert!([MoodLabel::Sad, MoodLabel::Melancholic].contains(&outcome.mood));
        assert_eq!(outcome.playlist_url, "https://open.spotify.com/playlist/p");
        assert!(!outcome.playlist.track_uris.is_empty());
    }
}
