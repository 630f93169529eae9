//! # Integration Tests for Moodlist
//!
//! End-to-end runs of the public API against an in-memory catalog that
//! records every call, plus a few checks of the `moodlist` binary that need
//! no network access.

use image::{DynamicImage, Rgb, RgbImage};
use moodlist::catalog::{AudioFeatures, Catalog, CatalogError, PlaylistHandle, TrackCandidate};
use moodlist::emotion::{EmotionCategory, EmotionScores};
use moodlist::error::PipelineError;
use moodlist::finder::TrackFinder;
use moodlist::mood::MoodLabel;
use moodlist::pipeline::{FullFrameLocator, Pipeline, PrecomputedClassifier};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Search(String),
    CurrentUser,
    Create(String),
    AddTracks(usize),
    UploadCover,
}

/// Catalog stub recording every call. Search call `k` returns three tracks
/// `t{2k}`, `t{2k+1}`, `t{2k+2}`, so consecutive searches overlap by one.
#[derive(Default)]
struct RecordingCatalog {
    calls: RefCell<Vec<Call>>,
    searches: Cell<usize>,
    empty_search: bool,
    fail_create: Option<CatalogError>,
    fail_cover: bool,
}

impl RecordingCatalog {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Catalog for RecordingCatalog {
    fn search_tracks(&self, term: &str, _: usize, _: &str) -> Result<Vec<TrackCandidate>, CatalogError> {
        self.record(Call::Search(term.to_string()));
        let k = self.searches.get();
        self.searches.set(k + 1);
        if self.empty_search {
            return Ok(Vec::new());
        }
        Ok((2 * k..2 * k + 3)
            .map(|i| TrackCandidate {
                uri: format!("spotify:track:t{i}"),
                title: format!("Track {i}"),
                artists: vec!["Stub Artist".to_string()],
            })
            .collect())
    }

    fn current_user_id(&self) -> Result<String, CatalogError> {
        self.record(Call::CurrentUser);
        Ok("stub-user".to_string())
    }

    fn create_playlist(&self, _: &str, name: &str, _: &str, _: bool) -> Result<PlaylistHandle, CatalogError> {
        self.record(Call::Create(name.to_string()));
        if let Some(err) = &self.fail_create {
            return Err(err.clone());
        }
        Ok(PlaylistHandle {
            id: "stub-playlist".to_string(),
            name: name.to_string(),
            url: "https://open.spotify.com/playlist/stub-playlist".to_string(),
        })
    }

    fn add_tracks(&self, _: &str, uris: &[String]) -> Result<(), CatalogError> {
        self.record(Call::AddTracks(uris.len()));
        Ok(())
    }

    fn upload_cover_image(&self, _: &str, _: &[u8]) -> Result<(), CatalogError> {
        self.record(Call::UploadCover);
        if self.fail_cover {
            return Err(CatalogError::Rejected {
                status: 413,
                message: "payload too large".to_string(),
            });
        }
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

fn face() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 240, Rgb([190, 150, 130])))
}

fn pipeline_for(scores: &str) -> Pipeline<FullFrameLocator, PrecomputedClassifier> {
    let scores: EmotionScores = scores.parse().unwrap();
    Pipeline::new(FullFrameLocator, PrecomputedClassifier::new(scores))
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_confident_happy_face() {
        let raw: EmotionScores = "happy=85,sad=5,angry=3,neutral=7".parse().unwrap();
        let normalized = raw.normalize();

        assert!(normalized.get(EmotionCategory::Neutral).is_none());
        let happy = normalized.get(EmotionCategory::Happy).unwrap();
        assert!((happy - 91.397_849).abs() < 1e-3, "happy renormalized to {happy}");

        let pipeline = pipeline_for("happy=85,sad=5,angry=3,neutral=7");
        for seed in 0..200 {
            let mood = pipeline.resolve_mood(&raw, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert!(
                matches!(mood, MoodLabel::Happy | MoodLabel::Excited | MoodLabel::Confident),
                "seed {seed} gave {mood}"
            );
        }
    }

    #[test]
    fn test_dominant_neutral_face() {
        let raw: EmotionScores = "neutral=90,happy=5,sad=5".parse().unwrap();
        assert_eq!(raw.normalize(), raw, "dominant neutral passes through");

        let pipeline = pipeline_for("neutral=90,happy=5,sad=5");
        for seed in 0..50 {
            let catalog = RecordingCatalog::default();
            let outcome = pipeline
                .build_playlist_for_image(&face(), &catalog, &mut StdRng::seed_from_u64(seed))
                .unwrap();

            assert!(
                matches!(outcome.mood, MoodLabel::Peaceful | MoodLabel::Calm | MoodLabel::Relaxed),
                "seed {seed} gave {}",
                outcome.mood
            );
            assert_eq!(outcome.playlist.name, format!("{} Mood — curated", outcome.mood));
        }
    }

    #[test]
    fn test_overlapping_search_results_for_sad() {
        for limit in [10, 50] {
            let catalog = RecordingCatalog::default();
            let report = TrackFinder::default().find_tracks_detailed(
                &catalog,
                MoodLabel::Sad,
                limit,
                &mut StdRng::seed_from_u64(3),
            );

            // Eight searches of three tracks, each sharing one with the next.
            assert_eq!(report.terms.len(), 8);
            assert_eq!(report.raw_hits, 24);
            assert_eq!(report.pool_size, 17);
            assert_eq!(report.tracks.len(), limit.min(17));

            let unique: HashSet<_> = report.tracks.iter().map(|t| t.uri.as_str()).collect();
            assert_eq!(unique.len(), report.tracks.len());
        }
    }

    #[test]
    fn test_create_failure_makes_no_further_calls() {
        let catalog = RecordingCatalog {
            fail_create: Some(CatalogError::Rejected {
                status: 403,
                message: "insufficient client scope".to_string(),
            }),
            ..RecordingCatalog::default()
        };

        let err = pipeline_for("sad=60,fear=40")
            .build_playlist_for_image(&face(), &catalog, &mut StdRng::seed_from_u64(1))
            .unwrap_err();

        assert!(matches!(err, PipelineError::PlaylistCreateFailed(_)), "got {err:?}");
        let calls = catalog.calls();
        assert!(matches!(calls.last(), Some(Call::Create(_))), "calls after create: {calls:?}");
        assert!(!calls.iter().any(|c| matches!(c, Call::Search(_))));
    }

    #[test]
    fn test_transient_create_failure_reports_unavailable_catalog() {
        let catalog = RecordingCatalog {
            fail_create: Some(CatalogError::Unavailable("connection reset".to_string())),
            ..RecordingCatalog::default()
        };

        let err = pipeline_for("sad=60,fear=40")
            .build_playlist_for_image(&face(), &catalog, &mut StdRng::seed_from_u64(1))
            .unwrap_err();

        assert!(matches!(err, PipelineError::CatalogUnavailable(_)), "got {err:?}");
        assert_eq!(err.kind(), "catalog_unavailable");
        assert!(!catalog.calls().iter().any(|c| matches!(c, Call::Search(_))));
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn test_full_request_call_order() {
        let catalog = RecordingCatalog::default();

        let outcome = pipeline_for("angry=70,disgust=30")
            .build_playlist_for_image(&face(), &catalog, &mut StdRng::seed_from_u64(12))
            .unwrap();

        let calls = catalog.calls();
        assert_eq!(calls[0], Call::CurrentUser);
        assert!(matches!(calls[1], Call::Create(_)));
        let searches = calls.iter().filter(|c| matches!(c, Call::Search(_))).count();
        assert_eq!(searches, 8);
        assert_eq!(calls[calls.len() - 2], Call::AddTracks(10));
        assert_eq!(calls[calls.len() - 1], Call::UploadCover);

        assert_eq!(outcome.playlist.track_uris.len(), 10);
        assert!(outcome.playlist.cover_image.is_some());
        assert_eq!(outcome.playlist_url, "https://open.spotify.com/playlist/stub-playlist");
    }

    #[test]
    fn test_cover_rejection_still_succeeds() {
        let catalog = RecordingCatalog {
            fail_cover: true,
            ..RecordingCatalog::default()
        };

        let outcome = pipeline_for("surprise=55,happy=45")
            .build_playlist_for_image(&face(), &catalog, &mut StdRng::seed_from_u64(8))
            .unwrap();

        assert!(outcome.playlist.cover_image.is_none());
        assert!(catalog.calls().contains(&Call::UploadCover));
    }

    #[test]
    fn test_empty_catalog_reports_no_tracks() {
        let catalog = RecordingCatalog {
            empty_search: true,
            ..RecordingCatalog::default()
        };

        let err = pipeline_for("fear=80,sad=20")
            .build_playlist_for_image(&face(), &catalog, &mut StdRng::seed_from_u64(2))
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoTracksFound));
        let calls = catalog.calls();
        assert!(calls.iter().any(|c| matches!(c, Call::Create(_))), "playlist is still created");
        assert!(!calls.iter().any(|c| matches!(c, Call::AddTracks(_))));
    }

    #[test]
    fn test_same_seed_same_playlist() {
        let pipeline = pipeline_for("sad=45,fear=35,surprise=20");

        let first = pipeline
            .build_playlist_for_image(&face(), &RecordingCatalog::default(), &mut StdRng::seed_from_u64(99))
            .unwrap();
        let second = pipeline
            .build_playlist_for_image(&face(), &RecordingCatalog::default(), &mut StdRng::seed_from_u64(99))
            .unwrap();

        assert_eq!(first.mood, second.mood);
        assert_eq!(first.playlist.track_uris, second.playlist.track_uris);
    }

    #[test]
    fn test_empty_scores_fall_back_to_peaceful() {
        let catalog = RecordingCatalog::default();
        let pipeline = Pipeline::new(FullFrameLocator, PrecomputedClassifier::default());

        let outcome = pipeline
            .build_playlist_for_image(&face(), &catalog, &mut StdRng::seed_from_u64(0))
            .unwrap();

        assert_eq!(outcome.mood, MoodLabel::Peaceful);
    }
}

#[cfg(test)]
mod cli_tests {
    use std::process::Command;
    use tempfile::TempDir;

    fn moodlist() -> Command {
        Command::new(env!("CARGO_BIN_EXE_moodlist"))
    }

    #[test]
    fn test_cli_help_displays_correctly() {
        let output = moodlist().arg("--help").output().expect("Failed to run help command");

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(output.status.success());
        assert!(stdout.contains("moodlist"));
        assert!(stdout.contains("build"));
    }

    #[test]
    fn test_resolve_is_offline_and_seeded() {
        let run = || {
            moodlist()
                .args(["resolve", "--scores", "happy=85,sad=5,angry=3,neutral=7", "--seed", "4"])
                .output()
                .expect("Failed to run resolve")
        };

        let first = run();
        let second = run();
        assert!(first.status.success());
        let stdout = String::from_utf8_lossy(&first.stdout);
        assert!(stdout.contains("Mood:"));
        assert_eq!(first.stdout, second.stdout);
    }

    #[test]
    fn test_moods_lists_generic_fallback() {
        let output = moodlist().arg("moods").output().expect("Failed to run moods");

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Melancholic"));
        assert!(stdout.contains("Calm (generic)"));
    }

    #[test]
    fn test_config_init_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let output = moodlist()
            .arg("--config")
            .arg(&path)
            .args(["config", "--init"])
            .output()
            .expect("Failed to run config");

        assert!(output.status.success());
        assert!(path.exists());
        assert!(String::from_utf8_lossy(&output.stdout).contains("\"market\": \"US\""));
    }

    #[test]
    fn test_completion_generation() {
        let output = moodlist().args(["completion", "bash"]).output().expect("Failed to run completion");

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("moodlist"));
    }
}
