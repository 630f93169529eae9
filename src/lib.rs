//! Turns a face's emotional signal into a curated music playlist.
//!
//! Core modules:
//! - [`emotion`] - Emotion scores and the normalizer
//! - [`resolver`] - Confidence-aware mood resolution
//! - [`profile`] - Per-mood seed terms and feature targets
//! - [`finder`] - Multi-term search, dedup and sampling
//! - [`assembler`] - Playlist creation, track insertion, cover upload
//! - [`pipeline`] - `build_playlist_for_image`, end to end
//!
//! ### Supporting Modules
//!
//! - [`mood`] - The closed set of mood labels
//! - [`catalog`] - Catalog trait and shared track/playlist types
//! - [`spotify`] - Spotify Web API catalog
//! - [`cover`] - Cover image rendering
//! - [`error`] - Request failure taxonomy
//! - [`config`] - Config file and directories
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use moodlist::config::RuntimeConfig;
//! use moodlist::emotion::EmotionScores;
//! use moodlist::pipeline::{FullFrameLocator, Pipeline, PrecomputedClassifier};
//! use moodlist::spotify::SpotifyClient;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let config = RuntimeConfig::load()?;
//! let catalog = SpotifyClient::connect(&config.spotify, config.request_timeout(), config.retry_policy())?;
//!
//! let scores: EmotionScores = "happy=85,sad=5,angry=3,neutral=7".parse()?;
//! let face = image::open("face.jpg")?;
//! let pipeline = Pipeline::new(FullFrameLocator, PrecomputedClassifier::new(scores));
//!
//! let outcome = pipeline.build_playlist_for_image(&face, &catalog, &mut StdRng::from_entropy())?;
//! println!("{} -> {}", outcome.mood, outcome.playlist_url);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Resolution
//!
//! Raw classifier confidences are first normalized: "neutral" is dropped
//! unless it is the strongest category, and the rest is rescaled to 100.
//! The resolver then picks from the top category's candidate moods when its
//! confidence is above 80, and otherwise blends 70/30 between the top two
//! categories. All randomness comes from a caller-supplied RNG.
//!
//! ## Track Selection
//!
//! Up to 8 seed terms are sampled from the mood's profile and searched one
//! by one. A failing search counts as zero results. Hits are pooled,
//! deduplicated by URI and sampled down to the playlist size.
//!
//! ## Error Handling
//!
//! Library entry points return typed errors ([`error::PipelineError`],
//! [`catalog::CatalogError`]); the binary wraps them with `anyhow` context.
//! Only transient catalog failures are retried, and only for idempotent calls.

pub mod assembler;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod cover;
pub mod emotion;
pub mod error;
pub mod finder;
pub mod mood;
pub mod pipeline;
pub mod profile;
pub mod resolver;
pub mod spotify;
