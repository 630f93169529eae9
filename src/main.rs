//! # Moodlist
//!
//! Turns a face's emotional signal into a curated Spotify playlist.
//!
//! ## Usage
//!
//! ```bash
//! # Full pipeline: image + classifier scores in, playlist URL out
//! moodlist build --image face.jpg --scores "happy=85,sad=5,angry=3,neutral=7"
//!
//! # Inspect resolution offline
//! moodlist resolve --scores "neutral=45,sad=30,fear=25" --trials 1000
//!
//! # Clean up generated playlists
//! moodlist purge --dry-run
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use moodlist::assembler::{purge_mood_playlists, PlaylistAssembler};
use moodlist::catalog::{fetch_audio_features, AUDIO_FEATURES_BATCH};
use moodlist::cli::{self, Args, Command, CredentialArgs, ScoreSource};
use moodlist::completion;
use moodlist::config::{self, RuntimeConfig};
use moodlist::emotion::EmotionScores;
use moodlist::error::PipelineError;
use moodlist::finder::TrackFinder;
use moodlist::mood::MoodLabel;
use moodlist::pipeline::{FullFrameLocator, Pipeline, PrecomputedClassifier};
use moodlist::profile::{has_dedicated_profile, profile_for};
use moodlist::spotify::SpotifyClient;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => config::get_config_path(),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<RuntimeConfig> {
    let config = RuntimeConfig::load_from(&config_path(explicit)?)?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            debug!("Using seed {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

fn read_scores(source: &ScoreSource) -> Result<EmotionScores> {
    if let Some(inline) = &source.scores {
        return inline
            .parse()
            .with_context(|| format!("Invalid --scores value '{inline}'"));
    }
    if let Some(path) = &source.scores_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scores file {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("Invalid scores file {}", path.display()));
    }
    bail!("Provide --scores or --scores-file")
}

fn connect(config: &RuntimeConfig, overrides: CredentialArgs) -> Result<SpotifyClient> {
    let mut credentials = config.spotify.clone();
    if let Some(id) = overrides.client_id {
        credentials.client_id = id;
    }
    if let Some(secret) = overrides.client_secret {
        credentials.client_secret = secret;
    }
    if let Some(token) = overrides.refresh_token {
        credentials.refresh_token = token;
    }

    SpotifyClient::connect(&credentials, config.request_timeout(), config.retry_policy())
        .map_err(PipelineError::CatalogUnavailable)
        .context("Could not connect to Spotify")
}

/// Main entry point.
///
/// Logging is controlled through `RUST_LOG`:
/// - `RUST_LOG=info moodlist build ...` - pipeline progress
/// - `RUST_LOG=moodlist::finder=debug moodlist search sad` - per-term search results
fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config_override = args.config.as_deref();

    match args.command {
        Command::Build {
            image,
            source,
            limit,
            no_cover,
            seed,
            strict,
            credentials,
        } => {
            let mut config = load_config(config_override)?;
            if let Some(limit) = limit {
                config.track_limit = limit;
                config.validate()?;
            }

            let scores = read_scores(&source)?;
            let face = image::open(&image)
                .with_context(|| format!("Failed to open image {}", image.display()))?;
            let catalog = connect(&config, credentials)?;

            let assembler = PlaylistAssembler::new(
                TrackFinder::new(config.finder_config()),
                config.assembler_config(!no_cover),
            );
            let mut pipeline = Pipeline::new(FullFrameLocator, PrecomputedClassifier::new(scores))
                .with_assembler(assembler);
            if strict {
                pipeline = pipeline.with_fallback_mood(None);
            }

            info!("Building playlist for {}", image.display());
            let outcome = pipeline
                .build_playlist_for_image(&face, &catalog, &mut rng_for(seed))
                .context("Playlist request failed")?;

            println!("Mood:     {}", outcome.mood);
            println!("Playlist: {}", outcome.playlist_url);
            println!("Tracks:   {}", outcome.playlist.track_uris.len());
            if outcome.playlist.cover_image.is_none() && !no_cover {
                println!("Cover:    not set (see log for details)");
            }
        }
        Command::Resolve { source, seed, trials } => {
            let scores = read_scores(&source)?;
            let pipeline = Pipeline::new(FullFrameLocator, PrecomputedClassifier::default());
            let mut rng = rng_for(seed);

            println!("Raw:        {scores}");
            println!("Normalized: {}", scores.normalize());

            if trials <= 1 {
                println!("Mood:       {}", pipeline.resolve_mood(&scores, &mut rng)?);
            } else {
                let mut histogram: BTreeMap<MoodLabel, u32> = BTreeMap::new();
                for _ in 0..trials {
                    *histogram.entry(pipeline.resolve_mood(&scores, &mut rng)?).or_default() += 1;
                }
                let mut rows: Vec<_> = histogram.into_iter().collect();
                rows.sort_by(|a, b| b.1.cmp(&a.1));
                for (mood, count) in rows {
                    println!("{:>14} {count:>6} ({:.1}%)", mood.name(), f64::from(count) * 100.0 / f64::from(trials));
                }
            }
        }
        Command::Search {
            mood,
            limit,
            features,
            seed,
            credentials,
        } => {
            let config = load_config(config_override)?;
            let mood: MoodLabel = mood.parse()?;
            let catalog = connect(&config, credentials)?;

            let finder = TrackFinder::new(config.finder_config());
            let report = finder.find_tracks_detailed(
                &catalog,
                mood.for_playlist(),
                limit.unwrap_or(config.track_limit),
                &mut rng_for(seed),
            );

            println!("Terms: {}", report.terms.join(", "));
            if !report.failed_terms.is_empty() {
                println!("Failed: {}", report.failed_terms.join(", "));
            }
            println!(
                "{} hits, {} unique, {} selected",
                report.raw_hits,
                report.pool_size,
                report.tracks.len()
            );

            let fit: HashMap<String, f64> = if features {
                let ids: Vec<String> = report.tracks.iter().map(|t| t.track_id().to_string()).collect();
                let profile = profile_for(mood.for_playlist());
                fetch_audio_features(&catalog, &ids, AUDIO_FEATURES_BATCH)
                    .into_iter()
                    .filter_map(|f| profile.feature_distance(&f).map(|d| (f.id.clone(), d)))
                    .collect()
            } else {
                HashMap::new()
            };

            for track in &report.tracks {
                match fit.get(track.track_id()) {
                    Some(distance) => println!("  [{distance:.2}] {} - {}", track.artist_line(), track.title),
                    None => println!("  {} - {}", track.artist_line(), track.title),
                }
            }
        }
        Command::Moods => {
            for mood in MoodLabel::ALL {
                let profile = profile_for(mood);
                let source = if has_dedicated_profile(mood) { "" } else { " (generic)" };
                let targets: Vec<String> = profile
                    .target_features
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect();
                println!("{}{source}", mood.name());
                println!("  terms:   {}", profile.seed_terms.join(", "));
                println!("  genres:  {}", profile.seed_genres.join(", "));
                println!("  targets: {}", targets.join(", "));
            }
        }
        Command::Purge { dry_run, credentials } => {
            let config = load_config(config_override)?;
            let catalog = connect(&config, credentials)?;
            let report = purge_mood_playlists(&catalog, dry_run).context("Failed to list playlists")?;

            for playlist in &report.matched {
                println!("{} {}", if dry_run { "would remove" } else { "matched" }, playlist.name);
            }
            if !dry_run {
                println!("Removed {}, failed {}", report.removed, report.failed);
            }
        }
        Command::Config { init } => {
            let path = config_path(config_override)?;
            if init {
                if path.exists() {
                    println!("Config already exists at {}", path.display());
                } else {
                    RuntimeConfig::default().save_to(&path)?;
                    println!("Wrote default config to {}", path.display());
                }
            }
            let config = RuntimeConfig::load_from(&path)?;
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(
                completion::shell_to_completion_shell(shell),
                &mut cmd,
                &mut io::stdout(),
            );
        }
    }

    Ok(())
}
