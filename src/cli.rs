//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `moodlist` binary.
//!
//! ## Commands
//!
//! - `build`: full pipeline, image + scores in, playlist URL out
//! - `resolve`: offline mood resolution for a set of scores
//! - `search`: run the track finder for one mood without creating anything
//! - `moods`: list every mood with its search profile
//! - `purge`: remove previously generated mood playlists
//! - `config`: show or initialise the config file
//! - `completion`: generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! moodlist build --image face.jpg --scores "happy=85,sad=5,angry=3,neutral=7"
//! moodlist resolve --scores "neutral=40,sad=35,fear=25" --trials 1000
//! moodlist search melancholic --limit 5 --features
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// Every piece of functionality lives behind a subcommand. The only global
/// flag is `--config`, which replaces the platform config path for commands
/// that read settings.
#[derive(Parser, Debug)]
#[command(name = "moodlist")]
#[command(about = "Moodlist: turn a face's emotional signal into a curated playlist")]
#[command(version)]
pub struct Args {
    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Spotify credentials; each falls back to the config file when unset.
///
/// The environment variables are read by clap, so `SPOTIFY_CLIENT_SECRET`
/// never has to appear on the command line. Values are hidden from `--help`.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct CredentialArgs {
    /// Application client id
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Application client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Long-lived user refresh token, exchanged for an access token per run
    #[arg(long, env = "SPOTIFY_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,
}

/// Where the emotion scores come from.
#[derive(ClapArgs, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ScoreSource {
    /// Inline scores, e.g. "happy=85,sad=5,neutral=10"
    #[arg(long, value_name = "SCORES")]
    pub scores: Option<String>,

    /// JSON object of category → confidence, as written by a classifier
    #[arg(long, value_name = "PATH")]
    pub scores_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a playlist for a face image
    ///
    /// Normalizes the emotion scores, resolves a mood, searches the catalog
    /// and creates a playlist with the face as its cover. The image is
    /// expected to be cropped to the face already.
    Build {
        /// Face image (JPEG or PNG)
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        image: PathBuf,

        #[command(flatten)]
        source: ScoreSource,

        /// Tracks in the playlist (overrides config)
        #[arg(long)]
        limit: Option<usize>,

        /// Do not upload a cover image
        #[arg(long)]
        no_cover: bool,

        /// Seed for reproducible mood and track selection
        #[arg(long)]
        seed: Option<u64>,

        /// Fail instead of falling back to Peaceful when the scores are empty
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Resolve scores to a mood without touching the catalog
    ///
    /// Prints the normalized scores and the resolved mood. With `--trials`
    /// the resolution is repeated and the label distribution is shown, which
    /// makes the 70/30 blend between the top two categories visible.
    ///
    /// Best for: checking what a set of classifier scores will turn into
    Resolve {
        #[command(flatten)]
        source: ScoreSource,

        /// Seed for a reproducible resolution
        #[arg(long)]
        seed: Option<u64>,

        /// Resolve this many times and print the label distribution
        #[arg(long, default_value = "1")]
        trials: u32,
    },

    /// Run the track finder for one mood
    ///
    /// Samples seed terms from the mood's profile, searches the catalog and
    /// prints the deduplicated selection. No playlist is created.
    Search {
        /// Mood name, case-insensitive (see `moodlist moods`)
        mood: String,

        /// Tracks to select (overrides config)
        #[arg(long)]
        limit: Option<usize>,

        /// Annotate each track with how closely its audio features fit the mood
        #[arg(long)]
        features: bool,

        /// Seed for reproducible term and track sampling
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// List every mood with its seed terms and feature targets
    Moods,

    /// Remove generated playlists (any playlist with "Mood" in its name)
    ///
    /// Unfollows every matching playlist of the current user. A failed
    /// unfollow is reported and skipped; only listing the playlists is fatal.
    Purge {
        /// Only list what would be removed
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Show the effective configuration, secrets masked
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },

    /// Generate shell completions
    ///
    /// Generates completion scripts for various shells to enable tab
    /// completion of commands and flags.
    ///
    /// Usage: moodlist completion bash > ~/.local/share/bash-completion/completions/moodlist
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
