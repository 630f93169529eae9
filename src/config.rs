//! # Configuration Module
//!
//! Runtime settings for Moodlist, stored as JSON in the platform config
//! directory:
//!
//! - Linux: `~/.config/moodlist/config.json`
//! - macOS: `~/Library/Application Support/moodlist/config.json`
//! - Windows: `%APPDATA%\moodlist\config.json`
//!
//! A missing file means defaults. Every field is optional in the file, so a
//! config only needs the keys it wants to change. Command-line flags and the
//! `SPOTIFY_*` environment variables are applied on top by the binary.

use crate::assembler::AssemblerConfig;
use crate::finder::FinderConfig;
use crate::spotify::{RetryPolicy, SpotifyCredentials};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";

/// Returns the platform-appropriate config directory for Moodlist.
///
/// Locates the standard config directory for the current platform and
/// creates the `moodlist` subdirectory inside it if it doesn't exist yet.
///
/// # Platform Behavior
///
/// - **Linux**: `$XDG_CONFIG_HOME/moodlist`, usually `~/.config/moodlist`
/// - **macOS**: `~/Library/Application Support/moodlist`
/// - **Windows**: `%APPDATA%\moodlist`
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path to the moodlist config directory
/// * `Err(anyhow::Error)` - If the directory cannot be determined or created
///
/// # Errors
///
/// This function will return an error if:
/// - The system config directory cannot be determined
/// - The moodlist subdirectory cannot be created due to permissions
/// - The filesystem is read-only
///
/// # Examples
///
/// ```no_run
/// use moodlist::config::get_config_dir;
///
/// let dir = get_config_dir()?;
/// println!("Config lives in {}", dir.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Design Notes
///
/// The config holds the Spotify client secret and refresh token, so it
/// belongs in the per-user config directory rather than next to the binary
/// or in the working directory. Nothing else is written there.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system config directory. Please ensure your platform supports standard config directories."
        )
    })?;

    let moodlist_dir = config_dir.join("moodlist");
    fs::create_dir_all(&moodlist_dir).with_context(|| {
        format!(
            "Failed to create Moodlist config directory at {}. Please check file permissions.",
            moodlist_dir.display()
        )
    })?;

    Ok(moodlist_dir)
}

/// Returns the path of `config.json` inside [`get_config_dir`].
///
/// The directory is created, the file is not: a missing file is read as
/// defaults by [`RuntimeConfig::load_from`] and only written by
/// `moodlist config --init`.
///
/// # Errors
///
/// Same conditions as [`get_config_dir`].
///
/// # Examples
///
/// ```no_run
/// use moodlist::config::get_config_path;
///
/// let path = get_config_path()?;
/// if !path.exists() {
///     println!("No config yet, run `moodlist config --init`");
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Configuration for runtime behavior.
///
/// Deserialized with `#[serde(default)]`, so a file like
///
/// ```json
/// { "market": "GB", "track_limit": 15 }
/// ```
///
/// keeps every other field at its default. Call [`RuntimeConfig::validate`]
/// before handing the values to the finder or the assembler.
///
/// # Examples
///
/// ```
/// use moodlist::config::RuntimeConfig;
///
/// let config: RuntimeConfig = serde_json::from_str(r#"{"track_limit": 15}"#)?;
/// assert_eq!(config.track_limit, 15);
/// assert_eq!(config.market, "US");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Market filter for catalog searches, an ISO 3166-1 alpha-2 code.
    pub market: String,
    /// Tracks per generated playlist.
    pub track_limit: usize,
    /// Results requested per seed-term search. The API caps this at 50.
    pub search_limit: usize,
    /// Seed terms sampled per request.
    pub max_search_terms: usize,
    /// Timeout applied to every catalog HTTP call, in seconds.
    pub request_timeout_secs: u64,
    /// Retries for transient catalog failures. Playlist creation and track
    /// insertion are never retried.
    pub max_retries: u32,
    /// Backoff before the first retry, doubled per retry.
    pub retry_backoff_ms: u64,
    /// Whether new playlists are created public.
    pub public_playlists: bool,
    /// Cover edge length in pixels.
    pub cover_size: u32,
    /// App credentials and refresh token. Overridden per field by the
    /// `SPOTIFY_*` environment variables.
    pub spotify: SpotifyCredentials,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            market: "US".to_string(),
            track_limit: 10,
            search_limit: 20,
            max_search_terms: 8,
            request_timeout_secs: 15,
            max_retries: 3,
            retry_backoff_ms: 500,
            public_playlists: true,
            cover_size: 300,
            spotify: SpotifyCredentials::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from the default location.
    ///
    /// # Errors
    ///
    /// The config directory is unavailable or the file is unreadable.
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Load from `path`, or defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// The file exists but cannot be read or is not valid JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write as pretty-printed JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Any filesystem failure.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Reject settings that would make every request fail or do nothing.
    ///
    /// # Errors
    ///
    /// Names the first offending field.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.market.trim().is_empty(), "market must not be empty");
        ensure!(self.track_limit > 0, "track_limit must be at least 1");
        ensure!(self.search_limit > 0, "search_limit must be at least 1");
        ensure!(self.max_search_terms > 0, "max_search_terms must be at least 1");
        ensure!(self.request_timeout_secs > 0, "request_timeout_secs must be at least 1");
        ensure!(self.cover_size > 0, "cover_size must be at least 1");
        Ok(())
    }

    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig {
            max_terms: self.max_search_terms,
            per_term_limit: self.search_limit,
            market: self.market.clone(),
        }
    }

    #[must_use]
    pub fn assembler_config(&self, attach_cover: bool) -> AssemblerConfig {
        AssemblerConfig {
            track_limit: self.track_limit,
            public: self.public_playlists,
            cover_size: self.cover_size,
            attach_cover,
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Copy safe to print: secrets are masked, empty ones stay empty.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |secret: &str| {
            if secret.is_empty() {
                String::new()
            } else {
                "********".to_string()
            }
        };
        let mut copy = self.clone();
        copy.spotify.client_secret = mask(&self.spotify.client_secret);
        copy.spotify.refresh_token = mask(&self.spotify.refresh_token);
        copy
    }
}
