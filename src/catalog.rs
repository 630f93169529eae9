//! # Music Catalog Interface
//!
//! The catalog service is the system of record for tracks and playlists. The
//! pipeline only talks to it through the [`Catalog`] trait so the HTTP client
//! ([`crate::spotify::SpotifyClient`]) can be swapped for an in-memory stub in
//! tests.
//!
//! Every call may fail; [`CatalogError::is_transient`] tells callers which
//! failures are worth retrying.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Audio-feature lookups are capped at this many identifiers per call.
pub const AUDIO_FEATURES_BATCH: usize = 50;

/// A track returned by a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackCandidate {
    /// Catalog-assigned unique identifier, e.g. `spotify:track:4pfrrhvplbJZAIsfosGWQP`.
    pub uri: String,
    pub title: String,
    pub artists: Vec<String>,
}

impl TrackCandidate {
    /// Bare track id: the last `:`-separated segment of the URI.
    #[must_use]
    pub fn track_id(&self) -> &str {
        self.uri.rsplit(':').next().unwrap_or(&self.uri)
    }

    #[must_use]
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// A playlist as known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistHandle {
    pub id: String,
    pub name: String,
    /// Shareable external URL.
    pub url: String,
}

/// Per-track audio analysis. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFeatures {
    pub id: String,
    pub valence: Option<f64>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub tempo: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub loudness: Option<f64>,
}

impl AudioFeatures {
    /// Look a feature up by its catalog name.
    #[must_use]
    pub fn value(&self, feature: &str) -> Option<f64> {
        match feature {
            "valence" => self.valence,
            "energy" => self.energy,
            "danceability" => self.danceability,
            "tempo" => self.tempo,
            "acousticness" => self.acousticness,
            "instrumentalness" => self.instrumentalness,
            "loudness" => self.loudness,
            _ => None,
        }
    }
}

/// Failure talking to the catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Network failure, timeout, throttling, server error, or the auth
    /// endpoint could not issue a token.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("catalog rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected catalog response: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Only [`CatalogError::Unavailable`] is expected to clear up on its own.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, CatalogError::Unavailable(_))
    }
}

/// Operations the pipeline needs from a music catalog.
///
/// Implementations hold their own session; nothing here is shared across
/// requests.
pub trait Catalog {
    /// Keyword search for tracks, at most `limit` results, filtered to `market`.
    ///
    /// # Errors
    ///
    /// Any transport or API failure.
    fn search_tracks(
        &self,
        term: &str,
        limit: usize,
        market: &str,
    ) -> Result<Vec<TrackCandidate>, CatalogError>;

    /// Id of the user the session is authenticated as.
    ///
    /// # Errors
    ///
    /// Any transport or API failure.
    fn current_user_id(&self) -> Result<String, CatalogError>;

    /// # Errors
    ///
    /// Any transport or API failure.
    fn create_playlist(
        &self,
        owner: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistHandle, CatalogError>;

    /// Append tracks, in order, to a playlist.
    ///
    /// # Errors
    ///
    /// Any transport or API failure.
    fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(), CatalogError>;

    /// Replace the playlist cover with a JPEG payload.
    ///
    /// # Errors
    ///
    /// Any transport or API failure, including payload-size rejections.
    fn upload_cover_image(&self, playlist_id: &str, jpeg: &[u8]) -> Result<(), CatalogError>;

    /// Audio features for up to [`AUDIO_FEATURES_BATCH`] track ids. Unknown ids
    /// are omitted from the result.
    ///
    /// # Errors
    ///
    /// Any transport or API failure.
    fn audio_features(&self, track_ids: &[String]) -> Result<Vec<AudioFeatures>, CatalogError>;

    /// Playlists owned or followed by the current user.
    ///
    /// # Errors
    ///
    /// Any transport or API failure.
    fn user_playlists(&self) -> Result<Vec<PlaylistHandle>, CatalogError>;

    /// Remove a playlist from the current user's library.
    ///
    /// # Errors
    ///
    /// Any transport or API failure.
    fn unfollow_playlist(&self, playlist_id: &str) -> Result<(), CatalogError>;
}

/// Fetch audio features in batches of `batch_size` ids.
///
/// A failing batch is logged and skipped; the others still contribute.
pub fn fetch_audio_features<C: Catalog + ?Sized>(
    catalog: &C,
    track_ids: &[String],
    batch_size: usize,
) -> Vec<AudioFeatures> {
    let batch_size = batch_size.clamp(1, AUDIO_FEATURES_BATCH);

    track_ids
        .chunks(batch_size)
        .enumerate()
        .flat_map(|(index, batch)| match catalog.audio_features(batch) {
            Ok(features) => {
                debug!("Audio-feature batch {index}: {} of {} ids", features.len(), batch.len());
                features
            }
            Err(e) => {
                warn!("Skipping audio-feature batch {index} ({} ids): {e}", batch.len());
                Vec::new()
            }
        })
        .collect()
}
