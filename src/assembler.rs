//! # Playlist Assembler
//!
//! Drives the catalog mutations for one resolved mood:
//!
//! 1. swap `Neutral` for a more specific mood ([`MoodLabel::for_playlist`]);
//! 2. create the playlist;
//! 3. run the [`TrackFinder`]; an empty result fails the request but leaves
//!    the (empty) playlist in place;
//! 4. insert the tracks;
//! 5. optionally render and upload a cover from the face region. Cover
//!    failures are logged and never fail the request.
//!
//! Also home to the clean-up of previously generated playlists.

use crate::catalog::{Catalog, CatalogError, PlaylistHandle};
use crate::cover::{render_cover, CoverError, DEFAULT_COVER_SIZE};
use crate::error::PipelineError;
use crate::finder::TrackFinder;
use crate::mood::MoodLabel;
use image::DynamicImage;
use log::{debug, error, info, warn};
use rand::Rng;

/// Generated playlists are recognised by this marker in their name.
pub const MOOD_PLAYLIST_MARKER: &str = "Mood";

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Tracks requested from the finder.
    pub track_limit: usize,
    pub public: bool,
    /// Cover edge length in pixels.
    pub cover_size: u32,
    pub attach_cover: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            track_limit: 10,
            public: true,
            cover_size: DEFAULT_COVER_SIZE,
            attach_cover: true,
        }
    }
}

/// A playlist that was created and filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistResult {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Mood the playlist was built for, after the neutral substitution.
    pub mood: MoodLabel,
    /// Inserted track URIs, in insertion order.
    pub track_uris: Vec<String>,
    /// JPEG that was uploaded as the cover, if any.
    pub cover_image: Option<Vec<u8>>,
}

#[must_use]
pub fn playlist_name(mood: MoodLabel) -> String {
    format!("{} {MOOD_PLAYLIST_MARKER} — curated", mood.name())
}

#[must_use]
pub fn playlist_description(mood: MoodLabel) -> String {
    format!(
        "Tracks picked to match a {} mood, generated from a facial expression.",
        mood.name().to_lowercase()
    )
}

#[derive(Debug, Clone, Default)]
pub struct PlaylistAssembler {
    finder: TrackFinder,
    config: AssemblerConfig,
}

impl PlaylistAssembler {
    #[must_use]
    pub fn new(finder: TrackFinder, config: AssemblerConfig) -> Self {
        Self { finder, config }
    }

    #[must_use]
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Create and fill a playlist for `mood`.
    ///
    /// `face` is the region the cover is rendered from; pass `None` to skip
    /// the cover regardless of configuration.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::CatalogUnavailable`] if any catalog step fails
    ///   transiently, e.g. on a timeout
    /// - [`PipelineError::PlaylistCreateFailed`] if creation is rejected; no
    ///   further catalog calls are made
    /// - [`PipelineError::NoTracksFound`] if every search came back empty
    /// - [`PipelineError::TrackInsertFailed`] if insertion is rejected
    pub fn assemble<C, R>(
        &self,
        catalog: &C,
        mood: MoodLabel,
        face: Option<&DynamicImage>,
        rng: &mut R,
    ) -> Result<PlaylistResult, PipelineError>
    where
        C: Catalog + ?Sized,
        R: Rng + ?Sized,
    {
        let mood = mood.for_playlist();
        let name = playlist_name(mood);

        let owner = catalog.current_user_id().map_err(|e| {
            error!("Failed to look up current user: {e}");
            classify(e, PipelineError::PlaylistCreateFailed)
        })?;

        let playlist = catalog
            .create_playlist(&owner, &name, &playlist_description(mood), self.config.public)
            .map_err(|e| {
                error!("Failed to create playlist '{name}': {e}");
                classify(e, PipelineError::PlaylistCreateFailed)
            })?;
        info!("Created playlist '{}' ({})", playlist.name, playlist.id);

        let tracks = self
            .finder
            .find_tracks(catalog, mood, self.config.track_limit, rng);
        if tracks.is_empty() {
            warn!("No tracks for {mood}; playlist {} left empty", playlist.id);
            return Err(PipelineError::NoTracksFound);
        }

        let track_uris: Vec<String> = tracks.into_iter().map(|t| t.uri).collect();
        catalog.add_tracks(&playlist.id, &track_uris).map_err(|e| {
            error!("Failed to add {} tracks to {}: {e}", track_uris.len(), playlist.id);
            classify(e, PipelineError::TrackInsertFailed)
        })?;
        info!("Added {} tracks to '{}'", track_uris.len(), playlist.name);

        let cover_image = match face {
            Some(face) if self.config.attach_cover => {
                match self.attach_cover(catalog, &playlist, face) {
                    Ok(jpeg) => Some(jpeg),
                    Err(e) => {
                        warn!("Skipping cover for {} ({}): {e}", playlist.id, e.kind());
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(PlaylistResult {
            id: playlist.id,
            name: playlist.name,
            url: playlist.url,
            mood,
            track_uris,
            cover_image,
        })
    }

    /// Render the cover and upload it; returns the uploaded JPEG.
    ///
    /// # Errors
    ///
    /// [`PipelineError::CoverImageFailed`] when rendering or the upload fails.
    pub fn attach_cover<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        playlist: &PlaylistHandle,
        face: &DynamicImage,
    ) -> Result<Vec<u8>, PipelineError> {
        let jpeg = render_cover(face, self.config.cover_size)?;
        catalog
            .upload_cover_image(&playlist.id, &jpeg)
            .map_err(CoverError::from)?;
        debug!("Uploaded {} byte cover to {}", jpeg.len(), playlist.id);
        Ok(jpeg)
    }
}

/// Transient failures (timeouts, throttling, outages) are reported as
/// [`PipelineError::CatalogUnavailable`] whichever call hit them; anything
/// else gets the step-specific variant.
fn classify(err: CatalogError, step: fn(CatalogError) -> PipelineError) -> PipelineError {
    if err.is_transient() {
        PipelineError::CatalogUnavailable(err)
    } else {
        step(err)
    }
}

/// Outcome of [`purge_mood_playlists`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Playlists whose name carries [`MOOD_PLAYLIST_MARKER`].
    pub matched: Vec<PlaylistHandle>,
    pub removed: usize,
    pub failed: usize,
}

/// Unfollow every playlist of the current user whose name contains
/// [`MOOD_PLAYLIST_MARKER`]. With `dry_run` nothing is removed.
///
/// # Errors
///
/// Only listing the playlists is fatal; a failing unfollow is counted in
/// [`PurgeReport::failed`].
pub fn purge_mood_playlists<C: Catalog + ?Sized>(
    catalog: &C,
    dry_run: bool,
) -> Result<PurgeReport, CatalogError> {
    let matched: Vec<PlaylistHandle> = catalog
        .user_playlists()?
        .into_iter()
        .filter(|p| p.name.contains(MOOD_PLAYLIST_MARKER))
        .collect();

    let mut report = PurgeReport {
        matched,
        ..PurgeReport::default()
    };
    if dry_run {
        return Ok(report);
    }

    for playlist in &report.matched {
        match catalog.unfollow_playlist(&playlist.id) {
            Ok(()) => {
                info!("Removed playlist '{}'", playlist.name);
                report.removed += 1;
            }
            Err(e) => {
                warn!("Could not remove playlist '{}': {e}", playlist.name);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
