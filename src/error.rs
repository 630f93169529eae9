//! Failure taxonomy for a playlist request.
//!
//! Callers see exactly one of these per failed request. The `Display` text is
//! meant for users; raw scores and search terms stay in the log.

use crate::catalog::CatalogError;
use crate::cover::CoverError;
use crate::resolver::ResolveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no usable emotion signal in the image")]
    InsufficientSignal,

    #[error("no face found in the image")]
    NoFaceDetected,

    #[error("emotion classification failed: {0}")]
    ClassificationFailed(String),

    #[error("could not create the playlist: {0}")]
    PlaylistCreateFailed(#[source] CatalogError),

    #[error("no tracks found for this mood")]
    NoTracksFound,

    #[error("could not add tracks to the playlist: {0}")]
    TrackInsertFailed(#[source] CatalogError),

    #[error("music catalog is unavailable: {0}")]
    CatalogUnavailable(#[source] CatalogError),

    /// Rendering or uploading the cover failed. `assemble` logs this and
    /// carries on; [`crate::assembler::PlaylistAssembler::attach_cover`]
    /// returns it.
    #[error("could not set the playlist cover: {0}")]
    CoverImageFailed(#[from] CoverError),
}

impl From<ResolveError> for PipelineError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InsufficientSignal => PipelineError::InsufficientSignal,
        }
    }
}

impl PipelineError {
    /// Short machine-friendly name, stable across releases.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            PipelineError::InsufficientSignal => "insufficient_signal",
            PipelineError::NoFaceDetected => "no_face_detected",
            PipelineError::ClassificationFailed(_) => "classification_failed",
            PipelineError::PlaylistCreateFailed(_) => "playlist_create_failed",
            PipelineError::NoTracksFound => "no_tracks_found",
            PipelineError::TrackInsertFailed(_) => "track_insert_failed",
            PipelineError::CatalogUnavailable(_) => "catalog_unavailable",
            PipelineError::CoverImageFailed(_) => "cover_image_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_maps_to_insufficient_signal() {
        let err: PipelineError = ResolveError::InsufficientSignal.into();
        assert!(matches!(err, PipelineError::InsufficientSignal));
        assert_eq!(err.kind(), "insufficient_signal");
    }

    #[test]
    fn test_catalog_detail_stays_in_source_chain() {
        let err = PipelineError::PlaylistCreateFailed(CatalogError::Rejected {
            status: 403,
            message: "insufficient scope".to_string(),
        });
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("catalog rejected request (status 403): insufficient scope")
        );
    }
}
