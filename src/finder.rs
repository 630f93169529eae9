//! # Track Finder
//!
//! Builds a diverse candidate set for a mood:
//!
//! 1. sample up to `max_terms` seed terms from the mood's profile;
//! 2. search the catalog once per term (a failing term counts as zero hits);
//! 3. pool the results and drop repeated URIs, keeping first-seen order;
//! 4. sample `min(limit, pool)` tracks uniformly without replacement.
//!
//! Sampling both the terms and the final tracks keeps one query's ranking
//! from dominating and stops repeated runs for the same mood from returning
//! the same playlist.

use crate::catalog::{Catalog, TrackCandidate};
use crate::mood::MoodLabel;
use crate::profile::profile_for;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Most seed terms searched per request.
    pub max_terms: usize,
    /// Results requested per search call.
    pub per_term_limit: usize,
    /// Market filter passed to every search.
    pub market: String,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            max_terms: 8,
            per_term_limit: 20,
            market: "US".to_string(),
        }
    }
}

/// Track Finder bound to a configuration.
#[derive(Debug, Clone, Default)]
pub struct TrackFinder {
    config: FinderConfig,
}

/// Everything a finder run saw. Useful for logs and the `search` command.
#[derive(Debug, Clone, Default)]
pub struct FinderReport {
    pub terms: Vec<&'static str>,
    pub failed_terms: Vec<&'static str>,
    /// Total hits before deduplication.
    pub raw_hits: usize,
    /// Size of the deduplicated candidate pool.
    pub pool_size: usize,
    pub tracks: Vec<TrackCandidate>,
}

impl TrackFinder {
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find up to `limit` unique tracks for `mood`.
    ///
    /// Returns an empty list, not an error, when no search produced anything.
    pub fn find_tracks<C, R>(
        &self,
        catalog: &C,
        mood: MoodLabel,
        limit: usize,
        rng: &mut R,
    ) -> Vec<TrackCandidate>
    where
        C: Catalog + ?Sized,
        R: Rng + ?Sized,
    {
        self.find_tracks_detailed(catalog, mood, limit, rng).tracks
    }

    /// Same as [`TrackFinder::find_tracks`] but keeps the bookkeeping.
    pub fn find_tracks_detailed<C, R>(
        &self,
        catalog: &C,
        mood: MoodLabel,
        limit: usize,
        rng: &mut R,
    ) -> FinderReport
    where
        C: Catalog + ?Sized,
        R: Rng + ?Sized,
    {
        let profile = profile_for(mood);
        let terms: Vec<&'static str> = profile
            .seed_terms
            .choose_multiple(rng, self.config.max_terms.min(profile.seed_terms.len()))
            .copied()
            .collect();

        info!("Searching {} terms for {mood} mood", terms.len());

        let mut report = FinderReport {
            terms: terms.clone(),
            ..FinderReport::default()
        };
        let mut pooled = Vec::new();

        for term in terms {
            match catalog.search_tracks(term, self.config.per_term_limit, &self.config.market) {
                Ok(tracks) => {
                    debug!("Found {} tracks for '{term}'", tracks.len());
                    pooled.extend(tracks);
                }
                Err(e) => {
                    warn!("Search error for term '{term}': {e}");
                    report.failed_terms.push(term);
                }
            }
        }

        report.raw_hits = pooled.len();
        let pool = dedup_by_uri(pooled);
        report.pool_size = pool.len();

        if pool.is_empty() {
            info!("No tracks found for {mood} mood");
            return report;
        }

        report.tracks = pool
            .choose_multiple(rng, limit.min(pool.len()))
            .cloned()
            .collect();

        info!(
            "Selected {} of {} unique tracks for {mood} mood",
            report.tracks.len(),
            report.pool_size
        );
        for track in &report.tracks {
            debug!("- {} by {}", track.title, track.artist_line());
        }

        report
    }
}

/// Drop tracks whose URI was already seen, preserving first-seen order.
#[must_use]
pub fn dedup_by_uri(tracks: Vec<TrackCandidate>) -> Vec<TrackCandidate> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|track| seen.insert(track.uri.clone()))
        .collect()
}
