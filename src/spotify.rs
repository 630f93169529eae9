//! Spotify Web API implementation of [`Catalog`].
//!
//! A [`SpotifyClient`] owns one [`SpotifySession`], minted from a refresh
//! token when the client is created. Build one client per request; sessions
//! are never shared or cached on disk.
//!
//! Every call has a timeout. Idempotent calls (reads, cover upload, unfollow)
//! are retried with exponential backoff while the failure is transient.
//! Playlist creation and track insertion are sent exactly once, since a
//! repeated POST would create a second playlist or duplicate tracks.

use crate::catalog::{AudioFeatures, Catalog, CatalogError, PlaylistHandle, TrackCandidate, AUDIO_FEATURES_BATCH};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use log::{debug, trace, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::thread;
use std::time::Duration;

const API_BASE: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Search accepts at most this many results per page.
const MAX_SEARCH_LIMIT: usize = 50;
/// Track insertion accepts at most this many URIs per call.
const ADD_TRACKS_BATCH: usize = 100;
/// Error bodies are cut to this length before they reach a message.
const MAX_ERROR_BODY: usize = 200;

/// Application credentials plus a user's long-lived refresh token.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl SpotifyCredentials {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.refresh_token.is_empty()
    }

    /// Names of the fields that are still empty.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Bounded retry with exponential backoff for transient catalog failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further one.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Run `op`, retrying while it fails with a transient error.
    ///
    /// # Errors
    ///
    /// The first non-transient error, or the last transient one once retries
    /// are exhausted.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T, CatalogError>
    where
        F: FnMut() -> Result<T, CatalogError>,
    {
        let mut retry = 0;
        loop {
            match op() {
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    let delay = self.delay_for(retry);
                    retry += 1;
                    warn!("{what} failed ({e}), retry {retry}/{} in {delay:?}", self.max_retries);
                    thread::sleep(delay);
                }
                result => return result,
            }
        }
    }
}

/// Map a non-success HTTP status to a catalog error.
///
/// Throttling and server errors are transient; everything else is a
/// rejection of this particular request.
#[must_use]
pub fn status_error(status: u16, body: &str) -> CatalogError {
    let mut message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    if message.is_empty() {
        message = "empty response body".to_string();
    }
    if status == 429 || status >= 500 {
        CatalogError::Unavailable(format!("status {status}: {message}"))
    } else {
        CatalogError::Rejected { status, message }
    }
}

fn transport_error(err: &reqwest::Error) -> CatalogError {
    if err.is_decode() {
        CatalogError::Decode(err.to_string())
    } else {
        CatalogError::Unavailable(err.to_string())
    }
}

fn check(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(status_error(status.as_u16(), &body))
}

/// An access token for one request's worth of catalog calls.
#[derive(Clone)]
pub struct SpotifySession {
    access_token: String,
    expires_in: Duration,
}

impl fmt::Debug for SpotifySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifySession")
            .field("access_token", &redact(&self.access_token))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

impl SpotifySession {
    /// Exchange the refresh token for a fresh access token.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Unavailable`] whenever no token could be issued,
    /// including rejected credentials and malformed token responses.
    pub fn refresh(
        http: &Client,
        credentials: &SpotifyCredentials,
        retry: &RetryPolicy,
    ) -> Result<Self, CatalogError> {
        Self::refresh_at(http, TOKEN_URL, credentials, retry)
    }

    fn refresh_at(
        http: &Client,
        token_url: &str,
        credentials: &SpotifyCredentials,
        retry: &RetryPolicy,
    ) -> Result<Self, CatalogError> {
        if !credentials.is_complete() {
            return Err(CatalogError::Unavailable(format!(
                "missing Spotify credentials: {}",
                credentials.missing().join(", ")
            )));
        }

        let basic = BASE64_STANDARD.encode(format!(
            "{}:{}",
            credentials.client_id, credentials.client_secret
        ));
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", credentials.refresh_token.as_str()),
        ];

        let token: TokenResponse = retry
            .run("token refresh", || {
                let response = http
                    .post(token_url)
                    .header("Authorization", format!("Basic {basic}"))
                    .form(&form)
                    .send()
                    .map_err(|e| transport_error(&e))?;
                check(response)?.json().map_err(|e| transport_error(&e))
            })
            .map_err(|e| match e {
                CatalogError::Rejected { status, message } => {
                    CatalogError::Unavailable(format!("authorization failed (status {status}): {message}"))
                }
                CatalogError::Decode(detail) => {
                    CatalogError::Unavailable(format!("malformed token response: {detail}"))
                }
                other => other,
            })?;

        debug!("Obtained access token valid for {}s", token.expires_in);
        Ok(Self {
            access_token: token.access_token,
            expires_in: Duration::from_secs(token.expires_in),
        })
    }

    /// Wrap a token obtained elsewhere.
    #[must_use]
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in: Duration::ZERO,
        }
    }
}

// Response payloads. Only the fields in use are declared.

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Page<ApiTrack>,
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<Option<T>>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
struct ApiTrack {
    uri: String,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
}

#[derive(Deserialize)]
struct ApiArtist {
    name: String,
}

impl From<ApiTrack> for TrackCandidate {
    fn from(track: ApiTrack) -> Self {
        TrackCandidate {
            uri: track.uri,
            title: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
        }
    }
}

#[derive(Deserialize)]
struct ApiPlaylist {
    id: String,
    name: String,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Deserialize, Default)]
struct ExternalUrls {
    #[serde(default)]
    spotify: String,
}

impl From<ApiPlaylist> for PlaylistHandle {
    fn from(playlist: ApiPlaylist) -> Self {
        PlaylistHandle {
            id: playlist.id,
            name: playlist.name,
            url: playlist.external_urls.spotify,
        }
    }
}

#[derive(Deserialize)]
struct ApiUser {
    id: String,
}

#[derive(Deserialize)]
struct AudioFeaturesResponse {
    #[serde(default)]
    audio_features: Vec<Option<AudioFeatures>>,
}

/// Blocking Spotify Web API client bound to one session.
pub struct SpotifyClient {
    http: Client,
    session: SpotifySession,
    retry: RetryPolicy,
    api_base: String,
}

impl SpotifyClient {
    /// Build an HTTP client with `timeout` and mint a session.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Unavailable`] if the HTTP client cannot be built or no
    /// access token can be obtained.
    pub fn connect(
        credentials: &SpotifyCredentials,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| transport_error(&e))?;
        let session = SpotifySession::refresh(&http, credentials, &retry)?;
        Ok(Self::with_session(http, session, retry))
    }

    #[must_use]
    pub fn with_session(http: Client, session: SpotifySession, retry: RetryPolicy) -> Self {
        Self {
            http,
            session,
            retry,
            api_base: API_BASE.to_string(),
        }
    }

    /// Point the client at another API root, e.g. a local mock server.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn send<F>(&self, what: &str, idempotent: bool, build: F) -> Result<Response, CatalogError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let policy = if idempotent { self.retry } else { RetryPolicy::none() };
        policy.run(what, || {
            trace!("Sending {what}");
            let response = build(&self.http)
                .bearer_auth(&self.session.access_token)
                .send()
                .map_err(|e| transport_error(&e))?;
            check(response)
        })
    }

    fn get_json<T, F>(&self, what: &str, build: F) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        self.send(what, true, build)?
            .json()
            .map_err(|e| CatalogError::Decode(format!("{what}: {e}")))
    }
}

impl Catalog for SpotifyClient {
    fn search_tracks(
        &self,
        term: &str,
        limit: usize,
        market: &str,
    ) -> Result<Vec<TrackCandidate>, CatalogError> {
        let url = self.url("/search");
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();
        let response: SearchResponse = self.get_json("search", |http| {
            http.get(&url).query(&[
                ("q", term),
                ("type", "track"),
                ("limit", limit.as_str()),
                ("market", market),
            ])
        })?;

        Ok(response
            .tracks
            .items
            .into_iter()
            .flatten()
            .map(TrackCandidate::from)
            .collect())
    }

    fn current_user_id(&self) -> Result<String, CatalogError> {
        let url = self.url("/me");
        let user: ApiUser = self.get_json("current user", |http| http.get(&url))?;
        Ok(user.id)
    }

    fn create_playlist(
        &self,
        owner: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistHandle, CatalogError> {
        let url = self.url(&format!("/users/{owner}/playlists"));
        let body = json!({ "name": name, "description": description, "public": public });
        let playlist: ApiPlaylist = self
            .send("create playlist", false, |http| http.post(&url).json(&body))?
            .json()
            .map_err(|e| CatalogError::Decode(format!("create playlist: {e}")))?;
        Ok(playlist.into())
    }

    fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(), CatalogError> {
        let url = self.url(&format!("/playlists/{playlist_id}/tracks"));
        for batch in uris.chunks(ADD_TRACKS_BATCH) {
            let body = json!({ "uris": batch });
            self.send("add tracks", false, |http| http.post(&url).json(&body))?;
        }
        Ok(())
    }

    fn upload_cover_image(&self, playlist_id: &str, jpeg: &[u8]) -> Result<(), CatalogError> {
        let url = self.url(&format!("/playlists/{playlist_id}/images"));
        let payload = BASE64_STANDARD.encode(jpeg);
        self.send("upload cover", true, |http| {
            http.put(&url)
                .header(CONTENT_TYPE, "image/jpeg")
                .body(payload.clone())
        })?;
        Ok(())
    }

    fn audio_features(&self, track_ids: &[String]) -> Result<Vec<AudioFeatures>, CatalogError> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.url("/audio-features");
        let ids = track_ids[..track_ids.len().min(AUDIO_FEATURES_BATCH)].join(",");
        let response: AudioFeaturesResponse =
            self.get_json("audio features", |http| http.get(&url).query(&[("ids", ids.as_str())]))?;
        Ok(response.audio_features.into_iter().flatten().collect())
    }

    fn user_playlists(&self) -> Result<Vec<PlaylistHandle>, CatalogError> {
        let mut playlists = Vec::new();
        let mut next = Some(self.url("/me/playlists?limit=50"));

        while let Some(url) = next {
            let page: Page<ApiPlaylist> = self.get_json("list playlists", |http| http.get(&url))?;
            playlists.extend(page.items.into_iter().flatten().map(PlaylistHandle::from));
            next = page.next;
        }

        debug!("Current user has {} playlists", playlists.len());
        Ok(playlists)
    }

    fn unfollow_playlist(&self, playlist_id: &str) -> Result<(), CatalogError> {
        let url = self.url(&format!("/playlists/{playlist_id}/followers"));
        self.send("unfollow playlist", true, |http| http.delete(&url))?;
        Ok(())
    }
}
