//! Playback events and their projection into request parameters.

use crate::signer;
use crate::{LastFmError, ParameterSet, Result, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The API method a [`ScrobbleEntry`] is submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrobbleMethod {
    /// `track.updateNowPlaying`
    NowPlaying,
    /// `track.scrobble`
    Scrobble,
}

impl ScrobbleMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrobbleMethod::NowPlaying => "track.updateNowPlaying",
            ScrobbleMethod::Scrobble => "track.scrobble",
        }
    }
}

impl fmt::Display for ScrobbleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the played track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackSource {
    /// Chosen by the user
    #[default]
    User,
    /// Non-personalised broadcast, e.g. a radio station
    NonPersonalizedBroadcast,
    /// Personalised recommendation other than Last.fm
    PersonalizedRecommendation,
    /// Last.fm radio
    Lastfm,
    /// Source unknown
    Unknown,
}

/// How the listener reacted to the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScrobbleMode {
    #[default]
    Played,
    Loved,
    Banned,
    Skipped,
}

/// A single playback event.
///
/// Entries are validated at construction and immutable afterwards; optional
/// metadata is attached with the `with_*` builder methods.
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use lastfm_scrobble::{PlaybackSource, ScrobbleEntry, ScrobbleMode};
/// use std::time::Duration;
///
/// let entry = ScrobbleEntry::new(
///     "Radiohead",
///     "Idioteque",
///     Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
///     PlaybackSource::User,
///     Duration::from_secs(309),
///     ScrobbleMode::Played,
/// )?
/// .with_album("Kid A")
/// .with_track_number(8);
///
/// assert_eq!(entry.album(), Some("Kid A"));
/// # Ok::<(), lastfm_scrobble::LastFmError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScrobbleEntry {
    artist: String,
    title: String,
    album: Option<String>,
    duration: Duration,
    started_at: DateTime<Utc>,
    source: PlaybackSource,
    mode: ScrobbleMode,
    track_number: Option<u32>,
    mbid: Option<String>,
    recommendation_key: Option<String>,
}

impl ScrobbleEntry {
    /// Create an entry for a track whose playback started at `started_at`.
    ///
    /// `started_at` must be the moment playback began; the service uses it to
    /// de-duplicate scrobbles. Returns [`LastFmError::InvalidEntry`] if the
    /// artist or title is empty.
    pub fn new(
        artist: impl Into<String>,
        title: impl Into<String>,
        started_at: DateTime<Utc>,
        source: PlaybackSource,
        duration: Duration,
        mode: ScrobbleMode,
    ) -> Result<Self> {
        let artist = artist.into();
        let title = title.into();

        if artist.trim().is_empty() {
            return Err(LastFmError::InvalidEntry(
                "artist must not be empty".to_string(),
            ));
        }
        if title.trim().is_empty() {
            return Err(LastFmError::InvalidEntry(
                "title must not be empty".to_string(),
            ));
        }

        Ok(Self {
            artist,
            title,
            album: None,
            duration,
            started_at,
            source,
            mode,
            track_number: None,
            mbid: None,
            recommendation_key: None,
        })
    }

    /// Set the album. An empty name leaves the album unset.
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = non_empty(album.into());
        self
    }

    /// Set the position of the track on its album.
    pub fn with_track_number(mut self, track_number: u32) -> Self {
        self.track_number = Some(track_number);
        self
    }

    /// Set the MusicBrainz recording ID. An empty ID leaves it unset.
    pub fn with_mbid(mut self, mbid: impl Into<String>) -> Self {
        self.mbid = non_empty(mbid.into());
        self
    }

    /// Set the recommendation key handed out by Last.fm radio.
    pub fn with_recommendation_key(mut self, key: impl Into<String>) -> Self {
        self.recommendation_key = non_empty(key.into());
        self
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn album(&self) -> Option<&str> {
        self.album.as_deref()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn source(&self) -> PlaybackSource {
        self.source
    }

    pub fn mode(&self) -> ScrobbleMode {
        self.mode
    }

    pub fn track_number(&self) -> Option<u32> {
        self.track_number
    }

    pub fn mbid(&self) -> Option<&str> {
        self.mbid.as_deref()
    }

    pub fn recommendation_key(&self) -> Option<&str> {
        self.recommendation_key.as_deref()
    }

    /// Project this entry into the unsigned parameters of `method`.
    pub fn to_parameters(
        &self,
        method: ScrobbleMethod,
        api_key: &str,
        session_key: &str,
    ) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.set("method", method.as_str());
        params.set("api_key", api_key);
        params.set("sk", session_key);
        params.set("artist", self.artist.as_str());
        params.set("track", self.title.as_str());
        params.set("duration", self.duration.as_secs().to_string());

        if let Some(album) = &self.album {
            params.set("album", album.as_str());
        }
        if let Some(track_number) = self.track_number {
            params.set("trackNumber", track_number.to_string());
        }
        if let Some(mbid) = &self.mbid {
            params.set("mbid", mbid.as_str());
        }
        if method == ScrobbleMethod::Scrobble {
            params.set("timestamp", self.started_at.timestamp().to_string());
        }

        params
    }

    /// Project this entry for `method` and sign it with the session's credentials.
    ///
    /// Returns [`LastFmError::Auth`] if the session has no session key.
    pub fn signed_parameters(
        &self,
        method: ScrobbleMethod,
        session: &Session,
    ) -> Result<ParameterSet> {
        let session_key = session
            .session_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| LastFmError::Auth("session has no session key".to_string()))?;

        let mut params = self.to_parameters(method, &session.api_key, session_key);
        signer::apply_signature(&mut params, &session.api_secret);
        Ok(params)
    }
}

impl fmt::Display for ScrobbleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.artist, self.title, self.started_at)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
