use crate::events::{ClientEvent, SharedEventBroadcaster};
use crate::{LastFmError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Credentials used to sign and authorize write requests.
///
/// The API key and shared secret identify the application; the session key
/// proves that the user granted it access. The secret is never transmitted.
/// The session key can be invalidated by Last.fm at any time, for example when
/// the same user authenticates from another client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The Last.fm API key
    pub api_key: String,
    /// The Last.fm API shared secret; never serialized, so it stays out of
    /// persisted sessions and is empty after deserialization
    #[serde(skip_serializing, default)]
    pub api_secret: String,
    /// The session key for write operations, if the session is authenticated
    pub session_key: Option<String>,
    /// The authenticated username, if known
    pub username: Option<String>,
}

impl Session {
    /// Create an unauthenticated session from the application credentials.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            session_key: None,
            username: None,
        }
    }

    /// Create a session that already holds a session key.
    pub fn with_session_key(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        session_key: impl Into<String>,
    ) -> Self {
        Self {
            session_key: Some(session_key.into()),
            ..Self::new(api_key, api_secret)
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Returns true if a session key is present.
    ///
    /// This does not guarantee the key is still accepted by the server.
    pub fn is_authenticated(&self) -> bool {
        self.session_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }

    /// Serialize session to JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize session from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field(
                "session_key",
                &self.session_key.as_ref().map(|_| "<redacted>"),
            )
            .field("username", &self.username)
            .finish()
    }
}

/// Re-establishes a session key after the server invalidated the current one.
///
/// Implementations perform the authentication handshake and return the new
/// session key, or an error if the credentials are permanently invalid.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    async fn refresh(&self, session: &Session) -> Result<String>;
}

/// Refresher for sessions that cannot re-authenticate, such as a session key
/// supplied by the user without a password.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSessionRefresh;

#[async_trait]
impl SessionRefresher for NoSessionRefresh {
    async fn refresh(&self, _session: &Session) -> Result<String> {
        Err(LastFmError::Auth(
            "session key rejected and no way to re-authenticate".to_string(),
        ))
    }
}

/// Shared owner of a mutable [`Session`].
///
/// All requests of one client read credentials from the same store. Refreshes
/// are single-flight: a caller passes the session key it signed with, and if
/// another caller already replaced that key while this one waited at the gate,
/// the replacement is returned without contacting the server again.
pub struct SessionStore {
    session: RwLock<Session>,
    refresh_gate: Mutex<u32>,
    refresher: Arc<dyn SessionRefresher>,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl SessionStore {
    pub fn new(
        session: Session,
        refresher: Arc<dyn SessionRefresher>,
        broadcaster: Arc<SharedEventBroadcaster>,
    ) -> Self {
        Self {
            session: RwLock::new(session),
            refresh_gate: Mutex::new(0),
            refresher,
            broadcaster,
        }
    }

    /// A copy of the current credentials.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Replace the stored session, e.g. after an explicit login.
    pub async fn replace(&self, session: Session) {
        *self.session.write().await = session;
    }

    /// Number of refreshes performed against the server so far.
    pub async fn refresh_count(&self) -> u32 {
        *self.refresh_gate.lock().await
    }

    /// Obtain a session key newer than `stale_key`.
    ///
    /// `stale_key` is the key the caller's rejected request was signed with, or
    /// `None` if the session had no key at all.
    pub async fn refresh(&self, stale_key: Option<&str>) -> Result<String> {
        let mut refreshes = self.refresh_gate.lock().await;

        let current = self.snapshot().await;
        if let Some(current_key) = current.session_key.as_deref() {
            if !current_key.is_empty() && Some(current_key) != stale_key {
                log::debug!("Session key already refreshed by a concurrent request");
                return Ok(current_key.to_string());
            }
        }

        log::info!("Re-authenticating to obtain a new session key");
        let new_key = self.refresher.refresh(&current).await?;
        if new_key.is_empty() {
            return Err(LastFmError::Auth(
                "re-authentication returned an empty session key".to_string(),
            ));
        }

        self.session.write().await.session_key = Some(new_key.clone());
        *refreshes += 1;

        self.broadcaster.broadcast_event(ClientEvent::SessionRefreshed {
            attempt: *refreshes,
        });
        log::debug!("Session key refreshed ({} refreshes so far)", *refreshes);

        Ok(new_key)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
