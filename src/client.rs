use crate::config::ClientConfig;
use crate::entry::ScrobbleMethod;
use crate::events::{ClientEvent, ClientEventReceiver, SharedEventBroadcaster};
use crate::outcome::FatalKind;
use crate::request::SubmissionRequest;
use crate::session::{NoSessionRefresh, SessionRefresher, SessionStore};
use crate::{LastFmError, Result, ScrobbleEntry, Session, SubmissionClient, SubmissionOutcome};
use async_trait::async_trait;
use http_client::HttpClient;
use http_types::Url;
use std::sync::Arc;

/// Main client for submitting now-playing reports and scrobbles.
///
/// The client is cheap to clone; clones share the HTTP client, the session
/// store and the event broadcaster. When the server reports a stale session
/// key, the client re-authenticates through its [`SessionRefresher`] and
/// resends the same entry with a fresh signature, at most
/// [`ClientConfig::max_session_refreshes`] times per call.
///
/// # Examples
///
/// ```rust,no_run
/// use lastfm_scrobble::{
///     PlaybackSource, ScrobbleEntry, ScrobbleMode, Session, SubmissionClient,
///     SubmissionClientImpl,
/// };
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> lastfm_scrobble::Result<()> {
///     let http_client = http_client::native::NativeClient::new();
///     let session = Session::with_session_key("api-key", "api-secret", "session-key");
///     let client = SubmissionClientImpl::new(Box::new(http_client), session)?;
///
///     let entry = ScrobbleEntry::new(
///         "Radiohead",
///         "Idioteque",
///         chrono::Utc::now(),
///         PlaybackSource::User,
///         Duration::from_secs(309),
///         ScrobbleMode::Played,
///     )?;
///
///     client.report_now_playing(&entry).await.into_result()?;
///     client.scrobble(&entry).await.into_result()?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SubmissionClientImpl {
    client: Arc<dyn HttpClient + Send + Sync>,
    store: Arc<SessionStore>,
    endpoint: Url,
    config: ClientConfig,
    broadcaster: Arc<SharedEventBroadcaster>,
}

enum SubmissionState {
    Signing,
    NeedsReauth { stale_key: Option<String> },
}

impl SubmissionClientImpl {
    /// Create a client that cannot re-authenticate; a rejected session key is fatal.
    pub fn new(client: Box<dyn HttpClient + Send + Sync>, session: Session) -> Result<Self> {
        Self::with_refresher(client, session, Arc::new(NoSessionRefresh))
    }

    /// Create a client that re-authenticates through `refresher`.
    pub fn with_refresher(
        client: Box<dyn HttpClient + Send + Sync>,
        session: Session,
        refresher: Arc<dyn SessionRefresher>,
    ) -> Result<Self> {
        Self::with_config(Arc::from(client), session, refresher, ClientConfig::default())
    }

    /// Create a client with custom configuration.
    ///
    /// Returns [`LastFmError::Config`] if the configured endpoint is not a valid URL.
    pub fn with_config(
        client: Arc<dyn HttpClient + Send + Sync>,
        session: Session,
        refresher: Arc<dyn SessionRefresher>,
        config: ClientConfig,
    ) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| LastFmError::Config(format!("invalid endpoint: {e}")))?;
        let broadcaster = Arc::new(SharedEventBroadcaster::new());
        let store = Arc::new(SessionStore::new(session, refresher, broadcaster.clone()));

        Ok(Self {
            client,
            store,
            endpoint,
            config,
            broadcaster,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The credential store shared by all clones of this client.
    pub fn session_store(&self) -> Arc<SessionStore> {
        self.store.clone()
    }

    /// The event broadcaster shared by all clones of this client.
    pub fn event_broadcaster(&self) -> Arc<SharedEventBroadcaster> {
        self.broadcaster.clone()
    }

    pub fn subscribe(&self) -> ClientEventReceiver {
        self.broadcaster.subscribe()
    }

    pub fn latest_event(&self) -> Option<ClientEvent> {
        self.broadcaster.latest_event()
    }

    async fn submit(&self, entry: &ScrobbleEntry, method: ScrobbleMethod) -> SubmissionOutcome {
        let started = std::time::Instant::now();
        log::debug!("Submitting {method}: {entry}");

        let outcome = self.run_submission(entry, method).await;

        match &outcome {
            SubmissionOutcome::Success => log::debug!("{method} accepted"),
            other => log::warn!("{method} for '{entry}' failed: {other}"),
        }
        self.broadcaster
            .broadcast_event(ClientEvent::SubmissionFinished {
                api_method: method.as_str().to_string(),
                outcome: outcome.clone(),
                duration_ms: started.elapsed().as_millis() as u64,
            });

        outcome
    }

    async fn run_submission(
        &self,
        entry: &ScrobbleEntry,
        method: ScrobbleMethod,
    ) -> SubmissionOutcome {
        let mut refreshes = 0;
        let mut state = SubmissionState::Signing;

        loop {
            state = match state {
                SubmissionState::Signing => {
                    let session = self.store.snapshot().await;
                    match entry.signed_parameters(method, &session) {
                        Ok(params) => match self.send_signed(params).await {
                            SubmissionOutcome::RetryableSessionError => {
                                log::info!("Session key rejected during {method}");
                                SubmissionState::NeedsReauth {
                                    stale_key: session.session_key,
                                }
                            }
                            outcome => return outcome,
                        },
                        Err(_) => {
                            log::debug!("Session has no key, authenticating before {method}");
                            SubmissionState::NeedsReauth { stale_key: None }
                        }
                    }
                }
                SubmissionState::NeedsReauth { stale_key } => {
                    if refreshes >= self.config.max_session_refreshes {
                        log::warn!(
                            "Session refresh budget ({}) exhausted for {method}",
                            self.config.max_session_refreshes
                        );
                        return SubmissionOutcome::fatal(
                            FatalKind::AuthenticationFailure,
                            format!("session key still rejected after {refreshes} refresh(es)"),
                        );
                    }
                    refreshes += 1;

                    if let Err(e) = self.store.refresh(stale_key.as_deref()).await {
                        return SubmissionOutcome::fatal(
                            FatalKind::AuthenticationFailure,
                            e.to_string(),
                        );
                    }
                    SubmissionState::Signing
                }
            };
        }
    }

    async fn send_signed(&self, params: crate::ParameterSet) -> SubmissionOutcome {
        SubmissionRequest::new(self.endpoint.clone(), params)
            .execute(
                self.client.as_ref(),
                &self.config.user_agent,
                &self.broadcaster,
            )
            .await
    }
}

#[async_trait]
impl SubmissionClient for SubmissionClientImpl {
    async fn report_now_playing(&self, entry: &ScrobbleEntry) -> SubmissionOutcome {
        self.submit(entry, ScrobbleMethod::NowPlaying).await
    }

    async fn scrobble(&self, entry: &ScrobbleEntry) -> SubmissionOutcome {
        self.submit(entry, ScrobbleMethod::Scrobble).await
    }

    async fn session(&self) -> Session {
        self.store.snapshot().await
    }
}

impl std::fmt::Debug for SubmissionClientImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionClientImpl")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
