use crate::config::ClientConfig;
use crate::events::SharedEventBroadcaster;
use crate::outcome::extract_api_error;
use crate::request::SubmissionRequest;
use crate::session::{Session, SessionRefresher};
use crate::signer::{self, md5_hex};
use crate::{LastFmError, ParameterSet, Result};
use async_trait::async_trait;
use http_client::HttpClient;
use http_types::Url;
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Obtains session keys with the `auth.getMobileSession` handshake.
///
/// The password is kept only as its MD5 digest, and is sent only inside the
/// `authToken` digest of username and password hash.
pub struct MobileSessionAuthenticator {
    client: Arc<dyn HttpClient + Send + Sync>,
    endpoint: Url,
    user_agent: String,
    username: String,
    password_md5: String,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl MobileSessionAuthenticator {
    /// Create an authenticator from a plain-text password.
    pub fn new(
        client: Arc<dyn HttpClient + Send + Sync>,
        config: &ClientConfig,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        Self::with_password_md5(client, config, username, &md5_hex(password))
    }

    /// Create an authenticator from the MD5 digest of the password.
    pub fn with_password_md5(
        client: Arc<dyn HttpClient + Send + Sync>,
        config: &ClientConfig,
        username: &str,
        password_md5: &str,
    ) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| LastFmError::Config(format!("invalid endpoint: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            user_agent: config.user_agent.clone(),
            username: username.to_string(),
            password_md5: password_md5.to_string(),
            broadcaster: Arc::new(SharedEventBroadcaster::new()),
        })
    }

    /// Report handshake requests through an existing broadcaster, e.g. the client's.
    pub fn with_shared_broadcaster(mut self, broadcaster: Arc<SharedEventBroadcaster>) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Signed parameters of the handshake request.
    pub fn handshake_parameters(&self, session: &Session) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.set("method", "auth.getMobileSession");
        params.set("api_key", session.api_key.as_str());
        params.set("username", self.username.as_str());
        params.set(
            "authToken",
            md5_hex(&format!("{}{}", self.username, self.password_md5)),
        );
        signer::apply_signature(&mut params, &session.api_secret);
        params
    }

    /// Perform the handshake and return an authenticated copy of `session`.
    pub async fn authenticate(&self, session: &Session) -> Result<Session> {
        let session_key = self.refresh(session).await?;
        let mut authenticated = session.clone().with_username(self.username.as_str());
        authenticated.session_key = Some(session_key);
        Ok(authenticated)
    }
}

#[async_trait]
impl SessionRefresher for MobileSessionAuthenticator {
    async fn refresh(&self, session: &Session) -> Result<String> {
        log::debug!("Requesting mobile session for '{}'", self.username);

        let request =
            SubmissionRequest::new(self.endpoint.clone(), self.handshake_parameters(session));
        let body = request
            .send(self.client.as_ref(), &self.user_agent, &self.broadcaster)
            .await
            .map_err(LastFmError::Http)?;

        parse_session_key(&body)
    }
}

impl std::fmt::Debug for MobileSessionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MobileSessionAuthenticator")
            .field("endpoint", &self.endpoint.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Extract the session key from an `auth.getMobileSession` response.
pub fn parse_session_key(body: &str) -> Result<String> {
    static KEY_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = KEY_PATTERN
        .get_or_init(|| Regex::new(r"<key>\s*([^<\s]+)\s*</key>").expect("key pattern is valid"));

    if let Some((code, message)) = extract_api_error(body) {
        log::debug!("Mobile session request failed with error code {code}");
        return Err(LastFmError::Auth(message));
    }

    pattern
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str().to_string())
        .ok_or_else(|| LastFmError::Parse("no session key in response".to_string()))
}
