use lastfm_scrobble::{
    ClientConfig, MobileSessionAuthenticator, NoSessionRefresh, Session, SessionPersistence,
    SessionRefresher, SubmissionClientImpl,
};
use std::env;
use std::sync::Arc;

/// Credentials read from the environment.
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub session_key: Option<String>,
}

/// Load existing session or create a new client with fresh login.
///
/// Session resolution order:
/// 1. `LASTFM_SESSION_KEY` from the environment
/// 2. A saved session from the XDG directory for the same API key
/// 3. A fresh `auth.getMobileSession` login, saved for future use
///
/// With `force_login` the first two steps are skipped.
pub async fn load_or_create_client(
    credentials: &Credentials,
    force_login: bool,
) -> Result<SubmissionClientImpl, Box<dyn std::error::Error>> {
    let http_client: Arc<dyn http_client::HttpClient + Send + Sync> =
        Arc::new(http_client::native::NativeClient::new());
    let config = ClientConfig::default();

    let authenticator = match (&credentials.username, &credentials.password) {
        (Some(username), Some(password)) => Some(Arc::new(MobileSessionAuthenticator::new(
            http_client.clone(),
            &config,
            username,
            password,
        )?)),
        _ => None,
    };
    let refresher: Arc<dyn SessionRefresher> = match &authenticator {
        Some(authenticator) => authenticator.clone() as Arc<dyn SessionRefresher>,
        None => Arc::new(NoSessionRefresh),
    };

    let mut base = Session::new(credentials.api_key.as_str(), credentials.api_secret.as_str());
    if let Some(username) = &credentials.username {
        base = base.with_username(username.as_str());
    }

    let restored = if force_login {
        None
    } else {
        restore_session(credentials, &base)
    };

    let session = match (restored, &authenticator) {
        (Some(session), _) => session,
        (None, Some(authenticator)) => {
            println!("🔐 No valid session found, performing fresh login...");
            let session = authenticator.authenticate(&base).await?;

            println!("💾 Saving session for future use...");
            if let Err(e) = SessionPersistence::save_session(&session) {
                println!("⚠️  Warning: Failed to save session: {e}");
                println!("   (You'll need to login again next time)");
            } else {
                println!("✅ Session saved successfully");
            }
            session
        }
        (None, None) => {
            return Err(
                "No session available: set LASTFM_SESSION_KEY or LASTFM_USERNAME and LASTFM_PASSWORD"
                    .into(),
            )
        }
    };

    Ok(SubmissionClientImpl::with_config(
        http_client,
        session,
        refresher,
        config,
    )?)
}

fn restore_session(credentials: &Credentials, base: &Session) -> Option<Session> {
    if let Some(session_key) = &credentials.session_key {
        let mut session = base.clone();
        session.session_key = Some(session_key.clone());
        return Some(session);
    }

    let username = credentials.username.as_deref()?;
    if !SessionPersistence::session_exists(username) {
        return None;
    }

    println!("📁 Found existing session for user '{username}', attempting to restore...");
    match SessionPersistence::load_session(username) {
        Ok(session) if session.api_key == base.api_key && session.is_authenticated() => {
            println!("📥 Session loaded successfully");
            Some(Session {
                api_secret: base.api_secret.clone(),
                ..session
            })
        }
        Ok(_) => {
            println!("❌ Saved session belongs to a different API key");
            None
        }
        Err(e) => {
            println!("❌ Failed to load session: {e}");
            let _ = SessionPersistence::remove_session(username);
            None
        }
    }
}

/// Get API credentials and the optional login from environment variables
pub fn get_credentials() -> Result<Credentials, Box<dyn std::error::Error>> {
    let api_key =
        env::var("LASTFM_API_KEY").map_err(|_| "LASTFM_API_KEY environment variable not set")?;
    let api_secret = env::var("LASTFM_API_SECRET")
        .map_err(|_| "LASTFM_API_SECRET environment variable not set")?;

    Ok(Credentials {
        api_key,
        api_secret,
        username: env::var("LASTFM_USERNAME").ok(),
        password: env::var("LASTFM_PASSWORD").ok(),
        session_key: env::var("LASTFM_SESSION_KEY")
            .ok()
            .filter(|key| !key.is_empty()),
    })
}
