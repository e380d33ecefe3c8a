use crate::session::Session;
use crate::{LastFmError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "lastfm-scrobble";

/// Session persistence utilities for managing session data in XDG directories.
///
/// Sessions are stored per-user in the format:
/// `~/.local/share/lastfm-scrobble/users/{username}/session.json`
///
/// The `*_in` variants take the base data directory explicitly, which keeps
/// callers that manage their own storage location off the XDG lookup.
pub struct SessionPersistence;

impl SessionPersistence {
    /// Get the session file path for a given username using XDG directories.
    ///
    /// Returns [`LastFmError::Config`] if the XDG data directory cannot be determined.
    pub fn get_session_path(username: &str) -> Result<PathBuf> {
        Ok(Self::get_session_path_in(&data_dir()?, username))
    }

    /// Get the session file path for a given username below `base_dir`.
    pub fn get_session_path_in(base_dir: &Path, username: &str) -> PathBuf {
        base_dir
            .join(APP_DIR)
            .join("users")
            .join(username)
            .join("session.json")
    }

    /// Save a session to the XDG data directory.
    ///
    /// The session must carry a username; it names the directory the session
    /// is stored in.
    pub fn save_session(session: &Session) -> Result<()> {
        Self::save_session_in(&data_dir()?, session)
    }

    pub fn save_session_in(base_dir: &Path, session: &Session) -> Result<()> {
        let username = session.username.as_deref().ok_or_else(|| {
            LastFmError::Config("Cannot save a session without a username".to_string())
        })?;
        let session_path = Self::get_session_path_in(base_dir, username);

        if let Some(parent) = session_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let session_json = session
            .to_json()
            .map_err(|e| LastFmError::Parse(format!("Failed to serialize session: {e}")))?;
        fs::write(&session_path, session_json)?;

        log::debug!("Session saved to: {}", session_path.display());
        Ok(())
    }

    /// Load a session from the XDG data directory.
    ///
    /// The API shared secret is never saved, so the loaded session has an
    /// empty `api_secret` that the caller must fill in. Returns an error if no
    /// session was saved for `username` or the file cannot be parsed.
    pub fn load_session(username: &str) -> Result<Session> {
        Self::load_session_in(&data_dir()?, username)
    }

    pub fn load_session_in(base_dir: &Path, username: &str) -> Result<Session> {
        let session_path = Self::get_session_path_in(base_dir, username);

        if !session_path.exists() {
            return Err(LastFmError::Config(format!(
                "No saved session found for user: {username}"
            )));
        }

        let session_json = fs::read_to_string(&session_path)?;
        let session = Session::from_json(&session_json)
            .map_err(|e| LastFmError::Parse(format!("Failed to parse session JSON: {e}")))?;

        log::debug!("Session loaded from: {}", session_path.display());
        Ok(session)
    }

    /// Check if a saved session exists for the given username.
    pub fn session_exists(username: &str) -> bool {
        match Self::get_session_path(username) {
            Ok(path) => path.exists(),
            Err(_) => false,
        }
    }

    /// Remove a saved session for the given username.
    pub fn remove_session(username: &str) -> Result<()> {
        Self::remove_session_in(&data_dir()?, username)
    }

    pub fn remove_session_in(base_dir: &Path, username: &str) -> Result<()> {
        let session_path = Self::get_session_path_in(base_dir, username);

        if session_path.exists() {
            fs::remove_file(&session_path)?;
            log::debug!("Session removed from: {}", session_path.display());
        }

        Ok(())
    }

    /// List all usernames that have saved sessions.
    pub fn list_saved_users() -> Result<Vec<String>> {
        Self::list_saved_users_in(&data_dir()?)
    }

    pub fn list_saved_users_in(base_dir: &Path) -> Result<Vec<String>> {
        let users_dir = base_dir.join(APP_DIR).join("users");

        if !users_dir.exists() {
            return Ok(Vec::new());
        }

        let mut users = Vec::new();
        for entry in fs::read_dir(&users_dir)? {
            let entry = entry?;

            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                let session_file = entry.path().join("session.json");
                if session_file.exists() {
                    if let Some(username) = entry.file_name().to_str() {
                        users.push(username.to_string());
                    }
                }
            }
        }

        users.sort();
        Ok(users)
    }
}

fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .ok_or_else(|| LastFmError::Config("Cannot determine XDG data directory".to_string()))
}
