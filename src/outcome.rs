//! Classification of submission responses.

use crate::{LastFmError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Last.fm 2.0 error code for an invalid or expired session key.
const INVALID_SESSION_KEY: u32 = 9;
/// Last.fm 2.0 error code for a suspended API key.
const SUSPENDED_API_KEY: u32 = 26;

/// Kinds of non-retryable submission failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FatalKind {
    /// The client or API key is banned.
    Banned,
    /// The session could not be (re-)established.
    AuthenticationFailure,
    /// The server rejected the timestamp because the local clock is wrong.
    ClockSkew,
    /// The server refused the submission for any other reason.
    Rejected,
}

/// Result of a single submission, as seen by the caller.
///
/// Remote rejections are ordinary values of this type, never panics or errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionOutcome {
    /// The server accepted the submission.
    Success,
    /// The session key is stale; re-authenticating and resending may succeed.
    ///
    /// [`SubmissionClient`](crate::SubmissionClient) absorbs this outcome, so callers
    /// of the client never observe it.
    RetryableSessionError,
    /// The server refused the submission and resending will not help.
    FatalError {
        kind: FatalKind,
        message: String,
    },
    /// The request never produced a response (connection refused, timeout, TLS error).
    TransportError {
        cause: String,
    },
}

impl SubmissionOutcome {
    pub fn fatal(kind: FatalKind, message: impl Into<String>) -> Self {
        Self::FatalError {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(cause: impl Into<String>) -> Self {
        Self::TransportError {
            cause: cause.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Convert into a `Result` so callers can use `?`.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Success => Ok(()),
            Self::RetryableSessionError => Err(LastFmError::Auth(
                "session key rejected by server".to_string(),
            )),
            Self::FatalError { kind, message } => Err(match kind {
                FatalKind::Banned => LastFmError::Banned(message),
                FatalKind::AuthenticationFailure => LastFmError::Auth(message),
                FatalKind::ClockSkew => LastFmError::ClockSkew(message),
                FatalKind::Rejected => LastFmError::Rejected(message),
            }),
            Self::TransportError { cause } => Err(LastFmError::Http(cause)),
        }
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::RetryableSessionError => write!(f, "stale session"),
            Self::FatalError { kind, message } => write!(f, "{kind:?}: {message}"),
            Self::TransportError { cause } => write!(f, "transport error: {cause}"),
        }
    }
}

/// Classify a raw response body.
///
/// The legacy line protocol puts a status token on the first line (`OK`, `BANNED`,
/// `BADAUTH`, `BADTIME`, `FAILED <reason>`); the 2.0 web service answers with an
/// `<lfm status="...">` document. Both are recognised.
///
/// # Examples
///
/// ```rust
/// use lastfm_scrobble::{classify_response, FatalKind, SubmissionOutcome};
///
/// assert_eq!(classify_response("OK\n"), SubmissionOutcome::Success);
/// assert_eq!(classify_response("BADAUTH\n"), SubmissionOutcome::RetryableSessionError);
/// assert_eq!(
///     classify_response("BANNED\n"),
///     SubmissionOutcome::fatal(FatalKind::Banned, "BANNED"),
/// );
/// ```
pub fn classify_response(body: &str) -> SubmissionOutcome {
    let line = body.split('\n').next().unwrap_or("").trim_end_matches('\r');

    if line.starts_with("OK") {
        SubmissionOutcome::Success
    } else if line.starts_with("BANNED") {
        SubmissionOutcome::fatal(FatalKind::Banned, line)
    } else if line.starts_with("BADAUTH") {
        SubmissionOutcome::RetryableSessionError
    } else if line.starts_with("BADTIME") {
        SubmissionOutcome::fatal(FatalKind::ClockSkew, line)
    } else if let Some(rest) = line.strip_prefix("FAILED") {
        SubmissionOutcome::fatal(FatalKind::Rejected, rest.trim())
    } else if body.contains("lfm status=\"failed\"") {
        classify_failed_document(body)
    } else if body.contains("lfm status=\"ok\"") {
        SubmissionOutcome::Success
    } else {
        log::debug!("Unrecognized submission response: {} chars", body.len());
        SubmissionOutcome::fatal(FatalKind::Rejected, "unrecognized response")
    }
}

fn classify_failed_document(body: &str) -> SubmissionOutcome {
    match extract_api_error(body) {
        Some((INVALID_SESSION_KEY, message)) => {
            log::debug!("Server reported invalid session key: {message}");
            SubmissionOutcome::RetryableSessionError
        }
        Some((SUSPENDED_API_KEY, message)) => SubmissionOutcome::fatal(FatalKind::Banned, message),
        Some((code, message)) => {
            log::debug!("Server rejected submission with error code {code}");
            SubmissionOutcome::fatal(FatalKind::Rejected, message)
        }
        None => {
            log::debug!("Failed response without error element: {body}");
            SubmissionOutcome::fatal(FatalKind::Rejected, "failed response without error element")
        }
    }
}

/// Extract the code and text of an `<error code="N">text</error>` element.
pub(crate) fn extract_api_error(body: &str) -> Option<(u32, String)> {
    static ERROR_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = ERROR_PATTERN.get_or_init(|| {
        Regex::new(r#"<error code="(\d+)">\s*([^<]*?)\s*</error>"#)
            .expect("error element pattern is valid")
    });

    let captures = pattern.captures(body)?;
    let code = captures.get(1)?.as_str().parse().ok()?;
    let message = captures.get(2)?.as_str().to_string();
    Some((code, message))
}
