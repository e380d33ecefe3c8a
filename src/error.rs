use thiserror::Error;

/// Error types for Last.fm submission operations.
///
/// Ordinary protocol rejections are reported as [`SubmissionOutcome`](crate::SubmissionOutcome)
/// values rather than errors. This enum covers everything else: invalid input, configuration
/// problems, the re-authentication collaborator, session persistence, and the conversion
/// performed by [`SubmissionOutcome::into_result`](crate::SubmissionOutcome::into_result).
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use lastfm_scrobble::{LastFmError, SubmissionClient, SubmissionClientImpl, ScrobbleEntry};
///
/// # async fn run(client: SubmissionClientImpl, entry: ScrobbleEntry) {
/// match client.scrobble(&entry).await.into_result() {
///     Ok(()) => println!("Scrobbled"),
///     Err(LastFmError::ClockSkew(msg)) => eprintln!("Fix the system clock: {}", msg),
///     Err(LastFmError::Http(msg)) => eprintln!("Network error, try again later: {}", msg),
///     Err(e) => eprintln!("Scrobble dropped: {}", e),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum LastFmError {
    /// HTTP/network related errors.
    ///
    /// This includes connection failures, timeouts, DNS errors, TLS errors and
    /// failures while reading the response body.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication failures.
    ///
    /// # Common Causes
    /// - Invalid username/password given to the mobile session handshake
    /// - A session key that is still rejected after re-authenticating
    /// - No session key and no way to obtain one
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Failed to parse Last.fm's response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A scrobble entry violated its construction invariants.
    #[error("Invalid scrobble entry: {0}")]
    InvalidEntry(String),

    /// Invalid client configuration, such as an unparsable endpoint URL.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The client or API key has been banned by Last.fm.
    ///
    /// Retrying will not help; the client needs to be updated or the key replaced.
    #[error("Client banned: {0}")]
    Banned(String),

    /// Last.fm rejected the submission because the system clock is too far off.
    #[error("Clock skew rejected by server: {0}")]
    ClockSkew(String),

    /// Last.fm rejected the submission for any other reason.
    #[error("Submission rejected: {0}")]
    Rejected(String),

    /// File system I/O errors.
    ///
    /// This can occur when persisting or loading sessions.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
