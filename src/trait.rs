use crate::{ScrobbleEntry, Session, SubmissionOutcome};
use async_trait::async_trait;

/// Trait for Last.fm submission operations that can be mocked for testing.
///
/// Both submission methods return the tagged [`SubmissionOutcome`]; ordinary
/// protocol rejections are values, not errors. A stale session key is handled
/// inside the implementation and never surfaces as
/// [`SubmissionOutcome::RetryableSessionError`].
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockSubmissionClient`
/// that implements this trait using the `mockall` library.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// Tell Last.fm which track is currently playing.
    async fn report_now_playing(&self, entry: &ScrobbleEntry) -> SubmissionOutcome;

    /// Record that a track was played.
    async fn scrobble(&self, entry: &ScrobbleEntry) -> SubmissionOutcome;

    /// A copy of the credentials currently in use.
    async fn session(&self) -> Session;
}
