//! Client for the Last.fm scrobble submission protocol.
//!
//! Playback events are described by [`ScrobbleEntry`] and submitted with a
//! [`SubmissionClient`] either as a now-playing report or as a scrobble. Every
//! request is signed with the application's shared secret; a session key the
//! server no longer accepts is refreshed through a [`SessionRefresher`] and the
//! submission is resent transparently.

pub mod auth;
pub mod client;
pub mod config;
pub mod entry;
pub mod error;
pub mod events;
pub mod headers;
pub mod outcome;
pub mod params;
pub mod request;
pub mod session;
pub mod session_persistence;
pub mod signer;
mod r#trait;

pub use auth::MobileSessionAuthenticator;
pub use client::SubmissionClientImpl;
pub use config::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT};
pub use entry::{PlaybackSource, ScrobbleEntry, ScrobbleMethod, ScrobbleMode};
pub use error::LastFmError;
pub use events::{
    ClientEvent, ClientEventReceiver, ClientEventWatcher, RequestInfo, SharedEventBroadcaster,
};
pub use outcome::{classify_response, FatalKind, SubmissionOutcome};
pub use params::ParameterSet;
pub use request::SubmissionRequest;
pub use session::{NoSessionRefresh, Session, SessionRefresher, SessionStore};
pub use session_persistence::SessionPersistence;
pub use r#trait::SubmissionClient;

#[cfg(feature = "mock")]
pub use r#trait::MockSubmissionClient;

#[cfg(feature = "mock")]
pub use session::MockSessionRefresher;

pub type Result<T> = std::result::Result<T, LastFmError>;
