//! # Submission Events
//!
//! This module provides a broadcast channel system for observing what the
//! submission client does: requests sent, responses received, sessions
//! refreshed and the final outcome of each submission.

use crate::SubmissionOutcome;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

/// Request information for client events
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestInfo {
    /// The API method being called, e.g. `track.scrobble`
    pub api_method: String,
    /// The endpoint the request is posted to
    pub endpoint: String,
}

impl RequestInfo {
    pub fn new(api_method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_method: api_method.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Get a short description of the request for logging
    pub fn short_description(&self) -> String {
        format!("POST {} ({})", self.endpoint, self.api_method)
    }
}

/// Event type to describe internal client activity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientEvent {
    /// Request started
    RequestStarted {
        /// Request details
        request: RequestInfo,
    },
    /// A response was received
    RequestCompleted {
        /// Request details
        request: RequestInfo,
        /// HTTP status code
        status_code: u16,
        /// Duration of the request in milliseconds
        duration_ms: u64,
    },
    /// The session key was replaced after the server rejected it
    SessionRefreshed {
        /// Number of refreshes performed by this session store so far
        attempt: u32,
    },
    /// A now-playing report or scrobble reached its final outcome
    SubmissionFinished {
        /// The API method that was submitted
        api_method: String,
        /// The outcome returned to the caller
        outcome: SubmissionOutcome,
        /// Duration of the whole submission, including refreshes, in milliseconds
        duration_ms: u64,
    },
}

/// Type alias for the broadcast receiver
pub type ClientEventReceiver = broadcast::Receiver<ClientEvent>;

/// Type alias for the watch receiver
pub type ClientEventWatcher = watch::Receiver<Option<ClientEvent>>;

/// Shared event broadcasting state that persists across client clones
#[derive(Clone)]
pub struct SharedEventBroadcaster {
    event_tx: broadcast::Sender<ClientEvent>,
    last_event_tx: watch::Sender<Option<ClientEvent>>,
}

impl SharedEventBroadcaster {
    /// Create a new shared event broadcaster
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (last_event_tx, _) = watch::channel(None);

        Self {
            event_tx,
            last_event_tx,
        }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast_event(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event.clone());
        let _ = self.last_event_tx.send_replace(Some(event));
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> ClientEventReceiver {
        self.event_tx.subscribe()
    }

    /// Watch the latest event
    pub fn watch(&self) -> ClientEventWatcher {
        self.last_event_tx.subscribe()
    }

    /// Get the latest event
    pub fn latest_event(&self) -> Option<ClientEvent> {
        self.last_event_tx.borrow().clone()
    }
}

impl Default for SharedEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedEventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEventBroadcaster")
            .field("subscribers", &self.event_tx.receiver_count())
            .finish()
    }
}
