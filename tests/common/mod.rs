#![allow(dead_code)]
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use http_client::{Error, HttpClient, Request, Response};
use http_types::StatusCode;
use lastfm_scrobble::{
    signer, LastFmError, ParameterSet, PlaybackSource, Result, ScrobbleEntry, ScrobbleMode,
    Session, SessionRefresher,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_ENDPOINT: &str = "http://scrobble.test/2.0/";

/// A request as received by one of the fake HTTP clients.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub user_agent: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn form(&self) -> BTreeMap<String, String> {
        parse_form(&self.body)
    }

    pub fn param(&self, key: &str) -> Option<String> {
        self.form().get(key).cloned()
    }
}

async fn record(mut req: Request) -> std::result::Result<RecordedRequest, Error> {
    let body = req.body_string().await?;
    let header = |name: &str| req.header(name).map(|values| values.last().as_str().to_string());

    Ok(RecordedRequest {
        method: req.method().to_string(),
        url: req.url().to_string(),
        content_type: header("Content-Type"),
        user_agent: header("User-Agent"),
        body,
    })
}

fn text_response(text: impl Into<String>) -> Response {
    let mut response = Response::new(StatusCode::Ok);
    response.set_body(text.into());
    response
}

/// Decode an `application/x-www-form-urlencoded` body.
pub fn parse_form(body: &str) -> BTreeMap<String, String> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| {
            (
                urlencoding::decode(key).unwrap().into_owned(),
                urlencoding::decode(value).unwrap().into_owned(),
            )
        })
        .collect()
}

/// One scripted answer of a [`ScriptedClient`].
#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    NetworkFailure(String),
}

impl Reply {
    pub fn body(text: &str) -> Self {
        Reply::Body(text.to_string())
    }
}

/// HTTP client that answers requests from a fixed script, in order.
///
/// Clones share the script and the request log, so a test can keep one
/// handle while the client under test owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub fn with_bodies(bodies: &[&str]) -> Self {
        Self::new(bodies.iter().map(|body| Reply::body(body)))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn send(&self, req: Request) -> std::result::Result<Response, Error> {
        let recorded = record(req).await?;
        self.requests.lock().unwrap().push(recorded);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::NetworkFailure("no scripted reply left".to_string()));

        match reply {
            Reply::Body(text) => Ok(text_response(text)),
            Reply::NetworkFailure(message) => {
                Err(Error::from_str(StatusCode::ServiceUnavailable, message))
            }
        }
    }
}

/// Minimal submission endpoint: checks the signature and accepts exactly one
/// session key at a time.
#[derive(Debug, Clone)]
pub struct FakeScrobbleServer {
    secret: String,
    valid_key: Arc<Mutex<String>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeScrobbleServer {
    pub fn new(secret: &str, valid_key: &str) -> Self {
        Self {
            secret: secret.to_string(),
            valid_key: Arc::new(Mutex::new(valid_key.to_string())),
            requests: Arc::default(),
        }
    }

    pub fn set_valid_key(&self, key: &str) {
        *self.valid_key.lock().unwrap() = key.to_string();
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn answer(&self, form: &BTreeMap<String, String>) -> &'static str {
        let params: ParameterSet = form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let expected = signer::sign(&params, &self.secret);

        if form.get(signer::API_SIG_KEY) != Some(&expected) {
            "FAILED Invalid signature"
        } else if form.get("sk") != Some(&*self.valid_key.lock().unwrap()) {
            "BADAUTH"
        } else {
            "OK"
        }
    }
}

#[async_trait]
impl HttpClient for FakeScrobbleServer {
    async fn send(&self, req: Request) -> std::result::Result<Response, Error> {
        let recorded = record(req).await?;
        let answer = self.answer(&recorded.form());
        self.requests.lock().unwrap().push(recorded);
        Ok(text_response(answer))
    }
}

/// Refresher that hands out `fresh-1`, `fresh-2`, ... and counts its calls.
#[derive(Debug, Default)]
pub struct SequenceRefresher {
    calls: AtomicU32,
    delay: Option<Duration>,
    server: Option<FakeScrobbleServer>,
}

impl SequenceRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before answering, to keep a refresh in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `server` accept each newly issued key.
    pub fn updating(mut self, server: &FakeScrobbleServer) -> Self {
        self.server = Some(server.clone());
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionRefresher for SequenceRefresher {
    async fn refresh(&self, _session: &Session) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let key = format!("fresh-{call}");
        if let Some(server) = &self.server {
            server.set_valid_key(&key);
        }
        Ok(key)
    }
}

/// Refresher whose credentials are always refused.
#[derive(Debug, Default)]
pub struct RejectingRefresher {
    pub calls: AtomicU32,
}

#[async_trait]
impl SessionRefresher for RejectingRefresher {
    async fn refresh(&self, _session: &Session) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LastFmError::Auth(
            "Invalid username or password".to_string(),
        ))
    }
}

pub fn test_session(session_key: &str) -> Session {
    Session::with_session_key("K", "X", session_key)
}

pub fn idioteque() -> ScrobbleEntry {
    ScrobbleEntry::new(
        "Radiohead",
        "Idioteque",
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        PlaybackSource::User,
        Duration::from_secs(360),
        ScrobbleMode::Played,
    )
    .unwrap()
}

pub fn entry(artist: &str, title: &str, started_at: i64) -> ScrobbleEntry {
    ScrobbleEntry::new(
        artist,
        title,
        Utc.timestamp_opt(started_at, 0).unwrap(),
        PlaybackSource::User,
        Duration::from_secs(240),
        ScrobbleMode::Played,
    )
    .unwrap()
}
