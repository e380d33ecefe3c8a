mod common;

use common::{
    idioteque, test_session, RejectingRefresher, Reply, ScriptedClient, SequenceRefresher,
    TEST_ENDPOINT,
};
use lastfm_scrobble::{
    ClientConfig, FatalKind, LastFmError, Session, SubmissionClient, SubmissionClientImpl,
    SubmissionOutcome,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn client_with(
    http: &ScriptedClient,
    session: Session,
    refresher: Arc<SequenceRefresher>,
    config: ClientConfig,
) -> SubmissionClientImpl {
    SubmissionClientImpl::with_config(
        Arc::new(http.clone()),
        session,
        refresher,
        config.with_endpoint(TEST_ENDPOINT),
    )
    .unwrap()
}

#[test_log::test(tokio::test)]
async fn test_stale_session_is_refreshed_and_resent() {
    let http = ScriptedClient::with_bodies(&["BADAUTH\n", "OK\n"]);
    let refresher = Arc::new(SequenceRefresher::new());
    let client = client_with(
        &http,
        test_session("old"),
        refresher.clone(),
        ClientConfig::default(),
    );

    let outcome = client.scrobble(&idioteque()).await;

    assert_eq!(outcome, SubmissionOutcome::Success);
    assert_eq!(refresher.calls(), 1);

    let requests = http.requests();
    assert_eq!(requests.len(), 2);
    let first = requests[0].form();
    let second = requests[1].form();

    assert_eq!(first["sk"], "old");
    assert_eq!(second["sk"], "fresh-1");
    assert_ne!(first["api_sig"], second["api_sig"]);
    for key in ["method", "api_key", "artist", "track", "duration", "timestamp"] {
        assert_eq!(first[key], second[key], "{key} changed between attempts");
    }

    let session = client.session().await;
    assert_eq!(session.session_key.as_deref(), Some("fresh-1"));
}

#[test_log::test(tokio::test)]
async fn test_invalid_session_key_document_is_refreshed() {
    let http = ScriptedClient::with_bodies(&[
        r#"<?xml version="1.0" encoding="utf-8"?><lfm status="failed"><error code="9">Invalid session key - Please re-authenticate</error></lfm>"#,
        r#"<?xml version="1.0" encoding="utf-8"?><lfm status="ok"><nowplaying/></lfm>"#,
    ]);
    let refresher = Arc::new(SequenceRefresher::new());
    let client = client_with(
        &http,
        test_session("old"),
        refresher.clone(),
        ClientConfig::default(),
    );

    let outcome = client.report_now_playing(&idioteque()).await;

    assert_eq!(outcome, SubmissionOutcome::Success);
    assert_eq!(refresher.calls(), 1);
    assert_eq!(http.request_count(), 2);
}

#[test_log::test(tokio::test)]
async fn test_refresh_failure_is_authentication_failure() {
    let http = ScriptedClient::with_bodies(&["BADAUTH\n", "OK\n"]);
    let refresher = Arc::new(RejectingRefresher::default());
    let client = SubmissionClientImpl::with_config(
        Arc::new(http.clone()),
        test_session("old"),
        refresher.clone(),
        ClientConfig::default().with_endpoint(TEST_ENDPOINT),
    )
    .unwrap();

    let outcome = client.scrobble(&idioteque()).await;

    match outcome {
        SubmissionOutcome::FatalError { kind, message } => {
            assert_eq!(kind, FatalKind::AuthenticationFailure);
            assert!(message.contains("Invalid username or password"));
        }
        other => panic!("Expected authentication failure, got: {other:?}"),
    }
    assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(http.request_count(), 1);
    assert_eq!(
        client.session().await.session_key.as_deref(),
        Some("old")
    );
}

#[test_log::test(tokio::test)]
async fn test_client_without_refresher_treats_badauth_as_fatal() {
    let http = ScriptedClient::with_bodies(&["BADAUTH\n"]);
    let client = SubmissionClientImpl::with_config(
        Arc::new(http.clone()),
        test_session("old"),
        Arc::new(lastfm_scrobble::NoSessionRefresh),
        ClientConfig::default().with_endpoint(TEST_ENDPOINT),
    )
    .unwrap();

    let outcome = client.scrobble(&idioteque()).await;

    assert!(matches!(
        outcome,
        SubmissionOutcome::FatalError {
            kind: FatalKind::AuthenticationFailure,
            ..
        }
    ));
    assert!(matches!(outcome.into_result(), Err(LastFmError::Auth(_))));
}

#[test_log::test(tokio::test)]
async fn test_persistent_badauth_is_bounded() {
    let http = ScriptedClient::with_bodies(&["BADAUTH\n"; 10]);
    let refresher = Arc::new(SequenceRefresher::new());
    let client = client_with(
        &http,
        test_session("old"),
        refresher.clone(),
        ClientConfig::default().with_max_session_refreshes(2),
    );

    let outcome = client.scrobble(&idioteque()).await;

    assert!(matches!(
        outcome,
        SubmissionOutcome::FatalError {
            kind: FatalKind::AuthenticationFailure,
            ..
        }
    ));
    assert_eq!(refresher.calls(), 2);
    assert_eq!(http.request_count(), 3);
}

#[test_log::test(tokio::test)]
async fn test_refresh_disabled() {
    let http = ScriptedClient::with_bodies(&["BADAUTH\n", "OK\n"]);
    let refresher = Arc::new(SequenceRefresher::new());
    let client = client_with(
        &http,
        test_session("old"),
        refresher.clone(),
        ClientConfig::with_refresh_disabled(),
    );

    let outcome = client.scrobble(&idioteque()).await;

    assert!(matches!(
        outcome,
        SubmissionOutcome::FatalError {
            kind: FatalKind::AuthenticationFailure,
            ..
        }
    ));
    assert_eq!(refresher.calls(), 0);
    assert_eq!(http.request_count(), 1);
}

#[test_log::test(tokio::test)]
async fn test_transport_error_does_not_refresh() {
    let http = ScriptedClient::new([Reply::NetworkFailure("connection refused".to_string())]);
    let refresher = Arc::new(SequenceRefresher::new());
    let client = client_with(
        &http,
        test_session("old"),
        refresher.clone(),
        ClientConfig::default(),
    );

    let outcome = client.scrobble(&idioteque()).await;

    match outcome {
        SubmissionOutcome::TransportError { cause } => {
            assert!(cause.contains("connection refused"))
        }
        other => panic!("Expected transport error, got: {other:?}"),
    }
    assert_eq!(refresher.calls(), 0);
    assert_eq!(http.request_count(), 1);
}

#[test_log::test(tokio::test)]
async fn test_fatal_responses_pass_through() {
    let cases = [
        ("BANNED\n", FatalKind::Banned),
        ("BADTIME\n", FatalKind::ClockSkew),
        ("FAILED Invalid signature\n", FatalKind::Rejected),
        (
            r#"<lfm status="failed"><error code="26">Suspended API key</error></lfm>"#,
            FatalKind::Banned,
        ),
    ];

    for (body, expected) in cases {
        let http = ScriptedClient::with_bodies(&[body, "OK\n"]);
        let refresher = Arc::new(SequenceRefresher::new());
        let client = client_with(
            &http,
            test_session("S"),
            refresher.clone(),
            ClientConfig::default(),
        );

        match client.scrobble(&idioteque()).await {
            SubmissionOutcome::FatalError { kind, .. } => assert_eq!(kind, expected, "{body}"),
            other => panic!("Expected {expected:?} for {body:?}, got: {other:?}"),
        }
        assert_eq!(refresher.calls(), 0);
        assert_eq!(http.request_count(), 1);
    }
}

#[test_log::test(tokio::test)]
async fn test_failed_reason_is_reported() {
    let http = ScriptedClient::with_bodies(&["FAILED Invalid signature\n"]);
    let client = client_with(
        &http,
        test_session("S"),
        Arc::new(SequenceRefresher::new()),
        ClientConfig::default(),
    );

    assert_eq!(
        client.scrobble(&idioteque()).await,
        SubmissionOutcome::fatal(FatalKind::Rejected, "Invalid signature")
    );
}

#[test_log::test(tokio::test)]
async fn test_now_playing_request_shape() {
    let http = ScriptedClient::with_bodies(&["OK\n"]);
    let client = client_with(
        &http,
        test_session("S"),
        Arc::new(SequenceRefresher::new()),
        ClientConfig::default().with_user_agent("scrobble-test/1.0"),
    );

    let outcome = client.report_now_playing(&idioteque()).await;
    assert_eq!(outcome, SubmissionOutcome::Success);

    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    assert_eq!(request.method, "POST");
    assert_eq!(request.url, TEST_ENDPOINT);
    assert_eq!(
        request.content_type.as_deref(),
        Some("application/x-www-form-urlencoded;charset=UTF-8")
    );
    assert_eq!(request.user_agent.as_deref(), Some("scrobble-test/1.0"));
    assert_eq!(
        request.body,
        "api_key=K&api_sig=0a63fa081c8102275121e99229eda822&artist=Radiohead&duration=360&method=track.updateNowPlaying&sk=S&track=Idioteque"
    );
}

#[test_log::test(tokio::test)]
async fn test_scrobble_request_carries_timestamp() {
    let http = ScriptedClient::with_bodies(&["OK\n"]);
    let client = client_with(
        &http,
        test_session("S"),
        Arc::new(SequenceRefresher::new()),
        ClientConfig::default(),
    );

    let entry = idioteque().with_album("Kid A").with_track_number(8);
    assert!(client.scrobble(&entry).await.is_success());

    let form = http.requests()[0].form();
    assert_eq!(form["method"], "track.scrobble");
    assert_eq!(form["timestamp"], "1700000000");
    assert_eq!(form["album"], "Kid A");
    assert_eq!(form["trackNumber"], "8");
}

#[test_log::test(tokio::test)]
async fn test_values_are_percent_encoded() {
    let http = ScriptedClient::with_bodies(&["OK\n"]);
    let client = client_with(
        &http,
        test_session("S"),
        Arc::new(SequenceRefresher::new()),
        ClientConfig::default(),
    );

    let entry = common::entry("Simon & Garfunkel", "The Boxer", 1_700_000_000);
    assert!(client.report_now_playing(&entry).await.is_success());

    let request = &http.requests()[0];
    assert!(request.body.contains("artist=Simon%20%26%20Garfunkel"));
    assert_eq!(request.form()["artist"], "Simon & Garfunkel");
}

#[test_log::test(tokio::test)]
async fn test_session_without_key_authenticates_first() {
    let http = ScriptedClient::with_bodies(&["OK\n"]);
    let refresher = Arc::new(SequenceRefresher::new());
    let client = client_with(
        &http,
        Session::new("K", "X"),
        refresher.clone(),
        ClientConfig::default(),
    );

    let outcome = client.scrobble(&idioteque()).await;

    assert_eq!(outcome, SubmissionOutcome::Success);
    assert_eq!(refresher.calls(), 1);
    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].param("sk").as_deref(), Some("fresh-1"));
}

#[test_log::test(tokio::test)]
async fn test_session_without_key_and_no_refresher() {
    let http = ScriptedClient::with_bodies(&["OK\n"]);
    let client =
        SubmissionClientImpl::new(Box::new(http.clone()), Session::new("K", "X")).unwrap();

    let outcome = client.scrobble(&idioteque()).await;

    assert!(matches!(
        outcome,
        SubmissionOutcome::FatalError {
            kind: FatalKind::AuthenticationFailure,
            ..
        }
    ));
    assert_eq!(http.request_count(), 0);
}

#[test]
fn test_invalid_endpoint_is_rejected() {
    let result = SubmissionClientImpl::with_config(
        Arc::new(ScriptedClient::default()),
        test_session("S"),
        Arc::new(SequenceRefresher::new()),
        ClientConfig::default().with_endpoint("not a url"),
    );

    assert!(matches!(result, Err(LastFmError::Config(_))));
}
