//! Flag client synchronization against a mock flag backend and flag files.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flag_toggle_service::config::{FlagSourceConfig, FlagsConfig, ServiceConfig};
use flag_toggle_service::flags::{
    ErrorKind, EvaluationContext, EvaluationReason, FlagClient, FlagClientError, FlagEvaluator,
    TracingLogSink,
};
use flag_toggle_service::lifecycle::Shutdown;
use toggle_sdk::ToggleClient;

mod common;

const SDK_KEY: &str = "sdk-integration-key";

fn polling(addr: std::net::SocketAddr, interval_secs: u64) -> FlagsConfig {
    FlagsConfig {
        sdk_key: SDK_KEY.to_string(),
        start_wait_secs: 2,
        source: FlagSourceConfig::Polling {
            base_uri: format!("http://{}", addr),
            poll_interval_secs: interval_secs,
            timeout_secs: 2,
        },
        ..FlagsConfig::default()
    }
}

fn payload(checkout_on: bool) -> String {
    serde_json::json!({
        "flags": {
            "new-checkout": {
                "version": 1,
                "on": checkout_on,
                "variations": [true, false],
                "offVariation": 1,
                "fallthrough": { "variation": 0 }
            }
        },
        "segments": {}
    })
    .to_string()
}

#[tokio::test]
async fn test_polling_client_serves_backend_flags() {
    let seen_auth = Arc::new(Mutex::new(None));
    let sa = seen_auth.clone();
    let backend = common::start_programmable_backend(move |req| {
        *sa.lock().unwrap() = req.header("authorization").map(str::to_string);
        assert_eq!(req.path, "/sdk/latest-all");
        (200, vec![], payload(true))
    })
    .await;

    let shutdown = Shutdown::new();
    let client = FlagClient::start(&polling(backend, 30), Arc::new(TracingLogSink), shutdown.subscribe())
        .await
        .unwrap();

    let ctx = EvaluationContext::minimal();
    assert!(client.initialized());
    assert!(client.bool_variation("new-checkout", &ctx, false));
    assert_eq!(seen_auth.lock().unwrap().as_deref(), Some(SDK_KEY));

    let (url, server_shutdown) = common::start_service(ServiceConfig::default(), client).await;
    assert!(ToggleClient::new(&url).get_toggle("new-checkout").await.unwrap());

    server_shutdown.trigger();
    shutdown.trigger();
}

#[tokio::test]
async fn test_rejected_key_fails_start() {
    let backend = common::start_programmable_backend(|_| (401, vec![], String::new())).await;

    let shutdown = Shutdown::new();
    let result = FlagClient::start(&polling(backend, 30), Arc::new(TracingLogSink), shutdown.subscribe()).await;

    assert!(matches!(
        result,
        Err(FlagClientError::InvalidSdkKey { status: 401 })
    ));
}

#[tokio::test]
async fn test_forbidden_key_fails_start() {
    let backend = common::start_programmable_backend(|_| (403, vec![], String::new())).await;

    let shutdown = Shutdown::new();
    let result = FlagClient::start(&polling(backend, 30), Arc::new(TracingLogSink), shutdown.subscribe()).await;

    assert!(matches!(
        result,
        Err(FlagClientError::InvalidSdkKey { status: 403 })
    ));
}

#[tokio::test]
async fn test_unsendable_key_fails_start_without_polling() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let backend = common::start_programmable_backend(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        (401, vec![], String::new())
    })
    .await;

    let mut settings = polling(backend, 30);
    settings.sdk_key = "sdk-key\nwith-newline".to_string();

    let shutdown = Shutdown::new();
    let result = FlagClient::start(&settings, Arc::new(TracingLogSink), shutdown.subscribe()).await;

    assert!(matches!(result, Err(FlagClientError::MalformedSdkKey)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_payload_without_flag_data_leaves_client_uninitialized() {
    // A bare map keyed by flag name, not a snapshot.
    let backend = common::start_programmable_backend(|_| {
        let body = serde_json::json!({
            "new-checkout": { "on": true, "variations": [true, false] }
        });
        (200, vec![], body.to_string())
    })
    .await;

    let shutdown = Shutdown::new();
    let client = FlagClient::start(&polling(backend, 30), Arc::new(TracingLogSink), shutdown.subscribe())
        .await
        .unwrap();

    assert!(!client.initialized());
    let detail = client.bool_variation_detail("new-checkout", &EvaluationContext::minimal(), false);
    assert_eq!(detail.reason, EvaluationReason::Error(ErrorKind::ClientNotReady));

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_initial_poll_starts_uninitialized_then_catches_up() {
    let backend = common::start_slow_backend(Duration::from_millis(1500), |_| (200, vec![], payload(true))).await;

    let mut settings = polling(backend, 30);
    settings.start_wait_secs = 1;

    let shutdown = Shutdown::new();
    let client = FlagClient::start(&settings, Arc::new(TracingLogSink), shutdown.subscribe())
        .await
        .unwrap();

    let ctx = EvaluationContext::minimal();
    assert!(!client.initialized());
    let detail = client.bool_variation_detail("new-checkout", &ctx, false);
    assert_eq!(detail.reason, EvaluationReason::Error(ErrorKind::ClientNotReady));

    // The poller retries at once rather than after the 30s interval.
    assert!(common::eventually(Duration::from_secs(8), || client.initialized()).await);
    assert!(client.bool_variation("new-checkout", &ctx, false));

    shutdown.trigger();
}

#[tokio::test]
async fn test_key_revoked_after_start_stops_polling() {
    let revoked = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicU32::new(0));
    let (r, c) = (revoked.clone(), calls.clone());

    let backend = common::start_programmable_backend(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        if r.load(Ordering::SeqCst) {
            (401, vec![], String::new())
        } else {
            (200, vec![], payload(true))
        }
    })
    .await;

    let shutdown = Shutdown::new();
    let client = FlagClient::start(&polling(backend, 1), Arc::new(TracingLogSink), shutdown.subscribe())
        .await
        .unwrap();

    revoked.store(true, Ordering::SeqCst);
    let before = calls.load(Ordering::SeqCst);
    assert!(common::eventually(Duration::from_secs(5), || calls.load(Ordering::SeqCst) > before).await);

    // Give a stopped poller time to prove it stays stopped.
    let after_rejection = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_rejection);

    assert!(client.initialized());
    assert!(client.bool_variation("new-checkout", &EvaluationContext::minimal(), false));
    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_backend_serves_defaults() {
    // Grab a free port, then close it so nothing is listening.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let shutdown = Shutdown::new();
    let client = FlagClient::start(&polling(addr, 30), Arc::new(TracingLogSink), shutdown.subscribe())
        .await
        .unwrap();

    assert!(!client.initialized());
    let detail = client.bool_variation_detail("new-checkout", &EvaluationContext::minimal(), false);
    assert!(!detail.value);
    assert_eq!(detail.reason, EvaluationReason::Error(ErrorKind::ClientNotReady));

    shutdown.trigger();
}

#[tokio::test]
async fn test_poller_picks_up_changes_and_honours_etag() {
    let checkout_on = Arc::new(AtomicBool::new(true));
    let not_modified = Arc::new(AtomicU32::new(0));
    let (co, nm) = (checkout_on.clone(), not_modified.clone());

    let backend = common::start_programmable_backend(move |req| {
        let on = co.load(Ordering::SeqCst);
        let etag = format!("\"v-{}\"", on);
        if req.header("if-none-match") == Some(etag.as_str()) {
            nm.fetch_add(1, Ordering::SeqCst);
            return (304, vec![], String::new());
        }
        (200, vec![("ETag".to_string(), etag)], payload(on))
    })
    .await;

    let shutdown = Shutdown::new();
    let client = FlagClient::start(&polling(backend, 1), Arc::new(TracingLogSink), shutdown.subscribe())
        .await
        .unwrap();
    let ctx = EvaluationContext::minimal();
    assert!(client.bool_variation("new-checkout", &ctx, false));

    // Unchanged data is answered with 304 and the value stays.
    assert!(common::eventually(Duration::from_secs(5), || not_modified.load(Ordering::SeqCst) > 0).await);
    assert!(client.bool_variation("new-checkout", &ctx, false));

    checkout_on.store(false, Ordering::SeqCst);
    assert!(
        common::eventually(Duration::from_secs(5), || {
            !client.bool_variation("new-checkout", &ctx, true)
        })
        .await
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_backend_error_keeps_last_snapshot() {
    let failing = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicU32::new(0));
    let (f, c) = (failing.clone(), calls.clone());

    let backend = common::start_programmable_backend(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        if f.load(Ordering::SeqCst) {
            (503, vec![], "down".to_string())
        } else {
            (200, vec![], payload(true))
        }
    })
    .await;

    let shutdown = Shutdown::new();
    let client = FlagClient::start(&polling(backend, 1), Arc::new(TracingLogSink), shutdown.subscribe())
        .await
        .unwrap();

    failing.store(true, Ordering::SeqCst);
    let before = calls.load(Ordering::SeqCst);
    assert!(common::eventually(Duration::from_secs(5), || calls.load(Ordering::SeqCst) > before).await);

    assert!(client.bool_variation("new-checkout", &EvaluationContext::minimal(), false));
    shutdown.trigger();
}

#[tokio::test]
async fn test_file_source_reloads_on_change() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"flagValues": {{"dark-mode": false}}}}"#).unwrap();
    file.flush().unwrap();

    let settings = FlagsConfig {
        sdk_key: SDK_KEY.to_string(),
        source: FlagSourceConfig::File {
            path: file.path().to_path_buf(),
            watch: true,
        },
        ..FlagsConfig::default()
    };

    let shutdown = Shutdown::new();
    let client = FlagClient::start(&settings, Arc::new(TracingLogSink), shutdown.subscribe())
        .await
        .unwrap();
    let ctx = EvaluationContext::minimal();
    assert!(!client.bool_variation("dark-mode", &ctx, true));

    std::fs::write(file.path(), r#"{"flagValues": {"dark-mode": true}}"#).unwrap();
    assert!(
        common::eventually(Duration::from_secs(5), || client.bool_variation("dark-mode", &ctx, false)).await
    );

    // Unparseable content keeps the flags already loaded.
    std::fs::write(file.path(), "{ not json").unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(client.initialized());
    assert!(client.bool_variation("dark-mode", &ctx, false));
}
