//! End-to-end tests: resolution, authorization, enforcement and session
//! expiry running together against in-memory host ports.

use std::time::Duration;

use docguard::authz::MemoryDataApi;
use docguard::dom::{DomTree, NodeSpec};
use docguard::session::SessionConfig;
use docguard::{
    AuthorizationRecord, Capability, EnforcementRule, Engine, EngineConfig, EngineError,
    Presentation, SessionState,
};
use docguard_testkit::fixtures::{
    authorized_api, open_doc_frame, profile_json, table_json, table_path, GuardedUi, PROFILE_PATH,
    DOC_ID,
};
use docguard_testkit::{init_tracing, TableRow, TestHost};
use tokio::time::{sleep_until, Instant};

const MIN: Duration = Duration::from_secs(60);
const HALF_SEC: Duration = Duration::from_millis(500);

fn record(alter: bool, export: bool, timeout_minutes: u32) -> AuthorizationRecord {
    AuthorizationRecord {
        can_alter_structure: alter,
        can_export: export,
        idle_timeout_minutes: timeout_minutes,
        ..AuthorizationRecord::fail_closed()
    }
}

fn presentations(host: &TestHost, ui: &GuardedUi) -> Vec<Option<Presentation>> {
    [ui.add_column, ui.share, ui.download]
        .into_iter()
        .chain(ui.menu_items.iter().copied())
        .map(|node| host.dom.presentation(node))
        .collect()
}

fn scenario_host() -> TestHost {
    let api = authorized_api(
        DOC_ID,
        "a@x.com",
        &[
            TableRow::granted("b@x.com", false, true, 45),
            TableRow::granted("a@x.com", true, false, 10),
        ],
    );
    TestHost::new(api).at_path(format!("/doc/{DOC_ID}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Full scenario
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_end_to_end_scenario() {
    init_tracing();
    let host = scenario_host();
    let ui = host.render_guarded_ui();
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();

    let t0 = Instant::now();
    let handle = engine.start().await.unwrap();

    assert_eq!(handle.document().map(|d| d.as_str()), Some(DOC_ID));
    assert_eq!(*handle.record(), record(true, false, 10));
    assert_eq!(
        host.data_api.requests(),
        vec![PROFILE_PATH.to_string(), table_path(DOC_ID)]
    );

    use Presentation::{Hidden, Visible};
    assert_eq!(
        presentations(&host, &ui),
        vec![
            Some(Visible), // add column
            Some(Hidden),  // share
            Some(Hidden),  // download
            Some(Visible), // insert left
            Some(Visible), // insert right
            Some(Visible), // unguarded item
        ]
    );

    sleep_until(t0 + MIN * 8 - HALF_SEC).await;
    assert_eq!(handle.session().state(), SessionState::Active);
    assert!(!host.ui.overlay_visible());

    sleep_until(t0 + MIN * 8 + HALF_SEC).await;
    assert!(handle.session().state().is_warning());
    assert!(host.ui.overlay_visible());

    sleep_until(t0 + MIN * 10 - HALF_SEC).await;
    assert!(host.navigator.visits().is_empty());

    sleep_until(t0 + MIN * 10 + HALF_SEC).await;
    assert_eq!(handle.session().state(), SessionState::Expired);
    assert_eq!(host.navigator.visits(), vec!["/logout".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_activity_during_warning_postpones_expiry() {
    let host = scenario_host();
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();

    let t0 = Instant::now();
    let handle = engine.start().await.unwrap();

    sleep_until(t0 + MIN * 9).await;
    assert!(handle.session().state().is_warning());
    assert!(!handle.activity().notify("scroll"));
    assert!(handle.activity().notify("pointerdown"));

    sleep_until(t0 + MIN * 9 + HALF_SEC).await;
    assert_eq!(handle.session().state(), SessionState::Active);
    assert!(!host.ui.overlay_visible());

    sleep_until(t0 + MIN * 10 + HALF_SEC).await;
    assert!(host.navigator.visits().is_empty());

    sleep_until(t0 + MIN * 17 + HALF_SEC).await;
    assert!(handle.session().state().is_warning());

    sleep_until(t0 + MIN * 19 + HALF_SEC).await;
    assert_eq!(host.navigator.visits().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Fail-closed paths
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_no_identity_fails_closed_with_default_timeout() {
    let host = TestHost::new(MemoryDataApi::new());
    let ui = host.render_guarded_ui();
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();

    let t0 = Instant::now();
    let handle = engine.start().await.unwrap();
    let started = Instant::now();

    assert!(started.duration_since(t0) >= Duration::from_millis(3000));
    assert!(handle.document().is_none());
    assert_eq!(*handle.record(), AuthorizationRecord::fail_closed());
    assert!(host.data_api.requests().is_empty());

    let shown = presentations(&host, &ui);
    assert!(shown[..5].iter().all(|p| *p == Some(Presentation::Hidden)));
    assert_eq!(shown[5], Some(Presentation::Visible));

    sleep_until(started + MIN * 58 - HALF_SEC).await;
    assert_eq!(handle.session().state(), SessionState::Active);
    sleep_until(started + MIN * 58 + HALF_SEC).await;
    assert!(handle.session().state().is_warning());
    sleep_until(started + MIN * 60 + HALF_SEC).await;
    assert_eq!(host.navigator.visits(), vec!["/logout".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_profile_failure_fails_closed_but_session_runs() {
    let api = MemoryDataApi::new().with_status(PROFILE_PATH, 500);
    let host = TestHost::new(api).at_path(format!("/doc/{DOC_ID}"));
    let ui = host.render_guarded_ui();
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();

    let t0 = Instant::now();
    let handle = engine.start().await.unwrap();

    assert_eq!(handle.document().map(|d| d.as_str()), Some(DOC_ID));
    assert_eq!(*handle.record(), AuthorizationRecord::fail_closed());
    assert_eq!(host.data_api.requests(), vec![PROFILE_PATH.to_string()]);
    assert_eq!(host.dom.presentation(ui.share), Some(Presentation::Hidden));
    assert_eq!(host.dom.presentation(ui.add_column), Some(Presentation::Hidden));

    sleep_until(t0 + MIN * 57).await;
    assert_eq!(handle.session().state(), SessionState::Active);
    sleep_until(t0 + MIN * 60 + HALF_SEC).await;
    assert_eq!(host.navigator.visits().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_user_fails_closed() {
    let api = authorized_api(DOC_ID, "stranger@x.com", &[TableRow::granted("a@x.com", true, true, 10)]);
    let host = TestHost::new(api).at_path(format!("/doc/{DOC_ID}"));
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();

    let handle = engine.start().await.unwrap();
    assert_eq!(*handle.record(), AuthorizationRecord::fail_closed());
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity sources
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_sniffed_identity_flows_through() {
    let api = authorized_api(DOC_ID, "b@x.com", &[TableRow::granted("b@x.com", false, true, 30)]);
    let host = TestHost::new(api);
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();

    let channel = engine.install_sniffer(host.outbound.clone());
    let again = engine.install_sniffer(channel.clone());
    again.send(open_doc_frame(DOC_ID)).unwrap();
    assert_eq!(host.outbound.frames(), vec![open_doc_frame(DOC_ID)]);

    let t0 = Instant::now();
    let handle = engine.start().await.unwrap();
    assert_eq!(Instant::now(), t0);
    assert_eq!(handle.document().map(|d| d.as_str()), Some(DOC_ID));
    assert_eq!(*handle.record(), record(false, true, 30));
}

#[tokio::test(start_paused = true)]
async fn test_host_state_wins_over_other_sources() {
    let host_doc = "hostDocument0001";
    let api = authorized_api(host_doc, "a@x.com", &[TableRow::granted("a@x.com", true, true, 20)]);
    let host = TestHost::new(api)
        .at_path("/doc/pathDocument0001")
        .exposing(host_doc);
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();
    let channel = engine.install_sniffer(host.outbound.clone());
    channel.send(open_doc_frame(DOC_ID)).unwrap();

    let handle = engine.start().await.unwrap();
    assert_eq!(handle.document().map(|d| d.as_str()), Some(host_doc));
    assert_eq!(*handle.record(), record(true, true, 20));
    assert_eq!(host.data_api.requests()[1], table_path(host_doc));
}

// ─────────────────────────────────────────────────────────────────────────────
// Enforcement under re-render
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_rerendered_export_ui_is_hidden_again() {
    let host = scenario_host();
    let ui = host.render_guarded_ui();
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();
    let mut handle = engine.start().await.unwrap();
    assert_eq!(host.dom.presentation(ui.share), Some(Presentation::Hidden));

    host.dom.remove(ui.share).unwrap();
    handle.settle().await;

    let share = host
        .dom
        .append(host.dom.body(), NodeSpec::new("div").class("test-tb-share"))
        .unwrap();
    handle.settle().await;
    assert_eq!(host.dom.presentation(share), Some(Presentation::Hidden));

    // Granted UI is left alone.
    let add = host
        .dom
        .append(host.dom.body(), NodeSpec::new("div").class("mod-add-column"))
        .unwrap();
    handle.settle().await;
    assert_eq!(host.dom.presentation(add), Some(Presentation::Visible));
}

// ─────────────────────────────────────────────────────────────────────────────
// Cloaked while loading
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_guarded_ui_hidden_while_table_request_stalls() {
    let api = MemoryDataApi::new()
        .with_json(PROFILE_PATH, profile_json("a@x.com"))
        .with_stall(table_path(DOC_ID), Duration::from_secs(600));
    let host = TestHost::new(api).at_path(format!("/doc/{DOC_ID}"));
    let ui = host.render_guarded_ui();
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();

    let t0 = Instant::now();
    let start = engine.start();
    tokio::pin!(start);

    for at in [Duration::from_secs(1), Duration::from_secs(9)] {
        tokio::select! {
            biased;
            _ = &mut start => panic!("start finished before the request bound"),
            _ = sleep_until(t0 + at) => {}
        }
        let shown = presentations(&host, &ui);
        assert!(shown[..5].iter().all(|p| *p == Some(Presentation::Hidden)), "{at:?}: {shown:?}");
    }

    let handle = start.await.unwrap();
    let elapsed = Instant::now().duration_since(t0);
    assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    assert_eq!(*handle.record(), AuthorizationRecord::fail_closed());
    assert_eq!(host.dom.presentation(ui.share), Some(Presentation::Hidden));
}

#[tokio::test(start_paused = true)]
async fn test_guarded_ui_hidden_while_identity_pending() {
    let host = TestHost::new(MemoryDataApi::new());
    let ui = host.render_guarded_ui();
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();

    let t0 = Instant::now();
    let start = engine.start();
    tokio::pin!(start);

    tokio::select! {
        biased;
        _ = &mut start => panic!("resolution gave up early"),
        _ = sleep_until(t0 + Duration::from_millis(2900)) => {}
    }
    assert_eq!(host.dom.presentation(ui.share), Some(Presentation::Hidden));
    assert_eq!(host.dom.presentation(ui.add_column), Some(Presentation::Hidden));

    // A late host document is not needed for the UI to stay cloaked.
    let handle = start.await.unwrap();
    assert!(handle.document().is_none());
    assert_eq!(host.dom.presentation(ui.share), Some(Presentation::Hidden));
}

#[tokio::test(start_paused = true)]
async fn test_granted_ui_revealed_once_record_loads() {
    let api = MemoryDataApi::new()
        .with_json(PROFILE_PATH, profile_json("a@x.com"))
        .with_json(
            table_path(DOC_ID),
            table_json(&[TableRow::granted("a@x.com", true, true, 10)]),
        );
    let host = TestHost::new(api);
    let ui = host.render_guarded_ui();
    let engine = Engine::new(host.ports(), EngineConfig::default()).unwrap();

    let t0 = Instant::now();
    let start = engine.start();
    tokio::pin!(start);

    tokio::select! {
        biased;
        _ = &mut start => panic!("identity should still be pending"),
        _ = sleep_until(t0 + Duration::from_millis(500)) => {}
    }
    assert_eq!(host.dom.presentation(ui.add_column), Some(Presentation::Hidden));

    // The host exposes the document late; the loaded record replaces the
    // fail-closed one.
    host.host_state.set(DOC_ID);
    let handle = start.await.unwrap();
    assert_eq!(*handle.record(), record(true, true, 10));
    assert!(presentations(&host, &ui)
        .iter()
        .all(|p| *p == Some(Presentation::Visible)));
}

#[test]
fn test_invalid_rule_is_a_setup_error() {
    let host = TestHost::new(MemoryDataApi::new());
    let config = EngineConfig {
        rules: vec![EnforcementRule::new("nested", "div > span", Capability::Export).unwrap()],
        ..EngineConfig::default()
    };
    assert!(matches!(
        Engine::new(host.ports(), config),
        Err(EngineError::Rule(_))
    ));
}

#[test]
fn test_warning_window_longer_than_minimum_timeout_is_a_setup_error() {
    let host = TestHost::new(MemoryDataApi::new());
    let config = EngineConfig {
        session: SessionConfig {
            warning_window: Duration::from_secs(180),
            ..SessionConfig::default()
        },
        ..EngineConfig::default()
    };
    assert!(matches!(
        Engine::new(host.ports(), config),
        Err(EngineError::Session(_))
    ));
}
