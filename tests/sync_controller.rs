// tests/sync_controller.rs

//! Sync controller behaviour against a scripted transport.
//!
//! All tests run with paused time, so sleeps advance the clock
//! deterministically once every task is idle.

mod common;

use common::{
    drain, package, progress_for, quiet_config, registry_changes, sample_catalogue, statuses,
    strings, MockTransport, SearchFailure,
};
use extcat::{Error, SyncController, SyncEvents, SyncHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Spawn a controller and let its initial full-catalogue load land
async fn loaded(transport: &Arc<MockTransport>) -> (SyncHandle, SyncEvents) {
    let config = quiet_config().with_initial_load(true);
    let (handle, mut events, _task) = SyncController::spawn(Arc::clone(transport), config);
    sleep(Duration::from_millis(1)).await;
    drain(&mut events);
    (handle, events)
}

#[tokio::test(start_paused = true)]
async fn test_rapid_edits_fire_one_search() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events, _task) = SyncController::spawn(Arc::clone(&transport), quiet_config());

    handle.request_search("g").unwrap();
    sleep(Duration::from_millis(100)).await;
    handle.request_search("ge").unwrap();
    sleep(Duration::from_millis(100)).await;
    handle.request_search("geo").unwrap();
    sleep(Duration::from_millis(100)).await;

    // Still inside the quiet period of the last edit
    assert!(transport.searches().is_empty());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.searches(), strings(&["geo"]));

    let changes = registry_changes(&drain(&mut events));
    assert_eq!(changes, vec![(vec![], strings(&["a"]))]);
}

#[tokio::test(start_paused = true)]
async fn test_search_keyword_is_trimmed() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, _events, _task) = SyncController::spawn(Arc::clone(&transport), quiet_config());

    handle.request_search("  mesh ").unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.searches(), strings(&["mesh"]));
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_is_discarded() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    transport.delay_search("geo", Duration::from_secs(1));
    let (handle, mut events, _task) = SyncController::spawn(Arc::clone(&transport), quiet_config());

    // "geo" fires at 350ms and answers at 1350ms
    handle.request_search("geo").unwrap();
    sleep(Duration::from_millis(400)).await;
    // "mesh" fires at 750ms and answers immediately
    handle.request_search("mesh").unwrap();
    sleep(Duration::from_secs(2)).await;

    assert_eq!(transport.searches(), strings(&["geo", "mesh"]));

    let changes = registry_changes(&drain(&mut events));
    assert_eq!(changes, vec![(strings(&["b"]), strings(&["c"]))]);
}

#[tokio::test(start_paused = true)]
async fn test_initial_load_fetches_whole_catalogue() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let config = quiet_config().with_initial_load(true);
    let (_handle, mut events, _task) = SyncController::spawn(Arc::clone(&transport), config);

    sleep(Duration::from_millis(1)).await;
    assert_eq!(transport.searches(), strings(&[""]));

    let events = drain(&mut events);
    assert_eq!(
        registry_changes(&events),
        vec![(strings(&["b"]), strings(&["a", "c"]))]
    );
    assert_eq!(
        statuses(&events).last(),
        Some(&("Showing 3 results".to_string(), false))
    );
}

#[tokio::test(start_paused = true)]
async fn test_install_moves_package_to_installed() {
    let catalogue = vec![
        package("a", "Alpha", &[], false),
        package("b", "Beta", &[], true),
    ];
    let transport = Arc::new(MockTransport::new(catalogue));
    let (handle, mut events) = loaded(&transport).await;

    handle.request_install("a").unwrap();
    sleep(Duration::from_secs(1)).await;

    let events = drain(&mut events);
    assert_eq!(transport.installs(), strings(&["a"]));
    assert_eq!(
        registry_changes(&events).last(),
        Some(&(strings(&["a", "b"]), vec![]))
    );

    let texts = statuses(&events);
    assert_eq!(texts.first(), Some(&("Installing Alpha …".to_string(), false)));
    assert_eq!(texts.last(), Some(&("Installed Alpha".to_string(), false)));
}

#[tokio::test(start_paused = true)]
async fn test_install_progress_is_non_decreasing() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events) = loaded(&transport).await;

    handle.request_install("c").unwrap();
    sleep(Duration::from_secs(1)).await;

    let progress = progress_for(&drain(&mut events), "c");
    assert_eq!(progress, vec![25, 50, 100]);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_install_sends_one_request() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events) = loaded(&transport).await;

    handle.request_install("a").unwrap();
    handle.request_install("a").unwrap();
    // Opposite operation while the install is in flight is ignored too
    handle.request_uninstall("a").unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(transport.installs(), strings(&["a"]));
    assert!(transport.uninstalls().is_empty());

    let events = drain(&mut events);
    let installing = statuses(&events)
        .iter()
        .filter(|(text, _)| text.starts_with("Installing"))
        .count();
    assert_eq!(installing, 1);
}

#[tokio::test(start_paused = true)]
async fn test_requests_already_in_target_state_are_ignored() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events) = loaded(&transport).await;

    // b is installed, a is not
    handle.request_install("b").unwrap();
    handle.request_uninstall("a").unwrap();
    sleep(Duration::from_secs(1)).await;

    assert!(transport.installs().is_empty());
    assert!(transport.uninstalls().is_empty());
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_id_is_silent() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events) = loaded(&transport).await;

    handle.request_install("zzz").unwrap();
    handle.request_uninstall("zzz").unwrap();
    sleep(Duration::from_secs(1)).await;

    assert!(transport.installs().is_empty());
    assert!(transport.uninstalls().is_empty());
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_install_allows_retry() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    transport.fail_operations_for("a");
    let (handle, mut events) = loaded(&transport).await;

    handle.request_install("a").unwrap();
    sleep(Duration::from_secs(1)).await;

    let failed = drain(&mut events);
    assert!(registry_changes(&failed).is_empty());
    let (text, is_error) = statuses(&failed).pop().unwrap();
    assert!(is_error);
    assert!(text.starts_with("Installation of Alpha failed"), "{text}");

    // The pending entry is gone, so a second attempt goes out
    transport.clear_failures();
    handle.request_install("a").unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(transport.installs(), strings(&["a", "a"]));
    let retried = drain(&mut events);
    assert_eq!(
        registry_changes(&retried).last(),
        Some(&(strings(&["a", "b"]), strings(&["c"])))
    );
}

#[tokio::test(start_paused = true)]
async fn test_uninstall_moves_package_to_recommended() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events) = loaded(&transport).await;

    handle.request_uninstall("b").unwrap();
    sleep(Duration::from_secs(1)).await;

    let events = drain(&mut events);
    assert_eq!(transport.uninstalls(), strings(&["b"]));
    assert_eq!(
        registry_changes(&events).last(),
        Some(&(vec![], strings(&["a", "b", "c"])))
    );
    assert!(progress_for(&events, "b").is_empty());
    assert_eq!(
        statuses(&events).last(),
        Some(&("Uninstalled Beta".to_string(), false))
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_uninstall_keeps_package_installed() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    transport.fail_operations_for("b");
    let (handle, mut events) = loaded(&transport).await;

    handle.request_uninstall("b").unwrap();
    sleep(Duration::from_secs(1)).await;

    let events = drain(&mut events);
    assert!(registry_changes(&events).is_empty());
    let (text, is_error) = statuses(&events).pop().unwrap();
    assert!(is_error);
    assert!(text.starts_with("Removal of Beta failed"), "{text}");
}

#[tokio::test(start_paused = true)]
async fn test_outcome_reapplied_to_search_fired_before_completion() {
    let transport =
        Arc::new(MockTransport::new(sample_catalogue()).with_step_delay(Duration::from_secs(1)));
    let (handle, mut events) = loaded(&transport).await;

    // The search fires at 350ms and answers at 5350ms; the install finishes at 3s
    transport.delay_search("", Duration::from_secs(5));
    handle.request_install("a").unwrap();
    handle.request_search("").unwrap();
    sleep(Duration::from_secs(10)).await;

    let seen = drain(&mut events);
    assert_eq!(transport.searches(), strings(&["", ""]));
    assert_eq!(
        registry_changes(&seen),
        vec![
            (strings(&["a", "b"]), strings(&["c"])),
            (strings(&["a", "b"]), strings(&["c"])),
        ]
    );

    // A search fired after the install completed carries the server's flag
    transport.delay_search("", Duration::ZERO);
    handle.request_search("").unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(
        registry_changes(&drain(&mut events)),
        vec![(strings(&["b"]), strings(&["a", "c"]))]
    );
}

#[tokio::test(start_paused = true)]
async fn test_outcome_dropped_after_package_leaves_results() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events) = loaded(&transport).await;

    handle.request_install("a").unwrap();
    sleep(Duration::from_secs(1)).await;
    handle.request_search("mesh").unwrap();
    sleep(Duration::from_secs(1)).await;
    handle.request_search("").unwrap();
    sleep(Duration::from_secs(1)).await;

    let changes = registry_changes(&drain(&mut events));
    assert_eq!(
        changes,
        vec![
            (strings(&["a", "b"]), strings(&["c"])),
            (strings(&["b"]), strings(&["c"])),
            (strings(&["b"]), strings(&["a", "c"])),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_install_completing_after_package_left_registry() {
    let transport =
        Arc::new(MockTransport::new(sample_catalogue()).with_step_delay(Duration::from_secs(1)));
    let (handle, mut events) = loaded(&transport).await;

    // The install takes three seconds; "mesh" replaces the registry meanwhile
    handle.request_install("a").unwrap();
    handle.request_search("mesh").unwrap();
    sleep(Duration::from_secs(5)).await;

    let seen = drain(&mut events);
    assert_eq!(
        registry_changes(&seen),
        vec![(strings(&["b"]), strings(&["c"]))]
    );
    assert_eq!(
        statuses(&seen).last(),
        Some(&("Installed Alpha".to_string(), false))
    );

    // Fired after the install completed, so the server's answer stands
    handle.request_search("geo").unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(
        registry_changes(&drain(&mut events)),
        vec![(vec![], strings(&["a"]))]
    );
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_keeps_registry() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events) = loaded(&transport).await;

    transport.fail_searches(Some(SearchFailure::Transport));
    handle.request_search("mesh").unwrap();
    sleep(Duration::from_secs(1)).await;

    let events = drain(&mut events);
    assert!(registry_changes(&events).is_empty());
    let (text, is_error) = statuses(&events).pop().unwrap();
    assert!(is_error);
    assert!(text.contains("connection refused"), "{text}");

    // The registry from the initial load is still the one operations act on
    handle.request_install("a").unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.installs(), strings(&["a"]));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_response_empties_registry() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events) = loaded(&transport).await;

    transport.fail_searches(Some(SearchFailure::Malformed));
    handle.request_search("mesh").unwrap();
    sleep(Duration::from_secs(1)).await;

    let events = drain(&mut events);
    assert_eq!(registry_changes(&events), vec![(vec![], vec![])]);
    let (text, is_error) = statuses(&events).pop().unwrap();
    assert!(is_error);
    assert!(text.starts_with("Invalid catalogue response"), "{text}");
}

#[tokio::test(start_paused = true)]
async fn test_empty_result_status() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, mut events, _task) = SyncController::spawn(Arc::clone(&transport), quiet_config());

    handle.request_search("nothing-matches").unwrap();
    sleep(Duration::from_secs(1)).await;

    let events = drain(&mut events);
    assert_eq!(registry_changes(&events), vec![(vec![], vec![])]);
    assert_eq!(
        statuses(&events).last(),
        Some(&("No extensions found.".to_string(), false))
    );
}

#[tokio::test(start_paused = true)]
async fn test_controller_stops_when_handles_dropped() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (handle, _events, task) = SyncController::spawn(Arc::clone(&transport), quiet_config());

    let spare = handle.clone();
    drop(handle);
    assert!(spare.is_running());
    drop(spare);

    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("controller did not stop")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_handle_errors_after_controller_exits() {
    let transport = Arc::new(MockTransport::new(sample_catalogue()));
    let (controller, handle, _events) = SyncController::new(Arc::clone(&transport), quiet_config());
    drop(controller);

    assert!(!handle.is_running());
    assert!(matches!(
        handle.request_search("mesh"),
        Err(Error::ControllerStopped)
    ));
}
