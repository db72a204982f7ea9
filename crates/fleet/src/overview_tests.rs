// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::FakeTransport;
use crate::transport::TransportError;

fn declared(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[yare::parameterized(
    stopped = { "stopped", DisplayState::Offline },
    error = { "error", DisplayState::Offline },
    dead = { "dead", DisplayState::Offline },
    running = { "running", DisplayState::Idle },
    warm = { "warm", DisplayState::Idle },
    starting = { "starting", DisplayState::Operational },
    provisioning = { "provisioning", DisplayState::Operational },
    weird = { "suspended", DisplayState::Unknown },
)]
fn display_state_from_status_alone(status: &str, expected: DisplayState) {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    rt.block_on(async {
        let transport = FakeTransport::new();
        transport.add_sprite("bramble", status);
        let cancel = CancellationToken::new();
        let overview = fleet_overview(
            &cancel,
            &transport,
            &declared(&["bramble"]),
            &StatusOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(overview.sprites[0].display_state, expected);
    });
}

#[tokio::test]
async fn detail_state_overrides_conservative_idle() {
    let transport = FakeTransport::new();
    transport.add_sprite("bramble", "running");
    transport.add_sprite("fern", "running");
    transport.set_detail(
        "bramble",
        SpriteDetail { state: "working".into(), current_task: "issue-42".into(), ..Default::default() },
    );
    transport.set_detail("fern", SpriteDetail { state: "idle".into(), ..Default::default() });

    let cancel = CancellationToken::new();
    let options = StatusOptions { include_tasks: true, ..Default::default() };
    let overview =
        fleet_overview(&cancel, &transport, &declared(&["bramble", "fern"]), &options)
            .await
            .unwrap();

    assert_eq!(overview.sprites[0].display_state, DisplayState::Busy);
    assert_eq!(overview.sprites[0].current_task, "issue-42");
    assert_eq!(overview.sprites[1].display_state, DisplayState::Idle);
    assert_eq!(overview.summary.busy, 1);
    assert_eq!(overview.summary.idle, 1);
    assert_eq!(overview.summary.with_tasks, 1);
}

#[tokio::test]
async fn transitional_sprites_are_not_detail_fetched() {
    let transport = FakeTransport::new();
    transport.add_sprite("bramble", "starting");
    let cancel = CancellationToken::new();
    let options = StatusOptions { include_tasks: true, ..Default::default() };
    let overview =
        fleet_overview(&cancel, &transport, &declared(&["bramble"]), &options).await.unwrap();
    // No detail lookup happened, so no task data and no failure either.
    assert_eq!(overview.sprites[0].display_state, DisplayState::Operational);
    assert!(overview.sprites[0].current_task.is_empty());
}

#[tokio::test]
async fn stale_flag_uses_last_activity() {
    let transport = FakeTransport::new();
    transport.add_sprite("bramble", "running");
    transport.add_sprite("fern", "running");
    transport.set_detail(
        "bramble",
        SpriteDetail {
            state: "idle".into(),
            last_activity: Some(Utc::now() - Duration::hours(5)),
            ..Default::default()
        },
    );
    transport.set_detail(
        "fern",
        SpriteDetail {
            state: "idle".into(),
            last_activity: Some(Utc::now() - Duration::minutes(5)),
            ..Default::default()
        },
    );

    let cancel = CancellationToken::new();
    let options = StatusOptions { stale_threshold: Some(Duration::hours(2)), ..Default::default() };
    let overview =
        fleet_overview(&cancel, &transport, &declared(&["bramble", "fern"]), &options)
            .await
            .unwrap();

    assert!(overview.sprites[0].stale);
    assert!(!overview.sprites[1].stale);
    assert_eq!(overview.summary.stale, 1);
}

#[tokio::test]
async fn probes_only_ready_sprites() {
    let transport = FakeTransport::new();
    transport.add_sprite("bramble", "running");
    transport.add_sprite("fern", "starting");
    transport.add_sprite("moss", "stopped");
    transport.set_exec("bramble", "ok");

    let cancel = CancellationToken::new();
    let options = StatusOptions { include_probe: true, ..Default::default() };
    let overview = fleet_overview(
        &cancel,
        &transport,
        &declared(&["bramble", "fern", "moss"]),
        &options,
    )
    .await
    .unwrap();

    assert_eq!(transport.exec_calls(), vec!["bramble"]);
    let probe = overview.sprites[0].probe.as_ref().unwrap();
    assert!(probe.ok);
    assert_eq!(probe.detail, "ok");
    assert!(overview.sprites[1].probe.is_none());
    assert!(overview.sprites[2].probe.is_none());
}

#[tokio::test]
async fn failed_probe_is_reported_not_fatal() {
    let transport = FakeTransport::new();
    transport.add_sprite("bramble", "running");
    transport.fail_exec("bramble", TransportError::Network("connection reset".into()));

    let cancel = CancellationToken::new();
    let options = StatusOptions { include_probe: true, ..Default::default() };
    let overview =
        fleet_overview(&cancel, &transport, &declared(&["bramble"]), &options).await.unwrap();
    let probe = overview.sprites[0].probe.as_ref().unwrap();
    assert!(!probe.ok);
    assert!(probe.detail.contains("connection reset"));
}

#[tokio::test]
async fn orphans_and_missing_are_cross_referenced() {
    let transport = FakeTransport::new();
    transport.add_sprite("bramble", "running");
    transport.add_sprite("wisp", "running");

    let cancel = CancellationToken::new();
    let overview = fleet_overview(
        &cancel,
        &transport,
        &declared(&["bramble", "fern"]),
        &StatusOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(overview.missing, vec!["fern"]);
    let wisp = overview.sprites.iter().find(|s| s.name == "wisp").unwrap();
    assert!(wisp.orphan);
    assert!(!wisp.declared);
    assert_eq!(overview.summary.orphaned, 1);
}

#[tokio::test]
async fn output_is_sorted_by_name() {
    let transport = FakeTransport::new();
    transport.add_sprite("moss", "running");
    transport.add_sprite("bramble", "running");
    transport.add_sprite("fern", "running");

    let cancel = CancellationToken::new();
    let overview = fleet_overview(
        &cancel,
        &transport,
        &declared(&["bramble", "fern", "moss"]),
        &StatusOptions::default(),
    )
    .await
    .unwrap();
    let names: Vec<&str> = overview.sprites.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["bramble", "fern", "moss"]);
    assert_eq!(overview.summary.total, 3);
}

#[tokio::test]
async fn metadata_copied_only_with_checkpoints_flag() {
    let transport = FakeTransport::new();
    transport.add_sprite("bramble", "running");
    let mut metadata = std::collections::BTreeMap::new();
    metadata.insert("checkpoint".to_string(), "ckpt-7".to_string());
    transport.set_detail(
        "bramble",
        SpriteDetail { state: "idle".into(), metadata, ..Default::default() },
    );

    let cancel = CancellationToken::new();
    let without = StatusOptions { include_tasks: true, ..Default::default() };
    let overview =
        fleet_overview(&cancel, &transport, &declared(&["bramble"]), &without).await.unwrap();
    assert!(overview.sprites[0].metadata.is_empty());

    let with = StatusOptions { include_tasks: true, include_checkpoints: true, ..Default::default() };
    let overview =
        fleet_overview(&cancel, &transport, &declared(&["bramble"]), &with).await.unwrap();
    assert_eq!(overview.sprites[0].metadata.get("checkpoint").map(String::as_str), Some("ckpt-7"));
}
