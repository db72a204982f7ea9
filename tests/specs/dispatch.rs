// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch scheduler specs: busy skipping, fleet-busy rejection, the
//! reserve/re-check race, and reservation mutual exclusion.

use bb_core::FakeClock;
use bb_dispatch::test_support::FakeProbe;
use bb_dispatch::{DispatchError, DispatchRequest, Dispatcher};
use bb_registry::Registry;
use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

fn ts(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

fn seed_registry(dir: &Path) -> PathBuf {
    let path = dir.join("registry.toml");
    let mut registry = Registry::new("bitterblossom", ts(1_700_000_000));
    registry.register("bramble", "m-1", ts(1_700_000_000));
    registry.register("fern", "m-2", ts(1_700_000_000));
    registry.save(&path).unwrap();
    path
}

fn request(issue: u64, repo: &str) -> DispatchRequest {
    DispatchRequest { issue, repo: repo.to_string(), sprite: None }
}

#[tokio::test]
async fn auto_assign_skips_busy_sprites() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed_registry(dir.path());
    let probe = FakeProbe::new();
    probe.push("m-1", "running");
    probe.push("m-2", "idle");

    let dispatcher = Dispatcher::new(&path, probe, FakeClock::at(ts(1_700_000_500)));
    let cancel = CancellationToken::new();
    let assignment = dispatcher
        .dispatch(&cancel, &request(186, "misty-step/bitterblossom"))
        .await
        .unwrap();

    assert_eq!(assignment.sprite, "fern");
    assert_eq!(assignment.machine_id, "m-2");

    let registry = Registry::load(&path).unwrap();
    let fern = &registry.sprites["fern"];
    assert_eq!(fern.assigned_issue, 186);
    assert_eq!(fern.assigned_repo, "misty-step/bitterblossom");
    assert!(fern.assigned_at.is_some());
}

#[tokio::test]
async fn fully_busy_fleet_is_rejected_with_every_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed_registry(dir.path());
    let probe = FakeProbe::new();
    probe.push("m-1", "running");
    probe.push("m-2", "blocked");

    let dispatcher = Dispatcher::new(&path, probe, FakeClock::at(ts(1_700_000_500)));
    let cancel = CancellationToken::new();
    let err = dispatcher.dispatch(&cancel, &request(186, "misty-step/bitterblossom")).await;

    let Err(DispatchError::Busy(busy)) = err else { panic!("expected fleet busy") };
    assert_eq!(busy.candidates.len(), 2);

    // Nothing was reserved.
    let registry = Registry::load(&path).unwrap();
    assert_eq!(registry.sprites["bramble"].assigned_issue, 0);
    assert_eq!(registry.sprites["fern"].assigned_issue, 0);
}

#[tokio::test]
async fn sprite_turning_busy_after_reserve_is_released() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed_registry(dir.path());
    let probe = FakeProbe::new();
    probe.push("m-1", "idle");
    probe.push("m-1", "running");
    probe.push("m-2", "idle");

    let dispatcher = Dispatcher::new(&path, probe, FakeClock::at(ts(1_700_000_500)));
    let cancel = CancellationToken::new();
    let assignment =
        dispatcher.dispatch(&cancel, &request(300, "misty-step/oakheart")).await.unwrap();

    assert_eq!(assignment.sprite, "fern");
    assert_eq!(assignment.machine_id, "m-2");

    let registry = Registry::load(&path).unwrap();
    assert_eq!(registry.sprites["bramble"].assigned_issue, 0);
    assert_eq!(registry.sprites["fern"].assigned_issue, 300);
}

#[tokio::test]
async fn plan_then_commit_pick_the_same_sprite_when_idle() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed_registry(dir.path());
    let dispatcher =
        Dispatcher::new(&path, FakeProbe::new(), FakeClock::at(ts(1_700_000_500)));
    let cancel = CancellationToken::new();

    let planned = dispatcher.plan(&cancel, &request(7, "misty-step/oakheart")).await.unwrap();
    let committed =
        dispatcher.dispatch(&cancel, &request(7, "misty-step/oakheart")).await.unwrap();
    assert_eq!(planned.sprite, committed.sprite);
    assert_eq!(planned.machine_id, committed.machine_id);
}

#[tokio::test]
async fn concurrent_dispatches_never_share_a_sprite() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed_registry(dir.path());
    let cancel = CancellationToken::new();

    let a = Dispatcher::new(&path, FakeProbe::new(), FakeClock::at(ts(1_700_000_500)));
    let b = Dispatcher::new(&path, FakeProbe::new(), FakeClock::at(ts(1_700_000_500)));

    let req_a = request(101, "misty-step/oakheart");
    let req_b = request(202, "misty-step/oakheart");
    let (ra, rb) = tokio::join!(
        a.dispatch(&cancel, &req_a),
        b.dispatch(&cancel, &req_b),
    );
    let ra = ra.unwrap();
    let rb = rb.unwrap();

    // Both scanned the same sorted candidate list; the lock disambiguated.
    assert_ne!(ra.sprite, rb.sprite);

    let registry = Registry::load(&path).unwrap();
    assert_eq!(registry.sprites[ra.sprite.as_str()].assigned_issue, 101);
    assert_eq!(registry.sprites[rb.sprite.as_str()].assigned_issue, 202);
}
