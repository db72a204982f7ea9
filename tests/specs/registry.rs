// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry specs: on-disk round-trip and cross-task lock serialization.

use bb_registry::{with_locked_registry, Registry};
use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

fn ts(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

#[test]
fn registry_round_trips_reservations_and_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.toml");

    let mut registry = Registry::new("bitterblossom", ts(1_700_000_000));
    registry.register("bramble", "m-1", ts(1_700_000_100));
    registry.register("fern", "m-2", ts(1_700_000_200));
    registry.reserve("fern", 186, "misty-step/bitterblossom", ts(1_700_005_000));
    registry.save(&path).unwrap();

    let loaded = Registry::load(&path).unwrap();
    assert_eq!(loaded, registry);
    assert_eq!(loaded.names(), ["bramble", "fern"]);
}

#[tokio::test]
async fn locked_sections_serialize_read_modify_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.toml");
    let cancel = CancellationToken::new();

    // Many concurrent increments through the locked composite; every one
    // must be preserved.
    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let path = path.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                with_locked_registry(&cancel, &path, move |registry| {
                    registry.register(format!("sprite-{i}"), format!("m-{i}"), Utc::now());
                    Ok(())
                })
                .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let registry = Registry::load(&path).unwrap();
    assert_eq!(registry.sprites.len(), 8);
}
