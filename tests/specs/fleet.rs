// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet overview specs: a declared composition cross-referenced against a
//! live listing, with detail enrichment and reachability probes.

use bb_compose::Composition;
use bb_fleet::test_support::FakeTransport;
use bb_fleet::{fleet_overview, DisplayState, SpriteDetail, StatusOptions};
use tokio_util::sync::CancellationToken;

const COMPOSITION: &str = r#"
version = 2
name = "misty-step"

[sprites.bramble]
definition = "personas/bramble.md"

[sprites.fern]
definition = "personas/fern.md"
fallback = true
"#;

fn declared_names(dir: &std::path::Path) -> Vec<String> {
    let path = dir.join("fleet.toml");
    std::fs::write(&path, COMPOSITION).unwrap();
    let composition = Composition::load(&path).unwrap();
    composition.sprites.iter().map(|s| s.name.clone()).collect()
}

#[tokio::test]
async fn overview_correlates_composition_and_live_fleet() {
    let dir = tempfile::tempdir().unwrap();
    let declared = declared_names(dir.path());

    let transport = FakeTransport::new();
    transport.add_sprite("bramble", "running");
    transport.add_sprite("wisp", "running");
    transport.set_detail(
        "bramble",
        SpriteDetail {
            state: "working".into(),
            current_task: "issue-42".into(),
            ..Default::default()
        },
    );
    transport.set_detail("wisp", SpriteDetail { state: "idle".into(), ..Default::default() });

    let cancel = CancellationToken::new();
    let options = StatusOptions { include_tasks: true, include_probe: true, ..Default::default() };
    let overview = fleet_overview(&cancel, &transport, &declared, &options).await.unwrap();

    // fern is declared but absent; wisp is live but undeclared.
    assert_eq!(overview.missing, vec!["fern"]);
    let names: Vec<&str> = overview.sprites.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["bramble", "wisp"]);

    let bramble = &overview.sprites[0];
    assert_eq!(bramble.display_state, DisplayState::Busy);
    assert!(bramble.declared);
    assert!(bramble.probe.as_ref().unwrap().ok);

    let wisp = &overview.sprites[1];
    assert!(wisp.orphan);

    assert_eq!(overview.summary.total, 2);
    assert_eq!(overview.summary.busy, 1);
    assert_eq!(overview.summary.idle, 1);
    assert_eq!(overview.summary.orphaned, 1);
    assert_eq!(overview.summary.with_tasks, 1);
}
