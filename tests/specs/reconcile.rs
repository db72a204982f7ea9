// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation planner specs: missing/extra/drift sets, redispatch of
//! active drifted sprites, and bit-identical determinism.

use bb_core::test_support::{spec, status};
use bb_core::SpriteState;
use bb_planner::{plan, Action, ActionKind};

#[test]
fn missing_extra_and_drift_in_canonical_order() {
    let desired = vec![spec("bramble"), spec("fern")];
    let observed = vec![
        status("bramble", "m-1", "thorn", "1", SpriteState::Blocked),
        status("moss", "m-3", "moss", "1", SpriteState::Idle),
    ];

    let (actions, report) = plan(&desired, "1", &observed);

    assert_eq!(report.missing, vec!["fern"]);
    assert_eq!(report.extra, vec!["moss"]);
    assert_eq!(report.drift, vec!["bramble"]);

    let summary: Vec<(ActionKind, &str)> =
        actions.iter().map(|a| (a.kind(), a.sprite())).collect();
    // Canonical order: free capacity, fix drift, add capacity, re-route.
    assert_eq!(
        summary,
        vec![
            (ActionKind::Teardown, "moss"),
            (ActionKind::Update, "bramble"),
            (ActionKind::Provision, "fern"),
            (ActionKind::Redispatch, "bramble"),
        ]
    );

    let Action::Update(update) = &actions[1] else { panic!("expected update") };
    assert!(update.changes.contains(&"persona \"thorn\" -> \"bramble\"".to_string()));
}

#[test]
fn active_drift_emits_update_then_redispatch() {
    let desired = vec![spec("bramble")];
    let observed = vec![status("bramble", "m-1", "thorn", "1", SpriteState::Working)];

    for _ in 0..3 {
        let (actions, _) = plan(&desired, "2", &observed);
        let summary: Vec<(ActionKind, &str)> =
            actions.iter().map(|a| (a.kind(), a.sprite())).collect();
        assert_eq!(
            summary,
            vec![(ActionKind::Update, "bramble"), (ActionKind::Redispatch, "bramble")]
        );
    }
}

#[test]
fn planner_output_is_bit_identical_across_calls() {
    let desired = vec![spec("bramble"), spec("fern"), spec("moss")];
    let observed = vec![
        status("moss", "m-3", "oak", "1", SpriteState::Working),
        status("bramble", "m-1", "thorn", "2", SpriteState::Blocked),
        status("holly", "m-7", "holly", "2", SpriteState::Idle),
        status("moss", "m-8", "moss", "2", SpriteState::Idle),
    ];

    let (actions_a, report_a) = plan(&desired, "2", &observed);
    let (actions_b, report_b) = plan(&desired, "2", &observed);
    assert_eq!(report_a, report_b);
    let desc_a: Vec<String> = actions_a.iter().map(Action::description).collect();
    let desc_b: Vec<String> = actions_b.iter().map(Action::description).collect();
    assert_eq!(desc_a, desc_b);
}
