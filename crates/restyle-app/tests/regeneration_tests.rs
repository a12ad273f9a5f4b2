//! Integration tests for single-slot regeneration request accounting.

mod common;

use restyle_app::{generate_design_pair, regenerate_design};
use restyle_compare::{CompareController, CompareState, SlotIndex};

#[test]
fn regeneration_tests_replaces_only_rejected_slot_with_one_request() {
    let transport = common::CountingTransport::succeeding();
    let client = common::client_over(transport.clone());
    let source = common::fixture_source();

    let mut compare = CompareController::new();
    let pair = compare.begin_pair().expect("pair should start");
    let displays = generate_design_pair(&client, &source).expect("pair should generate");
    compare.commit_pair(pair.request_id, displays);
    assert_eq!(transport.request_count(), 2);

    let kept_before = compare
        .slot(SlotIndex::First)
        .expect("slot 0 filled")
        .clone();
    let rejected_before = compare
        .slot(SlotIndex::Second)
        .expect("slot 1 filled")
        .clone();

    let regeneration = compare.choose(SlotIndex::First).expect("choice allowed");
    let display = regenerate_design(&client, &source).expect("regeneration should succeed");
    compare.commit_regeneration(regeneration.request_id, display);

    // Exactly one additional generation request was issued.
    assert_eq!(transport.request_count(), 3);
    assert_eq!(compare.state(), &CompareState::Ready);
    assert_eq!(compare.slot(SlotIndex::First), Some(&kept_before));
    let replaced = compare.slot(SlotIndex::Second).expect("slot 1 filled");
    assert_ne!(replaced.id, rejected_before.id);
}
