//! Integration test for the whole-pair failure path: retry affordance,
//! no rendered slots.

mod common;

use restyle_app::generate_design_pair;
use restyle_compare::{CompareController, CompareState, SlotIndex};

#[test]
fn pair_failure_scenario_tests_shows_retry_and_no_slots() {
    let transport = common::CountingTransport::failing(500, "model unavailable");
    let client = common::client_over(transport.clone());
    let source = common::fixture_source();

    let mut compare = CompareController::new();
    let pair = compare.begin_pair().expect("pair should start");

    let error = generate_design_pair(&client, &source).expect_err("pair must fail");
    compare.fail_pair(pair.request_id, error.to_string());

    match compare.state() {
        CompareState::Failed { message } => assert!(message.contains("model unavailable")),
        other => panic!("expected failed state, got {other:?}"),
    }
    assert!(compare.slot(SlotIndex::First).is_none());
    assert!(compare.slot(SlotIndex::Second).is_none());

    // The retry affordance re-invokes the full two-way generation.
    assert!(compare.begin_pair().is_ok());
}
