#![warn(missing_docs)]
//! # restyle-compare
//!
//! ## Purpose
//! Drives the two-way comparison-and-refine loop over generated designs.
//!
//! ## Responsibilities
//! - Model the comparison lifecycle as one explicit state machine
//!   (`Empty | GeneratingPair | Ready | RegeneratingSlot | Failed`).
//! - Commit the initial pair both-or-nothing; never render a partial pair.
//! - Replace only the rejected slot on a user choice, under a fresh
//!   identifier.
//! - Guard every commit with a monotonic request id so late responses from a
//!   superseded request can never overwrite newer state.
//!
//! ## Data flow
//! Caller begins a pair -> issues two concurrent generation calls -> joins
//! both -> commits displayable results. A choice begins a single-slot
//! regeneration; its result replaces the rejected slot only.
//!
//! ## Ownership and lifetimes
//! Slots own their display payloads; the controller performs no I/O and holds
//! no transport handles.
//!
//! ## Error model
//! Illegal transitions return [`CompareError`]. Stale commits are not errors;
//! they report [`CommitOutcome::Stale`] and mutate nothing.
//!
//! ## Security and privacy notes
//! Display payloads are treated as opaque; diagnostics carry request ids and
//! slot positions only.

use restyle_core::{DesignId, mint_design_id};
use thiserror::Error;

/// Position of one design in the side-by-side comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotIndex {
    /// Left/first position (slot 0).
    First,
    /// Right/second position (slot 1).
    Second,
}

impl SlotIndex {
    /// Returns the opposite position.
    pub fn other(self) -> Self {
        match self {
            SlotIndex::First => SlotIndex::Second,
            SlotIndex::Second => SlotIndex::First,
        }
    }

    /// Returns the positional array index.
    pub fn as_usize(self) -> usize {
        match self {
            SlotIndex::First => 0,
            SlotIndex::Second => 1,
        }
    }
}

/// One committed design occupying a comparison slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignSlot {
    /// Identifier minted at commit time; never reused for a replacement.
    pub id: DesignId,
    /// Display-ready payload (data-URL form).
    pub display: String,
}

/// Comparison lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareState {
    /// No designs yet; a pair may be started.
    Empty,
    /// Both initial generation calls are in flight.
    GeneratingPair {
        /// Identifier of the in-flight pair request.
        request_id: u64,
    },
    /// Both slots hold committed designs awaiting a choice.
    Ready,
    /// One rejected slot is being regenerated; the kept slot stays live.
    RegeneratingSlot {
        /// Slot being replaced.
        slot: SlotIndex,
        /// Identifier of the in-flight regeneration request.
        request_id: u64,
    },
    /// Initial generation failed; a retry re-runs the full pair.
    Failed {
        /// Human-readable failure description for the retry affordance.
        message: String,
    },
}

/// Handle for one issued pair generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRequest {
    /// Monotonic identifier guarding the pair commit.
    pub request_id: u64,
}

/// Handle for one issued single-slot regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerationRequest {
    /// Monotonic identifier guarding the regeneration commit.
    pub request_id: u64,
    /// Slot the result will replace.
    pub slot: SlotIndex,
}

/// Result of offering a generation outcome to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The outcome belonged to the current request and was applied.
    Committed,
    /// The outcome belonged to a superseded request and was discarded.
    Stale,
}

/// Inline error attached to one slot after a failed regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotError {
    /// Slot whose regeneration failed.
    pub slot: SlotIndex,
    /// Human-readable failure description.
    pub message: String,
}

/// State machine for the two-slot compare-and-refine flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareController {
    state: CompareState,
    slots: [Option<DesignSlot>; 2],
    next_request_id: u64,
    next_design_sequence: u64,
    slot_error: Option<SlotError>,
}

impl CompareController {
    /// Creates an empty comparison.
    pub fn new() -> Self {
        Self {
            state: CompareState::Empty,
            slots: [None, None],
            next_request_id: 0,
            next_design_sequence: 0,
            slot_error: None,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> &CompareState {
        &self.state
    }

    /// Returns the committed design in a slot, when one exists.
    pub fn slot(&self, index: SlotIndex) -> Option<&DesignSlot> {
        self.slots[index.as_usize()].as_ref()
    }

    /// Returns the inline error from the most recent failed regeneration.
    pub fn last_slot_error(&self) -> Option<&SlotError> {
        self.slot_error.as_ref()
    }

    /// Starts the initial two-way generation.
    ///
    /// Callers issue exactly two concurrent generation calls for the returned
    /// request and join both before committing. Slot assignment is positional
    /// and fixed now, not at completion time.
    ///
    /// # Errors
    /// Returns [`CompareError::PairUnavailable`] outside `Empty`/`Failed`.
    pub fn begin_pair(&mut self) -> Result<PairRequest, CompareError> {
        match self.state {
            CompareState::Empty | CompareState::Failed { .. } => {}
            _ => return Err(CompareError::PairUnavailable),
        }

        self.slots = [None, None];
        self.slot_error = None;
        let request_id = self.mint_request_id();
        self.state = CompareState::GeneratingPair { request_id };
        log::debug!("pair generation {request_id} started");
        Ok(PairRequest { request_id })
    }

    /// Commits both pair results together.
    ///
    /// Both-or-nothing by construction: a partial pair cannot be committed.
    /// Each design receives a freshly minted identifier.
    pub fn commit_pair(&mut self, request_id: u64, displays: [String; 2]) -> CommitOutcome {
        if !self.pair_request_is_current(request_id) {
            log::debug!("ignoring stale pair result for request {request_id}");
            return CommitOutcome::Stale;
        }

        let [first, second] = displays;
        self.slots = [
            Some(self.mint_slot(first)),
            Some(self.mint_slot(second)),
        ];
        self.state = CompareState::Ready;
        CommitOutcome::Committed
    }

    /// Records a whole-pair failure, enabling the retry affordance.
    pub fn fail_pair(&mut self, request_id: u64, message: impl Into<String>) -> CommitOutcome {
        if !self.pair_request_is_current(request_id) {
            return CommitOutcome::Stale;
        }

        self.slots = [None, None];
        self.state = CompareState::Failed {
            message: message.into(),
        };
        CommitOutcome::Committed
    }

    /// Marks the rejected slot for regeneration after the user kept `kept`.
    ///
    /// The kept slot's identifier and image are untouched; exactly one
    /// generation call results, and only one slot may regenerate at a time.
    ///
    /// # Errors
    /// Returns [`CompareError::ChoiceUnavailable`] unless both designs are
    /// ready.
    pub fn choose(&mut self, kept: SlotIndex) -> Result<RegenerationRequest, CompareError> {
        if self.state != CompareState::Ready {
            return Err(CompareError::ChoiceUnavailable);
        }

        self.slot_error = None;
        let slot = kept.other();
        let request_id = self.mint_request_id();
        self.state = CompareState::RegeneratingSlot { slot, request_id };
        log::debug!("regeneration {request_id} started for rejected slot {slot:?}");
        Ok(RegenerationRequest { request_id, slot })
    }

    /// Replaces the regenerating slot with the new result.
    ///
    /// The replacement carries a freshly minted identifier, so display keys
    /// never collide with the discarded prior design.
    pub fn commit_regeneration(&mut self, request_id: u64, display: String) -> CommitOutcome {
        let Some(slot) = self.regenerating_slot_for(request_id) else {
            log::debug!("ignoring stale regeneration result for request {request_id}");
            return CommitOutcome::Stale;
        };

        self.slots[slot.as_usize()] = Some(self.mint_slot(display));
        self.state = CompareState::Ready;
        CommitOutcome::Committed
    }

    /// Records a single-slot failure, keeping both slots last-known-good.
    pub fn fail_regeneration(
        &mut self,
        request_id: u64,
        message: impl Into<String>,
    ) -> CommitOutcome {
        let Some(slot) = self.regenerating_slot_for(request_id) else {
            return CommitOutcome::Stale;
        };

        self.slot_error = Some(SlotError {
            slot,
            message: message.into(),
        });
        self.state = CompareState::Ready;
        CommitOutcome::Committed
    }

    fn pair_request_is_current(&self, request_id: u64) -> bool {
        matches!(
            self.state,
            CompareState::GeneratingPair { request_id: current } if current == request_id
        )
    }

    fn regenerating_slot_for(&self, request_id: u64) -> Option<SlotIndex> {
        match self.state {
            CompareState::RegeneratingSlot {
                slot,
                request_id: current,
            } if current == request_id => Some(slot),
            _ => None,
        }
    }

    fn mint_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    fn mint_slot(&mut self, display: String) -> DesignSlot {
        self.next_design_sequence += 1;
        DesignSlot {
            id: mint_design_id(self.next_design_sequence, display.as_bytes()),
            display,
        }
    }
}

impl Default for CompareController {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare flow error type.
#[derive(Debug, Error)]
pub enum CompareError {
    /// A pair can only start from the empty or failed state.
    #[error("a new pair can only start from the empty or failed state")]
    PairUnavailable,
    /// A choice requires both designs to be ready.
    #[error("a choice requires both designs to be ready")]
    ChoiceUnavailable,
}

#[cfg(test)]
mod tests {
    //! Unit tests for pair commits, choice semantics and staleness guards.

    use super::*;

    fn ready_controller() -> CompareController {
        let mut controller = CompareController::new();
        let pair = controller.begin_pair().expect("pair should start");
        let outcome = controller.commit_pair(
            pair.request_id,
            ["design-a".to_string(), "design-b".to_string()],
        );
        assert_eq!(outcome, CommitOutcome::Committed);
        controller
    }

    #[test]
    fn pair_commit_fills_both_slots_with_distinct_ids() {
        let controller = ready_controller();

        assert_eq!(controller.state(), &CompareState::Ready);
        let first = controller.slot(SlotIndex::First).expect("slot 0 filled");
        let second = controller.slot(SlotIndex::Second).expect("slot 1 filled");
        assert_ne!(first.id, second.id);
        assert_eq!(first.display, "design-a");
        assert_eq!(second.display, "design-b");
    }

    #[test]
    fn no_slots_render_while_pair_is_generating() {
        let mut controller = CompareController::new();
        controller.begin_pair().expect("pair should start");

        assert!(controller.slot(SlotIndex::First).is_none());
        assert!(controller.slot(SlotIndex::Second).is_none());
    }

    #[test]
    fn pair_failure_enables_retry_and_renders_no_slots() {
        let mut controller = CompareController::new();
        let pair = controller.begin_pair().expect("pair should start");
        controller.fail_pair(pair.request_id, "model unavailable");

        assert_eq!(
            controller.state(),
            &CompareState::Failed {
                message: "model unavailable".to_string()
            }
        );
        assert!(controller.slot(SlotIndex::First).is_none());
        assert!(controller.slot(SlotIndex::Second).is_none());

        // Retry re-runs the full two-way generation.
        let retry = controller.begin_pair().expect("retry should start");
        assert!(retry.request_id > pair.request_id);
    }

    #[test]
    fn choosing_first_replaces_only_second() {
        let mut controller = ready_controller();
        let kept_before = controller
            .slot(SlotIndex::First)
            .expect("slot 0 filled")
            .clone();
        let rejected_before = controller
            .slot(SlotIndex::Second)
            .expect("slot 1 filled")
            .clone();

        let regeneration = controller.choose(SlotIndex::First).expect("choice allowed");
        assert_eq!(regeneration.slot, SlotIndex::Second);
        assert_eq!(
            controller.state(),
            &CompareState::RegeneratingSlot {
                slot: SlotIndex::Second,
                request_id: regeneration.request_id
            }
        );
        // The kept slot stays interactable-looking and untouched.
        assert_eq!(controller.slot(SlotIndex::First), Some(&kept_before));

        let outcome =
            controller.commit_regeneration(regeneration.request_id, "design-c".to_string());
        assert_eq!(outcome, CommitOutcome::Committed);

        let kept_after = controller.slot(SlotIndex::First).expect("slot 0 filled");
        let replaced = controller.slot(SlotIndex::Second).expect("slot 1 filled");
        assert_eq!(kept_after, &kept_before);
        assert_ne!(replaced.id, rejected_before.id);
        assert_eq!(replaced.display, "design-c");
    }

    #[test]
    fn only_one_slot_regenerates_at_a_time() {
        let mut controller = ready_controller();
        controller.choose(SlotIndex::First).expect("choice allowed");
        assert!(matches!(
            controller.choose(SlotIndex::Second),
            Err(CompareError::ChoiceUnavailable)
        ));
    }

    #[test]
    fn stale_pair_result_cannot_overwrite_newer_request() {
        let mut controller = CompareController::new();
        let first = controller.begin_pair().expect("pair should start");
        controller.fail_pair(first.request_id, "timeout");
        let second = controller.begin_pair().expect("retry should start");

        // Late completion of the superseded request arrives out of order.
        let outcome = controller.commit_pair(
            first.request_id,
            ["late-a".to_string(), "late-b".to_string()],
        );
        assert_eq!(outcome, CommitOutcome::Stale);
        assert_eq!(
            controller.state(),
            &CompareState::GeneratingPair {
                request_id: second.request_id
            }
        );
        assert!(controller.slot(SlotIndex::First).is_none());
    }

    #[test]
    fn stale_regeneration_result_is_discarded() {
        let mut controller = ready_controller();
        let first = controller.choose(SlotIndex::First).expect("choice allowed");
        controller.fail_regeneration(first.request_id, "timeout");
        let second = controller.choose(SlotIndex::First).expect("choice allowed");

        let outcome = controller.commit_regeneration(first.request_id, "late".to_string());
        assert_eq!(outcome, CommitOutcome::Stale);
        assert_eq!(
            controller.state(),
            &CompareState::RegeneratingSlot {
                slot: SlotIndex::Second,
                request_id: second.request_id
            }
        );
    }

    #[test]
    fn regeneration_failure_keeps_last_known_good_pair() {
        let mut controller = ready_controller();
        let first_before = controller.slot(SlotIndex::First).cloned();
        let second_before = controller.slot(SlotIndex::Second).cloned();

        let regeneration = controller.choose(SlotIndex::Second).expect("choice allowed");
        controller.fail_regeneration(regeneration.request_id, "model unavailable");

        assert_eq!(controller.state(), &CompareState::Ready);
        assert_eq!(controller.slot(SlotIndex::First).cloned(), first_before);
        assert_eq!(controller.slot(SlotIndex::Second).cloned(), second_before);

        let error = controller.last_slot_error().expect("inline error recorded");
        assert_eq!(error.slot, SlotIndex::First);
        assert_eq!(error.message, "model unavailable");
    }

    #[test]
    fn successful_regeneration_clears_inline_error() {
        let mut controller = ready_controller();
        let failed = controller.choose(SlotIndex::First).expect("choice allowed");
        controller.fail_regeneration(failed.request_id, "timeout");
        assert!(controller.last_slot_error().is_some());

        let retried = controller.choose(SlotIndex::First).expect("choice allowed");
        controller.commit_regeneration(retried.request_id, "design-d".to_string());
        assert!(controller.last_slot_error().is_none());
    }
}
