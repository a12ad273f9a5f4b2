#![warn(missing_docs)]
//! # restyle-ui
//!
//! ## Purpose
//! Defines the UI-facing flow state for the capture -> categories -> compare
//! journey.
//!
//! ## Responsibilities
//! - Track screen routing and the user's category selection.
//! - Gate the generate action on a non-empty selection.
//! - Validate the captured-photo payload before navigating onward.
//! - Resolve missing upstream session data into a redirect to the entry
//!   screen instead of a broken render.
//!
//! ## Data flow
//! Capture hands a data-URL payload to the mailbox -> the categories screen
//! gates and validates -> navigation state carries the serialized tags while
//! the image travels via the mailbox only (never in visible navigation
//! state).
//!
//! ## Ownership and lifetimes
//! `FlowState` owns all selection/status values to keep event reducers free
//! of cross-thread borrowing.
//!
//! ## Error model
//! Gate and validation violations return [`FlowError`] with user-visible
//! messages. Missing upstream data is not an error class at all; it becomes
//! a redirect decision.
//!
//! ## Security and privacy notes
//! Payload contents never appear in logs or navigation state; only the
//! serialized category tags travel visibly.

use restyle_core::{CategorySelection, CoreError, RedesignCategory, parse_data_url};
use restyle_mailbox::Taken;
use thiserror::Error;

/// Screens of the capture-to-compare journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Entry point: camera preview / file picker.
    Capture,
    /// Category tagging for the redesign.
    Categories,
    /// Side-by-side generated design comparison.
    Compare,
}

/// Navigation state carried visibly between screens.
///
/// Only the serialized tags travel here; image payloads stay in the session
/// mailbox to keep binary data out of history and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    /// Comma-joined category identifiers (unordered tag list).
    pub tags: String,
}

/// Result of consuming upstream session data on screen entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamResolution {
    /// Upstream data exists; the screen may render.
    Available(String),
    /// Nothing upstream; the flow was redirected to the entry screen.
    RedirectedToEntry,
}

/// UI flow state for one capture-to-compare session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState {
    screen: Screen,
    selection: CategorySelection,
}

impl FlowState {
    /// Creates flow state at the entry screen.
    pub fn new() -> Self {
        Self {
            screen: Screen::Capture,
            selection: CategorySelection::new(),
        }
    }

    /// Returns the current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Returns the current category selection.
    pub fn selection(&self) -> &CategorySelection {
        &self.selection
    }

    /// Advances from capture to category tagging once a photo is frozen.
    pub fn photo_ready(&mut self) {
        self.screen = Screen::Categories;
    }

    /// Flips membership of one category.
    pub fn toggle_category(&mut self, category: RedesignCategory) {
        self.selection.toggle(category);
    }

    /// Returns `true` when the generate action is reachable.
    ///
    /// The action stays unreachable while the selection is empty, which is
    /// what keeps an empty selection from ever reaching the generation step.
    pub fn can_generate(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Activates generation: validates the photo payload and navigates to the
    /// comparison screen.
    ///
    /// The caller re-posts the validated payload into the mailbox for the
    /// comparison screen; the returned navigation state carries only the
    /// serialized tags.
    ///
    /// # Errors
    /// Returns [`FlowError::EmptySelection`] when the gate is closed and
    /// [`FlowError::InvalidPayload`] when the payload fails data-URL
    /// validation; both abort navigation, and the cause is logged.
    pub fn activate_generate(&mut self, photo_payload: &str) -> Result<NavigationState, FlowError> {
        if !self.can_generate() {
            return Err(FlowError::EmptySelection);
        }

        if let Err(error) = parse_data_url(photo_payload) {
            log::error!("captured photo payload failed validation: {error}");
            return Err(FlowError::InvalidPayload(error));
        }

        self.screen = Screen::Compare;
        Ok(NavigationState {
            tags: self.selection.serialize(),
        })
    }

    /// Resolves upstream session data on entry to a downstream screen.
    ///
    /// `Absent` (including degraded storage) means "no upstream data": the
    /// flow redirects to the entry screen rather than rendering a broken
    /// state.
    pub fn resolve_upstream(&mut self, taken: Taken) -> UpstreamResolution {
        match taken {
            Taken::Value(value) => UpstreamResolution::Available(value),
            Taken::Absent => {
                log::warn!("no upstream session data; redirecting to the capture screen");
                self.screen = Screen::Capture;
                self.selection = CategorySelection::new();
                UpstreamResolution::RedirectedToEntry
            }
        }
    }
}

impl Default for FlowState {
    fn default() -> Self {
        Self::new()
    }
}

/// Flow gating and validation error type.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Generate was activated with no categories selected.
    #[error("select at least one category before generating")]
    EmptySelection,
    /// Captured photo payload failed data-URL validation.
    #[error("captured photo payload is invalid: {0}")]
    InvalidPayload(#[source] CoreError),
}
