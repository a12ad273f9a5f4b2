#![warn(missing_docs)]
//! # restyle-app
//!
//! ## Purpose
//! Orchestrates capture, session transfer, category gating, generation and
//! comparison for `restyle`.
//!
//! ## Responsibilities
//! - Source the app version from the root `VERSION` file.
//! - Read env-based runtime configuration (service URL, camera kill switch).
//! - Issue the two initial generation calls concurrently and join both.
//! - Regenerate a single rejected design.
//! - Project flow/compare state into a flat status snapshot.
//!
//! ## Data flow
//! Capture -> mailbox -> category gate -> concurrent pair generation ->
//! comparison state machine -> single-slot regeneration on user choice.
//!
//! ## Ownership and lifetimes
//! Helpers pass owned payloads/state snapshots between subsystems; the worker
//! threads used for the generation pair borrow the client only within a
//! thread scope.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]; the binary edge converts
//! them to anyhow reports.
//!
//! ## Security and privacy notes
//! Image payloads never appear in logs or status projections.

use restyle_capture::CaptureError;
use restyle_compare::{CompareController, CompareError, CompareState};
use restyle_core::{CoreError, EncodedImage};
use restyle_gen_client::{DesignServiceClient, GeneratedImage, GenerationError, to_displayable};
use restyle_ui::{FlowError, FlowState};
use thiserror::Error;

/// Build-time application version loaded from the root `VERSION` file.
pub const APP_VERSION: &str = env!("RESTYLE_VERSION");

/// Default generation-service base URL.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Env var overriding the generation-service base URL.
pub const SERVICE_URL_ENV: &str = "RESTYLE_SERVICE_URL";

/// Env var acting as the camera kill switch.
pub const CAMERA_ENABLED_ENV: &str = "RESTYLE_CAMERA_ENABLED";

/// Returns the app version sourced from the root `VERSION` file.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Returns the configured generation-service base URL.
///
/// Semantics:
/// - Unset or blank env var => [`DEFAULT_SERVICE_URL`].
/// - Any other value => used verbatim (validation happens in the client).
pub fn service_url_from_env() -> String {
    match std::env::var(SERVICE_URL_ENV) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => DEFAULT_SERVICE_URL.to_string(),
    }
}

/// Checks the runtime camera kill-switch env var.
///
/// Semantics:
/// - Unset => camera enabled.
/// - `0`, `false`, `off` (case-insensitive) => camera disabled.
/// - Any other value => camera enabled.
pub fn camera_enabled_from_env() -> bool {
    match std::env::var(CAMERA_ENABLED_ENV) {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Issues the two initial generation calls concurrently and joins both.
///
/// Both calls omit the style tile so each result is independently randomized
/// by the service. Slot assignment is positional: the first spawned call
/// becomes slot 0 regardless of completion order. Both-or-error: if either
/// call fails, no partial pair is returned.
///
/// # Errors
/// Returns [`AppError::Generation`] when either call fails and
/// [`AppError::WorkerPanicked`] when a worker thread dies.
pub fn generate_design_pair(
    client: &DesignServiceClient,
    source: &EncodedImage,
) -> Result<[String; 2], AppError> {
    log::info!("issuing two concurrent generation calls");
    let (first, second) = std::thread::scope(|scope| {
        let first = scope.spawn(|| client.generate(source, None));
        let second = scope.spawn(|| client.generate(source, None));
        (join_generation(first), join_generation(second))
    });

    let first = first?;
    let second = second?;
    Ok([to_displayable(&first), to_displayable(&second)])
}

/// Generates one replacement design for a rejected slot.
///
/// # Errors
/// Returns [`AppError::Generation`] when the call fails.
pub fn regenerate_design(
    client: &DesignServiceClient,
    source: &EncodedImage,
) -> Result<String, AppError> {
    let generated = client.generate(source, None)?;
    Ok(to_displayable(&generated))
}

fn join_generation(
    handle: std::thread::ScopedJoinHandle<'_, Result<GeneratedImage, GenerationError>>,
) -> Result<GeneratedImage, AppError> {
    handle
        .join()
        .map_err(|_| AppError::WorkerPanicked)?
        .map_err(AppError::Generation)
}

/// Consolidated runtime status snapshot for simple UI projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStatus {
    /// Current screen as human-readable text.
    pub screen: String,
    /// Comparison phase as human-readable text.
    pub compare: String,
    /// Whether the generate action is currently reachable.
    pub can_generate: bool,
    /// Whether the camera kill switch currently allows capture.
    pub camera_enabled: bool,
}

/// Projects flow and comparison state into a flat status snapshot.
pub fn project_flow_status(flow: &FlowState, compare: &CompareController) -> FlowStatus {
    FlowStatus {
        screen: format!("{:?}", flow.screen()),
        compare: compare_phase_label(compare.state()).to_string(),
        can_generate: flow.can_generate(),
        camera_enabled: camera_enabled_from_env(),
    }
}

fn compare_phase_label(state: &CompareState) -> &'static str {
    match state {
        CompareState::Empty => "No designs yet",
        CompareState::GeneratingPair { .. } => "Generating designs",
        CompareState::Ready => "Awaiting choice",
        CompareState::RegeneratingSlot { .. } => "Regenerating rejected design",
        CompareState::Failed { .. } => "Generation failed",
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Capture subsystem error.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Generation client error.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    /// Comparison flow error.
    #[error("compare error: {0}")]
    Compare(#[from] CompareError),
    /// UI flow gating/validation error.
    #[error("flow error: {0}")]
    Flow(#[from] FlowError),
    /// A generation worker thread panicked.
    #[error("generation worker panicked")]
    WorkerPanicked,
}
