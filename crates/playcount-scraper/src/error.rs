use std::time::Duration;

use thiserror::Error;

/// Faults raised by a rendering engine.
///
/// These never escape an extraction attempt: the page extractor folds them
/// into an [`playcount_core::AttemptOutcome`] so the fallback chain can move on.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("navigation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("invalid browser parameters: {0}")]
    Params(String),

    #[error("browser protocol error: {0}")]
    Protocol(#[from] chromiumoxide::error::CdpError),
}
