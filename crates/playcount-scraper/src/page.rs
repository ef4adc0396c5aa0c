//! A single extraction attempt with one engine.
//!
//! The attempt owns its browser and context exclusively: both are created
//! here and closed here on every exit path, including engine faults and
//! panics raised anywhere in the engine.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use playcount_core::AttemptOutcome;

use crate::engine::{
    ContextOptions, Engine, EngineContext, EnginePage, LaunchOptions, NavigateOptions, WaitUntil,
    CONSENT_BUTTONS,
};
use crate::error::EngineError;
use crate::extract::extract_count;
use crate::locator::{locate, RawContainers, LOCATE_SCRIPT};
use crate::target::Target;

/// Knobs for one attempt; shared by every engine in a chain.
#[derive(Debug, Clone)]
pub struct AttemptSettings {
    pub nav_timeout: Duration,
    /// Hydration settle interval after consent handling.
    pub settle: Duration,
    /// Scroll once before settling to trigger lazily loaded state.
    pub scroll: bool,
    pub launch: LaunchOptions,
    pub context: ContextOptions,
}

impl Default for AttemptSettings {
    fn default() -> Self {
        Self {
            nav_timeout: Duration::from_secs(60),
            settle: Duration::from_millis(1_500),
            scroll: true,
            launch: LaunchOptions::default(),
            context: ContextOptions::default(),
        }
    }
}

/// Record of one engine attempt against one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionAttempt {
    pub engine: String,
    pub status: Option<u16>,
    /// Raw page size, captured on `noData`.
    pub page_length: Option<usize>,
    pub outcome: AttemptOutcome,
    /// Present only on success.
    pub count: Option<u64>,
    pub reason: String,
}

impl ExtractionAttempt {
    fn failed(engine: &str, outcome: AttemptOutcome, reason: impl Into<String>) -> Self {
        Self {
            engine: engine.to_string(),
            status: None,
            page_length: None,
            outcome,
            count: None,
            reason: reason.into(),
        }
    }

    fn exception(engine: &str, cause: impl std::fmt::Display) -> Self {
        Self::failed(engine, AttemptOutcome::Exception, format!("exception: {cause}"))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == AttemptOutcome::Success
    }
}

/// Runs one attempt of `engine` against `target`. Never returns an error:
/// every fault is folded into the attempt's outcome.
pub async fn run_attempt(
    engine: &dyn Engine,
    target: &Target,
    settings: &AttemptSettings,
) -> ExtractionAttempt {
    let engine_id = engine.id();

    let launched = AssertUnwindSafe(engine.launch(&settings.launch))
        .catch_unwind()
        .await;
    let mut browser = match launched {
        Ok(Ok(browser)) => browser,
        Ok(Err(e)) => return ExtractionAttempt::exception(engine_id, e),
        Err(panic) => {
            return ExtractionAttempt::exception(engine_id, panic_message(panic.as_ref()))
        }
    };

    let opened = AssertUnwindSafe(browser.new_context(&settings.context))
        .catch_unwind()
        .await;
    let attempt = match opened {
        Ok(Ok(mut context)) => {
            let driven = AssertUnwindSafe(drive(context.as_mut(), target, settings, engine_id))
                .catch_unwind()
                .await;
            match AssertUnwindSafe(context.close()).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(engine = engine_id, error = %e, "failed to close browser context");
                }
                Err(panic) => tracing::warn!(
                    engine = engine_id,
                    panic = %panic_message(panic.as_ref()),
                    "browser context panicked on close"
                ),
            }
            match driven {
                Ok(Ok(attempt)) => attempt,
                Ok(Err(e)) => ExtractionAttempt::exception(engine_id, e),
                Err(panic) => ExtractionAttempt::exception(engine_id, panic_message(panic.as_ref())),
            }
        }
        Ok(Err(e)) => ExtractionAttempt::exception(engine_id, e),
        Err(panic) => ExtractionAttempt::exception(engine_id, panic_message(panic.as_ref())),
    };

    match AssertUnwindSafe(browser.close()).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(engine = engine_id, error = %e, "failed to close browser"),
        Err(panic) => tracing::warn!(
            engine = engine_id,
            panic = %panic_message(panic.as_ref()),
            "browser panicked on close"
        ),
    }
    attempt
}

/// Navigation, consent handling, settling and extraction on a fresh page.
///
/// Navigation failures are mapped to `navigationError` here; any other
/// engine error propagates and becomes `exception` in the caller.
async fn drive(
    context: &mut dyn EngineContext,
    target: &Target,
    settings: &AttemptSettings,
    engine_id: &str,
) -> Result<ExtractionAttempt, EngineError> {
    let mut page = context.new_page().await?;

    let nav = NavigateOptions {
        wait_until: WaitUntil::NetworkIdle,
        timeout: settings.nav_timeout,
    };
    let status = match tokio::time::timeout(
        settings.nav_timeout,
        page.goto(&target.canonical, &nav),
    )
    .await
    {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            return Ok(ExtractionAttempt::failed(
                engine_id,
                AttemptOutcome::NavigationError,
                e.to_string(),
            ))
        }
        Err(_) => {
            return Ok(ExtractionAttempt::failed(
                engine_id,
                AttemptOutcome::NavigationError,
                EngineError::Timeout(settings.nav_timeout).to_string(),
            ))
        }
    };

    if let Some(code) = status.filter(|s| *s >= 400) {
        let mut attempt = ExtractionAttempt::failed(
            engine_id,
            AttemptOutcome::NavigationError,
            format!("HTTP {code}"),
        );
        attempt.status = Some(code);
        return Ok(attempt);
    }

    dismiss_consent(page.as_mut(), engine_id).await;

    if settings.scroll {
        if let Err(e) = page.scroll().await {
            tracing::debug!(engine = engine_id, error = %e, "scroll failed");
        }
    }
    page.wait(settings.settle).await;

    let raw_value = page.evaluate(LOCATE_SCRIPT).await?;
    let raw: RawContainers = serde_json::from_value(raw_value)
        .map_err(|e| EngineError::Script(format!("unexpected locator result: {e}")))?;
    let located = locate(raw);

    let mut attempt = ExtractionAttempt {
        engine: engine_id.to_string(),
        status,
        page_length: None,
        outcome: AttemptOutcome::NoData,
        count: None,
        reason: String::new(),
    };

    if located.is_empty() {
        attempt.page_length = located.page_length;
        attempt.reason = "no SIGI_STATE / __NEXT_DATA__".to_string();
        return Ok(attempt);
    }

    match extract_count(&located, target) {
        Some(extracted) => {
            tracing::debug!(
                engine = engine_id,
                target = %target.canonical,
                path = ?extracted.path,
                count = extracted.count,
                "count extracted"
            );
            attempt.outcome = AttemptOutcome::Success;
            attempt.count = Some(extracted.count);
            attempt.reason = "OK".to_string();
        }
        None => {
            attempt.outcome = AttemptOutcome::LookupError;
            attempt.reason = "playCount not found".to_string();
        }
    }
    Ok(attempt)
}

/// Clicks the first consent button present. Best-effort: nothing here fails
/// the attempt.
async fn dismiss_consent(page: &mut dyn EnginePage, engine_id: &str) {
    for pattern in CONSENT_BUTTONS {
        if !page.query_selector(pattern).await.unwrap_or(false) {
            continue;
        }
        match page.click(pattern).await {
            Ok(()) => tracing::debug!(engine = engine_id, %pattern, "dismissed consent overlay"),
            Err(e) => {
                tracing::debug!(engine = engine_id, %pattern, error = %e, "consent click failed");
            }
        }
        break;
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during extraction".to_string()
    }
}
