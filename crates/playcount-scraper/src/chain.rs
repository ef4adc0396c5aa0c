//! Ordered engine fallback.
//!
//! Engines are tried one at a time in priority order; the first success
//! wins. Attempts are values, so the chain is a plain fold over the engine
//! list with a paced pause between attempts.

use std::sync::Arc;

use playcount_core::{CellValue, TargetResult, ALL_ENGINES};

use crate::engine::Engine;
use crate::pacing::Pacer;
use crate::page::{run_attempt, AttemptSettings, ExtractionAttempt};
use crate::target::Target;

/// Reason reported when there was no attempt to take a reason from.
const ALL_FAILED_REASON: &str = "all engines failed";

/// Final result for one target plus every attempt that led to it.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub result: TargetResult,
    pub attempts: Vec<ExtractionAttempt>,
}

pub struct EngineChain {
    engines: Vec<Arc<dyn Engine>>,
    settings: AttemptSettings,
    pacer: Pacer,
}

impl EngineChain {
    #[must_use]
    pub fn new(engines: Vec<Arc<dyn Engine>>, settings: AttemptSettings, pacer: Pacer) -> Self {
        Self {
            engines,
            settings,
            pacer,
        }
    }

    /// Engine identifiers in priority order.
    pub fn engine_ids(&self) -> impl Iterator<Item = &str> {
        self.engines.iter().map(|e| e.id())
    }

    /// Measures one target, falling back through the engine list.
    pub async fn measure(&self, target: &Target) -> TargetReport {
        let mut attempts: Vec<ExtractionAttempt> = Vec::with_capacity(self.engines.len());

        for (index, engine) in self.engines.iter().enumerate() {
            if index > 0 {
                self.pacer.pause().await;
            }

            let attempt = run_attempt(engine.as_ref(), target, &self.settings).await;
            tracing::debug!(
                target = %target.canonical,
                engine = %attempt.engine,
                outcome = %attempt.outcome,
                status = ?attempt.status,
                reason = %attempt.reason,
                "engine attempt finished"
            );

            if let Some(count) = attempt.count.filter(|_| attempt.is_success()) {
                let result = TargetResult {
                    target: target.canonical.clone(),
                    value: CellValue::Count(count),
                    engine: attempt.engine.clone(),
                    reason: attempt.reason.clone(),
                    status: attempt.status,
                    page_length: None,
                };
                attempts.push(attempt);
                return TargetReport { result, attempts };
            }

            if index + 1 < self.engines.len() {
                tracing::info!(
                    target = %target.canonical,
                    engine = %attempt.engine,
                    outcome = %attempt.outcome,
                    "engine failed, falling back"
                );
            }
            attempts.push(attempt);
        }

        let result = exhausted(target, &attempts);
        TargetReport { result, attempts }
    }

    /// Measures every target in order with a paced pause between targets.
    pub async fn measure_all(&self, targets: &[Target]) -> Vec<TargetReport> {
        self.measure_each(targets, |_| {}).await
    }

    /// Like [`measure_all`](Self::measure_all), handing each report to
    /// `on_report` as soon as its target is finished.
    pub async fn measure_each<F>(&self, targets: &[Target], mut on_report: F) -> Vec<TargetReport>
    where
        F: FnMut(&TargetReport) + Send,
    {
        let mut reports = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            if index > 0 {
                self.pacer.pause().await;
            }
            let report = self.measure(target).await;
            on_report(&report);
            reports.push(report);
        }
        reports
    }
}

/// Aggregate failure once every engine has been tried.
fn exhausted(target: &Target, attempts: &[ExtractionAttempt]) -> TargetResult {
    let reason = attempts
        .last()
        .map(|a| a.reason.clone())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| ALL_FAILED_REASON.to_string());

    TargetResult {
        target: target.canonical.clone(),
        value: CellValue::Error,
        engine: ALL_ENGINES.to_string(),
        reason,
        status: attempts.iter().rev().find_map(|a| a.status),
        page_length: attempts.iter().rev().find_map(|a| a.page_length),
    }
}
