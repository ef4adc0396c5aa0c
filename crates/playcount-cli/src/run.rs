//! One measurement run: read targets, measure them, then commit.
//!
//! Nothing derived from this run's measurements is written until every target
//! has been attempted; the header, upsert and debug writes all happen at the
//! end, in that order.

use anyhow::Context;
use chrono::{DateTime, Utc};
use playcount_core::{taipei_date, SheetNames, TargetResult};
use playcount_scraper::{EngineChain, Target};
use playcount_sheets::{
    a1, apply_upsert, ensure_views_header, failure_rows, plan_upsert, read_header_plan,
    read_targets, record_failures, Rows, TabularStore, UpsertPlan,
};
use serde_json::Value;

pub(crate) struct RunOptions {
    pub sheets: SheetNames,
    /// Measure only; skip every store write.
    pub dry_run: bool,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub date: String,
    pub succeeded: usize,
    pub failed: usize,
    pub updated: usize,
    pub appended: usize,
    pub debug_records: usize,
}

/// Runs the whole pipeline. Returns `None` when no targets are configured.
///
/// # Errors
///
/// Any store failure aborts the run.
pub(crate) async fn run(
    store: &dyn TabularStore,
    chain: &EngineChain,
    options: &RunOptions,
    started: DateTime<Utc>,
) -> anyhow::Result<Option<RunSummary>> {
    let sheets = &options.sheets;

    if !options.dry_run {
        for title in [&sheets.config, &sheets.views, &sheets.debug] {
            store
                .ensure_sheet(title)
                .await
                .with_context(|| format!("failed to ensure sheet '{title}'"))?;
        }
    }

    let raw_targets = read_targets(store, &sheets.config)
        .await
        .with_context(|| format!("failed to read targets from '{}'", sheets.config))?;
    if raw_targets.is_empty() {
        println!("no targets configured in '{}'", sheets.config);
        return Ok(None);
    }

    let date = taipei_date(started);
    let targets: Vec<Target> = raw_targets.iter().map(|raw| Target::from_raw(raw)).collect();
    tracing::info!(targets = targets.len(), date = %date, "measuring targets");

    let reports = chain
        .measure_each(&targets, |report| print_outcome(&report.result))
        .await;
    let results: Vec<TargetResult> = reports.into_iter().map(|r| r.result).collect();

    let today_index = if options.dry_run {
        read_header_plan(store, &sheets.views, &date).await?.today_index
    } else {
        ensure_views_header(store, &sheets.views, &date)
            .await
            .context("failed to prepare header row")?
    };

    let existing = store
        .read_range(&a1::range(&sheets.views, "A2:A"))
        .await
        .context("failed to read existing rows")?;
    let plan = plan_upsert(&sheets.views, &results, today_index, &existing);
    let updated = plan.updates.len();
    let appended = plan.appends.len();

    let debug_records = if options.dry_run {
        let rows = failure_rows(&results, Utc::now());
        print_dry_run(&plan, &rows);
        rows.len()
    } else {
        apply_upsert(store, &sheets.views, plan)
            .await
            .context("failed to write results")?;
        record_failures(store, &sheets.debug, &results, Utc::now())
            .await
            .context("failed to append debug records")?
    };

    let failed = results.iter().filter(|r| r.is_failure()).count();
    let summary = RunSummary {
        date,
        succeeded: results.len() - failed,
        failed,
        updated,
        appended,
        debug_records,
    };
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        updated = summary.updated,
        appended = summary.appended,
        debug_records = summary.debug_records,
        "run finished"
    );
    println!("run complete: {}", summary.date);
    Ok(Some(summary))
}

fn print_dry_run(plan: &UpsertPlan, debug_rows: &Rows) {
    for write in &plan.updates {
        println!(
            "dry-run: would write {} = {}",
            write.range,
            Value::from(write.values.clone())
        );
    }
    for row in &plan.appends {
        println!("dry-run: would append {}", Value::from(row.clone()));
    }
    for row in debug_rows {
        println!("dry-run: would record debug {}", Value::from(row.clone()));
    }
}

fn print_outcome(result: &TargetResult) {
    match result.value.count() {
        Some(count) => println!("✅ {} -> {count}", result.target),
        None => println!("❌ {} -> {}", result.target, result.reason),
    }
}
