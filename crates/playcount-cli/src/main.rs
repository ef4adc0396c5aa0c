mod run;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use playcount_core::{AppConfig, EngineKind};
use playcount_scraper::engine::find_browser_executable;
use playcount_scraper::{build_engines, AttemptSettings, EngineChain, LaunchOptions, Pacer};
use playcount_sheets::SheetsClient;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "playcount")]
#[command(about = "Record today's play counts for the configured videos")]
struct Cli {
    /// Engine priority list, e.g. `chromium-stealth,chromium`. Overrides
    /// `PLAYCOUNT_ENGINES` for this run.
    #[arg(long)]
    engines: Option<String>,

    /// Measure every target but write nothing to the spreadsheet.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = playcount_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Err(e) = execute(&cli, &config).await {
        tracing::error!("run failed: {e:#}");
        return Err(e);
    }
    Ok(())
}

async fn execute(cli: &Cli, config: &AppConfig) -> anyhow::Result<()> {
    let kinds = engine_kinds(cli, config)?;
    let chain = build_chain(config, &kinds);

    let store = SheetsClient::with_base_url(
        &config.sheet_id,
        &config.access_token,
        config.http_timeout_secs,
        &config.sheets_base_url,
    )
    .context("failed to build Sheets client")?;

    tracing::info!(
        engines = ?kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        dry_run = cli.dry_run,
        "starting run"
    );

    let options = run::RunOptions {
        sheets: config.sheets.clone(),
        dry_run: cli.dry_run,
    };
    run::run(&store, &chain, &options, chrono::Utc::now()).await?;
    Ok(())
}

fn engine_kinds(cli: &Cli, config: &AppConfig) -> anyhow::Result<Vec<EngineKind>> {
    match cli.engines.as_deref() {
        Some(raw) => playcount_core::parse_engine_list(raw)
            .map_err(|reason| anyhow::anyhow!("invalid --engines: {reason}")),
        None => Ok(config.engines.clone()),
    }
}

fn build_chain(config: &AppConfig, kinds: &[EngineKind]) -> EngineChain {
    let pacer = Pacer::new(config.delay_min_ms, config.delay_max_ms);
    EngineChain::new(build_engines(kinds), attempt_settings(config), pacer)
}

fn attempt_settings(config: &AppConfig) -> AttemptSettings {
    let nav_timeout = Duration::from_secs(config.nav_timeout_secs);
    AttemptSettings {
        nav_timeout,
        settle: Duration::from_millis(config.settle_ms),
        launch: LaunchOptions {
            executable: find_browser_executable(config.chromium_path.as_deref()),
            request_timeout: nav_timeout,
        },
        ..AttemptSettings::default()
    }
}
