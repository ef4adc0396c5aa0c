//! Rendering engine abstraction.
//!
//! An engine launches a browser, the browser hands out isolated contexts,
//! and each context opens pages. Every layer is closed explicitly by its
//! owner; see [`crate::page::run_attempt`] for the acquire/release order.

mod chromium;
mod executable;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use playcount_core::EngineKind;
use serde_json::Value;

use crate::error::EngineError;

pub use chromium::ChromiumEngine;
pub use executable::find_browser_executable;

/// Desktop Chrome user agent presented by every context.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Consent-overlay buttons, tried in order; the first one present is clicked.
pub const CONSENT_BUTTONS: &[ButtonPattern] = &[
    ButtonPattern::Text("Accept all"),
    ButtonPattern::Text("Allow all"),
    ButtonPattern::Text("I agree"),
    ButtonPattern::Text("同意する"),
    ButtonPattern::Text("同意"),
    ButtonPattern::Css("[data-e2e=\"cookie-banner-accept-button\"]"),
];

/// Browser-level launch parameters.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Explicit browser binary; `None` lets the engine locate one.
    pub executable: Option<PathBuf>,
    /// Deadline for a single DevTools request, navigation included. Should
    /// not be shorter than the navigation timeout.
    pub request_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            executable: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Per-context identity: everything a fresh browsing session presents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    pub user_agent: String,
    pub locale: String,
    pub accept_language: String,
    pub timezone_id: String,
    pub viewport: Viewport,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            user_agent: DESKTOP_USER_AGENT.to_string(),
            locale: "en-US".to_string(),
            accept_language: "en-US,en;q=0.9,ja;q=0.8".to_string(),
            timezone_id: "Asia/Taipei".to_string(),
            viewport: Viewport {
                width: 1366,
                height: 900,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    Load,
    NetworkIdle,
}

#[derive(Debug, Clone, Copy)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
}

/// How a clickable element is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPattern {
    Css(&'static str),
    /// A `<button>` whose visible text contains the label.
    Text(&'static str),
}

impl std::fmt::Display for ButtonPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ButtonPattern::Css(sel) => write!(f, "css={sel}"),
            ButtonPattern::Text(label) => write!(f, "text={label}"),
        }
    }
}

#[async_trait]
pub trait Engine: Send + Sync {
    /// Identifier reported in results and debug rows.
    fn id(&self) -> &str;

    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn EngineBrowser>, EngineError>;
}

#[async_trait]
pub trait EngineBrowser: Send {
    async fn new_context(
        &mut self,
        options: &ContextOptions,
    ) -> Result<Box<dyn EngineContext>, EngineError>;

    async fn close(self: Box<Self>) -> Result<(), EngineError>;
}

#[async_trait]
pub trait EngineContext: Send {
    async fn new_page(&mut self) -> Result<Box<dyn EnginePage>, EngineError>;

    /// Tears down the context and every page it opened.
    async fn close(self: Box<Self>) -> Result<(), EngineError>;
}

#[async_trait]
pub trait EnginePage: Send {
    /// Navigates and returns the top-level document's HTTP status, if seen.
    async fn goto(&mut self, url: &str, options: &NavigateOptions)
        -> Result<Option<u16>, EngineError>;

    async fn evaluate(&mut self, script: &str) -> Result<Value, EngineError>;

    async fn query_selector(&mut self, pattern: &ButtonPattern) -> Result<bool, EngineError>;

    async fn click(&mut self, pattern: &ButtonPattern) -> Result<(), EngineError>;

    async fn wait(&mut self, duration: Duration);

    async fn scroll(&mut self) -> Result<(), EngineError>;
}

/// Builds the production engines for `kinds`, preserving priority order.
#[must_use]
pub fn build_engines(kinds: &[EngineKind]) -> Vec<Arc<dyn Engine>> {
    kinds
        .iter()
        .map(|kind| Arc::new(ChromiumEngine::new(*kind)) as Arc<dyn Engine>)
        .collect()
}
