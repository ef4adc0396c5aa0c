//! Chromium engines driven over the DevTools protocol.
//!
//! All three engine kinds share this implementation and differ only in
//! launch flags, headless mode and whether the stealth script is injected.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
    SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, Headers, ResourceType, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::{FutureExt, StreamExt};
use playcount_core::EngineKind;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::{
    find_browser_executable, ButtonPattern, ContextOptions, Engine, EngineBrowser, EngineContext,
    EnginePage, LaunchOptions, NavigateOptions, WaitUntil,
};
use crate::error::EngineError;

/// Hides the most common automation fingerprints before page scripts run.
const STEALTH_SCRIPT: &str = r"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
";

const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight)";

const READY_STATE_POLL: Duration = Duration::from_millis(250);

pub struct ChromiumEngine {
    kind: EngineKind,
    profile_root: PathBuf,
}

impl ChromiumEngine {
    #[must_use]
    pub fn new(kind: EngineKind) -> Self {
        Self {
            kind,
            profile_root: std::env::temp_dir(),
        }
    }

    /// Directory under which per-launch browser profiles are created.
    #[must_use]
    pub fn with_profile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profile_root = root.into();
        self
    }

    fn stealth(&self) -> bool {
        self.kind == EngineKind::ChromiumStealth
    }

    fn browser_config(
        &self,
        options: &LaunchOptions,
        user_data_dir: &Path,
    ) -> Result<BrowserConfig, EngineError> {
        let headless = match self.kind {
            EngineKind::ChromiumLegacy => HeadlessMode::True,
            EngineKind::ChromiumStealth | EngineKind::Chromium => HeadlessMode::New,
        };

        let mut builder = BrowserConfig::builder()
            .headless_mode(headless)
            .request_timeout(options.request_timeout)
            .window_size(1366, 900)
            .user_data_dir(user_data_dir)
            .no_sandbox()
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage");

        if self.stealth() {
            builder = builder
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--disable-infobars");
        }

        let executable = options
            .executable
            .clone()
            .or_else(|| find_browser_executable(None));
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(EngineError::Launch)
    }
}

#[async_trait]
impl Engine for ChromiumEngine {
    fn id(&self) -> &str {
        self.kind.as_str()
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn EngineBrowser>, EngineError> {
        // Removed on drop, so every early return below cleans up after itself.
        let profile = ProfileDir::create(&self.profile_root, self.kind)?;

        let config = self.browser_config(options, profile.path())?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        let engine = self.kind.as_str();
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(engine, error = %e, "browser handler event error");
                }
            }
        });

        tracing::debug!(engine, "browser launched");
        Ok(Box::new(ChromiumBrowser {
            browser: Arc::new(Mutex::new(browser)),
            handler: handler_task,
            profile,
            stealth: self.stealth(),
        }))
    }
}

/// A throwaway browser profile directory, deleted when dropped.
struct ProfileDir(PathBuf);

impl ProfileDir {
    fn create(root: &Path, kind: EngineKind) -> Result<Self, EngineError> {
        let path = root.join(format!(
            "playcount_{}_{}_{}",
            kind.as_str(),
            std::process::id(),
            rand::random::<u32>()
        ));
        std::fs::create_dir_all(&path)
            .map_err(|e| EngineError::Launch(format!("user data dir: {e}")))?;
        Ok(Self(path))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.0) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.0.display(),
                error = %e,
                "failed to remove browser profile directory"
            ),
        }
    }
}

struct ChromiumBrowser {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
    /// Dropped after the browser process has exited in `close`.
    profile: ProfileDir,
    stealth: bool,
}

#[async_trait]
impl EngineBrowser for ChromiumBrowser {
    async fn new_context(
        &mut self,
        options: &ContextOptions,
    ) -> Result<Box<dyn EngineContext>, EngineError> {
        let id = self
            .browser
            .lock()
            .await
            .create_browser_context(CreateBrowserContextParams::default())
            .await?;
        Ok(Box::new(ChromiumContext {
            browser: Arc::clone(&self.browser),
            id,
            options: options.clone(),
            stealth: self.stealth,
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        let result = {
            let mut browser = self.browser.lock().await;
            let closed = browser.close().await.map(|_| ());
            if let Err(e) = browser.wait().await {
                tracing::debug!(error = %e, "waiting for browser exit failed");
            }
            closed
        };
        self.handler.abort();
        drop(self.profile);
        result.map_err(EngineError::from)
    }
}

struct ChromiumContext {
    browser: Arc<Mutex<Browser>>,
    id: BrowserContextId,
    options: ContextOptions,
    stealth: bool,
}

#[async_trait]
impl EngineContext for ChromiumContext {
    async fn new_page(&mut self) -> Result<Box<dyn EnginePage>, EngineError> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.id.clone())
            .build()
            .map_err(EngineError::Params)?;
        let page = self.browser.lock().await.new_page(params).await?;

        if self.stealth {
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
                .await?;
        }
        apply_identity(&page, &self.options).await?;

        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.browser
            .lock()
            .await
            .dispose_browser_context(self.id.clone())
            .await?;
        Ok(())
    }
}

/// Applies user agent, language, time zone, headers and viewport to `page`.
async fn apply_identity(page: &Page, options: &ContextOptions) -> Result<(), EngineError> {
    page.execute(
        SetUserAgentOverrideParams::builder()
            .user_agent(options.user_agent.clone())
            .accept_language(options.accept_language.clone())
            .build()
            .map_err(EngineError::Params)?,
    )
    .await?;

    page.execute(SetLocaleOverrideParams {
        locale: Some(options.locale.clone()),
    })
    .await?;

    page.execute(SetTimezoneOverrideParams::new(options.timezone_id.clone()))
        .await?;

    page.execute(SetExtraHttpHeadersParams::new(Headers::new(
        serde_json::json!({ "Accept-Language": options.accept_language }),
    )))
    .await?;

    page.execute(
        SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(options.viewport.width))
            .height(i64::from(options.viewport.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(EngineError::Params)?,
    )
    .await?;

    Ok(())
}

struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn eval_bool(&self, script: String) -> Result<bool, EngineError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Script(e.to_string()))?;
        Ok(result.into_value::<bool>().unwrap_or(false))
    }

    /// Polls until the document reports `complete`. Unbounded; callers race
    /// it against their own deadline.
    async fn wait_for_complete(&self) {
        loop {
            if let Ok(state) = self.page.evaluate("document.readyState").await {
                if state.into_value::<String>().is_ok_and(|s| s == "complete") {
                    return;
                }
            }
            tokio::time::sleep(READY_STATE_POLL).await;
        }
    }
}

/// Maps a navigation step's result to "still loading". A lapsed DevTools
/// request deadline is not a failure while the attempt's own deadline holds.
fn still_loading(step: Result<(), CdpError>) -> Result<bool, EngineError> {
    match step {
        Ok(()) => Ok(false),
        Err(CdpError::Timeout) => Ok(true),
        Err(e) => Err(EngineError::Navigation(e.to_string())),
    }
}

/// A document response seen during navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DocumentResponse {
    frame: Option<String>,
    status: i64,
}

/// HTTP status of the top-level document. Iframe documents never count.
/// With a known main frame the last matching response wins (the one that
/// rendered after any redirects); without one the first document response
/// is taken, since the top-level request always precedes its subframes.
fn main_document_status(responses: &[DocumentResponse], main_frame: Option<&str>) -> Option<u16> {
    let response = match main_frame {
        Some(main) => responses
            .iter()
            .rev()
            .find(|r| r.frame.as_deref() == Some(main)),
        None => responses.first(),
    }?;
    u16::try_from(response.status).ok()
}

/// Script testing for (and optionally clicking) a button by visible text.
fn text_button_script(label: &str, click: bool) -> String {
    // serde_json string encoding doubles as a JS string literal.
    let label = serde_json::to_string(label).unwrap_or_else(|_| "\"\"".to_string());
    let action = if click { "b.click(); return true;" } else { "return true;" };
    format!(
        "(() => {{ for (const b of document.querySelectorAll('button')) {{ \
         if ((b.innerText || '').trim().includes({label})) {{ {action} }} }} return false; }})()"
    )
}

#[async_trait]
impl EnginePage for ChromiumPage {
    async fn goto(
        &mut self,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<Option<u16>, EngineError> {
        let mut responses = self.page.event_listener::<EventResponseReceived>().await?;

        let navigation = async {
            let mut loading = still_loading(self.page.goto(url).await.map(|_| ()))?;
            if !loading && options.wait_until == WaitUntil::NetworkIdle {
                loading = still_loading(self.page.wait_for_navigation().await.map(|_| ()))?;
            }
            if loading {
                tracing::debug!(url, "navigation request timed out, polling readyState");
                self.wait_for_complete().await;
            }
            Ok::<(), EngineError>(())
        };
        tokio::time::timeout(options.timeout, navigation)
            .await
            .map_err(|_| EngineError::Timeout(options.timeout))??;

        let main_frame = self.page.mainframe().await?;
        let mut documents = Vec::new();
        while let Some(Some(event)) = responses.next().now_or_never() {
            if event.r#type == ResourceType::Document {
                documents.push(DocumentResponse {
                    frame: event.frame_id.as_ref().map(|f| f.inner().clone()),
                    status: event.response.status,
                });
            }
        }
        Ok(main_document_status(
            &documents,
            main_frame.as_ref().map(|f| f.inner().as_str()),
        ))
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, EngineError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn query_selector(&mut self, pattern: &ButtonPattern) -> Result<bool, EngineError> {
        match pattern {
            ButtonPattern::Css(sel) => Ok(self.page.find_element(*sel).await.is_ok()),
            ButtonPattern::Text(label) => self.eval_bool(text_button_script(label, false)).await,
        }
    }

    async fn click(&mut self, pattern: &ButtonPattern) -> Result<(), EngineError> {
        match pattern {
            ButtonPattern::Css(sel) => {
                self.page.find_element(*sel).await?.click().await?;
            }
            ButtonPattern::Text(label) => {
                if !self.eval_bool(text_button_script(label, true)).await? {
                    return Err(EngineError::Script(format!("no button labelled {label}")));
                }
            }
        }
        Ok(())
    }

    async fn wait(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn scroll(&mut self) -> Result<(), EngineError> {
        self.page
            .evaluate(SCROLL_SCRIPT)
            .await
            .map_err(|e| EngineError::Script(e.to_string()))?;
        Ok(())
    }
}
