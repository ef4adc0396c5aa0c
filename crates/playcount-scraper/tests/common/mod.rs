//! Scripted in-memory engine for exercising attempts and the fallback chain
//! without a browser.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use playcount_scraper::engine::{
    ButtonPattern, ContextOptions, Engine, EngineBrowser, EngineContext, EnginePage,
    LaunchOptions, NavigateOptions,
};
use playcount_scraper::{AttemptSettings, EngineError};

/// What the fake page does when driven.
#[derive(Debug, Clone)]
pub enum Behavior {
    LaunchFails,
    ContextFails,
    NavigationFails,
    /// `goto` never completes within any sane timeout.
    Hangs,
    Status(u16),
    /// `goto` returns 200 and the locator script yields this value.
    Page(Value),
    EvaluateFails,
    PanicsOnEvaluate,
    PanicsOnLaunch,
    PanicsOnContext,
}

/// Shared resource ledger across every engine in a test.
#[derive(Debug, Default)]
pub struct Ledger {
    pub launches: AtomicUsize,
    pub browsers_closed: AtomicUsize,
    pub contexts_opened: AtomicUsize,
    pub contexts_closed: AtomicUsize,
    open_contexts: AtomicUsize,
    pub max_open_contexts: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
    pub clicked: Mutex<Vec<String>>,
    pub waits: Mutex<Vec<Duration>>,
    pub launch_order: Mutex<Vec<String>>,
}

impl Ledger {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Every acquired context and browser has been released.
    pub fn all_released(&self) -> bool {
        Self::count(&self.contexts_opened) == Self::count(&self.contexts_closed)
            && Self::count(&self.launches) == Self::count(&self.browsers_closed)
    }
}

pub struct FakeEngine {
    id: String,
    behavior: Behavior,
    /// Consent buttons present on the page.
    consent: Vec<ButtonPattern>,
    failing_clicks: bool,
    ledger: Arc<Ledger>,
}

impl FakeEngine {
    pub fn new(id: &str, behavior: Behavior, ledger: &Arc<Ledger>) -> Self {
        Self {
            id: id.to_string(),
            behavior,
            consent: Vec::new(),
            failing_clicks: false,
            ledger: Arc::clone(ledger),
        }
    }

    pub fn with_consent(mut self, buttons: Vec<ButtonPattern>) -> Self {
        self.consent = buttons;
        self
    }

    pub fn with_failing_clicks(mut self) -> Self {
        self.failing_clicks = true;
        self
    }

    pub fn shared(self) -> Arc<dyn Engine> {
        Arc::new(self)
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn id(&self) -> &str {
        &self.id
    }

    async fn launch(&self, _options: &LaunchOptions) -> Result<Box<dyn EngineBrowser>, EngineError> {
        self.ledger.launch_order.lock().unwrap().push(self.id.clone());
        if matches!(self.behavior, Behavior::LaunchFails) {
            return Err(EngineError::Launch("no browser binary".to_string()));
        }
        if matches!(self.behavior, Behavior::PanicsOnLaunch) {
            panic!("launcher crashed");
        }
        self.ledger.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeBrowser {
            behavior: self.behavior.clone(),
            consent: self.consent.clone(),
            failing_clicks: self.failing_clicks,
            ledger: Arc::clone(&self.ledger),
        }))
    }
}

struct FakeBrowser {
    behavior: Behavior,
    consent: Vec<ButtonPattern>,
    failing_clicks: bool,
    ledger: Arc<Ledger>,
}

#[async_trait]
impl EngineBrowser for FakeBrowser {
    async fn new_context(
        &mut self,
        _options: &ContextOptions,
    ) -> Result<Box<dyn EngineContext>, EngineError> {
        if matches!(self.behavior, Behavior::ContextFails) {
            return Err(EngineError::Params("context refused".to_string()));
        }
        if matches!(self.behavior, Behavior::PanicsOnContext) {
            panic!("context crashed");
        }
        self.ledger.contexts_opened.fetch_add(1, Ordering::SeqCst);
        let open = self.ledger.open_contexts.fetch_add(1, Ordering::SeqCst) + 1;
        self.ledger.max_open_contexts.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(FakeContext {
            behavior: self.behavior.clone(),
            consent: self.consent.clone(),
            failing_clicks: self.failing_clicks,
            ledger: Arc::clone(&self.ledger),
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.ledger.browsers_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeContext {
    behavior: Behavior,
    consent: Vec<ButtonPattern>,
    failing_clicks: bool,
    ledger: Arc<Ledger>,
}

#[async_trait]
impl EngineContext for FakeContext {
    async fn new_page(&mut self) -> Result<Box<dyn EnginePage>, EngineError> {
        Ok(Box::new(FakePage {
            behavior: self.behavior.clone(),
            consent: self.consent.clone(),
            failing_clicks: self.failing_clicks,
            ledger: Arc::clone(&self.ledger),
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.ledger.open_contexts.fetch_sub(1, Ordering::SeqCst);
        self.ledger.contexts_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakePage {
    behavior: Behavior,
    consent: Vec<ButtonPattern>,
    failing_clicks: bool,
    ledger: Arc<Ledger>,
}

#[async_trait]
impl EnginePage for FakePage {
    async fn goto(
        &mut self,
        url: &str,
        _options: &NavigateOptions,
    ) -> Result<Option<u16>, EngineError> {
        self.ledger.visited.lock().unwrap().push(url.to_string());
        match &self.behavior {
            Behavior::NavigationFails => {
                Err(EngineError::Navigation("net::ERR_CONNECTION_RESET".to_string()))
            }
            Behavior::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Some(200))
            }
            Behavior::Status(code) => Ok(Some(*code)),
            _ => Ok(Some(200)),
        }
    }

    async fn evaluate(&mut self, _script: &str) -> Result<Value, EngineError> {
        match &self.behavior {
            Behavior::Page(value) => Ok(value.clone()),
            Behavior::EvaluateFails => Err(EngineError::Script("target closed".to_string())),
            Behavior::PanicsOnEvaluate => panic!("renderer crashed"),
            _ => Ok(Value::Null),
        }
    }

    async fn query_selector(&mut self, pattern: &ButtonPattern) -> Result<bool, EngineError> {
        Ok(self.consent.contains(pattern))
    }

    async fn click(&mut self, pattern: &ButtonPattern) -> Result<(), EngineError> {
        self.ledger.clicked.lock().unwrap().push(pattern.to_string());
        if self.failing_clicks {
            return Err(EngineError::Script("element detached".to_string()));
        }
        Ok(())
    }

    async fn wait(&mut self, duration: Duration) {
        self.ledger.waits.lock().unwrap().push(duration);
    }

    async fn scroll(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Locator-script result carrying an initial-state blob.
pub fn initial_state_page(blob: &Value) -> Value {
    json!({
        "initialState": blob.to_string(),
        "frameworkData": null,
        "pageLength": 10_000
    })
}

/// Locator-script result for a page with neither container.
pub fn empty_page(page_length: usize) -> Value {
    json!({
        "initialState": null,
        "frameworkData": null,
        "pageLength": page_length
    })
}

/// `ItemModule` blob reporting `count` for item `id`.
pub fn item_module(id: &str, count: u64) -> Value {
    json!({ "ItemModule": { id: { "stats": { "playCount": count } } } })
}

pub fn fast_settings() -> AttemptSettings {
    AttemptSettings {
        nav_timeout: Duration::from_millis(50),
        settle: Duration::from_millis(1_500),
        ..AttemptSettings::default()
    }
}
