use std::str::FromStr;

/// Rendering engine identifiers, in the spelling used by config and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Chromium with automation-detection countermeasures.
    ChromiumStealth,
    Chromium,
    /// Chromium in the legacy headless mode.
    ChromiumLegacy,
}

impl EngineKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::ChromiumStealth => "chromium-stealth",
            EngineKind::Chromium => "chromium",
            EngineKind::ChromiumLegacy => "chromium-legacy",
        }
    }

    /// Default priority order: stealth first, then the two fallbacks.
    #[must_use]
    pub fn default_chain() -> Vec<EngineKind> {
        vec![
            EngineKind::ChromiumStealth,
            EngineKind::Chromium,
            EngineKind::ChromiumLegacy,
        ]
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium-stealth" => Ok(EngineKind::ChromiumStealth),
            "chromium" => Ok(EngineKind::Chromium),
            "chromium-legacy" => Ok(EngineKind::ChromiumLegacy),
            other => Err(format!("unknown engine \"{other}\"")),
        }
    }
}

/// Titles of the three sheets the run touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
    pub config: String,
    pub views: String,
    pub debug: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub sheet_id: String,
    pub access_token: String,
    pub sheets_base_url: String,
    pub sheets: SheetNames,
    pub log_level: String,
    pub engines: Vec<EngineKind>,
    pub nav_timeout_secs: u64,
    pub settle_ms: u64,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    pub http_timeout_secs: u64,
    pub chromium_path: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("sheet_id", &self.sheet_id)
            .field("access_token", &"[redacted]")
            .field("sheets_base_url", &self.sheets_base_url)
            .field("sheets", &self.sheets)
            .field("log_level", &self.log_level)
            .field("engines", &self.engines)
            .field("nav_timeout_secs", &self.nav_timeout_secs)
            .field("settle_ms", &self.settle_ms)
            .field("delay_min_ms", &self.delay_min_ms)
            .field("delay_max_ms", &self.delay_max_ms)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("chromium_path", &self.chromium_path)
            .finish()
    }
}
