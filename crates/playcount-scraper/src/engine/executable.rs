//! Chrome/Chromium executable discovery.

use std::path::PathBuf;
use std::process::Command;

const LINUX_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/usr/local/bin/chromium",
    "/opt/google/chrome/chrome",
];

const MACOS_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/homebrew/bin/chromium",
];

const WINDOWS_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

/// Locates a browser binary: an explicit path wins, then well-known
/// install locations, then `which` on Unix. Returns `None` when nothing is
/// found so the CDP client can apply its own detection.
#[must_use]
pub fn find_browser_executable(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit.map(PathBuf::from) {
        if path.exists() {
            tracing::debug!(path = %path.display(), "using configured browser executable");
            return Some(path);
        }
        tracing::warn!(
            path = %path.display(),
            "configured browser executable does not exist; probing defaults"
        );
    }

    let candidates = if cfg!(target_os = "windows") {
        WINDOWS_PATHS
    } else if cfg!(target_os = "macos") {
        MACOS_PATHS
    } else {
        LINUX_PATHS
    };

    if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::debug!(path = %path.display(), "found browser executable");
        return Some(path);
    }

    if cfg!(target_os = "windows") {
        return None;
    }

    ["chromium", "chromium-browser", "google-chrome", "chrome"]
        .iter()
        .find_map(|cmd| {
            let output = Command::new("which").arg(cmd).output().ok()?;
            if !output.status.success() {
                return None;
            }
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            (!path.is_empty()).then(|| PathBuf::from(path))
        })
}
