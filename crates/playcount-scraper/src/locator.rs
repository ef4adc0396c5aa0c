//! Locates the embedded data blobs on a rendered page.
//!
//! Two containers are recognised: the inline initial-state blob
//! (`#SIGI_STATE`) and the framework payload (`#__NEXT_DATA__`). The page
//! script only collects their raw text; parsing happens here so it can be
//! tested without a browser.

use serde::Deserialize;
use serde_json::Value;

/// Element id of the inline initial-state blob.
pub const INITIAL_STATE_ID: &str = "SIGI_STATE";
/// Element id of the framework-level data payload.
pub const FRAMEWORK_DATA_ID: &str = "__NEXT_DATA__";

/// Evaluated in the page; returns [`RawContainers`] as JSON.
pub const LOCATE_SCRIPT: &str = r"(() => {
  const text = (id) => {
    const el = document.getElementById(id);
    return el ? el.textContent : null;
  };
  const root = document.documentElement;
  return {
    initialState: text('SIGI_STATE'),
    frameworkData: text('__NEXT_DATA__'),
    pageLength: root ? root.outerHTML.length : 0,
  };
})()";

/// Raw container text as reported by [`LOCATE_SCRIPT`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContainers {
    pub initial_state: Option<String>,
    pub framework_data: Option<String>,
    #[serde(default)]
    pub page_length: Option<usize>,
}

/// Parsed containers; either or both may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocatedData {
    pub initial_state: Option<Value>,
    pub framework_data: Option<Value>,
    /// Raw page size, only kept when neither container parsed.
    pub page_length: Option<usize>,
}

impl LocatedData {
    /// `true` when no container parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.initial_state.is_none() && self.framework_data.is_none()
    }

    /// Parsed structures in preference order (initial state first).
    pub fn structures(&self) -> impl Iterator<Item = &Value> {
        self.initial_state.iter().chain(self.framework_data.iter())
    }
}

/// Parses whichever containers are present. Unparsable text counts as absent.
#[must_use]
pub fn locate(raw: RawContainers) -> LocatedData {
    let initial_state = parse_container(INITIAL_STATE_ID, raw.initial_state.as_deref());
    let framework_data = parse_container(FRAMEWORK_DATA_ID, raw.framework_data.as_deref());
    let page_length = if initial_state.is_none() && framework_data.is_none() {
        raw.page_length
    } else {
        None
    };
    LocatedData {
        initial_state,
        framework_data,
        page_length,
    }
}

fn parse_container(id: &str, text: Option<&str>) -> Option<Value> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(container = id, error = %e, "embedded data did not parse");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(initial: Option<&str>, framework: Option<&str>) -> RawContainers {
        RawContainers {
            initial_state: initial.map(str::to_string),
            framework_data: framework.map(str::to_string),
            page_length: Some(5120),
        }
    }

    #[test]
    fn both_containers_parse() {
        let located = locate(raw(Some(r#"{"a":1}"#), Some(r#"{"b":2}"#)));
        assert_eq!(located.initial_state, Some(json!({"a": 1})));
        assert_eq!(located.framework_data, Some(json!({"b": 2})));
        assert_eq!(located.page_length, None);
        assert_eq!(located.structures().count(), 2);
    }

    #[test]
    fn one_valid_container_is_enough() {
        let located = locate(raw(Some("{not json"), Some(r#"{"props":{}}"#)));
        assert!(located.initial_state.is_none());
        assert!(!located.is_empty());
        assert_eq!(located.structures().count(), 1);
    }

    #[test]
    fn total_failure_keeps_page_length() {
        let located = locate(raw(None, Some("   ")));
        assert!(located.is_empty());
        assert_eq!(located.page_length, Some(5120));
    }

    #[test]
    fn script_result_deserializes() {
        let value = json!({
            "initialState": null,
            "frameworkData": "{\"x\":true}",
            "pageLength": 900
        });
        let raw: RawContainers = serde_json::from_value(value).unwrap();
        assert_eq!(raw.page_length, Some(900));
        let located = locate(raw);
        assert_eq!(located.framework_data, Some(json!({"x": true})));
    }
}
