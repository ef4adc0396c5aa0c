//! Count extraction from located page data.
//!
//! Tries strategies in priority order and returns the first hit:
//! 1. item-keyed lookup (`ItemModule[<id>].stats.playCount`)
//! 2. deep search for any key spelled like a play count

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::locator::LocatedData;
use crate::normalize::normalize_count;
use crate::target::Target;

/// Key of the item-keyed mapping in the initial-state blob.
pub const ITEM_MODULE_KEY: &str = "ItemModule";

static PLAY_COUNT_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^play_?count(v2)?$").expect("valid regex"));

/// Which strategy produced a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    ItemModule,
    DeepSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extracted {
    pub count: u64,
    pub path: ExtractionPath,
}

/// Extracts a count from `data` for `target`. `None` is a normal outcome.
#[must_use]
pub fn extract_count(data: &LocatedData, target: &Target) -> Option<Extracted> {
    let id = target.numeric_id();

    if let Some(count) = data.structures().find_map(|json| item_module_count(json, id)) {
        return Some(Extracted {
            count,
            path: ExtractionPath::ItemModule,
        });
    }

    data.structures()
        .find_map(deep_search_count)
        .map(|count| Extracted {
            count,
            path: ExtractionPath::DeepSearch,
        })
}

/// Reads `stats.playCount` from the `ItemModule` entry keyed by `id`, or from
/// the first entry when `id` is absent or not a key.
#[must_use]
pub fn item_module_count(json: &Value, id: Option<&str>) -> Option<u64> {
    let items = json.get(ITEM_MODULE_KEY)?.as_object()?;
    let entry = id
        .and_then(|id| items.get(id))
        .or_else(|| items.values().next())?;
    normalize_count(entry.get("stats")?.get("playCount")?)
}

/// Scans the whole structure for a play-count key whose value normalizes.
#[must_use]
pub fn deep_search_count(json: &Value) -> Option<u64> {
    find_field(json, |key, value| {
        PLAY_COUNT_KEY_RE.is_match(key) && normalize_count(value).is_some()
    })
    .and_then(|(_, value)| normalize_count(value))
}

/// Depth-first visit of every object entry under `root`, descending into
/// arrays and objects. Returns the first `(key, value)` accepted by `pred`.
///
/// Sibling order follows the parser's map order and an explicit stack, so
/// callers must not rely on which match wins when several exist.
pub fn find_field<'a, F>(root: &'a Value, mut pred: F) -> Option<(&'a str, &'a Value)>
where
    F: FnMut(&str, &Value) -> bool,
{
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        match current {
            Value::Object(map) => {
                for (key, value) in map {
                    if pred(key, value) {
                        return Some((key.as_str(), value));
                    }
                    if value.is_object() || value.is_array() {
                        stack.push(value);
                    }
                }
            }
            Value::Array(items) => stack.extend(items.iter()),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target(url: &str) -> Target {
        Target::from_raw(url)
    }

    fn located(initial: Option<Value>, framework: Option<Value>) -> LocatedData {
        LocatedData {
            initial_state: initial,
            framework_data: framework,
            page_length: None,
        }
    }

    // -----------------------------------------------------------------------
    // item-keyed lookup
    // -----------------------------------------------------------------------

    #[test]
    fn item_module_uses_matching_id() {
        let json = json!({
            "ItemModule": {
                "111": { "stats": { "playCount": 5 } },
                "222": { "stats": { "playCount": 9_000 } }
            }
        });
        assert_eq!(item_module_count(&json, Some("222")), Some(9_000));
    }

    #[test]
    fn item_module_falls_back_to_first_entry() {
        let json = json!({
            "ItemModule": {
                "111": { "stats": { "playCount": "1.5K" } }
            }
        });
        assert_eq!(item_module_count(&json, Some("999")), Some(1_500));
        assert_eq!(item_module_count(&json, None), Some(1_500));
    }

    #[test]
    fn item_module_missing_stats_is_absent() {
        let json = json!({ "ItemModule": { "111": { "desc": "hi" } } });
        assert_eq!(item_module_count(&json, Some("111")), None);
    }

    #[test]
    fn extract_prefers_item_module() {
        let data = located(
            Some(json!({
                "ItemModule": { "42": { "stats": { "playCount": 100 } } },
                "elsewhere": { "playCount": 7 }
            })),
            None,
        );
        let got = extract_count(&data, &target("https://www.tiktok.com/@a/video/42")).unwrap();
        assert_eq!(got.count, 100);
        assert_eq!(got.path, ExtractionPath::ItemModule);
    }

    // -----------------------------------------------------------------------
    // deep search
    // -----------------------------------------------------------------------

    #[test]
    fn deep_search_finds_nested_framework_count() {
        let data = located(
            None,
            Some(json!({
                "props": { "pageProps": { "itemInfo": { "itemStruct": {
                    "stats": { "playCount": 31_337 }
                } } } }
            })),
        );
        let got = extract_count(&data, &target("https://www.tiktok.com/@a/video/1")).unwrap();
        assert_eq!(got.count, 31_337);
        assert_eq!(got.path, ExtractionPath::DeepSearch);
    }

    #[test]
    fn deep_search_accepts_every_spelling() {
        for key in ["playCount", "play_count", "PLAYCOUNT", "playCountV2", "play_countv2"] {
            let json = json!({ "a": [ { "b": [ [ { key: "2M" } ] ] } ] });
            assert_eq!(deep_search_count(&json), Some(2_000_000), "key {key}");
        }
    }

    #[test]
    fn deep_search_rejects_near_miss_keys() {
        let json = json!({ "playCounts": 1, "displayCount": 2, "play-count": 3, "playCountV3": 4 });
        assert_eq!(deep_search_count(&json), None);
    }

    #[test]
    fn deep_search_skips_unnormalizable_values() {
        let json = json!({
            "outer": { "playCount": "n/a" },
            "inner": [ { "stats": { "play_count": "1,024" } } ]
        });
        assert_eq!(deep_search_count(&json), Some(1_024));
    }

    #[test]
    fn nothing_found_is_absent() {
        let data = located(Some(json!({ "ItemModule": {} })), Some(json!([1, 2, 3])));
        assert_eq!(extract_count(&data, &target("https://x/1")), None);
    }

    #[test]
    fn find_field_visits_array_elements_at_root() {
        let json = json!([ { "x": 1 }, { "y": 2 } ]);
        let found = find_field(&json, |k, _| k == "y").unwrap();
        assert_eq!(found, ("y", &json!(2)));
    }
}
