//! Target URL canonicalization and content-id derivation.

/// Mobile host prefix rewritten to the canonical web host.
const MOBILE_HOST: &str = "m.tiktok.com/";
const CANONICAL_HOST: &str = "www.tiktok.com/";

/// Query parameter pinning the page language so labels are predictable.
const LOCALE_PARAM: &str = "lang=en";

/// A page being measured, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// The URL as configured.
    pub raw: String,
    /// Canonical URL used for navigation and as the store row key.
    pub canonical: String,
    /// Trailing path segment of the canonical URL; may be empty.
    pub id_hint: String,
}

impl Target {
    /// Canonicalizes `raw` and derives its id hint. Never fails; malformed
    /// input yields an empty id hint.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.trim();
        let canonical = canonicalize(raw);
        let id_hint = id_hint(&canonical).to_string();
        Self {
            raw: raw.to_string(),
            canonical,
            id_hint,
        }
    }

    /// The id hint, only when it is purely numeric (a usable item key).
    #[must_use]
    pub fn numeric_id(&self) -> Option<&str> {
        let id = self.id_hint.as_str();
        (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())).then_some(id)
    }
}

/// Rewrites the mobile host and appends the locale parameter.
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    let mut url = raw.replacen(MOBILE_HOST, CANONICAL_HOST, 1);
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(LOCALE_PARAM);
    url
}

/// Last non-empty path segment, ignoring any query string or fragment.
fn id_hint(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.split('/').rfind(|s| !s.is_empty()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_host_is_rewritten_and_locale_appended() {
        let t = Target::from_raw("https://m.tiktok.com/@someone/video/7301234567890123456");
        assert_eq!(
            t.canonical,
            "https://www.tiktok.com/@someone/video/7301234567890123456?lang=en"
        );
    }

    #[test]
    fn existing_query_gets_ampersand() {
        let t = Target::from_raw("https://www.tiktok.com/@a/video/123?is_from_webapp=1");
        assert_eq!(
            t.canonical,
            "https://www.tiktok.com/@a/video/123?is_from_webapp=1&lang=en"
        );
        assert_eq!(t.id_hint, "123");
    }

    #[test]
    fn raw_url_is_trimmed() {
        let t = Target::from_raw("  https://www.tiktok.com/@a/video/42  ");
        assert_eq!(t.raw, "https://www.tiktok.com/@a/video/42");
        assert_eq!(t.numeric_id(), Some("42"));
    }

    #[test]
    fn trailing_slash_still_yields_last_segment() {
        let t = Target::from_raw("https://www.tiktok.com/@a/video/987/");
        assert_eq!(t.id_hint, "987");
    }

    #[test]
    fn non_numeric_hint_is_not_usable() {
        let t = Target::from_raw("https://www.tiktok.com/@creator");
        assert_eq!(t.id_hint, "@creator");
        assert_eq!(t.numeric_id(), None);
    }

    #[test]
    fn malformed_input_gives_empty_hint() {
        let t = Target::from_raw("");
        assert_eq!(t.canonical, "?lang=en");
        assert_eq!(t.id_hint, "");
        assert_eq!(t.numeric_id(), None);
    }
}
