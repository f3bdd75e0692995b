//! URL classification for v.qq.com page shapes
//!
//! Matches an input URL against the four known shapes (cover, detail,
//! cover+episode, bare page) and extracts the identifying tokens. Patterns
//! are tried in priority order because the detail and episode shapes would
//! otherwise overlap.

use regex::Regex;

const COVER_URL_PREFIX: &str = "https://v.qq.com/x/cover/";

const COVER_PAT: &str = r"(?i)^https?://v\.qq\.com/x/cover/(\w+)\.html";
const DETAIL_PAT: &str = r"(?i)^https?://v\.qq\.com/detail/([a-zA-Z0-9])/(\w+)\.html";
const EPISODE_PAT: &str = r"(?i)^https?://v\.qq\.com/x/cover/(\w+)/(\w+)\.html";
const PAGE_PAT: &str = r"(?i)^https?://v\.qq\.com/x/page/(\w+)\.html";

/// Result of classifying an input URL
///
/// `NoMatch` doubles as the "can this crate handle this URL" probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlKind {
    /// Top-level cover page, e.g. `https://v.qq.com/x/cover/nhtfh14i9y1egge.html`
    Cover { cover_id: String },
    /// Detail page, e.g. `https://v.qq.com/detail/n/nhtfh14i9y1egge.html`
    Detail { cover_id: String },
    /// Episode within a cover, e.g.
    /// `https://v.qq.com/x/cover/nhtfh14i9y1egge/d00249ld45q.html`
    Episode { cover_id: String, video_id: String },
    /// Bare per-episode page, e.g. `https://v.qq.com/x/page/d00249ld45q.html`
    Page { video_id: String },
    NoMatch,
}

/// Classifies a URL into one of the known page shapes
///
/// First matching pattern wins. The detail shape additionally requires the
/// second path segment to start with the first segment's literal text
/// (`/detail/n/nhtfh...` is valid, `/detail/n/xhtfh...` is not).
pub fn classify(url: &str) -> UrlKind {
    if let Ok(re) = Regex::new(COVER_PAT)
        && let Some(caps) = re.captures(url)
    {
        return UrlKind::Cover {
            cover_id: caps[1].to_string(),
        };
    }

    if let Ok(re) = Regex::new(DETAIL_PAT)
        && let Some(caps) = re.captures(url)
    {
        // The regex crate has no backreferences; the first-letter-prefix
        // relationship between the two segments is checked explicitly.
        let prefix = caps[1].chars().next();
        let cover_id = &caps[2];
        let mut id_chars = cover_id.chars();
        let first_matches = match (id_chars.next(), prefix) {
            (Some(c), Some(p)) => c.eq_ignore_ascii_case(&p),
            _ => false,
        };
        if first_matches && id_chars.next().is_some() {
            return UrlKind::Detail {
                cover_id: cover_id.to_string(),
            };
        }
        return UrlKind::NoMatch;
    }

    if let Ok(re) = Regex::new(EPISODE_PAT)
        && let Some(caps) = re.captures(url)
    {
        return UrlKind::Episode {
            cover_id: caps[1].to_string(),
            video_id: caps[2].to_string(),
        };
    }

    if let Ok(re) = Regex::new(PAGE_PAT)
        && let Some(caps) = re.captures(url)
    {
        return UrlKind::Page {
            video_id: caps[1].to_string(),
        };
    }

    UrlKind::NoMatch
}

/// Whether this crate can handle the given URL at all
pub fn is_supported_url(url: &str) -> bool {
    classify(url) != UrlKind::NoMatch
}

/// Builds the canonical cover page URL for a cover id
///
/// # Example
/// ```
/// use qqvideo_core::url::cover_url;
/// assert_eq!(
///     cover_url("nhtfh14i9y1egge"),
///     "https://v.qq.com/x/cover/nhtfh14i9y1egge.html"
/// );
/// ```
pub fn cover_url(cover_id: &str) -> String {
    format!("{}{}.html", COVER_URL_PREFIX, cover_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify_cover() {
        let kind = classify("https://v.qq.com/x/cover/nhtfh14i9y1egge.html");
        assert_eq!(
            kind,
            UrlKind::Cover {
                cover_id: "nhtfh14i9y1egge".to_string()
            }
        );
    }

    #[test]
    fn test_classify_detail() {
        let kind = classify("https://v.qq.com/detail/n/nhtfh14i9y1egge.html");
        assert_eq!(
            kind,
            UrlKind::Detail {
                cover_id: "nhtfh14i9y1egge".to_string()
            }
        );
    }

    #[test]
    fn test_classify_detail_rejects_mismatched_prefix() {
        // second segment must start with the first segment's literal text
        let kind = classify("https://v.qq.com/detail/n/xhtfh14i9y1egge.html");
        assert_eq!(kind, UrlKind::NoMatch);
    }

    #[test]
    fn test_classify_episode() {
        let kind =
            classify("https://v.qq.com/x/cover/nhtfh14i9y1egge/d00249ld45q.html");
        assert_eq!(
            kind,
            UrlKind::Episode {
                cover_id: "nhtfh14i9y1egge".to_string(),
                video_id: "d00249ld45q".to_string()
            }
        );
    }

    #[test]
    fn test_classify_page() {
        let kind = classify("https://v.qq.com/x/page/d00249ld45q.html");
        assert_eq!(
            kind,
            UrlKind::Page {
                video_id: "d00249ld45q".to_string()
            }
        );
    }

    #[test]
    fn test_classify_http_scheme_and_case() {
        let kind = classify("HTTP://V.QQ.COM/x/cover/abc123.html");
        assert_eq!(
            kind,
            UrlKind::Cover {
                cover_id: "abc123".to_string()
            }
        );
    }

    #[test]
    fn test_classify_no_match() {
        assert_eq!(classify("https://v.qq.com/x/search/foo.html"), UrlKind::NoMatch);
        assert_eq!(classify("https://example.com/x/cover/abc.html"), UrlKind::NoMatch);
        assert_eq!(classify("not a url"), UrlKind::NoMatch);
        assert_eq!(classify(""), UrlKind::NoMatch);
    }

    #[test]
    fn test_is_supported_url() {
        assert!(is_supported_url("https://v.qq.com/x/page/d00249ld45q.html"));
        assert!(!is_supported_url("https://v.qq.com/about.html"));
    }

    #[test]
    fn test_cover_url_round_trip() {
        let url = cover_url("nhtfh14i9y1egge");
        assert_eq!(
            classify(&url),
            UrlKind::Cover {
                cover_id: "nhtfh14i9y1egge".to_string()
            }
        );
    }

    proptest! {
        #[test]
        fn prop_classify_never_panics(s in "\\PC*") {
            let _ = classify(&s);
        }

        #[test]
        fn prop_cover_url_round_trips(id in "[a-z0-9]{5,20}") {
            let kind = classify(&cover_url(&id));
            prop_assert_eq!(kind, UrlKind::Cover { cover_id: id });
        }
    }
}
