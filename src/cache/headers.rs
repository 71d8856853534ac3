use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Upper bound for the `Expires` offset (one year)
const MAX_AGE_SECS: u64 = 31_536_000;

/// How the cache participated in one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from cache; `ttl` is the remaining lifetime
    Hit { ttl: Duration },
    /// Computed and stored for `ttl`
    Miss { ttl: Duration },
    /// Caching disabled for this request
    Bypass,
}

impl CacheOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit { .. } => "hit",
            CacheOutcome::Miss { .. } => "miss",
            CacheOutcome::Bypass => "bypass",
        }
    }

    /// Response headers describing cacheability
    #[must_use]
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            CacheOutcome::Hit { ttl } | CacheOutcome::Miss { ttl } => {
                let secs = ttl.as_secs();
                let delta = ChronoDuration::seconds(i64::try_from(secs.min(MAX_AGE_SECS)).unwrap_or(0));
                let expires = Utc::now() + delta;
                vec![
                    ("Cache-Control", format!("public, max-age={secs}")),
                    ("Expires", expires.format(HTTP_DATE_FORMAT).to_string()),
                    ("X-Cache", self.as_str().to_ascii_uppercase()),
                ]
            }
            CacheOutcome::Bypass => vec![
                (
                    "Cache-Control",
                    "no-cache, no-store, must-revalidate".to_string(),
                ),
                ("Pragma", "no-cache".to_string()),
                ("Expires", "0".to_string()),
                ("X-Cache", "BYPASS".to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(headers: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_enabled_headers() {
        let headers = CacheOutcome::Miss {
            ttl: Duration::from_secs(300),
        }
        .headers();
        assert_eq!(header(&headers, "Cache-Control"), Some("public, max-age=300"));
        let expires = header(&headers, "Expires").unwrap();
        assert!(expires.ends_with(" GMT"));
        assert!(chrono::NaiveDateTime::parse_from_str(expires, HTTP_DATE_FORMAT).is_ok());
        assert_eq!(header(&headers, "X-Cache"), Some("MISS"));
    }

    #[test]
    fn test_bypass_headers() {
        let headers = CacheOutcome::Bypass.headers();
        assert_eq!(
            header(&headers, "Cache-Control"),
            Some("no-cache, no-store, must-revalidate")
        );
        assert_eq!(header(&headers, "Pragma"), Some("no-cache"));
        assert_eq!(header(&headers, "Expires"), Some("0"));
    }
}
