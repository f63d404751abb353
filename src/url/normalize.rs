use crate::config::ParamsConfig;
use crate::url::matcher::matches_wildcard;
use crate::{UrlError, UrlResult};
use std::collections::{BTreeMap, HashSet};
use url::form_urlencoded;
use url::Url;

/// Parameters whose distinct value count stays at or below this are kept
const LOW_CARDINALITY_LIMIT: usize = 5;

/// Canonicalizes URLs for the visited set and record keys
///
/// # Normalization Steps
///
/// 1. Resolve the URL against a base; reject non-HTTP(S) schemes
/// 2. Remove the fragment
/// 3. Drop query parameters matching a tracking pattern (`utm_*`, `fbclid`, ...)
/// 4. Keep a parameter if it is on the stable list or has few distinct values
/// 5. Re-encode the kept parameters sorted by name, values in original order
/// 6. Remove an empty query string
///
/// Scheme, host and path are left as the URL parser produced them, so
/// normalizing an already normalized URL returns it unchanged.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    tracking: Vec<String>,
    stable: HashSet<String>,
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self::new(&ParamsConfig::default())
    }
}

impl UrlNormalizer {
    /// Creates a normalizer from the configured parameter lists
    pub fn new(params: &ParamsConfig) -> Self {
        Self {
            tracking: params.tracking.clone(),
            stable: params.stable.iter().cloned().collect(),
        }
    }

    /// Normalizes `url`, resolving it against `base` if it is relative
    ///
    /// # Examples
    ///
    /// ```
    /// use site_auditor::url::UrlNormalizer;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://example.edu/en/").unwrap();
    /// let normalizer = UrlNormalizer::default();
    /// let url = normalizer
    ///     .normalize("news?utm_source=mail&page=2#top", &base)
    ///     .unwrap();
    /// assert_eq!(url.as_str(), "https://example.edu/en/news?page=2");
    /// ```
    pub fn normalize(&self, url: &str, base: &Url) -> UrlResult<Url> {
        let mut url = base
            .join(url.trim())
            .map_err(|e| UrlError::Parse(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        if url.host_str().is_none() {
            return Err(UrlError::MissingHost);
        }

        url.set_fragment(None);

        if url.query().is_some() {
            let kept = self.filter_query_params(&url);
            if kept.is_empty() {
                url.set_query(None);
            } else {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for (name, values) in &kept {
                    for value in values {
                        serializer.append_pair(name, value);
                    }
                }
                url.set_query(Some(&serializer.finish()));
            }
        }

        Ok(url)
    }

    /// Returns true if `name` matches one of the tracking patterns
    pub fn is_tracking_param(&self, name: &str) -> bool {
        self.tracking
            .iter()
            .any(|pattern| matches_wildcard(pattern, name))
    }

    /// Groups query values by name and applies the keep/drop rules
    fn filter_query_params(&self, url: &Url) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in url.query_pairs() {
            // blank names and values carry no information
            if name.is_empty() || value.is_empty() {
                continue;
            }
            grouped
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }

        grouped.retain(|name, values| {
            if self.is_tracking_param(name) {
                return false;
            }
            let distinct: HashSet<&String> = values.iter().collect();
            self.stable.contains(name) || distinct.len() <= LOW_CARDINALITY_LIMIT
        });

        grouped
    }
}

/// Normalizes a URL with the default parameter lists
///
/// # Examples
///
/// ```
/// use site_auditor::url::normalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.edu/en/").unwrap();
/// let url = normalize_url("/en/about?fbclid=abc#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.edu/en/about");
/// ```
pub fn normalize_url(url: &str, base: &Url) -> UrlResult<Url> {
    UrlNormalizer::default().normalize(url, base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.edu/en/").unwrap()
    }

    fn normalize(url: &str) -> String {
        normalize_url(url, &base()).unwrap().to_string()
    }

    #[test]
    fn test_remove_fragment() {
        assert_eq!(
            normalize("https://example.edu/en/about#history"),
            "https://example.edu/en/about"
        );
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(normalize("news/1"), "https://example.edu/en/news/1");
        assert_eq!(normalize("/en/events"), "https://example.edu/en/events");
    }

    #[test]
    fn test_remove_tracking_params() {
        assert_eq!(
            normalize("https://example.edu/en/news?utm_source=x&utm_medium=y&fbclid=1&gclid=2"),
            "https://example.edu/en/news"
        );
        assert_eq!(
            normalize("https://example.edu/en/news?mc_cid=a&mc_eid=b&utm_whatever=c"),
            "https://example.edu/en/news"
        );
    }

    #[test]
    fn test_keep_stable_params_sorted() {
        assert_eq!(
            normalize("https://example.edu/en/news?tag=x&category=news&page=2"),
            "https://example.edu/en/news?category=news&page=2&tag=x"
        );
    }

    #[test]
    fn test_keep_low_cardinality_param() {
        assert_eq!(
            normalize("https://example.edu/en/news?sort=asc&utm_source=a"),
            "https://example.edu/en/news?sort=asc"
        );
    }

    #[test]
    fn test_drop_high_cardinality_param() {
        let url = "https://example.edu/en/news?id=1&id=2&id=3&id=4&id=5&id=6";
        assert_eq!(normalize(url), "https://example.edu/en/news");
    }

    #[test]
    fn test_stable_param_survives_high_cardinality() {
        let url = "https://example.edu/en/news?page=1&page=2&page=3&page=4&page=5&page=6";
        assert_eq!(normalize(url), url);
    }

    #[test]
    fn test_repeated_values_count_once() {
        let url = "https://example.edu/en/news?f=a&f=a&f=a&f=a&f=a&f=a&f=b";
        assert_eq!(normalize(url), url);
    }

    #[test]
    fn test_blank_values_dropped() {
        assert_eq!(
            normalize("https://example.edu/en/news?q=&page=2"),
            "https://example.edu/en/news?page=2"
        );
    }

    #[test]
    fn test_empty_query_removed() {
        assert_eq!(
            normalize("https://example.edu/en/news?"),
            "https://example.edu/en/news"
        );
    }

    #[test]
    fn test_path_preserved() {
        // trailing slashes and case are significant and left alone
        assert_eq!(normalize("https://example.edu/en/About/"), "https://example.edu/en/About/");
    }

    #[test]
    fn test_encoded_values_round_trip() {
        assert_eq!(
            normalize("https://example.edu/en/search?q=hello world"),
            "https://example.edu/en/search?q=hello+world"
        );
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "https://example.edu/en/news?b=2&a=1&utm_source=x#frag",
            "https://example.edu/en/news?q=a%20b&q=c&category=x y",
            "https://example.edu/en/?page=3&page=1",
            "/en/events/",
            "news?z=%2F&y=%26",
            "https://example.edu/en/a?id=1&id=2&id=3&id=4&id=5&id=6&k=v",
        ];

        for sample in samples {
            let once = normalize_url(sample, &base()).unwrap();
            let twice = normalize_url(once.as_str(), &base()).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", sample);
        }
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("mailto:someone@example.edu", &base());
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));

        let result = normalize_url("ftp://example.edu/file", &base());
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_custom_param_lists() {
        let normalizer = UrlNormalizer::new(&ParamsConfig {
            tracking: vec!["ref".to_string()],
            stable: vec![],
        });
        let url = normalizer
            .normalize("https://example.edu/en/?ref=home&utm_source=x", &base())
            .unwrap();
        assert_eq!(url.as_str(), "https://example.edu/en/?utm_source=x");
    }
}
