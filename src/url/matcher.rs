/// Checks if a query parameter name matches a wildcard-suffix pattern
///
/// Two pattern shapes are supported:
/// 1. Exact match: "fbclid" matches only "fbclid"
/// 2. Suffix wildcard: "utm_*" matches any name starting with "utm_",
///    including "utm_" itself
///
/// # Examples
///
/// ```
/// use site_auditor::url::matches_wildcard;
///
/// assert!(matches_wildcard("fbclid", "fbclid"));
/// assert!(!matches_wildcard("fbclid", "fbclid2"));
///
/// assert!(matches_wildcard("utm_*", "utm_source"));
/// assert!(!matches_wildcard("utm_*", "xutm_source"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        candidate.starts_with(prefix)
    } else {
        candidate == pattern
    }
}
