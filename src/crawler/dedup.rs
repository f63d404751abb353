//! Content fingerprinting for duplicate page detection

use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Maps body fingerprints to the first URL that served them
#[derive(Debug, Default)]
pub struct ContentDeduplicator {
    seen: HashMap<String, String>,
}

impl ContentDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the URL that first served an identical body, or registers
    /// `url` as the source of this body and returns `None`
    pub fn check_duplicate(&mut self, body: &[u8], url: &str) -> Option<String> {
        let key = fingerprint(body);
        if let Some(original) = self.seen.get(&key) {
            return Some(original.clone());
        }
        self.seen.insert(key, url.to_string());
        None
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// SHA-256 of the raw body bytes as served, hex encoded
pub fn fingerprint(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_body_is_registered() {
        let mut dedup = ContentDeduplicator::new();
        assert!(dedup.check_duplicate(b"<html>a</html>", "https://example.edu/en/a").is_none());
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn test_identical_body_reports_original() {
        let mut dedup = ContentDeduplicator::new();
        dedup.check_duplicate(b"<html>same</html>", "https://example.edu/en/news");
        assert_eq!(
            dedup.check_duplicate(b"<html>same</html>", "https://example.edu/en/news/"),
            Some("https://example.edu/en/news".to_string())
        );
        // the original stays the source for later matches too
        assert_eq!(
            dedup.check_duplicate(b"<html>same</html>", "https://example.edu/en/news?page=1"),
            Some("https://example.edu/en/news".to_string())
        );
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn test_whitespace_matters() {
        let mut dedup = ContentDeduplicator::new();
        dedup.check_duplicate(b"<p>x</p>", "a");
        assert!(dedup.check_duplicate(b"<p>x</p>\n", "b").is_none());
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_distinct_encodings_are_not_duplicates() {
        // same text, latin-1 vs utf-8 on the wire
        let mut dedup = ContentDeduplicator::new();
        assert!(dedup.check_duplicate(b"<p>caf\xe9</p>", "https://example.edu/en/a").is_none());
        assert!(dedup
            .check_duplicate("<p>café</p>".as_bytes(), "https://example.edu/en/b")
            .is_none());
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_invalid_utf8_bodies_stay_distinct() {
        // both decode lossily to U+FFFD
        assert_ne!(fingerprint(b"\xff"), fingerprint(b"\xfe"));
        let mut dedup = ContentDeduplicator::new();
        dedup.check_duplicate(b"\xff", "a");
        assert!(dedup.check_duplicate(b"\xfe", "b").is_none());
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint(b"");
        assert_eq!(fp.len(), 64);
        assert_eq!(
            fp,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
