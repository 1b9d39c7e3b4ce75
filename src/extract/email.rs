use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

/// Extracts email-like tokens from text
///
/// Deduplication is exact-string and case-sensitive; the first occurrence
/// fixes the position.
///
/// # Examples
///
/// ```
/// use cert_sieve::extract_emails;
///
/// let emails = extract_emails("Sales: sales@factory.cn, SALES@factory.cn, sales@factory.cn");
/// assert_eq!(emails, vec!["sales@factory.cn", "SALES@factory.cn"]);
/// ```
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    EMAIL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|email| seen.insert(*email))
        .map(str::to_string)
        .collect()
}
