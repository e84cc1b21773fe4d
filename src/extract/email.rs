//! Syntactic email address extraction
//!
//! # Grammar
//!
//! An address is `local@domain` where:
//!
//! - `local` is one or more of `A-Z a-z 0-9 . _ % + -` (leading dots dropped)
//! - `domain` is one or more labels of `A-Z a-z 0-9 -` separated by dots,
//!   ending in a top-level label of at least two letters
//! - the character before the address is absent or not a letter, digit,
//!   local-part symbol or `@`
//! - the character after the address is absent or not a letter or digit
//!   (in any script), nor
//!   one of `_ - @ % +`; a following `.` is only allowed when it is not
//!   itself followed by an alphanumeric character (sentence punctuation)
//! - the top-level label is not a common file extension, so retina image
//!   names such as `logo@2x.png` are not addresses
//!
//! Matches are lowercased. Deliverability is not checked.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Candidate pattern; boundaries are enforced in code since the regex
/// engine has no lookaround.
const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}";

/// Top-level labels that indicate an asset filename rather than a domain
const FILE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "bmp", "ico", "tif", "tiff", "css", "js",
    "json", "xml", "pdf", "mp4", "webm", "woff", "woff2",
];

static DEFAULT_EXTRACTOR: OnceLock<EmailExtractor> = OnceLock::new();

/// Extracts deduplicated, lowercased email addresses from text
///
/// # Example
///
/// ```
/// use contact_harvest::extract_emails;
///
/// let found = extract_emails("Email us at Info@Example.com! Or hr@example.com.");
/// assert_eq!(
///     found.into_iter().collect::<Vec<_>>(),
///     vec!["hr@example.com", "info@example.com"]
/// );
/// ```
pub fn extract_emails(text: &str) -> BTreeSet<String> {
    DEFAULT_EXTRACTOR
        .get_or_init(EmailExtractor::new)
        .extract(text)
}

/// Email extractor holding the compiled candidate pattern
#[derive(Debug, Clone)]
pub struct EmailExtractor {
    pattern: Regex,
}

impl EmailExtractor {
    /// Compiles the address pattern
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"),
        }
    }

    /// Extracts deduplicated, lowercased addresses in sorted order
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        self.matches(text).collect()
    }

    /// Lazily yields each accepted address in document order
    ///
    /// Duplicates are not removed here; use [`EmailExtractor::extract`] for a set.
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        self.pattern.find_iter(text).filter_map(move |m| {
            let start = m.start();
            let end = m.end();

            if !leading_boundary_ok(text, start) || !trailing_boundary_ok(text, end) {
                return None;
            }

            let candidate = m.as_str().trim_start_matches('.');
            if !is_acceptable(candidate) {
                return None;
            }

            Some(candidate.to_lowercase())
        })
    }
}

impl Default for EmailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Characters that would extend an address on its left edge; any letter or
/// digit counts, not only ASCII ones
fn is_local_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

fn leading_boundary_ok(text: &str, start: usize) -> bool {
    match text[..start].chars().next_back() {
        None => true,
        Some(prev) => !(is_local_char(prev) || prev == '@'),
    }
}

fn trailing_boundary_ok(text: &str, end: usize) -> bool {
    let mut rest = text[end..].chars();
    match rest.next() {
        None => true,
        Some('.') => !matches!(rest.next(), Some(c) if c.is_alphanumeric()),
        Some(next) => {
            !(next.is_alphanumeric() || matches!(next, '_' | '-' | '@' | '%' | '+'))
        }
    }
}

/// Checks the parts of a boundary-clean match
fn is_acceptable(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.rsplit_once('@') else {
        return false;
    };

    if local.is_empty() || !domain.contains('.') {
        return false;
    }

    let tld = domain.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    if tld.len() < 2 || FILE_EXTENSIONS.contains(&tld.as_str()) {
        return false;
    }

    domain.split('.').all(|label| !label.is_empty())
}
