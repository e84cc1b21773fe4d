//! URL handling module for Contact-Harvest
//!
//! This module provides URL normalization, domain extraction, registered
//! domain computation and same-site checks. Every URL is normalized before
//! any network call so that dedup and same-site comparisons are reliable.

mod domain;
mod matcher;
mod normalize;

use ::url::Url;

// Re-export main functions
pub use domain::{extract_domain, registered_domain};
pub use matcher::is_within_site;
pub use normalize::normalize_url;

/// Returns true if both URLs live on the same registered domain
///
/// # Examples
///
/// ```
/// use url::Url;
/// use contact_harvest::url::same_site;
///
/// let home = Url::parse("https://www.example.com/").unwrap();
/// let team = Url::parse("https://team.example.com/people").unwrap();
/// let other = Url::parse("https://example.org/").unwrap();
///
/// assert!(same_site(&home, &team));
/// assert!(!same_site(&home, &other));
/// ```
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(host_a), Some(host_b)) => is_within_site(&registered_domain(&host_a), &host_b),
        _ => false,
    }
}
