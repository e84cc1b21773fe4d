//! Contact link detection
//!
//! Scans the anchors of a fetched page for same-site links whose visible
//! text or path mentions one of the configured keywords ("contact",
//! "about", "team", ...).
//!
//! # Link Rules
//!
//! **Include:**
//! - `<a href="...">` tags resolving to HTTP(S) on the page's registered domain
//! - `rel="nofollow"` links
//!
//! **Exclude:**
//! - `<a href="..." download>`
//! - `javascript:`, `mailto:`, `tel:` and `data:` links
//! - Fragment-only links and links back to the page itself
//! - Duplicates after normalization

use crate::url::{extract_domain, normalize_url, same_site};
use crate::ErrorKind;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// A same-site link that looks like it leads to contact information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactLink {
    /// Normalized absolute URL of the link target
    pub url: Url,

    /// Page the link was found on
    pub source_page_url: Url,

    /// Visible anchor text, whitespace collapsed
    pub text: String,
}

/// Raw anchor captured from the document
#[derive(Debug, Clone)]
struct Anchor {
    href: String,
    text: String,
}

/// All anchors of a page, ready to be filtered into contact links
///
/// Filtering is lazy: [`ContactCandidates::iter`] yields links in document
/// order and can be restarted any number of times. Callers apply their own
/// cap with `.take(n)`.
#[derive(Debug, Clone)]
pub struct ContactCandidates {
    base_url: Url,
    keywords: Vec<String>,
    anchors: Vec<Anchor>,
}

/// Parses `html` and collects the anchors to consider as contact links
///
/// # Errors
///
/// * `ErrorKind::ParseError` - the body is empty
/// * `ErrorKind::InvalidUrl` - `base_url` has no host
///
/// # Example
///
/// ```
/// use contact_harvest::crawler::detect_contact_links;
/// use url::Url;
///
/// let html = r#"<a href="/contact-us">Contact</a><a href="/blog">Blog</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let keywords = vec!["contact".to_string()];
///
/// let candidates = detect_contact_links(html, &base, &keywords).unwrap();
/// let links: Vec<_> = candidates.iter().map(|l| l.url.to_string()).collect();
/// assert_eq!(links, vec!["https://example.com/contact-us"]);
/// ```
pub fn detect_contact_links(
    html: &str,
    base_url: &Url,
    keywords: &[String],
) -> Result<ContactCandidates, ErrorKind> {
    if html.trim().is_empty() {
        return Err(ErrorKind::ParseError);
    }
    if extract_domain(base_url).is_none() {
        return Err(ErrorKind::InvalidUrl);
    }

    let document = Html::parse_document(html);

    Ok(ContactCandidates {
        base_url: base_url.clone(),
        keywords: keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect(),
        anchors: collect_anchors(&document),
    })
}

fn collect_anchors(document: &Html) -> Vec<Anchor> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim().to_string();
            let text = element
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            Some(Anchor { href, text })
        })
        .collect()
}

impl ContactCandidates {
    /// Lazily yields contact links in document order, deduplicated
    pub fn iter(&self) -> ContactLinks<'_> {
        ContactLinks {
            candidates: self,
            position: 0,
            seen: HashSet::new(),
        }
    }

    /// Page the anchors were collected from
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Applies the link rules to one anchor
    fn accept(&self, anchor: &Anchor) -> Option<ContactLink> {
        let target = resolve_link(&anchor.href, &self.base_url)?;
        if !same_site(&self.base_url, &target) {
            return None;
        }
        if is_same_page(&target, &self.base_url) {
            return None;
        }
        if !self.matches_keyword(&anchor.text, target.path()) {
            return None;
        }

        Some(ContactLink {
            url: target,
            source_page_url: self.base_url.clone(),
            text: anchor.text.clone(),
        })
    }

    fn matches_keyword(&self, text: &str, path: &str) -> bool {
        let text = text.to_lowercase();
        let path = path.to_lowercase();

        self.keywords.iter().any(|keyword| {
            // "get in touch" should also match /get-in-touch
            let slug = keyword.replace(' ', "-");
            text.contains(keyword.as_str()) || path.contains(keyword.as_str()) || path.contains(&slug)
        })
    }
}

impl<'a> IntoIterator for &'a ContactCandidates {
    type Item = ContactLink;
    type IntoIter = ContactLinks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the contact links of a page
#[derive(Debug)]
pub struct ContactLinks<'a> {
    candidates: &'a ContactCandidates,
    position: usize,
    seen: HashSet<String>,
}

impl Iterator for ContactLinks<'_> {
    type Item = ContactLink;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(anchor) = self.candidates.anchors.get(self.position) {
            self.position += 1;

            if let Some(link) = self.candidates.accept(anchor) {
                if self.seen.insert(link.url.to_string()) {
                    return Some(link);
                }
            }
        }
        None
    }
}

/// Resolves an href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - invalid or non-HTTP(S) URLs
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_url(absolute.as_str()).ok()
}

fn is_same_page(target: &Url, base_url: &Url) -> bool {
    match normalize_url(base_url.as_str()) {
        Ok(base) => base == *target,
        Err(_) => false,
    }
}
