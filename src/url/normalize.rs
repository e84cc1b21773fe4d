use crate::UrlError;
use url::Url;

/// Query parameters that only carry campaign/click tracking
///
/// Any `utm_*` parameter is dropped as well.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "msclkid", "ref_src"];

/// Normalizes a URL into its canonical crawl form
///
/// The result is what the crawler compares, deduplicates and requests:
///
/// - surrounding whitespace is ignored
/// - only `http` and `https` are accepted, and the scheme is kept as given
/// - a host is required and is lowercased (ports are kept)
/// - empty path segments and trailing slashes are removed, `/` stays `/`
/// - the fragment is dropped
/// - tracking parameters are dropped and the rest sorted by key
///
/// Two links to the same page therefore compare equal after normalization,
/// which is what contact-link dedup and same-site checks rely on.
///
/// # Examples
///
/// ```
/// use contact_harvest::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM/contact/#form").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/contact");
/// ```
pub fn normalize_url(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(UrlError::InvalidScheme(format!(
                "expected http or https, got {}",
                other
            )))
        }
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err(UrlError::MissingDomain),
    };
    let lowered = host.to_lowercase();
    if lowered != host {
        url.set_host(Some(&lowered))
            .map_err(|e| UrlError::Malformed(format!("cannot lowercase host {}: {}", host, e)))?;
    }

    // dot segments are already resolved by the parser
    let path = collapse_path(&url);
    url.set_path(&path);
    url.set_fragment(None);

    let params = kept_params(&url);
    if params.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(params);
    }

    Ok(url)
}

/// Joins the non-empty path segments; `/` when there are none
fn collapse_path(url: &Url) -> String {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    format!("/{}", segments.join("/"))
}

/// Non-tracking query parameters, sorted by key (stable for equal keys)
fn kept_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(raw: &str) -> String {
        normalize_url(raw).unwrap().to_string()
    }

    #[test]
    fn test_canonical_forms() {
        let cases = [
            ("http://example.com/team", "http://example.com/team"),
            ("https://www.example.com", "https://www.example.com/"),
            ("https://example.com/contact/", "https://example.com/contact"),
            ("https://example.com/", "https://example.com/"),
            ("https://example.com/about#office", "https://example.com/about"),
            ("https://Shop.EXAMPLE.com/Contact-Us", "https://shop.example.com/Contact-Us"),
            ("https://example.com//en///staff//", "https://example.com/en/staff"),
            ("https://example.com/en/../de/./kontakt", "https://example.com/de/kontakt"),
            ("http://127.0.0.1:8080/contact/", "http://127.0.0.1:8080/contact"),
        ];

        for (raw, expected) in cases {
            assert_eq!(normalized(raw), expected, "normalizing {}", raw);
        }
    }

    #[test]
    fn test_tracking_params_dropped() {
        assert_eq!(
            normalized("https://example.com/contact?utm_source=newsletter&utm_campaign=spring"),
            "https://example.com/contact"
        );
        assert_eq!(
            normalized("https://example.com/staff?page=2&gclid=abc&dept=sales&fbclid=xyz"),
            "https://example.com/staff?dept=sales&page=2"
        );
    }

    #[test]
    fn test_whitespace_and_everything_at_once() {
        assert_eq!(
            normalized("  http://WWW.Example.COM/a/../team/?utm_medium=cpc&z=1#top \n"),
            "http://www.example.com/team?z=1"
        );
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        for raw in ["ftp://example.com/", "mailto:info@example.com", "javascript:void(0)"] {
            assert!(
                matches!(normalize_url(raw), Err(UrlError::InvalidScheme(_))),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_rejects_unparseable() {
        assert!(matches!(normalize_url("example dot com"), Err(UrlError::Parse(_))));
        assert!(normalize_url("").is_err());
        assert!(normalize_url("https://").is_err());
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_url("HTTPS://Example.com/About/?b=1&a=2#x").unwrap();
        let twice = normalize_url(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }
}
