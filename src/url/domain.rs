use std::net::IpAddr;
use url::Url;

/// Second-level labels under which registrations happen one level deeper
/// (`example.co.uk`, not `co.uk`).
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "ac", "co", "com", "edu", "gob", "gov", "net", "or", "org", "ne", "nic", "mil", "ltd", "plc",
];

/// Lowercased host of a URL, without the port
///
/// `None` for URLs that carry no host at all (`mailto:`, `data:`).
///
/// ```
/// use url::Url;
/// use contact_harvest::url::extract_domain;
///
/// let url = Url::parse("https://Team.Example.COM:8443/people").unwrap();
/// assert_eq!(extract_domain(&url).as_deref(), Some("team.example.com"));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the registered domain of a host
///
/// The registered domain is the part of the host a site owner registers:
/// `www.example.com` and `blog.example.com` both yield `example.com`, and
/// `shop.example.co.uk` yields `example.co.uk`. IP addresses and single-label
/// hosts are returned unchanged.
///
/// # Examples
///
/// ```
/// use contact_harvest::url::registered_domain;
///
/// assert_eq!(registered_domain("www.example.com"), "example.com");
/// assert_eq!(registered_domain("shop.example.co.uk"), "example.co.uk");
/// assert_eq!(registered_domain("127.0.0.1"), "127.0.0.1");
/// ```
pub fn registered_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let n = labels.len();
    let tld = labels[n - 1];
    let second = labels[n - 2];

    // Two-letter country code with a generic second level, e.g. co.uk, com.au
    let keep = if tld.len() == 2 && SECOND_LEVEL_SUFFIXES.contains(&second) {
        3
    } else {
        2
    };

    labels[n - keep..].join(".")
}
