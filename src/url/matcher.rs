use std::net::IpAddr;

/// Checks whether `host` belongs to the site registered as `registered`
///
/// A host belongs to a site when it is the registered domain itself or any
/// subdomain of it. The comparison works on whole labels, so
/// `notexample.com` and `example.com.evil.net` are not part of `example.com`.
/// IP addresses have no subdomains and only match themselves. Both
/// arguments are expected in lowercase.
///
/// # Examples
///
/// ```
/// use contact_harvest::url::is_within_site;
///
/// assert!(is_within_site("example.com", "example.com"));
/// assert!(is_within_site("example.com", "support.eu.example.com"));
/// assert!(!is_within_site("example.com", "myexample.com"));
/// ```
pub fn is_within_site(registered: &str, host: &str) -> bool {
    if registered.is_empty() {
        return false;
    }
    let bare = registered.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host == registered;
    }

    match host.strip_suffix(registered) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.') && prefix.len() > 1,
        None => false,
    }
}
