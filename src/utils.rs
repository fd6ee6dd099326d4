use std::net::Ipv4Addr;

/// Whether `address` is a dotted-decimal IPv4 literal.
pub fn is_ipv4(address: &str) -> bool {
    address.parse::<Ipv4Addr>().is_ok()
}

/// Whether `path` passes the URL filter. An empty filter matches everything.
pub fn matches_url_filter(path: &str, filter: &str) -> bool {
    filter.is_empty() || path.contains(filter)
}
