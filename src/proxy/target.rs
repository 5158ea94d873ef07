/// Path segment that marks the start of the forwarded remainder.
pub const PROXY_SEGMENT: &str = "proxy";

/// Build the upstream URL: everything after the `proxy` segment of the inbound path,
/// appended to the upstream base, plus the original query string verbatim.
pub fn target_url(upstream: &str, inbound_path: &str, query: Option<&str>) -> String {
    let segments: Vec<&str> = inbound_path.split('/').collect();
    let remainder = match segments.iter().position(|s| *s == PROXY_SEGMENT) {
        Some(idx) => segments[idx + 1..].join("/"),
        None => inbound_path.trim_start_matches('/').to_string(),
    };
    let search = match query {
        Some(q) if !q.is_empty() => format!("?{}", q),
        _ => String::new(),
    };
    format!("{}/{}{}", upstream.trim_end_matches('/'), remainder, search)
}
