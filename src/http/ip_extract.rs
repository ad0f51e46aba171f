use std::net::IpAddr;

use axum::http::HeaderMap;

/// Request extension carrying the IP the classification middleware already
/// extracted, so handlers never recompute it.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

/// Extract the client IP per spec §4.5: the first comma-separated element
/// of `X-Forwarded-For`, falling back to the socket peer, else the literal
/// string `"unknown"` — returned as a string rather than `IpAddr` since the
/// fallback has no address representation.
pub fn extract_client_ip(headers: &HeaderMap, peer_addr: Option<IpAddr>) -> String {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(val) = xff.to_str() {
            if let Some(first) = val.split(',').next() {
                let candidate = first.trim();
                if candidate.parse::<IpAddr>().is_ok() {
                    return candidate.to_string();
                }
            }
        }
    }

    peer_addr
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::net::Ipv4Addr;

    #[test]
    fn prefers_first_xff_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        let peer = Some(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(extract_client_ip(&headers, peer), "203.0.113.9");
    }

    #[test]
    fn falls_back_to_peer_when_xff_absent() {
        let headers = HeaderMap::new();
        let peer = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(extract_client_ip(&headers, peer), "10.0.0.2");
    }

    #[test]
    fn falls_back_to_unknown_literal() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, None), "unknown");
    }

    #[test]
    fn ignores_malformed_xff_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        let peer = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 3)));
        assert_eq!(extract_client_ip(&headers, peer), "10.0.0.3");
    }
}
