//! Client IP extraction (spec.md §3: `UploadJob.client_ip` is required),
//! grounded on the teacher's `x-forwarded-for`/`x-real-ip` chain-walking
//! idiom, with a trusted-proxy-count parameter to stop a caller spoofing
//! the header from faking their own IP.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Falls back to the direct socket address, then to `"unknown"`.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&std::net::SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(header_value) = forwarded_for.to_str() {
            let ip = extract_from_forwarded_for(header_value, trusted_proxy_count);
            if ip != "unknown" {
                return ip;
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(header_value) = real_ip.to_str() {
            let trimmed = header_value.trim();
            if is_valid_ip(trimmed) {
                return trimmed.to_string();
            }
        }
    }

    if let Some(addr) = socket_addr {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// `X-Forwarded-For` is `client, proxy1, proxy2, ...`; with `trusted_proxy_count`
/// proxies trusted at the tail, the client sits at `len - trusted_proxy_count - 1`.
fn extract_from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> String {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if ips.is_empty() {
        return "unknown".to_string();
    }

    if trusted_proxy_count == 0 || ips.len() <= trusted_proxy_count {
        let last_ip = ips.last().unwrap_or(&"");
        return if is_valid_ip(last_ip) {
            last_ip.to_string()
        } else {
            "unknown".to_string()
        };
    }

    let client_ip_pos = ips.len().saturating_sub(trusted_proxy_count + 1);
    let client_ip = ips.get(client_ip_pos).unwrap_or(&"");
    if is_valid_ip(client_ip) {
        client_ip.to_string()
    } else {
        "unknown".to_string()
    }
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_xff(xff_value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(xff_value).unwrap());
        headers
    }

    #[test]
    fn no_trusted_proxies_uses_last_hop() {
        assert_eq!(
            extract_from_forwarded_for("192.168.1.1, 10.0.0.1", 0),
            "10.0.0.1"
        );
    }

    #[test]
    fn trusted_proxy_chain_resolves_to_client() {
        assert_eq!(
            extract_from_forwarded_for("203.0.113.7, 10.0.0.1, 10.0.0.2", 2),
            "203.0.113.7"
        );
    }

    #[test]
    fn invalid_ip_falls_back_to_unknown() {
        assert_eq!(extract_from_forwarded_for("not.an.ip", 0), "unknown");
    }

    #[test]
    fn falls_back_to_socket_when_headers_absent() {
        let headers = HeaderMap::new();
        let socket = std::net::SocketAddr::from(([127, 0, 0, 1], 8080));
        assert_eq!(extract_client_ip(&headers, Some(&socket), 0), "127.0.0.1");
    }

    #[test]
    fn real_ip_header_used_when_xff_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(extract_client_ip(&headers, None, 0), "203.0.113.9");
    }

    #[test]
    fn xff_takes_precedence_over_socket() {
        let headers = headers_with_xff("203.0.113.7");
        let socket = std::net::SocketAddr::from(([10, 0, 0, 9], 8080));
        assert_eq!(extract_client_ip(&headers, Some(&socket), 0), "203.0.113.7");
    }
}
