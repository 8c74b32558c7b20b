//! SSRF validation for the caller-supplied webhook URL (spec.md §4.7):
//! rejects private/internal IPs, localhost, and internal hostnames, and
//! re-validates resolved IPs to guard against DNS rebinding.

use std::net::{IpAddr, Ipv6Addr};
use tokio::net::lookup_host;

pub async fn validate_url_for_ssrf(url: &str, allow_private_ips: bool) -> Result<(), String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err("URL must start with http:// or https://".to_string());
    }

    let parsed_url = reqwest::Url::parse(url).map_err(|e| format!("invalid URL format: {e}"))?;
    let host = parsed_url
        .host_str()
        .ok_or_else(|| "URL must have a host".to_string())?;
    let host_without_port = host.split(':').next().unwrap_or(host);

    if let Ok(ip) = host_without_port.parse::<IpAddr>() {
        if !allow_private_ips && is_private_ip(&ip) {
            return Err("private/internal IP addresses are not allowed".to_string());
        }
    }

    let host_lower = host_without_port.to_lowercase();
    if !allow_private_ips
        && (host_lower == "localhost"
            || host_lower.ends_with(".local")
            || host_lower == "127.0.0.1"
            || host_lower == "::1"
            || host_lower.starts_with("0.")
            || host_lower == "0.0.0.0"
            || host_lower.contains(".internal")
            || host_lower.contains(".corp"))
    {
        return Err("localhost and internal hostnames are not allowed".to_string());
    }

    let port = parsed_url
        .port()
        .unwrap_or(if parsed_url.scheme() == "https" { 443 } else { 80 });
    let mut resolved_ips = Vec::new();
    match lookup_host((host_without_port, port)).await {
        Ok(ips) => resolved_ips.extend(ips.map(|a| a.ip())),
        Err(e) => {
            tracing::warn!(host = %host_without_port, error = %e, "failed to resolve hostname for SSRF validation");
        }
    }

    if !allow_private_ips {
        for ip in &resolved_ips {
            if is_private_ip(ip) {
                return Err(format!("hostname resolves to private/internal IP address: {ip}"));
            }
        }
    }

    Ok(())
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let o = ipv4.octets();
            o[0] == 10
                || (o[0] == 172 && (16..=31).contains(&o[1]))
                || (o[0] == 192 && o[1] == 168)
                || o[0] == 127
                || (o[0] == 169 && o[1] == 254)
                || (224..=239).contains(&o[0])
                || o[0] == 0
        }
        IpAddr::V6(ipv6) => {
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn rejects_localhost() {
        assert!(validate_url_for_ssrf("http://localhost/hook", false).await.is_err());
        assert!(validate_url_for_ssrf("http://127.0.0.1/hook", false).await.is_err());
    }

    #[tokio::test]
    async fn rejects_private_ips() {
        assert!(validate_url_for_ssrf("http://192.168.1.1/hook", false).await.is_err());
        assert!(validate_url_for_ssrf("http://10.0.0.1/hook", false).await.is_err());
    }

    #[tokio::test]
    async fn rejects_invalid_scheme() {
        assert!(validate_url_for_ssrf("file:///etc/passwd", false).await.is_err());
    }

    #[test]
    fn private_ip_ranges() {
        assert!(is_private_ip(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
        assert!(!is_private_ip(&IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))));
    }
}
