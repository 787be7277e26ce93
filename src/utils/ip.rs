//! Client address extraction
//!
//! The peer address is authoritative unless the peer is a configured trusted
//! proxy, in which case `X-Forwarded-For` (first hop) or `X-Real-IP` is used.

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::trace;

/// 解析 `ip` 或 `ip:port`
fn parse_addr(raw: &str) -> Option<IpAddr> {
    raw.parse::<SocketAddr>()
        .map(|s| s.ip())
        .or_else(|_| raw.parse::<IpAddr>())
        .ok()
}

/// `cidr` 形如 `10.0.0.0/8`；地址族不同视为不匹配
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix)) = cidr.split_once('/') else {
        return false;
    };
    let (Ok(network), Ok(prefix)) = (network.parse::<IpAddr>(), prefix.parse::<u32>()) else {
        return false;
    };

    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            u32::from(*ip) & mask == u32::from(net) & mask
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            u128::from(*ip) & mask == u128::from(net) & mask
        }
        _ => false,
    }
}

/// 对端地址是否在可信代理列表中（单 IP 或 CIDR）
pub fn is_trusted_proxy(peer: &str, trusted_proxies: &[String]) -> bool {
    let Some(ip) = parse_addr(peer) else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip, proxy)
        } else {
            parse_addr(proxy) == Some(ip)
        }
    })
}

/// 从请求头取转发的原始客户端地址
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| header("x-real-ip").map(String::from))
}

/// 客户端地址（仅用于审计记录）
pub fn client_address(req: &HttpRequest, trusted_proxies: &[String]) -> Option<String> {
    let peer = req.peer_addr().map(|addr| addr.ip().to_string());

    match peer {
        Some(peer) if is_trusted_proxy(&peer, trusted_proxies) => {
            let forwarded = forwarded_ip(req.headers());
            trace!("Trusted proxy {} forwarded {:?}", peer, forwarded);
            forwarded.or(Some(peer))
        }
        Some(peer) => Some(peer),
        None => forwarded_ip(req.headers()).filter(|_| !trusted_proxies.is_empty()),
    }
}
