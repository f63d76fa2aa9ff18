//! Parsing of transport-level peer address strings.

use std::net::IpAddr;

/// Splits `host:port` or `[host]:port` into its host and port parts.
///
/// Returns `None` when no port is present or the address is malformed (too many colons, stray
/// brackets). Bare IPv6 addresses such as `::1` are malformed under these rules.
fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = after.strip_prefix(':')?;

        if host.contains('[') || port.contains([':', '[', ']']) {
            return None;
        }

        return Some((host, port));
    }

    let (host, port) = addr.rsplit_once(':')?;

    if host.contains([':', '[', ']']) || port.contains(['[', ']']) {
        return None;
    }

    Some((host, port))
}

/// Parses the IP address out of a peer address string.
///
/// Accepts `ip:port`, `[ipv6]:port` and bare IP addresses. The port, if any, is not validated.
/// Anything else, including the empty string, yields `None`.
pub fn parse_peer_ip(peer: &str) -> Option<IpAddr> {
    if peer.is_empty() {
        return None;
    }

    let host = match split_host_port(peer) {
        Some((host, _port)) => host,
        None => peer,
    };

    host.parse().ok()
}
