use std::net::IpAddr;

use ipnetwork::{IpNetwork, Ipv4Network};

use crate::{
    error::{CidrError, ConfigError},
    peer::parse_peer_ip,
};

/// Set of network ranges whose peers may assert the client IP.
///
/// Immutable once built; wrap in an `Arc` to share between workers.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies {
    ranges: Vec<IpNetwork>,
}

impl TrustedProxies {
    /// Parses every entry of `cidrs` into a trusted range.
    ///
    /// Entries must be in `address/prefix` form. Host bits below the prefix are cleared. Fails on
    /// the first invalid entry, naming it and the middleware instance `name`.
    ///
    /// # Examples
    /// ```
    /// use actix_cloudflare_real_ip::TrustedProxies;
    ///
    /// let trusted = TrustedProxies::try_from_cidrs("edge", ["103.21.244.0/22"]).unwrap();
    /// assert!(trusted.contains([103, 21, 247, 255].into()));
    ///
    /// assert!(TrustedProxies::try_from_cidrs("edge", ["103.21.244.0/33"]).is_err());
    /// ```
    pub fn try_from_cidrs<I, S>(name: &str, cidrs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ranges = cidrs
            .into_iter()
            .map(|cidr| {
                let cidr = cidr.as_ref();
                parse_cidr(cidr).map_err(|kind| ConfigError::new(name, cidr, kind))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { ranges })
    }

    /// Adds a trusted range.
    pub fn with_ip_range(mut self, range: IpNetwork) -> Self {
        self.ranges.push(canonical(range));
        self
    }

    /// Returns true if `ip` falls inside any trusted range.
    ///
    /// IPv4-mapped IPv6 addresses are matched against IPv4 ranges.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.ranges.iter().any(|range| range.contains(ip))
    }

    /// Returns true if the peer address string (`ip:port`, `[ip]:port` or a bare IP) belongs to
    /// a trusted range.
    ///
    /// Empty or unparseable peers are never trusted.
    pub fn is_trusted_peer(&self, peer: &str) -> bool {
        parse_peer_ip(peer).is_some_and(|ip| self.contains(ip))
    }

    /// Trusted ranges, in configuration order.
    pub fn ranges(&self) -> &[IpNetwork] {
        &self.ranges
    }

    /// Returns true if no range is trusted.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

fn parse_cidr(cidr: &str) -> Result<IpNetwork, CidrError> {
    let (addr, prefix) = cidr.split_once('/').ok_or(CidrError::MissingPrefix)?;

    let addr = addr.parse::<IpAddr>().map_err(CidrError::Address)?;

    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CidrError::Prefix);
    }

    let prefix = prefix.parse::<u8>().map_err(|_| CidrError::Prefix)?;
    let range = IpNetwork::new(addr, prefix).map_err(|_| CidrError::Prefix)?;

    Ok(canonical(range))
}

/// Clears host bits, e.g. `10.1.2.3/8` becomes `10.0.0.0/8`.
///
/// IPv4-mapped ranges of `/96` or longer become plain IPv4 ranges, so `::ffff:10.0.0.0/104` is
/// stored as `10.0.0.0/8`. Peers are folded the same way in [`TrustedProxies::contains`].
fn canonical(range: IpNetwork) -> IpNetwork {
    let range = match range {
        IpNetwork::V6(v6) if v6.prefix() >= 96 => match v6.ip().to_ipv4_mapped() {
            Some(v4) => Ipv4Network::new(v4, v6.prefix() - 96)
                .map(IpNetwork::V4)
                .unwrap_or(range),
            None => range,
        },
        _ => range,
    };

    IpNetwork::new(range.network(), range.prefix()).unwrap_or(range)
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(TrustedProxies: Clone, Send, Sync);

    fn sample() -> TrustedProxies {
        TrustedProxies::try_from_cidrs("test", ["103.21.244.0/22", "2400:cb00::/32"]).unwrap()
    }

    #[test]
    fn parse_valid() {
        assert_eq!(
            parse_cidr("10.0.0.0/8").unwrap(),
            "10.0.0.0/8".parse::<IpNetwork>().unwrap(),
        );
        assert_eq!(
            parse_cidr("0.0.0.0/0").unwrap(),
            "0.0.0.0/0".parse::<IpNetwork>().unwrap(),
        );
        assert_eq!(
            parse_cidr("2400:cb00::/32").unwrap(),
            "2400:cb00::/32".parse::<IpNetwork>().unwrap(),
        );
        assert_eq!(parse_cidr("::1/128").unwrap().prefix(), 128);
    }

    #[test]
    fn parse_clears_host_bits() {
        let range = parse_cidr("103.21.244.23/22").unwrap();
        assert_eq!(range.network(), IpAddr::V4(Ipv4Addr::new(103, 21, 244, 0)));
        assert_eq!(range.ip(), range.network());
        assert_eq!(range.prefix(), 22);
    }

    #[test]
    fn parse_invalid() {
        assert!(matches!(parse_cidr("10.0.0.1"), Err(CidrError::MissingPrefix)));
        assert!(matches!(parse_cidr(""), Err(CidrError::MissingPrefix)));
        assert!(matches!(parse_cidr("10.0.0/8"), Err(CidrError::Address(_))));
        assert!(matches!(parse_cidr("/8"), Err(CidrError::Address(_))));
        assert!(matches!(parse_cidr(" 10.0.0.0/8"), Err(CidrError::Address(_))));
        assert!(matches!(parse_cidr("103.21.244.0/33"), Err(CidrError::Prefix)));
        assert!(matches!(parse_cidr("2400:cb00::/129"), Err(CidrError::Prefix)));
        assert!(matches!(parse_cidr("10.0.0.0/"), Err(CidrError::Prefix)));
        assert!(matches!(parse_cidr("10.0.0.0/+8"), Err(CidrError::Prefix)));
        assert!(matches!(parse_cidr("10.0.0.0/8/8"), Err(CidrError::Prefix)));
        assert!(matches!(parse_cidr("10.0.0.0/999"), Err(CidrError::Prefix)));
    }

    #[test]
    fn build_fails_on_first_invalid_entry() {
        let err = TrustedProxies::try_from_cidrs(
            "cf",
            ["10.0.0.0/8", "103.21.244.0/33", "not-a-cidr"],
        )
        .unwrap_err();

        assert_eq!(err.name(), "cf");
        assert_eq!(err.cidr(), "103.21.244.0/33");
        assert!(matches!(err.kind(), CidrError::Prefix));
    }

    #[test]
    fn empty_is_valid() {
        let trusted = TrustedProxies::try_from_cidrs("cf", Vec::<String>::new()).unwrap();
        assert!(trusted.is_empty());
        assert!(!trusted.contains(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }

    #[test]
    fn duplicates_are_harmless() {
        let trusted = TrustedProxies::try_from_cidrs("cf", ["10.0.0.0/8", "10.0.0.0/8"]).unwrap();
        assert_eq!(trusted.ranges().len(), 2);
        assert!(trusted.contains(IpAddr::V4(Ipv4Addr::new(10, 9, 8, 7))));
    }

    #[test]
    fn membership_is_union() {
        let trusted = sample();

        assert!(trusted.contains(IpAddr::V4(Ipv4Addr::new(103, 21, 244, 0))));
        assert!(trusted.contains(IpAddr::V4(Ipv4Addr::new(103, 21, 247, 255))));
        assert!(!trusted.contains(IpAddr::V4(Ipv4Addr::new(103, 21, 248, 0))));
        assert!(!trusted.contains(IpAddr::V4(Ipv4Addr::new(103, 21, 243, 255))));

        assert!(trusted.contains(IpAddr::V6(Ipv6Addr::new(0x2400, 0xcb00, 0, 0, 0, 0, 0, 1))));
        assert!(!trusted.contains(IpAddr::V6(Ipv6Addr::new(0x2400, 0xcb01, 0, 0, 0, 0, 0, 1))));
    }

    #[test]
    fn families_do_not_cross_match() {
        let trusted = TrustedProxies::try_from_cidrs("cf", ["0.0.0.0/0"]).unwrap();
        assert!(!trusted.contains(IpAddr::V6(Ipv6Addr::LOCALHOST)));

        let trusted = TrustedProxies::try_from_cidrs("cf", ["::/0"]).unwrap();
        assert!(!trusted.contains(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }

    #[test]
    fn ipv4_mapped_peer() {
        let mapped = Ipv4Addr::new(103, 21, 244, 23).to_ipv6_mapped();
        assert!(sample().contains(IpAddr::V6(mapped)));
        assert!(sample().is_trusted_peer("[::ffff:103.21.244.23]:443"));
    }

    #[test]
    fn ipv4_mapped_range() {
        let trusted = TrustedProxies::try_from_cidrs("cf", ["::ffff:103.21.244.0/118"]).unwrap();

        assert_eq!(
            trusted.ranges(),
            &["103.21.244.0/22".parse::<IpNetwork>().unwrap()],
        );
        assert!(trusted.is_trusted_peer("103.21.244.23:12345"));
        assert!(trusted.is_trusted_peer("[::ffff:103.21.244.23]:12345"));
        assert!(!trusted.is_trusted_peer("103.21.248.1:12345"));

        let trusted = sample().with_ip_range("::ffff:10.0.0.0/104".parse().unwrap());
        assert!(trusted.is_trusted_peer("10.9.8.7:80"));

        // shorter prefixes cover more than the mapped block and stay IPv6
        let trusted = TrustedProxies::try_from_cidrs("cf", ["::ffff:0.0.0.0/95"]).unwrap();
        assert!(matches!(trusted.ranges()[0], IpNetwork::V6(_)));
    }

    #[test]
    fn with_ip_range() {
        let trusted = sample().with_ip_range("10.0.1.7/24".parse().unwrap());

        assert_eq!(
            trusted.ranges().last().unwrap().ip(),
            IpAddr::V4(Ipv4Addr::new(10, 0, 1, 0)),
        );
        assert!(trusted.is_trusted_peer("10.0.1.20:12345"));
    }

    #[test]
    fn trusted_peers() {
        let trusted = sample();

        assert!(trusted.is_trusted_peer("103.21.244.23:12345"));
        assert!(trusted.is_trusted_peer("103.21.244.1"));
        assert!(trusted.is_trusted_peer("[2400:cb00::1]:443"));
        assert!(trusted.is_trusted_peer("2400:cb00::1"));
    }

    #[test]
    fn untrusted_peers() {
        let trusted = sample();

        assert!(!trusted.is_trusted_peer(""));
        assert!(!trusted.is_trusted_peer("10.0.1.20:12345"));
        assert!(!trusted.is_trusted_peer("this.is.not.an.ip:1234"));
        assert!(!trusted.is_trusted_peer("[2400:cb00::1]"));
        assert!(!trusted.is_trusted_peer("103.21.244.23:1:2"));
    }
}
