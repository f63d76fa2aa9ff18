use serde::{Deserialize, Serialize};

/// Deserializable configuration for [`CloudflareRealIp`](crate::CloudflareRealIp).
///
/// The host application owns the file format; this type only fixes the field names.
///
/// # Examples
/// ```
/// use actix_cloudflare_real_ip::RealIpConfig;
///
/// let config = RealIpConfig::new()
///     .with_trusted("173.245.48.0/20")
///     .with_trusted("2400:cb00::/32");
///
/// assert_eq!(config.trust_ip.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealIpConfig {
    /// CIDR ranges of peers allowed to assert the client IP.
    #[serde(rename = "trustip", default, skip_serializing_if = "Vec::is_empty")]
    pub trust_ip: Vec<String>,
}

impl RealIpConfig {
    /// Constructs an empty configuration, which trusts no peer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a CIDR range to the trust list.
    pub fn with_trusted(mut self, cidr: impl Into<String>) -> Self {
        self.trust_ip.push(cidr.into());
        self
    }
}
