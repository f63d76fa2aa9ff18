use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use serde::Deserialize;

use crate::TrustedProxies;
#[cfg(feature = "fetch-ips")]
use crate::error::FetchError;

/// URL for Cloudflare's canonical list of IP ranges.
pub const CF_URL_IPS: &str = "https://api.cloudflare.com/client/v4/ips";

/// Payload of a successful [`CF_URL_IPS`] response.
#[derive(Debug, Deserialize)]
pub struct CfIpsResult {
    ipv4_cidrs: Vec<Ipv4Network>,
    ipv6_cidrs: Vec<Ipv6Network>,
}

/// Response body of [`CF_URL_IPS`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CfIpsResponse {
    /// Published ranges.
    Success {
        /// Ranges, split by address family.
        result: CfIpsResult,
    },

    /// API-level failure.
    Failure {
        /// Always `false`.
        success: bool,
    },
}

impl CfIpsResponse {
    /// Converts the published ranges into a trusted set.
    ///
    /// Returns `None` for a failure response.
    pub fn into_trusted(self) -> Option<TrustedProxies> {
        let ips = match self {
            CfIpsResponse::Success { result } => result,
            CfIpsResponse::Failure { .. } => return None,
        };

        let trusted = ips
            .ipv4_cidrs
            .into_iter()
            .map(IpNetwork::V4)
            .chain(ips.ipv6_cidrs.into_iter().map(IpNetwork::V6))
            .fold(TrustedProxies::default(), TrustedProxies::with_ip_range);

        Some(trusted)
    }
}

/// Fetches Cloudflare's published edge IP ranges from their API.
///
/// Merge in any locally trusted proxies with [`TrustedProxies::with_ip_range`] before handing the
/// set to [`CloudflareRealIp::from_trusted`](crate::CloudflareRealIp::from_trusted).
#[cfg(feature = "fetch-ips")]
pub async fn fetch_trusted_cf_ips() -> Result<TrustedProxies, FetchError> {
    fn failed(err: impl std::fmt::Display) -> FetchError {
        tracing::error!(url = CF_URL_IPS, %err, "could not load cloudflare IP list");
        FetchError::Fetch
    }

    let mut res = awc::Client::new()
        .get(CF_URL_IPS)
        .send()
        .await
        .map_err(failed)?;

    let body = res.json::<CfIpsResponse>().await.map_err(failed)?;

    let trusted = body.into_trusted().ok_or_else(|| {
        tracing::error!(url = CF_URL_IPS, "cloudflare IP list API reported failure");
        FetchError::Rejected
    })?;

    tracing::debug!(ranges = trusted.ranges().len(), "fetched cloudflare IP list");

    Ok(trusted)
}
