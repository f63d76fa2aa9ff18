use std::net::AddrParseError;

use derive_more::{Display, Error};

/// Reason a single trust list entry was rejected.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum CidrError {
    /// Entry has no `/prefix` part.
    #[display("missing prefix length")]
    MissingPrefix,

    /// Address part is not an IPv4 or IPv6 address.
    #[display("invalid address: {_0}")]
    Address(#[error(source)] AddrParseError),

    /// Prefix part is not a number or exceeds the address family's bit width.
    #[display("invalid prefix length")]
    Prefix,
}

/// Failure to build the trusted proxy set from configuration.
///
/// Fatal at startup; the middleware must not be installed when this is returned.
#[derive(Debug, Display, Error)]
#[display("real IP middleware ({name}): invalid CIDR in trust list {cidr:?}: {kind}")]
pub struct ConfigError {
    name: String,
    cidr: String,
    #[error(source)]
    kind: CidrError,
}

impl ConfigError {
    pub(crate) fn new(name: impl Into<String>, cidr: impl Into<String>, kind: CidrError) -> Self {
        Self {
            name: name.into(),
            cidr: cidr.into(),
            kind,
        }
    }

    /// Name of the middleware instance that failed to build.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The offending trust list entry, verbatim.
    pub fn cidr(&self) -> &str {
        &self.cidr
    }

    /// Why the entry was rejected.
    pub fn kind(&self) -> &CidrError {
        &self.kind
    }
}

/// Failure to fetch Cloudflare's published IP ranges.
#[cfg(feature = "fetch-ips")]
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// Request failed or the response body could not be decoded.
    #[display("failed to fetch")]
    Fetch,

    /// API responded with `success: false`.
    #[display("IP list API reported failure")]
    Rejected,
}
