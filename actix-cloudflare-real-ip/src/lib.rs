//! Middleware that restores the real client IP for requests proxied through Cloudflare.
//!
//! When a request arrives from a trusted proxy range, the client address asserted in its
//! `cf-connecting-ip` header is copied over `x-forwarded-for` and `x-real-ip`. Requests from any
//! other peer are passed on untouched, so clients connecting directly cannot spoof their address.
//!
//! # Examples
//! ```no_run
//! use actix_cloudflare_real_ip::{CloudflareRealIp, RealIpConfig};
//! use actix_web::{App, HttpServer};
//!
//! # async fn run() -> std::io::Result<()> {
//! let config: RealIpConfig = serde_json::from_str(r#"{ "trustip": ["103.21.244.0/22"] }"#)?;
//! let real_ip = CloudflareRealIp::new(&config, "cloudflare")
//!     .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;
//!
//! HttpServer::new(move || App::new().wrap(real_ip.clone()))
//!     .bind(("127.0.0.1", 8080))?
//!     .run()
//!     .await
//! # }
//! ```
//!
//! # Crate Features
//!
//! `fetch-ips` (default): Enables functionality to (asynchronously) fetch Cloudflare's trusted IP
//! list from their API. This feature includes `rustls` but if you prefer OpenSSL you can use it by
//! disabling default crate features and enabling `fetch-ips-openssl` instead.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod config;
mod error;
mod fetch;
pub mod header;
mod middleware;
mod peer;
mod trusted;

#[cfg(feature = "fetch-ips")]
pub use self::{error::FetchError, fetch::fetch_trusted_cf_ips};
pub use self::{
    config::RealIpConfig,
    error::{CidrError, ConfigError},
    fetch::{CfIpsResponse, CfIpsResult, CF_URL_IPS},
    middleware::{CloudflareRealIp, CloudflareRealIpMiddleware},
    peer::parse_peer_ip,
    trusted::TrustedProxies,
};
