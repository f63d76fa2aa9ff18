//! For middleware documentation, see [`CloudflareRealIp`].

use std::{
    future::{ready, Ready},
    sync::Arc,
};

use actix_web::{
    dev::{forward_ready, ConnectionInfo, Service, ServiceRequest, Transform},
    HttpMessage as _,
};

use crate::{
    header::{CF_CONNECTING_IP, X_FORWARDED_FOR, X_REAL_IP},
    ConfigError, RealIpConfig, TrustedProxies,
};

/// Middleware that replaces client IP headers with Cloudflare's `cf-connecting-ip` value when
/// the connecting peer is a trusted proxy.
///
/// Trust is decided solely by the transport-level peer address. For trusted peers carrying a
/// non-empty `cf-connecting-ip` header, both `x-forwarded-for` and `x-real-ip` are overwritten
/// with that value; any previous values are discarded. Requests from other peers pass through
/// untouched. Every request is forwarded to the wrapped service exactly once.
///
/// # Examples
/// ```
/// use actix_cloudflare_real_ip::{CloudflareRealIp, RealIpConfig};
/// use actix_web::App;
///
/// let config = RealIpConfig::new()
///     .with_trusted("173.245.48.0/20")
///     .with_trusted("103.21.244.0/22");
///
/// let real_ip = CloudflareRealIp::new(&config, "cloudflare").unwrap();
/// let app = App::new().wrap(real_ip);
/// ```
#[derive(Debug, Clone)]
pub struct CloudflareRealIp {
    trusted: Arc<TrustedProxies>,
    name: Arc<str>,
}

impl CloudflareRealIp {
    /// Builds the middleware from configuration.
    ///
    /// `name` identifies this instance in errors and logs. Fails if any trust list entry is not a
    /// valid CIDR range. An empty trust list is accepted but logged, since such an instance never
    /// rewrites anything.
    pub fn new(config: &RealIpConfig, name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        let trusted = TrustedProxies::try_from_cidrs(&name, &config.trust_ip)?;
        Ok(Self::from_trusted(trusted, name))
    }

    /// Builds the middleware from an already constructed trusted set.
    pub fn from_trusted(trusted: TrustedProxies, name: impl Into<String>) -> Self {
        let name = Arc::<str>::from(name.into());

        if trusted.is_empty() {
            tracing::warn!(
                name = %name,
                "trust list is empty; client IP headers will never be rewritten"
            );
        } else {
            tracing::debug!(name = %name, ranges = trusted.ranges().len(), "trust list loaded");
        }

        Self {
            trusted: Arc::new(trusted),
            name,
        }
    }

    /// Trusted proxy ranges.
    pub fn trusted(&self) -> &TrustedProxies {
        &self.trusted
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S> Transform<S, ServiceRequest> for CloudflareRealIp
where
    S: Service<ServiceRequest>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Transform = CloudflareRealIpMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CloudflareRealIpMiddleware {
            service,
            trusted: Arc::clone(&self.trusted),
            name: Arc::clone(&self.name),
        }))
    }
}

/// Service produced by [`CloudflareRealIp`].
#[derive(Debug)]
pub struct CloudflareRealIpMiddleware<S> {
    service: S,
    trusted: Arc<TrustedProxies>,
    name: Arc<str>,
}

impl<S> CloudflareRealIpMiddleware<S> {
    fn rewrite(&self, req: &mut ServiceRequest) {
        // the socket address is already parsed; string peers go through `is_trusted_peer`
        let trusted = match req.peer_addr() {
            Some(peer) => self.trusted.contains(peer.ip()),
            None => false,
        };

        if !trusted {
            tracing::debug!(name = %self.name, peer = ?req.peer_addr(), "peer not trusted");
            return;
        }

        let client_ip = match req.headers().get(CF_CONNECTING_IP) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                tracing::debug!(
                    name = %self.name,
                    peer = ?req.peer_addr(),
                    "trusted peer sent no cf-connecting-ip; headers left as-is"
                );
                return;
            }
        };

        tracing::debug!(
            name = %self.name,
            peer = ?req.peer_addr(),
            client_ip = ?client_ip,
            "rewriting client IP headers"
        );

        let headers = req.headers_mut();
        headers.insert(X_FORWARDED_FOR, client_ip.clone());
        headers.insert(X_REAL_IP, client_ip);

        // connection info caches forwarded headers; recompute it downstream
        req.extensions_mut().remove::<ConnectionInfo>();
    }
}

impl<S> Service<ServiceRequest> for CloudflareRealIpMiddleware<S>
where
    S: Service<ServiceRequest>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        self.rewrite(&mut req);
        self.service.call(req)
    }
}
