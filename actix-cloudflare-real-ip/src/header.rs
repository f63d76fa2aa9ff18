//! Header names read and written by the middleware.

use actix_web::http::header::HeaderName;

/// Cloudflare's `cf-connecting-ip` header name.
///
/// Carries the original client address as seen by Cloudflare's edge. Only trusted when the
/// connecting peer is one of the configured proxy ranges.
#[allow(clippy::declare_interior_mutable_const)]
pub const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");

/// The de-facto standard `x-forwarded-for` header name.
#[allow(clippy::declare_interior_mutable_const)]
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// The `x-real-ip` header name, as used by nginx and friends.
#[allow(clippy::declare_interior_mutable_const)]
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
