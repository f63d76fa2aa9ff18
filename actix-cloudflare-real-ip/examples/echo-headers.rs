//! Echoes client IP headers after they pass through the middleware.
//!
//! Loopback is trusted so the rewrite can be tried locally:
//!
//! ```sh
//! curl -H 'cf-connecting-ip: 1.2.3.4' -H 'x-forwarded-for: 6.6.6.6' http://127.0.0.1:8080/
//! ```

use actix_cloudflare_real_ip::{
    header::{X_FORWARDED_FOR, X_REAL_IP},
    CloudflareRealIp, RealIpConfig,
};
use actix_web::{
    get, http::header::HeaderName, middleware::Logger, App, HttpRequest, HttpServer, Responder,
};

#[get("/")]
async fn echo(req: HttpRequest) -> impl Responder {
    let hdr = |name: HeaderName| {
        req.headers()
            .get(&name)
            .and_then(|val| val.to_str().ok())
            .unwrap_or("-")
            .to_owned()
    };

    format!(
        "x-forwarded-for: {}\nx-real-ip: {}\n",
        hdr(X_FORWARDED_FOR),
        hdr(X_REAL_IP),
    )
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config: RealIpConfig = serde_json::from_str(
        r#"{ "trustip": ["127.0.0.0/8", "::1/128", "173.245.48.0/20", "103.21.244.0/22"] }"#,
    )?;

    let real_ip = CloudflareRealIp::new(&config, "echo-headers")
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;

    HttpServer::new(move || {
        App::new()
            // logger sits inside so it reports the rewritten client address
            .wrap(Logger::default())
            .wrap(real_ip.clone())
            .service(echo)
    })
    .bind(("127.0.0.1", 8080))?
    .workers(2)
    .run()
    .await
}
