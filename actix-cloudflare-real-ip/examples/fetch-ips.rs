//! Builds the middleware from Cloudflare's published ranges plus a local proxy range.
//!
//! Start the server and query it through a proxy in `10.0.0.0/8`, or read the trust decisions
//! printed at startup.

use std::io;

use actix_cloudflare_real_ip::{fetch_trusted_cf_ips, CloudflareRealIp};
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpServer};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let trusted = fetch_trusted_cf_ips()
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?
        .with_ip_range("10.0.0.0/8".parse().map_err(|err| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("{err}"))
        })?);

    let real_ip = CloudflareRealIp::from_trusted(trusted, "cloudflare");

    for peer in ["103.21.244.23:443", "[2400:cb00::1]:443", "10.1.2.3:80", "192.0.2.1:80"] {
        tracing::info!(peer, trusted = real_ip.trusted().is_trusted_peer(peer), "trust decision");
    }

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%{r}a %r %s"))
            .wrap(real_ip.clone())
            .default_service(web::to(|req: HttpRequest| async move {
                let conn_info = req.connection_info();
                format!("client: {}\n", conn_info.realip_remote_addr().unwrap_or("-"))
            }))
    })
    .bind(("127.0.0.1", 8080))?
    .workers(2)
    .run()
    .await
}
