//! Listener lifecycle: bind, serve, shut down.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;
use crate::handlers::{self, RequestLimits};
use crate::inference::InferenceAdapter;
use crate::store::ModelArtifacts;

/// Routes and shared state, separate from `run` so tests can mount them.
///
/// CORS only guards the JSON endpoint; the HTML form posts are simple
/// requests and must work behind proxies that rewrite `Host`.
pub fn configure(
    cfg: &mut web::ServiceConfig,
    adapter: InferenceAdapter,
    limits: RequestLimits,
    form_limit: usize,
    allowed_origins: &[String],
) {
    cfg.app_data(web::Data::new(adapter))
        .app_data(web::Data::new(limits))
        .app_data(
            web::FormConfig::default()
                .limit(form_limit)
                .error_handler(handlers::form_error),
        )
        .service(web::resource("/").route(web::get().to(handlers::home)))
        .service(web::resource("/predict").route(web::post().to(handlers::predict)))
        .service(
            web::resource("/health")
                .route(web::get().to(handlers::health))
                .wrap(cors(allowed_origins)),
        );
}

/// Permissive unless origins are configured.
fn cors(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();
    }
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET"])
        .max_age(3600)
}

/// Binds the listener and serves until SIGINT/SIGTERM.
///
/// Takes already-loaded artifacts so a bad model never reaches `bind`.
pub async fn run(config: ServerConfig, models: Arc<ModelArtifacts>) -> std::io::Result<()> {
    let adapter = InferenceAdapter::new(models, config.max_message_chars);
    let limits = RequestLimits {
        inference_timeout: config.request_timeout(),
    };
    // Worst case every char is a 4-byte percent-encoded sequence
    let form_limit = config.max_message_chars.saturating_mul(12).saturating_add(1024);
    let origins = config.allowed_origins.clone();

    let mut server = HttpServer::new(move || {
        let adapter = adapter.clone();
        App::new()
            .wrap(middleware::Logger::default())
            .configure(|cfg| configure(cfg, adapter, limits, form_limit, &origins))
    })
    .shutdown_timeout(config.shutdown_timeout_secs);

    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    let (host, port) = config.bind_addr();
    let server = server.bind((host.as_str(), port))?;
    for addr in server.addrs() {
        info!("Server running at http://{}", addr);
    }

    server.run().await?;
    info!("Server shutdown complete");
    Ok(())
}
