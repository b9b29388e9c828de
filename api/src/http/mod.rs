/// HTTP server module

pub mod extract;
pub mod middleware;
pub mod routes;

use actix_cors::Cors;
use actix_web::{http, web, App, HttpServer};
use std::io;

use crate::app_state::AppState;
use crate::config::{Config, SecurityConfig};
use middleware::{access_log::AccessLog, request_id::RequestId, session_gate::SessionGate};

fn build_cors(config: &SecurityConfig) -> Cors {
    let mut cors = Cors::default().supports_credentials();
    for origin in &config.cors_allowed_origins {
        if origin == "*" {
            // Credentials cannot be combined with a wildcard origin
            cors = Cors::default().allow_any_origin();
            break;
        } else {
            cors = cors.allowed_origin(origin);
        }
    }

    let methods: Vec<http::Method> = config
        .cors_allowed_methods
        .iter()
        .filter_map(|m| m.parse::<http::Method>().ok())
        .collect();
    if !methods.is_empty() {
        cors = cors.allowed_methods(methods);
    }

    if config.cors_allowed_headers.iter().any(|h| h == "*") {
        cors = cors.allow_any_header();
    } else {
        cors = cors.allowed_headers(
            config
                .cors_allowed_headers
                .iter()
                .filter_map(|h| h.parse::<http::header::HeaderName>().ok())
                .collect::<Vec<_>>(),
        );
    }

    cors
}

pub async fn start_server(config: Config, app_state: AppState) -> io::Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(
        service_name = %config.service.name,
        service_version = %config.service.version,
        bind_addr = %bind_addr,
        log_level = %config.telemetry.log_level,
        log_format = %config.telemetry.log_format,
        wallet_enabled = %config.wallet.enabled,
        "Starting HTTP server"
    );

    let app_state = web::Data::new(app_state);
    let request_id_header = config.telemetry.request_id_header.clone();
    let session_gate = SessionGate::new(
        config.session.protect_prefixes.clone(),
        config.session.cookie_name.clone(),
    );
    let security = config.security.clone();
    let body_limit = config.server.request_body_limit_bytes;
    let workers = config.server.workers as usize;

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(body_limit))
            .app_data(web::JsonConfig::default().limit(body_limit))
            .wrap(build_cors(&security))
            .wrap(session_gate.clone())
            .wrap(AccessLog)
            .wrap(RequestId::new(request_id_header.clone()))
            .configure(routes::configure)
    });

    if workers > 0 {
        server = server.workers(workers);
    }

    server.bind(&bind_addr)?.run().await
}
