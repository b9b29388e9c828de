/// Health, readiness, version and API description routes
use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::HashMap;

use crate::app_state::AppState;
use crate::infra::postgres;

#[derive(Serialize)]
struct VersionResponse {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    checks: HashMap<String, CheckResult>,
}

#[derive(Serialize)]
struct CheckResult {
    enabled: bool,
    ok: bool,
    details: String,
}

pub async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn readyz(state: web::Data<AppState>) -> impl Responder {
    let mut checks = HashMap::new();

    let postgres = match &state.postgres {
        Some(pool) => match postgres::check_postgres_health(pool).await {
            Ok(()) => CheckResult {
                enabled: true,
                ok: true,
                details: "healthy".to_string(),
            },
            Err(e) => CheckResult {
                enabled: true,
                ok: false,
                details: e,
            },
        },
        None => CheckResult {
            enabled: false,
            ok: true,
            details: "disabled".to_string(),
        },
    };
    checks.insert("postgres".to_string(), postgres);

    let ready = checks.values().all(|c| c.ok);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    HttpResponse::build(status).json(ReadyResponse { ready, checks })
}

pub async fn version(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(VersionResponse {
        name: state.service_config.name.clone(),
        version: state.service_config.version.clone(),
    })
}

pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(crate::openapi::generate_openapi_spec())
}
