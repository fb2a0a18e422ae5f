use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

use crate::{api::RqState, observability::HealthStatus, RqDbPool};

/// Health check endpoint for load balancers
#[get("")]
pub async fn health_check(pool: RqDbPool) -> impl Responder {
    match pool.get() {
        Ok(_) => HttpResponse::Ok().json(json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

/// Readiness with database and cache details.
#[get("/ready")]
pub async fn readiness_check(pool: RqDbPool, state: RqState) -> impl Responder {
    let status = HealthStatus::check(&state.uptime, &pool, state.cache_snapshots());
    if status.is_healthy() {
        HttpResponse::Ok().json(status)
    } else {
        HttpResponse::ServiceUnavailable().json(status)
    }
}

#[get("/live")]
pub async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn routes() -> actix_web::Scope {
    web::scope("/health")
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check)
}
