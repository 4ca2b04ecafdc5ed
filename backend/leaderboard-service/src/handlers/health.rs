use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::AppState;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "alive" }))
}

/// Ready when the durable store answers a trivial query.
pub async fn readiness_check(state: web::Data<AppState>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => HttpResponse::Ok().json(json!({ "status": "ready" })),
        Err(e) => HttpResponse::ServiceUnavailable().json(json!({
            "status": "not ready",
            "error": e.to_string(),
        })),
    }
}
