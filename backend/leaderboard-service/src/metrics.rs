//! Prometheus metrics for leaderboard-service.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Reads served, segmented by operation and by which backend answered
    /// (index fast path vs store fallback).
    pub static ref READ_PATH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "leaderboard_read_path_total",
        "Leaderboard reads segmented by operation and serving backend",
        &["operation", "backend"]
    )
    .expect("failed to register leaderboard_read_path_total");

    /// Score writes segmented by outcome (success/error).
    pub static ref WRITE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "leaderboard_write_total",
        "Score writes segmented by outcome",
        &["result"]
    )
    .expect("failed to register leaderboard_write_total");

    /// Index rebuilds segmented by outcome (success/error).
    pub static ref INDEX_REBUILD_TOTAL: IntCounterVec = register_int_counter_vec!(
        "leaderboard_index_rebuild_total",
        "Ranked index rebuilds segmented by outcome",
        &["result"]
    )
    .expect("failed to register leaderboard_index_rebuild_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
