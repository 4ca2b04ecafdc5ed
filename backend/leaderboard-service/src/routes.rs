//! Route configuration
//!
//! The three read shapes are exposed three times: bare paths serve the
//! optimized (index-backed) path, and explicit `/repository` and
//! `/optimized` prefixes pin a backend so the two can be compared directly.

use actix_web::web;

use crate::handlers;
use crate::metrics;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics::serve_metrics))
        .route("/health", web::get().to(handlers::health_check))
        .route("/health/live", web::get().to(handlers::liveness_check))
        .route("/health/ready", web::get().to(handlers::readiness_check))
        .service(
            web::scope("/leaderboard")
                .route("/write/score", web::post().to(handlers::write_score))
                .route("/top", web::get().to(handlers::optimized_top))
                .route("/rank/{user_id}", web::get().to(handlers::optimized_rank))
                .route(
                    "/around/{user_id}",
                    web::get().to(handlers::optimized_around),
                )
                .service(
                    web::scope("/repository")
                        .route("/top", web::get().to(handlers::repository_top))
                        .route("/rank/{user_id}", web::get().to(handlers::repository_rank))
                        .route(
                            "/around/{user_id}",
                            web::get().to(handlers::repository_around),
                        ),
                )
                .service(
                    web::scope("/optimized")
                        .route("/top", web::get().to(handlers::optimized_top))
                        .route("/rank/{user_id}", web::get().to(handlers::optimized_rank))
                        .route(
                            "/around/{user_id}",
                            web::get().to(handlers::optimized_around),
                        ),
                )
                // Registered last so the dynamic segment cannot shadow the
                // fixed prefixes above.
                .route(
                    "/{instance_id}/user-score",
                    web::post().to(handlers::write_user_score),
                ),
        );
}
