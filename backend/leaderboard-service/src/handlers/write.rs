use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::error::Result;
use crate::scoring;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWriteRequest {
    pub leaderboard_instance_id: String,
    pub user_id: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureWriteRequest {
    pub user_id: String,
    #[serde(default)]
    pub features: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ScoreWriteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// POST /leaderboard/write/score — write a raw score.
pub async fn write_score(
    state: web::Data<AppState>,
    body: web::Json<ScoreWriteRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();

    state
        .coordinator
        .write_score(&req.leaderboard_instance_id, &req.user_id, req.score)
        .await?;

    Ok(HttpResponse::Ok().json(ScoreWriteResponse {
        success: true,
        score: None,
    }))
}

/// POST /leaderboard/{instanceId}/user-score — compute a score from the
/// submitted feature vector, then write it.
pub async fn write_user_score(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<FeatureWriteRequest>,
) -> Result<HttpResponse> {
    let instance_id = path.into_inner();
    let req = body.into_inner();

    let strategy = state.strategies.strategy_for(&instance_id);
    let score = scoring::compute(strategy, &req.features)?;

    debug!(
        instance_id = %instance_id,
        user_id = %req.user_id,
        score,
        "computed score from features"
    );

    state
        .coordinator
        .write_score(&instance_id, &req.user_id, score)
        .await?;

    Ok(HttpResponse::Ok().json(ScoreWriteResponse {
        success: true,
        score: Some(score),
    }))
}
