use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopQueryParams {
    pub instance_id: String,
    #[serde(default = "default_top_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankQueryParams {
    pub instance_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AroundQueryParams {
    pub instance_id: String,
    #[serde(default = "default_around_limit")]
    pub limit: i64,
}

fn default_top_limit() -> i64 {
    10
}

fn default_around_limit() -> i64 {
    5
}

impl TopQueryParams {
    fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

impl AroundQueryParams {
    /// `limit` is the total window size; the window extends `(limit - 1) / 2`
    /// ranks to each side of the user.
    fn radius(&self) -> i64 {
        (self.limit.clamp(1, 100) - 1) / 2
    }
}

// Optimized path: ranked index via the query engine, store fallback.

pub async fn optimized_top(
    state: web::Data<AppState>,
    query: web::Query<TopQueryParams>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.clamped();
    let entries = state.queries.top_n(&query.instance_id, limit, offset).await?;
    Ok(HttpResponse::Ok().json(entries))
}

pub async fn optimized_rank(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RankQueryParams>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let entry = state.queries.rank_of(&query.instance_id, &user_id).await?;
    Ok(HttpResponse::Ok().json(entry))
}

pub async fn optimized_around(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<AroundQueryParams>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let entries = state
        .queries
        .around(&query.instance_id, &user_id, query.radius())
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

// Repository path: rank computed directly from the durable store.

pub async fn repository_top(
    state: web::Data<AppState>,
    query: web::Query<TopQueryParams>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.clamped();
    let entries = state.store.top_n(&query.instance_id, limit, offset).await?;
    Ok(HttpResponse::Ok().json(entries))
}

pub async fn repository_rank(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RankQueryParams>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let entry = state
        .store
        .rank_of(&query.instance_id, &user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "user '{}' has no score in leaderboard '{}'",
                user_id, query.instance_id
            ))
        })?;
    Ok(HttpResponse::Ok().json(entry))
}

pub async fn repository_around(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<AroundQueryParams>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let entries = state
        .store
        .around(&query.instance_id, &user_id, query.radius())
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "user '{}' has no score in leaderboard '{}'",
                user_id, query.instance_id
            ))
        })?;
    Ok(HttpResponse::Ok().json(entries))
}
