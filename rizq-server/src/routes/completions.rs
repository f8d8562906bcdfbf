use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use rizq_core::RizqError;
use rizq_database::impls::activity;
use rizq_database::model::activity::{CompletionOutcome, DailyActivity};

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub dua_id: i64,
    /// Defaults to today; backfilling the future is rejected.
    pub date: Option<NaiveDate>,
}

pub async fn record_completion(
    State(state): State<AppState>,
    authed: AuthedUser,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<ApiResponse<CompletionOutcome>>, ApiError> {
    let today = Utc::now().date_naive();
    let date = request.date.unwrap_or(today);
    if date > today {
        return Err(RizqError::validation(format!(
            "cannot record a completion for future date {date}"
        ))
        .into());
    }

    let outcome = activity::record_completion(&state.db, authed.user.id, request.dua_id, date).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn today_activity(
    State(state): State<AppState>,
    authed: AuthedUser,
) -> Result<Json<ApiResponse<Option<DailyActivity>>>, ApiError> {
    let today = Utc::now().date_naive();
    let activity = activity::get_activity(&state.db, authed.user.id, today).await?;
    Ok(Json(ApiResponse::success(activity)))
}

pub async fn activity_on(
    State(state): State<AppState>,
    authed: AuthedUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<ApiResponse<Option<DailyActivity>>>, ApiError> {
    let activity = activity::get_activity(&state.db, authed.user.id, date).await?;
    Ok(Json(ApiResponse::success(activity)))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
}

pub async fn recent_activity(
    State(state): State<AppState>,
    authed: AuthedUser,
    Query(query): Query<RecentQuery>,
) -> Result<Json<ApiResponse<Vec<DailyActivity>>>, ApiError> {
    let rows =
        activity::recent_activity(&state.db, authed.user.id, query.limit.unwrap_or(30)).await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/completions", post(record_completion))
        .route("/activity", get(recent_activity))
        .route("/activity/today", get(today_activity))
        .route("/activity/{date}", get(activity_on))
}
