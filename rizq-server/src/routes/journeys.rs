use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use rizq_database::impls::journeys;
use rizq_database::model::journey::{Journey, JourneyDetail};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub async fn list_journeys(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Journey>>>, ApiError> {
    let journeys = journeys::list_journeys(&state.db).await?;
    Ok(Json(ApiResponse::success(journeys)))
}

pub async fn get_journey(
    State(state): State<AppState>,
    Path(journey_id): Path<i64>,
) -> Result<Json<ApiResponse<JourneyDetail>>, ApiError> {
    let journey = journeys::get_journey(&state.db, journey_id).await?;
    Ok(Json(ApiResponse::success(journey)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/journeys", get(list_journeys))
        .route("/journeys/{journey_id}", get(get_journey))
}
