use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use rizq_database::impls::duas;
use rizq_database::model::dua::{Category, Dua, DuaWithCategory};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DuaListQuery {
    pub category_id: Option<i64>,
}

pub async fn list_duas(
    State(state): State<AppState>,
    Query(query): Query<DuaListQuery>,
) -> Result<Json<ApiResponse<Vec<Dua>>>, ApiError> {
    let duas = duas::list_duas(&state.db, query.category_id).await?;
    Ok(Json(ApiResponse::success(duas)))
}

pub async fn get_dua(
    State(state): State<AppState>,
    Path(dua_id): Path<i64>,
) -> Result<Json<ApiResponse<DuaWithCategory>>, ApiError> {
    let dua = duas::get_dua(&state.db, dua_id).await?;
    Ok(Json(ApiResponse::success(dua)))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = duas::list_categories(&state.db).await?;
    Ok(Json(ApiResponse::success(categories)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/duas", get(list_duas))
        .route("/duas/{dua_id}", get(get_dua))
        .route("/categories", get(list_categories))
}
