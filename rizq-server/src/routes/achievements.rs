use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use rizq_database::impls::achievements;
use rizq_database::model::achievement::{Achievement, UnlockOutcome, UserAchievement};

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub async fn list_achievements(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Achievement>>>, ApiError> {
    let achievements = achievements::list_achievements(&state.db).await?;
    Ok(Json(ApiResponse::success(achievements)))
}

pub async fn my_achievements(
    State(state): State<AppState>,
    authed: AuthedUser,
) -> Result<Json<ApiResponse<Vec<UserAchievement>>>, ApiError> {
    let unlocked = achievements::list_user_achievements(&state.db, authed.user.id).await?;
    Ok(Json(ApiResponse::success(unlocked)))
}

pub async fn unlock_achievement(
    State(state): State<AppState>,
    authed: AuthedUser,
    Path(achievement_id): Path<i64>,
) -> Result<Json<ApiResponse<UnlockOutcome>>, ApiError> {
    let outcome =
        achievements::unlock_achievement(&state.db, authed.user.id, achievement_id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/achievements", get(list_achievements))
        .route("/achievements/mine", get(my_achievements))
        .route("/achievements/{achievement_id}/unlock", post(unlock_achievement))
}
