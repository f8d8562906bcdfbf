use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use rizq_core::progression::{self, StreakStatus, XpProgress};
use rizq_database::impls::profiles;
use rizq_database::model::profile::Profile;

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Profile plus the derived numbers the home screen renders. `profile` is
/// null for an authenticated user whose record has not been created yet;
/// the client shows the degraded view and retries.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: Option<Profile>,
    pub progress: Option<XpProgress>,
    pub streak: Option<StreakStatus>,
}

pub async fn get_profile(
    State(state): State<AppState>,
    authed: AuthedUser,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    let profile = profiles::get_profile(&state.db, authed.user.id).await?;

    let view = match profile {
        Some(profile) => {
            let today = Utc::now().date_naive();
            let progress = progression::xp_progress(profile.total_xp)?;
            let streak =
                progression::streak_status(profile.last_active_date, profile.streak, today);
            ProfileView {
                profile: Some(profile),
                progress: Some(progress),
                streak: Some(streak),
            }
        }
        None => ProfileView {
            profile: None,
            progress: None,
            streak: None,
        },
    };

    Ok(Json(ApiResponse::success(view)))
}

#[derive(Debug, Deserialize)]
pub struct DisplayNameUpdate {
    pub display_name: String,
}

pub async fn update_display_name(
    State(state): State<AppState>,
    authed: AuthedUser,
    Json(update): Json<DisplayNameUpdate>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile =
        profiles::set_display_name(&state.db, authed.user.id, &update.display_name).await?;
    Ok(Json(ApiResponse::success(profile)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/display-name", put(update_display_name))
}
