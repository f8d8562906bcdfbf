use axum::extract::State;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use rizq_database::impls::profiles;
use rizq_database::model::profile::Profile;

use crate::auth::{AuthProvider, AuthUser, Credentials, bearer_token};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::session::{SessionContext, SessionState};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionView {
    Anonymous,
    Authenticated {
        user: AuthUser,
        profile: Option<Profile>,
        #[serde(skip_serializing_if = "Option::is_none")]
        access_token: Option<String>,
    },
}

fn view_of(state: &SessionState, token: Option<&str>) -> SessionView {
    match state {
        SessionState::Authenticated { user, profile } => SessionView::Authenticated {
            user: user.clone(),
            profile: profile.clone(),
            access_token: token.map(str::to_owned),
        },
        _ => SessionView::Anonymous,
    }
}

/// Exchange credentials for a session. The profile is created on first
/// sign-in and refreshed with the provider's display name afterwards.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<ApiResponse<SessionView>>, ApiError> {
    let db = state.db.clone();
    let mut session = SessionContext::new(state.auth.clone());

    session
        .sign_in(&credentials, |user: AuthUser| {
            let db = db.clone();
            async move {
                profiles::ensure_profile(&db, user.id, user.display_name.as_deref())
                    .await
                    .map(Some)
            }
        })
        .await?;

    let view = view_of(session.state(), session.token());
    Ok(Json(ApiResponse::success(view)))
}

/// Resolve the caller's bearer token into the current session state. An
/// absent or dead token is an anonymous session, not an error.
pub async fn current_session(
    State(state): State<AppState>,
    parts: Parts,
) -> Result<Json<ApiResponse<SessionView>>, ApiError> {
    let Some(token) = bearer_token(&parts) else {
        return Ok(Json(ApiResponse::success(SessionView::Anonymous)));
    };

    let db = state.db.clone();
    let mut session = SessionContext::new(state.auth.clone());
    session
        .resume(&token, |user: AuthUser| {
            let db = db.clone();
            async move { profiles::get_profile(&db, user.id).await }
        })
        .await?;

    // The caller already holds the token; no need to echo it back.
    let view = view_of(session.state(), None);
    Ok(Json(ApiResponse::success(view)))
}

pub async fn sign_out(
    State(state): State<AppState>,
    parts: Parts,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if let Some(token) = bearer_token(&parts) {
        state.auth.sign_out(&token).await?;
    }
    Ok(Json(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/signin", post(sign_in))
            .route("/signout", post(sign_out))
            .route("/session", get(current_session)),
    )
}
