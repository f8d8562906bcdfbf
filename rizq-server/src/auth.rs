//! Boundary to the external auth service.
//!
//! The OAuth2/OIDC provider is an opaque collaborator: this module only
//! exchanges credentials for a session token, resolves tokens to users, and
//! revokes them. Everything else about the flow belongs to the provider.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rizq_core::{Result, RizqError};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Seam over the external auth service, mockable in tests.
#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    /// Resolve a bearer token. `None` means no live session behind it.
    async fn get_session(&self, token: &str) -> Result<Option<AuthSession>>;
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession>;
    async fn sign_out(&self, token: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
    user: AuthUser,
}

/// Production provider speaking HTTPS to the auth endpoint.
#[derive(Clone, Debug)]
pub struct HttpAuthProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuthProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport_err(e: reqwest::Error) -> RizqError {
    RizqError::server(
        e.status().map(|s| s.as_u16()).unwrap_or(502),
        format!("auth service unreachable: {e}"),
    )
}

async fn reject(response: reqwest::Response, operation: &str) -> RizqError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    RizqError::server(status, format!("auth {operation} failed: {message}"))
}

impl AuthProvider for HttpAuthProvider {
    async fn get_session(&self, token: &str) -> Result<Option<AuthSession>> {
        let response = self
            .client
            .get(self.url("/user"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_err)?;

        match response.status().as_u16() {
            200 => {
                let user: AuthUser = response.json().await.map_err(transport_err)?;
                Ok(Some(AuthSession {
                    user,
                    access_token: token.to_owned(),
                    expires_at: None,
                }))
            }
            // An expired or revoked token is an anonymous caller, not a fault.
            401 | 403 => Ok(None),
            _ => Err(reject(response, "session lookup").await),
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession> {
        let response = self
            .client
            .post(self.url("/token"))
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(transport_err)?;

        match response.status().as_u16() {
            200 => {
                let token: TokenResponse = response.json().await.map_err(transport_err)?;
                Ok(AuthSession {
                    user: token.user,
                    access_token: token.access_token,
                    expires_at: token.expires_at,
                })
            }
            400 | 401 | 403 => Err(RizqError::auth("invalid credentials")),
            _ => Err(reject(response, "sign-in").await),
        }
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_err)?;

        match response.status().as_u16() {
            // A token the provider no longer knows is already signed out.
            200 | 204 | 401 | 403 | 404 => Ok(()),
            _ => Err(reject(response, "sign-out").await),
        }
    }
}

/// Extractor for routes that require a live session.
#[derive(Clone, Debug)]
pub struct AuthedUser {
    pub user: AuthUser,
    pub token: String,
}

pub fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token =
            bearer_token(parts).ok_or_else(|| ApiError(RizqError::auth("missing bearer token")))?;

        let session = state
            .auth
            .get_session(&token)
            .await?
            .ok_or_else(|| ApiError(RizqError::auth("invalid or expired session")))?;

        Ok(Self {
            user: session.user,
            token,
        })
    }
}
