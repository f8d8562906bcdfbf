use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rizq_core::RizqError;
use tracing::error;

use crate::response::ApiResponse;

/// Wrapper turning the domain taxonomy into HTTP responses. Every failure is
/// scoped to the one request that hit it; there is no fatal path here.
#[derive(Debug)]
pub struct ApiError(pub RizqError);

impl From<RizqError> for ApiError {
    fn from(err: RizqError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RizqError::NotFound { .. } => StatusCode::NOT_FOUND,
            RizqError::Validation(_) => StatusCode::BAD_REQUEST,
            RizqError::Auth(_) => StatusCode::UNAUTHORIZED,
            RizqError::Server { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            RizqError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body: ApiResponse<()> = ApiResponse::error(self.0.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use rizq_core::RizqError;

    use super::ApiError;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (RizqError::not_found("dua"), StatusCode::NOT_FOUND),
            (RizqError::validation("bad"), StatusCode::BAD_REQUEST),
            (RizqError::auth("no session"), StatusCode::UNAUTHORIZED),
            (RizqError::server(503, "down"), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn out_of_range_status_falls_back_to_500() {
        let response = ApiError(RizqError::server(0, "weird")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
