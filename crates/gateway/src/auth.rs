//! Bearer-token authentication for the administrative API.

use {
    axum::{
        extract::{Request, State},
        http::{StatusCode, header::AUTHORIZATION},
        middleware::Next,
        response::{IntoResponse, Json, Response},
    },
    secrecy::ExposeSecret,
    tracing::warn,
};

use crate::server::AppState;

/// Middleware protecting mutating routes.
///
/// When no secret is configured every request passes (the server warns at
/// startup). Otherwise a missing or malformed `Authorization` header is a
/// 401 and a wrong key is a 403.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ref secret) = state.secret else {
        return next.run(request).await;
    };

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let Some(token) = header.strip_prefix("Bearer ") else {
        warn!(path = %request.uri().path(), "rejected request without bearer token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "missing bearer token" })),
        )
            .into_response();
    };

    if token.trim() != secret.expose_secret() {
        warn!(path = %request.uri().path(), "rejected request with invalid API key");
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "invalid API key" })),
        )
            .into_response();
    }

    next.run(request).await
}
