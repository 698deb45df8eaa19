use {
    axum::{
        Router,
        extract::{State, rejection::JsonRejection},
        http::StatusCode,
        middleware,
        response::{IntoResponse, Json, Response},
        routing::{get, post},
    },
    secrecy::Secret,
    serde::Deserialize,
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use opencord_discord::{Error as DiscordError, SharedBotState, run_trigger};

use crate::auth;

#[derive(Clone)]
pub struct AppState {
    pub bot: SharedBotState,
    /// Bearer token for `/api/trigger`; `None` disables auth.
    pub secret: Option<Secret<String>>,
}

/// Assemble the API router. The auth layer covers every route registered
/// before it; the health probe is added after and stays public.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/trigger", post(trigger))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ))
        .route("/api/health", get(health))
        .with_state(state)
}

/// Bind and serve the API until `shutdown` fires.
pub async fn serve(
    state: AppState,
    bind: &str,
    port: u16,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    if state.secret.is_none() {
        warn!(
            "API server started without a secret key; all requests are accepted. \
             Set api.secret_key for production use."
        );
    }

    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "API server listening");

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

#[derive(Debug, Deserialize)]
struct TriggerRequest {
    #[serde(default)]
    channel_name: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    category: Option<String>,
}

async fn trigger(
    State(state): State<AppState>,
    body: Result<Json<TriggerRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "trigger rejected: invalid body");
            return error_response(StatusCode::BAD_REQUEST, "invalid JSON body");
        },
    };

    if request.channel_name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "'channel_name' (string) is required");
    }
    if request.prompt.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "'prompt' (string) is required");
    }

    info!(
        channel_name = %request.channel_name,
        category = ?request.category,
        preview = %request.prompt.chars().take(80).collect::<String>(),
        "API trigger"
    );

    match run_trigger(
        &state.bot,
        &request.channel_name,
        &request.prompt,
        request.category.as_deref(),
    )
    .await
    {
        Ok(outcome) => {
            info!(
                channel_id = outcome.channel_id,
                session_id = %outcome.session_id,
                partial_error = outcome.error.is_some(),
                "trigger completed"
            );
            (StatusCode::OK, Json(outcome)).into_response()
        },
        Err(e @ (DiscordError::NotReady | DiscordError::NoGuildAvailable)) => {
            warn!(error = %e, "trigger rejected: not ready");
            error_response(StatusCode::SERVICE_UNAVAILABLE, &e.to_string())
        },
        Err(e) => {
            error!(error = %e, "trigger failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("internal error: {e}"))
        },
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        axum::{body::Body, http::Request},
        opencord_backend::{OpencodeClient, ServerSettings},
        opencord_discord::{BotState, DiscordSettings},
        std::sync::Arc,
        tower::ServiceExt,
    };

    fn app(secret: Option<&str>) -> Router {
        let backend = OpencodeClient::new(&ServerSettings::default()).unwrap();
        let state = AppState {
            bot: Arc::new(BotState::new(DiscordSettings::default(), backend)),
            secret: secret.map(|s| Secret::new(s.to_string())),
        };
        build_router(state)
    }

    fn trigger_request(auth_header: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/trigger")
            .header("content-type", "application/json");
        if let Some(value) = auth_header {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app(Some("sekrit"))
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn trigger_without_auth_is_401() {
        let response = app(Some("sekrit"))
            .oneshot(trigger_request(None, r#"{"channel_name":"demo","prompt":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn trigger_with_wrong_key_is_403() {
        let response = app(Some("sekrit"))
            .oneshot(trigger_request(
                Some("Bearer wrong"),
                r#"{"channel_name":"demo","prompt":"hi"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn trigger_with_invalid_body_is_400() {
        let response = app(Some("sekrit"))
            .oneshot(trigger_request(Some("Bearer sekrit"), "not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn trigger_with_missing_fields_is_400() {
        let response = app(Some("sekrit"))
            .oneshot(trigger_request(Some("Bearer sekrit"), r#"{"prompt":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("channel_name"));
    }

    #[tokio::test]
    async fn trigger_before_discord_ready_is_503() {
        let response = app(Some("sekrit"))
            .oneshot(trigger_request(
                Some("Bearer sekrit"),
                r#"{"channel_name":"demo","prompt":"hi"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn trigger_without_configured_secret_passes_auth() {
        // Still 503 (bot not ready), proving the request got past auth.
        let response = app(None)
            .oneshot(trigger_request(None, r#"{"channel_name":"demo","prompt":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
