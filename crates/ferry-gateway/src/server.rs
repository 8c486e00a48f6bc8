// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::time::Instant;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use ferry_config::GatewayConfig;
use ferry_core::FerryError;
use ferry_queue::QueueStore;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The queue store shared with the processor and adapters.
    pub store: QueueStore,
    /// Process start time for uptime reporting.
    pub started: Instant,
}

impl GatewayState {
    pub fn new(store: QueueStore) -> Self {
        Self {
            store,
            started: Instant::now(),
        }
    }
}

/// Builds the webhook router.
///
/// Permissive CORS is intentional: the webhook is an open ingress for
/// local tooling, and auth is out of scope for this surface. The body
/// limit bounds memory use; oversized bodies are rejected before the
/// handler runs.
pub fn router(state: GatewayState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/webhook/message", post(handlers::post_message))
        .route("/webhook/health", get(handlers::get_health))
        .route("/webhook/status/{message_id}", get(handlers::get_status))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(preflight_no_content))
        .with_state(state)
}

/// CORS preflight answers with 204 No Content. `CorsLayer` responds 200,
/// so the status is rewritten on its way out, headers intact.
async fn preflight_no_content(req: Request, next: Next) -> Response {
    let is_options = req.method() == Method::OPTIONS;
    let mut response = next.run(req).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// Binds and serves the webhook API until the token is cancelled.
pub async fn serve(
    config: &GatewayConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), FerryError> {
    let app = router(state, config.max_body_bytes);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FerryError::Channel {
            message: format!("failed to bind webhook listener to {addr}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("webhook listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| FerryError::Channel {
            message: "webhook server error".to_string(),
            source: Some(Box::new(e)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn state_is_clone() {
        let dir = tempdir().unwrap();
        let state = GatewayState::new(QueueStore::open(dir.path()).unwrap());
        let _cloned = state.clone();
    }

    #[test]
    fn router_builds() {
        let dir = tempdir().unwrap();
        let state = GatewayState::new(QueueStore::open(dir.path()).unwrap());
        let _app = router(state, 1024 * 1024);
    }

    #[tokio::test]
    async fn cors_preflight_answers_no_content() {
        use axum::body::Body;
        use axum::http::Request as HttpRequest;
        use tower::ServiceExt;

        let dir = tempdir().unwrap();
        let state = GatewayState::new(QueueStore::open(dir.path()).unwrap());
        let app = router(state, 1024);

        let request = HttpRequest::builder()
            .method(Method::OPTIONS)
            .uri("/webhook/message")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key("access-control-allow-origin"));
    }
}
