//! API Routes
//!
//! Configures the Axum router for the worker's event surface.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    error_event_handler, fetch_handler, health_handler, message_handler,
    notification_click_handler, notification_close_handler, push_control_handler,
    push_event_handler, stats_handler, AppState,
};

/// Creates the worker router.
///
/// # Endpoints
/// - `POST /message` - navigation messages for the prefetch orchestrator
/// - `POST /push` - push control contract (subscribe/unsubscribe/notify)
/// - `POST /events/push` - push delivery event
/// - `POST /events/notification-click` - notification clicked
/// - `POST /events/notification-close` - notification dismissed
/// - `POST /events/error` - worker error event
/// - `GET /stats` - per-cache statistics
/// - `GET /health` - health check
/// - everything else falls through to classification + strategies
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/message", post(message_handler))
        .route("/push", post(push_control_handler))
        .route("/events/push", post(push_event_handler))
        .route("/events/notification-click", post(notification_click_handler))
        .route("/events/notification-close", post(notification_close_handler))
        .route("/events/error", post(error_event_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .fallback(fetch_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::config::Config;
    use crate::push::LoggingSink;
    use crate::strategy::testing::MockFetcher;

    async fn create_test_app() -> Router {
        let state = AppState::new(
            &Config::default(),
            Arc::new(MockFetcher::new()),
            Arc::new(LoggingSink),
        )
        .await;
        create_router(state)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fallback_serves_passthrough() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
