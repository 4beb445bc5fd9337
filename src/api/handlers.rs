//! API Handlers
//!
//! The worker's event surface: the fallback fetch handler that classifies
//! and routes requests, the navigation message endpoint, the push control
//! contract, push lifecycle event endpoints, stats and health.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{CacheOptions, CacheRegistry, StrategyHint, Ttl};
use crate::classify::{RequestClassifier, RequestKind};
use crate::config::Config;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::models::{
    ErrorEvent, MatchOptions, Notification, PushControlKind, PushControlMessage, PushMessage,
    WorkerRequest, WorkerResponse,
};
use crate::navigation::NavigationHandler;
use crate::push::{
    AnalyticsPlugin, LoggingSink, NotificationSink, PluginPipeline, PushLifecycle,
};
use crate::strategy::{CacheFirst, NetworkFirst, Strategy};

// == App State ==
/// Everything the handlers need, wired once at startup. The registry is
/// constructed here and injected; nothing reaches for it globally.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CacheRegistry>,
    pub classifier: RequestClassifier,
    pub asset_strategy: Arc<CacheFirst>,
    pub data_strategy: Arc<NetworkFirst>,
    pub navigation: Arc<NavigationHandler>,
    pub push: Arc<PushLifecycle>,
    pub fetcher: Arc<dyn Fetcher>,
    upstream_origin: String,
}

impl AppState {
    /// Wires the worker around the given fetch primitive and notification
    /// sink.
    pub async fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let registry = Arc::new(CacheRegistry::new());

        let data_cache = registry
            .open(
                &config.data_cache,
                Some(CacheOptions {
                    ttl: Ttl::from_secs(config.data_ttl),
                    max_items: config.max_items,
                    strategy: StrategyHint::NetworkFirst,
                }),
            )
            .await;
        // Document and asset caches run on defaults, like the data-less
        // opens in the client setup
        let asset_cache = registry.open(&config.asset_cache, None).await;
        registry.open(&config.document_cache, None).await;

        let asset_strategy = Arc::new(
            CacheFirst::new(asset_cache, fetcher.clone()).with_match_options(MatchOptions {
                ignore_search: true,
                ignore_vary: true,
            }),
        );
        let data_strategy = Arc::new(
            NetworkFirst::new(data_cache, fetcher.clone())
                .with_timeout(Duration::from_secs(config.network_timeout)),
        );
        let navigation = Arc::new(NavigationHandler::new(
            registry.clone(),
            &config.document_cache,
            &config.data_cache,
            fetcher.clone(),
        ));
        let pipeline = PluginPipeline::new(vec![Arc::new(AnalyticsPlugin::default())]);
        let push = Arc::new(PushLifecycle::new(pipeline, sink));

        Self {
            registry,
            classifier: RequestClassifier::new(config.asset_prefixes.clone()),
            asset_strategy,
            data_strategy,
            navigation,
            push,
            fetcher,
            upstream_origin: config.upstream_origin.clone(),
        }
    }

    /// Production wiring: reqwest fetcher against the configured upstream.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.upstream_origin)?);
        Ok(Self::new(config, fetcher, Arc::new(LoggingSink)).await)
    }

    /// Absolute URL for an inbound request URI.
    fn absolute_url(&self, uri: &str) -> String {
        if uri.starts_with("http") {
            uri.to_string()
        } else {
            format!("{}{}", self.upstream_origin.trim_end_matches('/'), uri)
        }
    }
}

// == Fetch Handler ==
/// Fallback handler for every request no dedicated route claims.
///
/// Assets go through cache-first, loader requests through network-first,
/// everything else passes through to the upstream untouched.
pub async fn fetch_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes.to_vec(),
        Err(err) => {
            warn!(error = %err, "failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let mut worker_request = WorkerRequest::new(
        parts.method.as_str(),
        state.absolute_url(&parts.uri.to_string()),
    );
    worker_request.headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    worker_request.body = body;

    let outcome = match state.classifier.classify(&worker_request) {
        Some(RequestKind::Asset) => state.asset_strategy.handle(&worker_request).await,
        Some(RequestKind::Loader) => state.data_strategy.handle(&worker_request).await,
        // Unclassified requests never touch the cache
        None => state.fetcher.fetch(&worker_request).await,
    };

    match outcome {
        Ok(response) => into_http_response(response),
        Err(err) => err.into_response(),
    }
}

fn into_http_response(response: WorkerResponse) -> Response {
    let mut http_response = Response::new(Body::from(response.body));
    *http_response.status_mut() = StatusCode::from_u16(response.status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in &response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                http_response.headers_mut().insert(name, value);
            }
            _ => warn!(header = name, "dropping malformed response header"),
        }
    }
    http_response
}

// == Message Handler ==
/// Handler for POST /message
///
/// Feeds navigation messages to the prefetch orchestrator. Responds only
/// once every scheduled fetch+cache operation has settled, keeping the
/// event alive for the whole duration.
pub async fn message_handler(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    state.navigation.handle_message(&payload).await;
    StatusCode::NO_CONTENT
}

// == Push Control Handler ==
/// Handler for POST /push
///
/// The push control contract. Delivery (VAPID signing, the push gateway)
/// happens out of band and is not the worker's concern.
pub async fn push_control_handler(
    State(_state): State<AppState>,
    Json(payload): Json<PushControlMessage>,
) -> Response {
    match payload.kind {
        PushControlKind::Subscribe => match payload.subscription {
            Some(subscription) => {
                info!(endpoint = %subscription.endpoint, "push subscription registered");
                (StatusCode::CREATED, Json(subscription)).into_response()
            }
            None => StatusCode::BAD_REQUEST.into_response(),
        },
        PushControlKind::Unsubscribe => {
            info!("push subscription removed");
            (StatusCode::OK, Json(true)).into_response()
        }
        PushControlKind::Notify => {
            info!("notify requested, delivery handled out of band");
            StatusCode::OK.into_response()
        }
    }
}

// == Push Lifecycle Handlers ==
pub async fn push_event_handler(
    State(state): State<AppState>,
    Json(message): Json<PushMessage>,
) -> StatusCode {
    state.push.handle_push(message).await;
    StatusCode::NO_CONTENT
}

pub async fn notification_click_handler(
    State(state): State<AppState>,
    Json(notification): Json<Notification>,
) -> StatusCode {
    state.push.handle_notification_click(notification).await;
    StatusCode::NO_CONTENT
}

pub async fn notification_close_handler(
    State(state): State<AppState>,
    Json(notification): Json<Notification>,
) -> StatusCode {
    state.push.handle_notification_close(notification).await;
    StatusCode::NO_CONTENT
}

pub async fn error_event_handler(
    State(state): State<AppState>,
    Json(event): Json<ErrorEvent>,
) -> StatusCode {
    state.push.handle_error(event).await;
    StatusCode::NO_CONTENT
}

// == Stats Handler ==
/// One row per registered cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsEntry {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_entries: usize,
    pub hit_rate: f64,
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<Vec<CacheStatsEntry>> {
    let entries = state
        .registry
        .stats()
        .await
        .into_iter()
        .map(|(name, stats)| CacheStatsEntry {
            name,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        })
        .collect();
    Json(entries)
}

// == Health Handler ==
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::MockFetcher;

    async fn test_state() -> (AppState, Arc<MockFetcher>) {
        let fetcher = Arc::new(MockFetcher::new());
        let state = AppState::new(
            &Config::default(),
            fetcher.clone(),
            Arc::new(LoggingSink),
        )
        .await;
        (state, fetcher)
    }

    #[tokio::test]
    async fn test_state_opens_configured_caches() {
        let (state, _) = test_state().await;
        assert!(state.registry.has("page-cache").await);
        assert!(state.registry.has("data-cache").await);
        assert!(state.registry.has("assets-cache").await);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_stats_handler_lists_all_caches() {
        let (state, _) = test_state().await;
        let response = stats_handler(State(state)).await;
        let names: Vec<&str> = response.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["assets-cache", "data-cache", "page-cache"]);
    }

    #[tokio::test]
    async fn test_push_subscribe_echoes_subscription() {
        let (state, _) = test_state().await;
        let payload: PushControlMessage = serde_json::from_str(
            r#"{"type":"subscribe","subscription":{"endpoint":"https://push.example/x","keys":{"auth":"a","p256dh":"p"}}}"#,
        )
        .unwrap();

        let response = push_control_handler(State(state), Json(payload)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_push_unsubscribe_returns_boolean() {
        let (state, _) = test_state().await;
        let payload: PushControlMessage =
            serde_json::from_str(r#"{"type":"unsubscribe"}"#).unwrap();

        let response = push_control_handler(State(state), Json(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"true");
    }

    #[tokio::test]
    async fn test_absolute_url_resolution() {
        let (state, _) = test_state().await;
        assert_eq!(
            state.absolute_url("/build/app.js"),
            "http://localhost:8080/build/app.js"
        );
        assert_eq!(
            state.absolute_url("https://example.com/a"),
            "https://example.com/a"
        );
    }
}
