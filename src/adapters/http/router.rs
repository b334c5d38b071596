//! Top-level router: promotion API, notifications socket and health,
//! wrapped in the cross-cutting tower layers.

use std::time::Duration;

use axum::{
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::realtime::{notifications_router, WebSocketState};

use super::middleware::{auth_middleware, AuthState};
use super::promotion::{promotion_router, PromotionAppState};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Everything `build_router` needs.
#[derive(Clone)]
pub struct RouterConfig {
    pub request_timeout: Duration,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

/// GET /health - Liveness
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assembles the application.
///
/// `/api` carries the promotion routes and the notifications socket; both
/// sit behind `auth_middleware`, which only rejects tokens that are present
/// and invalid. The webhook route carries no token and passes through.
pub fn build_router(
    promotions: PromotionAppState,
    realtime: WebSocketState,
    auth: AuthState,
    config: &RouterConfig,
) -> Router {
    let api = Router::new()
        .merge(promotion_router().with_state(promotions))
        .merge(notifications_router().with_state(realtime))
        .layer(middleware::from_fn_with_state(auth, auth_middleware));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors_layer(&config.cors_origins))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if parsed.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_answers_without_auth() {
        let app = Router::new().route("/health", get(health));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn unparseable_origins_fall_back_to_any() {
        // Builds without panicking for both shapes.
        let _ = cors_layer(&[]);
        let _ = cors_layer(&["https://noretmy.com".to_string(), "bad\norigin".to_string()]);
    }
}
