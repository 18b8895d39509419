mod prices;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use fuelwatch_core::CacheMode;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::PriceCache;
use crate::middleware::{request_id, REQUEST_ID_HEADER};

const READ_ROUTE: &str = "/seixal";
const INGEST_ROUTE: &str = "/ingest";

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<PriceCache>,
}

/// Error envelope shared by every endpoint: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
struct Liveness {
    ok: bool,
    endpoints: Vec<String>,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

fn mounted_endpoints(mode: CacheMode) -> Vec<String> {
    let mut endpoints = vec!["GET /".to_string(), format!("GET {READ_ROUTE}")];
    if mode == CacheMode::Push {
        endpoints.push(format!("POST {INGEST_ROUTE}"));
    }
    endpoints
}

/// Router for the given cache. `POST /ingest` is mounted only for push-fed
/// caches.
pub fn build_app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(liveness))
        .route(READ_ROUTE, get(prices::read_prices));

    if state.cache.mode() == CacheMode::Push {
        router = router.route(INGEST_ROUTE, post(prices::ingest_prices));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn liveness(State(state): State<AppState>) -> impl IntoResponse {
    Json(Liveness {
        ok: true,
        endpoints: mounted_endpoints(state.cache.mode()),
    })
}
