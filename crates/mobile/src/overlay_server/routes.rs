use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::surface::OverlaySnapshot;

type Snapshots = watch::Receiver<Arc<OverlaySnapshot>>;

pub fn create_router(snapshots: Snapshots) -> Router {
    Router::new()
        .route("/overlays.geojson", get(overlays))
        .route("/markers.geojson", get(markers))
        .route("/camera.json", get(camera))
        .route("/health", get(health))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(snapshots)
}

fn latest(snapshots: &Snapshots) -> Arc<OverlaySnapshot> {
    snapshots.borrow().clone()
}

fn geojson_response(body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/geo+json"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
        .into_response()
}

async fn overlays(State(snapshots): State<Snapshots>) -> Response {
    geojson_response(latest(&snapshots).overlays.to_string())
}

async fn markers(State(snapshots): State<Snapshots>) -> Response {
    geojson_response(latest(&snapshots).markers.to_string())
}

async fn camera(State(snapshots): State<Snapshots>) -> Response {
    match serde_json::to_string(&latest(&snapshots).camera) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            body,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("failed to encode camera state: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health() -> &'static str {
    "OK"
}
