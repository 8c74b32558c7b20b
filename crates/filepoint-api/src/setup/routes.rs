//! Route configuration (spec.md §6).

use crate::handlers;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/health", get(handlers::upload::health))
        .route("/v1/upload", post(handlers::upload::upload))
        .route("/v1/upload", get(handlers::upload::get_upload))
        .route("/v1/upload", delete(handlers::upload::delete_upload))
        .route("/v1/upload/all", delete(handlers::upload::delete_upload_all))
        .route("/v1/upload/folder", get(handlers::upload::get_upload_folder))
        .route("/v1/upload/list", post(handlers::upload::post_upload_list))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(axum::middleware::from_fn(filepoint_infra::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
