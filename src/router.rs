use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::users::router::init_functions_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, middleware, routing::get};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};

pub fn init_router(state: AppState) -> Router {
    let cors = {
        let allowed_origins: Vec<HeaderValue> = state
            .cors_config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::POST, Method::OPTIONS])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::HeaderName::from_static("apikey"),
                header::HeaderName::from_static("x-client-info"),
            ])
    };

    Router::new()
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/health", get(|| async { "ok" }))
        .nest("/functions/v1", init_functions_router())
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
