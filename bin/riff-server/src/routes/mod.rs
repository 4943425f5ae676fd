//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - middleware layers (CORS, per-request trace-ID injection)
//! - optional Swagger UI / OpenAPI document (disable with `RIFF_ENABLE_SWAGGER=false`)
//! - `/health`
//! - the `/api` proxy routes

pub mod audio;
pub mod doc;
mod generate;
mod health;
mod lyrics;
mod upload;

use std::sync::Arc;

use axum::{Router, middleware};
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Routes nested under `/api`.
fn api_router(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .merge(generate::router())
        .merge(audio::router())
        .merge(lyrics::router())
        .merge(upload::router(state.config.max_upload_bytes()))
}

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .nest("/api", api_router(&state));

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            trace::trace_middleware,
        ))
        .with_state(state)
}
