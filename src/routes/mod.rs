use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Health check route.
pub mod health;
/// Preference routes.
pub mod preferences;
/// Match and round routes.
pub mod round;
/// Round event stream.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(round::router())
        .merge(preferences::router());

    api_router.merge(docs_router()).with_state(state)
}

/// Swagger UI at `/docs`, backed by the generated OpenAPI document.
fn docs_router() -> Router<SharedState> {
    SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into()
}
