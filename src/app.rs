//! HTTP application wiring.
//!
//! Builds the axum router, the middleware stack, and the OpenAPI document.
//! Kept out of `main` so tests can drive the exact production router.

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::{ErrorDetail, ValidationErrorBody};
use crate::handlers::{self, AppState};
use crate::models::{
    Activity, ActivityType, CreatedResponse, DeletedResponse, DiagnosticReport, Lead, LeadStatus,
    RootMessage,
};
use crate::validation::FieldError;

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(title = "OneLead CRM API", description = "Leads and activities over a document store."),
    paths(
        handlers::read_root,
        handlers::test_database,
        handlers::create_lead,
        handlers::list_leads,
        handlers::get_lead,
        handlers::update_lead,
        handlers::delete_lead,
        handlers::create_activity,
        handlers::list_activities,
    ),
    components(schemas(
        Lead,
        LeadStatus,
        Activity,
        ActivityType,
        CreatedResponse,
        DeletedResponse,
        RootMessage,
        DiagnosticReport,
        ErrorDetail,
        ValidationErrorBody,
        FieldError,
    )),
    tags(
        (name = "leads", description = "Lead CRUD"),
        (name = "activities", description = "Activities linked to a lead"),
        (name = "system", description = "Liveness and diagnostics")
    )
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(handlers::read_root))
        .route("/test", get(handlers::test_database))
        // Leads
        .route(
            "/api/leads",
            get(handlers::list_leads).post(handlers::create_lead),
        )
        .route(
            "/api/leads/:lead_id",
            get(handlers::get_lead)
                .put(handlers::update_lead)
                .delete(handlers::delete_lead),
        )
        // Activities
        .route(
            "/api/leads/:lead_id/activities",
            get(handlers::list_activities),
        )
        .route("/api/activities", post(handlers::create_activity))
        .with_state(state);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)))
        .layer(TraceLayer::new_for_http())
        // Any origin, method and header, credentials allowed
        .layer(CorsLayer::very_permissive())
}
