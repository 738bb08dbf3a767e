use crate::errors::AppError;
use crate::models::{
    Activity, CreatedResponse, DeletedResponse, DiagnosticReport, Lead, RootMessage,
};
use crate::serialize::{serialize_doc, serialize_docs};
use crate::storage::{DocumentStore, ACTIVITY_COLLECTION, LEAD_COLLECTION};
use crate::validation::{effective_limit, parse_limit, ValidatedJson};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::IntoParams;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 100;

const LEAD_NOT_FOUND: &str = "Lead not found";
const INVALID_LEAD_ID: &str = "Invalid lead_id";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store, created once at startup.
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

/// Query parameters for `GET /api/leads`.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLeadsParams {
    /// Exact-match status filter.
    pub status: Option<String>,
    /// Maximum number of leads returned (default 100, 0 for no limit).
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
}

/// Query parameters for `GET /api/leads/:lead_id/activities`.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListActivitiesParams {
    /// Maximum number of activities returned (default 100, 0 for no limit).
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
}

/// Last occurrence of `key` in a raw query, so `?limit=1&limit=2` reads as 2.
fn last_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

impl ListLeadsParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            status: last_value(pairs, "status"),
            limit: last_value(pairs, "limit"),
        }
    }
}

impl ListActivitiesParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            limit: last_value(pairs, "limit"),
        }
    }
}

/// Malformed identifiers resolve to nothing rather than to an error.
fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// GET /
///
/// Liveness message.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = RootMessage)),
    tag = "system"
)]
pub async fn read_root() -> Json<RootMessage> {
    Json(RootMessage {
        message: "OneLead CRM API running".to_string(),
    })
}

// ============ Leads ============

/// POST /api/leads
///
/// Inserts a lead with defaults applied and returns its id.
#[utoipa::path(
    post,
    path = "/api/leads",
    request_body = Lead,
    responses(
        (status = 200, description = "Lead created", body = CreatedResponse),
        (status = 422, description = "Invalid lead", body = crate::errors::ValidationErrorBody)
    ),
    tag = "leads"
)]
pub async fn create_lead(
    State(state): State<AppState>,
    ValidatedJson(lead): ValidatedJson<Lead>,
) -> Result<Json<CreatedResponse>, AppError> {
    tracing::info!("POST /api/leads - {} {}", lead.first_name, lead.last_name);

    let id = state
        .store
        .insert(LEAD_COLLECTION, lead.to_document())
        .await?;

    tracing::info!("✓ Lead created: {}", id);
    Ok(Json(CreatedResponse { id: id.to_hex() }))
}

/// GET /api/leads
///
/// Lists leads in storage order, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/leads",
    params(ListLeadsParams),
    responses(
        (status = 200, description = "Leads with their ids", body = [Lead]),
        (status = 422, description = "Invalid query", body = crate::errors::ValidationErrorBody)
    ),
    tag = "leads"
)]
pub async fn list_leads(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Map<String, Value>>>, AppError> {
    let params = ListLeadsParams::from_pairs(&pairs);
    tracing::info!("GET /api/leads - params: {:?}", params);

    let limit = parse_limit(params.limit.as_deref(), DEFAULT_LIMIT)?;
    let filter = match params.status.filter(|s| !s.is_empty()) {
        Some(status) => doc! { "status": status },
        None => Document::new(),
    };

    let docs = state
        .store
        .find(LEAD_COLLECTION, filter, effective_limit(limit))
        .await?;

    Ok(Json(serialize_docs(docs)))
}

/// GET /api/leads/:lead_id
#[utoipa::path(
    get,
    path = "/api/leads/{lead_id}",
    params(("lead_id" = String, Path, description = "Lead id")),
    responses(
        (status = 200, description = "The lead", body = Lead),
        (status = 404, description = "No such lead", body = crate::errors::ErrorDetail)
    ),
    tag = "leads"
)]
pub async fn get_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
) -> Result<Json<Map<String, Value>>, AppError> {
    tracing::info!("GET /api/leads/{}", lead_id);

    let Some(id) = parse_object_id(&lead_id) else {
        tracing::warn!("Malformed lead id: {}", lead_id);
        return Err(AppError::NotFound(LEAD_NOT_FOUND.to_string()));
    };

    let doc = state
        .store
        .find_by_id(LEAD_COLLECTION, id)
        .await?
        .ok_or_else(|| AppError::NotFound(LEAD_NOT_FOUND.to_string()))?;

    Ok(Json(serialize_doc(doc)))
}

/// PUT /api/leads/:lead_id
///
/// Full replacement: every field is rewritten from the request body.
#[utoipa::path(
    put,
    path = "/api/leads/{lead_id}",
    params(("lead_id" = String, Path, description = "Lead id")),
    request_body = Lead,
    responses(
        (status = 200, description = "The updated lead", body = Lead),
        (status = 404, description = "No such lead", body = crate::errors::ErrorDetail),
        (status = 422, description = "Invalid lead", body = crate::errors::ValidationErrorBody)
    ),
    tag = "leads"
)]
pub async fn update_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    ValidatedJson(lead): ValidatedJson<Lead>,
) -> Result<Json<Map<String, Value>>, AppError> {
    tracing::info!("PUT /api/leads/{}", lead_id);

    let Some(id) = parse_object_id(&lead_id) else {
        tracing::warn!("Malformed lead id: {}", lead_id);
        return Err(AppError::NotFound(LEAD_NOT_FOUND.to_string()));
    };

    let matched = state
        .store
        .replace_by_id(LEAD_COLLECTION, id, lead.to_document())
        .await?;
    if !matched {
        return Err(AppError::NotFound(LEAD_NOT_FOUND.to_string()));
    }

    // A concurrent delete can land between the write and this read
    let doc = state
        .store
        .find_by_id(LEAD_COLLECTION, id)
        .await?
        .ok_or_else(|| AppError::NotFound(LEAD_NOT_FOUND.to_string()))?;

    Ok(Json(serialize_doc(doc)))
}

/// DELETE /api/leads/:lead_id
///
/// Activities referencing the lead are left in place.
#[utoipa::path(
    delete,
    path = "/api/leads/{lead_id}",
    params(("lead_id" = String, Path, description = "Lead id")),
    responses(
        (status = 200, description = "Lead deleted", body = DeletedResponse),
        (status = 404, description = "No such lead", body = crate::errors::ErrorDetail)
    ),
    tag = "leads"
)]
pub async fn delete_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    tracing::info!("DELETE /api/leads/{}", lead_id);

    let Some(id) = parse_object_id(&lead_id) else {
        tracing::warn!("Malformed lead id: {}", lead_id);
        return Err(AppError::NotFound(LEAD_NOT_FOUND.to_string()));
    };

    if !state.store.delete_by_id(LEAD_COLLECTION, id).await? {
        return Err(AppError::NotFound(LEAD_NOT_FOUND.to_string()));
    }

    tracing::info!("✓ Lead deleted: {}", id);
    Ok(Json(DeletedResponse { ok: true }))
}

// ============ Activities ============

/// POST /api/activities
///
/// The referenced lead must exist when the activity is created.
#[utoipa::path(
    post,
    path = "/api/activities",
    request_body = Activity,
    responses(
        (status = 200, description = "Activity created", body = CreatedResponse),
        (status = 400, description = "Referenced lead does not exist", body = crate::errors::ErrorDetail),
        (status = 422, description = "Invalid activity", body = crate::errors::ValidationErrorBody)
    ),
    tag = "activities"
)]
pub async fn create_activity(
    State(state): State<AppState>,
    ValidatedJson(activity): ValidatedJson<Activity>,
) -> Result<Json<CreatedResponse>, AppError> {
    tracing::info!(
        "POST /api/activities - lead_id: {}, type: {}",
        activity.lead_id,
        activity.kind.as_str()
    );

    let lead = match parse_object_id(&activity.lead_id) {
        Some(lead_id) => state.store.find_by_id(LEAD_COLLECTION, lead_id).await?,
        None => None,
    };
    if lead.is_none() {
        tracing::warn!("Activity references unknown lead: {}", activity.lead_id);
        return Err(AppError::InvalidReference(INVALID_LEAD_ID.to_string()));
    }

    let id = state
        .store
        .insert(ACTIVITY_COLLECTION, activity.to_document())
        .await?;

    tracing::info!("✓ Activity created: {}", id);
    Ok(Json(CreatedResponse { id: id.to_hex() }))
}

/// GET /api/leads/:lead_id/activities
///
/// Matches `lead_id` by plain string equality; the path value is not checked.
#[utoipa::path(
    get,
    path = "/api/leads/{lead_id}/activities",
    params(
        ("lead_id" = String, Path, description = "Lead id"),
        ListActivitiesParams
    ),
    responses(
        (status = 200, description = "Activities for the lead", body = [Activity]),
        (status = 422, description = "Invalid query", body = crate::errors::ValidationErrorBody)
    ),
    tag = "activities"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Map<String, Value>>>, AppError> {
    tracing::info!("GET /api/leads/{}/activities", lead_id);

    let params = ListActivitiesParams::from_pairs(&pairs);
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_LIMIT)?;
    let docs = state
        .store
        .find(
            ACTIVITY_COLLECTION,
            doc! { "lead_id": lead_id },
            effective_limit(limit),
        )
        .await?;

    Ok(Json(serialize_docs(docs)))
}

// ============ Diagnostics ============

const MAX_ERROR_CHARS: usize = 50;
const MAX_COLLECTIONS: usize = 10;

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Reports whether an environment variable is set, as read at call time.
pub fn env_var_status(name: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => "✅ Set".to_string(),
        Ok(_) | Err(std::env::VarError::NotPresent) => "❌ Not Set".to_string(),
        Err(e) => format!("❌ Error: {}", truncate_chars(&e.to_string(), MAX_ERROR_CHARS)),
    }
}

/// GET /test
///
/// Best-effort database probe. Never fails; storage errors are reported in
/// the body, truncated.
#[utoipa::path(
    get,
    path = "/test",
    responses((status = 200, description = "Diagnostic report", body = DiagnosticReport)),
    tag = "system"
)]
pub async fn test_database(State(state): State<AppState>) -> Json<DiagnosticReport> {
    tracing::info!("GET /test - database: {}", state.store.name());

    let (database, collections) = match state.store.list_collection_names().await {
        Ok(mut names) => {
            names.truncate(MAX_COLLECTIONS);
            ("✅ Connected & Working".to_string(), names)
        }
        Err(e) => {
            tracing::warn!("Diagnostic collection listing failed: {}", e);
            (
                format!(
                    "⚠️  Connected but Error: {}",
                    truncate_chars(&e.message(), MAX_ERROR_CHARS)
                ),
                Vec::new(),
            )
        }
    };

    Json(DiagnosticReport {
        backend: "✅ Running".to_string(),
        database,
        database_url: env_var_status("DATABASE_URL"),
        database_name: env_var_status("DATABASE_NAME"),
        connection_status: "Connected".to_string(),
        collections,
    })
}
