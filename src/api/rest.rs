//! REST API Handlers
//!
//! Implements the REST endpoints for file shares, snapshots, and access
//! rules. Mutations are accepted (202) once the orchestrator has settled
//! the request; reads answer from the catalog.

use crate::catalog::ListFilter;
use crate::context::RequestContext;
use crate::error::{Error, StatusFamily};
use crate::model::{FileShare, FileShareAcl, FileShareSnapshot};
use crate::orchestrator::{MetadataPatch, Orchestrator};
use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

// =============================================================================
// Request/Response Types
// =============================================================================

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// =============================================================================
// REST Router
// =============================================================================

/// REST API router builder
pub struct RestRouter {
    orchestrator: Arc<Orchestrator>,
}

impl RestRouter {
    /// Create a new REST router
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let state = AppState {
            orchestrator: self.orchestrator,
        };

        Router::new()
            // File share endpoints
            .route("/v1/file/shares", post(create_share))
            .route("/v1/file/shares", get(list_shares))
            .route("/v1/file/shares/:id", get(get_share))
            .route("/v1/file/shares/:id", put(update_share))
            .route("/v1/file/shares/:id", delete(delete_share))
            // Snapshot endpoints
            .route("/v1/file/snapshots", post(create_snapshot))
            .route("/v1/file/snapshots", get(list_snapshots))
            .route("/v1/file/snapshots/:id", get(get_snapshot))
            .route("/v1/file/snapshots/:id", put(update_snapshot))
            .route("/v1/file/snapshots/:id", delete(delete_snapshot))
            // ACL endpoints
            .route("/v1/file/acls", post(create_acl))
            .route("/v1/file/acls", get(list_acls))
            .route("/v1/file/acls/:id", get(get_acl))
            .route("/v1/file/acls/:id", delete(delete_acl))
            .with_state(state)
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

// =============================================================================
// Context and Error Mapping
// =============================================================================

/// Derive the security context from request headers. Absent headers fall
/// back to the admin tenant, matching standalone deployments without an
/// authenticating proxy in front.
fn context_from(headers: &HeaderMap) -> RequestContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    match (header("x-tenant-id"), header("x-user-id")) {
        (None, None) => RequestContext::admin(),
        (tenant, user) => RequestContext::new(
            tenant.unwrap_or_else(|| "admin".into()),
            user.unwrap_or_else(|| "admin".into()),
        ),
    }
}

/// Map a control-plane error onto the wire
fn error_response(err: Error) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, code) = match err.status_family() {
        StatusFamily::BadRequest => (StatusCode::BAD_REQUEST, "bad_request"),
        StatusFamily::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        StatusFamily::Conflict => (StatusCode::CONFLICT, "conflict"),
        StatusFamily::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", err);
    }
    (
        status,
        Json(ApiErrorResponse {
            error: code.into(),
            message: err.to_string(),
            details: None,
        }),
    )
}

fn filter_from(params: &BTreeMap<String, String>) -> Result<ListFilter, axum::response::Response> {
    ListFilter::from_query(params).map_err(|err| error_response(err).into_response())
}

// =============================================================================
// File Share Handlers
// =============================================================================

async fn create_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FileShare>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);
    info!("Creating file share: {}", request.name);

    match state.orchestrator.create_share(&ctx, request).await {
        Ok(created) => (StatusCode::ACCEPTED, Json(created)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn list_shares(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);
    let filter = match filter_from(&params) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    match state.orchestrator.list_shares(&ctx, &filter).await {
        Ok(shares) => (StatusCode::OK, Json(shares)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn get_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);

    match state.orchestrator.get_share(&ctx, &id).await {
        Ok(share) => (StatusCode::OK, Json(share)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn update_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<MetadataPatch>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);

    match state.orchestrator.update_share(&ctx, &id, patch).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn delete_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);
    info!("Deleting file share: {}", id);

    match state.orchestrator.delete_share(&ctx, &id).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

// =============================================================================
// Snapshot Handlers
// =============================================================================

async fn create_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FileShareSnapshot>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);
    info!("Creating snapshot of share: {}", request.fileshare_id);

    match state.orchestrator.create_snapshot(&ctx, request).await {
        Ok(created) => (StatusCode::ACCEPTED, Json(created)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn list_snapshots(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);
    let filter = match filter_from(&params) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    match state.orchestrator.list_snapshots(&ctx, &filter).await {
        Ok(snapshots) => (StatusCode::OK, Json(snapshots)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn get_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);

    match state.orchestrator.get_snapshot(&ctx, &id).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn update_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<MetadataPatch>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);

    match state.orchestrator.update_snapshot(&ctx, &id, patch).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn delete_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);
    info!("Deleting snapshot: {}", id);

    match state.orchestrator.delete_snapshot(&ctx, &id).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

// =============================================================================
// ACL Handlers
// =============================================================================

async fn create_acl(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FileShareAcl>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);
    info!("Creating acl on share: {}", request.fileshare_id);

    match state.orchestrator.create_acl(&ctx, request).await {
        Ok(created) => (StatusCode::ACCEPTED, Json(created)).into_response(),
        // A missing parent share means the request itself named an invalid
        // target, so it surfaces as a client error rather than 404.
        Err(Error::NotFound { kind, id }) => (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse {
                error: "bad_request".into(),
                message: format!("Resource not found: {}/{}", kind, id),
                details: None,
            }),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn list_acls(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);
    let filter = match filter_from(&params) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    match state.orchestrator.list_acls(&ctx, &filter).await {
        Ok(acls) => (StatusCode::OK, Json(acls)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn get_acl(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);

    match state.orchestrator.get_acl(&ctx, &id).await {
        Ok(acl) => (StatusCode::OK, Json(acl)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn delete_acl(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let ctx = context_from(&headers);
    info!("Deleting acl: {}", id);

    match state.orchestrator.delete_acl(&ctx, &id).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => error_response(err).into_response(),
    }
}
