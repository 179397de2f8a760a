use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::response::Json;
use notary_service::{
    DocumentList, NotaryService, RegisterResult, StagedUpload, StagingArea, VerifyResult,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// Multipart field carrying the uploaded file.
pub const DOCUMENT_FIELD: &str = "document";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NotaryService>,
}

impl AppState {
    pub fn new(service: Arc<NotaryService>) -> Self {
        Self { service }
    }
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "contractAddress": state.service.contract_address(),
        "signer": state.service.signer(),
    }))
}

pub async fn info_handler() -> Json<Value> {
    Json(json!({
        "name": "notary-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /upload`: stage, hash, and register the `document` field.
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Json<RegisterResult>> {
    let staged = stage_document(state.service.staging(), multipart).await?;
    Ok(Json(state.service.register_staged(&staged).await?))
}

/// `POST /verify`: stage, hash, and look up the `document` field.
pub async fn verify_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Json<VerifyResult>> {
    let staged = stage_document(state.service.staging(), multipart).await?;
    Ok(Json(state.service.verify_staged(&staged).await?))
}

/// `GET /documents/:address`
pub async fn documents_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ServerResult<Json<DocumentList>> {
    let documents = state.service.list_by_owner(&address).await?;
    Ok(Json(DocumentList { documents }))
}

/// Stream the first `document` field to a staged file. Other fields are
/// skipped.
async fn stage_document(
    staging: &StagingArea,
    mut multipart: Multipart,
) -> ServerResult<StagedUpload> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(DOCUMENT_FIELD) {
            debug!(field = ?field.name(), "skipping multipart field");
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let mut writer = staging.writer(file_name)?;
        while let Some(chunk) = field.chunk().await? {
            writer.write(&chunk).await?;
        }
        return Ok(writer.finish().await?);
    }
    Err(ServerError::MissingDocument)
}
