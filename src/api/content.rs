// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content upload and holdings.
//!
//! An upload is registered in the ledger before it is minted: the token id,
//! stored bytes, content row and the uploader's +100 ownership record exist
//! even when the chain call fails. The content's mint status tells the two
//! cases apart.

use axum::extract::{multipart::MultipartRejection, Multipart, State};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    audit_log,
    auth::Auth,
    blockchain::parse_address,
    error::{ok, ApiError, ApiResult},
    state::AppState,
    storage::{
        records::{token_id_str, Content, Holding, MintStatus},
        AuditEvent, AuditEventType, AuditRepository, ContentFileRepository,
    },
};

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "fileName";

/// Upload size limit, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadResponse {
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    /// Public path of the stored file
    pub content: String,
    pub content_hash: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContentsResponse {
    pub contents: Vec<Holding>,
}

/// Pull the upload field out of the form.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::param(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::param(e.body_text()))?;
        return Ok((file_name, data.to_vec()));
    }
    Err(ApiError::param(format!("missing multipart field `{UPLOAD_FIELD}`")))
}

/// Upload a file and register it as a new content token.
///
/// The caller receives +100 weight and `uploadMint` is submitted, signed by
/// the caller's key.
#[utoipa::path(
    post,
    path = "/content",
    tag = "Content",
    request_body(content_type = "multipart/form-data", description = "File in the `fileName` field"),
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is the registered content", body = UploadResponse)
    )
)]
pub async fn upload_content(
    Auth(user): Auth,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadResponse> {
    let multipart = multipart.map_err(|e| ApiError::param(e.body_text()))?;
    let (file_name, data) = read_upload(multipart).await?;
    if data.is_empty() {
        return Err(ApiError::param("uploaded file is empty"));
    }

    let owner = parse_address(&user.address)?;
    let signer = state.signer_for(&user.address)?;

    let token_id = state.ledger.allocate_token_id()?;
    let stored = ContentFileRepository::new(&state.store)
        .save(token_id, &file_name, &data)
        .map_err(|e| ApiError::system(e.to_string()))?;

    let content = Content {
        token_id,
        title: file_name,
        content_path: stored.public_path.clone(),
        content_hash: stored.content_hash.clone(),
        address: user.address.clone(),
        created_at: Utc::now(),
        mint_status: MintStatus::Pending,
    };
    state.ledger.register_content(&content)?;

    tracing::info!(token_id, address = %user.address, hash = %stored.content_hash, "Content registered");
    audit_log!(
        &state.store,
        AuditEventType::ContentUploaded,
        user.address.as_str(),
        "content",
        token_id.to_string()
    );

    let tx_hash = match state.chain.mint_content(&signer, owner, token_id).await {
        Ok(hash) => format!("{hash:#x}"),
        Err(e) => {
            let status = MintStatus::Failed {
                error: e.to_string(),
            };
            if let Err(db) = state.ledger.update_mint_status(token_id, status) {
                tracing::warn!(error = %db, token_id, "Failed to record mint failure");
            }
            let event = AuditEvent::new(AuditEventType::ContentMintFailed)
                .with_actor(user.address.as_str())
                .with_resource("content", token_id.to_string())
                .failed(e.to_string());
            if let Err(log) = AuditRepository::new(&state.store).log(&event) {
                tracing::warn!(error = %log, "Failed to write audit event");
            }
            return Err(e.into());
        }
    };

    let minted = MintStatus::Minted {
        tx_hash: tx_hash.clone(),
    };
    if let Err(e) = state.ledger.update_mint_status(token_id, minted) {
        tracing::warn!(error = %e, token_id, tx_hash = %tx_hash, "Failed to record mint");
    }

    Ok(ok(UploadResponse {
        token_id,
        content: stored.public_path,
        content_hash: stored.content_hash,
        tx_hash,
    }))
}

/// Tokens the caller currently holds weight in.
#[utoipa::path(
    get,
    path = "/content",
    tag = "Content",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data lists the caller's holdings", body = ContentsResponse)
    )
)]
pub async fn list_contents(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> ApiResult<ContentsResponse> {
    let contents = state
        .ledger
        .holdings(&user.address)?
        .into_iter()
        .filter(|h| h.weight > 0)
        .collect();

    Ok(ok(ContentsResponse { contents }))
}
