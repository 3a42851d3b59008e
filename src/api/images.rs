// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Image retrieval endpoint.
//!
//! Validates the request, resolves the caller's decryption key, then hands
//! the selected page of hashes to the pipeline. Items the pipeline could
//! not deliver are logged and omitted from the response; the request as a
//! whole still succeeds.

use axum::{
    extract::{Query, State},
    Json,
};
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    models::{ContentHash, UserAddress},
    pipeline::{ItemOutcome, PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE},
    state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct RetrieveImagesParams {
    /// 1-based page into the hash list. Defaults to 1.
    pub page: Option<i64>,
    /// Hashes per page. Defaults to 2.
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RetrieveImagesRequest {
    /// Address of the user whose key the images were sealed under.
    pub address: Option<String>,
    /// Content hashes of the encrypted images, in display order.
    #[serde(default)]
    pub hashes: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RetrieveImagesResponse {
    pub message: String,
    /// Base64-encoded plaintext images, in the order their hashes appeared
    /// in the selected page.
    #[serde(rename = "decryptedImageArr")]
    pub decrypted_image_arr: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/v1/images/retrieve",
    params(RetrieveImagesParams),
    request_body = RetrieveImagesRequest,
    tag = "Images",
    responses(
        (status = 200, body = RetrieveImagesResponse),
        (status = 400, description = "Request failed validation"),
        (status = 404, description = "Address is not registered")
    )
)]
pub async fn retrieve_images(
    State(state): State<AppState>,
    Query(params): Query<RetrieveImagesParams>,
    Json(request): Json<RetrieveImagesRequest>,
) -> Result<Json<RetrieveImagesResponse>, ApiError> {
    // All validation happens before the directory or the gateway is touched.
    let address = request
        .address
        .as_deref()
        .and_then(UserAddress::normalize)
        .ok_or_else(|| ApiError::bad_request("User address is required"))?;

    let window = PageRequest::new(
        params.page.unwrap_or(DEFAULT_PAGE),
        params.limit.unwrap_or(DEFAULT_LIMIT),
    )
    .map_err(|_| ApiError::bad_request("Invalid pagination parameters"))?;

    if request.hashes.is_empty() {
        return Err(ApiError::bad_request("No IPFS hashes provided"));
    }
    let hashes: Vec<ContentHash> = request
        .hashes
        .iter()
        .map(|raw| ContentHash::parse(raw))
        .collect::<Option<_>>()
        .ok_or_else(|| ApiError::bad_request("Invalid IPFS hash list"))?;

    let key = {
        let directory = state.directory.read().await;
        directory
            .find_by_address(&address)
            .map(|record| record.encryption_key.clone())
    }
    .ok_or_else(|| ApiError::not_found("User does not exist"))?;

    let page = window.slice(&hashes);
    let items = state.pipeline.retrieve_page(page, &key).await;

    let mut images = Vec::with_capacity(items.len());
    let mut skipped = 0usize;
    for item in &items {
        match &item.outcome {
            ItemOutcome::Decrypted(bytes) => images.push(Base64::encode_string(bytes)),
            ItemOutcome::Skipped(reason) => {
                skipped += 1;
                warn!(
                    address = %address,
                    hash = %item.hash,
                    stage = reason.stage(),
                    reason = %reason,
                    "skipping image"
                );
            }
        }
    }

    info!(
        address = %address,
        page = window.page(),
        limit = window.limit(),
        requested = page.len(),
        delivered = images.len(),
        skipped,
        "images retrieved"
    );

    Ok(Json(RetrieveImagesResponse {
        message: "Images sent".to_string(),
        decrypted_image_arr: images,
    }))
}
