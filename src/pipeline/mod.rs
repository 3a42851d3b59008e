// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Image Retrieval Pipeline
//!
//! Turns a page of content hashes into decrypted image bytes: fetch each
//! envelope from the gateway, decrypt it under the requesting user's key,
//! and report per-item outcomes. Fetches run concurrently under a
//! semaphore cap, outputs keep the input order, and one bad item never
//! poisons the rest. A whole-call deadline bounds the worst case; items
//! that have not finished when it elapses come back as skipped.

pub mod decrypt;
pub mod gateway;
pub mod page;

use std::{sync::Arc, time::Duration};

use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, error};

use crate::{
    config::Config,
    models::{ContentHash, UserKey},
};

pub use decrypt::{decrypt_envelope, DecryptError, IV_LEN};
pub use gateway::{EncryptedEnvelope, GatewayClient, GatewayError};
pub use page::{InvalidPagination, PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE};

/// Why one item produced no plaintext.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error(transparent)]
    Fetch(#[from] GatewayError),

    #[error(transparent)]
    Decrypt(#[from] DecryptError),

    #[error("deadline of {0:?} elapsed before this item completed")]
    DeadlineExceeded(Duration),

    #[error("image task failed before completing")]
    TaskFailed,
}

impl SkipReason {
    /// Pipeline stage the item failed in, for structured logs.
    pub fn stage(&self) -> &'static str {
        match self {
            SkipReason::Fetch(_) => "fetch",
            SkipReason::Decrypt(_) => "decrypt",
            SkipReason::DeadlineExceeded(_) => "deadline",
            SkipReason::TaskFailed => "task",
        }
    }
}

#[derive(Debug)]
pub enum ItemOutcome {
    Decrypted(Vec<u8>),
    Skipped(SkipReason),
}

/// Outcome of one input hash, in input order.
#[derive(Debug)]
pub struct PipelineItem {
    pub hash: ContentHash,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone)]
pub struct ImagePipeline {
    gateway: GatewayClient,
    max_concurrent_fetches: usize,
    deadline: Duration,
}

impl ImagePipeline {
    /// A zero cap would starve the semaphore, so it is clamped to one.
    pub fn new(gateway: GatewayClient, max_concurrent_fetches: usize, deadline: Duration) -> Self {
        Self {
            gateway,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
            deadline,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let gateway = GatewayClient::new(
            config.gateway_base_url.clone(),
            config.gateway_fetch_timeout,
        )?;
        Ok(Self::new(
            gateway,
            config.gateway_max_concurrent_fetches,
            config.pipeline_deadline,
        ))
    }

    pub fn gateway_base_url(&self) -> &url::Url {
        self.gateway.base_url()
    }

    /// Fetch and decrypt every hash in `hashes` under `key`.
    ///
    /// Always returns one [`PipelineItem`] per input hash, in input order.
    /// Duplicate hashes are fetched independently and yield independent
    /// outcomes.
    pub async fn retrieve_page(&self, hashes: &[ContentHash], key: &UserKey) -> Vec<PipelineItem> {
        if hashes.is_empty() {
            return Vec::new();
        }

        debug!(items = hashes.len(), "starting image retrieval");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_fetches));
        let mut tasks: JoinSet<(usize, ItemOutcome)> = JoinSet::new();

        for (index, hash) in hashes.iter().cloned().enumerate() {
            let gateway = self.gateway.clone();
            let key = key.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore outlives every task and is never closed, so
                // a failed acquire can only mean runtime teardown.
                let _permit = semaphore.acquire_owned().await.ok();
                (index, fetch_and_decrypt(&gateway, &hash, &key).await)
            });
        }

        let mut slots: Vec<Option<ItemOutcome>> = Vec::with_capacity(hashes.len());
        slots.resize_with(hashes.len(), || None);

        let drained = tokio::time::timeout(self.deadline, async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, outcome)) => slots[index] = Some(outcome),
                    Err(err) => error!(error = %err, "image task failed to join"),
                }
            }
        })
        .await;

        if drained.is_err() {
            tasks.abort_all();
        }

        assemble_items(hashes, slots, drained.is_err(), self.deadline)
    }
}

/// Pair every hash with its outcome. An unfilled slot means its task never
/// reported back: the deadline if one elapsed, otherwise a task failure.
fn assemble_items(
    hashes: &[ContentHash],
    slots: Vec<Option<ItemOutcome>>,
    deadline_elapsed: bool,
    deadline: Duration,
) -> Vec<PipelineItem> {
    hashes
        .iter()
        .cloned()
        .zip(slots)
        .map(|(hash, slot)| PipelineItem {
            hash,
            outcome: slot.unwrap_or_else(|| {
                if deadline_elapsed {
                    ItemOutcome::Skipped(SkipReason::DeadlineExceeded(deadline))
                } else {
                    ItemOutcome::Skipped(SkipReason::TaskFailed)
                }
            }),
        })
        .collect()
}

async fn fetch_and_decrypt(
    gateway: &GatewayClient,
    hash: &ContentHash,
    key: &UserKey,
) -> ItemOutcome {
    let envelope = match gateway.fetch_envelope(hash).await {
        Ok(envelope) => envelope,
        Err(err) => return ItemOutcome::Skipped(SkipReason::Fetch(err)),
    };
    match decrypt::decrypt_envelope(&envelope, key) {
        Ok(plaintext) => ItemOutcome::Decrypted(plaintext),
        Err(err) => ItemOutcome::Skipped(SkipReason::Decrypt(err)),
    }
}
