// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Directory
//!
//! Resolves a normalized caller address to the user record holding that
//! user's decryption key. The production directory is an external system;
//! this in-process stand-in is seeded once at startup (see `SEED_USERS_FILE`
//! in [`crate::config`]) and is read-only afterwards. User and key
//! provisioning are out of scope for this service.

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{UserAddress, UserKey, UserKeyError};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("seed file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("seed entry {index} has a blank address")]
    InvalidAddress { index: usize },

    #[error("seed entry {index} has an invalid encryption key: {source}")]
    InvalidKey {
        index: usize,
        #[source]
        source: UserKeyError,
    },
}

/// One directory entry. The encryption key never leaves the record except
/// as an argument to the decryptor.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: Uuid,
    pub address: UserAddress,
    pub encryption_key: UserKey,
    pub created_at: DateTime<Utc>,
}

/// Wire shape of one seed-file entry: the key travels hex-encoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedUser {
    address: String,
    encryption_key: String,
}

/// In-memory user directory keyed by normalized address.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<UserAddress, UserRecord>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a directory from a JSON seed file: an array of
    /// `{"address": ..., "encryptionKey": "<64 hex chars>"}` objects.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let file = File::open(path.as_ref())?;
        let entries: Vec<SeedUser> = serde_json::from_reader(BufReader::new(file))?;

        let mut directory = Self::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let address = UserAddress::normalize(&entry.address)
                .ok_or(DirectoryError::InvalidAddress { index })?;
            let key = UserKey::from_hex(&entry.encryption_key)
                .map_err(|source| DirectoryError::InvalidKey { index, source })?;
            directory.insert_user(address, key);
        }
        Ok(directory)
    }

    /// Register a user under an already-normalized address.
    pub fn insert_user(&mut self, address: UserAddress, encryption_key: UserKey) -> UserRecord {
        let record = UserRecord {
            user_id: Uuid::new_v4(),
            address: address.clone(),
            encryption_key,
            created_at: Utc::now(),
        };
        self.users.insert(address, record.clone());
        record
    }

    pub fn find_by_address(&self, address: &UserAddress) -> Option<&UserRecord> {
        self.users.get(address)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
