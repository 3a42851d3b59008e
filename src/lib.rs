// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Image Vault - Encrypted Image Retrieval Service
//!
//! This crate serves per-user encrypted images stored on IPFS: the caller
//! names an address and a list of content hashes, and the service fetches
//! the requested page from the gateway, decrypts each envelope under the
//! user's key, and returns the plaintexts base64-encoded.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `directory` - In-memory user directory (address -> decryption key)
//! - `pipeline` - Concurrent fetch-and-decrypt over the IPFS gateway

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod state;
