// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! IPFS gateway client.
//!
//! Fetches one encrypted envelope per content hash over the gateway's HTTP
//! interface. The gateway stores opaque JSON documents of the form
//! `{"encryptedData": "<hex>", "iv": "<hex>"}`; both fields are decoded to
//! bytes here so the decryptor never sees wire encoding concerns.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::models::ContentHash;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to build gateway HTTP client: {0}")]
    Client(String),

    #[error("gateway request for {hash} failed: {reason}")]
    Request { hash: String, reason: String },

    #[error("gateway returned {status} for {hash}")]
    BadStatus { hash: String, status: StatusCode },

    #[error("gateway envelope for {hash} was invalid: {reason}")]
    InvalidEnvelope { hash: String, reason: String },
}

/// An encrypted blob as fetched from the gateway, decoded to raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
}

/// Wire shape of a gateway document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    encrypted_data: String,
    iv: String,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: Url,
    http: Client,
}

impl GatewayClient {
    /// Build a client against `base_url`. `timeout` bounds each individual
    /// fetch; the pipeline applies its own overall deadline on top.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch and decode the envelope stored under `hash`.
    pub async fn fetch_envelope(
        &self,
        hash: &ContentHash,
    ) -> Result<EncryptedEnvelope, GatewayError> {
        let url = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            hash.as_str()
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Request {
                hash: hash.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::BadStatus {
                hash: hash.to_string(),
                status: response.status(),
            });
        }

        let wire: WireEnvelope =
            response
                .json()
                .await
                .map_err(|e| GatewayError::InvalidEnvelope {
                    hash: hash.to_string(),
                    reason: format!("body is not an envelope: {e}"),
                })?;

        let ciphertext =
            hex::decode(&wire.encrypted_data).map_err(|e| GatewayError::InvalidEnvelope {
                hash: hash.to_string(),
                reason: format!("encryptedData is not hex: {e}"),
            })?;
        let iv = hex::decode(&wire.iv).map_err(|e| GatewayError::InvalidEnvelope {
            hash: hash.to_string(),
            reason: format!("iv is not hex: {e}"),
        })?;

        Ok(EncryptedEnvelope { ciphertext, iv })
    }
}

/// Local stand-in for the gateway, bound on an ephemeral port. Test code
/// publishes envelopes under hashes and can stall individual hashes to
/// exercise timeout paths. The hit counter lets tests assert that request
/// validation short-circuits before any fetch goes out.
#[cfg(test)]
pub(crate) mod stub {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, RwLock,
        },
        time::Duration,
    };

    use aes_gcm::{
        aead::{Aead, KeyInit},
        Aes256Gcm, Nonce,
    };
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use url::Url;

    use crate::models::UserKey;

    /// Seal `plaintext` the way a publisher would, yielding the wire JSON
    /// served for one hash.
    pub(crate) fn sealed_envelope(key: &UserKey, iv: &[u8; 12], plaintext: &[u8]) -> Value {
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .expect("sealing test envelope succeeds");
        json!({
            "encryptedData": hex::encode(ciphertext),
            "iv": hex::encode(iv),
        })
    }

    #[derive(Clone, Default)]
    pub(crate) struct StubGateway {
        envelopes: Arc<RwLock<HashMap<String, Value>>>,
        stalls: Arc<RwLock<HashMap<String, Duration>>>,
        hits: Arc<AtomicUsize>,
    }

    impl StubGateway {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn publish(&self, hash: &str, envelope: Value) {
            self.envelopes
                .write()
                .expect("stub lock")
                .insert(hash.to_string(), envelope);
        }

        /// Delay responses for `hash` so tests can overrun deadlines.
        pub(crate) fn stall(&self, hash: &str, delay: Duration) {
            self.stalls
                .write()
                .expect("stub lock")
                .insert(hash.to_string(), delay);
        }

        pub(crate) fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        /// Bind on an ephemeral port and return the base URL clients should
        /// be pointed at.
        pub(crate) async fn serve(&self) -> Url {
            let app = Router::new()
                .route("/ipfs/{hash}", get(serve_envelope))
                .with_state(self.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind stub gateway");
            let addr = listener.local_addr().expect("stub gateway addr");
            tokio::spawn(async move {
                axum::serve(listener, app).await.expect("serve stub gateway");
            });
            Url::parse(&format!("http://{addr}/ipfs/")).expect("stub gateway url")
        }
    }

    async fn serve_envelope(
        State(stub): State<StubGateway>,
        Path(hash): Path<String>,
    ) -> Response {
        stub.hits.fetch_add(1, Ordering::SeqCst);

        let delay = stub.stalls.read().expect("stub lock").get(&hash).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let envelope = stub.envelopes.read().expect("stub lock").get(&hash).cloned();
        match envelope {
            Some(envelope) => Json(envelope).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserKey;
    use serde_json::json;

    fn test_key() -> UserKey {
        UserKey::from_hex(&"42".repeat(32)).expect("test key parses")
    }

    fn hash(value: &str) -> ContentHash {
        ContentHash::parse(value).expect("hash parses")
    }

    #[tokio::test]
    async fn fetch_decodes_published_envelope() {
        let gateway = stub::StubGateway::new();
        gateway.publish(
            "QmPhoto",
            stub::sealed_envelope(&test_key(), &[7u8; 12], b"raw image bytes"),
        );
        let base = gateway.serve().await;

        let client = GatewayClient::new(base, Duration::from_secs(5)).expect("client builds");
        let envelope = client
            .fetch_envelope(&hash("QmPhoto"))
            .await
            .expect("fetch succeeds");

        assert_eq!(envelope.iv, vec![7u8; 12]);
        assert!(!envelope.ciphertext.is_empty());
        assert_eq!(gateway.hits(), 1);
    }

    #[tokio::test]
    async fn missing_hash_is_reported_with_status() {
        let gateway = stub::StubGateway::new();
        let base = gateway.serve().await;

        let client = GatewayClient::new(base, Duration::from_secs(5)).expect("client builds");
        let err = client
            .fetch_envelope(&hash("QmMissing"))
            .await
            .unwrap_err();

        match err {
            GatewayError::BadStatus { hash, status } => {
                assert_eq!(hash, "QmMissing");
                assert_eq!(status, StatusCode::NOT_FOUND);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_hex_payload_is_an_invalid_envelope() {
        let gateway = stub::StubGateway::new();
        gateway.publish(
            "QmBadHex",
            json!({"encryptedData": "zz-not-hex", "iv": "0011"}),
        );
        let base = gateway.serve().await;

        let client = GatewayClient::new(base, Duration::from_secs(5)).expect("client builds");
        let err = client.fetch_envelope(&hash("QmBadHex")).await.unwrap_err();

        assert!(matches!(err, GatewayError::InvalidEnvelope { .. }));
    }

    #[tokio::test]
    async fn missing_fields_are_an_invalid_envelope() {
        let gateway = stub::StubGateway::new();
        gateway.publish("QmNoIv", json!({"encryptedData": "0011"}));
        let base = gateway.serve().await;

        let client = GatewayClient::new(base, Duration::from_secs(5)).expect("client builds");
        let err = client.fetch_envelope(&hash("QmNoIv")).await.unwrap_err();

        assert!(matches!(err, GatewayError::InvalidEnvelope { .. }));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind throwaway listener");
        let addr = listener.local_addr().expect("listener addr");
        drop(listener);

        let base = Url::parse(&format!("http://{addr}/ipfs/")).expect("url parses");
        let client = GatewayClient::new(base, Duration::from_secs(1)).expect("client builds");
        let err = client.fetch_envelope(&hash("QmNowhere")).await.unwrap_err();

        match err {
            GatewayError::Request { hash, .. } => assert_eq!(hash, "QmNowhere"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_tolerated() {
        let gateway = stub::StubGateway::new();
        gateway.publish(
            "QmSlash",
            stub::sealed_envelope(&test_key(), &[1u8; 12], b"x"),
        );
        let base = gateway.serve().await;
        assert!(base.as_str().ends_with('/'));

        let client = GatewayClient::new(base, Duration::from_secs(5)).expect("client builds");
        assert!(client.fetch_envelope(&hash("QmSlash")).await.is_ok());
    }
}
