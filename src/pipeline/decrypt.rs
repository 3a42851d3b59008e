// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM decryption of fetched envelopes.
//!
//! Publishers seal each image under the owner's 256-bit key with a fresh
//! 12-byte nonce, carried alongside the ciphertext as the envelope `iv`.
//! GCM authenticates as it decrypts, so a wrong key, a tampered body, or a
//! truncated blob all surface as the same authentication failure.

use aes_gcm::{aead::Aead, Aes256Gcm, Key, KeyInit, Nonce};

use super::gateway::EncryptedEnvelope;
use crate::models::UserKey;

/// Nonce length AES-GCM requires here.
pub const IV_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("envelope iv must be {IV_LEN} bytes, got {0}")]
    BadIvLength(usize),

    #[error("ciphertext failed authentication")]
    Unauthenticated,
}

/// Recover the plaintext image from `envelope` under `key`.
pub fn decrypt_envelope(
    envelope: &EncryptedEnvelope,
    key: &UserKey,
) -> Result<Vec<u8>, DecryptError> {
    if envelope.iv.len() != IV_LEN {
        return Err(DecryptError::BadIvLength(envelope.iv.len()));
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Nonce::from_slice(&envelope.iv);
    cipher
        .decrypt(nonce, envelope.ciphertext.as_slice())
        .map_err(|_| DecryptError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(byte: u8) -> UserKey {
        UserKey::from_hex(&hex::encode([byte; 32])).expect("test key parses")
    }

    fn sealed(key: &UserKey, iv: [u8; IV_LEN], plaintext: &[u8]) -> EncryptedEnvelope {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .expect("sealing test envelope succeeds");
        EncryptedEnvelope {
            ciphertext,
            iv: iv.to_vec(),
        }
    }

    #[test]
    fn recovers_what_the_publisher_sealed() {
        let key = key_of(0x01);
        let envelope = sealed(&key, [9u8; IV_LEN], b"portrait.png bytes");

        let plaintext = decrypt_envelope(&envelope, &key).expect("decrypts");
        assert_eq!(plaintext, b"portrait.png bytes");
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let envelope = sealed(&key_of(0x01), [9u8; IV_LEN], b"secret");

        let err = decrypt_envelope(&envelope, &key_of(0x02)).unwrap_err();
        assert!(matches!(err, DecryptError::Unauthenticated));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = key_of(0x03);
        let mut envelope = sealed(&key, [9u8; IV_LEN], b"secret");
        envelope.ciphertext[0] ^= 0xff;

        let err = decrypt_envelope(&envelope, &key).unwrap_err();
        assert!(matches!(err, DecryptError::Unauthenticated));
    }

    #[test]
    fn truncated_ciphertext_fails_authentication() {
        let key = key_of(0x04);
        let mut envelope = sealed(&key, [9u8; IV_LEN], b"secret");
        envelope.ciphertext.truncate(4);

        let err = decrypt_envelope(&envelope, &key).unwrap_err();
        assert!(matches!(err, DecryptError::Unauthenticated));
    }

    #[test]
    fn iv_of_the_wrong_length_is_rejected_up_front() {
        let key = key_of(0x05);
        let mut envelope = sealed(&key, [9u8; IV_LEN], b"secret");
        envelope.iv = vec![0u8; 16];

        let err = decrypt_envelope(&envelope, &key).unwrap_err();
        assert!(matches!(err, DecryptError::BadIvLength(16)));
    }
}
