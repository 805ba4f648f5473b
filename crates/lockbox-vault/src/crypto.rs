// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM seal/open with a self-describing envelope.
//!
//! Sealed layout: `version (1) || nonce (12) || ciphertext || tag (16)`.
//! Every call to [`seal`] draws a fresh 96-bit nonce from the system CSPRNG.
//! Nonce reuse under one key would be catastrophic for GCM.

use lockbox_core::LockboxError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};

use crate::random;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Envelope format version written as the first byte of every sealed value.
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 1 + NONCE_LEN;

fn aead_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, LockboxError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| LockboxError::Internal("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key`.
///
/// The output is `plaintext.len() + 29` bytes long.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, LockboxError> {
    let key = aead_key(key)?;
    let nonce_bytes: [u8; NONCE_LEN] = random::array()?;

    let mut out = Vec::with_capacity(HEADER_LEN + plaintext.len() + TAG_LEN);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&nonce_bytes);

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| LockboxError::Internal("AES-256-GCM encryption failed".to_string()))?;

    out.extend_from_slice(&in_out);
    Ok(out)
}

/// Decrypt a value produced by [`seal`].
///
/// Any truncation, unknown version, wrong key or modified byte yields
/// [`LockboxError::Authentication`]. Unauthenticated bytes are never returned.
pub fn open(key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Vec<u8>, LockboxError> {
    if sealed.len() < HEADER_LEN + TAG_LEN || sealed[0] != FORMAT_VERSION {
        return Err(LockboxError::Authentication);
    }

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&sealed[1..HEADER_LEN]);

    let key = aead_key(key)?;
    let mut in_out = sealed[HEADER_LEN..].to_vec();
    let plaintext = key
        .open_in_place(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| LockboxError::Authentication)?;

    Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> [u8; KEY_LEN] {
        random::array().unwrap()
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = key();
        let sealed = seal(&key, b"s3cr3t").unwrap();
        assert_eq!(open(&key, &sealed).unwrap(), b"s3cr3t");
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = key();
        let sealed = seal(&key, b"").unwrap();
        assert_eq!(sealed.len(), HEADER_LEN + TAG_LEN);
        assert!(open(&key, &sealed).unwrap().is_empty());
    }

    #[test]
    fn seal_produces_different_output_for_same_plaintext() {
        let key = key();
        let a = seal(&key, b"same input twice").unwrap();
        let b = seal(&key, b"same input twice").unwrap();

        assert_ne!(a[1..HEADER_LEN], b[1..HEADER_LEN], "nonces must differ");
        assert_ne!(a, b);
    }

    #[test]
    fn sealed_layout_has_version_nonce_and_tag() {
        let sealed = seal(&key(), b"hello").unwrap();
        assert_eq!(sealed[0], FORMAT_VERSION);
        assert_eq!(sealed.len(), 1 + NONCE_LEN + 5 + TAG_LEN);
    }

    #[test]
    fn open_with_wrong_key_fails() {
        let sealed = seal(&key(), b"secret data").unwrap();
        assert!(matches!(
            open(&key(), &sealed),
            Err(LockboxError::Authentication)
        ));
    }

    #[test]
    fn every_single_byte_flip_is_detected() {
        let key = key();
        let sealed = seal(&key, b"do not tamper").unwrap();

        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            assert!(
                matches!(open(&key, &tampered), Err(LockboxError::Authentication)),
                "flip at byte {i} was not detected"
            );
        }
    }

    #[test]
    fn truncated_input_fails() {
        let key = key();
        let sealed = seal(&key, b"abc").unwrap();

        for len in [0, 1, HEADER_LEN, HEADER_LEN + TAG_LEN - 1, sealed.len() - 1] {
            assert!(matches!(
                open(&key, &sealed[..len]),
                Err(LockboxError::Authentication)
            ));
        }
    }

    #[test]
    fn unknown_version_fails() {
        let key = key();
        let mut sealed = seal(&key, b"abc").unwrap();
        sealed[0] = 2;
        assert!(matches!(open(&key, &sealed), Err(LockboxError::Authentication)));
    }

    proptest! {
        #[test]
        fn roundtrip_any_plaintext(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
            let key = key();
            let sealed = seal(&key, &plaintext).unwrap();
            prop_assert_eq!(sealed.len(), plaintext.len() + HEADER_LEN + TAG_LEN);
            prop_assert_eq!(open(&key, &sealed).unwrap(), plaintext);
        }
    }
}
