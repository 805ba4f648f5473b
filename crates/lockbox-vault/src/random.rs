// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographically secure randomness from the operating system.
//!
//! Every key, salt, nonce, session token and generated password in this crate
//! is drawn through these functions. There is no seeded or userspace PRNG.

use lockbox_core::LockboxError;
use ring::rand::{SecureRandom, SystemRandom};

/// Fill `dest` with random bytes.
pub fn fill(dest: &mut [u8]) -> Result<(), LockboxError> {
    SystemRandom::new()
        .fill(dest)
        .map_err(|_| LockboxError::Internal("system random source unavailable".to_string()))
}

/// Return `n` random bytes.
pub fn bytes(n: usize) -> Result<Vec<u8>, LockboxError> {
    let mut out = vec![0u8; n];
    fill(&mut out)?;
    Ok(out)
}

/// Return a random fixed-size array.
pub fn array<const N: usize>() -> Result<[u8; N], LockboxError> {
    let mut out = [0u8; N];
    fill(&mut out)?;
    Ok(out)
}

/// Return `n` random bytes hex-encoded (`2 * n` characters).
pub fn token_hex(n: usize) -> Result<String, LockboxError> {
    Ok(hex::encode(bytes(n)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_has_requested_length() {
        assert_eq!(bytes(0).unwrap().len(), 0);
        assert_eq!(bytes(33).unwrap().len(), 33);
    }

    #[test]
    fn consecutive_draws_differ() {
        let a: [u8; 32] = array().unwrap();
        let b: [u8; 32] = array().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_hex_is_lowercase_hex() {
        let token = token_hex(16).unwrap();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
