// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random password generation.

use lockbox_config::model::GeneratorConfig;
use lockbox_core::LockboxError;
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::random;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";
const LOOK_ALIKES: &[u8] = b"Il1O0";

/// Random bytes drawn per CSPRNG call while sampling.
const POOL_LEN: usize = 64;

/// Character classes for [`PasswordGenerator::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub include_numbers: bool,
    pub include_symbols: bool,
    pub exclude_look_alikes: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            include_numbers: true,
            include_symbols: true,
            exclude_look_alikes: true,
        }
    }
}

/// Produces uniformly random passwords within configured length bounds.
#[derive(Debug, Clone)]
pub struct PasswordGenerator {
    min_length: usize,
    max_length: usize,
    default_length: usize,
}

impl PasswordGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
            default_length: config.default_length,
        }
    }

    pub fn default_length(&self) -> usize {
        self.default_length
    }

    /// The character set for `options`, letters first.
    pub fn alphabet(options: &GeneratorOptions) -> Vec<u8> {
        let mut alphabet = Vec::with_capacity(90);
        alphabet.extend_from_slice(LOWERCASE);
        alphabet.extend_from_slice(UPPERCASE);
        if options.include_numbers {
            alphabet.extend_from_slice(DIGITS);
        }
        if options.include_symbols {
            alphabet.extend_from_slice(SYMBOLS);
        }
        if options.exclude_look_alikes {
            alphabet.retain(|c| !LOOK_ALIKES.contains(c));
        }
        alphabet
    }

    /// Generate a password of exactly `length` characters.
    ///
    /// Each character is an independent uniform draw from the alphabet.
    /// Bytes at or above the largest multiple of the alphabet size are
    /// discarded so no character is favoured.
    pub fn generate(
        &self,
        length: usize,
        options: &GeneratorOptions,
    ) -> Result<SecretString, LockboxError> {
        if length < self.min_length || length > self.max_length {
            return Err(LockboxError::Validation(format!(
                "password length must be between {} and {}",
                self.min_length, self.max_length
            )));
        }

        let alphabet = Self::alphabet(options);
        if alphabet.is_empty() {
            return Err(LockboxError::Validation(
                "no characters available for generation".to_string(),
            ));
        }

        let n = alphabet.len();
        let zone = 256 - (256 % n);

        let mut out = Zeroizing::new(String::with_capacity(length));
        let mut pool = Zeroizing::new([0u8; POOL_LEN]);
        while out.len() < length {
            random::fill(&mut pool[..])?;
            for &byte in pool.iter() {
                if (byte as usize) < zone {
                    out.push(alphabet[byte as usize % n] as char);
                    if out.len() == length {
                        break;
                    }
                }
            }
        }

        Ok(SecretString::from(out.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use secrecy::ExposeSecret;

    fn generator() -> PasswordGenerator {
        PasswordGenerator::new(&GeneratorConfig::default())
    }

    #[test]
    fn default_options_match_documented_defaults() {
        let options = GeneratorOptions::default();
        assert!(options.include_numbers);
        assert!(options.include_symbols);
        assert!(options.exclude_look_alikes);
    }

    #[test]
    fn generates_exact_length() {
        let g = generator();
        for len in [8, 16, 64, 128] {
            let pw = g.generate(len, &GeneratorOptions::default()).unwrap();
            assert_eq!(pw.expose_secret().chars().count(), len);
        }
    }

    #[test]
    fn letters_only_alphabet() {
        let options = GeneratorOptions {
            include_numbers: false,
            include_symbols: false,
            exclude_look_alikes: false,
        };
        let pw = generator().generate(20, &options).unwrap();
        assert_eq!(pw.expose_secret().len(), 20);
        assert!(pw.expose_secret().chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[test]
    fn look_alikes_excluded() {
        let options = GeneratorOptions {
            include_numbers: true,
            include_symbols: false,
            exclude_look_alikes: true,
        };
        let g = generator();
        for _ in 0..50 {
            let pw = g.generate(64, &options).unwrap();
            assert!(
                !pw.expose_secret().chars().any(|c| "Il1O0".contains(c)),
                "look-alike character in {}",
                pw.expose_secret()
            );
        }
    }

    #[test]
    fn alphabet_sizes() {
        let all = GeneratorOptions {
            include_numbers: true,
            include_symbols: true,
            exclude_look_alikes: false,
        };
        assert_eq!(PasswordGenerator::alphabet(&all).len(), 26 + 26 + 10 + 26);
        assert_eq!(
            PasswordGenerator::alphabet(&GeneratorOptions::default()).len(),
            26 + 26 + 10 + 26 - 5
        );
    }

    #[test]
    fn out_of_range_length_is_validation_error() {
        let g = generator();
        for len in [0, 7, 129] {
            assert!(matches!(
                g.generate(len, &GeneratorOptions::default()),
                Err(LockboxError::Validation(_))
            ));
        }
    }

    #[test]
    fn every_character_class_eventually_appears() {
        let options = GeneratorOptions {
            include_numbers: true,
            include_symbols: true,
            exclude_look_alikes: false,
        };
        let pw = generator().generate(128, &options).unwrap();
        let s = pw.expose_secret();
        // 128 draws from 88 characters: missing any class is vanishingly unlikely.
        assert!(s.chars().any(|c| c.is_ascii_lowercase()));
        assert!(s.chars().any(|c| c.is_ascii_uppercase()));
        assert!(s.chars().any(|c| c.is_ascii_digit()));
        assert!(s.chars().any(|c| SYMBOLS.contains(&(c as u8))));
    }

    #[test]
    fn consecutive_passwords_differ() {
        let g = generator();
        let a = g.generate(32, &GeneratorOptions::default()).unwrap();
        let b = g.generate(32, &GeneratorOptions::default()).unwrap();
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    proptest! {
        #[test]
        fn output_respects_length_and_alphabet(
            length in 8usize..=128,
            include_numbers: bool,
            include_symbols: bool,
            exclude_look_alikes: bool,
        ) {
            let options = GeneratorOptions { include_numbers, include_symbols, exclude_look_alikes };
            let alphabet = PasswordGenerator::alphabet(&options);
            let pw = generator().generate(length, &options).unwrap();

            prop_assert_eq!(pw.expose_secret().len(), length);
            prop_assert!(pw.expose_secret().bytes().all(|b| alphabet.contains(&b)));
        }
    }
}
