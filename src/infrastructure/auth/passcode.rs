//! Team passcodes: generation, one-way hashing and verification

use std::fmt::Debug;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::domain::DomainError;

const PASSCODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const DEFAULT_PASSCODE_LENGTH: usize = 8;

/// Source of new plaintext passcodes
pub trait PasscodeGenerator: Send + Sync + Debug {
    fn generate(&self) -> String;
}

/// Random uppercase alphanumeric passcodes drawn from the OS RNG
#[derive(Debug, Clone)]
pub struct RandomPasscodeGenerator {
    length: usize,
}

impl RandomPasscodeGenerator {
    pub fn new() -> Self {
        Self {
            length: DEFAULT_PASSCODE_LENGTH,
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }
}

impl Default for RandomPasscodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PasscodeGenerator for RandomPasscodeGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rngs::OsRng;

        (0..self.length)
            .map(|_| PASSCODE_ALPHABET[rng.gen_range(0..PASSCODE_ALPHABET.len())] as char)
            .collect()
    }
}

/// Always hands out the same passcode
#[derive(Debug, Clone)]
pub struct FixedPasscodeGenerator(String);

impl FixedPasscodeGenerator {
    pub fn new(passcode: impl Into<String>) -> Self {
        Self(passcode.into())
    }
}

impl PasscodeGenerator for FixedPasscodeGenerator {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// Cost factor of the passcode hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasscodeHashCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasscodeHashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
        }
    }
}

/// A freshly generated passcode together with its hash.
///
/// The plaintext is meant to be shown to the team exactly once.
#[derive(Clone)]
pub struct IssuedPasscode {
    pub plaintext: String,
    pub hash: String,
}

impl Debug for IssuedPasscode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedPasscode")
            .field("plaintext", &"[hidden]")
            .field("hash", &self.hash)
            .finish()
    }
}

/// Generates passcodes and checks submitted ones against stored Argon2 hashes
#[derive(Debug, Clone)]
pub struct PasscodeAuthenticator {
    generator: Arc<dyn PasscodeGenerator>,
    cost: PasscodeHashCost,
}

impl PasscodeAuthenticator {
    pub fn new(generator: Arc<dyn PasscodeGenerator>, cost: PasscodeHashCost) -> Self {
        Self { generator, cost }
    }

    pub fn generate(&self) -> String {
        self.generator.generate()
    }

    /// Hash a passcode with the configured cost
    pub fn hash(&self, passcode: &str) -> Result<String, DomainError> {
        let params = Params::new(self.cost.memory_kib, self.cost.iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| DomainError::hashing(format!("Invalid hash cost: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);

        argon2
            .hash_password(passcode.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::hashing(format!("Failed to hash passcode: {}", e)))
    }

    /// True iff `candidate` matches `hash`; malformed hashes never match
    pub fn verify(&self, hash: &str, candidate: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Generate a new passcode and hash it
    pub fn issue(&self) -> Result<IssuedPasscode, DomainError> {
        let plaintext = self.generate();
        let hash = self.hash(&plaintext)?;

        Ok(IssuedPasscode { plaintext, hash })
    }
}

/// Constant-time comparison of a shared secret with a submitted value.
///
/// Both sides are digested first so the comparison time does not depend on
/// either length.
pub fn secret_matches(expected: &str, candidate: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let candidate = Sha256::digest(candidate.as_bytes());

    expected
        .iter()
        .zip(candidate.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
