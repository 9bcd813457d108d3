//! Signed session tokens
//!
//! A token is `<identity>.<signature>` where the signature is the unpadded
//! standard base64 of HMAC-SHA256(secret, identity). Tokens carry no expiry;
//! rotating the secret invalidates every token issued under the old one.

use std::fmt::Debug;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::DomainError;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies opaque identity tokens with a shared secret
#[derive(Clone)]
pub struct SignedTokenCodec {
    secret: Vec<u8>,
}

impl Debug for SignedTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedTokenCodec")
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl SignedTokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Sign an identity, producing a token to hand out as a cookie value
    pub fn sign(&self, identity: &str) -> Result<String, DomainError> {
        let mut mac = self.mac()?;
        mac.update(identity.as_bytes());
        let signature = STANDARD_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", identity, signature))
    }

    /// Verify a token and return the identity it was issued for.
    ///
    /// Malformed tokens, undecodable signatures and mismatches all yield `None`.
    /// The signature comparison is constant-time.
    pub fn verify(&self, token: &str) -> Option<String> {
        let (identity, signature) = token.rsplit_once('.')?;
        let signature = STANDARD_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(identity.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(identity.to_string())
    }

    fn mac(&self) -> Result<HmacSha256, DomainError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| DomainError::internal(format!("Failed to initialise token signer: {}", e)))
    }
}
