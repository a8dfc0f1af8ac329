//! Administrative passkey hashing and verification
//!
//! A single shared secret guards every mutating action. Only its SHA-256
//! hex digest is stored; older stores may still hold the plain text, which
//! is replaced with the digest the first time it verifies.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::error::Result;
use crate::store::{Passkey, StoreAdapter, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("passkey must not be empty")]
    EmptyPasskey,

    #[error("incorrect passkey")]
    Mismatch,

    #[error("no passkey has been set")]
    NotSet,

    #[error("this action requires the administrative passkey")]
    Required,
}

/// SHA-256 of the passkey as 64 lowercase hex characters
pub fn hash_passkey(passkey: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(passkey.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Whether a stored value is a digest rather than legacy plain text
pub fn is_hashed(stored: &str) -> bool {
    stored.len() == 64 && stored.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Outcome of comparing input against the stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Matched,
    /// Matched a plain-text value that should now be replaced by its hash
    MatchedLegacy,
    Mismatch,
}

impl Verification {
    pub fn is_match(self) -> bool {
        self != Verification::Mismatch
    }
}

pub fn verify_passkey(input: &str, stored: &str) -> Verification {
    if is_hashed(stored) {
        if hash_passkey(input) == stored {
            Verification::Matched
        } else {
            Verification::Mismatch
        }
    } else if !stored.is_empty() && input == stored {
        Verification::MatchedLegacy
    } else {
        Verification::Mismatch
    }
}

/// Passkey operations bound to a store
#[derive(Debug, Clone, Copy)]
pub struct CredentialGate<'a> {
    store: &'a StoreAdapter,
}

impl<'a> CredentialGate<'a> {
    pub fn new(store: &'a StoreAdapter) -> Self {
        Self { store }
    }

    async fn stored(&self) -> std::result::Result<String, StoreError> {
        self.store.load::<Passkey>().await
    }

    pub async fn is_set(&self) -> std::result::Result<bool, StoreError> {
        Ok(!self.stored().await?.is_empty())
    }

    /// Replace the passkey, storing only its hash
    pub async fn set(&self, passkey: &str) -> Result<()> {
        if passkey.is_empty() {
            return Err(CredentialError::EmptyPasskey.into());
        }
        self.store.save::<Passkey>(&hash_passkey(passkey)).await?;
        tracing::info!("administrative passkey updated");
        Ok(())
    }

    /// Compare input with the stored passkey, migrating a plain-text value
    /// to its hash on a successful match
    pub async fn verify(&self, input: &str) -> std::result::Result<bool, StoreError> {
        let stored = self.stored().await?;
        let outcome = verify_passkey(input, &stored);
        if outcome == Verification::MatchedLegacy {
            match self.store.save::<Passkey>(&hash_passkey(input)).await {
                Ok(()) => tracing::info!("legacy plain-text passkey replaced by its hash"),
                Err(e) => tracing::warn!(error = %e, "could not migrate legacy passkey"),
            }
        }
        Ok(outcome.is_match())
    }

    /// Require the passkey: fails when none is set or the input is wrong
    pub async fn check(&self, input: &str) -> Result<()> {
        if !self.is_set().await? {
            return Err(CredentialError::NotSet.into());
        }
        if !self.verify(input).await? {
            return Err(CredentialError::Mismatch.into());
        }
        Ok(())
    }
}
