//! Access gate orchestration.
//!
//! The gate is the only component the UI talks to. It ties the PIN registry,
//! the mapping store, and the cipher together:
//! 1. Verify the PIN against the item's group
//! 2. Encrypt or decrypt the item's protected value
//! 3. Record the binding
//!
//! Nothing is written until verification and encryption have both
//! succeeded, so an abandoned or failed action leaves no partial state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::GateConfig;
use crate::credentials::{GroupId, PinCredentialStore};
use crate::crypto::Cipher;
use crate::error::{AccessOutcome, PinGateError, Result};
use crate::mapping::{AccessMapping, AccessMappingStore, ItemRef};
use crate::store::Persistence;

/// The value handed back by [`AccessGate::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Released {
    /// The item is not protected; the stored value is already plaintext.
    Unguarded(String),
    /// The item was protected and the PIN unlocked it.
    Unlocked(String),
}

impl Released {
    pub fn was_gated(&self) -> bool {
        matches!(self, Self::Unlocked(_))
    }

    pub fn into_inner(self) -> String {
        match self {
            Self::Unguarded(value) | Self::Unlocked(value) => value,
        }
    }
}

impl From<Released> for String {
    fn from(released: Released) -> Self {
        released.into_inner()
    }
}

/// Orchestrates protect / unprotect / open over the two stores.
///
/// Construct once per process and share.
#[derive(Clone)]
pub struct AccessGate {
    credentials: PinCredentialStore,
    mappings: AccessMappingStore,
    cipher: Cipher,
}

impl AccessGate {
    pub fn new(config: &GateConfig, port: Arc<dyn Persistence>) -> Self {
        Self {
            credentials: PinCredentialStore::new(
                Arc::clone(&port),
                config.groups_key.clone(),
                config.cipher_mode,
            ),
            mappings: AccessMappingStore::new(port, config.mappings_key.clone()),
            cipher: Cipher::new(config.cipher_mode),
        }
    }

    pub fn credentials(&self) -> &PinCredentialStore {
        &self.credentials
    }

    pub fn mappings(&self) -> &AccessMappingStore {
        &self.mappings
    }

    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    /// Put `item` behind `group_id`.
    ///
    /// Returns the blob the caller stores in place of `plaintext`. On any
    /// failure the mapping is left as it was.
    pub fn protect(
        &self,
        item: &ItemRef,
        group_id: &str,
        pin: &str,
        plaintext: &str,
    ) -> Result<String> {
        self.credentials.verify_group(group_id, pin)?;
        let blob = self.cipher.encrypt(plaintext, pin)?;
        self.mappings.set_mapping(item, true, Some(group_id))?;
        debug!(item = %item, group_id, "protected item");
        Ok(blob)
    }

    /// Mark `item` unprotected.
    ///
    /// The caller must already hold the plaintext and re-store it; a value
    /// still encrypted at this point becomes unreadable through the gate.
    /// Prefer [`AccessGate::unprotect_with_pin`].
    pub fn unprotect(&self, item: &ItemRef) -> Result<AccessMapping> {
        let mapping = self.mappings.set_mapping(item, false, None)?;
        debug!(item = %item, "unprotected item");
        Ok(mapping)
    }

    /// Decrypt `stored` with `pin`, then mark `item` unprotected.
    ///
    /// Returns the plaintext for the caller to store back.
    pub fn unprotect_with_pin(&self, item: &ItemRef, pin: &str, stored: &str) -> Result<String> {
        let plaintext = self.unlock(item, pin, stored)?;
        self.unprotect(item)?;
        Ok(plaintext)
    }

    /// Release the value of `item`.
    ///
    /// Unmapped or unprotected items pass `stored` straight through without
    /// looking at `pin`.
    pub fn open(&self, item: &ItemRef, pin: &str, stored: &str) -> Result<Released> {
        match self.mappings.get_mapping(item) {
            Some(mapping) if mapping.protected => {
                self.unlock(item, pin, stored).map(Released::Unlocked)
            }
            _ => Ok(Released::Unguarded(stored.to_string())),
        }
    }

    /// [`AccessGate::open`] collapsed for the UI: every failure is `Denied`.
    pub fn open_outcome(&self, item: &ItemRef, pin: &str, stored: &str) -> AccessOutcome {
        let result = self.open(item, pin, stored);
        if let Err(err) = &result {
            if err.is_denial() {
                warn!(item = %item, "access denied");
            } else {
                warn!(item = %item, error = %err, "access denied by consistency error");
            }
        }
        result.into()
    }

    /// Re-encrypt a new value for an item that is already protected.
    ///
    /// The PIN is checked against the item's current group. The mapping is
    /// unchanged.
    pub fn reseal(&self, item: &ItemRef, pin: &str, plaintext: &str) -> Result<String> {
        let group_id = self.bound_group(item)?;
        self.credentials.verify_group(&group_id, pin)?;
        self.cipher.encrypt(plaintext, pin)
    }

    /// Drop the mapping of a deleted item.
    pub fn forget(&self, item: &ItemRef) -> Result<bool> {
        self.mappings.clear_mapping(item)
    }

    /// The hint for the group guarding `item`, for the PIN prompt.
    pub fn hint_for(&self, item: &ItemRef) -> Result<Option<String>> {
        let group_id = self.bound_group(item)?;
        self.credentials.hint(&group_id)
    }

    /// Protected mappings whose group has been deleted.
    pub fn orphaned(&self) -> Vec<AccessMapping> {
        let orphans = self.mappings.orphaned(&self.credentials.groups());
        if !orphans.is_empty() {
            warn!(count = orphans.len(), "protected items reference deleted groups");
        }
        orphans
    }

    fn bound_group(&self, item: &ItemRef) -> Result<GroupId> {
        self.mappings
            .group_for(item)
            .ok_or_else(|| PinGateError::NoMapping(item.clone()))
    }

    /// Verify `pin` against the item's group, then decrypt.
    fn unlock(&self, item: &ItemRef, pin: &str, stored: &str) -> Result<String> {
        let group_id = self.bound_group(item)?;
        self.credentials.verify_group(&group_id, pin)?;
        self.cipher.decrypt(stored, pin)
    }
}
