//! PIN group registry.
//!
//! A PIN group is a named shared secret that gates zero or more items. The
//! registry stores only a one-way digest of each PIN plus a non-secret hint.
//! The raw PIN is hashed and dropped; it is never persisted or logged.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::CipherMode;
use crate::crypto;
use crate::error::{PinGateError, Result};
use crate::store::{self, Persistence};

/// Minimum PIN length, counted in UTF-16 code units as the launcher counts it.
pub const MIN_PIN_LENGTH: usize = 4;

/// A unique identifier for a PIN group.
pub type GroupId = String;

/// A named PIN group as persisted.
///
/// Field names and the millisecond timestamp match the launcher's stored JSON.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinGroup {
    pub id: GroupId,
    pub name: String,
    pub hashed_pin: String,
    #[serde(default)]
    pub hint: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl PinGroup {
    /// The hint, or `None` when the group was created without one.
    pub fn hint(&self) -> Option<&str> {
        Some(self.hint.as_str()).filter(|h| !h.is_empty())
    }
}

impl fmt::Debug for PinGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinGroup")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("hint", &self.hint)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Reject PINs shorter than [`MIN_PIN_LENGTH`] characters.
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.encode_utf16().count() < MIN_PIN_LENGTH {
        return Err(PinGateError::InvalidPin {
            min: MIN_PIN_LENGTH,
        });
    }
    Ok(())
}

/// Handle over the persisted PIN group collection.
#[derive(Clone)]
pub struct PinCredentialStore {
    port: Arc<dyn Persistence>,
    key: String,
    mode: CipherMode,
}

impl PinCredentialStore {
    pub fn new(port: Arc<dyn Persistence>, key: impl Into<String>, mode: CipherMode) -> Self {
        Self {
            port,
            key: key.into(),
            mode,
        }
    }

    /// Digest a PIN for storage. Rejects short PINs before hashing.
    pub fn hash(&self, pin: &str) -> Result<String> {
        validate_pin(pin)?;
        Ok(crypto::hash_pin(self.mode, pin))
    }

    /// Re-hash `pin` and compare against `digest`.
    pub fn verify(&self, pin: &str, digest: &str) -> bool {
        validate_pin(pin).is_ok() && crypto::verify_pin(self.mode, pin, digest)
    }

    /// All groups, in creation order.
    pub fn groups(&self) -> Vec<PinGroup> {
        store::load(self.port.as_ref(), &self.key)
    }

    pub fn group(&self, id: &str) -> Option<PinGroup> {
        self.groups().into_iter().find(|g| g.id == id)
    }

    /// The hint shown alongside the PIN prompt for `id`.
    pub fn hint(&self, id: &str) -> Result<Option<String>> {
        let group = self
            .group(id)
            .ok_or_else(|| PinGateError::UnknownGroup(id.to_string()))?;
        Ok(group.hint().map(str::to_string))
    }

    /// Create a group and return its id.
    ///
    /// Name, PIN, and hint are trimmed. The PIN is length-checked and hashed
    /// before anything is written.
    pub fn add_group(&self, name: &str, pin: &str, hint: &str) -> Result<GroupId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PinGateError::InvalidGroupName);
        }
        let hashed_pin = self.hash(pin.trim())?;

        let group = PinGroup {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            hashed_pin,
            hint: hint.trim().to_string(),
            created_at: Utc::now(),
        };
        let id = group.id.clone();

        let mut groups: Vec<PinGroup> = store::load_for_update(self.port.as_ref(), &self.key)?;
        groups.push(group);
        store::save(self.port.as_ref(), &self.key, &groups)?;

        debug!(group_id = %id, "created PIN group");
        Ok(id)
    }

    /// Remove a group. Mappings that reference it are left in place.
    ///
    /// Returns whether a group was removed.
    pub fn delete_group(&self, id: &str) -> Result<bool> {
        let mut groups: Vec<PinGroup> = store::load_for_update(self.port.as_ref(), &self.key)?;
        let before = groups.len();
        groups.retain(|g| g.id != id);
        if groups.len() == before {
            return Ok(false);
        }
        store::save(self.port.as_ref(), &self.key, &groups)?;
        debug!(group_id = %id, "deleted PIN group");
        Ok(true)
    }

    /// Check `pin` against the group `id`.
    pub fn verify_group(&self, id: &str, pin: &str) -> Result<()> {
        validate_pin(pin)?;
        let group = self
            .group(id)
            .ok_or_else(|| PinGateError::UnknownGroup(id.to_string()))?;
        if crypto::verify_pin(self.mode, pin, &group.hashed_pin) {
            Ok(())
        } else {
            Err(PinGateError::WrongPin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPersistence;

    fn store() -> PinCredentialStore {
        PinCredentialStore::new(Arc::new(MemoryPersistence::new()), "pins", CipherMode::Primary)
    }

    #[test]
    fn add_group_never_stores_raw_pin() {
        let port = Arc::new(MemoryPersistence::new());
        let creds = PinCredentialStore::new(port.clone(), "pins", CipherMode::Primary);
        creds.add_group("Bank", "4242", "last 4 digits").unwrap();

        let raw = port.load_raw("pins").unwrap().unwrap();
        assert!(!raw.contains("4242"));
        assert!(raw.contains("hashedPin"));
        assert!(raw.contains("createdAt"));
    }

    #[test]
    fn short_pin_rejected_before_hashing() {
        let creds = store();
        assert!(matches!(
            creds.add_group("Bank", "123", ""),
            Err(PinGateError::InvalidPin { min: 4 })
        ));
        assert!(creds.groups().is_empty());
        assert!(!creds.verify("123", &crypto::hash_pin(CipherMode::Primary, "123")));
    }

    #[test]
    fn pin_length_counts_utf16_units() {
        assert!(validate_pin("4242").is_ok());
        assert!(validate_pin("424").is_err());
        // Each astral-plane character is a surrogate pair.
        assert!(validate_pin("\u{1F600}\u{1F600}").is_ok());
        assert!(validate_pin("\u{1F600}").is_err());
    }

    #[test]
    fn blank_name_rejected() {
        assert!(matches!(
            store().add_group("   ", "4242", ""),
            Err(PinGateError::InvalidGroupName)
        ));
    }

    #[test]
    fn inputs_are_trimmed() {
        let creds = store();
        let id = creds.add_group("  Bank ", " 4242 ", "  hint ").unwrap();
        let group = creds.group(&id).unwrap();
        assert_eq!(group.name, "Bank");
        assert_eq!(group.hint(), Some("hint"));
        assert!(creds.verify_group(&id, "4242").is_ok());
    }

    #[test]
    fn verify_group_kinds() {
        let creds = store();
        let id = creds.add_group("Bank", "4242", "").unwrap();
        assert!(creds.verify_group(&id, "4242").is_ok());
        assert!(matches!(creds.verify_group(&id, "0000"), Err(PinGateError::WrongPin)));
        assert!(matches!(
            creds.verify_group("missing", "4242"),
            Err(PinGateError::UnknownGroup(_))
        ));
        assert_eq!(creds.hint(&id).unwrap(), None);
    }

    #[test]
    fn delete_group_reports_removal() {
        let creds = store();
        let id = creds.add_group("Bank", "4242", "").unwrap();
        assert!(creds.delete_group(&id).unwrap());
        assert!(!creds.delete_group(&id).unwrap());
        assert!(creds.group(&id).is_none());
    }

    #[test]
    fn reads_launcher_json() {
        let port = Arc::new(MemoryPersistence::new());
        port.save_raw(
            "pins",
            r#"[{"id":"g1","name":"Bank","hashedPin":"00170842","hint":"","createdAt":1700000000000}]"#,
        )
        .unwrap();
        let creds = PinCredentialStore::new(port, "pins", CipherMode::Fallback);
        let group = creds.group("g1").unwrap();
        assert_eq!(group.created_at.timestamp_millis(), 1_700_000_000_000);
        assert!(creds.verify_group("g1", "1234").is_ok());
    }
}
