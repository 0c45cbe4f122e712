//! Bulk unlock for export.
//!
//! The export dialog lets the user tick PIN groups and type each group's PIN.
//! Every selected group is verified once; then every item is sorted into one
//! of three buckets:
//! - unmapped or unprotected: passed through unchanged
//! - bound to a verified group: decrypted, or dropped if decryption fails
//! - bound to an unselected or unverified group: dropped

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::error::Result;
use crate::gate::AccessGate;
use crate::mapping::ItemRef;

/// An item whose protected value can be swapped for its plaintext.
pub trait Protectable {
    fn item_ref(&self) -> ItemRef;

    /// The stored value: a blob when protected, plaintext otherwise.
    fn protected_value(&self) -> &str;

    fn set_protected_value(&mut self, value: String);
}

/// Minimal [`Protectable`]: an item reference plus its stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub item: ItemRef,
    pub value: String,
}

impl StoredValue {
    pub fn new(item: ItemRef, value: impl Into<String>) -> Self {
        Self {
            item,
            value: value.into(),
        }
    }
}

impl Protectable for StoredValue {
    fn item_ref(&self) -> ItemRef {
        self.item.clone()
    }

    fn protected_value(&self) -> &str {
        &self.value
    }

    fn set_protected_value(&mut self, value: String) {
        self.value = value;
    }
}

/// A group the user ticked, with the PIN they typed for it.
#[derive(Clone)]
pub struct GroupSelection {
    pub group_id: String,
    pub pin: String,
}

impl GroupSelection {
    pub fn new(group_id: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            pin: pin.into(),
        }
    }
}

impl std::fmt::Debug for GroupSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupSelection")
            .field("group_id", &self.group_id)
            .finish_non_exhaustive()
    }
}

/// Counts from one bulk unlock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub passed_through: usize,
    pub decrypted: usize,
    /// Bound to a group that was not selected or whose PIN did not verify.
    pub skipped: usize,
    /// Bound to a verified group but the blob would not decrypt.
    pub failed: usize,
    pub verified_groups: BTreeSet<String>,
    pub rejected_groups: BTreeSet<String>,
}

/// Items ready for export, plus what happened to the rest.
#[derive(Debug, Clone)]
pub struct ExportUnlock<T> {
    pub items: Vec<T>,
    pub report: ExportReport,
}

impl AccessGate {
    /// Per-group check the export dialog runs as the user types.
    pub fn validate_selection(&self, selection: &GroupSelection) -> Result<()> {
        self.credentials()
            .verify_group(&selection.group_id, &selection.pin)
    }

    /// Decrypt everything the selected groups unlock, in input order.
    pub fn unlock_for_export<T: Protectable>(
        &self,
        items: Vec<T>,
        selections: &[GroupSelection],
    ) -> ExportUnlock<T> {
        let mut report = ExportReport::default();

        let mut verified: HashMap<&str, &str> = HashMap::new();
        for selection in selections {
            if verified.contains_key(selection.group_id.as_str()) {
                continue;
            }
            match self.validate_selection(selection) {
                Ok(()) => {
                    report.rejected_groups.remove(&selection.group_id);
                    report.verified_groups.insert(selection.group_id.clone());
                    verified.insert(&selection.group_id, &selection.pin);
                }
                Err(err) => {
                    debug!(group_id = %selection.group_id, error = %err, "export group rejected");
                    report.rejected_groups.insert(selection.group_id.clone());
                }
            }
        }

        let mappings = self.mappings().mappings();
        let mut unlocked = Vec::with_capacity(items.len());
        for mut item in items {
            let item_ref = item.item_ref();
            let group_id = mappings
                .iter()
                .find(|m| m.matches(&item_ref))
                .and_then(|m| m.guarding_group());

            let Some(group_id) = group_id else {
                report.passed_through += 1;
                unlocked.push(item);
                continue;
            };

            let Some(pin) = verified.get(group_id) else {
                report.skipped += 1;
                continue;
            };

            match self.cipher().decrypt(item.protected_value(), pin) {
                Ok(plaintext) => {
                    item.set_protected_value(plaintext);
                    report.decrypted += 1;
                    unlocked.push(item);
                }
                Err(_) => {
                    warn!(item = %item_ref, "export skipped item that failed to decrypt");
                    report.failed += 1;
                }
            }
        }

        debug!(
            decrypted = report.decrypted,
            passed_through = report.passed_through,
            skipped = report.skipped,
            failed = report.failed,
            "bulk unlock finished"
        );
        ExportUnlock {
            items: unlocked,
            report,
        }
    }
}
