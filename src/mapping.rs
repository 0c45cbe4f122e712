//! Access mappings.
//!
//! A mapping binds one stored item (an app or a note) to the PIN group that
//! guards it. The store knows nothing about the items themselves; callers
//! must clear a mapping whenever they delete its item.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::{GroupId, PinGroup};
use crate::error::{PinGateError, Result};
use crate::store::{self, Persistence};

/// The kinds of item the launcher can protect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    App,
    Note,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App => f.write_str("app"),
            Self::Note => f.write_str("note"),
        }
    }
}

/// Identity of a protectable item: its id plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub id: String,
    pub kind: ItemKind,
}

impl ItemRef {
    pub fn new(id: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn app(id: impl Into<String>) -> Self {
        Self::new(id, ItemKind::App)
    }

    pub fn note(id: impl Into<String>) -> Self {
        Self::new(id, ItemKind::Note)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// One persisted binding.
///
/// Invariant: `protected` is true exactly when `group_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMapping {
    #[serde(rename = "id")]
    pub item_id: String,
    #[serde(rename = "type")]
    pub item_kind: ItemKind,
    #[serde(rename = "hasPin")]
    pub protected: bool,
    #[serde(rename = "pinId", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

impl AccessMapping {
    pub fn item(&self) -> ItemRef {
        ItemRef::new(self.item_id.clone(), self.item_kind)
    }

    pub(crate) fn matches(&self, item: &ItemRef) -> bool {
        self.item_id == item.id && self.item_kind == item.kind
    }

    /// The group guarding this item, if it is protected.
    pub fn guarding_group(&self) -> Option<&str> {
        if self.protected {
            self.group_id.as_deref()
        } else {
            None
        }
    }
}

/// Handle over the persisted mapping collection.
#[derive(Clone)]
pub struct AccessMappingStore {
    port: Arc<dyn Persistence>,
    key: String,
}

impl AccessMappingStore {
    pub fn new(port: Arc<dyn Persistence>, key: impl Into<String>) -> Self {
        Self {
            port,
            key: key.into(),
        }
    }

    pub fn mappings(&self) -> Vec<AccessMapping> {
        store::load(self.port.as_ref(), &self.key)
    }

    pub fn get_mapping(&self, item: &ItemRef) -> Option<AccessMapping> {
        self.mappings().into_iter().find(|m| m.matches(item))
    }

    /// Insert or replace the mapping for `item`.
    ///
    /// `protected = false` always drops the group. `protected = true` requires
    /// a group.
    pub fn set_mapping(
        &self,
        item: &ItemRef,
        protected: bool,
        group_id: Option<&str>,
    ) -> Result<AccessMapping> {
        let group_id = if protected {
            Some(
                group_id
                    .ok_or_else(|| PinGateError::MissingGroup(item.clone()))?
                    .to_string(),
            )
        } else {
            None
        };
        let mapping = AccessMapping {
            item_id: item.id.clone(),
            item_kind: item.kind,
            protected,
            group_id,
        };

        let mut mappings: Vec<AccessMapping> =
            store::load_for_update(self.port.as_ref(), &self.key)?;
        match mappings.iter_mut().find(|m| m.matches(item)) {
            Some(existing) => *existing = mapping.clone(),
            None => mappings.push(mapping.clone()),
        }
        store::save(self.port.as_ref(), &self.key, &mappings)?;

        debug!(item = %item, protected, "wrote access mapping");
        Ok(mapping)
    }

    /// Remove the mapping for `item`. Returns whether one existed.
    pub fn clear_mapping(&self, item: &ItemRef) -> Result<bool> {
        let mut mappings: Vec<AccessMapping> =
            store::load_for_update(self.port.as_ref(), &self.key)?;
        let before = mappings.len();
        mappings.retain(|m| !m.matches(item));
        if mappings.len() == before {
            return Ok(false);
        }
        store::save(self.port.as_ref(), &self.key, &mappings)?;
        debug!(item = %item, "cleared access mapping");
        Ok(true)
    }

    pub fn is_protected(&self, item: &ItemRef) -> bool {
        self.get_mapping(item).is_some_and(|m| m.protected)
    }

    /// The group guarding `item`, if any.
    pub fn group_for(&self, item: &ItemRef) -> Option<GroupId> {
        self.get_mapping(item)
            .and_then(|m| m.guarding_group().map(str::to_string))
    }

    /// Protected mappings whose group is not in `groups`.
    ///
    /// Items behind these mappings can no longer be opened.
    pub fn orphaned(&self, groups: &[PinGroup]) -> Vec<AccessMapping> {
        self.mappings()
            .into_iter()
            .filter(|m| {
                m.guarding_group()
                    .is_some_and(|gid| !groups.iter().any(|g| g.id == gid))
            })
            .collect()
    }
}
