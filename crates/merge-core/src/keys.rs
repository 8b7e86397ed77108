//! Key resolution: one join key (or none) per primary row.
//!
//! A key comes from the primary table's own key column when that cell is
//! non-empty, otherwise from the mapping table by account lookup. Rows with
//! neither stay unresolved; they are data, not errors.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, trace};

use merge_model::{FieldBinding, JoinKey, Table, normalize_key};

use crate::config::LOOKUP_FIELD;

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The primary row's own key column.
    Direct,
    /// The mapping table, looked up by account.
    ViaMap,
}

/// A join key for one primary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: JoinKey,
    /// Trimmed source text, case preserved.
    pub raw: String,
    pub source: KeySource,
}

/// Account lookup over the mapping table.
///
/// The first mapping row for an account wins. Rows with a blank account or
/// a blank key are skipped.
#[derive(Debug, Clone, Default)]
pub struct MappingIndex {
    by_account: HashMap<String, (JoinKey, String)>,
    duplicates: usize,
}

impl MappingIndex {
    pub fn build(table: &Table, binding: &FieldBinding, key_field: &str) -> Self {
        let mut index = Self::default();
        let (Some(lookup_idx), Some(key_idx)) =
            (binding.index_of(LOOKUP_FIELD), binding.index_of(key_field))
        else {
            return index;
        };
        for row in 0..table.len() {
            let account = normalize_key(table.cell(row, lookup_idx));
            if account.is_empty() {
                continue;
            }
            let raw = table.cell(row, key_idx);
            let Some(key) = JoinKey::parse(raw) else {
                continue;
            };
            match index.by_account.entry(account) {
                Entry::Vacant(slot) => {
                    slot.insert((key, raw.trim().to_string()));
                }
                Entry::Occupied(_) => index.duplicates += 1,
            }
        }
        debug!(
            accounts = index.by_account.len(),
            duplicates = index.duplicates,
            "built mapping index"
        );
        index
    }

    pub fn lookup(&self, account: &str) -> Option<&(JoinKey, String)> {
        self.by_account.get(&normalize_key(account))
    }

    pub fn len(&self) -> usize {
        self.by_account.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_account.is_empty()
    }

    /// Mapping rows ignored because their account was already mapped.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Per-row keys for the primary table.
#[derive(Debug, Clone, Default)]
pub struct KeyResolution {
    /// One entry per primary row, in row order.
    pub keys: Vec<Option<ResolvedKey>>,
    /// Primary header that supplied direct keys, if it exists.
    pub key_header: Option<String>,
}

impl KeyResolution {
    pub fn count(&self, source: KeySource) -> usize {
        self.keys
            .iter()
            .flatten()
            .filter(|key| key.source == source)
            .count()
    }

    pub fn unresolved(&self) -> usize {
        self.keys.iter().filter(|key| key.is_none()).count()
    }

    pub fn map_used(&self) -> bool {
        self.count(KeySource::ViaMap) > 0
    }
}

/// Resolves a key for every primary row.
pub fn resolve_keys(
    primary: &Table,
    binding: &FieldBinding,
    key_field: &str,
    mapping: Option<&MappingIndex>,
) -> KeyResolution {
    let key_idx = binding.index_of(key_field);
    let lookup_idx = binding.index_of(LOOKUP_FIELD);
    let keys = (0..primary.len())
        .map(|row| {
            let resolved = resolve_row(primary, row, key_idx, lookup_idx, mapping);
            trace!(
                row,
                source = ?resolved.as_ref().map(|key| key.source),
                "resolved row key"
            );
            resolved
        })
        .collect();
    KeyResolution {
        keys,
        key_header: binding.header_of(key_field).map(str::to_string),
    }
}

fn resolve_row(
    primary: &Table,
    row: usize,
    key_idx: Option<usize>,
    lookup_idx: Option<usize>,
    mapping: Option<&MappingIndex>,
) -> Option<ResolvedKey> {
    if let Some(idx) = key_idx {
        let raw = primary.cell(row, idx);
        if let Some(key) = JoinKey::parse(raw) {
            return Some(ResolvedKey {
                key,
                raw: raw.trim().to_string(),
                source: KeySource::Direct,
            });
        }
    }
    let (mapping, idx) = (mapping?, lookup_idx?);
    let (key, raw) = mapping.lookup(primary.cell(row, idx))?;
    Some(ResolvedKey {
        key: key.clone(),
        raw: raw.clone(),
        source: KeySource::ViaMap,
    })
}
