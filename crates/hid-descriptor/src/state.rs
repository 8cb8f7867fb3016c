//! Replay of HID scoping rules.
//!
//! Global items persist across Main items until overwritten or until a Pop discards the table
//! they live in. Local items only apply to the next Main item. Push/Pop save and restore the
//! whole table.
//!
//! [`ScopeStack::advance`] applies one item and reports when an earlier (or the current) Global
//! or Local occurrence can be dropped without changing what any Main item observes:
//!
//! - the new value equals the active one: the new occurrence is [`SuppressionReason::Redundant`];
//! - the active value was never consumed by a Main item before being replaced: the previous
//!   occurrence is [`SuppressionReason::Superseded`].
//!
//! A value copied into a pushed table is still held by the table below it, and a Main item that
//! observed it in any table counts as a use. Such an occurrence is never reported as superseded,
//! so it survives for the Main items that follow the Pop.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize, Serializer};

use crate::config::StateLimits;
use crate::error::HidDescriptorError;
use crate::item::{tag_name, GlobalOp, Item, ItemKind, ItemType, RawItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeScope {
    Global,
    Local,
}

impl AttributeScope {
    pub fn item_type(self) -> ItemType {
        match self {
            AttributeScope::Global => ItemType::Global,
            AttributeScope::Local => ItemType::Local,
        }
    }
}

/// Identity of a stateful attribute. Main items never hold state, so only Global and Local
/// scopes exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeKey {
    pub scope: AttributeScope,
    pub tag: u8,
}

impl AttributeKey {
    pub fn global(tag: u8) -> Self {
        Self {
            scope: AttributeScope::Global,
            tag,
        }
    }

    pub fn local(tag: u8) -> Self {
        Self {
            scope: AttributeScope::Local,
            tag,
        }
    }

    pub fn is_local(&self) -> bool {
        self.scope == AttributeScope::Local
    }

    pub fn name(&self) -> Option<&'static str> {
        tag_name(self.scope.item_type(), self.tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEntry {
    pub value: Vec<u8>,
    /// Local entries are used as soon as they are recorded; Global entries once a Main item sees
    /// them.
    pub used: bool,
    /// Index of the item that set `value`.
    pub origin_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuppressionReason {
    /// The occurrence repeats the value already in effect.
    Redundant,
    /// The occurrence was overwritten before any Main item used it.
    Superseded,
}

/// An item that can be removed without changing the state seen by any Main item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    pub index: usize,
    pub reason: SuppressionReason,
}

/// All attributes in scope, keyed by `(scope, tag)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    entries: BTreeMap<AttributeKey, AttributeEntry>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &AttributeKey) -> Option<&AttributeEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &AttributeEntry)> {
        self.entries.iter()
    }

    pub fn has_local_entries(&self) -> bool {
        self.entries.keys().any(AttributeKey::is_local)
    }

    /// The `{key -> value}` projection, without the `used`/`origin_index` bookkeeping.
    pub fn values(&self) -> BTreeMap<AttributeKey, Vec<u8>> {
        self.entries
            .iter()
            .map(|(key, entry)| (*key, entry.value.clone()))
            .collect()
    }

    /// Compares the `{key -> value}` projections of two tables.
    pub fn same_values(&self, other: &AttributeTable) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((ka, ea), (kb, eb))| ka == kb && ea.value == eb.value)
    }

    /// Records `value` for `key`, or reports which occurrence is removable.
    pub fn record(&mut self, key: AttributeKey, value: &[u8], index: usize) -> Option<Suppression> {
        let mut suppressed = None;
        if let Some(existing) = self.entries.get(&key) {
            if existing.value == value {
                return Some(Suppression {
                    index,
                    reason: SuppressionReason::Redundant,
                });
            }
            if !existing.used {
                suppressed = Some(Suppression {
                    index: existing.origin_index,
                    reason: SuppressionReason::Superseded,
                });
            }
        }

        self.entries.insert(
            key,
            AttributeEntry {
                value: value.to_vec(),
                used: key.is_local(),
                origin_index: index,
            },
        );
        suppressed
    }

    fn clear_locals(&mut self) {
        self.entries.retain(|key, _| !key.is_local());
    }

    fn mark_globals_used(&mut self) {
        for entry in self.entries.values_mut() {
            entry.used = true;
        }
    }
}

impl Serialize for AttributeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct EntryRef<'a> {
            key: &'a AttributeKey,
            value: &'a [u8],
            used: bool,
            origin_index: usize,
        }

        serializer.collect_seq(self.entries.iter().map(|(key, entry)| EntryRef {
            key,
            value: &entry.value,
            used: entry.used,
            origin_index: entry.origin_index,
        }))
    }
}

/// The live table a Main item observed, captured before the Main item was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub index: usize,
    pub bytes: Vec<u8>,
    pub table: AttributeTable,
}

/// Stack of attribute tables; the last one is live.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<AttributeTable>,
    limits: StateLimits,
    /// Origins of every value a Main item has observed, in any frame.
    observed: BTreeSet<usize>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: StateLimits) -> Self {
        Self {
            frames: Vec::new(),
            limits,
            observed: BTreeSet::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&AttributeTable> {
        self.frames.last()
    }

    fn ensure_base(&mut self) {
        if self.frames.is_empty() {
            self.frames.push(AttributeTable::new());
        }
    }

    fn live_table_mut(&mut self) -> &mut AttributeTable {
        self.ensure_base();
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    fn record(&mut self, key: AttributeKey, item: &Item) -> Option<Suppression> {
        let suppressed = self.live_table_mut().record(key, &item.data, item.index)?;
        if suppressed.reason == SuppressionReason::Superseded
            && self.still_referenced(key, suppressed.index)
        {
            tracing::trace!(
                index = item.index,
                origin = suppressed.index,
                "previous value is still referenced"
            );
            return None;
        }
        Some(suppressed)
    }

    /// Whether the occurrence at `origin` was observed by a Main item or survives in a frame
    /// below the live one.
    fn still_referenced(&self, key: AttributeKey, origin: usize) -> bool {
        if self.observed.contains(&origin) {
            return true;
        }
        let below = self.frames.len().saturating_sub(1);
        self.frames[..below]
            .iter()
            .any(|table| table.get(&key).is_some_and(|e| e.origin_index == origin))
    }

    /// Applies one item. Returns the index of an item that turned out to be removable, if any.
    pub fn advance(&mut self, item: &Item) -> Result<Option<Suppression>, HidDescriptorError> {
        let index = item.index;
        self.ensure_base();

        let suppressed = match item.kind() {
            ItemKind::Main => {
                let table = self.live_table_mut();
                let origins: Vec<usize> = table.iter().map(|(_, e)| e.origin_index).collect();
                table.clear_locals();
                table.mark_globals_used();
                self.observed.extend(origins);
                None
            }
            ItemKind::Global(GlobalOp::Push) => {
                if self.frames.len() >= self.limits.max_stack_depth {
                    return Err(HidDescriptorError::StackOverflow {
                        index,
                        max_depth: self.limits.max_stack_depth,
                    });
                }
                let copy = self.live_table_mut().clone();
                self.frames.push(copy);
                tracing::debug!(index, depth = self.frames.len(), "push state table");
                None
            }
            ItemKind::Global(GlobalOp::Pop) => {
                if self.frames.len() <= 1 {
                    return Err(HidDescriptorError::StackUnderflow { index });
                }
                self.frames.pop();
                tracing::debug!(index, depth = self.frames.len(), "pop state table");
                None
            }
            ItemKind::Global(GlobalOp::Set) => self.record(AttributeKey::global(item.tag), item),
            ItemKind::Local => self.record(AttributeKey::local(item.tag), item),
            ItemKind::Reserved => {
                return Err(HidDescriptorError::UnsupportedItemType {
                    index,
                    tag: item.tag,
                });
            }
        };

        if let Some(suppression) = suppressed {
            tracing::debug!(
                index,
                removable = suppression.index,
                reason = ?suppression.reason,
                "found removable item"
            );
        }
        Ok(suppressed)
    }
}

pub fn capture_snapshots(items: &[RawItem]) -> Result<Vec<Snapshot>, HidDescriptorError> {
    capture_snapshots_with_limits(items, StateLimits::default())
}

/// Replays `items` and records the live table as seen by every Main item.
pub fn capture_snapshots_with_limits(
    items: &[RawItem],
    limits: StateLimits,
) -> Result<Vec<Snapshot>, HidDescriptorError> {
    let mut stack = ScopeStack::with_limits(limits);
    let mut snapshots = Vec::new();

    for raw in items {
        let item = raw.decode()?;
        if item.kind() == ItemKind::Main {
            snapshots.push(Snapshot {
                index: raw.index,
                bytes: raw.bytes.clone(),
                table: stack.top().cloned().unwrap_or_default(),
            });
        }
        stack.advance(&item)?;
    }

    Ok(snapshots)
}
