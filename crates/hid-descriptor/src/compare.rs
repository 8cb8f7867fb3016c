//! Structural equivalence of two descriptors.
//!
//! Two descriptors are equivalent when they have the same Main items, in the same order, and
//! every Main item observes the same `{key -> value}` attribute table. Item positions and the
//! `used`/`origin_index` bookkeeping are ignored, so a descriptor with redundant items removed
//! compares equal to the original.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::StateLimits;
use crate::error::HidDescriptorError;
use crate::item::RawItem;
use crate::state::{capture_snapshots_with_limits, AttributeKey, AttributeTable, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Equivalence {
    Equivalent { main_items: usize },
    Different(Mismatch),
}

impl Equivalence {
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Equivalence::Equivalent { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mismatch {
    /// The descriptors have different numbers of Main items. `first_difference` is the first
    /// differing pair within the shorter length, if any.
    Count {
        left: usize,
        right: usize,
        first_difference: Option<PairDifference>,
    },
    /// Same number of Main items; the first pair that differs.
    Content(PairDifference),
}

/// A pair of Main items, one from each descriptor, at the same Main-item position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDifference {
    pub left_index: usize,
    pub right_index: usize,
    pub detail: ContentDifference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentDifference {
    ItemBytes { left: Vec<u8>, right: Vec<u8> },
    StateTable(Vec<TableDifference>),
}

/// One key whose value differs; `None` means the key is absent on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDifference {
    pub key: AttributeKey,
    pub left: Option<Vec<u8>>,
    pub right: Option<Vec<u8>>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Count {
                left,
                right,
                first_difference,
            } => {
                write!(f, "Main item counts differ: {left} vs {right}")?;
                if let Some(pair) = first_difference {
                    write!(f, "\n{pair}")?;
                }
                Ok(())
            }
            Mismatch::Content(pair) => write!(f, "{pair}"),
        }
    }
}

impl fmt::Display for PairDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left_index, right_index) = (self.left_index, self.right_index);
        match &self.detail {
            ContentDifference::ItemBytes { left, right } => write!(
                f,
                "Items differ at indices {left_index}/{right_index}: [{}] vs [{}]",
                hex(left),
                hex(right)
            ),
            ContentDifference::StateTable(differences) => {
                write!(f, "States differ at indices {left_index}/{right_index}")?;
                for diff in differences {
                    let name = diff.key.name().unwrap_or("?");
                    write!(
                        f,
                        "\n  {:?} {:#04x} ({name}): {} vs {}",
                        diff.key.scope,
                        diff.key.tag,
                        optional_hex(diff.left.as_deref()),
                        optional_hex(diff.right.as_deref())
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Space-separated lowercase hex, as used in mismatch reports.
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn optional_hex(bytes: Option<&[u8]>) -> String {
    match bytes {
        Some(bytes) => format!("[{}]", hex(bytes)),
        None => "<unset>".to_string(),
    }
}

pub fn compare(left: &[RawItem], right: &[RawItem]) -> Result<Equivalence, HidDescriptorError> {
    compare_with_limits(left, right, StateLimits::default())
}

pub fn compare_with_limits(
    left: &[RawItem],
    right: &[RawItem],
    limits: StateLimits,
) -> Result<Equivalence, HidDescriptorError> {
    let left = capture_snapshots_with_limits(left, limits)?;
    let right = capture_snapshots_with_limits(right, limits)?;
    Ok(compare_snapshots(&left, &right))
}

pub fn equivalent(left: &[RawItem], right: &[RawItem]) -> Result<bool, HidDescriptorError> {
    Ok(compare(left, right)?.is_equivalent())
}

/// Compares snapshot lists pairwise up to the shorter length; the first differing pair is
/// reported. A difference in Main item count always yields [`Mismatch::Count`].
pub fn compare_snapshots(left: &[Snapshot], right: &[Snapshot]) -> Equivalence {
    let first_difference = left
        .iter()
        .zip(right.iter())
        .find_map(|(a, b)| pair_difference(a, b));

    if let Some(pair) = &first_difference {
        tracing::debug!(
            left_index = pair.left_index,
            right_index = pair.right_index,
            "descriptors differ"
        );
    }

    if left.len() != right.len() {
        return Equivalence::Different(Mismatch::Count {
            left: left.len(),
            right: right.len(),
            first_difference,
        });
    }

    match first_difference {
        Some(pair) => Equivalence::Different(Mismatch::Content(pair)),
        None => Equivalence::Equivalent {
            main_items: left.len(),
        },
    }
}

fn pair_difference(a: &Snapshot, b: &Snapshot) -> Option<PairDifference> {
    let detail = if a.bytes != b.bytes {
        ContentDifference::ItemBytes {
            left: a.bytes.clone(),
            right: b.bytes.clone(),
        }
    } else if !a.table.same_values(&b.table) {
        ContentDifference::StateTable(diff_tables(&a.table, &b.table))
    } else {
        return None;
    };
    Some(PairDifference {
        left_index: a.index,
        right_index: b.index,
        detail,
    })
}

/// Keys whose values differ between the two tables, in key order.
pub fn diff_tables(left: &AttributeTable, right: &AttributeTable) -> Vec<TableDifference> {
    let left = left.values();
    let right = right.values();
    let keys: BTreeSet<AttributeKey> = left.keys().chain(right.keys()).copied().collect();

    keys.into_iter()
        .filter_map(|key| {
            let a = left.get(&key);
            let b = right.get(&key);
            (a != b).then(|| TableDifference {
                key,
                left: a.cloned(),
                right: b.cloned(),
            })
        })
        .collect()
}
