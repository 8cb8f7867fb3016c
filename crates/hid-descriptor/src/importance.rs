//! Classification of items as load-bearing or removable.
//!
//! An item is removable when it is a Global or Local item that either repeats the value already
//! in effect or gets overwritten before any Main item observes it. Everything else is kept.

use serde::{Deserialize, Serialize};

use crate::config::StateLimits;
use crate::error::HidDescriptorError;
use crate::item::RawItem;
use crate::state::{ScopeStack, SuppressionReason};

/// Per-item verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemImportance {
    pub index: usize,
    pub keep: bool,
    /// Why the item is removable; `None` when it must be kept.
    pub reason: Option<SuppressionReason>,
}

/// Returns one flag per item, `true` for items that must be kept.
pub fn classify(items: &[RawItem]) -> Result<Vec<bool>, HidDescriptorError> {
    classify_with_limits(items, StateLimits::default())
}

pub fn classify_with_limits(
    items: &[RawItem],
    limits: StateLimits,
) -> Result<Vec<bool>, HidDescriptorError> {
    Ok(analyze_importance_with_limits(items, limits)?
        .into_iter()
        .map(|importance| importance.keep)
        .collect())
}

pub fn analyze_importance(items: &[RawItem]) -> Result<Vec<ItemImportance>, HidDescriptorError> {
    analyze_importance_with_limits(items, StateLimits::default())
}

pub fn analyze_importance_with_limits(
    items: &[RawItem],
    limits: StateLimits,
) -> Result<Vec<ItemImportance>, HidDescriptorError> {
    let mut result: Vec<ItemImportance> = (0..items.len())
        .map(|index| ItemImportance {
            index,
            keep: true,
            reason: None,
        })
        .collect();
    let mut stack = ScopeStack::with_limits(limits);

    for raw in items {
        let item = raw.decode()?;
        if let Some(suppression) = stack.advance(&item)? {
            // Suppressed indices always refer to an item already seen in this pass.
            if let Some(slot) = result.get_mut(suppression.index) {
                slot.keep = false;
                slot.reason = Some(suppression.reason);
            }
        }
    }

    let removable = result.iter().filter(|importance| !importance.keep).count();
    tracing::debug!(items = items.len(), removable, "classified HID items");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::split_items;

    #[test]
    fn duplicate_usage_page_before_main() {
        // Usage Page (Generic Desktop), Usage Page (Generic Desktop), Input.
        let items = split_items(&[0x05, 0x01, 0x05, 0x01, 0x81, 0x02]).unwrap();
        let analysis = analyze_importance(&items).unwrap();
        assert_eq!(classify(&items).unwrap(), vec![true, false, true]);
        assert_eq!(analysis[1].reason, Some(SuppressionReason::Redundant));
    }

    #[test]
    fn overwritten_global_is_removable() {
        // Logical Minimum (0), Logical Minimum (1), Input.
        let items = split_items(&[0x15, 0x00, 0x15, 0x01, 0x81, 0x02]).unwrap();
        let analysis = analyze_importance(&items).unwrap();
        assert_eq!(classify(&items).unwrap(), vec![false, true, true]);
        assert_eq!(analysis[0].reason, Some(SuppressionReason::Superseded));
        assert_eq!(analysis[1].reason, None);
    }

    #[test]
    fn repeated_global_after_main_is_removable() {
        // Report Size (8), Input, Report Size (8), Input.
        let items = split_items(&[0x75, 0x08, 0x81, 0x02, 0x75, 0x08, 0x81, 0x02]).unwrap();
        assert_eq!(classify(&items).unwrap(), vec![true, true, false, true]);
    }

    #[test]
    fn main_and_stack_items_are_always_kept() {
        let items = split_items(&[0xA4, 0x75, 0x08, 0x81, 0x02, 0xB4, 0xc0]).unwrap();
        assert!(classify(&items).unwrap().into_iter().all(|keep| keep));
    }

    #[test]
    fn removable_is_never_reverted() {
        // Usage Page (1), Usage Page (2), Usage Page (2), Input: item 0 superseded, item 2
        // redundant; item 1 stays.
        let items = split_items(&[0x05, 0x01, 0x05, 0x02, 0x05, 0x02, 0x81, 0x02]).unwrap();
        assert_eq!(classify(&items).unwrap(), vec![false, true, false, true]);
    }

    #[test]
    fn underflow_aborts_classification() {
        let items = split_items(&[0x05, 0x01, 0xB4]).unwrap();
        let err = classify(&items).unwrap_err();
        assert!(matches!(err, HidDescriptorError::StackUnderflow { index: 1 }));
    }

    #[test]
    fn empty_descriptor_has_no_flags() {
        assert!(classify(&[]).unwrap().is_empty());
    }
}
