//! USB HID report descriptor analysis.
//!
//! The pipeline is:
//!
//! 1. [`item`] splits a raw descriptor into item byte blocks and decodes each block into
//!    `{type, tag, data}`.
//! 2. [`state`] replays the items through a stack of attribute tables, applying the HID
//!    Push/Pop and Local-reset rules.
//! 3. [`importance`] uses the replay to find Global/Local items that can be removed without
//!    changing the state seen by any Main item.
//! 4. [`compare`] uses per-Main-item snapshots of the replay to decide whether two descriptors
//!    are equivalent.
//!
//! ```
//! use hid_descriptor::{classify, split_items};
//!
//! // Usage Page (Generic Desktop) twice, then Input (Data,Var,Abs).
//! let items = split_items(&[0x05, 0x01, 0x05, 0x01, 0x81, 0x02]).unwrap();
//! assert_eq!(classify(&items).unwrap(), vec![true, false, true]);
//! ```

pub mod compare;
pub mod config;
pub mod error;
pub mod importance;
pub mod item;
pub mod state;

pub use compare::{
    compare, compare_snapshots, compare_with_limits, equivalent, hex, ContentDifference,
    Equivalence, Mismatch, PairDifference, TableDifference,
};
pub use config::{ConfigError, StateLimits, DEFAULT_MAX_STACK_DEPTH, MAX_STACK_DEPTH_ENV};
pub use error::HidDescriptorError;
pub use importance::{
    analyze_importance, analyze_importance_with_limits, classify, classify_with_limits,
    ItemImportance,
};
pub use item::{
    decode_items, parse_item_bytes, read_items, split_items, GlobalOp, Item, ItemHeader, ItemKind,
    ItemReader, ItemType, RawItem, LONG_ITEM_PREFIX,
};
pub use state::{
    capture_snapshots, capture_snapshots_with_limits, AttributeEntry, AttributeKey,
    AttributeScope, AttributeTable, ScopeStack, Snapshot, Suppression, SuppressionReason,
};
