use thiserror::Error;

/// Failures while decoding a report descriptor or replaying it through the scope stack.
///
/// Every variant that can be tied to an item carries that item's ordinal `index` so callers can
/// point at the offending position. Comparator mismatches are not errors; see
/// [`crate::compare::Equivalence`].
#[derive(Debug, Error)]
pub enum HidDescriptorError {
    #[error(
        "HID report descriptor ended inside item {index} at offset {offset} \
         (needed {needed} more bytes, got {available})"
    )]
    IncompleteDescriptor {
        index: usize,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("item {index} is empty")]
    EmptyItem { index: usize },
    #[error("global Pop at item {index} with no pushed state table")]
    StackUnderflow { index: usize },
    #[error("global Push at item {index} exceeds the maximum stack depth of {max_depth}")]
    StackOverflow { index: usize, max_depth: usize },
    #[error("unsupported (reserved) HID item type at item {index}: tag={tag:#04x}")]
    UnsupportedItemType { index: usize, tag: u8 },
    #[error("failed to read HID report descriptor: {0}")]
    Io(#[from] std::io::Error),
}

impl HidDescriptorError {
    /// Index of the item the error is attributed to, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            HidDescriptorError::IncompleteDescriptor { index, .. }
            | HidDescriptorError::EmptyItem { index }
            | HidDescriptorError::StackUnderflow { index }
            | HidDescriptorError::StackOverflow { index, .. }
            | HidDescriptorError::UnsupportedItemType { index, .. } => Some(*index),
            HidDescriptorError::Io(_) => None,
        }
    }
}
