//! Item extraction and decoding.
//!
//! A report descriptor is a back-to-back sequence of items with no framing beyond each item's
//! one-byte prefix:
//!
//! ```text
//! bit  7 6 5 4 | 3 2  | 1 0
//!      bTag    | bType| bSize
//! ```
//!
//! `bSize` 0/1/2/3 selects a payload of 0/1/2/4 bytes. The prefix `0xFE` (size 2, type 3, tag
//! 0xF) introduces a long item: the two "payload" bytes are `bDataSize` and `bLongItemTag`, followed
//! by `bDataSize` bytes of data.
//!
//! Extraction ([`ItemReader`]) only slices the stream into per-item byte blocks ([`RawItem`]).
//! Decoding a block into `{type, tag, data}` ([`Item`]) is a separate step.

use std::fmt;
use std::io::{self, Read};

use serde::{Deserialize, Serialize};

use crate::error::HidDescriptorError;

/// Prefix byte of a long item.
pub const LONG_ITEM_PREFIX: u8 = 0xFE;

const LONG_ITEM_TAG: u8 = 0x0F;
const GLOBAL_TAG_PUSH: u8 = 0x0A;
const GLOBAL_TAG_POP: u8 = 0x0B;

/// The 2-bit `bType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemType {
    Main,
    Global,
    Local,
    Reserved,
}

impl ItemType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => ItemType::Main,
            1 => ItemType::Global,
            2 => ItemType::Local,
            _ => ItemType::Reserved,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            ItemType::Main => 0,
            ItemType::Global => 1,
            ItemType::Local => 2,
            ItemType::Reserved => 3,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemType::Main => "Main",
            ItemType::Global => "Global",
            ItemType::Local => "Local",
            ItemType::Reserved => "Reserved",
        };
        f.write_str(name)
    }
}

/// The fields packed into an item's prefix byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemHeader {
    /// Raw 2-bit size code (3 means a 4-byte payload).
    pub size_code: u8,
    pub item_type: ItemType,
    pub tag: u8,
}

impl ItemHeader {
    pub fn from_prefix(prefix: u8) -> Self {
        Self {
            size_code: prefix & 0b11,
            item_type: ItemType::from_bits(prefix >> 2),
            tag: (prefix >> 4) & 0x0F,
        }
    }

    pub fn prefix(&self) -> u8 {
        ((self.tag & 0x0F) << 4) | (self.item_type.bits() << 2) | (self.size_code & 0b11)
    }

    /// Number of bytes following the prefix for a short item.
    ///
    /// For a long item this is the 2-byte `bDataSize`/`bLongItemTag` pair.
    pub fn data_len(&self) -> usize {
        match self.size_code & 0b11 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        }
    }

    pub fn is_long_item(&self) -> bool {
        self.size_code == 2 && self.item_type == ItemType::Reserved && self.tag == LONG_ITEM_TAG
    }
}

/// One item's bytes exactly as they appear in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    /// Ordinal position of the item in the descriptor.
    pub index: usize,
    /// Byte offset of the item's prefix within the descriptor.
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl RawItem {
    pub fn header(&self) -> Option<ItemHeader> {
        self.bytes.first().copied().map(ItemHeader::from_prefix)
    }

    pub fn decode(&self) -> Result<Item, HidDescriptorError> {
        decode_block(self.index, self.offset, &self.bytes)
    }
}

/// Global item operations that the state machine treats specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalOp {
    Push,
    Pop,
    Set,
}

/// Dispatch view of an item: what the state machine does with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Main,
    Global(GlobalOp),
    Local,
    Reserved,
}

/// A decoded item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub index: usize,
    pub item_type: ItemType,
    /// 4-bit tag for short items, `bLongItemTag` for long items.
    pub tag: u8,
    pub data: Vec<u8>,
    pub long: bool,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self.item_type {
            ItemType::Main => ItemKind::Main,
            ItemType::Global => match self.tag {
                GLOBAL_TAG_PUSH => ItemKind::Global(GlobalOp::Push),
                GLOBAL_TAG_POP => ItemKind::Global(GlobalOp::Pop),
                _ => ItemKind::Global(GlobalOp::Set),
            },
            ItemType::Local => ItemKind::Local,
            ItemType::Reserved => ItemKind::Reserved,
        }
    }

    /// HID 1.11 name of the item, when the tag is a defined one.
    pub fn name(&self) -> Option<&'static str> {
        if self.long {
            return Some("Long Item");
        }
        tag_name(self.item_type, self.tag)
    }

    /// Little-endian unsigned interpretation of a short item payload.
    pub fn unsigned_value(&self) -> Option<u32> {
        let d = &self.data;
        match d.len() {
            0 => Some(0),
            1 => Some(d[0] as u32),
            2 => Some(u16::from_le_bytes([d[0], d[1]]) as u32),
            4 => Some(u32::from_le_bytes([d[0], d[1], d[2], d[3]])),
            _ => None,
        }
    }

    /// Little-endian two's complement interpretation of a short item payload.
    pub fn signed_value(&self) -> Option<i32> {
        let d = &self.data;
        match d.len() {
            0 => Some(0),
            1 => Some(i8::from_le_bytes([d[0]]) as i32),
            2 => Some(i16::from_le_bytes([d[0], d[1]]) as i32),
            4 => Some(i32::from_le_bytes([d[0], d[1], d[2], d[3]])),
            _ => None,
        }
    }
}

/// HID 1.11 name of a short item's `(type, tag)` pair.
pub fn tag_name(item_type: ItemType, tag: u8) -> Option<&'static str> {
    let name = match (item_type, tag) {
        (ItemType::Main, 0x8) => "Input",
        (ItemType::Main, 0x9) => "Output",
        (ItemType::Main, 0xA) => "Collection",
        (ItemType::Main, 0xB) => "Feature",
        (ItemType::Main, 0xC) => "End Collection",
        (ItemType::Global, 0x0) => "Usage Page",
        (ItemType::Global, 0x1) => "Logical Minimum",
        (ItemType::Global, 0x2) => "Logical Maximum",
        (ItemType::Global, 0x3) => "Physical Minimum",
        (ItemType::Global, 0x4) => "Physical Maximum",
        (ItemType::Global, 0x5) => "Unit Exponent",
        (ItemType::Global, 0x6) => "Unit",
        (ItemType::Global, 0x7) => "Report Size",
        (ItemType::Global, 0x8) => "Report ID",
        (ItemType::Global, 0x9) => "Report Count",
        (ItemType::Global, 0xA) => "Push",
        (ItemType::Global, 0xB) => "Pop",
        (ItemType::Local, 0x0) => "Usage",
        (ItemType::Local, 0x1) => "Usage Minimum",
        (ItemType::Local, 0x2) => "Usage Maximum",
        (ItemType::Local, 0x3) => "Designator Index",
        (ItemType::Local, 0x4) => "Designator Minimum",
        (ItemType::Local, 0x5) => "Designator Maximum",
        (ItemType::Local, 0x7) => "String Index",
        (ItemType::Local, 0x8) => "String Minimum",
        (ItemType::Local, 0x9) => "String Maximum",
        (ItemType::Local, 0xA) => "Delimiter",
        _ => return None,
    };
    Some(name)
}

/// Decodes a single item block that does not come with a known descriptor offset.
pub fn parse_item_bytes(index: usize, bytes: &[u8]) -> Result<Item, HidDescriptorError> {
    decode_block(index, 0, bytes)
}

fn decode_block(index: usize, offset: usize, bytes: &[u8]) -> Result<Item, HidDescriptorError> {
    let (&prefix, rest) = bytes
        .split_first()
        .ok_or(HidDescriptorError::EmptyItem { index })?;
    let header = ItemHeader::from_prefix(prefix);
    let incomplete = |needed: usize, available: usize| HidDescriptorError::IncompleteDescriptor {
        index,
        offset,
        needed,
        available,
    };

    if header.is_long_item() {
        if rest.len() < 2 {
            return Err(incomplete(2, rest.len()));
        }
        let data_size = rest[0] as usize;
        let long_tag = rest[1];
        let data = &rest[2..];
        if data.len() < data_size {
            return Err(incomplete(data_size, data.len()));
        }
        return Ok(Item {
            index,
            item_type: header.item_type,
            tag: long_tag,
            data: data[..data_size].to_vec(),
            long: true,
        });
    }

    if rest.len() < header.data_len() {
        return Err(incomplete(header.data_len(), rest.len()));
    }
    Ok(Item {
        index,
        item_type: header.item_type,
        tag: header.tag,
        data: rest[..header.data_len()].to_vec(),
        long: false,
    })
}

/// Splits a byte source into item blocks.
///
/// Yields `Ok` for each complete item and stops after the first error. Running out of input
/// exactly between items ends iteration cleanly; running out inside an item yields
/// [`HidDescriptorError::IncompleteDescriptor`], and everything yielded before it stays valid.
pub struct ItemReader<R> {
    reader: R,
    index: usize,
    offset: usize,
    done: bool,
}

impl<R: Read> ItemReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            index: 0,
            offset: 0,
            done: false,
        }
    }

    fn read_block(&mut self) -> Result<Option<RawItem>, HidDescriptorError> {
        let mut bytes = Vec::new();
        if read_up_to(&mut self.reader, &mut bytes, 1)? == 0 {
            return Ok(None);
        }

        let header = ItemHeader::from_prefix(bytes[0]);
        self.read_payload(&mut bytes, header.data_len())?;

        if header.is_long_item() {
            let data_size = bytes[1] as usize;
            self.read_payload(&mut bytes, data_size)?;
        }

        Ok(Some(RawItem {
            index: self.index,
            offset: self.offset,
            bytes,
        }))
    }

    fn read_payload(&mut self, bytes: &mut Vec<u8>, len: usize) -> Result<(), HidDescriptorError> {
        let got = read_up_to(&mut self.reader, bytes, len)?;
        if got < len {
            return Err(HidDescriptorError::IncompleteDescriptor {
                index: self.index,
                offset: self.offset,
                needed: len,
                available: got,
            });
        }
        Ok(())
    }
}

impl<R: Read> Iterator for ItemReader<R> {
    type Item = Result<RawItem, HidDescriptorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_block() {
            Ok(Some(item)) => {
                tracing::trace!(
                    index = item.index,
                    offset = item.offset,
                    len = item.bytes.len(),
                    "read HID item"
                );
                self.index += 1;
                self.offset += item.bytes.len();
                Some(Ok(item))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Appends at most `len` bytes to `buf`, returning how many were available before EOF.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut Vec<u8>, len: usize) -> io::Result<usize> {
    reader.by_ref().take(len as u64).read_to_end(buf)
}

pub fn read_items<R: Read>(reader: R) -> Result<Vec<RawItem>, HidDescriptorError> {
    ItemReader::new(reader).collect()
}

pub fn split_items(bytes: &[u8]) -> Result<Vec<RawItem>, HidDescriptorError> {
    read_items(bytes)
}

pub fn decode_items(items: &[RawItem]) -> Result<Vec<Item>, HidDescriptorError> {
    items.iter().map(RawItem::decode).collect()
}
