#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

use hid_descriptor::{analyze_importance, equivalent, ItemHeader, ItemType, RawItem};

/// A short item built from structured input so every case decodes.
#[derive(Debug, Arbitrary)]
struct ShortItem {
    kind: u8,
    tag: u8,
    data: Vec<u8>,
}

impl ShortItem {
    fn bytes(&self) -> Vec<u8> {
        // Input (Main), Global tags below Push, or any defined Local tag.
        let (item_type, tag) = match self.kind % 3 {
            0 => (ItemType::Main, 0x8),
            1 => (ItemType::Global, self.tag % 10),
            _ => (ItemType::Local, self.tag % 11),
        };
        let data = &self.data[..self.data.len().min(2)];
        let header = ItemHeader {
            size_code: data.len() as u8,
            item_type,
            tag,
        };
        let mut bytes = vec![header.prefix()];
        bytes.extend_from_slice(data);
        bytes
    }
}

fn number(items: impl IntoIterator<Item = Vec<u8>>) -> Vec<RawItem> {
    let mut offset = 0;
    items
        .into_iter()
        .enumerate()
        .map(|(index, bytes)| {
            let raw = RawItem {
                index,
                offset,
                bytes,
            };
            offset += raw.bytes.len();
            raw
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(shape) = Vec::<ShortItem>::arbitrary(&mut u) else {
        return;
    };

    let items = number(shape.iter().map(ShortItem::bytes));
    let Ok(analysis) = analyze_importance(&items) else {
        return;
    };
    let trimmed = number(
        items
            .iter()
            .zip(&analysis)
            .filter(|(_, importance)| importance.keep)
            .map(|(raw, _)| raw.bytes.clone()),
    );

    // Dropping every removable item must not change what any Main item observes.
    assert_eq!(equivalent(&items, &trimmed).ok(), Some(true));
});
