#![allow(dead_code)]

/// Boot protocol keyboard (HID 1.11 Appendix B.1).
pub const BOOT_KEYBOARD: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)      0
    0x09, 0x06, // Usage (Keyboard)                  1
    0xa1, 0x01, // Collection (Application)          2
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)    3
    0x19, 0xe0, //   Usage Minimum (0xE0)            4
    0x29, 0xe7, //   Usage Maximum (0xE7)            5
    0x15, 0x00, //   Logical Minimum (0)             6
    0x25, 0x01, //   Logical Maximum (1)             7
    0x75, 0x01, //   Report Size (1)                 8
    0x95, 0x08, //   Report Count (8)                9
    0x81, 0x02, //   Input (Data,Var,Abs)            10
    0x95, 0x01, //   Report Count (1)                11
    0x75, 0x08, //   Report Size (8)                 12
    0x81, 0x01, //   Input (Cnst)                    13
    0x95, 0x05, //   Report Count (5)                14
    0x75, 0x01, //   Report Size (1)                 15
    0x05, 0x08, //   Usage Page (LEDs)               16
    0x19, 0x01, //   Usage Minimum (1)               17
    0x29, 0x05, //   Usage Maximum (5)               18
    0x91, 0x02, //   Output (Data,Var,Abs)           19
    0x95, 0x01, //   Report Count (1)                20
    0x75, 0x03, //   Report Size (3)                 21
    0x91, 0x01, //   Output (Cnst)                   22
    0x95, 0x06, //   Report Count (6)                23
    0x75, 0x08, //   Report Size (8)                 24
    0x15, 0x00, //   Logical Minimum (0)             25
    0x25, 0x65, //   Logical Maximum (101)           26
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)    27
    0x19, 0x00, //   Usage Minimum (0)               28
    0x29, 0x65, //   Usage Maximum (101)             29
    0x81, 0x00, //   Input (Data,Array)              30
    0xc0, //       End Collection                    31
];

/// Three-button mouse that scopes its button globals with Push/Pop.
pub const PUSH_POP_MOUSE: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)      0
    0x09, 0x02, // Usage (Mouse)                     1
    0xa1, 0x01, // Collection (Application)          2
    0x09, 0x01, //   Usage (Pointer)                 3
    0xa1, 0x00, //   Collection (Physical)           4
    0xa4, //           Push                          5
    0x05, 0x09, //     Usage Page (Button)           6
    0x19, 0x01, //     Usage Minimum (1)             7
    0x29, 0x03, //     Usage Maximum (3)             8
    0x15, 0x00, //     Logical Minimum (0)           9
    0x25, 0x01, //     Logical Maximum (1)           10
    0x95, 0x03, //     Report Count (3)              11
    0x75, 0x01, //     Report Size (1)               12
    0x81, 0x02, //     Input (Data,Var,Abs)          13
    0x95, 0x01, //     Report Count (1)              14
    0x75, 0x05, //     Report Size (5)               15
    0x81, 0x01, //     Input (Cnst)                  16
    0xb4, //           Pop                           17
    0x05, 0x01, //     Usage Page (Generic Desktop)  18
    0x09, 0x30, //     Usage (X)                     19
    0x09, 0x31, //     Usage (Y)                     20
    0x15, 0x81, //     Logical Minimum (-127)        21
    0x25, 0x7f, //     Logical Maximum (127)         22
    0x75, 0x08, //     Report Size (8)               23
    0x95, 0x02, //     Report Count (2)              24
    0x81, 0x06, //     Input (Data,Var,Rel)          25
    0xc0, //         End Collection                  26
    0xc0, //       End Collection                    27
];

/// `PUSH_POP_MOUSE` without its Push (index 5) and Pop (index 17).
pub fn flattened_mouse() -> Vec<u8> {
    let mut bytes = PUSH_POP_MOUSE.to_vec();
    let pop = bytes.iter().rposition(|b| *b == 0xb4).expect("fixture has a Pop");
    bytes.remove(pop);
    let push = bytes.iter().position(|b| *b == 0xa4).expect("fixture has a Push");
    bytes.remove(push);
    bytes
}

/// Encodes a short item from its type bits, tag, and 0/1/2/4-byte payload.
pub fn short_item(item_type: u8, tag: u8, data: &[u8]) -> Vec<u8> {
    let size_code = match data.len() {
        0 => 0,
        1 => 1,
        2 => 2,
        4 => 3,
        len => panic!("short items cannot carry {len} bytes"),
    };
    let mut out = vec![(tag << 4) | (item_type << 2) | size_code];
    out.extend_from_slice(data);
    out
}
