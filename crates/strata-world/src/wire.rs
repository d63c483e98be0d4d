//! Minimal varint helpers for the storage wire writers.

/// Writes a VarInt: 7 bits per byte, continuation bit set on all but the
/// last byte.
pub(crate) fn write_varint(buffer: &mut Vec<u8>, mut value: i32) {
    while (value & !0x7F) != 0 {
        buffer.push(((value & 0x7F) as u8) | 0x80);
        value = ((value as u32) >> 7) as i32;
    }
    buffer.push((value & 0x7F) as u8);
}

/// Number of bytes [`write_varint`] emits for `value`.
pub(crate) fn varint_len(value: i32) -> usize {
    let mut value = value as u32;
    let mut len = 1;
    while value & !0x7F != 0 {
        value >>= 7;
        len += 1;
    }
    len
}
