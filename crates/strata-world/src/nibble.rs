//! 4-bit-per-cell arrays, used for light levels and legacy block data.

use crate::section::block_index;

/// `N` 4-bit cells packed two per byte: cell `k` lives in byte `k >> 1`,
/// low nibble when `k` is even, high nibble when `k` is odd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NibbleArray {
    data: Vec<u8>,
    len: usize,
}

impl NibbleArray {
    /// A zero-filled array of `len` cells, backed by `ceil(len / 2)` bytes.
    pub fn new(len: usize) -> Self {
        NibbleArray {
            data: vec![0; (len + 1) / 2],
            len,
        }
    }

    /// An array with every cell set to `value`.
    pub fn filled(len: usize, value: u8) -> Self {
        let mut array = NibbleArray::new(len);
        array.fill(value);
        array
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The backing bytes, as sent on the wire.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.get_index(block_index(x, y, z))
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: u8) {
        self.set_index(block_index(x, y, z), value);
    }

    pub fn get_index(&self, key: usize) -> u8 {
        debug_assert!(key < self.len, "nibble index out of range");
        let byte = self.data[key >> 1];
        if key & 1 == 0 {
            byte & 0x0F
        } else {
            byte >> 4
        }
    }

    pub fn set_index(&mut self, key: usize, value: u8) {
        debug_assert!(key < self.len, "nibble index out of range");
        debug_assert!(value <= 0x0F, "nibble value out of range");
        let byte = &mut self.data[key >> 1];
        if key & 1 == 0 {
            *byte = (*byte & 0xF0) | (value & 0x0F);
        } else {
            *byte = (*byte & 0x0F) | ((value & 0x0F) << 4);
        }
    }

    /// Sets every cell to `value`.
    pub fn fill(&mut self, value: u8) {
        let packed = (value & 0x0F) | ((value & 0x0F) << 4);
        self.data.fill(packed);
    }

    /// An independent array with identical contents.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_values() {
        let mut array = NibbleArray::new(4096);
        for key in 0..4096 {
            array.set_index(key, (key % 16) as u8);
        }
        for key in 0..4096 {
            assert_eq!(array.get_index(key), (key % 16) as u8);
        }
    }

    #[test]
    fn test_adjacent_cells_share_a_byte() {
        let mut array = NibbleArray::new(16);
        array.set_index(0, 5);
        array.set_index(1, 10);
        assert_eq!(array.get_index(0), 5);
        assert_eq!(array.get_index(1), 10);
        assert_eq!(array.bytes()[0], 0xA5);
    }

    #[test]
    fn test_coordinate_addressing() {
        let mut array = NibbleArray::new(4096);
        array.set(1, 2, 3, 9);
        // y<<8 | z<<4 | x
        assert_eq!(array.get_index((2 << 8) | (3 << 4) | 1), 9);
        assert_eq!(array.get(1, 2, 3), 9);
    }

    #[test]
    fn test_fill() {
        let mut array = NibbleArray::new(4096);
        array.fill(7);
        for key in 0..4096 {
            assert_eq!(array.get_index(key), 7);
        }
        assert_eq!(array.bytes().len(), 2048);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = NibbleArray::new(32);
        original.set_index(4, 12);
        let copy = original.copy();
        original.set_index(4, 1);
        assert_eq!(copy.get_index(4), 12);
    }
}
