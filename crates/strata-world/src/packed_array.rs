//! Bit-packed fixed-width integer arrays.
//!
//! Two layouts exist on the wire and both must be supported:
//!
//! - [`PackedIntArray`]: entries are laid out back to back and may
//!   straddle two adjacent 64-bit words (every format up to 1.15).
//! - [`CompactIntArray`]: entries never cross a word boundary; the last
//!   bits of each word are padding (1.16+). The word index for a cell is
//!   computed with a precomputed reciprocal multiply-shift instead of an
//!   integer division.
//!
//! Wire form for both: a varint word count followed by the raw words,
//! big-endian.

use crate::wire;
use strata_common::{Result, StrataError};

/// Reciprocal (multiplier, adder, shift) triples for
/// `cell = hi32(i * multiplier + adder) >> shift`, indexed by
/// `values_per_word - 1` for `values_per_word` in `[1, 32]`.
///
/// Powers of two use a plain shift; everything else uses
/// `floor(2^32 / values_per_word)` as both multiplier and adder.
const MAGIC: [(u64, u64, u32); 32] = [
    (0xFFFF_FFFF, 0xFFFF_FFFF, 0), // 1
    (0x8000_0000, 0, 0),           // 2
    (1431655765, 1431655765, 0),   // 3
    (0x8000_0000, 0, 1),           // 4
    (858993459, 858993459, 0),     // 5
    (715827882, 715827882, 0),     // 6
    (613566756, 613566756, 0),     // 7
    (0x8000_0000, 0, 2),           // 8
    (477218588, 477218588, 0),     // 9
    (429496729, 429496729, 0),     // 10
    (390451572, 390451572, 0),     // 11
    (357913941, 357913941, 0),     // 12
    (330382099, 330382099, 0),     // 13
    (306783378, 306783378, 0),     // 14
    (286331153, 286331153, 0),     // 15
    (0x8000_0000, 0, 3),           // 16
    (252645135, 252645135, 0),     // 17
    (238609294, 238609294, 0),     // 18
    (226050910, 226050910, 0),     // 19
    (214748364, 214748364, 0),     // 20
    (204522252, 204522252, 0),     // 21
    (195225786, 195225786, 0),     // 22
    (186737708, 186737708, 0),     // 23
    (178956970, 178956970, 0),     // 24
    (171798691, 171798691, 0),     // 25
    (165191049, 165191049, 0),     // 26
    (159072862, 159072862, 0),     // 27
    (153391689, 153391689, 0),     // 28
    (148102320, 148102320, 0),     // 29
    (143165576, 143165576, 0),     // 30
    (138547332, 138547332, 0),     // 31
    (0x8000_0000, 0, 4),           // 32
];

/// Fixed-width column store where entries may straddle word boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedIntArray {
    bits: u8,
    mask: u64,
    len: usize,
    words: Vec<u64>,
}

impl PackedIntArray {
    /// Creates a zero-filled array of `len` cells, `bits` wide each.
    /// `bits` must be in `1..=32`.
    pub fn new(bits: u8, len: usize) -> Self {
        assert!((1..=32).contains(&bits), "bits per entry out of range");
        let words = (len * bits as usize + 63) / 64;
        PackedIntArray {
            bits,
            mask: (1u64 << bits) - 1,
            len,
            words: vec![0; words],
        }
    }

    /// Rebuilds an array from its wire words. Fails if the word count does
    /// not match `ceil(len * bits / 64)`.
    pub fn from_words(bits: u8, len: usize, words: Vec<u64>) -> Result<Self> {
        assert!((1..=32).contains(&bits), "bits per entry out of range");
        let expected = (len * bits as usize + 63) / 64;
        if words.len() != expected {
            return Err(StrataError::IndexOutOfRange {
                index: words.len(),
                len: expected,
            });
        }
        Ok(PackedIntArray {
            bits,
            mask: (1u64 << bits) - 1,
            len,
            words,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Reads the cell at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn get(&self, index: usize) -> u32 {
        assert!(index < self.len, "index {} out of range", index);
        let bit_index = index * self.bits as usize;
        let start = bit_index >> 6;
        let offset = bit_index & 63;
        let end = (bit_index + self.bits as usize - 1) >> 6;

        let mut value = self.words[start] >> offset;
        if end != start {
            value |= self.words[end] << (64 - offset);
        }
        (value & self.mask) as u32
    }

    /// Stores `value` at `index`. Fails if `index` is out of range or
    /// `value` does not fit in the configured width; never clamps.
    pub fn set(&mut self, index: usize, value: u32) -> Result<()> {
        if index >= self.len {
            return Err(StrataError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        if value as u64 > self.mask {
            return Err(StrataError::ValueTooWide {
                value,
                bits: self.bits,
            });
        }

        let bit_index = index * self.bits as usize;
        let start = bit_index >> 6;
        let offset = bit_index & 63;
        let end = (bit_index + self.bits as usize - 1) >> 6;

        self.words[start] = (self.words[start] & !(self.mask << offset)) | ((value as u64) << offset);
        if end != start {
            let bits_in_first = 64 - offset;
            self.words[end] =
                (self.words[end] & !(self.mask >> bits_in_first)) | ((value as u64) >> bits_in_first);
        }
        Ok(())
    }

    /// An independent array with identical contents.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Varint word count followed by the raw words, big-endian.
    pub fn write(&self, out: &mut Vec<u8>) {
        wire::write_varint(out, self.words.len() as i32);
        for word in &self.words {
            out.extend_from_slice(&word.to_be_bytes());
        }
    }

    pub fn wire_len(&self) -> usize {
        wire::varint_len(self.words.len() as i32) + self.words.len() * 8
    }
}

/// Fixed-width column store where entries never cross a word boundary.
/// Bits per entry is clamped to a minimum of 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactIntArray {
    bits: u8,
    mask: u64,
    len: usize,
    values_per_word: usize,
    multiplier: u64,
    adder: u64,
    shift: u32,
    words: Vec<u64>,
}

impl CompactIntArray {
    /// Creates a zero-filled array of `len` cells. `bits` is clamped up to
    /// 4 and must not exceed 32.
    pub fn new(bits: u8, len: usize) -> Self {
        let bits = bits.max(4);
        assert!(bits <= 32, "bits per entry out of range");
        let values_per_word = 64 / bits as usize;
        let words = (len + values_per_word - 1) / values_per_word;
        let (multiplier, adder, shift) = MAGIC[values_per_word - 1];
        CompactIntArray {
            bits,
            mask: (1u64 << bits) - 1,
            len,
            values_per_word,
            multiplier,
            adder,
            shift,
            words: vec![0; words],
        }
    }

    /// Rebuilds an array from its wire words. Fails if the word count does
    /// not match `ceil(len / values_per_word)`.
    pub fn from_words(bits: u8, len: usize, words: Vec<u64>) -> Result<Self> {
        let mut array = CompactIntArray::new(bits, len);
        if words.len() != array.words.len() {
            return Err(StrataError::IndexOutOfRange {
                index: words.len(),
                len: array.words.len(),
            });
        }
        array.words = words;
        Ok(array)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn values_per_word(&self) -> usize {
        self.values_per_word
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Word index for `index`, via the reciprocal multiply-shift. Equal to
    /// `index / values_per_word` for every index in range.
    pub fn cell_index(&self, index: usize) -> usize {
        (((index as u64 * self.multiplier + self.adder) >> 32) >> self.shift) as usize
    }

    /// Reads the cell at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn get(&self, index: usize) -> u32 {
        assert!(index < self.len, "index {} out of range", index);
        let word = self.cell_index(index);
        let offset = (index - word * self.values_per_word) * self.bits as usize;
        ((self.words[word] >> offset) & self.mask) as u32
    }

    /// Stores `value` at `index`. Fails if `index` is out of range or
    /// `value` does not fit in the configured width; never clamps.
    pub fn set(&mut self, index: usize, value: u32) -> Result<()> {
        if index >= self.len {
            return Err(StrataError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        if value as u64 > self.mask {
            return Err(StrataError::ValueTooWide {
                value,
                bits: self.bits,
            });
        }

        let word = self.cell_index(index);
        let offset = (index - word * self.values_per_word) * self.bits as usize;
        self.words[word] = (self.words[word] & !(self.mask << offset)) | ((value as u64) << offset);
        Ok(())
    }

    /// An independent array with identical contents.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Varint word count followed by the raw words, big-endian.
    pub fn write(&self, out: &mut Vec<u8>) {
        wire::write_varint(out, self.words.len() as i32);
        for word in &self.words {
            out.extend_from_slice(&word.to_be_bytes());
        }
    }

    pub fn wire_len(&self) -> usize {
        wire::varint_len(self.words.len() as i32) + self.words.len() * 8
    }
}

/// Either layout behind one interface, chosen by the storage class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntArray {
    Spanning(PackedIntArray),
    Compact(CompactIntArray),
}

impl IntArray {
    pub fn new(spanning: bool, bits: u8, len: usize) -> Self {
        if spanning {
            IntArray::Spanning(PackedIntArray::new(bits, len))
        } else {
            IntArray::Compact(CompactIntArray::new(bits, len))
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IntArray::Spanning(a) => a.len(),
            IntArray::Compact(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bits(&self) -> u8 {
        match self {
            IntArray::Spanning(a) => a.bits(),
            IntArray::Compact(a) => a.bits(),
        }
    }

    pub fn get(&self, index: usize) -> u32 {
        match self {
            IntArray::Spanning(a) => a.get(index),
            IntArray::Compact(a) => a.get(index),
        }
    }

    pub fn set(&mut self, index: usize, value: u32) -> Result<()> {
        match self {
            IntArray::Spanning(a) => a.set(index, value),
            IntArray::Compact(a) => a.set(index, value),
        }
    }

    pub fn words(&self) -> &[u64] {
        match self {
            IntArray::Spanning(a) => a.words(),
            IntArray::Compact(a) => a.words(),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        match self {
            IntArray::Spanning(a) => a.write(out),
            IntArray::Compact(a) => a.write(out),
        }
    }

    pub fn wire_len(&self) -> usize {
        match self {
            IntArray::Spanning(a) => a.wire_len(),
            IntArray::Compact(a) => a.wire_len(),
        }
    }
}
