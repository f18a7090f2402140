//! Fixed-width multi-word bit vector used for matrix rows and columns.
//!
//! Bit `j` is column `j`: it lives in word `j / 64` at bit `j % 64`. Bits at positions
//! `>= len` are always zero, so word-wise comparisons and popcounts need no masking.
//!
//! Two external orders are supported:
//! - **Bit strings** read left to right by column: `"00001"` sets column 4.
//! - **Integers** are big-endian over the row width: for width `w`, column `j` is integer
//!   bit `w - 1 - j`, so `"00001"` is `1` and `"10000"` is `16`.

use crate::error::{GraphError, Result};
use num_bigint::BigUint;
use std::fmt;

const WORD_BITS: usize = 64;

#[inline(always)]
const fn word_count(len: usize) -> usize {
    len.div_ceil(WORD_BITS)
}

#[inline(always)]
const fn bit(j: usize) -> u64 {
    1u64 << (j % WORD_BITS)
}

/// Mask of the valid bits in the last word of a row of length `len`.
#[inline(always)]
const fn tail_mask(len: usize) -> u64 {
    match len % WORD_BITS {
        0 => u64::MAX,
        r => (1u64 << r) - 1,
    }
}

// ============================================================================
// BitRow
// ============================================================================

/// A dense bit vector of fixed logical length.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitRow {
    words: Vec<u64>,
    len: usize,
}

impl BitRow {
    /// Creates an all-zero row of `len` bits.
    pub fn zeros(len: usize) -> Self {
        Self {
            words: vec![0; word_count(len)],
            len,
        }
    }

    /// Creates an all-one row of `len` bits.
    pub fn ones(len: usize) -> Self {
        let mut words = vec![u64::MAX; word_count(len)];
        if let Some(last) = words.last_mut() {
            *last &= tail_mask(len);
        }
        Self { words, len }
    }

    /// Creates a row with only bit `j` set.
    ///
    /// # Panics
    /// Panics if `j >= len`.
    pub fn singleton(len: usize, j: usize) -> Self {
        let mut row = Self::zeros(len);
        row.set(j);
        row
    }

    /// Returns the number of logical bits.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for a zero-width row.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns whether bit `j` is set.
    ///
    /// # Panics
    /// Panics if `j >= len`.
    #[inline(always)]
    pub fn get(&self, j: usize) -> bool {
        assert!(j < self.len, "bit index {j} out of range (len={})", self.len);
        self.words[j / WORD_BITS] & bit(j) != 0
    }

    /// Sets bit `j`.
    ///
    /// # Panics
    /// Panics if `j >= len`.
    #[inline(always)]
    pub fn set(&mut self, j: usize) {
        assert!(j < self.len, "bit index {j} out of range (len={})", self.len);
        self.words[j / WORD_BITS] |= bit(j);
    }

    /// Clears bit `j`.
    ///
    /// # Panics
    /// Panics if `j >= len`.
    #[inline(always)]
    pub fn clear(&mut self, j: usize) {
        assert!(j < self.len, "bit index {j} out of range (len={})", self.len);
        self.words[j / WORD_BITS] &= !bit(j);
    }

    /// Returns `true` if no bit is set.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns `true` if every bit is set.
    pub fn is_full(&self) -> bool {
        match self.words.split_last() {
            None => true,
            Some((&last, init)) => init.iter().all(|&w| w == u64::MAX) && last == tail_mask(self.len),
        }
    }

    /// Returns the number of set bits.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// ORs `other` into `self`.
    ///
    /// # Panics
    /// Panics if the lengths differ.
    #[inline]
    pub fn or_assign(&mut self, other: &Self) {
        assert_eq!(self.len, other.len, "or_assign: length mismatch");
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    /// Returns `self | other`.
    ///
    /// # Panics
    /// Panics if the lengths differ.
    pub fn or(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.or_assign(other);
        out
    }

    /// Returns `self & other`.
    ///
    /// # Panics
    /// Panics if the lengths differ.
    pub fn and(&self, other: &Self) -> Self {
        assert_eq!(self.len, other.len, "and: length mismatch");
        Self {
            words: self.words.iter().zip(&other.words).map(|(a, b)| a & b).collect(),
            len: self.len,
        }
    }

    /// Returns `self & !other`.
    ///
    /// # Panics
    /// Panics if the lengths differ.
    pub fn and_not(&self, other: &Self) -> Self {
        assert_eq!(self.len, other.len, "and_not: length mismatch");
        Self {
            words: self.words.iter().zip(&other.words).map(|(a, b)| a & !b).collect(),
            len: self.len,
        }
    }

    /// Returns `true` if `self & other` is non-zero.
    ///
    /// # Panics
    /// Panics if the lengths differ.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        assert_eq!(self.len, other.len, "intersects: length mismatch");
        self.words.iter().zip(&other.words).any(|(a, b)| a & b != 0)
    }

    /// Returns `true` if every bit of `self` is also set in `other`.
    ///
    /// # Panics
    /// Panics if the lengths differ.
    pub fn is_subset(&self, other: &Self) -> bool {
        assert_eq!(self.len, other.len, "is_subset: length mismatch");
        self.words.iter().zip(&other.words).all(|(a, b)| a & !b == 0)
    }

    /// Iterates over the indices of set bits in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(w, &word)| SetBits {
                word,
                base: w * WORD_BITS,
            })
    }

    // ------------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------------

    /// Parses a `0/1` string, character `j` being column `j`.
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidChar`] (with `row` 0) for anything but `0` or `1`.
    pub fn from_bit_str(text: &str) -> Result<Self> {
        parse_bits(text, 0)
    }

    /// Renders the row as a `0/1` string, column 0 first.
    pub fn to_bit_string(&self) -> String {
        (0..self.len)
            .map(|j| if self.get(j) { '1' } else { '0' })
            .collect()
    }

    /// Builds a row of `width` columns from a big-endian integer.
    ///
    /// # Errors
    /// Returns [`GraphError::RowWidth`] if `value` needs more than `width` bits.
    pub fn from_u64(value: u64, width: usize) -> Result<Self> {
        Self::from_u128(u128::from(value), width)
    }

    /// Builds a row of `width` columns from a big-endian integer.
    ///
    /// # Errors
    /// Returns [`GraphError::RowWidth`] if `value` needs more than `width` bits.
    pub fn from_u128(value: u128, width: usize) -> Result<Self> {
        let needed = (128 - value.leading_zeros()) as usize;
        if needed > width {
            return Err(GraphError::RowWidth {
                row: 0,
                expected: width,
                got: needed,
            });
        }
        let mut row = Self::zeros(width);
        let mut t = value;
        while t != 0 {
            let k = t.trailing_zeros() as usize;
            t &= t - 1;
            row.set(width - 1 - k);
        }
        Ok(row)
    }

    /// Builds a row of `width` columns from a big-endian arbitrary-precision integer.
    ///
    /// # Errors
    /// Returns [`GraphError::RowWidth`] if `value` needs more than `width` bits.
    pub fn from_biguint(value: &BigUint, width: usize) -> Result<Self> {
        let needed = value.bits() as usize;
        if needed > width {
            return Err(GraphError::RowWidth {
                row: 0,
                expected: width,
                got: needed,
            });
        }
        let mut row = Self::zeros(width);
        for (d, digit) in value.to_u64_digits().into_iter().enumerate() {
            let mut t = digit;
            while t != 0 {
                let k = d * WORD_BITS + t.trailing_zeros() as usize;
                t &= t - 1;
                row.set(width - 1 - k);
            }
        }
        Ok(row)
    }

    /// Returns the big-endian integer value, or `None` if it does not fit in a `u64`.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|v| u64::try_from(v).ok())
    }

    /// Returns the big-endian integer value, or `None` if it does not fit in a `u128`.
    pub fn to_u128(&self) -> Option<u128> {
        let mut value = 0u128;
        for j in self.iter_ones() {
            let k = self.len - 1 - j;
            if k >= 128 {
                return None;
            }
            value |= 1u128 << k;
        }
        Some(value)
    }

    /// Returns the big-endian integer value.
    pub fn to_biguint(&self) -> BigUint {
        let mut digits = vec![0u32; self.len.div_ceil(32)];
        for j in self.iter_ones() {
            let k = self.len - 1 - j;
            digits[k / 32] |= 1u32 << (k % 32);
        }
        BigUint::new(digits)
    }
}

/// Parses one `0/1` line, reporting errors against `row`.
pub(crate) fn parse_bits(text: &str, row: usize) -> Result<BitRow> {
    let bytes = text.as_bytes();
    let mut out = BitRow::zeros(bytes.len());
    for (j, &b) in bytes.iter().enumerate() {
        match b {
            b'0' => {}
            b'1' => out.set(j),
            _ => {
                return Err(GraphError::InvalidChar {
                    row,
                    col: j,
                    ch: text[j..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER),
                })
            }
        }
    }
    Ok(out)
}

impl fmt::Debug for BitRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitRow({})", self.to_bit_string())
    }
}

impl fmt::Display for BitRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

/// Set-bit iterator over one word.
struct SetBits {
    word: u64,
    base: usize,
}

impl Iterator for SetBits {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.word == 0 {
            return None;
        }
        let j = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        Some(self.base + j)
    }
}
