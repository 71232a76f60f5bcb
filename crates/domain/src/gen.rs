//! Decoding of the game's bit-packed identifiers.
//!
//! The server hands out hero and house attributes as one decimal-encoded
//! integer per entity. The wire convention is least-significant-bit-first:
//! fixed-width attribute fields live at documented bit offsets counted from
//! the low end of the number.

use alloy_primitives::U256;

use crate::error::DomainError;

/// A parsed identifier, ready for field extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenBits {
    value: U256,
    len: usize,
}

impl GenBits {
    /// Parse a decimal-string identifier.
    pub fn parse(gen_id: &str) -> Result<Self, DomainError> {
        let value = U256::from_str_radix(gen_id.trim(), 10)
            .map_err(|_| DomainError::InvalidGenId(gen_id.to_string()))?;
        let len = value.bit_len();
        Ok(Self { value, len })
    }

    /// Number of significant bits in the identifier.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the field occupying bits `[from, to)`, LSB-first.
    ///
    /// Bits beyond the identifier's length read as zero. Fields wider than
    /// 32 bits are truncated; no documented field is that wide.
    pub fn field(&self, from: usize, to: usize) -> u32 {
        let width = to.saturating_sub(from).min(32);
        let mut out = 0u32;
        for k in 0..width {
            let idx = from + k;
            if idx < 256 && self.value.bit(idx) {
                out |= 1 << k;
            }
        }
        out
    }

    /// Read the variable-length run of `width`-bit fields starting at `from`
    /// and ending at the identifier's last significant bit. The final field
    /// may be narrower than `width`.
    pub fn tail(&self, from: usize, width: usize) -> Vec<u32> {
        let mut out = Vec::new();
        let mut at = from;
        while at < self.len {
            let end = (at + width).min(self.len);
            out.push(self.field(at, end));
            at = end;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_small_values() {
        // 0b1011 reversed is bits 0,1,3 set
        let bits = GenBits::parse("11").expect("decodes");
        assert_eq!(bits.len(), 4);
        assert_eq!(bits.field(0, 4), 11);
        assert_eq!(bits.field(1, 3), 0b01);
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(matches!(
            GenBits::parse("not-a-number"),
            Err(DomainError::InvalidGenId(_))
        ));
    }

    #[test]
    fn field_beyond_length_reads_zero() {
        let bits = GenBits::parse("5").expect("decodes");
        assert_eq!(bits.field(10, 20), 0);
    }

    #[test]
    fn tail_slices_until_last_bit() {
        // Value with bits 0..=6 set: tail(0, 5) -> [0b11111, 0b11]
        let bits = GenBits::parse("127").expect("decodes");
        assert_eq!(bits.tail(0, 5), vec![31, 3]);
    }
}
