//! Tag codec (C2): the `(field_number << 3) | wire_type` varint that
//! precedes every value on the wire.

use crate::error::CodecError;
use crate::varint::{read_varint, varint_len, write_varint};
use crate::WireType;
use alloc::vec::Vec;

/// Smallest legal field number. 0 is reserved and never valid.
pub const MIN_FIELD: u32 = 1;
/// Largest field number a varint tag can address (`2^29 - 1`); bits 29-31 of
/// the shifted tag would overflow a `u32` otherwise.
pub const MAX_FIELD: u32 = (1 << 29) - 1;

/// A decoded `(field_number, wire_type)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
  pub field: u32,
  pub wire_type: WireType,
}

impl Tag {
  pub fn new(field: u32, wire_type: WireType) -> Result<Self, CodecError> {
    if field < MIN_FIELD || field > MAX_FIELD {
      return Err(CodecError::FieldNumberOutOfRange(field));
    }
    Ok(Tag { field, wire_type })
  }

  fn to_u64(self) -> u64 { ((self.field as u64) << 3) | self.wire_type as u64 }

  pub fn encoded_len(self) -> usize { varint_len(self.to_u64()) }

  pub fn write(self, out: &mut Vec<u8>) { write_varint(self.to_u64(), out) }

  /// Reads a tag from the front of `data`, returning it and the number of
  /// bytes consumed. Fails with [`CodecError::UnsupportedGroup`] for wire
  /// types 3 and 4 (the deprecated group start/end markers).
  pub fn read(data: &[u8]) -> Result<(Tag, usize), CodecError> {
    let (raw, len) = read_varint(data)?;
    let field = (raw >> 3) as u32;
    let wire_type = (raw & 0x7) as u8;
    if field < MIN_FIELD || field > MAX_FIELD {
      return Err(CodecError::FieldNumberOutOfRange(field));
    }
    let wire_type = WireType::from_id(wire_type).ok_or(CodecError::UnsupportedGroup)?;
    Ok((Tag { field, wire_type }, len))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trip() {
    for field in [1u32, 15, 16, 1000, MAX_FIELD] {
      for wire_type in
        [WireType::Varint, WireType::Fixed64, WireType::LengthDelimited, WireType::Fixed32]
      {
        let tag = Tag::new(field, wire_type).unwrap();
        let mut buf = Vec::new();
        tag.write(&mut buf);
        assert_eq!(buf.len(), tag.encoded_len());
        let (decoded, len) = Tag::read(&buf).unwrap();
        assert_eq!(decoded, tag);
        assert_eq!(len, buf.len());
      }
    }
  }

  #[test]
  fn rejects_field_zero() {
    assert_eq!(Tag::new(0, WireType::Varint).unwrap_err(), CodecError::FieldNumberOutOfRange(0));
  }

  #[test]
  fn rejects_field_too_large() {
    assert!(Tag::new(MAX_FIELD + 1, WireType::Varint).is_err());
  }

  #[test]
  fn rejects_group_wire_types() {
    // wire type 3 (group start) on field 1: (1 << 3) | 3 == 11
    let mut buf = Vec::new();
    write_varint(11, &mut buf);
    assert_eq!(Tag::read(&buf).unwrap_err(), CodecError::UnsupportedGroup);
  }

  #[test]
  fn varint_overflow_surfaces_at_ten_bytes() {
    let data = [0xffu8; 11];
    assert_eq!(Tag::read(&data).unwrap_err(), CodecError::VarintOverflow);
  }
}
