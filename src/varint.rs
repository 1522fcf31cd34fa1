//! Byte-level primitive codec (C1): base-128 varints, ZigZag, bounded-width
//! two's-complement varints, and the little-endian fixed32/64 forms.
//!
//! None of this knows about tags, schemas, or messages; it only turns
//! integers into bytes and back. [`crate::raw`] and the schema-driven
//! encoder/decoder are both built on top of it.

use crate::error::CodecError;

/// Maximum number of bytes a varint may occupy before it's considered
/// corrupt. `ceil(64 / 7) == 10`.
const MAX_VARINT_BYTES: usize = 10;

/// Appends the base-128 varint encoding of `value` to `out`.
pub fn write_varint(mut value: u64, out: &mut alloc::vec::Vec<u8>) {
  loop {
    let byte = (value & 0x7f) as u8;
    value >>= 7;
    if value == 0 {
      out.push(byte);
      return;
    }
    out.push(byte | 0x80);
  }
}

/// Returns the number of bytes [`write_varint`] would emit for `value`,
/// without allocating.
pub fn varint_len(value: u64) -> usize {
  let mut len = 1;
  let mut value = value >> 7;
  while value != 0 {
    len += 1;
    value >>= 7;
  }
  len
}

/// Reads a base-128 varint from the front of `data`, returning the value and
/// the number of bytes consumed.
///
/// Fails with [`CodecError::Truncated`] if `data` runs out before a
/// continuation bit clears, and [`CodecError::VarintOverflow`] if more than
/// [`MAX_VARINT_BYTES`] bytes are read without termination.
pub fn read_varint(data: &[u8]) -> Result<(u64, usize), CodecError> {
  let mut result: u64 = 0;
  for i in 0..MAX_VARINT_BYTES {
    let byte = *data.get(i).ok_or(CodecError::Truncated(crate::error::EndOfMessage { partial: i > 0 }))?;
    result |= ((byte & 0x7f) as u64) << (7 * i);
    if byte & 0x80 == 0 {
      return Ok((result, i + 1));
    }
  }
  Err(CodecError::VarintOverflow)
}

/// ZigZag-encodes a signed 64-bit value so that small magnitudes (positive
/// or negative) map to small unsigned varints.
#[inline]
pub fn zigzag_encode(n: i64) -> u64 { ((n << 1) ^ (n >> 63)) as u64 }

/// Inverse of [`zigzag_encode`].
#[inline]
pub fn zigzag_decode(u: u64) -> i64 { ((u >> 1) as i64) ^ -((u & 1) as i64) }

/// Encodes `n` as an unsigned varint whose bit pattern is the two's-complement
/// representation of `n` in `width` bits (the Protobuf `int32`/`int64`
/// convention: negative values occupy the full width, e.g. 10 bytes for a
/// 64-bit negative number).
///
/// `width` must be a positive multiple of 8; callers are expected to have
/// validated this when the schema was compiled (see
/// [`crate::schema::Schema::with_varint_width`]).
pub fn tc_encode(n: i64, width: u32) -> u64 {
  if width >= 64 {
    n as u64
  } else {
    (n as u64) & ((1u64 << width) - 1)
  }
}

/// Inverse of [`tc_encode`]: sign-extends bit `width - 1` of `u` to recover
/// the original signed value.
pub fn tc_decode(u: u64, width: u32) -> i64 {
  if width >= 64 {
    u as i64
  } else {
    let shift = 64 - width;
    ((u << shift) as i64) >> shift
  }
}

/// Writes a 32-bit little-endian fixed value.
pub fn write_fixed32(value: u32, out: &mut alloc::vec::Vec<u8>) { out.extend_from_slice(&value.to_le_bytes()); }

/// Writes a 64-bit little-endian fixed value.
pub fn write_fixed64(value: u64, out: &mut alloc::vec::Vec<u8>) { out.extend_from_slice(&value.to_le_bytes()); }

/// Reads a 32-bit little-endian fixed value from the front of `data`.
pub fn read_fixed32(data: &[u8]) -> Result<u32, CodecError> {
  let bytes: [u8; 4] = data
    .get(..4)
    .ok_or(CodecError::Truncated(crate::error::EndOfMessage { partial: !data.is_empty() }))?
    .try_into()
    .unwrap();
  Ok(u32::from_le_bytes(bytes))
}

/// Reads a 64-bit little-endian fixed value from the front of `data`.
pub fn read_fixed64(data: &[u8]) -> Result<u64, CodecError> {
  let bytes: [u8; 8] = data
    .get(..8)
    .ok_or(CodecError::Truncated(crate::error::EndOfMessage { partial: !data.is_empty() }))?
    .try_into()
    .unwrap();
  Ok(u64::from_le_bytes(bytes))
}
