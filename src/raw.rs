//! Schema-less record codec (C3, §4.3): encodes/decodes a flat sequence of
//! tag-prefixed records with no schema validation at all. Useful for
//! inspecting or relaying a message whose schema you don't have, or for
//! building a schema from a sample payload.

use crate::error::{CodecError, EndOfMessage};
use crate::tag::Tag;
use crate::varint::{read_fixed32, read_fixed64, read_varint, write_fixed32, write_fixed64, write_varint};
use crate::WireType;
use alloc::vec::Vec;

/// The payload of one raw record, shaped by its wire type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
  Varint(u64),
  Fixed64(u64),
  /// Owns a copy of the bytes; a raw record never knows whether they're
  /// text, a nested message, or opaque bytes.
  LengthDelimited(alloc::vec::Vec<u8>),
  Fixed32(u32),
}

impl RawValue {
  pub fn wire_type(&self) -> WireType {
    match self {
      Self::Varint(_) => WireType::Varint,
      Self::Fixed64(_) => WireType::Fixed64,
      Self::LengthDelimited(_) => WireType::LengthDelimited,
      Self::Fixed32(_) => WireType::Fixed32,
    }
  }
}

/// A single tag + payload pair read from, or to be written to, the wire
/// with no interpretation of what the field number means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
  pub field: u32,
  pub value: RawValue,
}

/// Appends the wire encoding of `records` to `out`, in order.
pub fn encode_raw(records: &[Record], out: &mut Vec<u8>) -> Result<(), CodecError> {
  for record in records {
    let tag = Tag::new(record.field, record.value.wire_type())?;
    tag.write(out);
    match &record.value {
      RawValue::Varint(v) => write_varint(*v, out),
      RawValue::Fixed64(v) => write_fixed64(*v, out),
      RawValue::Fixed32(v) => write_fixed32(*v, out),
      RawValue::LengthDelimited(bytes) => {
        write_varint(bytes.len() as u64, out);
        out.extend_from_slice(bytes);
      }
    }
  }
  Ok(())
}

/// A restartable cursor over a raw record stream (§4.3's "restartable
/// cursor" requirement): each call to [`next`](RawReader::next) advances
/// past exactly one record, so a caller can stop and resume reading later,
/// or retry from the last good position after a truncation.
#[derive(Debug, Clone)]
pub struct RawReader<'a> {
  data: &'a [u8],
  pos: usize,
}

impl<'a> RawReader<'a> {
  pub fn new(data: &'a [u8]) -> Self { RawReader { data, pos: 0 } }

  /// Byte offset of the next record to be read.
  pub fn position(&self) -> usize { self.pos }

  pub fn is_at_end(&self) -> bool { self.pos == self.data.len() }

  /// Reads the next record, or `Ok(None)` if the cursor is exactly at a
  /// record boundary and the stream is exhausted.
  ///
  /// On [`CodecError::Truncated`], `self.pos` is left at the start of the
  /// incomplete record, so a caller holding more bytes (e.g. from a
  /// streaming source) can feed a longer buffer and retry from scratch.
  pub fn next(&mut self) -> Result<Option<Record>, CodecError> {
    if self.pos == self.data.len() {
      return Ok(None);
    }
    let record_start = self.pos;
    let remaining = &self.data[self.pos..];
    let (tag, tag_len) =
      Tag::read(remaining).map_err(|e| self.mark_partial(e, record_start))?;
    let body = &remaining[tag_len..];
    let (value, body_len) = match tag.wire_type {
      WireType::Varint => {
        let (v, len) = read_varint(body).map_err(|e| self.mark_partial(e, record_start))?;
        (RawValue::Varint(v), len)
      }
      WireType::Fixed64 => {
        let v = read_fixed64(body).map_err(|e| self.mark_partial(e, record_start))?;
        (RawValue::Fixed64(v), 8)
      }
      WireType::Fixed32 => {
        let v = read_fixed32(body).map_err(|e| self.mark_partial(e, record_start))?;
        (RawValue::Fixed32(v), 4)
      }
      WireType::LengthDelimited => {
        let (len, len_bytes) = read_varint(body).map_err(|e| self.mark_partial(e, record_start))?;
        // `len` comes straight off the wire and may be up to 2^64 - 1; add
        // with an explicit bounds check rather than `len_bytes + len`, which
        // would overflow `usize` on a crafted record.
        let end = len_bytes.checked_add(len as usize).filter(|&end| end <= body.len());
        let bytes = match end {
          Some(end) => &body[len_bytes..end],
          None => {
            return Err(self.mark_partial(
              CodecError::Truncated(EndOfMessage { partial: true }),
              record_start,
            ))
          }
        };
        (RawValue::LengthDelimited(bytes.to_vec()), len_bytes + len as usize)
      }
    };
    self.pos = record_start + tag_len + body_len;
    Ok(Some(Record { field: tag.field, value }))
  }

  /// Re-raises `err`, leaving `self.pos` at `record_start` so the failed
  /// record can be retried wholesale. `partial` is set whenever any bytes
  /// of this record were consumed before the failure, per
  /// [`EndOfMessage::partial`]'s documented meaning.
  fn mark_partial(&mut self, err: CodecError, record_start: usize) -> CodecError {
    self.pos = record_start;
    err
  }
}

/// Decodes every record in `data` into a `Vec`, for callers that don't need
/// the restartable cursor. Fails on the first error, same as repeatedly
/// calling [`RawReader::next`] until it errors or returns `None`.
pub fn decode_raw(data: &[u8]) -> Result<Vec<Record>, CodecError> {
  let mut reader = RawReader::new(data);
  let mut records = Vec::new();
  while let Some(record) = reader.next()? {
    records.push(record);
  }
  Ok(records)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trip_mixed_wire_types() {
    let records = alloc::vec![
      Record { field: 1, value: RawValue::Varint(300) },
      Record { field: 2, value: RawValue::Fixed32(0xdead_beef) },
      Record { field: 3, value: RawValue::LengthDelimited(alloc::vec![1, 2, 3]) },
      Record { field: 4, value: RawValue::Fixed64(0x0123_4567_89ab_cdef) },
    ];
    let mut buf = Vec::new();
    encode_raw(&records, &mut buf).unwrap();
    let decoded = decode_raw(&buf).unwrap();
    assert_eq!(decoded, records);
  }

  #[test]
  fn empty_stream_decodes_to_no_records() {
    assert_eq!(decode_raw(&[]).unwrap(), Vec::new());
  }

  #[test]
  fn reader_is_restartable_at_record_boundaries() {
    let records = alloc::vec![
      Record { field: 1, value: RawValue::Varint(1) },
      Record { field: 2, value: RawValue::Varint(2) },
    ];
    let mut buf = Vec::new();
    encode_raw(&records, &mut buf).unwrap();

    let mut reader = RawReader::new(&buf);
    let first = reader.next().unwrap().unwrap();
    assert_eq!(first.field, 1);
    let boundary = reader.position();
    assert!(!reader.is_at_end());

    let mut resumed = RawReader::new(&buf[boundary..]);
    let second = resumed.next().unwrap().unwrap();
    assert_eq!(second.field, 2);
    assert!(resumed.is_at_end());
  }

  #[test]
  fn truncated_length_delimited_reports_partial() {
    let mut buf = Vec::new();
    Tag::new(1, WireType::LengthDelimited).unwrap().write(&mut buf);
    write_varint(10, &mut buf);
    buf.extend_from_slice(&[1, 2, 3]);

    let mut reader = RawReader::new(&buf);
    let err = reader.next().unwrap_err();
    assert!(matches!(err, CodecError::Truncated(EndOfMessage { partial: true })));
    assert_eq!(reader.position(), 0);
  }

  #[test]
  fn huge_declared_length_fails_without_overflow_panic() {
    // A crafted record can claim a length up to 2^64 - 1; `len_bytes + len`
    // must not be computed with a bare `usize` add, or this panics in a
    // debug-assertions build (and silently misbehaves in release).
    let mut buf = Vec::new();
    Tag::new(1, WireType::LengthDelimited).unwrap().write(&mut buf);
    write_varint(u64::MAX, &mut buf);
    buf.extend_from_slice(&[1, 2, 3]);

    let mut reader = RawReader::new(&buf);
    let err = reader.next().unwrap_err();
    assert!(matches!(err, CodecError::Truncated(EndOfMessage { partial: true })));
    assert_eq!(reader.position(), 0);
  }

  #[test]
  fn truncated_at_exact_boundary_is_not_partial() {
    let mut buf = Vec::new();
    write_varint(5, &mut buf);
    buf.truncate(0);
    let mut reader = RawReader::new(&buf);
    assert_eq!(reader.next().unwrap(), None);
  }
}
