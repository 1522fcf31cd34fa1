//! Schema-driven decoder (C8, §4.8): walks the wire bytes record by record
//! via [`RawReader`], routes each one to its declared field by tag, and
//! assembles a [`Payload`] matching the schema's surface shape.

use crate::error::CodecError;
use crate::raw::{RawReader, RawValue};
use crate::schema::{Field, Schema, SemanticType};
use crate::value::{Payload, Value};
use crate::varint::{read_fixed32, read_fixed64, read_varint, tc_decode, zigzag_decode};
use crate::WireType;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

/// Decodes `data` against `schema`, returning the positional or named
/// payload depending on how `schema` was compiled.
///
/// Duplicate non-repeated scalar tags resolve "last wins": a later record
/// for the same tag replaces an earlier one, rather than erroring. An
/// unknown tag is an error ([`CodecError::UnknownField`]) — unlike a
/// forward-compatible message format, this codec has no reserved "unknown
/// fields" bucket to route it to.
///
/// A repeated *numeric or bool* scalar field accepts either wire form
/// regardless of how the schema marked it: a length-delimited record is
/// unpacked into consecutive values, and individual scalar records
/// accumulate as unpacked ones would. This is the one wire-type-mismatch
/// tolerance the decoder grants; everything else is a hard
/// [`CodecError::WireTypeMismatch`]. Text/bytes fields can't be packed in
/// the first place (see [`SemanticType::packable`]), so this tolerance
/// never applies to them — each length-delimited record they receive is
/// always exactly one value.
pub fn decode(schema: &Schema, data: &[u8]) -> Result<Payload, CodecError> {
  crate::trace_log!("decoding {} byte(s) against {} field(s)", data.len(), schema.fields().len());
  let field_count = schema.fields().len();
  let mut scalars: Vec<Option<Value>> = vec![None; field_count];
  let mut repeateds: Vec<Vec<Value>> = vec![Vec::new(); field_count];

  let mut reader = RawReader::new(data);
  while let Some(record) = reader.next()? {
    let index = schema
      .field_index_by_tag(record.field)
      .ok_or(CodecError::UnknownField(record.field))?;
    let field = &schema.fields()[index];

    if field.semantic_type == SemanticType::Placeholder {
      // `x` never carries a value; any bytes for it are simply discarded.
      continue;
    }

    if field.semantic_type == SemanticType::Nested {
      decode_nested(field, &record.value, schema.tc_width(), &mut scalars[index], &mut repeateds[index])?;
      continue;
    }

    let expected = field.wire_type();
    let found = record.value.wire_type();
    if found == expected {
      let value = value_from_raw(field.semantic_type, &record.value, schema.tc_width())?;
      store(field, value, &mut scalars[index], &mut repeateds[index]);
    } else if field.repeated && field.semantic_type.packable() && found == WireType::LengthDelimited {
      let bytes = match &record.value {
        RawValue::LengthDelimited(bytes) => bytes,
        _ => unreachable!("matched found == LengthDelimited above"),
      };
      let mut pos = 0;
      while pos < bytes.len() {
        let (value, len) = read_scalar_payload(field.semantic_type, schema.tc_width(), &bytes[pos..])?;
        repeateds[index].push(value);
        pos += len;
      }
    } else {
      return Err(CodecError::WireTypeMismatch { tag: record.field, expected, found });
    }
  }

  assemble(schema, scalars, repeateds)
}

fn decode_nested(
  field: &Field,
  raw: &RawValue,
  tc_width: u32,
  scalar_slot: &mut Option<Value>,
  repeated_slot: &mut Vec<Value>,
) -> Result<(), CodecError> {
  let bytes = match raw {
    RawValue::LengthDelimited(bytes) => bytes,
    other => {
      return Err(CodecError::WireTypeMismatch {
        tag: field.tag,
        expected: WireType::LengthDelimited,
        found: other.wire_type(),
      })
    }
  };
  let nested_schema = field.nested.as_deref().expect("nested field always carries a schema");
  let _ = tc_width;
  let nested_payload = decode(nested_schema, bytes)?;
  let value = Value::Message(Box::new(nested_payload));
  store(field, value, scalar_slot, repeated_slot);
  Ok(())
}

fn store(field: &Field, value: Value, scalar_slot: &mut Option<Value>, repeated_slot: &mut Vec<Value>) {
  if field.repeated {
    repeated_slot.push(value);
  } else {
    // Last wins: simply overwrite.
    *scalar_slot = Some(value);
  }
}

fn assemble(
  schema: &Schema,
  mut scalars: Vec<Option<Value>>,
  mut repeateds: Vec<Vec<Value>>,
) -> Result<Payload, CodecError> {
  if schema.is_kv() {
    let mut map = BTreeMap::new();
    for (index, field) in schema.fields().iter().enumerate() {
      let name = field.name.clone().expect("key/value schema fields are always named");
      if field.repeated {
        map.insert(name, Value::Repeated(core::mem::take(&mut repeateds[index])));
        continue;
      }
      match scalars[index].take() {
        Some(value) => {
          map.insert(name, value);
        }
        None => {
          if field.required {
            return Err(CodecError::RequiredFieldMissing(field.field_id()));
          }
          if !schema.allow_sparse_dict() {
            map.insert(name, Value::None);
          }
        }
      }
    }
    Ok(Payload::Named(map))
  } else {
    let mut values = Vec::with_capacity(schema.fields().len());
    for (index, field) in schema.fields().iter().enumerate() {
      if field.repeated {
        values.push(Value::Repeated(core::mem::take(&mut repeateds[index])));
        continue;
      }
      match scalars[index].take() {
        Some(value) => values.push(value),
        None => {
          if field.required {
            return Err(CodecError::RequiredFieldMissing(field.field_id()));
          }
          values.push(Value::None);
        }
      }
    }
    Ok(Payload::Positional(values))
  }
}

/// Interprets a whole decoded [`RawValue`] as a [`Value`] for a field whose
/// wire type already matches (the common, non-packed case).
fn value_from_raw(semantic_type: SemanticType, raw: &RawValue, tc_width: u32) -> Result<Value, CodecError> {
  Ok(match (semantic_type, raw) {
    (SemanticType::Bool, RawValue::Varint(v)) => Value::Bool(*v != 0),
    (SemanticType::UnsignedVarint, RawValue::Varint(v)) => Value::UInt(*v),
    (SemanticType::ZigZagVarint, RawValue::Varint(v)) => Value::Int(zigzag_decode(*v)),
    (SemanticType::TwosComplement, RawValue::Varint(v)) => Value::Int(tc_decode(*v, tc_width)),
    (SemanticType::SFixed32, RawValue::Fixed32(v)) => Value::Int(*v as i32 as i64),
    (SemanticType::UFixed32, RawValue::Fixed32(v)) => Value::UInt(*v as u64),
    (SemanticType::SFixed64, RawValue::Fixed64(v)) => Value::Int(*v as i64),
    (SemanticType::UFixed64, RawValue::Fixed64(v)) => Value::UInt(*v),
    (SemanticType::Float32, RawValue::Fixed32(v)) => Value::F32(f32::from_bits(*v)),
    (SemanticType::Float64, RawValue::Fixed64(v)) => Value::F64(f64::from_bits(*v)),
    (SemanticType::Bytes, RawValue::LengthDelimited(bytes)) => Value::Bytes(bytes.clone()),
    (SemanticType::Text, RawValue::LengthDelimited(bytes)) => {
      let s = core::str::from_utf8(bytes).map_err(|_| CodecError::BadString)?;
      Value::Str(s.to_string())
    }
    _ => unreachable!("caller only invokes this when raw.wire_type() == semantic_type.wire_type()"),
  })
}

/// Reads one scalar payload (no tag, no outer length prefix) from the front
/// of `data`, used when unpacking a length-delimited packed-repeated field.
/// Mirrors [`crate::encode`]'s `write_scalar_payload` byte for byte.
///
/// Only called for [`SemanticType::packable`] types, so `Bytes`/`Text` never
/// reach here: a packed run of length-delimited values would be
/// wire-identical to one long unpacked value, so the schema compiler refuses
/// to mark those types packed in the first place (see `packable`'s doc).
fn read_scalar_payload(semantic_type: SemanticType, tc_width: u32, data: &[u8]) -> Result<(Value, usize), CodecError> {
  match semantic_type {
    SemanticType::Bool => {
      let (v, len) = read_varint(data)?;
      Ok((Value::Bool(v != 0), len))
    }
    SemanticType::UnsignedVarint => {
      let (v, len) = read_varint(data)?;
      Ok((Value::UInt(v), len))
    }
    SemanticType::ZigZagVarint => {
      let (v, len) = read_varint(data)?;
      Ok((Value::Int(zigzag_decode(v)), len))
    }
    SemanticType::TwosComplement => {
      let (v, len) = read_varint(data)?;
      Ok((Value::Int(tc_decode(v, tc_width)), len))
    }
    SemanticType::SFixed32 => Ok((Value::Int(read_fixed32(data)? as i32 as i64), 4)),
    SemanticType::UFixed32 => Ok((Value::UInt(read_fixed32(data)? as u64), 4)),
    SemanticType::SFixed64 => Ok((Value::Int(read_fixed64(data)? as i64), 8)),
    SemanticType::UFixed64 => Ok((Value::UInt(read_fixed64(data)?), 8)),
    SemanticType::Float32 => Ok((Value::F32(f32::from_bits(read_fixed32(data)?)), 4)),
    SemanticType::Float64 => Ok((Value::F64(f64::from_bits(read_fixed64(data)?)), 8)),
    SemanticType::Bytes | SemanticType::Text => unreachable!("length-delimited types are never packable"),
    SemanticType::Placeholder => unreachable!("placeholder fields are never packable"),
    SemanticType::Nested => unreachable!("nested fields are never packable"),
  }
}
