//! Schema-driven encoder (C7, §4.7): walks a compiled [`Schema`] and a
//! matching [`Payload`], producing the wire bytes.

use crate::error::CodecError;
use crate::schema::{Field, Schema, SemanticType};
use crate::tag::Tag;
use crate::value::{Payload, Value};
use crate::varint::{tc_encode, write_fixed32, write_fixed64, write_varint, zigzag_encode};
use crate::WireType;
use alloc::vec::Vec;

/// Encodes `payload` against `schema`, returning the wire bytes.
///
/// A [`Payload::Positional`] must have exactly one value per field,
/// `x`-placeholders included. A [`Payload::Named`] may omit any optional
/// field's key entirely; a missing required field (by either surface) is
/// [`CodecError::RequiredFieldMissing`].
pub fn encode(schema: &Schema, payload: &Payload) -> Result<Vec<u8>, CodecError> {
  crate::trace_log!("encoding {} field(s), kv={}", schema.fields().len(), schema.is_kv());
  let mut out = Vec::new();
  match payload {
    Payload::Positional(values) => {
      if values.len() != schema.fields().len() {
        return Err(CodecError::PayloadLengthMismatch {
          expected: schema.fields().len(),
          found: values.len(),
        });
      }
      for (field, value) in schema.fields().iter().zip(values.iter()) {
        encode_field(field, value, schema.tc_width(), &mut out)?;
      }
    }
    Payload::Named(map) => {
      for field in schema.fields() {
        let name = field.name.as_deref().expect("key/value schema fields are always named");
        let value = map.get(name).unwrap_or(&Value::None);
        encode_field(field, value, schema.tc_width(), &mut out)?;
      }
    }
  }
  Ok(out)
}

fn encode_field(field: &Field, value: &Value, tc_width: u32, out: &mut Vec<u8>) -> Result<(), CodecError> {
  // `x` never touches the wire in either direction; its payload slot exists
  // only to keep positional indices aligned with the declared field count.
  if field.semantic_type == SemanticType::Placeholder {
    return Ok(());
  }
  if field.repeated {
    return encode_repeated(field, value, tc_width, out);
  }
  match value {
    Value::None => {
      if field.required {
        return Err(CodecError::RequiredFieldMissing(field.field_id()));
      }
      Ok(())
    }
    other => encode_single(field, other, tc_width, out),
  }
}

fn encode_repeated(field: &Field, value: &Value, tc_width: u32, out: &mut Vec<u8>) -> Result<(), CodecError> {
  let items: &[Value] = match value {
    Value::None => &[],
    Value::Repeated(items) => items,
    _ => return Err(CodecError::ValueOutOfRange),
  };
  if items.is_empty() {
    // An empty repeated field, packed or not, is simply absent from the wire.
    return Ok(());
  }
  if field.packed {
    let mut inner = Vec::new();
    for item in items {
      write_scalar_payload(field.semantic_type, item, tc_width, &mut inner)?;
    }
    let tag = Tag::new(field.tag, WireType::LengthDelimited)?;
    tag.write(out);
    write_varint(inner.len() as u64, out);
    out.extend_from_slice(&inner);
  } else {
    for item in items {
      encode_single(field, item, tc_width, out)?;
    }
  }
  Ok(())
}

fn encode_single(field: &Field, value: &Value, tc_width: u32, out: &mut Vec<u8>) -> Result<(), CodecError> {
  if field.semantic_type == SemanticType::Nested {
    let payload = match value {
      Value::Message(payload) => payload,
      _ => return Err(CodecError::ValueOutOfRange),
    };
    let nested_schema = field.nested.as_deref().expect("nested field always carries a schema");
    let bytes = encode(nested_schema, payload)?;
    let tag = Tag::new(field.tag, WireType::LengthDelimited)?;
    tag.write(out);
    write_varint(bytes.len() as u64, out);
    out.extend_from_slice(&bytes);
    return Ok(());
  }
  let tag = Tag::new(field.tag, field.wire_type())?;
  tag.write(out);
  write_scalar_payload(field.semantic_type, value, tc_width, out)
}

/// Writes just the payload bytes for a scalar value — no tag, no length
/// prefix beyond what the type itself needs (bytes/text still carry their
/// own length, since that's part of the value's own wire shape).
fn write_scalar_payload(
  semantic_type: SemanticType,
  value: &Value,
  tc_width: u32,
  out: &mut Vec<u8>,
) -> Result<(), CodecError> {
  match (semantic_type, value) {
    (SemanticType::Bool, Value::Bool(b)) => {
      write_varint(if *b { 1 } else { 0 }, out);
      Ok(())
    }
    (SemanticType::UnsignedVarint, Value::UInt(u)) => {
      write_varint(*u, out);
      Ok(())
    }
    (SemanticType::UnsignedVarint, Value::Int(n)) => {
      let n = u64::try_from(*n).map_err(|_| CodecError::ValueOutOfRange)?;
      write_varint(n, out);
      Ok(())
    }
    (SemanticType::ZigZagVarint, Value::Int(n)) => {
      write_varint(zigzag_encode(*n), out);
      Ok(())
    }
    (SemanticType::TwosComplement, Value::Int(n)) => {
      write_varint(tc_encode(*n, tc_width), out);
      Ok(())
    }
    (SemanticType::SFixed32, Value::Int(n)) => {
      let n = i32::try_from(*n).map_err(|_| CodecError::ValueOutOfRange)?;
      write_fixed32(n as u32, out);
      Ok(())
    }
    (SemanticType::UFixed32, Value::UInt(u)) => {
      let u = u32::try_from(*u).map_err(|_| CodecError::ValueOutOfRange)?;
      write_fixed32(u, out);
      Ok(())
    }
    (SemanticType::SFixed64, Value::Int(n)) => {
      write_fixed64(*n as u64, out);
      Ok(())
    }
    (SemanticType::UFixed64, Value::UInt(u)) => {
      write_fixed64(*u, out);
      Ok(())
    }
    (SemanticType::Float32, Value::F32(f)) => {
      write_fixed32(f.to_bits(), out);
      Ok(())
    }
    (SemanticType::Float64, Value::F64(f)) => {
      write_fixed64(f.to_bits(), out);
      Ok(())
    }
    // Explicit int -> float widening on encode; the reverse is not granted.
    (SemanticType::Float32, Value::Int(n)) => {
      write_fixed32((*n as f32).to_bits(), out);
      Ok(())
    }
    (SemanticType::Float64, Value::Int(n)) => {
      write_fixed64((*n as f64).to_bits(), out);
      Ok(())
    }
    (SemanticType::Float32, Value::UInt(n)) => {
      write_fixed32((*n as f32).to_bits(), out);
      Ok(())
    }
    (SemanticType::Float64, Value::UInt(n)) => {
      write_fixed64((*n as f64).to_bits(), out);
      Ok(())
    }
    (SemanticType::Bytes, Value::Bytes(bytes)) => {
      write_varint(bytes.len() as u64, out);
      out.extend_from_slice(bytes);
      Ok(())
    }
    (SemanticType::Text, Value::Str(s)) => {
      write_varint(s.len() as u64, out);
      out.extend_from_slice(s.as_bytes());
      Ok(())
    }
    _ => Err(CodecError::ValueOutOfRange),
  }
}
