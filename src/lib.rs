//! A compact, schema-driven Protocol-Buffers-style wire codec for
//! memory-constrained targets.
//!
//! The crate is split into the primitive byte-level codec ([`varint`],
//! [`tag`]), the schema-less record form ([`raw`]) for poking at a message
//! with no schema in hand, the schema IR and its two compilers
//! ([`schema`]), and the schema-driven [`encode`]/[`decode`] pair that ties
//! a compiled [`schema::Schema`] to a dynamic [`value::Payload`].
//!
//! `no_std` by default; the `std` feature (on by default) only adds
//! `std::error::Error` impls for the error types. The `logging` feature
//! emits `log::trace!` diagnostics from the hot paths.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod decode;
pub mod encode;
pub mod error;
pub mod raw;
pub mod schema;
pub mod tag;
pub mod value;
pub mod varint;

pub use decode::decode;
pub use encode::encode;
pub use error::Error;
pub use raw::{decode_raw, encode_raw, Record, RawReader, RawValue};
pub use schema::Schema;
pub use value::{Payload, Value};

/// The four wire types this codec understands (§3.1). Groups (3, 4) are
/// deliberately absent — [`WireType::from_id`] returns `None` for them, and
/// every caller of it turns that into
/// [`error::CodecError::UnsupportedGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
  Varint = 0,
  Fixed64 = 1,
  LengthDelimited = 2,
  Fixed32 = 5,
}

impl WireType {
  pub fn from_id(id: u8) -> Option<Self> {
    Some(match id {
      0 => Self::Varint,
      1 => Self::Fixed64,
      2 => Self::LengthDelimited,
      5 => Self::Fixed32,
      _ => return None,
    })
  }
}

/// Enabled only with the `logging` feature; expands to nothing otherwise so
/// the hot paths carry zero overhead when the feature is off.
#[cfg(feature = "logging")]
macro_rules! trace_log {
  ($($arg:tt)*) => { log::trace!($($arg)*) };
}
#[cfg(not(feature = "logging"))]
macro_rules! trace_log {
  ($($arg:tt)*) => {};
}
pub(crate) use trace_log;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wire_type_round_trips_ids() {
    for wt in [WireType::Varint, WireType::Fixed64, WireType::LengthDelimited, WireType::Fixed32] {
      assert_eq!(WireType::from_id(wt as u8), Some(wt));
    }
  }

  #[test]
  fn group_wire_type_ids_are_rejected() {
    assert_eq!(WireType::from_id(3), None);
    assert_eq!(WireType::from_id(4), None);
  }

  #[test]
  fn end_to_end_format_schema_round_trip() {
    use crate::value::{Payload, Value};
    let schema = Schema::compile_format("*U+T#q").unwrap();
    let payload = Payload::positional(alloc::vec![
      Value::Str("hello".into()),
      Value::Repeated(alloc::vec![Value::UInt(1), Value::UInt(2)]),
      Value::Repeated(alloc::vec![Value::Int(-1), Value::Int(2)]),
    ]);
    let bytes = encode(&schema, &payload).unwrap();
    let decoded = decode(&schema, &bytes).unwrap();
    assert_eq!(decoded, payload);
  }

  #[test]
  fn end_to_end_kv_schema_round_trip() {
    use crate::schema::kv::KvEntry;
    use crate::value::{Payload, Value};
    use alloc::string::ToString;

    let schema = Schema::compile_kv(&[
      KvEntry::ScalarPrefixed { name: "name".to_string(), type_code: 'U', prefix: "*".to_string() },
      KvEntry::ScalarPrefixed { name: "tags".to_string(), type_code: 'T', prefix: "#".to_string() },
    ])
    .unwrap();
    let payload = Payload::named([
      ("name".to_string(), Value::Str("widget".to_string())),
      ("tags".to_string(), Value::Repeated(alloc::vec![Value::UInt(7), Value::UInt(8)])),
    ]);
    let bytes = encode(&schema, &payload).unwrap();
    assert_eq!(decode(&schema, &bytes).unwrap(), payload);
  }
}
