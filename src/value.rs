//! The dynamic payload shape (Design Notes: "model as a small tagged union
//! at the call boundary"). [`Value`] is what schema-driven encode consumes
//! and schema-driven decode produces; [`Payload`] is the two surface shapes
//! a caller can hand in (§3.4): an ordered positional tuple, or a named map.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// A single field value (or the absence of one).
///
/// `None` is the "no value" sentinel from §3.4: it fills a positional slot
/// for a missing optional scalar, and is also what an `x` placeholder
/// carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  None,
  Bool(bool),
  /// Any signed integer scalar (`i`, `l`, `q`, `t`, `z`, `v`). The field's
  /// [`SemanticType`](crate::schema::SemanticType) determines the wire
  /// width; this variant always carries the full 64-bit domain.
  Int(i64),
  /// Any unsigned integer scalar (`I`, `L`, `Q`, `T`, `V`).
  UInt(u64),
  F32(f32),
  F64(f64),
  Bytes(Vec<u8>),
  Str(String),
  /// A nested message, encoded/decoded against the field's nested schema.
  Message(Box<Payload>),
  /// The materialized contents of a `repeated` field, in wire order.
  Repeated(Vec<Value>),
}

/// Either surface shape a caller can encode from or decode into (§3.4).
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
  /// Used with format-string schemas. Length must equal the schema's field
  /// count, `x` placeholders included.
  Positional(Vec<Value>),
  /// Used with key/value schemas. Absent optional keys are either elided or
  /// present as [`Value::None`], depending on
  /// [`Schema::allow_sparse_dict`](crate::schema::Schema::allow_sparse_dict).
  Named(BTreeMap<String, Value>),
}

impl Payload {
  pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
    Payload::Positional(values.into_iter().collect())
  }

  pub fn named(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
    Payload::Named(entries.into_iter().collect())
  }
}
