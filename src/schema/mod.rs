//! Schema IR (C4): the compiled, immutable description of a message's
//! fields that both the format-string parser ([`format`]) and the
//! key/value compiler ([`kv`]) produce, and that the encoder/decoder walk.

pub mod format;
pub mod kv;

use crate::error::BadFormatString;
use crate::WireType;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

/// Default two's-complement varint width, matching the Protobuf `int32`/
/// `int64` convention (negative values always occupy the full 64-bit form).
pub const DEFAULT_TC_WIDTH: u32 = 64;

/// The closed set of semantic types from §3.2. Each has a single canonical
/// [`WireType`], except [`SemanticType::Nested`] which inherits
/// [`WireType::LengthDelimited`] like every other nested message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
  /// `i` / `l` — signed fixed32.
  SFixed32,
  /// `I` / `L` — unsigned fixed32.
  UFixed32,
  /// `q` — signed fixed64.
  SFixed64,
  /// `Q` — unsigned fixed64.
  UFixed64,
  /// `f` — IEEE-754 float32.
  Float32,
  /// `d` — IEEE-754 float64.
  Float64,
  /// `a` — raw bytes.
  Bytes,
  /// `U` — UTF-8 text.
  Text,
  /// `b` — boolean.
  Bool,
  /// `t` — two's-complement varint, bounded by the schema's `tc_width`.
  TwosComplement,
  /// `T` / `V` — unsigned varint.
  UnsignedVarint,
  /// `z` / `v` — ZigZag varint.
  ZigZagVarint,
  /// `x` — placeholder; consumes a tag and a payload slot, carries no value.
  Placeholder,
  /// `[...]` — nested message.
  Nested,
}

impl SemanticType {
  /// Parses one of the one-letter codes from §3.2. Brackets are handled by
  /// the caller, not here, since they aren't a single character.
  pub fn from_code(c: char) -> Option<Self> {
    Some(match c {
      'i' | 'l' => Self::SFixed32,
      'I' | 'L' => Self::UFixed32,
      'q' => Self::SFixed64,
      'Q' => Self::UFixed64,
      'f' => Self::Float32,
      'd' => Self::Float64,
      'a' => Self::Bytes,
      'U' => Self::Text,
      'b' => Self::Bool,
      't' => Self::TwosComplement,
      'T' | 'V' => Self::UnsignedVarint,
      'z' | 'v' => Self::ZigZagVarint,
      'x' => Self::Placeholder,
      _ => return None,
    })
  }

  /// The wire type this semantic type is always encoded/decoded as.
  pub fn wire_type(self) -> WireType {
    match self {
      Self::SFixed32 | Self::UFixed32 | Self::Float32 => WireType::Fixed32,
      Self::SFixed64 | Self::UFixed64 | Self::Float64 => WireType::Fixed64,
      Self::Bytes | Self::Text | Self::Nested => WireType::LengthDelimited,
      Self::Bool | Self::TwosComplement | Self::UnsignedVarint | Self::ZigZagVarint => {
        WireType::Varint
      }
      // `x` never hits the wire, but give it a type so callers that look it
      // up before checking `Placeholder` don't need to special-case `None`.
      Self::Placeholder => WireType::Varint,
    }
  }

  /// `true` for the scalar varint/fixed/bool types that packing is allowed
  /// for per the §3.3 invariant.
  ///
  /// Length-delimited types (`Bytes`, `Text`) are deliberately excluded even
  /// though their own wire type is already `LENGTH_DELIMITED`: a packed run
  /// of them would be wire-identical to a single unpacked value of the same
  /// type (both are "a `LENGTH_DELIMITED` record under this tag"), so a
  /// decoder has no way to tell a packed run from one long value without
  /// out-of-band knowledge. Canonical Protobuf draws the same line — only
  /// the primitive numeric/bool wire types may be packed.
  pub fn packable(self) -> bool {
    matches!(
      self,
      Self::SFixed32
        | Self::UFixed32
        | Self::SFixed64
        | Self::UFixed64
        | Self::Float32
        | Self::Float64
        | Self::Bool
        | Self::TwosComplement
        | Self::UnsignedVarint
        | Self::ZigZagVarint
    )
  }
}

/// One compiled field. See §3.3 for the invariants these are expected to
/// uphold; [`format::compile`] and [`kv::compile`] are the only places that
/// construct these, and both enforce the invariants as they go.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
  pub tag: u32,
  /// Present only for key/value schemas.
  pub name: Option<String>,
  pub semantic_type: SemanticType,
  pub required: bool,
  pub repeated: bool,
  pub packed: bool,
  /// Set only when `semantic_type == Nested`.
  pub nested: Option<Box<Schema>>,
  /// How many sequential same-typed fields this one was declared alongside
  /// via a format-string numeric suffix (§3.3). Informational; encode and
  /// decode don't read it. Defaults to 1.
  pub prefix_count: u32,
}

impl Field {
  pub fn wire_type(&self) -> WireType { self.semantic_type.wire_type() }

  pub fn field_id(&self) -> crate::error::FieldId {
    match &self.name {
      Some(name) => crate::error::FieldId::Name(name.clone()),
      None => crate::error::FieldId::Tag(self.tag),
    }
  }
}

/// A compiled schema: an ordered list of fields, plus the two knobs that
/// apply across the whole message (§3.3, §5).
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
  pub(crate) fields: Vec<Field>,
  /// `true` if this schema was compiled from a key/value description
  /// (fields are named); `false` for a format string (fields are
  /// positional only).
  pub(crate) kvfmt: bool,
  /// Bit width `W` for [`SemanticType::TwosComplement`] fields (§4.1).
  /// Part of the schema per the Design Notes, not process-global state.
  tc_width: u32,
  /// Decoder behavior for missing optional named fields: omit the key
  /// (`true`) or insert [`crate::Value::None`] (`false`). See §4.8 step 4.
  allow_sparse_dict: bool,
}

impl Schema {
  pub(crate) fn from_fields(fields: Vec<Field>, kvfmt: bool) -> Result<Self, BadFormatString> {
    if fields.is_empty() {
      return Err(BadFormatString::EmptySchema);
    }
    Ok(Schema { fields, kvfmt, tc_width: DEFAULT_TC_WIDTH, allow_sparse_dict: true })
  }

  /// Compiles a compact type-code string (§4.5, §6.2).
  pub fn compile_format(source: &str) -> Result<Self, BadFormatString> { format::compile(source) }

  /// Compiles a key/value field description (§4.6, §6.3).
  pub fn compile_kv(entries: &[kv::KvEntry]) -> Result<Self, BadFormatString> {
    kv::compile(entries)
  }

  pub fn fields(&self) -> &[Field] { &self.fields }

  pub fn is_kv(&self) -> bool { self.kvfmt }

  pub fn tc_width(&self) -> u32 { self.tc_width }

  /// Sets the two's-complement varint bit width (`W` in §4.1). Must be a
  /// positive multiple of 8; panics otherwise, since this is a programmer
  /// error rather than something that can arise from untrusted input.
  ///
  /// Per §5, this is caller-sequenced: mutating it while an encode/decode
  /// call is in flight on another handle to the same `Schema` is a logic
  /// error, not a memory-safety one (there's no interior mutability here).
  pub fn with_varint_width(mut self, width: u32) -> Self {
    assert!(width > 0 && width % 8 == 0, "varint width must be a positive multiple of 8");
    self.tc_width = width;
    self
  }

  pub fn set_varint_width(&mut self, width: u32) {
    assert!(width > 0 && width % 8 == 0, "varint width must be a positive multiple of 8");
    self.tc_width = width;
  }

  pub fn allow_sparse_dict(&self) -> bool { self.allow_sparse_dict }

  pub fn set_allow_sparse_dict(&mut self, allow: bool) { self.allow_sparse_dict = allow; }

  pub(crate) fn field_by_tag(&self, tag: u32) -> Option<&Field> {
    self.fields.iter().find(|f| f.tag == tag)
  }

  pub(crate) fn field_index_by_tag(&self, tag: u32) -> Option<usize> {
    self.fields.iter().position(|f| f.tag == tag)
  }
}

/// Cardinality/requiredness flags collected from `*`, `+`, `#` prefixes,
/// shared between the format-string parser and the key/value compiler so
/// the duplicate/conflict checks only live in one place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Prefixes {
  pub required: bool,
  pub repeated: bool,
  pub packed: bool,
}

impl Prefixes {
  pub fn apply(&mut self, c: char) -> Result<(), BadFormatString> {
    match c {
      '*' => {
        if self.required {
          return Err(BadFormatString::DuplicatePrefix('*'));
        }
        self.required = true;
      }
      '+' => {
        if self.repeated {
          return Err(BadFormatString::DuplicatePrefix('+'));
        }
        self.repeated = true;
      }
      '#' => {
        if self.packed {
          return Err(BadFormatString::DuplicatePrefix('#'));
        }
        self.packed = true;
        self.repeated = true;
      }
      _ => unreachable!("caller must only pass '*', '+', or '#'"),
    }
    Ok(())
  }

  pub fn validate(self) -> Result<(), BadFormatString> {
    if self.required && self.repeated {
      return Err(BadFormatString::RequiredAndRepeated);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn semantic_type_wire_types_match_table() {
    assert_eq!(SemanticType::SFixed32.wire_type(), WireType::Fixed32);
    assert_eq!(SemanticType::UFixed64.wire_type(), WireType::Fixed64);
    assert_eq!(SemanticType::Text.wire_type(), WireType::LengthDelimited);
    assert_eq!(SemanticType::Bytes.wire_type(), WireType::LengthDelimited);
    assert_eq!(SemanticType::Bool.wire_type(), WireType::Varint);
    assert_eq!(SemanticType::ZigZagVarint.wire_type(), WireType::Varint);
    assert_eq!(SemanticType::Nested.wire_type(), WireType::LengthDelimited);
  }

  #[test]
  fn prefixes_reject_duplicates() {
    let mut p = Prefixes::default();
    p.apply('+').unwrap();
    assert_eq!(p.apply('+').unwrap_err(), BadFormatString::DuplicatePrefix('+'));
  }

  #[test]
  fn prefixes_reject_required_and_repeated() {
    let mut p = Prefixes::default();
    p.apply('*').unwrap();
    p.apply('+').unwrap();
    assert_eq!(p.validate().unwrap_err(), BadFormatString::RequiredAndRepeated);
  }

  #[test]
  fn packed_implies_repeated() {
    let mut p = Prefixes::default();
    p.apply('#').unwrap();
    assert!(p.repeated);
    assert!(p.packed);
  }
}
