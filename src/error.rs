use alloc::string::String;
use core::fmt;

#[cfg(feature = "std")]
use std::error::Error as StdError;

/// An error produced while compiling a schema (either a format string or a
/// key/value description) into [`Schema`](crate::schema::Schema) IR.
///
/// Compilation is total: every error case is one of the variants here, there
/// is no panic path through the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BadFormatString {
  /// A type code was not one of the letters in the semantic-type table.
  UnknownTypeCode(char),
  /// `*`, `+`, or `#` appeared twice in a row for the same field (e.g. `++U`).
  DuplicatePrefix(char),
  /// `[` was never matched by a `]`.
  UnterminatedBracket,
  /// A `]` appeared with no matching `[`.
  UnmatchedBracket,
  /// A `[...]` nested group had no fields inside it.
  EmptyNestedGroup,
  /// A numeric suffix (`\d+`) was present but had no digits, or overflowed.
  BadSuffix,
  /// A field was marked both `required` (`*`) and `repeated` (`+` or `#`).
  RequiredAndRepeated,
  /// A key/value entry wasn't one of the three documented tuple shapes.
  BadKeyValueEntry,
  /// Two fields in the same key/value schema used the same name.
  DuplicateName(String),
  /// The format string or key/value sequence had no fields at all.
  EmptySchema,
}

impl fmt::Display for BadFormatString {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::UnknownTypeCode(c) => write!(f, "unknown type code '{c}'"),
      Self::DuplicatePrefix(c) => write!(f, "duplicate prefix '{c}'"),
      Self::UnterminatedBracket => write!(f, "unterminated '[' in format string"),
      Self::UnmatchedBracket => write!(f, "unmatched ']' in format string"),
      Self::EmptyNestedGroup => write!(f, "nested message group '[]' has no fields"),
      Self::BadSuffix => write!(f, "numeric suffix is missing or invalid"),
      Self::RequiredAndRepeated => write!(f, "a field cannot be both required and repeated"),
      Self::BadKeyValueEntry => write!(f, "key/value schema entry is not name/type, name/schema, or name/prefix/schema"),
      Self::DuplicateName(name) => write!(f, "duplicate field name '{name}'"),
      Self::EmptySchema => write!(f, "schema has no fields"),
    }
  }
}

#[cfg(feature = "std")]
impl StdError for BadFormatString {}

/// An error produced while decoding a schema-less record stream. See
/// [`decode_raw`](crate::decode_raw).
///
/// `partial` is `true` if the cursor had already consumed bytes past the
/// last complete record boundary when the failure happened; this tells the
/// caller whether any of the already-yielded records should be considered
/// suspect (they should not be, only the in-flight one is).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfMessage {
  pub partial: bool,
}

impl fmt::Display for EndOfMessage {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    if self.partial {
      write!(f, "end of message reached mid-record")
    } else {
      write!(f, "end of message reached at a record boundary")
    }
  }
}

#[cfg(feature = "std")]
impl StdError for EndOfMessage {}

/// Runtime failures from the wire codec and the schema-driven encoder/decoder.
///
/// This is the umbrella referenced in the design: every sub-case is
/// distinguishable by matching on the variant, never by inspecting a message
/// string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
  /// The wire type on an incoming record didn't match what the schema
  /// expects for that tag, and it wasn't the packed/unpacked exception.
  WireTypeMismatch { tag: u32, expected: crate::WireType, found: crate::WireType },
  /// A tag appeared in the byte stream that the schema doesn't declare.
  UnknownField(u32),
  /// A `required` field was absent after decoding, or absent at encode time.
  RequiredFieldMissing(FieldId),
  /// A length-delimited `U` field's bytes were not valid UTF-8.
  BadString,
  /// A value didn't fit in the semantic type's range (e.g. an unsigned
  /// varint field given a value that overflows the target width).
  ValueOutOfRange,
  /// A varint used more than 10 bytes without terminating.
  VarintOverflow,
  /// A group wire type (3 or 4) was encountered; groups are unsupported.
  UnsupportedGroup,
  /// A field number was 0 or exceeded 2^29 - 1.
  FieldNumberOutOfRange(u32),
  /// The byte stream ended before a complete record or value was read.
  Truncated(EndOfMessage),
  /// A positional payload's length didn't match the schema's field count.
  PayloadLengthMismatch { expected: usize, found: usize },
}

/// Identifies a field in an error, either by its declared name (key/value
/// schemas) or its tag number (format-string schemas, or unnamed fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldId {
  Name(String),
  Tag(u32),
}

impl fmt::Display for FieldId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Name(name) => write!(f, "\"{name}\""),
      Self::Tag(tag) => write!(f, "tag {tag}"),
    }
  }
}

impl fmt::Display for CodecError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::WireTypeMismatch { tag, expected, found } => {
        write!(f, "field {tag}: expected wire type {expected:?}, found {found:?}")
      }
      Self::UnknownField(tag) => write!(f, "unknown field with tag {tag}"),
      Self::RequiredFieldMissing(id) => write!(f, "required field {id} is missing"),
      Self::BadString => write!(f, "length-delimited field is not valid UTF-8"),
      Self::ValueOutOfRange => write!(f, "value does not fit in the field's declared type"),
      Self::VarintOverflow => write!(f, "varint used more than 10 bytes"),
      Self::UnsupportedGroup => write!(f, "group wire types (3, 4) are not supported"),
      Self::FieldNumberOutOfRange(n) => write!(f, "field number {n} is out of the valid 1..2^29-1 range"),
      Self::Truncated(e) => write!(f, "{e}"),
      Self::PayloadLengthMismatch { expected, found } => {
        write!(f, "positional payload has {found} values, schema expects {expected}")
      }
    }
  }
}

#[cfg(feature = "std")]
impl StdError for CodecError {}

impl From<EndOfMessage> for CodecError {
  fn from(e: EndOfMessage) -> Self { CodecError::Truncated(e) }
}

/// Top-level error returned by [`crate::decode`] and [`crate::encode`].
///
/// Schema compilation errors ([`BadFormatString`]) are kept separate because
/// they happen once, at `Schema` construction time, while [`CodecError`] and
/// [`EndOfMessage`] can happen on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
  Schema(BadFormatString),
  Codec(CodecError),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Schema(e) => write!(f, "{e}"),
      Self::Codec(e) => write!(f, "{e}"),
    }
  }
}

#[cfg(feature = "std")]
impl StdError for Error {}

impl From<BadFormatString> for Error {
  fn from(e: BadFormatString) -> Self { Error::Schema(e) }
}
impl From<CodecError> for Error {
  fn from(e: CodecError) -> Self { Error::Codec(e) }
}
impl From<EndOfMessage> for Error {
  fn from(e: EndOfMessage) -> Self { Error::Codec(CodecError::Truncated(e)) }
}
