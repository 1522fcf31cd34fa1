//! Compact type-code format string parser (C5, §4.5).
//!
//! A format string is a sequence of field specs. Each spec is an optional
//! run of cardinality prefixes (`*` required, `+` repeated, `#` packed
//! repeated), followed by either a one-letter semantic-type code or a
//! bracketed nested group `[...]`, optionally followed by a decimal suffix.
//!
//! The suffix means two different things depending on what it follows,
//! resolved against the canonical examples rather than the looser prose
//! that introduces it:
//!
//! - After a plain or `*`-required scalar, it expands to that many literal
//!   fields, each consuming its own tag (`U3` is three separate text
//!   fields, tags 1..3).
//! - After a `+`- or `#`-prefixed scalar, the field is already variable-
//!   length on the wire, so the suffix collapses to a single field; the
//!   number is kept only as [`Field::prefix_count`] informational metadata
//!   (`#T3` is one packed field, not three).
//! - After a nested group `[...]`, the suffix always expands to that many
//!   literal nested fields regardless of any cardinality prefix, since a
//!   nested group's own internal repetition is controlled by its own
//!   fields, not by the enclosing suffix.
//!
//! Tags are never written explicitly; each field spec claims the next
//! sequential tag starting at 1, and nested groups restart that count at 1
//! inside their own scope.

use super::{Field, Prefixes, Schema, SemanticType};
use crate::error::BadFormatString;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

pub fn compile(source: &str) -> Result<Schema, BadFormatString> {
  let chars: Vec<char> = source.chars().collect();
  let mut pos = 0;
  let mut fields = Vec::new();
  let mut next_tag: u32 = 1;
  parse_fields(&chars, &mut pos, &mut fields, &mut next_tag, false)?;
  Schema::from_fields(fields, false)
}

fn parse_fields(
  chars: &[char],
  pos: &mut usize,
  fields: &mut Vec<Field>,
  next_tag: &mut u32,
  nested: bool,
) -> Result<(), BadFormatString> {
  while *pos < chars.len() {
    if chars[*pos] == ']' {
      if nested {
        return Ok(());
      }
      return Err(BadFormatString::UnmatchedBracket);
    }
    parse_one_field(chars, pos, fields, next_tag)?;
  }
  if nested {
    return Err(BadFormatString::UnterminatedBracket);
  }
  Ok(())
}

fn parse_one_field(
  chars: &[char],
  pos: &mut usize,
  fields: &mut Vec<Field>,
  next_tag: &mut u32,
) -> Result<(), BadFormatString> {
  let mut prefixes = Prefixes::default();
  while *pos < chars.len() && matches!(chars[*pos], '*' | '+' | '#') {
    prefixes.apply(chars[*pos])?;
    *pos += 1;
  }
  prefixes.validate()?;

  if *pos < chars.len() && chars[*pos] == '[' {
    *pos += 1;
    let mut inner = Vec::new();
    let mut inner_tag = 1u32;
    parse_fields(chars, pos, &mut inner, &mut inner_tag, true)?;
    if inner.is_empty() {
      return Err(BadFormatString::EmptyNestedGroup);
    }
    // `parse_fields` only returns early on `]` in nested mode, so this is
    // always present; checked anyway since `pos` is the only evidence.
    if *pos >= chars.len() || chars[*pos] != ']' {
      return Err(BadFormatString::UnterminatedBracket);
    }
    *pos += 1;
    let count = parse_suffix(chars, pos)?.unwrap_or(1);
    let nested_schema = Schema::from_fields(inner, false)?;
    for _ in 0..count {
      fields.push(Field {
        tag: *next_tag,
        name: None,
        semantic_type: SemanticType::Nested,
        required: prefixes.required,
        repeated: prefixes.repeated,
        packed: false,
        nested: Some(Box::new(nested_schema.clone())),
        prefix_count: 1,
      });
      *next_tag += 1;
    }
    return Ok(());
  }

  let c = *chars.get(*pos).ok_or(BadFormatString::BadSuffix)?;
  let semantic_type = SemanticType::from_code(c).ok_or(BadFormatString::UnknownTypeCode(c))?;
  *pos += 1;

  if prefixes.packed && !semantic_type.packable() {
    return Err(BadFormatString::UnknownTypeCode(c));
  }

  let suffix = parse_suffix(chars, pos)?;

  if prefixes.repeated {
    fields.push(Field {
      tag: *next_tag,
      name: None,
      semantic_type,
      required: false,
      repeated: true,
      packed: prefixes.packed,
      nested: None,
      prefix_count: suffix.unwrap_or(1),
    });
    *next_tag += 1;
  } else {
    for _ in 0..suffix.unwrap_or(1) {
      fields.push(Field {
        tag: *next_tag,
        name: None,
        semantic_type,
        required: prefixes.required,
        repeated: false,
        packed: false,
        nested: None,
        prefix_count: 1,
      });
      *next_tag += 1;
    }
  }

  Ok(())
}

fn parse_suffix(chars: &[char], pos: &mut usize) -> Result<Option<u32>, BadFormatString> {
  let start = *pos;
  while *pos < chars.len() && chars[*pos].is_ascii_digit() {
    *pos += 1;
  }
  if *pos == start {
    return Ok(None);
  }
  let digits: String = chars[start..*pos].iter().collect();
  let value: u32 = digits.parse().map_err(|_| BadFormatString::BadSuffix)?;
  if value == 0 {
    return Err(BadFormatString::BadSuffix);
  }
  Ok(Some(value))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_optional_text_field() {
    let schema = compile("U").unwrap();
    assert_eq!(schema.fields().len(), 1);
    let f = &schema.fields()[0];
    assert_eq!(f.tag, 1);
    assert_eq!(f.semantic_type, SemanticType::Text);
    assert!(!f.required && !f.repeated && !f.packed);
  }

  #[test]
  fn required_prefix() {
    let schema = compile("*U").unwrap();
    assert!(schema.fields()[0].required);
  }

  #[test]
  fn repeated_unpacked() {
    let schema = compile("+T").unwrap();
    let f = &schema.fields()[0];
    assert!(f.repeated && !f.packed);
    assert_eq!(f.prefix_count, 1);
  }

  #[test]
  fn packed_with_suffix_is_one_field() {
    let schema = compile("#T3").unwrap();
    assert_eq!(schema.fields().len(), 1);
    let f = &schema.fields()[0];
    assert!(f.repeated && f.packed);
    assert_eq!(f.prefix_count, 3);
    assert_eq!(f.tag, 1);
  }

  #[test]
  fn plain_suffix_expands_to_separate_fields() {
    let schema = compile("U3").unwrap();
    assert_eq!(schema.fields().len(), 3);
    for (i, f) in schema.fields().iter().enumerate() {
      assert_eq!(f.tag, i as u32 + 1);
      assert!(!f.repeated);
    }
  }

  #[test]
  fn nested_group_suffix_always_expands() {
    let schema = compile("[Uz]2").unwrap();
    assert_eq!(schema.fields().len(), 2);
    for (i, f) in schema.fields().iter().enumerate() {
      assert_eq!(f.tag, i as u32 + 1);
      assert_eq!(f.semantic_type, SemanticType::Nested);
      let nested = f.nested.as_ref().unwrap();
      assert_eq!(nested.fields().len(), 2);
      assert_eq!(nested.fields()[0].tag, 1);
      assert_eq!(nested.fields()[1].tag, 2);
    }
  }

  #[test]
  fn mixed_sequence_tags_increment_across_fields() {
    let schema = compile("U*q+T").unwrap();
    let tags: Vec<u32> = schema.fields().iter().map(|f| f.tag).collect();
    assert_eq!(tags, alloc::vec![1, 2, 3]);
  }

  #[test]
  fn unknown_type_code() {
    assert_eq!(compile("Y").unwrap_err(), BadFormatString::UnknownTypeCode('Y'));
  }

  #[test]
  fn unmatched_close_bracket() {
    assert_eq!(compile("U]").unwrap_err(), BadFormatString::UnmatchedBracket);
  }

  #[test]
  fn unterminated_open_bracket() {
    assert_eq!(compile("[U").unwrap_err(), BadFormatString::UnterminatedBracket);
  }

  #[test]
  fn empty_nested_group() {
    assert_eq!(compile("[]").unwrap_err(), BadFormatString::EmptyNestedGroup);
  }

  #[test]
  fn duplicate_prefix() {
    assert_eq!(compile("++U").unwrap_err(), BadFormatString::DuplicatePrefix('+'));
  }

  #[test]
  fn required_and_repeated_conflict() {
    assert_eq!(compile("*+U").unwrap_err(), BadFormatString::RequiredAndRepeated);
  }

  #[test]
  fn empty_format_string() {
    assert_eq!(compile("").unwrap_err(), BadFormatString::EmptySchema);
  }

  #[test]
  fn packed_length_delimited_type_is_rejected() {
    // A packed run of `Text`/`Bytes` would be wire-identical to one long
    // unpacked value, so packing them is refused at compile time rather
    // than producing a schema that can't round-trip.
    assert!(compile("#U").is_err());
    assert!(compile("#a").is_err());
  }
}
