//! Key/value schema compiler (C6, §4.6): the alternative to a format string
//! where every field carries an explicit name, for the `Payload::Named`
//! surface.
//!
//! Three entry shapes are allowed, corresponding to the three things a
//! caller needs to say about a field: its name, its type, and (optionally)
//! its cardinality. Tags are never given explicitly here either — they're
//! assigned sequentially in declaration order, exactly as in a format
//! string, so the two grammars stay interchangeable for a given field
//! layout.

use super::{Field, Prefixes, Schema, SemanticType};
use crate::error::BadFormatString;
use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

/// One field description in a key/value schema.
#[derive(Debug, Clone, PartialEq)]
pub enum KvEntry {
  /// `(name, type_code)` — a plain optional scalar, no cardinality prefix.
  Scalar { name: String, type_code: char },
  /// `(name, type_code, prefix)` — a scalar with an explicit cardinality
  /// prefix string made of `*`, `+`, `#` (e.g. `"+"`, `"#"`, `""`).
  ScalarPrefixed { name: String, type_code: char, prefix: String },
  /// `(name, prefix, nested)` — a nested message field. Nested fields have
  /// no bare type code to hang off of, so the prefix is always present
  /// (pass `""` for a plain optional nested field).
  Nested { name: String, prefix: String, nested: Schema },
}

pub fn compile(entries: &[KvEntry]) -> Result<Schema, BadFormatString> {
  let mut fields = Vec::new();
  let mut seen_names = BTreeSet::new();
  let mut next_tag: u32 = 1;

  for entry in entries {
    let (name, prefix, semantic_type, nested) = match entry {
      KvEntry::Scalar { name, type_code } => {
        let semantic_type =
          SemanticType::from_code(*type_code).ok_or(BadFormatString::UnknownTypeCode(*type_code))?;
        (name, "", semantic_type, None)
      }
      KvEntry::ScalarPrefixed { name, type_code, prefix } => {
        let semantic_type =
          SemanticType::from_code(*type_code).ok_or(BadFormatString::UnknownTypeCode(*type_code))?;
        (name, prefix.as_str(), semantic_type, None)
      }
      KvEntry::Nested { name, prefix, nested } => {
        (name, prefix.as_str(), SemanticType::Nested, Some(nested.clone()))
      }
    };

    if !seen_names.insert(name.clone()) {
      return Err(BadFormatString::DuplicateName(name.clone()));
    }

    let mut prefixes = Prefixes::default();
    for c in prefix.chars() {
      if !matches!(c, '*' | '+' | '#') {
        return Err(BadFormatString::BadKeyValueEntry);
      }
      prefixes.apply(c)?;
    }
    prefixes.validate()?;

    if prefixes.packed && !semantic_type.packable() {
      return Err(BadFormatString::BadKeyValueEntry);
    }

    fields.push(Field {
      tag: next_tag,
      name: Some(name.clone()),
      semantic_type,
      required: prefixes.required,
      repeated: prefixes.repeated,
      packed: prefixes.packed,
      nested: nested.map(Box::new),
      prefix_count: 1,
    });
    next_tag += 1;
  }

  Schema::from_fields(fields, true)
}

#[cfg(test)]
mod tests {
  use super::*;
  use alloc::string::ToString;

  fn scalar(name: &str, type_code: char) -> KvEntry {
    KvEntry::Scalar { name: name.to_string(), type_code }
  }

  fn prefixed(name: &str, type_code: char, prefix: &str) -> KvEntry {
    KvEntry::ScalarPrefixed { name: name.to_string(), type_code, prefix: prefix.to_string() }
  }

  #[test]
  fn plain_scalar_entry() {
    let schema = compile(&[scalar("text", 'U')]).unwrap();
    assert!(schema.is_kv());
    let f = &schema.fields()[0];
    assert_eq!(f.tag, 1);
    assert_eq!(f.name.as_deref(), Some("text"));
    assert_eq!(f.semantic_type, SemanticType::Text);
    assert!(!f.required && !f.repeated);
  }

  #[test]
  fn tags_assigned_sequentially() {
    let schema = compile(&[scalar("a", 'U'), scalar("b", 'q'), scalar("c", 'b')]).unwrap();
    let tags: Vec<u32> = schema.fields().iter().map(|f| f.tag).collect();
    assert_eq!(tags, alloc::vec![1, 2, 3]);
  }

  #[test]
  fn prefixed_scalar_entry() {
    let schema = compile(&[prefixed("ids", 'T', "#")]).unwrap();
    let f = &schema.fields()[0];
    assert!(f.repeated && f.packed);
  }

  #[test]
  fn nested_entry() {
    let inner = Schema::compile_format("Uz").unwrap();
    let schema =
      compile(&[KvEntry::Nested { name: "child".into(), prefix: "".into(), nested: inner }])
        .unwrap();
    let f = &schema.fields()[0];
    assert_eq!(f.semantic_type, SemanticType::Nested);
    assert!(f.nested.is_some());
  }

  #[test]
  fn duplicate_name_rejected() {
    let err = compile(&[scalar("x", 'U'), scalar("x", 'b')]).unwrap_err();
    assert_eq!(err, BadFormatString::DuplicateName("x".into()));
  }

  #[test]
  fn unrecognized_prefix_char_rejected() {
    let err = compile(&[prefixed("x", 'U', "?")]).unwrap_err();
    assert_eq!(err, BadFormatString::BadKeyValueEntry);
  }

  #[test]
  fn required_and_repeated_conflict() {
    let err = compile(&[prefixed("x", 'U', "*+")]).unwrap_err();
    assert_eq!(err, BadFormatString::RequiredAndRepeated);
  }

  #[test]
  fn empty_entry_list_is_empty_schema() {
    assert_eq!(compile(&[]).unwrap_err(), BadFormatString::EmptySchema);
  }
}
