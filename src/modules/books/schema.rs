//! Payload validation for book writes.
//!
//! Checks run against the raw JSON body before anything is deserialized, so
//! that every problem is reported at once and a numeric string is never
//! coerced into an integer. Violations come back in field order, and within a
//! field in rule order (required, type, format).

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::models::{Book, BookChanges};

/// Which write the payload is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every field including `isbn` must be present.
    Create,
    /// `isbn` comes from the path; the body may omit it.
    Update,
}

#[derive(Debug, Clone, Copy)]
enum FieldType {
    String,
    Integer,
}

impl FieldType {
    fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => whole_number(value).is_some(),
        }
    }
}

/// An integer, or a float with no fractional part that fits in `i64`
/// (`264.0`, `2.017e3`).
fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
            .map(|f| f as i64)
    })
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Uri,
}

impl Format {
    fn name(self) -> &'static str {
        match self {
            Format::Uri => "uri",
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            Format::Uri => url::Url::parse(value).is_ok(),
        }
    }
}

struct FieldRule {
    name: &'static str,
    ty: FieldType,
    format: Option<Format>,
    key: bool,
}

#[rustfmt::skip]
const BOOK_FIELDS: &[FieldRule] = &[
    FieldRule { name: "isbn", ty: FieldType::String, format: None, key: true },
    FieldRule { name: "amazon_url", ty: FieldType::String, format: Some(Format::Uri), key: false },
    FieldRule { name: "author", ty: FieldType::String, format: None, key: false },
    FieldRule { name: "language", ty: FieldType::String, format: None, key: false },
    FieldRule { name: "pages", ty: FieldType::Integer, format: None, key: false },
    FieldRule { name: "publisher", ty: FieldType::String, format: None, key: false },
    FieldRule { name: "title", ty: FieldType::String, format: None, key: false },
    FieldRule { name: "year", ty: FieldType::Integer, format: None, key: false },
];

/// Ordered list of violation messages; never empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .0.join("; "))]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

/// Check a candidate book payload, collecting every violation.
pub fn validate(payload: &Value, mode: Mode) -> Result<(), Violations> {
    let Some(object) = payload.as_object() else {
        return Err(Violations(vec![
            "instance is not of a type(s) object".to_string(),
        ]));
    };

    let errors: Vec<String> = BOOK_FIELDS
        .iter()
        .flat_map(|rule| check_field(object, rule, mode))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Violations(errors))
    }
}

/// Validate a create payload and produce the book to insert.
pub fn validate_new_book(payload: &Value) -> Result<Book, Violations> {
    validate(payload, Mode::Create)?;
    into_typed(payload)
}

/// Validate an update payload and produce the replacement fields.
pub fn validate_book_changes(payload: &Value) -> Result<BookChanges, Violations> {
    validate(payload, Mode::Update)?;
    into_typed(payload)
}

fn check_field(object: &Map<String, Value>, rule: &FieldRule, mode: Mode) -> Vec<String> {
    let Some(value) = object.get(rule.name) else {
        if rule.key && mode == Mode::Update {
            return Vec::new();
        }
        return vec![format!("instance requires property \"{}\"", rule.name)];
    };

    if !rule.ty.accepts(value) {
        return vec![format!(
            "instance.{} is not of a type(s) {}",
            rule.name,
            rule.ty.name()
        )];
    }

    match (rule.format, value.as_str()) {
        (Some(format), Some(text)) if !format.accepts(text) => vec![format!(
            "instance.{} does not conform to the \"{}\" format",
            rule.name,
            format.name()
        )],
        _ => Vec::new(),
    }
}

fn into_typed<T: DeserializeOwned>(payload: &Value) -> Result<T, Violations> {
    let mut payload = payload.clone();
    if let Some(object) = payload.as_object_mut() {
        // serde will not read `264.0` into an i64
        for rule in BOOK_FIELDS {
            if let FieldType::Integer = rule.ty {
                if let Some(n) = object.get(rule.name).and_then(whole_number) {
                    object.insert(rule.name.to_string(), Value::from(n));
                }
            }
        }
    }
    serde_json::from_value(payload).map_err(|e| Violations(vec![e.to_string()]))
}
