//! Declarative payload schemas and the routine that checks payloads against them.
//!
//! Checking happens in two stages. [`Schema::validate`] looks at the raw JSON and reports
//! missing, mistyped and immutable fields. [`Schema::parse`] runs that check and, once the
//! shape is right, deserializes the payload and applies the typed rules declared with
//! [`validator::Validate`] on the target type.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// A whole number that fits a 32-bit signed integer column.
    Integer,
}

impl FieldKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value
                .as_i64()
                .map(|number| i32::try_from(number).is_ok())
                .unwrap_or(false),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Integer => "an integer",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Immutable fields are set once on creation and must not appear in update payloads.
    pub mutable: bool,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Text,
            required: true,
            mutable: true,
        }
    }

    const fn integer(name: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Integer,
            required: true,
            mutable: true,
        }
    }

    const fn immutable(self) -> Self {
        FieldSpec {
            mutable: false,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    NotAnObject,
    Missing { field: &'static str },
    WrongType { field: &'static str, expected: FieldKind },
    Immutable { field: &'static str },
    Rule { field: String, message: String },
}

impl Violation {
    pub fn is_immutable(&self) -> bool {
        matches!(self, Violation::Immutable { .. })
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NotAnObject => f.write_str("Payload must be a JSON object"),
            Violation::Missing { field } => write!(f, "\"{field}\" is required"),
            Violation::WrongType { field, expected } => {
                write!(f, "\"{field}\" must be {}", expected.describe())
            }
            Violation::Immutable { field } => write!(f, "\"{field}\" cannot be changed"),
            Violation::Rule { field, message } => write!(f, "{field}: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    fields: &'static [FieldSpec],
}

/// Columns of the `books` table.
pub const BOOK_SCHEMA: Schema = Schema {
    fields: &[
        FieldSpec::text("isbn").immutable(),
        FieldSpec::text("amazon_url"),
        FieldSpec::text("author"),
        FieldSpec::text("language"),
        FieldSpec::integer("pages"),
        FieldSpec::text("publisher"),
        FieldSpec::text("title"),
        FieldSpec::integer("year"),
    ],
};

impl Schema {
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Checks the shape of `payload`, collecting every violation.
    ///
    /// In [`ValidationMode::Update`] immutable fields are reported as [`Violation::Immutable`]
    /// ahead of any other violation and are otherwise left unchecked.
    pub fn validate(&self, payload: &Value, mode: ValidationMode) -> Result<(), Vec<Violation>> {
        let Some(object) = payload.as_object() else {
            return Err(vec![Violation::NotAnObject]);
        };

        let mut violations = Vec::new();

        if mode == ValidationMode::Update {
            violations.extend(
                self.fields
                    .iter()
                    .filter(|field| !field.mutable && object.contains_key(field.name))
                    .map(|field| Violation::Immutable { field: field.name }),
            );
        }

        for field in self.fields {
            if mode == ValidationMode::Update && !field.mutable {
                continue;
            }

            match object.get(field.name) {
                None if field.required => violations.push(Violation::Missing { field: field.name }),
                None => {}
                Some(value) if !field.kind.matches(value) => violations.push(Violation::WrongType {
                    field: field.name,
                    expected: field.kind,
                }),
                Some(_) => {}
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Validates `payload` and turns it into `T`, applying `T`'s own rules.
    pub fn parse<T>(&self, payload: Value, mode: ValidationMode) -> Result<T, Vec<Violation>>
    where
        T: DeserializeOwned + Validate,
    {
        self.validate(&payload, mode)?;

        let parsed: T = serde_json::from_value(payload).map_err(|err| {
            vec![Violation::Rule {
                field: String::from("payload"),
                message: err.to_string(),
            }]
        })?;

        parsed.validate().map_err(rule_violations)?;

        Ok(parsed)
    }
}

fn rule_violations(errors: ValidationErrors) -> Vec<Violation> {
    let mut violations: Vec<Violation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| Violation::Rule {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string()),
            })
        })
        .collect();

    violations.sort_by(|a, b| a.to_string().cmp(&b.to_string()));

    violations
}
