//! Field rules for create and update payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::models::BookInput;

pub const TITLE_MAX_CHARS: usize = 200;
pub const AUTHOR_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Field name to message, one entry per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

fn check_required(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: &str,
    max_chars: usize,
) {
    if value.trim().is_empty() {
        errors.add(field, format!("{} is required", label));
    } else if value.chars().count() > max_chars {
        errors.add(
            field,
            format!("{} cannot exceed {} characters", label, max_chars),
        );
    }
}

/// Check every field and report all failures together.
pub fn validate(input: &BookInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    check_required(&mut errors, "title", "Title", &input.title, TITLE_MAX_CHARS);
    check_required(
        &mut errors,
        "author",
        "Author",
        &input.author,
        AUTHOR_MAX_CHARS,
    );

    if let Some(description) = &input.description {
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.add(
                "description",
                format!("Description cannot exceed {} characters", DESCRIPTION_MAX_CHARS),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
