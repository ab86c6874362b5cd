//! Presence and format rules for contact input.
//!
//! Every field is checked on every call, so a rejected submission reports all
//! of its problems at once.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::database::models::ContactFields;

/// Failing field name -> messages, in field-name order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

const MAX_EMAIL_LEN: usize = 254;

/// Day-first orders are tried before anything ambiguous; output uses DD/MM/YYYY.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%B %d %Y",
    "%B %d, %Y",
];

/// Validate a create/update payload. Unknown keys are ignored.
pub fn validate(input: &Map<String, Value>) -> Result<ContactFields, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = required_string(input, "name", &mut errors);
    let email = required_string(input, "email", &mut errors).and_then(|email| {
        if is_valid_email(&email) {
            Some(email)
        } else {
            errors.add("email", "The email must be a valid email address.");
            None
        }
    });
    let birthday = required_string(input, "birthday", &mut errors).and_then(|raw| {
        let parsed = parse_date(&raw);
        if parsed.is_none() {
            errors.add("birthday", "The birthday is not a valid date.");
        }
        parsed
    });
    let company = required_string(input, "company", &mut errors);

    match (name, email, birthday, company) {
        (Some(name), Some(email), Some(birthday), Some(company)) if errors.is_empty() => Ok(ContactFields {
            name,
            email,
            birthday,
            company,
        }),
        _ => Err(errors),
    }
}

/// Trimmed string value, or `None` after recording why it is unusable
fn required_string(input: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match input.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, format!("The {} field is required.", field));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.add(field, format!("The {} field is required.", field));
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            errors.add(field, format!("The {} must be a string.", field));
            None
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.contains('@') {
        return false;
    }

    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    const SPECIALS: &str = "!#$%&'*+-/=?^_`{|}~.";

    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c) || !c.is_ascii())
}

fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() <= 253
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || !c.is_ascii())
        })
}

/// Parse a birthday written in any of the accepted human formats
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&normalized, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(&normalized)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
