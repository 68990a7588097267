//! # Form Validation and Sanitization
//!
//! This module is the inbound edge of every create/update flow. It parses an
//! `application/x-www-form-urlencoded` body into a field map, normalizes
//! multi-valued fields, and applies per-field rule chains (trim, emptiness,
//! length bounds, character class, date coercion) that produce either cleaned
//! values or field-level error messages.
//!
//! The pipeline never touches the store. A validator returns the cleaned
//! values unconditionally so the orchestrator can re-render the form
//! pre-filled alongside the collected errors.
//!
//! ## Usage
//!
//! ```rust
//! use stacks::forms::{FormErrors, FormFields};
//!
//! let fields = FormFields::parse(b"name=%20Fantasy%20&tag=a&tag=b");
//! assert_eq!(fields.first("name"), Some(" Fantasy "));
//! assert_eq!(fields.all("tag"), vec!["a".to_string(), "b".to_string()]);
//!
//! let mut errors = FormErrors::new();
//! errors.required("name", fields.first("name").unwrap_or("").trim(), "Name required");
//! assert!(errors.is_empty());
//! ```

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::RecordId;
use crate::dates::parse_iso_date;

static ALPHANUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-z0-9]+$").expect("alphanumeric pattern compiles")
});

///////////////////////////////////////////// FormFields //////////////////////////////////////////////

/// The raw submission states of a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// The field was not submitted at all.
    Missing,
    /// The field was submitted exactly once.
    Single(String),
    /// The field was submitted more than once.
    Many(Vec<String>),
}

/// Normalizes the raw submission states of a multi-valued field to a list.
///
/// An absent field is an empty list, a field submitted once is a singleton,
/// and repeated submissions are kept unchanged in submission order.
pub fn to_list(raw: RawValue) -> Vec<String> {
    match raw {
        RawValue::Missing => Vec::new(),
        RawValue::Single(value) => vec![value],
        RawValue::Many(values) => values,
    }
}

/// An ordered view of the fields submitted on one form.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    /// Parses a form-encoded request body.
    pub fn parse(body: &[u8]) -> FormFields {
        let pairs = form_urlencoded::parse(body)
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        FormFields { pairs }
    }

    /// Returns the first submitted value for a field, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the raw submission state of a field.
    pub fn raw(&self, name: &str) -> RawValue {
        let mut values: Vec<String> = self
            .pairs
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
            .collect();
        match values.len() {
            0 => RawValue::Missing,
            1 => RawValue::Single(values.remove(0)),
            _ => RawValue::Many(values),
        }
    }

    /// Returns every submitted value for a field, normalized to a list.
    pub fn all(&self, name: &str) -> Vec<String> {
        to_list(self.raw(name))
    }
}

////////////////////////////////////////////// Sanitizers /////////////////////////////////////////////

/// Escapes HTML-significant characters in submitted text.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Trims and escapes one submitted value.
pub fn clean(text: &str) -> String {
    escape(text.trim())
}

//////////////////////////////////////////// Field Errors /////////////////////////////////////////////

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The form field the message applies to.
    pub field: String,
    /// The message displayed next to the field.
    pub msg: String,
}

/// Accumulates field-level errors while a rule table runs.
///
/// Rule helpers that gate later rules on the same field return whether the
/// value passed, so a field collects one message for the first rule it
/// breaks rather than a cascade.
#[derive(Debug, Default)]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure against a field.
    pub fn push(&mut self, field: &str, msg: &str) {
        self.errors.push(FieldError {
            field: field.to_string(),
            msg: msg.to_string(),
        });
    }

    /// True when no rule has failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the accumulator, yielding the collected errors.
    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }

    /// Requires a non-empty value. Returns whether the value was present.
    pub fn required(&mut self, field: &str, value: &str, msg: &str) -> bool {
        if value.is_empty() {
            self.push(field, msg);
            false
        } else {
            true
        }
    }

    /// Rejects values shorter than `min` characters.
    pub fn min_length(&mut self, field: &str, value: &str, min: usize, msg: &str) -> bool {
        if value.chars().count() < min {
            self.push(field, msg);
            false
        } else {
            true
        }
    }

    /// Rejects values longer than `max` characters.
    pub fn max_length(&mut self, field: &str, value: &str, max: usize, msg: &str) -> bool {
        if value.chars().count() > max {
            self.push(field, msg);
            false
        } else {
            true
        }
    }

    /// Rejects values containing anything outside `[A-Za-z0-9]`.
    pub fn alphanumeric(&mut self, field: &str, value: &str, msg: &str) -> bool {
        if ALPHANUMERIC.is_match(value) {
            true
        } else {
            self.push(field, msg);
            false
        }
    }

    /// Validates an optional date field with falsy-skips semantics.
    ///
    /// An empty value passes and yields `None`; a non-empty value must parse
    /// as an ISO-8601 date.
    pub fn optional_date(&mut self, field: &str, value: &str, msg: &str) -> Option<NaiveDate> {
        if value.is_empty() {
            return None;
        }
        let parsed = parse_iso_date(value);
        if parsed.is_none() {
            self.push(field, msg);
        }
        parsed
    }

    /// Requires the value to parse as a record reference.
    pub fn record_id(&mut self, field: &str, value: &str, msg: &str) -> Option<RecordId> {
        match RecordId::from_str(value) {
            Ok(id) => Some(id),
            Err(_) => {
                self.push(field, msg);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_pairs_in_order() {
        let fields = FormFields::parse(b"a=1&b=2&a=3");
        assert_eq!(fields.first("a"), Some("1"));
        assert_eq!(fields.first("b"), Some("2"));
        assert_eq!(fields.first("c"), None);
        assert_eq!(fields.all("a"), vec!["1", "3"]);
    }

    #[test]
    fn parse_decodes_percent_escapes() {
        let fields = FormFields::parse(b"name=Sci%20Fi&note=a%2Bb");
        assert_eq!(fields.first("name"), Some("Sci Fi"));
        assert_eq!(fields.first("note"), Some("a+b"));
    }

    #[test]
    fn to_list_three_case_contract() {
        assert_eq!(to_list(RawValue::Missing), Vec::<String>::new());
        assert_eq!(to_list(RawValue::Single("x".to_string())), vec!["x"]);
        assert_eq!(
            to_list(RawValue::Many(vec!["x".to_string(), "y".to_string()])),
            vec!["x", "y"]
        );
    }

    #[test]
    fn raw_matches_submission_count() {
        let fields = FormFields::parse(b"one=a&many=b&many=c");
        assert_eq!(fields.raw("zero"), RawValue::Missing);
        assert_eq!(fields.raw("one"), RawValue::Single("a".to_string()));
        assert_eq!(
            fields.raw("many"),
            RawValue::Many(vec!["b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn escape_rewrites_html_significant_characters() {
        assert_eq!(escape("a&b"), "a&amp;b");
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("O'Brien"), "O&#x27;Brien");
        assert_eq!(escape("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape("a/b\\c`d"), "a&#x2F;b&#x5C;c&#96;d");
        assert_eq!(escape("plain text"), "plain text");
    }

    #[test]
    fn clean_trims_then_escapes() {
        assert_eq!(clean("  Bram Stoker  "), "Bram Stoker");
        assert_eq!(clean(" <b> "), "&lt;b&gt;");
    }

    #[test]
    fn required_rejects_empty() {
        let mut errors = FormErrors::new();
        assert!(!errors.required("title", "", "Title must not be empty."));
        assert!(errors.required("isbn", "123", "ISBN must not be empty"));
        let errors = errors.into_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
        assert_eq!(errors[0].msg, "Title must not be empty.");
    }

    #[test]
    fn length_bounds() {
        let mut errors = FormErrors::new();
        assert!(!errors.min_length("name", "ab", 3, "too short"));
        assert!(errors.min_length("name", "abc", 3, "too short"));
        assert!(errors.max_length("name", "abc", 100, "too long"));
        assert!(!errors.max_length("name", &"x".repeat(101), 100, "too long"));
        assert_eq!(errors.into_vec().len(), 2);
    }

    #[test]
    fn alphanumeric_character_class() {
        let mut errors = FormErrors::new();
        assert!(errors.alphanumeric("first_name", "Bram", "non-alphanumeric"));
        assert!(errors.alphanumeric("first_name", "Bram2", "non-alphanumeric"));
        assert!(!errors.alphanumeric("first_name", "Bram Stoker", "non-alphanumeric"));
        assert!(!errors.alphanumeric("first_name", "O&#x27;Brien", "non-alphanumeric"));
    }

    #[test]
    fn optional_date_skips_empty_values() {
        let mut errors = FormErrors::new();
        assert_eq!(errors.optional_date("date_of_birth", "", "Invalid date"), None);
        assert!(errors.is_empty());

        let parsed = errors.optional_date("date_of_birth", "1847-11-08", "Invalid date");
        assert_eq!(parsed, NaiveDate::from_ymd_opt(1847, 11, 8));
        assert!(errors.is_empty());

        assert_eq!(errors.optional_date("date_of_birth", "whenever", "Invalid date"), None);
        assert_eq!(errors.into_vec().len(), 1);
    }

    #[test]
    fn record_id_rule() {
        let mut errors = FormErrors::new();
        assert!(
            errors
                .record_id("author", "0123456789abcdef01234567", "Invalid author reference")
                .is_some()
        );
        assert!(errors.record_id("author", "nope", "Invalid author reference").is_none());
        let errors = errors.into_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].msg, "Invalid author reference");
    }
}
