//! Request validation for book input.
//!
//! Each operation has its own entry point that turns a raw JSON body into a
//! typed value or a list of field-level errors. All problems in a body are
//! reported together rather than stopping at the first one.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::book::{BookPatch, NewBook, ReadingStatus};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Every key a create or update body may carry.
pub const FIELDS: [&str; 6] = ["title", "author", "status", "startDate", "endDate", "rating"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) { self.0.push(FieldError::new(field, message)); }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|e| e.field.as_str()) }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        for (i, e) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{} {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates a create body. A missing `status` defaults to `quero_ler`.
pub fn parse_create(body: &Value) -> Result<NewBook, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let Some(obj) = as_object(body, &mut errors) else { return Err(errors) };
    reject_unknown(obj, &mut errors);

    let title = required_text(obj, "title", &mut errors);
    let author = required_text(obj, "author", &mut errors);
    let status = match obj.get("status") {
        None => Some(ReadingStatus::default()),
        Some(v) => status(v, &mut errors),
    };
    let start_date = obj.get("startDate").and_then(|v| date(v, "startDate", &mut errors));
    let end_date = obj.get("endDate").and_then(|v| date(v, "endDate", &mut errors));
    let rating = obj.get("rating").and_then(|v| rating(v, &mut errors));

    match (title, author, status) {
        (Some(title), Some(author), Some(status)) if errors.is_empty() => {
            let input = NewBook { title, author, status, start_date: start_date.flatten(), end_date: end_date.flatten(), rating: rating.flatten() };
            validate_new(&input)?;
            Ok(input)
        }
        _ => Err(errors),
    }
}

/// Validates an update body. Any subset of fields may be present; the
/// optional ones accept `null` to clear the stored value.
pub fn parse_update(body: &Value) -> Result<BookPatch, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let Some(obj) = as_object(body, &mut errors) else { return Err(errors) };
    reject_unknown(obj, &mut errors);

    let mut patch = BookPatch::default();
    if obj.contains_key("title") { patch.title = required_text(obj, "title", &mut errors); }
    if obj.contains_key("author") { patch.author = required_text(obj, "author", &mut errors); }
    if let Some(v) = obj.get("status") { patch.status = status(v, &mut errors); }
    if let Some(v) = obj.get("startDate") { patch.start_date = date(v, "startDate", &mut errors); }
    if let Some(v) = obj.get("endDate") { patch.end_date = date(v, "endDate", &mut errors); }
    if let Some(v) = obj.get("rating") { patch.rating = rating(v, &mut errors); }

    errors.into_result(patch)
}

/// Checks a typed create input, including the status rules.
pub fn validate_new(input: &NewBook) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_text("title", &input.title, &mut errors);
    check_text("author", &input.author, &mut errors);
    if let Some(r) = input.rating { check_rating(r, &mut errors); }
    check_status_rules(input.status, input.start_date, input.end_date, input.rating, &mut errors);
    errors.into_result(())
}

/// Checks the fields present in a typed patch. The status rules need the
/// stored record and are checked separately once it is merged.
pub fn validate_patch(patch: &BookPatch) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if let Some(t) = &patch.title { check_text("title", t, &mut errors); }
    if let Some(a) = &patch.author { check_text("author", a, &mut errors); }
    if let Some(Some(r)) = patch.rating { check_rating(r, &mut errors); }
    errors.into_result(())
}

/// Status rules for a whole record: rating and end date belong to finished
/// books, and a book cannot end before it starts.
pub fn status_rules(
    status: ReadingStatus,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    rating: Option<u8>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_status_rules(status, start_date, end_date, rating, &mut errors);
    errors.into_result(())
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping the UTC date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc).date_naive()))
}

fn check_status_rules(
    status: ReadingStatus,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    rating: Option<u8>,
    errors: &mut ValidationErrors,
) {
    if !status.is_finished() {
        if rating.is_some() { errors.push("rating", "is only allowed when status is lido"); }
        if end_date.is_some() { errors.push("endDate", "is only allowed when status is lido"); }
    }
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start { errors.push("endDate", "must not be before startDate"); }
    }
}

fn check_text(field: &str, value: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() { errors.push(field, "must not be empty"); }
}

fn check_rating(value: u8, errors: &mut ValidationErrors) {
    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        errors.push("rating", format!("must be between {MIN_RATING} and {MAX_RATING}"));
    }
}

fn as_object<'a>(body: &'a Value, errors: &mut ValidationErrors) -> Option<&'a Map<String, Value>> {
    let obj = body.as_object();
    if obj.is_none() { errors.push("body", "must be a JSON object"); }
    obj
}

fn reject_unknown(obj: &Map<String, Value>, errors: &mut ValidationErrors) {
    for key in obj.keys().filter(|k| !FIELDS.contains(&k.as_str())) {
        errors.push(key, "is not a recognized field");
    }
}

fn required_text(obj: &Map<String, Value>, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => { errors.push(field, "is required"); None }
        Some(Value::String(s)) if s.trim().is_empty() => { errors.push(field, "must not be empty"); None }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => { errors.push(field, "must be a string"); None }
    }
}

fn status(value: &Value, errors: &mut ValidationErrors) -> Option<ReadingStatus> {
    match value.as_str().map(str::parse::<ReadingStatus>) {
        Some(Ok(s)) => Some(s),
        Some(Err(e)) => { errors.push("status", e.to_string()); None }
        None => { errors.push("status", "must be one of quero_ler, lendo or lido"); None }
    }
}

/// `Some(None)` means an explicit `null`.
fn date(value: &Value, field: &str, errors: &mut ValidationErrors) -> Option<Option<NaiveDate>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => match parse_date(s) {
            Some(d) => Some(Some(d)),
            None => { errors.push(field, "must be an ISO-8601 date"); None }
        },
        _ => { errors.push(field, "must be an ISO-8601 date"); None }
    }
}

fn rating(value: &Value, errors: &mut ValidationErrors) -> Option<Option<u8>> {
    match value {
        Value::Null => Some(None),
        // 5.0 is the same rating as 5; 4.5 is not a rating.
        Value::Number(n) => match n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)) {
            Some(r) if (i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(&r) => Some(Some(r as u8)),
            Some(_) => { errors.push("rating", format!("must be between {MIN_RATING} and {MAX_RATING}")); None }
            None => { errors.push("rating", "must be an integer"); None }
        },
        _ => { errors.push("rating", "must be an integer"); None }
    }
}
