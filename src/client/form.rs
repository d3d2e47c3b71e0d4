//! Editable book form used by the create and edit screens.
//!
//! Which fields are shown, and which are required, depends on the selected
//! status: a start date once reading has begun, end date and rating only for
//! finished books.

use serde_json::{json, Map, Value};

use crate::domain::book::{Book, ReadingStatus};
use crate::domain::validation::{self, MAX_RATING};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField { Title, Author, Status, StartDate, EndDate, Rating }

impl FormField {
    const ORDER: [FormField; 6] = [
        FormField::Title,
        FormField::Author,
        FormField::Status,
        FormField::StartDate,
        FormField::EndDate,
        FormField::Rating,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Author => "Author",
            FormField::Status => "Status",
            FormField::StartDate => "Start date",
            FormField::EndDate => "End date",
            FormField::Rating => "Rating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub status: ReadingStatus,
    pub start_date: String,
    pub end_date: String,
    /// Held locally until the form is submitted.
    pub rating: Option<u8>,
    pub focus: FormField,
}

impl Default for BookForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            status: ReadingStatus::default(),
            start_date: String::new(),
            end_date: String::new(),
            rating: None,
            focus: FormField::Title,
        }
    }
}

impl BookForm {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            status: book.status,
            start_date: book.start_date.map(|d| d.to_string()).unwrap_or_default(),
            end_date: book.end_date.map(|d| d.to_string()).unwrap_or_default(),
            rating: book.rating,
            focus: FormField::Title,
        }
    }

    pub fn is_visible(&self, field: FormField) -> bool {
        match field {
            FormField::StartDate => self.status.is_started(),
            FormField::EndDate | FormField::Rating => self.status.is_finished(),
            _ => true,
        }
    }

    pub fn is_required(&self, field: FormField) -> bool {
        match field {
            FormField::Title | FormField::Author | FormField::Status => true,
            FormField::StartDate => self.status.is_started(),
            FormField::EndDate | FormField::Rating => false,
        }
    }

    pub fn visible_fields(&self) -> Vec<FormField> {
        FormField::ORDER.into_iter().filter(|f| self.is_visible(*f)).collect()
    }

    pub fn focus_next(&mut self) { self.move_focus(1); }

    pub fn focus_prev(&mut self) { self.move_focus(-1); }

    fn move_focus(&mut self, step: isize) {
        let fields = self.visible_fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0) as isize;
        let len = fields.len() as isize;
        self.focus = fields[(pos + step).rem_euclid(len) as usize];
    }

    pub fn cycle_status(&mut self, forward: bool) {
        let all = ReadingStatus::ALL;
        let pos = all.iter().position(|s| *s == self.status).unwrap_or(0);
        let next = if forward { pos + 1 } else { pos + all.len() - 1 };
        self.status = all[next % all.len()];
        if !self.is_visible(self.focus) { self.focus = FormField::Status; }
    }

    /// Sets the star rating; `0` clears it.
    pub fn set_rating(&mut self, stars: u8) {
        self.rating = match stars {
            0 => None,
            n => Some(n.min(MAX_RATING)),
        };
    }

    /// Routes a typed character to the focused field.
    pub fn input_char(&mut self, c: char) {
        match self.focus {
            FormField::Title => self.title.push(c),
            FormField::Author => self.author.push(c),
            FormField::StartDate => self.start_date.push(c),
            FormField::EndDate => self.end_date.push(c),
            FormField::Status => match c {
                ' ' | 'l' => self.cycle_status(true),
                'h' => self.cycle_status(false),
                _ => {}
            },
            FormField::Rating => {
                if let Some(d) = c.to_digit(10).filter(|d| *d <= u32::from(MAX_RATING)) {
                    self.set_rating(d as u8);
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormField::Title => { self.title.pop(); }
            FormField::Author => { self.author.pop(); }
            FormField::StartDate => { self.start_date.pop(); }
            FormField::EndDate => { self.end_date.pop(); }
            FormField::Rating => self.rating = None,
            FormField::Status => {}
        }
    }

    /// Checks the form before anything is sent.
    pub fn validate(&self) -> Result<(), Vec<(FormField, &'static str)>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() { errors.push((FormField::Title, "Title is required")); }
        if self.author.trim().is_empty() { errors.push((FormField::Author, "Author is required")); }
        if self.is_visible(FormField::StartDate) {
            match self.start_date.trim() {
                "" => errors.push((FormField::StartDate, "Start date is required once reading has started")),
                s if validation::parse_date(s).is_none() => errors.push((FormField::StartDate, "Use the YYYY-MM-DD format")),
                _ => {}
            }
        }
        if self.is_visible(FormField::EndDate) {
            let end = self.end_date.trim();
            if !end.is_empty() {
                match (validation::parse_date(end), validation::parse_date(self.start_date.trim())) {
                    (None, _) => errors.push((FormField::EndDate, "Use the YYYY-MM-DD format")),
                    (Some(end), Some(start)) if end < start => errors.push((FormField::EndDate, "End date must not be before the start date")),
                    _ => {}
                }
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Body for a create request; hidden or blank optional fields are left out.
    pub fn to_create_payload(&self) -> Value {
        let mut body = self.required_fields();
        for (key, value) in self.optional_fields() {
            if !value.is_null() { body.insert(key.to_string(), value); }
        }
        Value::Object(body)
    }

    /// Body for an update request; hidden or blank optional fields are sent
    /// as `null` so the stored values are cleared.
    pub fn to_update_payload(&self) -> Value {
        let mut body = self.required_fields();
        for (key, value) in self.optional_fields() {
            body.insert(key.to_string(), value);
        }
        Value::Object(body)
    }

    fn required_fields(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("title".into(), json!(self.title.trim()));
        body.insert("author".into(), json!(self.author.trim()));
        body.insert("status".into(), json!(self.status.as_str()));
        body
    }

    fn optional_fields(&self) -> [(&'static str, Value); 3] {
        let date = |field: FormField, raw: &str| {
            let raw = raw.trim();
            if self.is_visible(field) && !raw.is_empty() { json!(raw) } else { Value::Null }
        };
        let rating = match self.rating {
            Some(r) if self.is_visible(FormField::Rating) => json!(r),
            _ => Value::Null,
        };
        [
            ("startDate", date(FormField::StartDate, &self.start_date)),
            ("endDate", date(FormField::EndDate, &self.end_date)),
            ("rating", rating),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(status: ReadingStatus) -> BookForm {
        BookForm { title: "Dune".into(), author: "Herbert".into(), status, ..Default::default() }
    }

    #[test]
    fn fields_follow_status() {
        let mut form = filled(ReadingStatus::WantToRead);
        assert_eq!(form.visible_fields(), vec![FormField::Title, FormField::Author, FormField::Status]);
        form.cycle_status(true);
        assert_eq!(form.status, ReadingStatus::Reading);
        assert!(form.is_required(FormField::StartDate));
        assert!(!form.is_visible(FormField::Rating));
        form.cycle_status(true);
        assert_eq!(form.visible_fields().len(), 6);
        form.cycle_status(true);
        assert_eq!(form.status, ReadingStatus::WantToRead);
    }

    #[test]
    fn focus_skips_hidden_fields_and_wraps() {
        let mut form = filled(ReadingStatus::WantToRead);
        form.focus = FormField::Status;
        form.focus_next();
        assert_eq!(form.focus, FormField::Title);
        form.focus_prev();
        assert_eq!(form.focus, FormField::Status);
    }

    #[test]
    fn hiding_the_focused_field_moves_focus_to_status() {
        let mut form = filled(ReadingStatus::Read);
        form.focus = FormField::Rating;
        form.cycle_status(false);
        assert_eq!(form.focus, FormField::Status);
    }

    #[test]
    fn start_date_is_required_once_reading() {
        let mut form = filled(ReadingStatus::Reading);
        let errors = form.validate().unwrap_err();
        assert_eq!(errors[0].0, FormField::StartDate);
        form.start_date = "2024-13-01".into();
        assert!(form.validate().is_err());
        form.start_date = "2024-01-10".into();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn end_date_must_follow_start_date() {
        let mut form = filled(ReadingStatus::Read);
        form.start_date = "2024-02-01".into();
        form.end_date = "2024-01-01".into();
        assert_eq!(form.validate().unwrap_err()[0].0, FormField::EndDate);
    }

    #[test]
    fn rating_widget_sets_and_clears() {
        let mut form = filled(ReadingStatus::Read);
        form.focus = FormField::Rating;
        form.input_char('4');
        assert_eq!(form.rating, Some(4));
        form.input_char('9');
        assert_eq!(form.rating, Some(4));
        form.input_char('0');
        assert_eq!(form.rating, None);
    }

    #[test]
    fn create_payload_omits_hidden_fields() {
        let mut form = filled(ReadingStatus::Reading);
        form.start_date = "2024-01-10".into();
        form.end_date = "2024-02-01".into();
        form.rating = Some(5);
        assert_eq!(
            form.to_create_payload(),
            json!({ "title": "Dune", "author": "Herbert", "status": "lendo", "startDate": "2024-01-10" })
        );
    }

    #[test]
    fn update_payload_clears_hidden_fields() {
        let mut form = filled(ReadingStatus::Reading);
        form.start_date = "2024-01-10".into();
        form.rating = Some(5);
        let body = form.to_update_payload();
        assert_eq!(body["rating"], Value::Null);
        assert_eq!(body["endDate"], Value::Null);
        assert_eq!(body["startDate"], "2024-01-10");
        assert!(validation::parse_update(&body).is_ok());
    }
}
