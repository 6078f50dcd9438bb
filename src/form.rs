//! Input state behind the main screen: title, year and IMDb fields plus the
//! folder name generated from them. Kept free of terminal types so the
//! editing rules can be exercised directly.

use crate::error::{Error, Result};
use crate::movie::{self, LookupRequest, MovieRecord};

pub const MIN_YEAR: i32 = 1894;
pub const MAX_YEAR: i32 = 2080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Title,
    Year,
    Imdb,
}

impl Field {
    pub fn next(&self) -> Self {
        match self {
            Field::Title => Field::Year,
            Field::Year => Field::Imdb,
            Field::Imdb => Field::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Field::Title => Field::Imdb,
            Field::Year => Field::Title,
            Field::Imdb => Field::Year,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Year => "Year",
            Field::Imdb => "IMDb",
        }
    }
}

#[derive(Debug, Default)]
pub struct MovieForm {
    pub title: String,
    pub year: String,
    pub imdb: String,
    pub focus: Field,
    folder: String,
}

impl MovieForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generated folder name, empty until title and year are both usable
    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn field_text(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Year => &self.year,
            Field::Imdb => &self.imdb,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Year => &mut self.year,
            Field::Imdb => &mut self.imdb,
        }
    }

    /// Year as a number, if it is within the accepted range
    pub fn year_value(&self) -> Option<i32> {
        self.year
            .trim()
            .parse()
            .ok()
            .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
    }

    pub fn input_char(&mut self, c: char) {
        if self.focus == Field::Year && (!c.is_ascii_digit() || self.year.len() >= 4) {
            return;
        }
        let focus = self.focus;
        self.field_mut(focus).push(c);
        self.after_edit();
    }

    pub fn backspace(&mut self) {
        let focus = self.focus;
        self.field_mut(focus).pop();
        self.after_edit();
    }

    pub fn clear_field(&mut self) {
        let focus = self.focus;
        self.field_mut(focus).clear();
        self.after_edit();
    }

    fn after_edit(&mut self) {
        if self.focus == Field::Imdb && !self.imdb.starts_with("tt") {
            if let Some(id) = movie::extract_imdb_id(&self.imdb) {
                self.imdb = id;
            }
        }
        self.generate_output();
    }

    /// Handle pasted text in the focused field.
    ///
    /// Pasting a title or an IMDb id starts over with just that value.
    /// Returns true when the paste produced a well-formed id worth looking up.
    pub fn paste(&mut self, text: &str) -> bool {
        match self.focus {
            Field::Title => {
                let title = text.trim().to_string();
                self.reset();
                self.title = title;
                self.generate_output();
                false
            }
            Field::Year => {
                for c in text.trim().chars() {
                    self.input_char(c);
                }
                false
            }
            Field::Imdb => {
                let id = movie::extract_imdb_id(text).unwrap_or_else(|| text.trim().to_string());
                self.reset();
                self.imdb = id;
                self.generate_output();
                movie::parse_imdb_id(&self.imdb).is_ok()
            }
        }
    }

    /// Take an IMDb id seen on the clipboard. Returns true if the form changed.
    pub fn accept_clipboard(&mut self, text: &str) -> bool {
        match movie::extract_imdb_id(text) {
            Some(id) if id != self.imdb => {
                self.reset();
                self.imdb = id;
                self.generate_output();
                true
            }
            _ => false,
        }
    }

    pub fn generate_output(&mut self) {
        let title = self.title.trim();
        let Some(year) = self.year_value() else {
            self.folder.clear();
            return;
        };
        if title.is_empty() {
            self.folder.clear();
            return;
        }

        let external_id = movie::parse_imdb_id(&self.imdb).ok();
        self.folder = movie::folder_name(title, year, external_id.as_deref());
    }

    pub fn reset(&mut self) {
        self.title.clear();
        self.year.clear();
        self.imdb.clear();
        self.folder.clear();
    }

    /// Build a lookup from the current fields.
    ///
    /// `Ok(None)` means there is nothing to look up. A malformed id is
    /// rejected here so no lookup is attempted for it.
    pub fn lookup_request(&self) -> Result<Option<LookupRequest>> {
        let title = self.title.trim();
        let imdb = self.imdb.trim();
        let year = self.year_value();

        if title.is_empty() && imdb.is_empty() {
            if year.is_some() {
                return Err(Error::EmptyLookup);
            }
            return Ok(None);
        }

        let external_id = if imdb.is_empty() {
            None
        } else {
            Some(movie::parse_imdb_id(imdb)?)
        };

        Ok(Some(LookupRequest {
            title: (!title.is_empty()).then(|| title.to_string()),
            year,
            external_id,
        }))
    }

    /// Fill the form from a chosen record and regenerate the folder name
    pub fn apply_record(&mut self, record: &MovieRecord) {
        if !record.title.is_empty() {
            self.title = record.title.clone();
        }
        if let Some(year) = record.year {
            self.year = year.to_string();
        }
        if self.imdb.trim().is_empty() {
            self.imdb = format!("tt{}", record.external_id);
        }
        self.generate_output();
    }
}
