use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

static IMDB_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn imdb_id_pattern() -> &'static Regex {
    IMDB_ID_PATTERN.get_or_init(|| Regex::new(r"tt\d+").expect("valid IMDb id pattern"))
}

/// Find the first IMDb id (`tt` followed by digits) anywhere in `text`.
///
/// Works on bare ids as well as pasted URLs such as
/// `https://www.imdb.com/title/tt0111161/?ref_=nv_sr_srsg_0`.
pub fn extract_imdb_id(text: &str) -> Option<String> {
    imdb_id_pattern()
        .find(text)
        .map(|m| m.as_str().to_string())
}

/// Validate a `tt<digits>` id and return its numeric part
pub fn parse_imdb_id(text: &str) -> Result<String> {
    let text = text.trim();
    let digits = text
        .strip_prefix("tt")
        .ok_or_else(|| Error::InvalidImdbId(text.to_string()))?;

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidImdbId(text.to_string()));
    }

    Ok(digits.to_string())
}

pub fn imdb_url(external_id: &str) -> String {
    format!("https://www.imdb.com/title/tt{}/", external_id)
}
