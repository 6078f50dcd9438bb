use tracing::debug;

use crate::error::Result;

pub mod imdb;
pub mod naming;
pub mod omdb;

pub use imdb::{extract_imdb_id, imdb_url, parse_imdb_id};
pub use naming::{folder_name, sanitize_title};

/// One candidate match returned by a movie backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRecord {
    pub title: String,
    pub year: Option<i32>,
    /// Numeric part of the IMDb id, without the `tt` prefix
    pub external_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupRequest {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub external_id: Option<String>,
}

impl LookupRequest {
    #[cfg(test)]
    pub fn by_title(title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            title: Some(title.into()),
            year,
            external_id: None,
        }
    }

    #[cfg(test)]
    pub fn by_id(external_id: impl Into<String>) -> Self {
        Self {
            title: None,
            year: None,
            external_id: Some(external_id.into()),
        }
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    fn external_id(&self) -> Option<&str> {
        self.external_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// A request needs a title or an id to be worth sending
    pub fn is_empty(&self) -> bool {
        self.title().is_none() && self.external_id().is_none()
    }
}

#[async_trait::async_trait]
pub trait MovieBackend {
    async fn search(&self, title: &str) -> Result<Vec<MovieRecord>>;
    async fn fetch(&self, external_id: &str) -> Result<MovieRecord>;
}

/// Whether `candidate` lies within one year either side of `wanted`
pub fn year_matches(candidate: Option<i32>, wanted: i32) -> bool {
    let band = wanted.saturating_sub(1)..=wanted.saturating_add(1);
    candidate.is_some_and(|year| band.contains(&year))
}

/// Resolve a request against a backend.
///
/// An id lookup yields exactly one record. A title search keeps the backend's
/// order and, when a year is given, drops records outside the ±1 year band.
pub async fn lookup_records(
    backend: &(dyn MovieBackend + Send + Sync),
    request: &LookupRequest,
) -> Result<Vec<MovieRecord>> {
    if let Some(id) = request.external_id() {
        debug!(id = %id, "Fetching movie by id");
        let record = backend.fetch(id).await?;
        return Ok(vec![record]);
    }

    let Some(title) = request.title() else {
        return Ok(Vec::new());
    };

    debug!(title = %title, year = ?request.year, "Searching movies by title");
    let records = backend.search(title).await?;

    Ok(match request.year {
        Some(year) => records
            .into_iter()
            .filter(|r| year_matches(r.year, year))
            .collect(),
        None => records,
    })
}
