use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::LookupConfig;
use crate::error::{Error, Result};
use crate::movie::{MovieBackend, MovieRecord};

const NOT_FOUND: &str = "Movie not found!";
const PAGE_SIZE: u32 = 10;

/// Movie backend talking to the OMDb HTTP API
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    search_pages: u32,
}

impl OmdbClient {
    pub fn new(config: &LookupConfig) -> Self {
        let client = match http_client(config).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(
                    timeout_secs = config.timeout_secs,
                    "Failed to build HTTP client, falling back to defaults without timeout: {}", e
                );
                Client::default()
            }
        };

        Self::with_client(client, config)
    }

    fn with_client(client: Client, config: &LookupConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            search_pages: config.search_pages.max(1),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Lookup(format!(
                "OMDb API error: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn search_page(&self, title: &str, page: u32) -> Result<OmdbSearchResponse> {
        let page = page.to_string();
        self.get(&[("s", title), ("type", "movie"), ("page", page.as_str())])
            .await
    }
}

fn http_client(config: &LookupConfig) -> reqwest::ClientBuilder {
    Client::builder().timeout(Duration::from_secs(config.timeout_secs))
}

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<OmdbMovie>,
    #[serde(rename = "totalResults", default)]
    total_results: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbMovie {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

/// Leading four digits of an OMDb year ("2010", "2010–2013", "N/A")
fn parse_year(year: Option<&str>) -> Option<i32> {
    let year = year?;
    let digits: String = year.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse().ok()
}

impl From<OmdbMovie> for MovieRecord {
    fn from(m: OmdbMovie) -> Self {
        let year = parse_year(m.year.as_deref());
        let external_id = m
            .imdb_id
            .strip_prefix("tt")
            .unwrap_or(&m.imdb_id)
            .to_string();

        MovieRecord {
            title: m.title,
            year,
            external_id,
        }
    }
}

impl OmdbSearchResponse {
    /// `None` once the service reports no (more) matches
    fn into_records(self) -> Result<Option<Vec<MovieRecord>>> {
        if self.response != "True" {
            return match self.error.as_deref() {
                Some(NOT_FOUND) => Ok(None),
                Some(e) => Err(Error::Lookup(e.to_string())),
                None => Err(Error::Lookup("OMDb search failed".to_string())),
            };
        }

        Ok(Some(self.search.into_iter().map(MovieRecord::from).collect()))
    }

    fn total(&self) -> u32 {
        self.total_results
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0)
    }
}

impl OmdbMovie {
    fn into_record(self) -> Result<MovieRecord> {
        if self.response.as_deref() == Some("False") {
            return Err(Error::Lookup(
                self.error
                    .unwrap_or_else(|| "OMDb lookup failed".to_string()),
            ));
        }
        Ok(self.into())
    }
}

#[async_trait::async_trait]
impl MovieBackend for OmdbClient {
    async fn search(&self, title: &str) -> Result<Vec<MovieRecord>> {
        let mut records = Vec::new();

        for page in 1..=self.search_pages {
            let response = self.search_page(title, page).await?;
            let total = response.total();

            match response.into_records()? {
                Some(batch) => records.extend(batch),
                None => break,
            }

            if page * PAGE_SIZE >= total {
                break;
            }
        }

        debug!(title = %title, count = records.len(), "OMDb search finished");
        Ok(records)
    }

    async fn fetch(&self, external_id: &str) -> Result<MovieRecord> {
        let imdb_id = format!("tt{}", external_id);
        let movie: OmdbMovie = self.get(&[("i", imdb_id.as_str())]).await?;
        let record = movie.into_record()?;
        debug!(id = %external_id, title = %record.title, "OMDb fetch finished");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_payload_to_records() {
        let json = r#"{
            "Search": [
                {"Title": "Inception", "Year": "2010", "imdbID": "tt1375666", "Type": "movie", "Poster": "N/A"},
                {"Title": "Inception: The Cobol Job", "Year": "2010", "imdbID": "tt5295894", "Type": "movie", "Poster": "N/A"}
            ],
            "totalResults": "2",
            "Response": "True"
        }"#;
        let response: OmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total(), 2);

        let records = response.into_records().unwrap().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Inception");
        assert_eq!(records[0].year, Some(2010));
        assert_eq!(records[0].external_id, "1375666");
    }

    #[test]
    fn test_not_found_means_no_records() {
        let json = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        let response: OmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_records().unwrap().is_none());
    }

    #[test]
    fn test_other_service_errors_are_lookup_errors() {
        let json = r#"{"Response": "False", "Error": "Invalid API key!"}"#;
        let response: OmdbSearchResponse = serde_json::from_str(json).unwrap();
        let err = response.into_records().unwrap_err();
        assert!(matches!(err, Error::Lookup(msg) if msg == "Invalid API key!"));
    }

    #[test]
    fn test_fetch_payload_to_record() {
        let json = r#"{
            "Title": "The Shawshank Redemption",
            "Year": "1994",
            "Rated": "R",
            "imdbID": "tt0111161",
            "Type": "movie",
            "Response": "True"
        }"#;
        let movie: OmdbMovie = serde_json::from_str(json).unwrap();
        let record = movie.into_record().unwrap();
        assert_eq!(record.title, "The Shawshank Redemption");
        assert_eq!(record.year, Some(1994));
        assert_eq!(record.external_id, "0111161");
    }

    #[test]
    fn test_fetch_error_payload() {
        let json = r#"{"Response": "False", "Error": "Incorrect IMDb ID."}"#;
        let movie: OmdbMovie = serde_json::from_str(json).unwrap();
        assert!(matches!(movie.into_record(), Err(Error::Lookup(_))));
    }

    #[test]
    fn test_parse_year_variants() {
        assert_eq!(parse_year(Some("2010")), Some(2010));
        assert_eq!(parse_year(Some("2010–2013")), Some(2010));
        assert_eq!(parse_year(Some("2019–")), Some(2019));
        assert_eq!(parse_year(Some("N/A")), None);
        assert_eq!(parse_year(Some("")), None);
        assert_eq!(parse_year(None), None);
    }

    #[test]
    fn test_client_reports_missing_key() {
        let client = OmdbClient::new(&LookupConfig::default());
        assert!(!client.has_api_key());
    }

    mod http {
        use std::sync::{Arc, Mutex};

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        use super::*;

        type Requests = Arc<Mutex<Vec<String>>>;

        /// Serve canned responses on localhost; `respond` maps a request
        /// target to a status line and JSON body.
        async fn serve<F>(respond: F) -> (String, Requests)
        where
            F: Fn(&str) -> (&'static str, String) + Send + Sync + 'static,
        {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let requests: Requests = Arc::default();
            let seen = requests.clone();

            tokio::spawn(async move {
                loop {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        return;
                    };

                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&buf);
                    let target = head
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or_default()
                        .to_string();
                    seen.lock().unwrap().push(target.clone());

                    let (status, body) = respond(&target);
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            (format!("http://{}/", addr), requests)
        }

        fn client(base_url: String, search_pages: u32) -> OmdbClient {
            let config = LookupConfig {
                api_key: "test-key".to_string(),
                base_url,
                timeout_secs: 5,
                search_pages,
            };
            let http = http_client(&config).no_proxy().build().unwrap();
            OmdbClient::with_client(http, &config)
        }

        fn search_page_body(first: u32, count: u32, total: u32) -> String {
            let movies: Vec<String> = (first..first + count)
                .map(|i| {
                    format!(
                        r#"{{"Title": "Movie {i}", "Year": "2001", "imdbID": "tt{i:07}", "Type": "movie"}}"#
                    )
                })
                .collect();
            format!(
                r#"{{"Search": [{}], "totalResults": "{}", "Response": "True"}}"#,
                movies.join(","),
                total
            )
        }

        #[tokio::test]
        async fn test_http_error_status_is_lookup_error() {
            let (url, _) = serve(|_| ("503 Service Unavailable", "{}".to_string())).await;
            let omdb = client(url, 2);

            let err = omdb.search("Inception").await.unwrap_err();
            assert!(
                matches!(&err, Error::Lookup(msg) if msg == "OMDb API error: 503 Service Unavailable"),
                "{err:?}"
            );

            let err = omdb.fetch("1375666").await.unwrap_err();
            assert!(matches!(&err, Error::Lookup(msg) if msg.starts_with("OMDb API error: 503")));
        }

        #[tokio::test]
        async fn test_search_stops_once_all_results_fetched() {
            let (url, requests) = serve(|_| ("200 OK", search_page_body(1, 2, 2))).await;
            let omdb = client(url, 3);

            let records = omdb.search("Inception").await.unwrap();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].external_id, "0000001");

            let requests = requests.lock().unwrap();
            assert_eq!(requests.len(), 1);
            assert!(requests[0].contains("s=Inception"));
            assert!(requests[0].contains("page=1"));
            assert!(requests[0].contains("apikey=test-key"));
        }

        #[tokio::test]
        async fn test_not_found_on_later_page_keeps_earlier_pages() {
            let (url, requests) = serve(|target| {
                if target.contains("page=1") {
                    ("200 OK", search_page_body(1, 10, 25))
                } else {
                    (
                        "200 OK",
                        r#"{"Response": "False", "Error": "Movie not found!"}"#.to_string(),
                    )
                }
            })
            .await;
            let omdb = client(url, 3);

            let records = omdb.search("Movie").await.unwrap();
            assert_eq!(records.len(), 10);
            assert_eq!(requests.lock().unwrap().len(), 2);
        }

        #[tokio::test]
        async fn test_search_pages_limit_is_respected() {
            let (url, requests) = serve(|target| {
                let first = if target.contains("page=2") { 11 } else { 1 };
                ("200 OK", search_page_body(first, 10, 95))
            })
            .await;
            let omdb = client(url, 2);

            let records = omdb.search("Movie").await.unwrap();
            assert_eq!(records.len(), 20);
            assert_eq!(records[10].external_id, "0000011");
            assert_eq!(requests.lock().unwrap().len(), 2);
        }

        #[tokio::test]
        async fn test_fetch_sends_prefixed_id() {
            let (url, requests) = serve(|_| {
                (
                    "200 OK",
                    r#"{"Title": "The Shawshank Redemption", "Year": "1994", "imdbID": "tt0111161", "Response": "True"}"#
                        .to_string(),
                )
            })
            .await;
            let omdb = client(url, 1);

            let record = omdb.fetch("0111161").await.unwrap();
            assert_eq!(record.title, "The Shawshank Redemption");
            assert_eq!(record.external_id, "0111161");
            assert!(requests.lock().unwrap()[0].contains("i=tt0111161"));
        }

        #[tokio::test]
        async fn test_configured_timeout_applies() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                // Accept and never answer
                let mut held = Vec::new();
                while let Ok((socket, _)) = listener.accept().await {
                    held.push(socket);
                }
            });

            let config = LookupConfig {
                api_key: "test-key".to_string(),
                base_url: format!("http://{}/", addr),
                timeout_secs: 1,
                search_pages: 1,
            };
            let http = http_client(&config).no_proxy().build().unwrap();
            let omdb = OmdbClient::with_client(http, &config);

            let started = std::time::Instant::now();
            let err = omdb.fetch("0111161").await.unwrap_err();
            assert!(matches!(&err, Error::Network(e) if e.is_timeout()), "{err:?}");
            assert!(started.elapsed() < Duration::from_secs(4));
        }
    }
}
