#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Data directory not found")]
    NoDataDir,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Invalid IMDb id: {0}")]
    InvalidImdbId(String),

    #[error("Nothing to look up: enter a title or an IMDb id")]
    EmptyLookup,

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Failed to open browser: {0}")]
    BrowserLaunch(String),

    #[error("Lookup worker has stopped")]
    DispatcherClosed,
}

impl Error {
    /// Short class name used in log entries
    pub fn class(&self) -> &'static str {
        match self {
            Error::Io(_) => "Io",
            Error::ConfigParse(_) => "ConfigParse",
            Error::ConfigSerialize(_) => "ConfigSerialize",
            Error::NoConfigDir => "NoConfigDir",
            Error::NoDataDir => "NoDataDir",
            Error::Network(_) => "Network",
            Error::Lookup(_) => "Lookup",
            Error::InvalidImdbId(_) => "InvalidImdbId",
            Error::EmptyLookup => "EmptyLookup",
            Error::Clipboard(_) => "Clipboard",
            Error::BrowserLaunch(_) => "BrowserLaunch",
            Error::DispatcherClosed => "DispatcherClosed",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
