use tracing::debug;

use crate::error::{Error, Result};

/// Open a URL in the user's browser without blocking the UI
pub fn open_url(url: &str) -> Result<()> {
    debug!(url = %url, "Opening browser");
    open::that_detached(url).map_err(|e| Error::BrowserLaunch(e.to_string()))
}

#[cfg(test)]
mod tests {
    #[cfg(unix)]
    #[test]
    fn test_opener_receives_url() {
        let url = "https://www.imdb.com/title/tt0111161/";
        let commands = open::commands(url);
        assert!(!commands.is_empty());
        for cmd in &commands {
            let last = cmd.get_args().last().map(|a| a.to_string_lossy().into_owned());
            assert_eq!(last.as_deref(), Some(url));
        }
    }
}
