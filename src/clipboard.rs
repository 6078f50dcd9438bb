use arboard::Clipboard;
use tracing::warn;

use crate::error::{Error, Result};

pub struct SystemClipboard {
    inner: Clipboard,
}

impl SystemClipboard {
    /// Open the system clipboard, or `None` when there is none (headless session)
    pub fn open() -> Option<Self> {
        match Clipboard::new() {
            Ok(inner) => Some(Self { inner }),
            Err(e) => {
                warn!("Clipboard unavailable: {}", e);
                None
            }
        }
    }

    pub fn text(&mut self) -> Result<String> {
        self.inner
            .get_text()
            .map_err(|e| Error::Clipboard(e.to_string()))
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text)
            .map_err(|e| Error::Clipboard(e.to_string()))
    }
}
