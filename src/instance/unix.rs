use std::io;
use std::path::{Path, PathBuf};

use tokio::net::{UnixListener, UnixStream};
use tracing::warn;

pub type Stream = UnixStream;

pub struct Listener {
    inner: UnixListener,
    path: PathBuf,
}

pub async fn connect(endpoint: &Path) -> io::Result<Stream> {
    UnixStream::connect(endpoint).await
}

pub fn bind(endpoint: &Path) -> io::Result<Listener> {
    let inner = UnixListener::bind(endpoint)?;
    Ok(Listener {
        inner,
        path: endpoint.to_path_buf(),
    })
}

/// Remove a socket file left behind by a primary that did not shut down cleanly
pub fn remove_stale(endpoint: &Path) -> io::Result<()> {
    match std::fs::remove_file(endpoint) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl Listener {
    pub async fn accept(&mut self) -> io::Result<Stream> {
        let (stream, _) = self.inner.accept().await?;
        Ok(stream)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Failed to remove instance socket: {}", e);
            }
        }
    }
}
