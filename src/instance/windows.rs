use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::windows::named_pipe::{
    ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions,
};

const ERROR_PIPE_BUSY: i32 = 231;

pub enum Stream {
    Client(NamedPipeClient),
    Server(NamedPipeServer),
}

pub struct Listener {
    name: OsString,
    next: NamedPipeServer,
}

pub async fn connect(endpoint: &Path) -> io::Result<Stream> {
    loop {
        match ClientOptions::new().open(endpoint) {
            Ok(client) => return Ok(Stream::Client(client)),
            Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

pub fn bind(endpoint: &Path) -> io::Result<Listener> {
    let next = ServerOptions::new()
        .first_pipe_instance(true)
        .create(endpoint)?;
    Ok(Listener {
        name: endpoint.as_os_str().to_os_string(),
        next,
    })
}

/// Named pipes vanish with their owning process, so nothing is ever stale
pub fn remove_stale(_endpoint: &Path) -> io::Result<()> {
    Ok(())
}

impl Listener {
    pub async fn accept(&mut self) -> io::Result<Stream> {
        self.next.connect().await?;
        let fresh = ServerOptions::new().create(&self.name)?;
        let connected = std::mem::replace(&mut self.next, fresh);
        Ok(Stream::Server(connected))
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Client(c) => std::pin::Pin::new(c).poll_read(cx, buf),
            Stream::Server(s) => std::pin::Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<io::Result<usize>> {
        match self.get_mut() {
            Stream::Client(c) => std::pin::Pin::new(c).poll_write(cx, buf),
            Stream::Server(s) => std::pin::Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Client(c) => std::pin::Pin::new(c).poll_flush(cx),
            Stream::Server(s) => std::pin::Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Client(c) => std::pin::Pin::new(c).poll_shutdown(cx),
            Stream::Server(s) => std::pin::Pin::new(s).poll_shutdown(cx),
        }
    }
}
