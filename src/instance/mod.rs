//! Single-instance coordination over a local socket.
//!
//! The first launch binds a well-known endpoint and becomes the primary
//! instance. Later launches connect to it, send one activation line and exit.
//! A socket file left behind by a crashed primary is detected by the refused
//! connection and removed before rebinding.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as sys;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as sys;

/// Line a secondary launch sends to wake the primary
pub const ACTIVATION_MESSAGE: &str = "activate";

/// Whatever the primary instance should bring to the foreground
pub trait ActivationTarget: Send + Sync {
    fn activate(&self);
}

pub enum Role {
    /// Owns the endpoint; call [`PrimaryInstance::serve`] once the UI exists
    Primary(PrimaryInstance),
    /// Another instance is running; `delivered` tells whether it was woken
    Secondary { delivered: bool },
    /// Neither reachable nor bindable; run without coordination
    Standalone,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Primary(_) => "primary",
            Role::Secondary { .. } => "secondary",
            Role::Standalone => "standalone",
        }
    }
}

enum ConnectAttempt {
    Connected(sys::Stream),
    NoListener,
    Stale,
    Unreachable(io::Error),
}

pub struct InstanceCoordinator {
    endpoint: PathBuf,
    connect_timeout: Duration,
}

impl InstanceCoordinator {
    pub fn new(endpoint: PathBuf, connect_timeout: Duration) -> Self {
        Self {
            endpoint,
            connect_timeout,
        }
    }

    pub fn endpoint(&self) -> &Path {
        &self.endpoint
    }

    /// Decide this process's role, waking an existing primary if there is one
    pub async fn start(&self) -> Role {
        match self.try_connect().await {
            ConnectAttempt::Connected(stream) => {
                let delivered = self.send_activation(stream).await;
                Role::Secondary { delivered }
            }
            ConnectAttempt::NoListener => self.become_primary(),
            ConnectAttempt::Stale => {
                info!(endpoint = %self.endpoint.display(), "Removing stale instance endpoint");
                if let Err(e) = sys::remove_stale(&self.endpoint) {
                    warn!(error = %e, "Failed to remove stale instance endpoint");
                }
                self.become_primary()
            }
            ConnectAttempt::Unreachable(e) => {
                warn!(error = %e, "Instance endpoint unreachable, trying to bind it");
                self.become_primary()
            }
        }
    }

    async fn try_connect(&self) -> ConnectAttempt {
        let attempt = tokio::time::timeout(self.connect_timeout, sys::connect(&self.endpoint));

        match attempt.await {
            Ok(Ok(stream)) => ConnectAttempt::Connected(stream),
            Ok(Err(e)) => match e.kind() {
                io::ErrorKind::NotFound => ConnectAttempt::NoListener,
                io::ErrorKind::ConnectionRefused if self.endpoint.exists() => {
                    ConnectAttempt::Stale
                }
                _ => ConnectAttempt::Unreachable(e),
            },
            Err(_) => ConnectAttempt::Unreachable(io::Error::new(
                io::ErrorKind::TimedOut,
                "timed out connecting to running instance",
            )),
        }
    }

    async fn send_activation(&self, mut stream: sys::Stream) -> bool {
        let send = async {
            let line = format!("{}\n", ACTIVATION_MESSAGE);
            stream.write_all(line.as_bytes()).await?;
            stream.flush().await?;
            stream.shutdown().await
        };

        match tokio::time::timeout(self.connect_timeout, send).await {
            Ok(Ok(())) => {
                debug!("Activation message sent to running instance");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to send activation message");
                false
            }
            Err(_) => {
                warn!("Timed out sending activation message");
                false
            }
        }
    }

    fn become_primary(&self) -> Role {
        match sys::bind(&self.endpoint) {
            Ok(listener) => {
                info!(endpoint = %self.endpoint.display(), "Listening as primary instance");
                Role::Primary(PrimaryInstance {
                    listener,
                    endpoint: self.endpoint.clone(),
                })
            }
            Err(e) => {
                warn!(error = %e, "Could not bind instance endpoint, running standalone");
                Role::Standalone
            }
        }
    }
}

pub struct PrimaryInstance {
    listener: sys::Listener,
    endpoint: PathBuf,
}

impl PrimaryInstance {
    /// Start accepting activation messages in the background
    pub fn serve(self, target: Arc<dyn ActivationTarget>) -> InstanceServer {
        let endpoint = self.endpoint.clone();
        let task = tokio::spawn(accept_loop(self.listener, target));
        InstanceServer { task, endpoint }
    }
}

/// Running accept loop of the primary instance
pub struct InstanceServer {
    task: JoinHandle<()>,
    endpoint: PathBuf,
}

impl InstanceServer {
    /// Stop listening and remove the endpoint
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
        debug!(endpoint = %self.endpoint.display(), "Instance server stopped");
    }
}

impl Drop for InstanceServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Reader task for the connection currently treated as message source
struct CurrentConnection(Option<JoinHandle<()>>);

impl CurrentConnection {
    fn replace(&mut self, task: JoinHandle<()>) {
        if let Some(previous) = self.0.replace(task) {
            previous.abort();
        }
    }
}

impl Drop for CurrentConnection {
    fn drop(&mut self) {
        if let Some(task) = self.0.take() {
            task.abort();
        }
    }
}

async fn accept_loop(mut listener: sys::Listener, target: Arc<dyn ActivationTarget>) {
    let mut current = CurrentConnection(None);

    loop {
        match listener.accept().await {
            Ok(stream) => {
                debug!("Accepted instance connection");
                current.replace(tokio::spawn(read_messages(stream, target.clone())));
            }
            Err(e) => {
                warn!(error = %e, "Failed to accept instance connection");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

async fn read_messages<S>(stream: S, target: Arc<dyn ActivationTarget>)
where
    S: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stream).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                debug!(message = %line, "Message from another instance");
                target.activate();
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "Instance connection read failed");
                break;
            }
        }
    }
}
