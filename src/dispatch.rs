//! Background movie lookups, one at a time.
//!
//! Requests go into a queue drained by a single worker task, so a lookup
//! submitted while another is running waits for it to finish. Progress and
//! results come back as [`LookupEvent`]s on the caller's message channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::movie::{self, LookupRequest, MovieBackend, MovieRecord};

pub type LookupId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Backend answered; may be empty
    Records(Vec<MovieRecord>),
    /// Backend failed; the error has already been logged
    Failed,
}

impl LookupOutcome {
    #[cfg(test)]
    pub fn records(&self) -> &[MovieRecord] {
        match self {
            LookupOutcome::Records(records) => records,
            LookupOutcome::Failed => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupEvent {
    Started { id: LookupId },
    Finished { id: LookupId, outcome: LookupOutcome },
}

struct Job {
    id: LookupId,
    request: LookupRequest,
}

pub struct LookupDispatcher {
    jobs: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<()>,
    next_id: LookupId,
}

impl LookupDispatcher {
    /// Start the worker. Events are converted into the caller's message type.
    pub fn spawn<M>(
        backend: Arc<dyn MovieBackend + Send + Sync>,
        events: mpsc::UnboundedSender<M>,
    ) -> Self
    where
        M: From<LookupEvent> + Send + 'static,
    {
        let (jobs, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(backend, rx, events));

        Self {
            jobs,
            worker,
            next_id: 1,
        }
    }

    /// Queue a lookup behind any that are still in flight
    pub fn submit(&mut self, request: LookupRequest) -> Result<LookupId> {
        if request.is_empty() {
            return Err(Error::EmptyLookup);
        }

        let id = self.next_id;
        self.next_id += 1;

        debug!(id, ?request, "Queueing lookup");
        self.jobs
            .send(Job { id, request })
            .map_err(|_| Error::DispatcherClosed)?;
        Ok(id)
    }
}

impl Drop for LookupDispatcher {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker<M>(
    backend: Arc<dyn MovieBackend + Send + Sync>,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    events: mpsc::UnboundedSender<M>,
) where
    M: From<LookupEvent> + Send + 'static,
{
    while let Some(job) = jobs.recv().await {
        if events.send(LookupEvent::Started { id: job.id }.into()).is_err() {
            break;
        }

        let outcome = match movie::lookup_records(backend.as_ref(), &job.request).await {
            Ok(records) => {
                info!(id = job.id, count = records.len(), "Lookup finished");
                LookupOutcome::Records(records)
            }
            Err(e) => {
                debug!(id = job.id, "Error getting movie information");
                error!(id = job.id, class = e.class(), error = %e, "Lookup failed");
                LookupOutcome::Failed
            }
        };

        let finished = LookupEvent::Finished {
            id: job.id,
            outcome,
        };
        if events.send(finished.into()).is_err() {
            break;
        }
    }
    debug!("Lookup worker stopped");
}
