use std::collections::HashMap;

use async_trait::async_trait;
use eval_framing::Envelope;
use tokio::sync::{mpsc, Mutex};

use crate::error::SchedulerError;
use crate::worker::WorkerId;

/// The four verbs the scheduler needs from a transport (§9 "Message passing
/// abstraction"): non-blocking send, wait-any over outstanding receives,
/// a non-blocking test, and broadcast. Any transport satisfying this —
/// process-based message passing, an in-process channel mesh, a
/// shared-memory ring — suffices; the scheduler never specializes to one.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post a non-blocking send to `worker`. Returns once the send has been
    /// accepted by the transport, not once the peer has processed it.
    async fn send(&self, worker: WorkerId, envelope: Envelope) -> Result<(), SchedulerError>;

    /// Block until at least one outstanding receive completes; returns the
    /// worker it came from and the decoded envelope.
    async fn wait_any(&self) -> Result<(WorkerId, Envelope), SchedulerError>;

    /// Non-blocking test for a single ready receive, if any.
    fn try_recv(&self) -> Option<(WorkerId, Envelope)>;

    /// Broadcasts the termination tag to every worker and does not wait
    /// for acknowledgement.
    async fn broadcast_termination(&self, workers: &[WorkerId]) -> Result<(), SchedulerError>;
}

/// An in-process transport over `tokio::sync::mpsc`, standing in for the
/// process-based message passing the source assumes. One channel pair per
/// worker; `wait_any` races all inbound receivers.
pub struct ChannelTransport {
    to_worker: HashMap<WorkerId, mpsc::UnboundedSender<Envelope>>,
    from_worker: Mutex<mpsc::UnboundedReceiver<(WorkerId, Envelope)>>,
    reply_tx: mpsc::UnboundedSender<(WorkerId, Envelope)>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            to_worker: HashMap::new(),
            from_worker: Mutex::new(reply_rx),
            reply_tx,
        }
    }

    /// Registers a worker, returning its inbound receiver (what the server
    /// loop polls) and a clone of the shared reply sender (what the server
    /// loop uses to answer back).
    pub fn register_worker(&mut self, worker: WorkerId) -> (mpsc::UnboundedReceiver<Envelope>, mpsc::UnboundedSender<(WorkerId, Envelope)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.to_worker.insert(worker, tx);
        (rx, self.reply_tx.clone())
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, worker: WorkerId, envelope: Envelope) -> Result<(), SchedulerError> {
        let tx = self
            .to_worker
            .get(&worker)
            .ok_or_else(|| SchedulerError::Transport(format!("no channel registered for {worker}")))?;
        tx.send(envelope)
            .map_err(|e| SchedulerError::Transport(format!("send to {worker} failed: {e}")))
    }

    async fn wait_any(&self) -> Result<(WorkerId, Envelope), SchedulerError> {
        let mut rx = self.from_worker.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| SchedulerError::Transport("all worker reply channels closed".into()))
    }

    fn try_recv(&self) -> Option<(WorkerId, Envelope)> {
        self.from_worker.try_lock().ok().and_then(|mut rx| rx.try_recv().ok())
    }

    async fn broadcast_termination(&self, workers: &[WorkerId]) -> Result<(), SchedulerError> {
        for worker in workers {
            self.send(*worker, Envelope::termination()).await?;
        }
        Ok(())
    }
}
