use std::future::Future;
use std::pin::Pin;

type PendingSend = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Guards a single outbound send buffer: a server loop has exactly one
/// active send in flight at a time, and must wait on its request handle
/// before the buffer can be reused for the next response (§4.7 "All three
/// protect their outbound send with a wait on the previous send's request
/// handle"). `ChannelTransport`'s sends complete immediately, so the wait
/// is a formality here, but the discipline carries over to transports
/// whose sends genuinely overlap with computation.
#[derive(Default)]
pub struct SendSlot {
    outstanding: Option<PendingSend>,
}

impl SendSlot {
    pub fn new() -> Self {
        Self { outstanding: None }
    }

    /// Waits on any previously posted send, then stashes `handle` as the
    /// new outstanding send.
    pub async fn post<F>(&mut self, handle: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.wait().await;
        self.outstanding = Some(Box::pin(handle));
    }

    /// Waits on the outstanding send, if any, leaving the slot free.
    pub async fn wait(&mut self) {
        if let Some(pending) = self.outstanding.take() {
            pending.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn post_waits_on_previous_send_before_accepting_a_new_one() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut slot = SendSlot::new();

        let flag_clone = flag.clone();
        slot.post(async move { flag_clone.store(true, Ordering::SeqCst) }).await;
        assert!(!flag.load(Ordering::SeqCst));

        slot.post(async {}).await;
        assert!(flag.load(Ordering::SeqCst));
    }
}
