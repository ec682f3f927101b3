use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use eval_framing::{unpack_vars_active_set, Envelope};
use eval_scheduler::{encode_outcome, LocalSimulator, SimOutcome, WorkerId};
use eval_types::{Pair, Response};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::error::ServerError;
use crate::send_slot::SendSlot;

fn envelope_to_pair(envelope: &Envelope) -> Result<(u32, Pair), ServerError> {
    let (tag, vars, active_set, _) = unpack_vars_active_set(&envelope.payload)?;
    let pair = Pair::new(
        tag as i32,
        String::new(),
        vars,
        active_set.clone(),
        Response::new_owning(active_set, Default::default()),
    );
    Ok((tag, pair))
}

fn reply_envelope(tag: u32, outcome: &SimOutcome) -> Envelope {
    Envelope::new(tag, encode_outcome(tag, outcome))
}

/// Blocking receive of the next request, one response computed and sent at
/// a time, until the termination tag arrives (§4.7 "synchronous").
pub async fn run_synchronous(
    worker: WorkerId,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    reply_tx: mpsc::UnboundedSender<(WorkerId, Envelope)>,
    simulator: Arc<dyn LocalSimulator>,
) -> Result<(), ServerError> {
    let mut send_slot = SendSlot::new();
    while let Some(envelope) = rx.recv().await {
        if envelope.is_termination() {
            debug!(%worker, "synchronous server loop received termination");
            break;
        }
        let (tag, pair) = envelope_to_pair(&envelope)?;
        let outcome = simulator.invoke(&pair).await;
        let reply = reply_envelope(tag, &outcome);
        let tx = reply_tx.clone();
        send_slot
            .post(async move {
                tx.send((worker, reply)).ok();
            })
            .await;
    }
    send_slot.wait().await;
    Ok(())
}

/// Overlapped receive posted at loop entry; up to `k` local jobs run
/// concurrently; responses are sent as they finish; exits once the
/// termination tag has been seen and the active set has drained (§4.7
/// "asynchronous").
pub async fn run_asynchronous(
    worker: WorkerId,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    reply_tx: mpsc::UnboundedSender<(WorkerId, Envelope)>,
    simulator: Arc<dyn LocalSimulator>,
    k: usize,
) -> Result<(), ServerError> {
    use futures::stream::{FuturesUnordered, StreamExt};

    type Job = Pin<Box<dyn Future<Output = (u32, SimOutcome)> + Send>>;
    let k = k.max(1);
    let mut active: FuturesUnordered<Job> = FuturesUnordered::new();
    let mut send_slot = SendSlot::new();
    let mut terminated = false;

    loop {
        if terminated && active.is_empty() {
            break;
        }

        tokio::select! {
            biased;

            Some((tag, outcome)) = active.next(), if !active.is_empty() => {
                let reply = reply_envelope(tag, &outcome);
                let tx = reply_tx.clone();
                send_slot.post(async move { tx.send((worker, reply)).ok(); }).await;
            }

            incoming = rx.recv(), if !terminated && active.len() < k => {
                match incoming {
                    Some(envelope) if envelope.is_termination() => {
                        debug!(%worker, "asynchronous server loop received termination");
                        terminated = true;
                    }
                    Some(envelope) => {
                        let (tag, pair) = envelope_to_pair(&envelope)?;
                        let sim = simulator.clone();
                        active.push(Box::pin(async move { (tag, sim.invoke(&pair).await) }));
                    }
                    None => terminated = true,
                }
            }
        }
    }
    send_slot.wait().await;
    Ok(())
}

/// Same protocol as `run_synchronous`, but work arrives over the iterator
/// rank's broadcast channel instead of a master's direct send (§4.7 "peer").
pub async fn run_peer(
    worker: WorkerId,
    mut rx: broadcast::Receiver<Envelope>,
    reply_tx: mpsc::UnboundedSender<(WorkerId, Envelope)>,
    simulator: Arc<dyn LocalSimulator>,
) -> Result<(), ServerError> {
    let mut send_slot = SendSlot::new();
    loop {
        let envelope = match rx.recv().await {
            Ok(envelope) => envelope,
            Err(broadcast::error::RecvError::Closed) => break,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(%worker, skipped, "peer server loop lagged behind broadcast channel");
                continue;
            }
        };
        if envelope.is_termination() {
            debug!(%worker, "peer server loop received termination");
            break;
        }
        let (tag, pair) = envelope_to_pair(&envelope)?;
        let outcome = simulator.invoke(&pair).await;
        let reply = reply_envelope(tag, &outcome);
        let tx = reply_tx.clone();
        send_slot
            .post(async move {
                tx.send((worker, reply)).ok();
            })
            .await;
    }
    send_slot.wait().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eval_framing::pack_vars_active_set;
    use eval_scheduler::decode_outcome;
    use eval_types::{ActiveSet, Variables};

    fn square_simulator() -> Arc<dyn LocalSimulator> {
        Arc::new(|pair: &Pair| {
            let x = pair.vars.continuous[0];
            async move { Ok(eval_types::ResponseData::new(vec![x * x], vec![], vec![])) }
        })
    }

    fn request(tag: u32, x: f64) -> Envelope {
        let vars = Variables::new(vec![x], vec![], vec![]);
        let set = ActiveSet::values_only(1);
        let bytes = pack_vars_active_set(tag, &vars, &set).unwrap();
        Envelope::new(tag, bytes)
    }

    #[tokio::test]
    async fn synchronous_loop_answers_requests_in_order() {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        let worker = WorkerId::Local(0);

        let handle = tokio::spawn(run_synchronous(worker, req_rx, reply_tx, square_simulator()));

        req_tx.send(request(1, 3.0)).unwrap();
        let (_, envelope) = reply_rx.recv().await.unwrap();
        let outcome = decode_outcome(&envelope.payload).unwrap();
        assert_eq!(outcome.unwrap().values, vec![9.0]);

        req_tx.send(Envelope::termination()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn asynchronous_loop_drains_active_jobs_before_exiting() {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        let worker = WorkerId::Local(0);

        let handle = tokio::spawn(run_asynchronous(worker, req_rx, reply_tx, square_simulator(), 2));

        req_tx.send(request(1, 2.0)).unwrap();
        req_tx.send(request(2, 3.0)).unwrap();
        req_tx.send(Envelope::termination()).unwrap();

        let mut seen = Vec::new();
        for _ in 0..2 {
            let (_, envelope) = reply_rx.recv().await.unwrap();
            seen.push(decode_outcome(&envelope.payload).unwrap().unwrap().values[0]);
        }
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, vec![4.0, 9.0]);

        handle.await.unwrap().unwrap();
    }
}
