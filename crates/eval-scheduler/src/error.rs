use eval_partition::PartitionError;
use eval_queue::QueueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("layout error: {0}")]
    Layout(#[from] PartitionError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server {0} sent a response for an eval_id it was not assigned")]
    UnexpectedResponse(i32),
}
