/// Which server loop a worker runs, chosen once at layout time and never
/// switched mid-run (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerLoopVariant {
    /// Blocking receive, one response at a time.
    Synchronous,
    /// Overlapped receive with up to `k` local jobs in flight.
    Asynchronous { k: usize },
    /// Like synchronous, but work arrives over the iterator rank's
    /// broadcast channel rather than a master's direct send.
    Peer,
}
