//! Reporting protocol (C7): the five lifecycle message shapes, and the
//! `Reporter` seam spec section 1 calls out as an external collaborator
//! ("XML query/response building; the HTTP client that transports
//! messages" are out of scope for the core). Concrete XML/HTTP delivery
//! lives in the agent binary; this crate only defines the message shapes
//! and the ordering the scheduler guarantees.

use netd_core::DeviceResult;

/// One lifecycle message, tagged with the owning job's `pid`. Transport
/// is best-effort (spec section 4.7): send failures are logged by the
/// implementation and never abort the job.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Start { pid: u32, agent_version: String },
    Nbip { pid: u32, count: u64 },
    Device { pid: u32, record: DeviceResult },
    End { pid: u32 },
    Exit { pid: u32 },
}

pub trait Reporter: Send + Sync {
    fn send(&self, message: Message);
}

/// Discards every message. Used where a job's output is not observed
/// (benchmarks, smoke tests).
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn send(&self, _message: Message) {}
}

/// Forwards every message to an unbounded channel. Used by tests that
/// assert on message order (spec section 8 scenarios).
#[derive(Debug, Clone)]
pub struct ChannelReporter(pub tokio::sync::mpsc::UnboundedSender<Message>);

impl ChannelReporter {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl Reporter for ChannelReporter {
    fn send(&self, message: Message) {
        // A closed receiver means nobody is listening any more; spec
        // section 4.7 treats transport failures as log-and-continue.
        let _ = self.0.send(message);
    }
}
