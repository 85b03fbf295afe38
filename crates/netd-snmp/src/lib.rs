//! SNMP probing: the credential trial cross-product (C4) and the
//! transport boundary (live network vs. file-replay) it is run against.

pub mod probe;
pub mod transport;
pub mod trial;

pub use probe::SnmpProbe;
pub use transport::{FileReplaySnmpTransport, LiveSnmpTransport, SnmpTransport};
pub use trial::{build_trials, Trial};
