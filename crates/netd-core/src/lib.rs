//! Core types, error handling, and configuration for the network discovery agent.
//!
//! This crate holds the data model (spec section 3) and the address
//! iterator (C1); everything that fuses probes, schedules jobs, and talks
//! to the server lives in `netd-engine`.

pub mod addr_iter;
pub mod config;
pub mod error;
pub mod mac;
pub mod types;

pub use addr_iter::AddressIterator;
pub use config::{Config, SnmpConfig, MIN_TARGET_EXPIRATION_SECS};
pub use error::{Error, Result};
pub use mac::{is_canonical_mac, normalize_mac};
pub use types::{Credential, DeviceFields, DeviceResult, Job, Range, SnmpVersion};
