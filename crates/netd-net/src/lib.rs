//! ARP, ICMP ping, and NetBIOS single-address probes (spec section 4.2,
//! minus SNMP which lives in `netd-snmp`).

pub mod arp;
pub mod capabilities;
pub mod netbios;
pub mod ping;
pub mod privilege;

pub use arp::{ArpCommand, ArpProbe};
pub use capabilities::ProbeCapabilities;
pub use netbios::NetBiosProbe;
pub use ping::PingProbe;
