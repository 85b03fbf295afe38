//! Explicit probe capability set (REDESIGN FLAGS: "library presence as a
//! feature flag" replaced with a config/detection-derived struct built once
//! at startup and threaded through fusion, rather than re-checking "is the
//! library loaded" on every probe).

use crate::arp::ArpCommand;

/// Which of the non-SNMP C2 probes are available for this run.
#[derive(Debug, Clone)]
pub struct ProbeCapabilities {
    pub arp: Option<ArpCommand>,
    pub ping: bool,
    pub netbios: bool,
}

impl ProbeCapabilities {
    /// Detect capabilities once at startup: ARP needs a working
    /// `arp`/`ip neighbor` command, ping needs raw socket privilege,
    /// NetBIOS just needs a bindable UDP socket (checked lazily per probe).
    pub fn detect() -> Self {
        Self {
            arp: ArpCommand::detect(),
            ping: crate::privilege::has_raw_socket_capability(),
            netbios: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_does_not_panic() {
        let _ = ProbeCapabilities::detect();
    }
}
