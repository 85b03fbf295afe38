//! SNMP credential trial list construction (C4).
//!
//! Grounded on spec section 4.4's scenario S4: trials are the cross-product
//! of a range's ports and credentials, replicated once per configured
//! domain, walked in that nesting order so the first hit annotates
//! AUTHPORT/AUTHPROTOCOL deterministically.

use netd_core::{Credential, Range};

/// One attempt: an optional port, an optional protocol domain, and the
/// credential to authenticate with. `None` port/domain mean "transport
/// default" (161, no explicit domain).
#[derive(Debug, Clone)]
pub struct Trial {
    pub port: Option<u16>,
    pub domain: Option<String>,
    pub credential: Credential,
}

/// Build the trial list for a range: ports x credentials, then replicated
/// per domain. A range with no ports or no domains contributes a single
/// `None` in that position rather than zero trials.
pub fn build_trials(range: &Range, credentials: &[Credential]) -> Vec<Trial> {
    let ports: Vec<Option<u16>> = if range.ports.is_empty() {
        vec![None]
    } else {
        range.ports.iter().copied().map(Some).collect()
    };
    let domains: Vec<Option<String>> = if range.domains.is_empty() {
        vec![None]
    } else {
        range.domains.iter().cloned().map(Some).collect()
    };

    let mut trials = Vec::with_capacity(ports.len() * credentials.len() * domains.len());
    for domain in &domains {
        for port in &ports {
            for credential in credentials {
                trials.push(Trial {
                    port: *port,
                    domain: domain.clone(),
                    credential: credential.clone(),
                });
            }
        }
    }
    trials
}
