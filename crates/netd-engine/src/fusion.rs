//! Probe fusion (C3): invoke every probe whose transport is available for
//! one address, merge partial records in SNMP, NetBIOS, Ping, ARP order,
//! and apply the minimum-information acceptance rule (spec section 3/4.3).

use netd_core::{DeviceFields, DeviceResult};
use netd_net::{ArpProbe, NetBiosProbe, PingProbe, ProbeCapabilities};
use netd_snmp::{SnmpProbe, Trial};
use std::net::Ipv4Addr;

/// The probes and trial list available for one address's fusion pass.
/// `replay` mirrors a range's `walk` setting: only SNMP runs.
pub struct Probes<'a> {
    pub capabilities: &'a ProbeCapabilities,
    pub snmp: Option<&'a SnmpProbe>,
    pub snmp_trials: &'a [Trial],
    pub netbios: Option<&'a NetBiosProbe>,
    pub ping: Option<&'a PingProbe>,
    pub arp: Option<&'a ArpProbe>,
    pub entity: Option<&'a str>,
    pub replay: bool,
}

/// Run every available probe against `ip`, merge their partial records,
/// and return a fused [`DeviceResult`] iff the acceptance invariant holds.
pub async fn fuse(ip: Ipv4Addr, probes: Probes<'_>) -> Option<DeviceResult> {
    let mut fields = DeviceFields::default();

    if let Some(snmp) = probes.snmp {
        fields.merge(snmp.probe(ip, probes.snmp_trials).await);
    }

    if !probes.replay {
        if probes.capabilities.netbios {
            if let Some(netbios) = probes.netbios {
                fields.merge(netbios.probe(ip).await);
            }
        }
        if probes.capabilities.ping {
            if let Some(ping) = probes.ping {
                fields.merge(ping.probe(ip).await);
            }
        }
        if probes.capabilities.arp.is_some() {
            if let Some(arp) = probes.arp {
                fields.merge(arp.probe(ip).await);
            }
        }
    }

    fields.canonicalize_mac();
    fields.entity = probes.entity.map(String::from);

    if !fields.has_minimum_information() {
        return None;
    }

    Some(DeviceResult { ip, fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_probes_available_yields_no_record() {
        let capabilities = ProbeCapabilities { arp: None, ping: false, netbios: false };
        let result = fuse(
            "10.0.0.1".parse().unwrap(),
            Probes {
                capabilities: &capabilities,
                snmp: None,
                snmp_trials: &[],
                netbios: None,
                ping: None,
                arp: None,
                entity: None,
                replay: false,
            },
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn entity_tag_is_stamped_even_without_probes_but_record_still_rejected() {
        let capabilities = ProbeCapabilities { arp: None, ping: false, netbios: false };
        let result = fuse(
            "10.0.0.1".parse().unwrap(),
            Probes {
                capabilities: &capabilities,
                snmp: None,
                snmp_trials: &[],
                netbios: None,
                ping: None,
                arp: None,
                entity: Some("site-a"),
                replay: false,
            },
        )
        .await;
        // Entity alone doesn't satisfy the minimum-information invariant.
        assert!(result.is_none());
    }
}
