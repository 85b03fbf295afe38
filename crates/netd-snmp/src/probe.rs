//! SNMP probe orchestration (C2 SNMP, C4): walks a trial list against a
//! transport until one hit returns structured device info.
//!
//! Grounded on spec section 4.4: "the first trial that returns structured
//! device info wins... Transport/credential failures are logged at debug
//! and treated as non-terminal: iteration continues."

use crate::trial::Trial;
use crate::transport::SnmpTransport;
use netd_core::DeviceFields;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct SnmpProbe {
    transport: Arc<dyn SnmpTransport>,
    timeout: Duration,
}

impl SnmpProbe {
    pub fn new(transport: Arc<dyn SnmpTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Try each trial in order against `ip`. The first hit is annotated
    /// with AUTHSNMP/AUTHPORT/AUTHPROTOCOL and returned; a trial list
    /// that exhausts without a hit yields an empty (default) record.
    pub async fn probe(&self, ip: Ipv4Addr, trials: &[Trial]) -> DeviceFields {
        for trial in trials {
            let transport = Arc::clone(&self.transport);
            let timeout = self.timeout;
            let trial_owned = trial.clone();
            let ip_copy = ip;
            let hit = tokio::task::spawn_blocking(move || transport.query(ip_copy, &trial_owned, timeout))
                .await
                .unwrap_or(None);

            let Some(mut fields) = hit else {
                debug!(%ip, credential = %trial.credential.id, "SNMP trial missed");
                continue;
            };

            fields.auth_snmp = Some(trial.credential.id.clone());
            fields.auth_port = trial.port;
            fields.auth_protocol = trial.domain.clone();
            return fields;
        }
        DeviceFields::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::build_trials;
    use netd_core::{Credential, Range, SnmpVersion};

    struct StubTransport {
        hit_credential_id: String,
    }

    impl SnmpTransport for StubTransport {
        fn query(&self, _ip: Ipv4Addr, trial: &Trial, _timeout: Duration) -> Option<DeviceFields> {
            if trial.credential.id == self.hit_credential_id {
                Some(DeviceFields {
                    snmp_hostname: Some("switch1".to_string()),
                    ..Default::default()
                })
            } else {
                None
            }
        }
    }

    fn cred(id: &str) -> Credential {
        Credential {
            id: id.to_string(),
            version: SnmpVersion::V2c,
            community: Some("public".to_string()),
            username: None,
            auth_password: None,
            auth_protocol: None,
            priv_password: None,
            priv_protocol: None,
        }
    }

    #[tokio::test]
    async fn first_hit_wins_and_is_annotated() {
        let range = Range {
            start: "10.0.0.1".parse().unwrap(),
            end: "10.0.0.1".parse().unwrap(),
            ports: vec![161, 1161],
            domains: vec![],
            entity: None,
            walk: None,
        };
        let trials = build_trials(&range, &[cred("c1"), cred("c2")]);
        let transport: Arc<dyn SnmpTransport> = Arc::new(StubTransport {
            hit_credential_id: "c2".to_string(),
        });
        let probe = SnmpProbe::new(transport, Duration::from_secs(1));

        let fields = probe.probe("10.0.0.1".parse().unwrap(), &trials).await;
        assert_eq!(fields.snmp_hostname.as_deref(), Some("switch1"));
        assert_eq!(fields.auth_snmp.as_deref(), Some("c2"));
        assert_eq!(fields.auth_port, Some(161));
    }

    #[tokio::test]
    async fn exhausting_all_trials_yields_empty_record() {
        let range = Range {
            start: "10.0.0.1".parse().unwrap(),
            end: "10.0.0.1".parse().unwrap(),
            ports: vec![],
            domains: vec![],
            entity: None,
            walk: None,
        };
        let trials = build_trials(&range, &[cred("c1")]);
        let transport: Arc<dyn SnmpTransport> = Arc::new(StubTransport {
            hit_credential_id: "nonexistent".to_string(),
        });
        let probe = SnmpProbe::new(transport, Duration::from_secs(1));

        let fields = probe.probe("10.0.0.1".parse().unwrap(), &trials).await;
        assert_eq!(fields, DeviceFields::default());
    }
}
