//! SNMP transport boundary (spec section 1: "the SNMP transport itself
//! (live and file-replay)" is an external collaborator). `SnmpTransport`
//! is the seam the core probe logic depends on; `LiveSnmpTransport` and
//! `FileReplaySnmpTransport` are the two concrete realizations spec
//! section 4.4 names.
//!
//! Grounded on `other_examples`' `unet-core` snmp.rs (session-per-query
//! shape) and `dmaynor-netdisco-rust`'s choice of the `snmp` crate, which
//! speaks SNMPv1/v2c only; v3 credentials are accepted by the data model
//! but always miss here (logged at debug, not an error).

use crate::trial::Trial;
use netd_core::{DeviceFields, SnmpVersion};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// OID for SNMPv2-MIB::sysName.0, used as the liveness/identity probe.
const SYS_NAME_OID: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 5, 0];
const DEFAULT_SNMP_PORT: u16 = 161;

/// A single SNMP query attempt against one trial. Implementations run
/// synchronously; callers wrap invocation in `spawn_blocking`.
pub trait SnmpTransport: Send + Sync {
    fn query(&self, ip: Ipv4Addr, trial: &Trial, timeout: Duration) -> Option<DeviceFields>;
}

/// Queries the network directly via SNMPv1/v2c GET.
#[derive(Debug, Default)]
pub struct LiveSnmpTransport;

impl SnmpTransport for LiveSnmpTransport {
    fn query(&self, ip: Ipv4Addr, trial: &Trial, timeout: Duration) -> Option<DeviceFields> {
        if trial.credential.version == SnmpVersion::V3 {
            debug!(%ip, credential = %trial.credential.id, "SNMPv3 credential unsupported by this transport, skipping");
            return None;
        }
        let community = trial.credential.community.as_deref().unwrap_or_default();
        let port = trial.port.unwrap_or(DEFAULT_SNMP_PORT);
        let addr = SocketAddr::new(ip.into(), port);

        let mut session = match snmp::SyncSession::new(addr, community.as_bytes(), Some(timeout), 0) {
            Ok(session) => session,
            Err(e) => {
                debug!(%ip, port, error = %e, "failed to open SNMP session");
                return None;
            }
        };

        let response = match session.get(SYS_NAME_OID) {
            Ok(pdu) => pdu,
            Err(e) => {
                debug!(%ip, port, credential = %trial.credential.id, error = ?e, "SNMP GET failed");
                return None;
            }
        };

        response
            .varbinds
            .clone()
            .find_map(|(_oid, value)| match value {
                snmp::Value::OctetString(bytes) => {
                    Some(String::from_utf8_lossy(bytes).trim().to_string())
                }
                _ => None,
            })
            .filter(|name| !name.is_empty())
            .map(|snmp_hostname| DeviceFields {
                snmp_hostname: Some(snmp_hostname),
                ..Default::default()
            })
    }
}

/// Replays recorded SNMP responses from a file instead of the network
/// (spec section 3/4.4 `walk` mode). The file is newline-delimited JSON,
/// one `{"ip": ..., fields...}` record per line; any trial against a
/// recorded address returns that record, independent of port/domain.
#[derive(Debug, Default)]
pub struct FileReplaySnmpTransport {
    records: HashMap<Ipv4Addr, DeviceFields>,
}

impl FileReplaySnmpTransport {
    pub fn from_file(path: &Path) -> netd_core::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut records = HashMap::new();
        for (lineno, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: ReplayRecord = serde_json::from_str(line).map_err(|e| {
                netd_core::Error::Serialization(format!(
                    "{}:{}: {e}",
                    path.display(),
                    lineno + 1
                ))
            })?;
            records.insert(record.ip, record.fields);
        }
        Ok(Self { records })
    }
}

impl SnmpTransport for FileReplaySnmpTransport {
    fn query(&self, ip: Ipv4Addr, _trial: &Trial, _timeout: Duration) -> Option<DeviceFields> {
        self.records.get(&ip).cloned()
    }
}

#[derive(serde::Deserialize)]
struct ReplayRecord {
    ip: Ipv4Addr,
    #[serde(flatten)]
    fields: DeviceFields,
}

#[cfg(test)]
mod tests {
    use super::*;
    use netd_core::{Credential, SnmpVersion};
    use std::io::Write;

    fn trial() -> Trial {
        Trial {
            port: None,
            domain: None,
            credential: Credential {
                id: "c1".to_string(),
                version: SnmpVersion::V2c,
                community: Some("public".to_string()),
                username: None,
                auth_password: None,
                auth_protocol: None,
                priv_password: None,
                priv_protocol: None,
            },
        }
    }

    #[test]
    fn file_replay_returns_recorded_fields_for_known_address() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"ip": "10.0.0.5", "snmp_hostname": "switch1"}}"#).unwrap();
        let transport = FileReplaySnmpTransport::from_file(file.path()).unwrap();

        let hit = transport.query("10.0.0.5".parse().unwrap(), &trial(), Duration::from_secs(1));
        assert_eq!(hit.unwrap().snmp_hostname.as_deref(), Some("switch1"));

        let miss = transport.query("10.0.0.6".parse().unwrap(), &trial(), Duration::from_secs(1));
        assert!(miss.is_none());
    }

    #[test]
    fn live_transport_skips_v3_credentials() {
        let mut t = trial();
        t.credential.version = SnmpVersion::V3;
        let result = LiveSnmpTransport.query(
            "127.0.0.1".parse().unwrap(),
            &t,
            Duration::from_millis(50),
        );
        assert!(result.is_none());
    }
}
