//! Core data model (spec section 3): ranges, credentials, jobs, and device results.

use crate::addr_iter::AddressIterator;
use crate::error::{Error, Result};
use crate::mac::normalize_mac;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

/// The SNMP security model a [`Credential`] authenticates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2c")]
    V2c,
    #[serde(rename = "3")]
    V3,
}

impl std::fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnmpVersion::V1 => write!(f, "1"),
            SnmpVersion::V2c => write!(f, "2c"),
            SnmpVersion::V3 => write!(f, "3"),
        }
    }
}

/// An SNMP credential to try against a device. Unique per `id` within a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub version: SnmpVersion,
    pub community: Option<String>,
    pub username: Option<String>,
    pub auth_password: Option<String>,
    pub auth_protocol: Option<String>,
    pub priv_password: Option<String>,
    pub priv_protocol: Option<String>,
}

/// An inclusive IPv4 scan range, optionally scoped to SNMP ports/domains,
/// tagged with an entity, and optionally set to replay mode via `walk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Range {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub entity: Option<String>,
    /// Replay mode: read SNMP responses from this file instead of the
    /// network. When set, only the SNMP probe runs for this range.
    #[serde(default)]
    pub walk: Option<PathBuf>,
}

impl Range {
    /// Attach a fresh cursor over this range's addresses. Iterator state
    /// is deliberately not stored on `Range` itself (section 3: "attached at scan
    /// time"), so sizing and scanning can each hold independent cursors.
    pub fn iter(&self) -> AddressIterator {
        AddressIterator::new(self.start, self.end)
    }

    pub fn is_replay(&self) -> bool {
        self.walk.is_some()
    }
}

/// A validated discovery assignment (section 3 Job, C5).
#[derive(Debug, Clone)]
pub struct Job {
    pub pid: u32,
    pub max_threads: u32,
    pub timeout: Duration,
    pub credentials: Vec<Credential>,
    pub ranges: Vec<Range>,
}

impl Job {
    /// Construct a job, enforcing the invariants of section 3: at least one
    /// range, `max_threads >= 1`, `timeout >= 1s`. Per-range structural
    /// validity (start <= end, non-zero block) is checked later by the
    /// address iterator during scheduler Phase A, not here.
    pub fn new(
        pid: u32,
        max_threads: u32,
        timeout: Duration,
        credentials: Vec<Credential>,
        ranges: Vec<Range>,
    ) -> Result<Self> {
        if ranges.is_empty() {
            return Err(Error::InvalidJob(format!(
                "job {pid} has no ranges with both start and end"
            )));
        }
        if max_threads < 1 {
            return Err(Error::InvalidJob(format!(
                "job {pid} max_threads must be >= 1"
            )));
        }
        if timeout.is_zero() {
            return Err(Error::InvalidJob(format!(
                "job {pid} timeout must be >= 1 second"
            )));
        }

        Ok(Self {
            pid,
            max_threads,
            timeout,
            credentials,
            ranges,
        })
    }
}

/// The optional fields fused into a candidate device record (section 3
/// DeviceResult). `merge` applies the fusion order of C3: a later probe's
/// `Some` field overwrites an earlier probe's.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceFields {
    pub mac: Option<String>,
    pub dns_hostname: Option<String>,
    pub snmp_hostname: Option<String>,
    pub netbios_name: Option<String>,
    pub workgroup: Option<String>,
    pub user_session: Option<String>,
    pub auth_snmp: Option<String>,
    pub auth_port: Option<u16>,
    pub auth_protocol: Option<String>,
    pub entity: Option<String>,
}

impl DeviceFields {
    /// Overlay `other` atop `self`: any field `other` sets wins. Used by
    /// fusion to apply probes in SNMP, NetBIOS, Ping, ARP order.
    pub fn merge(&mut self, other: DeviceFields) {
        macro_rules! overlay {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field;
                }
            };
        }
        overlay!(mac);
        overlay!(dns_hostname);
        overlay!(snmp_hostname);
        overlay!(netbios_name);
        overlay!(workgroup);
        overlay!(user_session);
        overlay!(auth_snmp);
        overlay!(auth_port);
        overlay!(auth_protocol);
        overlay!(entity);
    }

    /// section 3 acceptance invariant: at least one of MAC/SNMPHOSTNAME/
    /// DNSHOSTNAME/NETBIOSNAME must be present for the record to be
    /// reportable.
    pub fn has_minimum_information(&self) -> bool {
        self.mac.is_some()
            || self.snmp_hostname.is_some()
            || self.dns_hostname.is_some()
            || self.netbios_name.is_some()
    }

    /// Canonicalize the MAC field in place, if present.
    pub fn canonicalize_mac(&mut self) {
        if let Some(raw) = &self.mac {
            self.mac = normalize_mac(raw).or_else(|| self.mac.take());
        }
    }
}

/// A fused, acceptance-checked device record, ready to report (C7 DEVICE).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceResult {
    pub ip: Ipv4Addr,
    #[serde(flatten)]
    pub fields: DeviceFields,
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn range(start: &str, end: &str) -> Range {
        Range {
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            ports: vec![],
            domains: vec![],
            entity: None,
            walk: None,
        }
    }

    #[test]
    fn job_rejects_empty_ranges() {
        let err = Job::new(1, 4, Duration::from_secs(5), vec![cred("c1")], vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidJob(_)));
    }

    #[test]
    fn job_rejects_zero_threads() {
        let err = Job::new(
            1,
            0,
            Duration::from_secs(5),
            vec![],
            vec![range("10.0.0.1", "10.0.0.2")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidJob(_)));
    }

    #[test]
    fn job_rejects_zero_timeout() {
        let err = Job::new(
            1,
            4,
            Duration::from_secs(0),
            vec![],
            vec![range("10.0.0.1", "10.0.0.2")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidJob(_)));
    }

    #[test]
    fn merge_applies_later_overwrite_order() {
        let mut base = DeviceFields {
            dns_hostname: Some("from-ping".to_string()),
            ..Default::default()
        };
        let arp = DeviceFields {
            mac: Some("aa:bb:cc:dd:ee:ff".to_string()),
            dns_hostname: Some("from-arp".to_string()),
            ..Default::default()
        };
        base.merge(arp);
        assert_eq!(base.dns_hostname.as_deref(), Some("from-arp"));
        assert_eq!(base.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn acceptance_invariant_requires_identity_field() {
        let empty = DeviceFields::default();
        assert!(!empty.has_minimum_information());

        let with_mac = DeviceFields {
            mac: Some("aa:bb:cc:dd:ee:ff".to_string()),
            ..Default::default()
        };
        assert!(with_mac.has_minimum_information());
    }
}
