//! Job assembly (C5): parses the inbound job specification and applies
//! spec section 4.5's validation rules. The inbound shape mirrors
//! section 6's `isEnabled` description (`RANGEIP`, `PARAM`,
//! `AUTHENTICATION`); the outer task framework that actually delivers it
//! is out of scope, so this module stands in as the boundary that reads
//! the file the framework would otherwise hand us.

use netd_core::{Credential, Job, Range};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
pub struct JobSpecFile {
    pub options: Vec<OptionSpec>,
}

#[derive(Debug, Deserialize)]
pub struct OptionSpec {
    #[serde(rename = "RANGEIP")]
    pub rangeip: Vec<RangeSpec>,
    #[serde(rename = "PARAM")]
    pub param: Vec<ParamSpec>,
    #[serde(rename = "AUTHENTICATION", default)]
    pub authentication: Vec<Credential>,
}

#[derive(Debug, Deserialize)]
pub struct RangeSpec {
    #[serde(rename = "IPSTART")]
    pub ip_start: Option<String>,
    #[serde(rename = "IPEND")]
    pub ip_end: Option<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "PID")]
    pub pid: Option<u32>,
    #[serde(rename = "THREADS_DISCOVERY", default)]
    pub threads_discovery: Option<u32>,
    #[serde(rename = "TIMEOUT", default)]
    pub timeout: Option<u64>,
}

const DEFAULT_MAX_THREADS: u32 = 4;
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Build the job list from a parsed spec file (spec section 4.5): each
/// option needs a `PARAM` with a defined `PID` and at least one range
/// with both `IPSTART` and `IPEND`; invalid ranges are dropped, and an
/// option that ends up with zero valid ranges is dropped entirely. A
/// spec file that yields no jobs disables the task.
pub fn assemble_jobs(spec: JobSpecFile) -> Vec<Job> {
    let mut jobs = Vec::new();

    for option in spec.options {
        let Some(param) = option.param.first() else {
            debug!("option has no PARAM record, skipping");
            continue;
        };
        let Some(pid) = param.pid else {
            debug!("option's PARAM has no PID, skipping");
            continue;
        };

        let ranges: Vec<Range> = option
            .rangeip
            .into_iter()
            .filter_map(|r| build_range(pid, r))
            .collect();

        if ranges.is_empty() {
            warn!(pid, "job has no valid range, dropping");
            continue;
        }

        let max_threads = param.threads_discovery.unwrap_or(DEFAULT_MAX_THREADS);
        let timeout = std::time::Duration::from_secs(param.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));

        match Job::new(pid, max_threads, timeout, option.authentication, ranges) {
            Ok(job) => jobs.push(job),
            Err(e) => warn!(pid, error = %e, "job failed validation, dropping"),
        }
    }

    jobs
}

fn build_range(pid: u32, spec: RangeSpec) -> Option<Range> {
    let start = spec.ip_start?.parse().ok()?;
    let end = spec.ip_end?.parse().ok()?;
    if start > end {
        warn!(pid, "dropping range with start > end");
        return None;
    }
    Some(Range {
        start,
        end,
        ports: spec.ports,
        domains: spec.domains,
        entity: spec.entity,
        walk: spec.file,
    })
}
