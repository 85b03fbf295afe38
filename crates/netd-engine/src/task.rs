//! Discovery task (spec section 1/9): ties job assembly, the scheduler
//! run, and abort handling together the way the outer task framework
//! (`isEnabled`/`run`/`abort`, out of scope here) is expected to call it.

use crate::abort::AbortFlag;
use crate::reporting::{Message, Reporter};
use crate::scheduler::{self, RunSummary};
use netd_core::Job;
use netd_net::ProbeCapabilities;
use std::sync::Arc;
use std::time::Duration;

/// A validated set of jobs ready to run, plus the abort handle the outer
/// framework (or a signal handler) can flip to request a graceful stop.
pub struct DiscoveryTask {
    jobs: Vec<Job>,
    reporter: Arc<dyn Reporter>,
    capabilities: ProbeCapabilities,
    agent_version: String,
    target_expiration: Duration,
    abort: AbortFlag,
    current_pid: Option<u32>,
}

impl DiscoveryTask {
    /// `isEnabled`-time assembly: a task is only constructed once at
    /// least one job survived validation (spec section 4.5); an empty
    /// `jobs` list means the caller should disable the task entirely.
    pub fn new(
        jobs: Vec<Job>,
        reporter: Arc<dyn Reporter>,
        capabilities: ProbeCapabilities,
        agent_version: String,
        target_expiration: Duration,
    ) -> Self {
        let current_pid = jobs.first().map(|j| j.pid);
        Self {
            jobs,
            reporter,
            capabilities,
            agent_version,
            target_expiration,
            abort: AbortFlag::new(),
            current_pid,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn abort_handle(&self) -> AbortFlag {
        self.abort.clone()
    }

    /// Run every job to completion or abort.
    pub async fn run(self) -> RunSummary {
        scheduler::run(
            self.jobs,
            self.reporter,
            self.abort,
            self.capabilities,
            &self.agent_version,
            self.target_expiration,
        )
        .await
    }

    /// Direct `abort()` entry point (spec section 4.9): invoked by the
    /// outer framework tearing the task down outside a running job. Emits
    /// an END for the current `pid`, if one was set, rather than an EXIT.
    pub fn abort(&self) {
        self.abort.set();
        if let Some(pid) = self.current_pid {
            self.reporter.send(Message::End { pid });
        }
    }
}
