//! Scheduler (C6): Phase A pre-sizes every range in parallel, Phase B
//! derives the global deadline, and Phase C runs a bounded worker pool
//! with per-job fairness and in-flight caps until every job completes or
//! the run is aborted (spec section 4.6).

use crate::abort::AbortFlag;
use crate::expiration::{compute_deadline, format_remaining, JobSizing};
use crate::fusion::{fuse, Probes};
use crate::reporting::{Message, Reporter};
use netd_core::{Credential, DeviceResult, Job, Range};
use netd_net::{ArpProbe, NetBiosProbe, PingProbe, ProbeCapabilities};
use netd_snmp::{build_trials, FileReplaySnmpTransport, LiveSnmpTransport, SnmpProbe, SnmpTransport};
use std::collections::{BTreeMap, VecDeque};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// One range still being walked, paired with the iterator and the SNMP
/// transport resolved for it (live, or file-replay if `walk` is set).
struct RangeCursor {
    range: Range,
    iter: netd_core::AddressIterator,
    transport: Arc<dyn SnmpTransport>,
}

/// Per-job runtime state (spec section 3 QueueState).
struct QueueState {
    max_in_queue: u32,
    in_queue: u32,
    timeout: Duration,
    credentials: Vec<Credential>,
    ranges: VecDeque<RangeCursor>,
    size: u64,
    done: u64,
    started: bool,
}

/// Work handed to one address-probing worker task.
struct AddressTask {
    ip: Ipv4Addr,
    timeout: Duration,
    credentials: Vec<Credential>,
    ports: Vec<u16>,
    domains: Vec<String>,
    entity: Option<String>,
    transport: Arc<dyn SnmpTransport>,
    replay: bool,
    capabilities: ProbeCapabilities,
}

async fn run_address_task(task: AddressTask) -> Option<DeviceResult> {
    let trial_range = Range {
        start: task.ip,
        end: task.ip,
        ports: task.ports,
        domains: task.domains,
        entity: None,
        walk: None,
    };
    let trials = build_trials(&trial_range, &task.credentials);
    let snmp_probe = SnmpProbe::new(Arc::clone(&task.transport), task.timeout);
    let netbios_probe = NetBiosProbe::new(task.timeout);
    let ping_probe = PingProbe::new(task.timeout);
    let arp_probe = task.capabilities.arp.map(ArpProbe::new);

    fuse(
        task.ip,
        Probes {
            capabilities: &task.capabilities,
            snmp: Some(&snmp_probe),
            snmp_trials: &trials,
            netbios: Some(&netbios_probe),
            ping: Some(&ping_probe),
            arp: arp_probe.as_ref(),
            entity: task.entity.as_deref(),
            replay: task.replay,
        },
    )
    .await
}

fn resolve_transport(walk: &Option<PathBuf>) -> Option<Arc<dyn SnmpTransport>> {
    match walk {
        None => Some(Arc::new(LiveSnmpTransport)),
        Some(path) => match FileReplaySnmpTransport::from_file(path) {
            Ok(transport) => Some(Arc::new(transport)),
            Err(e) => {
                warn!(?path, error = %e, "failed to load SNMP replay file, dropping range");
                None
            }
        },
    }
}

/// Pull the next address out of a job's current range, popping exhausted
/// ranges until one yields an address or the job is out of ranges.
fn next_dispatch(queue: &mut QueueState, capabilities: &ProbeCapabilities) -> Option<AddressTask> {
    loop {
        let cursor = queue.ranges.front_mut()?;
        let Some(ip) = cursor.iter.current() else {
            queue.ranges.pop_front();
            continue;
        };
        let task = AddressTask {
            ip,
            timeout: queue.timeout,
            credentials: queue.credentials.clone(),
            ports: cursor.range.ports.clone(),
            domains: cursor.range.domains.clone(),
            entity: cursor.range.entity.clone(),
            transport: Arc::clone(&cursor.transport),
            replay: cursor.range.walk.is_some(),
            capabilities: capabilities.clone(),
        };
        cursor.iter.advance();
        if cursor.iter.is_exhausted() {
            queue.ranges.pop_front();
        }
        return Some(task);
    }
}

fn handle_completion(
    pid: u32,
    result: Option<DeviceResult>,
    queues: &mut BTreeMap<u32, QueueState>,
    reporter: &dyn Reporter,
) {
    let Some(queue) = queues.get_mut(&pid) else {
        return;
    };
    queue.in_queue = queue.in_queue.saturating_sub(1);
    queue.done += 1;
    if let Some(record) = result {
        reporter.send(Message::Device { pid, record });
    }
    if queue.done == queue.size {
        reporter.send(Message::End { pid });
        queues.remove(&pid);
        // Redundant-END convention (spec section 4.6/9): the protocol
        // expects the final message twice on normal completion.
        reporter.send(Message::End { pid });
    }
}

/// Outcome of one scheduler run, for tests and operational logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub aborted: bool,
    pub in_flight_at_abort: usize,
}

/// Run every job to completion or abort (spec section 4.6 Phase A-C).
pub async fn run(
    jobs: Vec<Job>,
    reporter: Arc<dyn Reporter>,
    abort: AbortFlag,
    capabilities: ProbeCapabilities,
    agent_version: &str,
    target_expiration: Duration,
) -> RunSummary {
    // Phase A: size every range, resolve its transport, drop invalid ones.
    let mut queues: BTreeMap<u32, QueueState> = BTreeMap::new();
    for job in jobs {
        let mut cursors = VecDeque::new();
        let mut size = 0u64;
        for range in job.ranges {
            let iter = range.iter();
            let range_size = iter.size();
            if range_size == 0 {
                warn!(pid = job.pid, "dropping structurally invalid or empty range");
                continue;
            }
            let Some(transport) = resolve_transport(&range.walk) else {
                continue;
            };
            size += range_size;
            cursors.push_back(RangeCursor { range, iter, transport });
        }

        if size == 0 {
            reporter.send(Message::Start { pid: job.pid, agent_version: agent_version.to_string() });
            reporter.send(Message::Nbip { pid: job.pid, count: 0 });
            reporter.send(Message::End { pid: job.pid });
            reporter.send(Message::End { pid: job.pid });
            continue;
        }

        queues.insert(
            job.pid,
            QueueState {
                max_in_queue: job.max_threads,
                in_queue: 0,
                timeout: job.timeout,
                credentials: job.credentials,
                ranges: cursors,
                size,
                done: 0,
                started: false,
            },
        );
    }

    if queues.is_empty() {
        return RunSummary { aborted: false, in_flight_at_abort: 0 };
    }

    // Phase B: global deadline.
    let now = Instant::now();
    let sizings: Vec<JobSizing> = queues
        .values()
        .map(|q| JobSizing { size: q.size, timeout: q.timeout })
        .collect();
    let deadline = compute_deadline(now, &sizings, target_expiration);
    debug!(?deadline.deadline, "scheduler deadline computed");

    // Phase C: bounded worker pool. W = min(sum of per-job maxInQueue, total
    // addresses): the aggregate cap is a sum, not a max, so independent jobs
    // each get their own concurrency budget instead of contending for one.
    let sum_max_in_queue: u64 = queues.values().map(|q| q.max_in_queue as u64).sum();
    let total_addresses: u64 = queues.values().map(|q| q.size).sum();
    let worker_count = sum_max_in_queue.min(total_addresses).max(1) as usize;

    let mut join_set: JoinSet<(u32, Option<DeviceResult>)> = JoinSet::new();
    let mut last_log = Instant::now();
    let mut aborted = false;

    'dispatch: loop {
        if queues.is_empty() {
            break;
        }

        if last_log.elapsed() >= Duration::from_secs(600) {
            let remaining = deadline.deadline.saturating_duration_since(Instant::now());
            info!(remaining = %format_remaining(remaining), "scan deadline approaching");
            last_log = Instant::now();
        }

        if Instant::now() >= deadline.deadline || abort.is_set() {
            aborted = true;
            break 'dispatch;
        }

        let mut dispatched_any = false;
        if join_set.len() < worker_count {
            let pids: Vec<u32> = queues.keys().copied().collect();
            for pid in pids {
                if join_set.len() >= worker_count {
                    break;
                }
                let queue = queues.get_mut(&pid).expect("pid came from queues.keys()");
                if queue.in_queue >= queue.max_in_queue {
                    continue;
                }
                let Some(task) = next_dispatch(queue, &capabilities) else {
                    continue;
                };

                if !queue.started {
                    reporter.send(Message::Start { pid, agent_version: agent_version.to_string() });
                    reporter.send(Message::Nbip { pid, count: queue.size });
                    queue.started = true;
                }
                queue.in_queue += 1;
                dispatched_any = true;

                join_set.spawn(async move {
                    let result = run_address_task(task).await;
                    (pid, result)
                });
            }
        }

        if dispatched_any {
            while let Some(res) = join_set.try_join_next() {
                if let Ok((pid, result)) = res {
                    handle_completion(pid, result, &mut queues, reporter.as_ref());
                }
            }
        } else {
            tokio::select! {
                res = join_set.join_next(), if !join_set.is_empty() => {
                    if let Some(Ok((pid, result))) = res {
                        handle_completion(pid, result, &mut queues, reporter.as_ref());
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
        }
    }

    let in_flight_at_abort = join_set.len();
    if aborted && in_flight_at_abort > 0 {
        info!(in_flight_at_abort, "devices scan result missed");
    }

    while let Some(res) = join_set.join_next().await {
        if let Ok((pid, result)) = res {
            handle_completion(pid, result, &mut queues, reporter.as_ref());
        }
    }

    if aborted {
        for pid in queues.keys().copied().collect::<Vec<_>>() {
            reporter.send(Message::Exit { pid });
        }
    }

    RunSummary { aborted, in_flight_at_abort }
}

