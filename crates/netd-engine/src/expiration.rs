//! Expiration logic (C8): deadline derivation from address count and
//! per-address budgets (spec section 4.6 Phase B, 4.8), plus the
//! human-readable remaining-time formatting used by the periodic log.

use std::time::{Duration, Instant};

/// One job's contribution to the deadline sum: its total address count
/// and its declared per-address timeout.
#[derive(Debug, Clone, Copy)]
pub struct JobSizing {
    pub size: u64,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub min_deadline: Instant,
    pub deadline: Instant,
}

/// `minTimeout = 1 + sum(size * timeout)`, `minDeadline = now + minTimeout`.
/// Effective deadline is `max(now + totalAddresses * targetExpiration, minDeadline)`
/// (spec section 4.6 Phase B / section 8 invariant 7). `target_expiration`
/// is assumed already floored at the configured minimum.
pub fn compute_deadline(now: Instant, jobs: &[JobSizing], target_expiration: Duration) -> Deadline {
    let min_timeout_secs = 1 + jobs
        .iter()
        .map(|j| j.size.saturating_mul(j.timeout.as_secs()))
        .fold(0u64, u64::saturating_add);
    let min_deadline = now + Duration::from_secs(min_timeout_secs);

    let total_addresses: u64 = jobs.iter().map(|j| j.size).sum();
    let target_deadline_secs = target_expiration.as_secs().saturating_mul(total_addresses);
    let target_deadline = now + Duration::from_secs(target_deadline_secs);

    Deadline {
        min_deadline,
        deadline: target_deadline.max(min_deadline),
    }
}

/// Human-readable remaining time for the periodic (every 600s) expiration
/// log, per spec section 4.6: hours with one decimal above 2h, minute
/// counts between 10 and 59, "few minutes" for single-digit minutes, and
/// "soon" once under a minute remains.
pub fn format_remaining(remaining: Duration) -> String {
    let total_secs = remaining.as_secs();
    let minutes = total_secs as f64 / 60.0;
    let hours = minutes / 60.0;

    if hours > 2.0 {
        format!("{hours:.1} hour")
    } else if total_secs <= 60 {
        "soon".to_string()
    } else if minutes < 10.0 {
        "few minutes".to_string()
    } else if minutes < 60.0 {
        format!("{} minutes", minutes as u64)
    } else {
        format!("{hours:.1} hour")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_deadline_sums_size_times_timeout_plus_one() {
        let now = Instant::now();
        let jobs = vec![
            JobSizing { size: 2, timeout: Duration::from_secs(5) },
            JobSizing { size: 3, timeout: Duration::from_secs(2) },
        ];
        let result = compute_deadline(now, &jobs, Duration::from_secs(60));
        // min_timeout = 1 + (2*5) + (3*2) = 17
        assert_eq!(result.min_deadline, now + Duration::from_secs(17));
    }

    #[test]
    fn effective_deadline_uses_target_expiration_when_larger() {
        let now = Instant::now();
        let jobs = vec![JobSizing { size: 100, timeout: Duration::from_secs(1) }];
        let result = compute_deadline(now, &jobs, Duration::from_secs(60));
        // target: 100 * 60 = 6000s, min: 1 + 100 = 101s. Target wins.
        assert_eq!(result.deadline, now + Duration::from_secs(6000));
    }

    #[test]
    fn effective_deadline_never_drops_below_min_deadline() {
        let now = Instant::now();
        let jobs = vec![JobSizing { size: 1, timeout: Duration::from_secs(10_000) }];
        let result = compute_deadline(now, &jobs, Duration::from_secs(60));
        // min: 1 + 10000 = 10001s, target: 1*60 = 60s. Min wins.
        assert_eq!(result.deadline, result.min_deadline);
        assert_eq!(result.deadline, now + Duration::from_secs(10_001));
    }

    #[test]
    fn format_remaining_boundaries() {
        assert_eq!(format_remaining(Duration::from_secs(30)), "soon");
        assert_eq!(format_remaining(Duration::from_secs(5 * 60)), "few minutes");
        assert_eq!(format_remaining(Duration::from_secs(30 * 60)), "30 minutes");
        assert_eq!(format_remaining(Duration::from_secs(3 * 3600)), "3.0 hour");
    }
}
