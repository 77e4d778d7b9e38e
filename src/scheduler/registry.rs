//! Scheduled-job registry
//!
//! Bookkeeping for every active job: its spec, when it fires next, whether
//! a run is in flight, and how many consecutive runs have failed. The
//! registry is owned and mutated only by the scheduler engine; everything
//! else sees immutable specs.

use std::collections::BTreeMap;
use tokio::time::Instant;

use crate::config::JobSpec;

/// Why a due job was not dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The previous run of the same job is still in flight
    StillRunning,
    /// The fire arrived later than the misfire grace allows
    Misfired,
}

/// A job admitted into the schedule
#[derive(Debug)]
pub struct ScheduledJob {
    spec: JobSpec,
    next_fire: Instant,
    running: bool,
    consecutive_failures: u32,
}

impl ScheduledJob {
    fn new(spec: JobSpec, next_fire: Instant) -> Self {
        Self {
            spec,
            next_fire,
            running: false,
            consecutive_failures: 0,
        }
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn next_fire(&self) -> Instant {
        self.next_fire
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Advance past `now` by whole intervals so a stalled loop does not
    /// replay a backlog of fires.
    fn advance(&mut self, now: Instant) {
        while self.next_fire <= now {
            self.next_fire += self.spec.interval();
        }
    }
}

/// All active jobs, keyed by name
#[derive(Debug, Default)]
pub struct Registry {
    jobs: BTreeMap<String, ScheduledJob>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ScheduledJob> {
        self.jobs.get(name)
    }

    /// Admit a job with an explicit first fire time.
    ///
    /// An already-registered name is left untouched so a reload can never
    /// duplicate or reset an existing job.
    pub fn admit(&mut self, spec: JobSpec, first_fire: Instant) -> bool {
        if self.jobs.contains_key(spec.name()) {
            return false;
        }
        self.jobs
            .insert(spec.name().to_string(), ScheduledJob::new(spec, first_fire));
        true
    }

    /// Latest known fire time across the registry, used to stagger newly
    /// admitted jobs after everything already scheduled.
    pub fn last_fire_time(&self, now: Instant) -> Instant {
        self.jobs
            .values()
            .map(ScheduledJob::next_fire)
            .max()
            .unwrap_or(now)
    }

    /// Collect due jobs, advancing each one's next fire.
    ///
    /// Returns the specs to dispatch now plus the fires that were dropped,
    /// either because the job was still running or because the fire was
    /// later than `grace`.
    pub fn take_due(
        &mut self,
        now: Instant,
        grace: std::time::Duration,
    ) -> (Vec<JobSpec>, Vec<(String, SkipReason)>) {
        let mut due = Vec::new();
        let mut skipped = Vec::new();

        for job in self.jobs.values_mut() {
            if job.next_fire > now {
                continue;
            }
            let lateness = now - job.next_fire;
            job.advance(now);

            if job.running {
                skipped.push((job.spec.name().to_string(), SkipReason::StillRunning));
            } else if lateness > grace {
                skipped.push((job.spec.name().to_string(), SkipReason::Misfired));
            } else {
                job.running = true;
                due.push(job.spec.clone());
            }
        }

        (due, skipped)
    }

    /// Record a completed run; returns the updated consecutive-failure
    /// count.
    pub fn complete(&mut self, name: &str, success: bool) -> u32 {
        let Some(job) = self.jobs.get_mut(name) else {
            return 0;
        };
        job.running = false;
        if success {
            job.consecutive_failures = 0;
        } else {
            job.consecutive_failures += 1;
        }
        job.consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::job::RawJob;
    use std::time::Duration;

    fn spec(name: &str, interval: i64) -> JobSpec {
        JobSpec::from_raw(
            name,
            &RawJob {
                interval,
                browser: "chrome".to_string(),
                username: "u".to_string(),
                password: "p".to_string(),
            },
        )
        .unwrap()
    }

    const GRACE: Duration = Duration::from_secs(10);

    #[test]
    fn test_admit_staggers_strictly_increasing() {
        let mut registry = Registry::new();
        let now = Instant::now();
        let stagger = Duration::from_secs(900);

        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let first = registry.last_fire_time(now) + stagger;
            assert!(registry.admit(spec(name, 60), first));
            let _ = i;
        }

        assert_eq!(registry.len(), 3);
        let a = registry.get("a").unwrap().next_fire();
        let b = registry.get("b").unwrap().next_fire();
        let c = registry.get("c").unwrap().next_fire();
        assert!(a < b && b < c);
        assert_eq!(b - a, stagger);
    }

    #[test]
    fn test_admit_refuses_duplicates() {
        let mut registry = Registry::new();
        let now = Instant::now();
        assert!(registry.admit(spec("a", 60), now));
        let original_fire = registry.get("a").unwrap().next_fire();
        assert!(!registry.admit(spec("a", 120), now + Duration::from_secs(5)));
        assert_eq!(registry.get("a").unwrap().next_fire(), original_fire);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_due_job_dispatches_and_advances() {
        let mut registry = Registry::new();
        let now = Instant::now();
        registry.admit(spec("a", 60), now);

        let (due, skipped) = registry.take_due(now, GRACE);
        assert_eq!(due.len(), 1);
        assert!(skipped.is_empty());
        assert!(registry.get("a").unwrap().is_running());
        assert_eq!(
            registry.get("a").unwrap().next_fire(),
            now + Duration::from_secs(60)
        );
    }

    #[test]
    fn test_running_job_fire_is_dropped_not_queued() {
        let mut registry = Registry::new();
        let now = Instant::now();
        registry.admit(spec("a", 60), now);
        registry.take_due(now, GRACE);

        // Next fire arrives while the first run is still in flight.
        let later = now + Duration::from_secs(60);
        let (due, skipped) = registry.take_due(later, GRACE);
        assert!(due.is_empty());
        assert_eq!(skipped, vec![("a".to_string(), SkipReason::StillRunning)]);
        // The dropped fire is not queued for later.
        assert_eq!(
            registry.get("a").unwrap().next_fire(),
            later + Duration::from_secs(60)
        );
    }

    #[test]
    fn test_late_fire_past_grace_is_misfire() {
        let mut registry = Registry::new();
        let now = Instant::now();
        registry.admit(spec("a", 60), now);

        let late = now + Duration::from_secs(11);
        let (due, skipped) = registry.take_due(late, GRACE);
        assert!(due.is_empty());
        assert_eq!(skipped, vec![("a".to_string(), SkipReason::Misfired)]);
    }

    #[test]
    fn test_lateness_within_grace_still_fires() {
        let mut registry = Registry::new();
        let now = Instant::now();
        registry.admit(spec("a", 60), now);

        let slightly_late = now + Duration::from_secs(9);
        let (due, _) = registry.take_due(slightly_late, GRACE);
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn test_failure_counter_increments_and_resets() {
        let mut registry = Registry::new();
        let now = Instant::now();
        registry.admit(spec("a", 60), now);

        assert_eq!(registry.complete("a", false), 1);
        assert_eq!(registry.complete("a", false), 2);
        assert_eq!(registry.get("a").unwrap().consecutive_failures(), 2);
        assert_eq!(registry.complete("a", true), 0);
        assert_eq!(registry.get("a").unwrap().consecutive_failures(), 0);
    }
}
