//! The process-wide job registry (C8), backed by `DashMap` so per-record
//! locking satisfies spec.md §5's "per-record read/write lock" requirement
//! without a single coarse mutex — the same concurrent-map choice
//! `aion-core::metrics` makes for its counters.

use dashmap::DashMap;
use driftmgr_core::error::{DriftError, ErrorKind};
use driftmgr_core::model::{Job, JobStatus, JobType};

pub struct JobRegistry {
    jobs: DashMap<String, Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self { jobs: DashMap::new() }
    }

    pub fn create(&self, id: String, job_type: JobType) -> Job {
        let job = Job::new(id, job_type);
        self.jobs.insert(job.id.clone(), job.clone());
        job
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|entry| entry.clone())
    }

    /// Snapshot of every job matching `filter`, taken under the map's
    /// shard locks one bucket at a time — not a single global lock, but
    /// each returned value is a consistent point-in-time clone.
    pub fn list(&self, filter: impl Fn(&Job) -> bool) -> Vec<Job> {
        self.jobs.iter().filter(|entry| filter(entry.value())).map(|entry| entry.value().clone()).collect()
    }

    pub fn update_progress(&self, id: &str, progress: f64) -> Result<(), DriftError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| DriftError::not_found("job_registry.update_progress", format!("no job {id}")))?;
        entry.progress = progress.clamp(0.0, 100.0);
        Ok(())
    }

    pub fn transition(&self, id: &str, next: JobStatus) -> Result<(), DriftError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| DriftError::not_found("job_registry.transition", format!("no job {id}")))?;

        if !entry.can_transition_to(next) {
            return Err(DriftError::new(
                ErrorKind::Internal,
                "job_registry.transition",
                format!("illegal transition {:?} -> {:?}", entry.status, next),
            ));
        }
        entry.status = next;
        if next.is_terminal() {
            entry.completed_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    /// Only `pending`/`running` jobs may be cancelled; others return
    /// `approval-denied`-style non-retryable rejection via `Internal`.
    pub fn cancel(&self, id: &str) -> Result<(), DriftError> {
        let status = self
            .jobs
            .get(id)
            .map(|entry| entry.status)
            .ok_or_else(|| DriftError::not_found("job_registry.cancel", format!("no job {id}")))?;

        if !status.is_cancellable() {
            return Err(DriftError::new(
                ErrorKind::ValidationFailed,
                "job_registry.cancel",
                format!("job {id} is in terminal state {status:?} and cannot be cancelled"),
            ));
        }
        self.transition(id, JobStatus::Cancelled)
    }

    pub fn set_result(&self, id: &str, result: serde_json::Value) -> Result<(), DriftError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| DriftError::not_found("job_registry.set_result", format!("no job {id}")))?;
        entry.result = Some(result);
        Ok(())
    }

    pub fn set_error(&self, id: &str, error: impl Into<String>) -> Result<(), DriftError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| DriftError::not_found("job_registry.set_error", format!("no job {id}")))?;
        entry.error = Some(error.into());
        Ok(())
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_strict_lifecycle_transitions() {
        let registry = JobRegistry::new();
        registry.create("j-1".to_string(), JobType::Discovery);

        assert!(registry.transition("j-1", JobStatus::Completed).is_err());
        registry.transition("j-1", JobStatus::Running).unwrap();
        registry.transition("j-1", JobStatus::Completed).unwrap();

        let job = registry.get("j-1").unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn only_pending_or_running_jobs_can_be_cancelled() {
        let registry = JobRegistry::new();
        registry.create("j-1".to_string(), JobType::Remediation);
        registry.transition("j-1", JobStatus::Running).unwrap();
        registry.transition("j-1", JobStatus::Completed).unwrap();

        assert!(registry.cancel("j-1").is_err());
    }

    #[test]
    fn list_filters_by_predicate() {
        let registry = JobRegistry::new();
        registry.create("j-1".to_string(), JobType::Discovery);
        registry.create("j-2".to_string(), JobType::Remediation);

        let discovery_jobs = registry.list(|j| j.job_type == JobType::Discovery);
        assert_eq!(discovery_jobs.len(), 1);
        assert_eq!(discovery_jobs[0].id, "j-1");
    }
}
