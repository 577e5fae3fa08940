use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Discovery,
    DriftDetection,
    Remediation,
    StateLoad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Partial,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Only `Pending` and `Running` jobs may be cancelled (spec.md §4.7).
    pub fn is_cancellable(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Partial | JobStatus::Failed | JobStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStep {
    pub name: String,
    pub status: JobStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub progress: f64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub steps: Vec<JobStep>,
}

impl Job {
    pub fn new(id: String, job_type: JobType) -> Self {
        Self {
            id,
            job_type,
            status: JobStatus::Pending,
            progress: 0.0,
            started_at: Utc::now(),
            completed_at: None,
            result: None,
            error: None,
            steps: Vec::new(),
        }
    }

    /// Valid lifecycle transitions: created -> pending -> running ->
    /// (completed | partial | failed | cancelled). Anything else is a bug.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self.status, next),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Running, Completed)
                | (Running, Partial)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_rejects_skipping_running() {
        let job = Job::new("j-1".to_string(), JobType::Discovery);
        assert!(!job.can_transition_to(JobStatus::Completed));
        assert!(job.can_transition_to(JobStatus::Running));
    }

    #[test]
    fn only_pending_or_running_is_cancellable() {
        assert!(JobStatus::Pending.is_cancellable());
        assert!(JobStatus::Running.is_cancellable());
        assert!(!JobStatus::Completed.is_cancellable());
    }
}
