//! Job model.
//!
//! A job is a construction site on the board. Its rows hold the
//! resources assigned to it for the day.

use serde::{Deserialize, Serialize};

/// A job on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Contract or job number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Job type configuration used for this job's rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type_id: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: JobStatus,
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    /// Planned, not yet on the board.
    Pending,
    /// On the board and expecting resources.
    #[default]
    Active,
    /// Locked for the day.
    Finalized,
    Cancelled,
}

impl Job {
    /// Creates an active job.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            number: None,
            job_type_id: None,
            status: JobStatus::Active,
        }
    }

    /// Sets the job number.
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Sets the job type configuration.
    pub fn with_job_type(mut self, job_type_id: impl Into<String>) -> Self {
        self.job_type_id = Some(job_type_id.into());
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the job still expects resources.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == JobStatus::Active
    }
}
