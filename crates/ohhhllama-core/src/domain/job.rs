//! Job records and their lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::subject::Subject;

/// Store-assigned job identifier, monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which acquisition path a job takes. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    #[serde(rename = "binary-artifact-pull")]
    BinaryPull,
    #[serde(rename = "repository-acquire")]
    RepositoryAcquire,
    #[serde(rename = "container-pull")]
    ContainerPull,
}

impl JobKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BinaryPull => "binary-artifact-pull",
            Self::RepositoryAcquire => "repository-acquire",
            Self::ContainerPull => "container-pull",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary-artifact-pull" => Ok(Self::BinaryPull),
            "repository-acquire" => Ok(Self::RepositoryAcquire),
            "container-pull" => Ok(Self::ContainerPull),
            other => Err(format!("unknown job kind '{other}'")),
        }
    }
}

/// Job lifecycle state.
///
/// Transitions only move forward: `pending -> in-progress -> completed | failed`.
/// The single exception is orphan recovery, which puts `in-progress` back to
/// `pending` at processor startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Failed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown job status '{s}'"))
    }
}

/// A unit of requested acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub subject: Subject,
    /// Requesting client's address.
    pub origin: String,
    pub status: JobStatus,
    /// Set only when `status` is `failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub const fn kind(&self) -> JobKind {
        self.subject.kind()
    }
}

/// Number of jobs in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub failed: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: JobStatus, n: u64) {
        match status {
            JobStatus::Pending => self.pending += n,
            JobStatus::InProgress => self.in_progress += n,
            JobStatus::Completed => self.completed += n,
            JobStatus::Failed => self.failed += n,
        }
    }

    pub const fn total(&self) -> u64 {
        self.pending + self.in_progress + self.completed + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_roundtrip() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("downloading".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_kind_strings_match_subject_tags() {
        for subject in [
            Subject::binary("a"),
            Subject::container("b"),
            Subject::RepositoryAcquire(crate::domain::RepoDescriptor::new("c/d")),
        ] {
            let json = serde_json::to_value(&subject).unwrap();
            assert_eq!(json["kind"], subject.kind().as_str());
            assert_eq!(subject.kind().as_str().parse::<JobKind>().unwrap(), subject.kind());
        }
    }

    #[test]
    fn test_status_counts() {
        let mut counts = StatusCounts::default();
        counts.add(JobStatus::Pending, 2);
        counts.add(JobStatus::Failed, 1);
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.total(), 3);
    }
}
