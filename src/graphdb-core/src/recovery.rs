use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options for creating a backup
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct BackupOptions {
    /// Cloud bucket to upload into, e.g. `s3:///bucket/backup.tar?region=eu-west-1`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bucket_uri: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub backup_system_data: bool,
    /// Repositories to include, all of them when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<String>,
}

/// Options for restoring a backup
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RestoreOptions {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bucket_uri: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub restore_system_data: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub remove_stale_repositories: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<String>,
}

/// Lifecycle of the server-side system report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReportState {
    #[default]
    None,
    InProgress,
    Ready,
    Error,
    Other(String),
}

impl ReportState {
    pub fn parse(s: &str) -> Self {
        match s {
            "NONE" => ReportState::None,
            "IN_PROGRESS" => ReportState::InProgress,
            "READY" => ReportState::Ready,
            "ERROR" => ReportState::Error,
            other => ReportState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportState::None => write!(f, "NONE"),
            ReportState::InProgress => write!(f, "IN_PROGRESS"),
            ReportState::Ready => write!(f, "READY"),
            ReportState::Error => write!(f, "ERROR"),
            ReportState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// ReportStatus is decoded from the `STATE|epoch-millis|message` status line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStatus {
    pub state: ReportState,
    pub time: Option<DateTime<Utc>>,
    pub error_message: String,
}

impl ReportStatus {
    /// Parse the pipe-delimited status line. Missing or unparsable fields are
    /// left at their defaults.
    pub fn parse(line: &str) -> Self {
        let mut status = ReportStatus::default();
        for (i, part) in line.trim().splitn(3, '|').enumerate() {
            match i {
                0 => status.state = ReportState::parse(part),
                1 => {
                    status.time = part
                        .parse::<i64>()
                        .ok()
                        .and_then(DateTime::<Utc>::from_timestamp_millis)
                }
                _ => status.error_message = part.to_string(),
            }
        }
        status
    }

    pub fn is_ready(&self) -> bool {
        self.state == ReportState::Ready
    }
}
