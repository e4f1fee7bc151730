// Core structs: BugRecord, BugCollection, ClusterAssignment and the error enums
use chrono::NaiveDateTime;
use std::fmt;
use thiserror::Error;

/// Status of a bug task as reported by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BugStatus {
    New,
    Confirmed,
    InProgress,
    FixCommitted,
    FixReleased,
    Other(String),
}

impl BugStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "New" => BugStatus::New,
            "Confirmed" => BugStatus::Confirmed,
            "In Progress" => BugStatus::InProgress,
            "Fix Committed" => BugStatus::FixCommitted,
            "Fix Released" => BugStatus::FixReleased,
            other => BugStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BugStatus::New => "New",
            BugStatus::Confirmed => "Confirmed",
            BugStatus::InProgress => "In Progress",
            BugStatus::FixCommitted => "Fix Committed",
            BugStatus::FixReleased => "Fix Released",
            BugStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked issue. Timestamps are UTC with the offset dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct BugRecord {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: BugStatus,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// A bug as delivered by the source, before ingestion normalization.
#[derive(Debug, Clone, Default)]
pub struct RawBug {
    pub id: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub date_created: Option<String>,
    pub date_last_updated: Option<String>,
}

/// Bugs of one project series, in the order the source returned them.
#[derive(Debug, Clone, Default)]
pub struct BugCollection {
    pub project: String,
    pub series: String,
    pub bugs: Vec<BugRecord>,
}

impl BugCollection {
    pub fn new(project: &str, series: &str) -> Self {
        Self {
            project: project.to_string(),
            series: series.to_string(),
            bugs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bugs.is_empty()
    }
}

/// A release line of a project.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesInfo {
    pub name: String,
    pub version: Option<String>,
    pub active: bool,
}

/// TF-IDF rows, index-aligned with the input documents.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub rows: Vec<Vec<f64>>,
    pub vocabulary: Vec<String>,
}

impl FeatureMatrix {
    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Output of one clustering call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    pub k: usize,
    pub seed: u64,
    pub labels: Vec<usize>,
    pub iterations: usize,
}

/// A record paired with its cluster label. Borrows the record.
#[derive(Debug, Clone, Copy)]
pub struct AnnotatedBug<'a> {
    pub bug: &'a BugRecord,
    pub cluster: usize,
}

#[derive(Debug, Error, PartialEq)]
pub enum ClusterError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::SourceUnavailable(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
