use crate::diagnostic::{Diagnostic, Severity};
use crate::schema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result envelope of one `check` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendsReport {
    pub schema: String,
    pub tool: ToolInfo,

    #[serde(default)]
    pub run: RunInfo,

    pub status: ReportStatus,

    #[serde(default)]
    pub summary: ReportSummary,

    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl FriendsReport {
    pub fn new(tool: ToolInfo, summary: ReportSummary, diagnostics: Vec<Diagnostic>) -> Self {
        let status = ReportStatus::from_diagnostics(&diagnostics);
        Self {
            schema: schema::FRIENDS_REPORT_V1.to_string(),
            tool,
            run: RunInfo::default(),
            status,
            summary,
            diagnostics,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pass,
    Warn,
    Fail,
}

impl ReportStatus {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        if diagnostics.iter().any(|d| d.severity == Severity::Error) {
            ReportStatus::Fail
        } else if diagnostics.iter().any(|d| d.severity == Severity::Warn) {
            ReportStatus::Warn
        } else {
            ReportStatus::Pass
        }
    }
}

/// Per-verdict call-site counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub call_sites: u64,
    pub allowed: u64,
    pub denied: u64,
    pub inconclusive: u64,

    /// Call sites in excluded documents.
    #[serde(default)]
    pub skipped: u64,
}

impl ReportSummary {
    pub fn merge(&mut self, other: &ReportSummary) {
        self.call_sites += other.call_sites;
        self.allowed += other.allowed;
        self.denied += other.denied;
        self.inconclusive += other.inconclusive;
        self.skipped += other.skipped;
    }
}
