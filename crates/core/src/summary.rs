//! In-memory run and task summaries supplied by the build orchestrator.
//!
//! These are the inputs to the payload builders in [`crate::payload`].
//! They deserialize from camelCase JSON so a finished run can be replayed
//! from disk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Execution context reported when no CI vendor was detected.
pub const LOCAL_CONTEXT: &str = "LOCAL";

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Everything known about a run besides its tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMeta {
    pub run_summary: RunSummary,
    /// The command line as the user would have typed it.
    pub synthesized_command: String,
    /// Repository path relative to the workspace root.
    pub repo_path: String,
    /// Target space. Empty when the repository has no space configured.
    #[serde(default)]
    pub space_id: String,
    /// Name of the detected CI vendor, if any.
    #[serde(default)]
    pub ci_vendor: Option<String>,
}

impl RunMeta {
    /// The host that executed this run: the CI vendor, or `"LOCAL"`.
    pub fn execution_context(&self) -> &str {
        match self.ci_vendor.as_deref() {
            Some(vendor) if !vendor.is_empty() => vendor,
            _ => LOCAL_CONTEXT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Version of the orchestrator that produced the run.
    pub version: String,
    pub execution: ExecutionSummary,
    #[serde(default)]
    pub scm: ScmState,
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub started_at: Timestamp,
    /// Unset while the run is still in progress.
    #[serde(default)]
    pub ended_at: Option<Timestamp>,
    #[serde(default)]
    pub exit_code: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmState {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub sha: String,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// One task of a run, e.g. `build` in package `web`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    /// Fully qualified id, `package#task`.
    pub task_id: String,
    pub task: String,
    pub package: String,
    pub hash: String,
    pub execution: TaskExecutionSummary,
    pub cache: TaskCacheSummary,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub dependents: Vec<String>,
    /// File holding the task's captured output.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl TaskSummary {
    pub fn end_time(&self) -> Timestamp {
        self.execution.end_time()
    }

    /// Captured output of the task.
    ///
    /// Returns an empty string when there is no log file or it cannot be
    /// read; invalid UTF-8 is replaced rather than rejected.
    pub fn logs(&self) -> String {
        self.log_file
            .as_ref()
            .and_then(|path| std::fs::read(path).ok())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskExecutionSummary {
    pub start_at: Timestamp,
    /// Wall-clock duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
    /// Unset when the task never produced an exit code (e.g. cache hit
    /// replay failed before running).
    #[serde(default)]
    pub exit_code: Option<i32>,
}

impl TaskExecutionSummary {
    /// `start_at + duration_ms`, saturating at the latest representable time.
    pub fn end_time(&self) -> Timestamp {
        i64::try_from(self.duration_ms)
            .ok()
            .and_then(chrono::TimeDelta::try_milliseconds)
            .and_then(|duration| self.start_at.checked_add_signed(duration))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
    }
}

/// Cache outcome of a task as tracked internally.
///
/// `local` and `remote` are internal bookkeeping and never leave the
/// process; see [`crate::payload::CacheStatusPayload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCacheSummary {
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub remote: bool,
    pub status: CacheStatus,
    #[serde(default)]
    pub source: Option<CacheSource>,
    /// Milliseconds saved by restoring from cache.
    #[serde(default)]
    pub time_saved: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheSource {
    Local,
    Remote,
}
