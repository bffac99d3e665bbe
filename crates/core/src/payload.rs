//! Wire payloads for the spaces runs API and the builders that produce
//! them from run/task summaries.

use serde::Serialize;

use crate::summary::{CacheSource, CacheStatus, RunMeta, RunSummary, TaskCacheSummary, TaskSummary};
use crate::types::unix_millis;

/// Run status while tasks are still executing.
pub const STATUS_RUNNING: &str = "running";

/// Run status once the orchestrator has finished.
pub const STATUS_COMPLETED: &str = "completed";

/// Value of the run `type` field.
pub const RUN_TYPE: &str = "TURBO";

const CLIENT_ID: &str = "turbo";
const CLIENT_NAME: &str = "Turbo";

// ---------------------------------------------------------------------------
// Run payload
// ---------------------------------------------------------------------------

/// Body of `POST /runs` (create) and `PATCH /runs/{run}` (finish).
///
/// A single shape serves both requests; start and end times are never sent
/// together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub run_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_path: Option<String>,
    /// Host the run executed on (CI vendor or `LOCAL`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,
    #[serde(rename = "originationUser", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Identity of the reporting client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub version: String,
}

impl RunPayload {
    /// Payload announcing a new run.
    pub fn create(meta: &RunMeta) -> Self {
        let summary = &meta.run_summary;
        Self {
            start_time: Some(unix_millis(&summary.execution.started_at)),
            status: Some(STATUS_RUNNING),
            run_type: Some(RUN_TYPE),
            command: Some(meta.synthesized_command.clone()),
            repository_path: Some(meta.repo_path.clone()),
            context: Some(meta.execution_context().to_string()),
            client: Some(ClientSummary {
                id: CLIENT_ID,
                name: CLIENT_NAME,
                version: summary.version.clone(),
            }),
            git_branch: Some(summary.scm.branch.clone()),
            git_sha: Some(summary.scm.sha.clone()),
            user: non_empty(&summary.user),
            ..Self::default()
        }
    }

    /// Payload marking a run completed.
    ///
    /// A run without an end time is reported as ending now.
    pub fn done(summary: &RunSummary) -> Self {
        let ended_at = summary
            .execution
            .ended_at
            .unwrap_or_else(chrono::Utc::now);
        Self {
            status: Some(STATUS_COMPLETED),
            end_time: Some(unix_millis(&ended_at)),
            exit_code: Some(summary.execution.exit_code),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Task payload
// ---------------------------------------------------------------------------

/// Body of `POST /runs/{run}/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workspace: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hash: String,
    pub start_time: i64,
    pub end_time: i64,
    pub cache: CacheStatusPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependents: Vec<String>,
    #[serde(rename = "log")]
    pub logs: String,
}

impl TaskPayload {
    pub fn new(task: &TaskSummary) -> Self {
        Self {
            key: task.task_id.clone(),
            name: task.task.clone(),
            workspace: task.package.clone(),
            hash: task.hash.clone(),
            start_time: unix_millis(&task.execution.start_at),
            end_time: unix_millis(&task.end_time()),
            cache: CacheStatusPayload::from(&task.cache),
            exit_code: task.execution.exit_code,
            dependencies: task.dependencies.clone(),
            dependents: task.dependents.clone(),
            logs: task.logs(),
        }
    }
}

/// Wire form of a task's cache outcome.
///
/// Drops the internal `local` / `remote` flags of [`TaskCacheSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusPayload {
    pub status: CacheStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CacheSource>,
    pub time_saved: u64,
}

impl From<&TaskCacheSummary> for CacheStatusPayload {
    fn from(cache: &TaskCacheSummary) -> Self {
        Self {
            status: cache.status,
            source: cache.source,
            time_saved: cache.time_saved,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
