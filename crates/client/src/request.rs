//! Queued units of dispatch work.
//!
//! A [`Request`] is built by one of the public dispatcher operations,
//! consumed by exactly one worker and dropped afterwards. Run-scoped
//! requests resolve their URL only when a worker picks them up, since
//! the run id does not exist yet when they are enqueued.

use std::fmt;

use serde::Serialize;

use runspace_core::endpoints;
use runspace_core::{RunMeta, RunPayload, RunSummary, TaskPayload, TaskSummary};

use crate::error::DispatchError;
use crate::run_handle::RunInfo;

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Create a resource (`POST`).
    Post,
    /// Update a resource (`PATCH`).
    Patch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => f.write_str("POST"),
            Self::Patch => f.write_str("PATCH"),
        }
    }
}

/// What a request does, which fixes its verb and URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    CreateRun,
    PostTask { task_id: String },
    FinishRun,
}

/// Serializable body of a request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Run(RunPayload),
    Task(TaskPayload),
}

#[derive(Debug, Clone)]
pub struct Request {
    pub kind: RequestKind,
    pub body: RequestBody,
}

impl Request {
    pub fn create_run(meta: &RunMeta) -> Self {
        Self {
            kind: RequestKind::CreateRun,
            body: RequestBody::Run(RunPayload::create(meta)),
        }
    }

    pub fn post_task(task: &TaskSummary) -> Self {
        Self {
            kind: RequestKind::PostTask {
                task_id: task.task_id.clone(),
            },
            body: RequestBody::Task(TaskPayload::new(task)),
        }
    }

    pub fn finish_run(summary: &RunSummary) -> Self {
        Self {
            kind: RequestKind::FinishRun,
            body: RequestBody::Run(RunPayload::done(summary)),
        }
    }

    pub fn method(&self) -> Method {
        match self.kind {
            RequestKind::CreateRun | RequestKind::PostTask { .. } => Method::Post,
            RequestKind::FinishRun => Method::Patch,
        }
    }

    /// Build the target URL against the current run, if any.
    ///
    /// Run-scoped requests fail with [`DispatchError::MissingRunId`] when
    /// no run was created.
    pub fn resolve_url(&self, space_id: &str, run: Option<&RunInfo>) -> Result<String, DispatchError> {
        let run_id = run.map(|r| r.id.as_str()).filter(|id| !id.is_empty());
        match (&self.kind, run_id) {
            (RequestKind::CreateRun, _) => Ok(endpoints::runs_url(space_id)),
            (RequestKind::PostTask { .. }, Some(run_id)) => Ok(endpoints::tasks_url(space_id, run_id)),
            (RequestKind::PostTask { task_id }, None) => {
                Err(DispatchError::MissingRunId(format!("post task {task_id}")))
            }
            (RequestKind::FinishRun, Some(run_id)) => Ok(endpoints::run_url(space_id, run_id)),
            (RequestKind::FinishRun, None) => Err(DispatchError::MissingRunId(
                "send PATCH request".to_string(),
            )),
        }
    }

    /// JSON-encode the body.
    pub fn encode_body(&self) -> Result<Vec<u8>, DispatchError> {
        serde_json::to_vec(&self.body).map_err(|e| DispatchError::Serialize(e.to_string()))
    }
}
