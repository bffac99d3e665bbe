//! Replaying a recorded run through a [`Dispatcher`].

use serde::Deserialize;

use runspace_core::{RunMeta, TaskSummary};

use crate::dispatcher::Dispatcher;
use crate::error::RequestError;
use crate::run_handle::RunInfo;

/// A finished run as written to disk by the orchestrator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub meta: RunMeta,
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
}

/// What the service ended up with after a replay.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub run: Option<RunInfo>,
    pub errors: Vec<RequestError>,
}

/// Drive the full lifecycle: create the run, post every task, finish the
/// run, then close the dispatcher and collect its errors.
pub async fn replay(dispatcher: &Dispatcher, report: &RunReport) -> ReplayOutcome {
    let run = dispatcher.start_run(&report.meta).await;
    match &run {
        Some(info) => tracing::info!(run_id = %info.id, "Reporting run to space"),
        None => tracing::warn!("Run was not created, task reports will fail"),
    }

    for task in &report.tasks {
        dispatcher.post_task(task);
    }
    dispatcher.finish_run(&report.meta.run_summary);
    dispatcher.close().await;

    ReplayOutcome {
        run,
        errors: dispatcher.errors(),
    }
}
