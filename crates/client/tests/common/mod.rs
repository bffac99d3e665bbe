#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeZone;

use runspace_client::{Dispatcher, DispatcherConfig, Method, Transport, TransportError};
use runspace_core::{
    CacheStatus, ExecutionSummary, RunMeta, RunSummary, ScmState, TaskCacheSummary,
    TaskExecutionSummary, TaskSummary,
};

pub const SPACE_ID: &str = "sp_1";
pub const RUN_ID: &str = "run_1";

/// A request the scripted transport received.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub body: serde_json::Value,
}

/// In-memory [`Transport`] that records every call.
///
/// `POST .../runs` answers with `create_response`; every other request
/// succeeds with an empty JSON object.
pub struct ScriptedTransport {
    pub linked: bool,
    pub create_response: Result<Vec<u8>, (u16, String)>,
    /// Delay applied to the create-run call before it answers.
    pub create_delay: Duration,
    pub calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            linked: true,
            create_response: Ok(serde_json::to_vec(&serde_json::json!({
                "id": RUN_ID,
                "url": "https://spaces.example.com/runs/run_1",
            }))
            .unwrap()),
            create_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_create(status: u16, body: &str) -> Self {
        Self {
            create_response: Err((status, body.to_string())),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.url == url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn create_or_update(
        &self,
        method: Method,
        url: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let is_create = method == Method::Post && url.ends_with("/runs");
        if is_create && !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_string(),
            body: serde_json::from_slice(&body).unwrap(),
        });

        if is_create {
            return self
                .create_response
                .clone()
                .map_err(|(status, body)| TransportError::Status { status, body });
        }
        Ok(b"{}".to_vec())
    }

    fn is_linked(&self) -> bool {
        self.linked
    }
}

pub fn dispatcher(transport: &Arc<ScriptedTransport>) -> Dispatcher {
    Dispatcher::new(transport.clone(), DispatcherConfig::new(SPACE_ID))
}

fn at(millis: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::Utc.timestamp_millis_opt(millis).unwrap()
}

pub fn run_meta() -> RunMeta {
    RunMeta {
        run_summary: RunSummary {
            version: "1.9.3".to_string(),
            execution: ExecutionSummary {
                started_at: at(1_700_000_000_000),
                ended_at: Some(at(1_700_000_090_000)),
                exit_code: 0,
            },
            scm: ScmState {
                branch: "main".to_string(),
                sha: "deadbeef".to_string(),
            },
            user: "octocat".to_string(),
        },
        synthesized_command: "turbo run build".to_string(),
        repo_path: ".".to_string(),
        space_id: SPACE_ID.to_string(),
        ci_vendor: None,
    }
}

pub fn task(package: &str, name: &str) -> TaskSummary {
    TaskSummary {
        task_id: format!("{package}#{name}"),
        task: name.to_string(),
        package: package.to_string(),
        hash: format!("hash-{package}-{name}"),
        execution: TaskExecutionSummary {
            start_at: at(1_700_000_001_000),
            duration_ms: 500,
            exit_code: Some(0),
        },
        cache: TaskCacheSummary {
            local: false,
            remote: false,
            status: CacheStatus::Miss,
            source: None,
            time_saved: 0,
        },
        dependencies: Vec::new(),
        dependents: Vec::new(),
        log_file: None,
    }
}

pub fn tasks(count: usize) -> Vec<TaskSummary> {
    (0..count).map(|i| task(&format!("pkg-{i}"), "build")).collect()
}

pub fn tasks_url() -> String {
    format!("/v0/spaces/{SPACE_ID}/runs/{RUN_ID}/tasks")
}

pub fn runs_url() -> String {
    format!("/v0/spaces/{SPACE_ID}/runs")
}

pub fn run_url() -> String {
    format!("/v0/spaces/{SPACE_ID}/runs/{RUN_ID}")
}
