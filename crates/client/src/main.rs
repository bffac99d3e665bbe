//! `runspace-report` -- replays a recorded build run to a space.
//!
//! Reads a JSON run report (run metadata plus task summaries) and sends
//! it through the request dispatcher: create run, post each task, finish
//! run. Exits non-zero when any request failed.
//!
//! # Usage
//!
//! ```text
//! runspace-report <report.json>
//! ```
//!
//! # Environment variables
//!
//! | Variable                      | Required | Default                  | Description                      |
//! |-------------------------------|----------|--------------------------|----------------------------------|
//! | `SPACES_API_URL`              | no       | `https://vercel.com/api` | API base URL                     |
//! | `SPACES_TOKEN`                | no       | --                       | Bearer token                     |
//! | `SPACES_TEAM_ID`              | no       | --                       | Team owning the space            |
//! | `SPACES_SPACE_ID`             | no       | report's `spaceId`       | Target space                     |
//! | `SPACES_WORKERS`              | no       | `8`                      | Concurrent requests              |
//! | `SPACES_REQUEST_TIMEOUT_SECS` | no       | `30`                     | Per-request timeout              |

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use runspace_client::report::{self, RunReport};
use runspace_client::{Dispatcher, HttpTransport, SpacesConfig};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runspace_client=info,runspace_report=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "runspace-report failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: runspace-report <report.json>")?;

    let raw = std::fs::read(&path)
        .with_context(|| format!("Failed to read run report {}", path.display()))?;
    let report: RunReport = serde_json::from_slice(&raw)
        .with_context(|| format!("Malformed run report {}", path.display()))?;

    let mut config = SpacesConfig::from_env()?;
    if config.dispatcher.space_id.is_empty() {
        config.dispatcher.space_id = report.meta.space_id.clone();
    }

    tracing::info!(
        space_id = %config.dispatcher.space_id,
        workers = config.dispatcher.workers,
        tasks = report.tasks.len(),
        "Starting runspace-report",
    );

    let transport = HttpTransport::new(config.transport).context("Failed to build HTTP client")?;
    let dispatcher = Dispatcher::new(Arc::new(transport), config.dispatcher);

    let outcome = report::replay(&dispatcher, &report).await;

    if let Some(run) = &outcome.run {
        tracing::info!(run_url = %run.url, "Run recorded");
    }

    if outcome.errors.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    tracing::warn!(count = outcome.errors.len(), "Failed to send some run data to the space");
    for err in &outcome.errors {
        tracing::warn!("{err}");
    }
    Ok(ExitCode::FAILURE)
}
