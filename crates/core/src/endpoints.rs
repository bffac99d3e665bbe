//! URL templates for the spaces runs API.
//!
//! All paths are relative to the API base URL configured on the transport.

/// `POST` target for creating a run.
pub fn runs_url(space_id: &str) -> String {
    format!("/v0/spaces/{space_id}/runs")
}

/// `PATCH` target for updating (finishing) a run.
pub fn run_url(space_id: &str, run_id: &str) -> String {
    format!("/v0/spaces/{space_id}/runs/{run_id}")
}

/// `POST` target for attaching a task to a run.
pub fn tasks_url(space_id: &str, run_id: &str) -> String {
    format!("/v0/spaces/{space_id}/runs/{run_id}/tasks")
}
