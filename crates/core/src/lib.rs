//! Pure data types and payload builders for reporting build runs to a
//! remote recording service ("spaces").
//!
//! Nothing in this crate performs network I/O. The client crate turns
//! the payloads built here into queued requests.

pub mod endpoints;
pub mod payload;
pub mod summary;
pub mod types;

pub use payload::{CacheStatusPayload, ClientSummary, RunPayload, TaskPayload};
pub use summary::{
    CacheSource, CacheStatus, ExecutionSummary, RunMeta, RunSummary, ScmState,
    TaskCacheSummary, TaskExecutionSummary, TaskSummary,
};
