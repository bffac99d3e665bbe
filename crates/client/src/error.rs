//! Errors recorded by the dispatcher.
//!
//! Nothing here is returned from `post_task` / `finish_run`; failures are
//! appended to an [`ErrorLog`] and read back after the dispatcher closes.

use std::sync::{Mutex, PoisonError};

use crate::request::Method;

/// Why a single request could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The repository has no space configured.
    #[error("No spaceID found")]
    MissingSpaceId,

    /// The transport has no linkage (token / team) to the service.
    #[error("Repo is not linked to a Space. Link the repository to a space first")]
    NotLinked,

    /// A run-scoped request was resolved before the run existed.
    #[error("No Run ID found to {0}")]
    MissingRunId(String),

    /// The request body could not be encoded as JSON.
    #[error("Failed to create payload: {0}")]
    Serialize(String),

    /// The transport reported a network or HTTP failure.
    #[error("{0}")]
    Transport(String),

    /// The create-run response body could not be decoded.
    #[error("Error unmarshaling response: {0}")]
    ResponseDecode(String),

    /// The request was enqueued after the dispatcher was closed.
    #[error("Dispatcher is closed, request dropped")]
    Closed,
}

/// A recorded failure together with the request it belongs to.
///
/// `url` is `None` when the failure happened before the request URL
/// could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{method}] {}: {kind}", .url.as_deref().unwrap_or("<unresolved>"))]
pub struct RequestError {
    pub method: Method,
    pub url: Option<String>,
    pub kind: DispatchError,
}

impl RequestError {
    pub fn new(method: Method, url: Option<&str>, kind: DispatchError) -> Self {
        Self {
            method,
            url: url.map(str::to_string),
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorLog
// ---------------------------------------------------------------------------

/// Append-only list of failures shared by all workers.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Mutex<Vec<RequestError>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, error: RequestError) {
        tracing::warn!(
            method = %error.method,
            url = error.url.as_deref().unwrap_or(""),
            error = %error.kind,
            "Spaces request failed"
        );
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    /// Copy of every failure recorded so far, in append order.
    pub fn snapshot(&self) -> Vec<RequestError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
