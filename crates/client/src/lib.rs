//! Client for reporting build runs to the spaces API.
//!
//! - [`Dispatcher`] -- worker pool that sequences create-run, post-task and
//!   finish-run requests behind the run-creation gate.
//! - [`RunHandle`] -- server-issued run id plus its one-shot ready signal.
//! - [`Transport`] / [`HttpTransport`] -- the seam that performs the HTTP
//!   calls.
//! - [`report`] -- replay of a recorded run through a dispatcher.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod report;
pub mod request;
pub mod run_handle;
pub mod transport;

pub use config::{DispatcherConfig, HttpTransportConfig, SpacesConfig};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, RequestError};
pub use request::Method;
pub use run_handle::{RunHandle, RunInfo, RunState};
pub use transport::{HttpTransport, Transport, TransportError};
