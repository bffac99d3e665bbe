//! The server-issued run and the one-shot signal gating on it.
//!
//! [`RunHandle`] starts out [`RunState::Pending`] and leaves that state
//! exactly once: either to [`RunState::Created`] when the create-run call
//! returns an id, or to [`RunState::Unavailable`] when the gating request
//! finished without one. Either transition fires the ready signal; the
//! handle never goes back to pending.

use serde::Deserialize;
use tokio::sync::watch;

/// Identity of a run as returned by `POST /runs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunInfo {
    #[serde(default)]
    pub id: String,
    /// Link to the run in the web UI.
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// The gating request has not finished yet.
    Pending,
    Created(RunInfo),
    /// The gating request finished without producing a run.
    Unavailable,
}

impl RunState {
    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn run(&self) -> Option<&RunInfo> {
        match self {
            Self::Created(info) => Some(info),
            Self::Pending | Self::Unavailable => None,
        }
    }
}

/// Single-fire latch holding the created run.
#[derive(Debug)]
pub struct RunHandle {
    state: watch::Sender<RunState>,
}

impl RunHandle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunState::Pending);
        Self { state }
    }

    /// Store the created run and fire the ready signal.
    ///
    /// Returns `false` (and changes nothing) if the signal already fired.
    pub fn set_created(&self, info: RunInfo) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_ready() {
                return false;
            }
            *state = RunState::Created(info);
            true
        })
    }

    /// Fire the ready signal without a run, unless it already fired.
    pub fn open(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_ready() {
                return false;
            }
            *state = RunState::Unavailable;
            true
        })
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().is_ready()
    }

    /// The created run, if any.
    pub fn run(&self) -> Option<RunInfo> {
        self.state.borrow().run().cloned()
    }

    /// Wait until the ready signal fires and return the settled state.
    pub async fn ready(&self) -> RunState {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(RunState::is_ready).await {
            Ok(state) => state.clone(),
            // Unreachable while `self` holds the sender.
            Err(_) => RunState::Unavailable,
        };
        state
    }
}

impl Default for RunHandle {
    fn default() -> Self {
        Self::new()
    }
}
