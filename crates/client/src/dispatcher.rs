//! Bounded-concurrency request dispatcher for reporting a run.
//!
//! [`Dispatcher`] owns an unbounded request queue drained by a fixed pool
//! of worker tasks. The first request ever dequeued is the gating request
//! (normally the create-run call): every other worker waits on the
//! [`RunHandle`] ready signal before resolving its URL, because run-scoped
//! URLs need the server-issued run id.
//!
//! The ready signal fires once the gating request is done, whether or not
//! it succeeded. When run creation fails, each dependent request fails on
//! its own with [`DispatchError::MissingRunId`] instead of the pool
//! hanging.
//!
//! Expected call order:
//!
//! ```text
//! start_run().await -> post_task()* -> finish_run() -> close().await -> errors()
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use runspace_core::{RunMeta, RunSummary, TaskSummary};

use crate::config::DispatcherConfig;
use crate::error::{DispatchError, ErrorLog, RequestError};
use crate::request::{Method, Request, RequestKind};
use crate::run_handle::{RunHandle, RunInfo};
use crate::transport::Transport;

type Queue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Request>>>;

/// Reports a run's lifecycle to the spaces API through a worker pool.
pub struct Dispatcher {
    shared: Arc<Shared>,
    /// `None` once [`close`](Self::close) has been called.
    sender: Mutex<Option<mpsc::UnboundedSender<Request>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// State shared by the dispatcher and its workers.
struct Shared {
    transport: Arc<dyn Transport>,
    space_id: String,
    run: RunHandle,
    errors: ErrorLog,
    /// Set by the worker that dequeues the first request.
    gate_claimed: AtomicBool,
}

impl Dispatcher {
    /// Create the queue and start every worker immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(transport: Arc<dyn Transport>, config: DispatcherConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: Queue = Arc::new(tokio::sync::Mutex::new(receiver));

        let shared = Arc::new(Shared {
            transport,
            space_id: config.space_id,
            run: RunHandle::new(),
            errors: ErrorLog::new(),
            gate_claimed: AtomicBool::new(false),
        });

        let pool_size = config.workers.max(1);
        let workers: Vec<_> = (0..pool_size)
            .map(|index| tokio::spawn(run_worker(index, Arc::clone(&shared), Arc::clone(&queue))))
            .collect();

        tracing::debug!(workers = pool_size, space_id = %shared.space_id, "Spaces dispatcher started");

        Self {
            shared,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    /// Enqueue the create-run request and wait until the run gate opens.
    ///
    /// Must be the first request and must be called at most once. Returns
    /// the created run, or `None` if creation failed; in the latter case
    /// later requests each record a [`DispatchError::MissingRunId`].
    pub async fn start_run(&self, meta: &RunMeta) -> Option<RunInfo> {
        if self.shared.gate_claimed.load(Ordering::Acquire) {
            tracing::warn!("start_run called after other requests were dispatched");
        }
        if !self.enqueue(Request::create_run(meta)) {
            return None;
        }
        self.shared.run.ready().await.run().cloned()
    }

    /// Enqueue a task report. Never blocks; failures land in [`errors`](Self::errors).
    pub fn post_task(&self, task: &TaskSummary) {
        self.enqueue(Request::post_task(task));
    }

    /// Enqueue the run-completion update. Call [`close`](Self::close) afterwards.
    pub fn finish_run(&self, summary: &RunSummary) {
        self.enqueue(Request::finish_run(summary));
    }

    /// Stop accepting requests and wait for all queued work to drain.
    ///
    /// A second call is a no-op.
    pub async fn close(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            tracing::debug!("Spaces dispatcher already closed");
            return;
        }
        drop(sender);

        let workers =
            std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Spaces worker terminated abnormally");
            }
        }

        tracing::info!(errors = self.shared.errors.len(), "Spaces dispatcher closed");
    }

    /// Failures recorded so far. Final once [`close`](Self::close) returns.
    pub fn errors(&self) -> Vec<RequestError> {
        self.shared.errors.snapshot()
    }

    /// The created run, if creation succeeded.
    pub fn run_info(&self) -> Option<RunInfo> {
        self.shared.run.run()
    }

    pub fn run_handle(&self) -> &RunHandle {
        &self.shared.run
    }

    /// Push a request onto the queue, recording [`DispatchError::Closed`]
    /// when the dispatcher no longer accepts work.
    fn enqueue(&self, request: Request) -> bool {
        let rejected = {
            let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
            match sender.as_ref() {
                Some(tx) => tx.send(request).err().map(|e| e.0),
                None => Some(request),
            }
        };

        match rejected {
            Some(request) => {
                self.shared.errors.record(RequestError::new(
                    request.method(),
                    None,
                    DispatchError::Closed,
                ));
                false
            }
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

/// Fires the run gate when dropped, so a panicking gating request still
/// releases the waiting workers.
struct GateGuard<'a>(&'a RunHandle);

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.0.open();
    }
}

async fn run_worker(index: usize, shared: Arc<Shared>, queue: Queue) {
    tracing::debug!(worker = index, "Spaces worker started");

    loop {
        // The gate is claimed under the queue lock so the claimant is the
        // worker that dequeued first.
        let (request, gating) = {
            let mut receiver = queue.lock().await;
            let Some(request) = receiver.recv().await else { break };
            (request, shared.claim_gate())
        };

        if gating {
            let _gate = GateGuard(&shared.run);
            shared.process(request).await;
        } else {
            shared.run.ready().await;
            shared.process(request).await;
        }
    }

    tracing::debug!(worker = index, "Spaces worker exiting");
}

impl Shared {
    /// `true` for exactly one caller: the worker holding the first request.
    fn claim_gate(&self) -> bool {
        self.gate_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Resolve, validate, encode and send one request. Every failure is
    /// recorded and ends processing of this request only.
    async fn process(&self, request: Request) {
        let method = request.method();

        let url = match request.resolve_url(&self.space_id, self.run.run().as_ref()) {
            Ok(url) => url,
            Err(kind) => {
                self.errors.record(RequestError::new(method, None, kind));
                return;
            }
        };
        let fail = |kind: DispatchError| {
            self.errors
                .record(RequestError::new(method, Some(&url), kind));
        };

        if self.space_id.is_empty() {
            fail(DispatchError::MissingSpaceId);
            return;
        }
        if !self.transport.is_linked() {
            fail(DispatchError::NotLinked);
            return;
        }

        let body = match request.encode_body() {
            Ok(body) => body,
            Err(kind) => {
                fail(kind);
                return;
            }
        };

        tracing::debug!(%method, url = %url, "Dispatching spaces request");

        let response = match self.transport.create_or_update(method, &url, body).await {
            Ok(response) => response,
            Err(e) => {
                fail(DispatchError::Transport(e.to_string()));
                return;
            }
        };

        if request.kind == RequestKind::CreateRun {
            self.record_run(&url, &response);
        }
    }

    /// Completion step of the create-run request: store the returned run.
    ///
    /// An empty body is undecodable like any other malformed response.
    fn record_run(&self, url: &str, response: &[u8]) {
        match serde_json::from_slice::<RunInfo>(response) {
            Ok(info) if info.id.is_empty() => {
                tracing::warn!(url, "Spaces run response did not include a run id");
            }
            Ok(info) => {
                tracing::info!(run_id = %info.id, run_url = %info.url, "Spaces run created");
                if !self.run.set_created(info) {
                    tracing::warn!("Spaces run created after the run gate had already opened");
                }
            }
            Err(e) => self.errors.record(RequestError::new(
                Method::Post,
                Some(url),
                DispatchError::ResponseDecode(e.to_string()),
            )),
        }
    }
}
