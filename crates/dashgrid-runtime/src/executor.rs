#![forbid(unsafe_code)]

//! Asynchronous store access.
//!
//! The session never calls a [`LayoutStore`] directly. It submits a
//! [`StoreRequest`] to a [`StoreExecutor`], gets a [`StoreTicket`] back, and
//! later drains [`StoreCompletion`]s without blocking.
//!
//! - [`ThreadedExecutor`] owns the store on a worker thread. Requests and
//!   completions travel over `std::sync::mpsc` channels. Requests run in
//!   submission order, so the last save submitted is the last one written.
//! - [`InlineExecutor`] runs each request on submit and queues the
//!   completion. It suits single-threaded hosts and deterministic tests.
//!
//! # Failure Modes
//!
//! - A store error is carried in the completion, never raised.
//! - If the worker thread is gone, submits complete immediately with
//!   [`StoreError::WorkerGone`].

use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use dashgrid_layout::LayoutState;

use crate::store::{LayoutStore, StoreError};

/// Handle identifying one submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreTicket(u64);

impl StoreTicket {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Work for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRequest {
    Load { key: String },
    Save { key: String, state: LayoutState },
}

impl StoreRequest {
    #[must_use]
    pub const fn kind(&self) -> StoreRequestKind {
        match self {
            Self::Load { .. } => StoreRequestKind::Load,
            Self::Save { .. } => StoreRequestKind::Save,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreRequestKind {
    Load,
    Save,
}

/// Successful result of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Loaded(Option<LayoutState>),
    Saved,
}

/// A finished request.
#[derive(Debug)]
pub struct StoreCompletion {
    pub ticket: StoreTicket,
    pub kind: StoreRequestKind,
    pub result: Result<StoreOutcome, StoreError>,
}

/// Runs store requests off the interaction path.
pub trait StoreExecutor {
    /// Queue a request.
    fn submit(&mut self, request: StoreRequest) -> StoreTicket;

    /// Next finished request, if one is ready.
    fn try_next(&mut self) -> Option<StoreCompletion>;

    /// Next finished request, waiting up to `timeout`.
    fn wait_next(&mut self, timeout: Duration) -> Option<StoreCompletion>;
}

fn execute(store: &mut dyn LayoutStore, request: StoreRequest) -> Result<StoreOutcome, StoreError> {
    match request {
        StoreRequest::Load { key } => {
            let loaded = store.load(&key)?;
            tracing::debug!(
                target: "dashgrid.store",
                key = %key,
                found = loaded.is_some(),
                "layout loaded"
            );
            Ok(StoreOutcome::Loaded(loaded))
        }
        StoreRequest::Save { key, state } => {
            store.save(&key, &state)?;
            tracing::debug!(
                target: "dashgrid.store",
                key = %key,
                cards = state.order.len(),
                hidden = state.hidden.len(),
                "layout saved"
            );
            Ok(StoreOutcome::Saved)
        }
    }
}

// ---------------------------------------------------------------------------
// InlineExecutor
// ---------------------------------------------------------------------------

/// Executes on submit; completions are delivered on the next drain.
#[derive(Debug)]
pub struct InlineExecutor<S> {
    store: S,
    completed: VecDeque<StoreCompletion>,
    next_ticket: u64,
}

impl<S: LayoutStore> InlineExecutor<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            completed: VecDeque::new(),
            next_ticket: 1,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Completions not yet drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.completed.len()
    }
}

impl<S: LayoutStore> StoreExecutor for InlineExecutor<S> {
    fn submit(&mut self, request: StoreRequest) -> StoreTicket {
        let ticket = StoreTicket(self.next_ticket);
        self.next_ticket += 1;
        let kind = request.kind();
        let result = execute(&mut self.store, request);
        self.completed.push_back(StoreCompletion {
            ticket,
            kind,
            result,
        });
        ticket
    }

    fn try_next(&mut self) -> Option<StoreCompletion> {
        self.completed.pop_front()
    }

    fn wait_next(&mut self, _timeout: Duration) -> Option<StoreCompletion> {
        self.completed.pop_front()
    }
}

// ---------------------------------------------------------------------------
// ThreadedExecutor
// ---------------------------------------------------------------------------

/// Worker thread that owns the store.
///
/// Dropping the executor closes the request channel and joins the worker
/// after it finishes everything already submitted.
#[derive(Debug)]
pub struct ThreadedExecutor {
    requests: Option<mpsc::Sender<(StoreTicket, StoreRequest)>>,
    completions: mpsc::Receiver<StoreCompletion>,
    local: VecDeque<StoreCompletion>,
    worker: Option<thread::JoinHandle<()>>,
    next_ticket: u64,
}

impl ThreadedExecutor {
    /// Move `store` onto a new worker thread.
    pub fn spawn<S: LayoutStore + 'static>(mut store: S) -> Result<Self, StoreError> {
        let (request_tx, request_rx) = mpsc::channel::<(StoreTicket, StoreRequest)>();
        let (completion_tx, completion_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("dashgrid-store".to_owned())
            .spawn(move || {
                for (ticket, request) in request_rx {
                    let kind = request.kind();
                    let result = execute(&mut store, request);
                    let completion = StoreCompletion {
                        ticket,
                        kind,
                        result,
                    };
                    if completion_tx.send(completion).is_err() {
                        break;
                    }
                }
                tracing::debug!(target: "dashgrid.store", "store worker exiting");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            completions: completion_rx,
            local: VecDeque::new(),
            worker: Some(worker),
            next_ticket: 1,
        })
    }

    /// Close the request channel and wait for the worker to finish.
    pub fn shutdown(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!(target: "dashgrid.store", "store worker panicked");
        }
    }
}

impl StoreExecutor for ThreadedExecutor {
    fn submit(&mut self, request: StoreRequest) -> StoreTicket {
        let ticket = StoreTicket(self.next_ticket);
        self.next_ticket += 1;
        let kind = request.kind();
        let sent = self
            .requests
            .as_ref()
            .is_some_and(|tx| tx.send((ticket, request)).is_ok());
        if !sent {
            tracing::warn!(
                target: "dashgrid.store",
                ticket = ticket.get(),
                "store worker unavailable; request dropped"
            );
            self.local.push_back(StoreCompletion {
                ticket,
                kind,
                result: Err(StoreError::WorkerGone),
            });
        }
        ticket
    }

    fn try_next(&mut self) -> Option<StoreCompletion> {
        self.local
            .pop_front()
            .or_else(|| self.completions.try_recv().ok())
    }

    fn wait_next(&mut self, timeout: Duration) -> Option<StoreCompletion> {
        self.local
            .pop_front()
            .or_else(|| self.completions.recv_timeout(timeout).ok())
    }
}

impl Drop for ThreadedExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        InlineExecutor, StoreExecutor, StoreOutcome, StoreRequest, StoreRequestKind,
        ThreadedExecutor,
    };
    use crate::store::{MemoryStore, StoreError};
    use dashgrid_core::CardId;
    use dashgrid_layout::LayoutState;

    const WAIT: Duration = Duration::from_secs(5);

    fn state(ids: &[&str]) -> LayoutState {
        LayoutState {
            order: ids.iter().map(|s| CardId::from(*s)).collect(),
            ..LayoutState::default()
        }
    }

    fn save(key: &str, ids: &[&str]) -> StoreRequest {
        StoreRequest::Save {
            key: key.to_owned(),
            state: state(ids),
        }
    }

    #[test]
    fn inline_executor_completes_in_order() {
        let mut exec = InlineExecutor::new(MemoryStore::new());
        let first = exec.submit(save("k", &["a"]));
        let second = exec.submit(StoreRequest::Load { key: "k".to_owned() });
        assert_eq!(exec.pending(), 2);

        let done = exec.try_next().unwrap();
        assert_eq!(done.ticket, first);
        assert_eq!(done.kind, StoreRequestKind::Save);
        assert!(matches!(done.result, Ok(StoreOutcome::Saved)));

        let done = exec.try_next().unwrap();
        assert_eq!(done.ticket, second);
        match done.result {
            Ok(StoreOutcome::Loaded(Some(loaded))) => assert_eq!(loaded, state(&["a"])),
            other => panic!("unexpected completion: {other:?}"),
        }
        assert!(exec.try_next().is_none());
    }

    #[test]
    fn inline_executor_reports_store_errors() {
        let store = MemoryStore::new();
        store.fail_loads(true);
        let mut exec = InlineExecutor::new(store);
        exec.submit(StoreRequest::Load { key: "k".to_owned() });
        let done = exec.try_next().unwrap();
        assert!(matches!(done.result, Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn threaded_executor_runs_requests_in_submission_order() {
        let store = MemoryStore::new();
        let mut exec = ThreadedExecutor::spawn(store.clone()).unwrap();
        let tickets: Vec<_> = (0..5)
            .map(|i| exec.submit(save("k", &[format!("card-{i}").as_str()])))
            .collect();

        let mut seen = Vec::new();
        while seen.len() < tickets.len() {
            let done = exec.wait_next(WAIT).expect("completion before timeout");
            assert!(done.result.is_ok());
            seen.push(done.ticket);
        }
        assert_eq!(seen, tickets);
        assert_eq!(store.record("k"), Some(state(&["card-4"])));
    }

    #[test]
    fn threaded_executor_drop_flushes_pending_work() {
        let store = MemoryStore::new();
        {
            let mut exec = ThreadedExecutor::spawn(store.clone()).unwrap();
            exec.submit(save("k", &["x"]));
        }
        assert_eq!(store.record("k"), Some(state(&["x"])));
    }

    #[test]
    fn submit_after_shutdown_completes_with_worker_gone() {
        let mut exec = ThreadedExecutor::spawn(MemoryStore::new()).unwrap();
        exec.shutdown();
        let ticket = exec.submit(save("k", &["x"]));
        let done = exec.try_next().unwrap();
        assert_eq!(done.ticket, ticket);
        assert!(matches!(done.result, Err(StoreError::WorkerGone)));
    }
}
