//! Incremental page loader.
//!
//! Owns the pagination state of one listing, decides when the next page is
//! due and makes sure a single fetch runs at a time. Renderers follow it
//! through a watch channel and feed scroll or visibility signals back in.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::{sync::watch, time::Instant};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::LoaderConfig,
    error::LoaderError,
    fetch::FetchPage,
    sizing::PageSizer,
    state::{Completion, LoaderState, Machine, SkipReason, Ticket},
    trigger::{ScrollPosition, Trigger, TriggerKind},
};

/// What a loader call ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page was fetched and appended
    Appended {
        /// Records in the page
        received: usize,
    },
    /// The fetch failed, the error is in the state
    Failed,
    /// A reset happened while the fetch was in flight, its result was dropped
    Superseded,
    /// No fetch was started
    Skipped(SkipReason),
}

struct Inner<F> {
    machine: Machine,
    sizer: PageSizer,
    fetcher: Arc<F>,
    cancel: CancellationToken,
}

/// A fetch that was allowed to start
struct Started<F> {
    ticket: Ticket,
    fetcher: Arc<F>,
    cancel: CancellationToken,
}

/// Hands the ticket back when a fetch future is dropped before completing
struct InFlight<'a, F> {
    inner: &'a Mutex<Inner<F>>,
    tx: &'a watch::Sender<LoaderState>,
    ticket: Ticket,
    armed: bool,
}

impl<F> Drop for InFlight<'_, F> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.machine.abort(self.ticket) {
            debug!(
                generation = self.ticket.generation,
                cursor = self.ticket.request.cursor,
                "fetch dropped before completion"
            );
            let _ = self.tx.send_replace(inner.machine.state().clone());
        }
    }
}

/// Incremental page loader over a [`FetchPage`] capability
pub struct PageLoader<F> {
    inner: Mutex<Inner<F>>,
    trigger: TriggerKind,
    tx: watch::Sender<LoaderState>,
}

#[allow(clippy::future_not_send, reason = "fetch futures are not required to be Send")]
impl<F: FetchPage> PageLoader<F> {
    /// Create a loader. Nothing is fetched before [`Self::initialize`].
    pub fn new(fetcher: F, config: LoaderConfig) -> Self {
        let (tx, _rx) = watch::channel(LoaderState::default());
        let inner = Inner {
            machine: Machine::new(),
            sizer: PageSizer::new(config.sizing, config.page_size),
            fetcher: Arc::new(fetcher),
            cancel: CancellationToken::new(),
        };
        Self { inner: Mutex::new(inner), trigger: config.trigger, tx }
    }

    /// Return inner state locked
    fn lock_inner(&self) -> Result<MutexGuard<'_, Inner<F>>, LoaderError> {
        // Map to string because PoisonError holds the guard
        self.inner.lock().map_err(|e| LoaderError::Poisoned(e.to_string()))
    }

    fn publish(&self, state: &LoaderState) {
        let _ = self.tx.send_replace(state.clone());
    }

    /// Receiver of the state published after every transition
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoaderState> {
        self.tx.subscribe()
    }

    /// Stream of state snapshots, starting with the current one
    #[must_use]
    pub fn snapshots(&self) -> WatchStream<LoaderState> {
        WatchStream::new(self.tx.subscribe())
    }

    /// Latest published state
    #[must_use]
    pub fn state(&self) -> LoaderState {
        self.tx.borrow().clone()
    }

    /// Size the next request will ask for
    pub fn page_size(&self) -> Result<usize, LoaderError> {
        Ok(self.lock_inner()?.sizer.page_size())
    }

    /// Cancel any in-flight fetch, clear the state and fetch the first page
    pub async fn initialize(&self, page_size: usize) -> Result<FetchOutcome, LoaderError> {
        let started = {
            let mut inner = self.lock_inner()?;
            self.reset(&mut inner, page_size)
        };
        self.run(started).await
    }

    /// [`Self::initialize`] with a page size fitted to `viewport_height`
    pub async fn initialize_for_viewport(
        &self,
        viewport_height: f64,
    ) -> Result<FetchOutcome, LoaderError> {
        let page_size = self.lock_inner()?.sizer.initial_for_viewport(viewport_height);
        self.initialize(page_size).await
    }

    /// Switch to another fetch capability, e.g. a new endpoint, and start over
    pub async fn retarget(&self, fetcher: F, page_size: usize) -> Result<FetchOutcome, LoaderError> {
        let started = {
            let mut inner = self.lock_inner()?;
            inner.fetcher = Arc::new(fetcher);
            self.reset(&mut inner, page_size)
        };
        self.run(started).await
    }

    fn reset(&self, inner: &mut Inner<F>, page_size: usize) -> Started<F> {
        inner.cancel.cancel();
        inner.cancel = CancellationToken::new();
        inner.sizer.reset(page_size);
        let ticket = inner.machine.reset(inner.sizer.page_size());
        info!(generation = ticket.generation, page_size = ticket.request.page_size, "loader reset");
        self.publish(inner.machine.state());
        Started { ticket, fetcher: Arc::clone(&inner.fetcher), cancel: inner.cancel.clone() }
    }

    /// Fetch the next page unless one is in flight or the listing is exhausted
    pub async fn request_next_page(&self) -> Result<FetchOutcome, LoaderError> {
        let started = {
            let mut inner = self.lock_inner()?;
            let page_size = inner.sizer.page_size();
            match inner.machine.begin(page_size) {
                Ok(ticket) => {
                    self.publish(inner.machine.state());
                    Started {
                        ticket,
                        fetcher: Arc::clone(&inner.fetcher),
                        cancel: inner.cancel.clone(),
                    }
                }
                Err(reason) => {
                    debug!(?reason, "next page skipped");
                    return Ok(FetchOutcome::Skipped(reason));
                }
            }
        };
        self.run(started).await
    }

    /// Scroll signal from the renderer
    pub async fn notify_scroll_position(
        &self,
        position: ScrollPosition,
    ) -> Result<FetchOutcome, LoaderError> {
        self.record_signal(Some(position.viewport_height))?;
        if !self.trigger.crossed(&position) {
            return Ok(FetchOutcome::Skipped(SkipReason::BelowThreshold));
        }
        debug!(fraction = position.fraction(), "scroll trigger crossed");
        self.request_next_page().await
    }

    /// Visibility signal of the sentinel below the last row
    pub async fn notify_intersection(&self, visible: bool) -> Result<FetchOutcome, LoaderError> {
        if !visible {
            return Ok(FetchOutcome::Skipped(SkipReason::NotVisible));
        }
        self.record_signal(None)?;
        self.request_next_page().await
    }

    /// Feed the sizer, only while a request could start
    fn record_signal(&self, viewport_height: Option<f64>) -> Result<(), LoaderError> {
        let mut inner = self.lock_inner()?;
        if inner.machine.ready() {
            let _ = inner.sizer.signal(viewport_height, Instant::now());
        }
        Ok(())
    }

    async fn run(&self, started: Started<F>) -> Result<FetchOutcome, LoaderError> {
        let Started { ticket, fetcher, cancel } = started;
        let mut guard = InFlight { inner: &self.inner, tx: &self.tx, ticket, armed: true };
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(generation = ticket.generation, "fetch superseded by reset");
                return Ok(FetchOutcome::Superseded);
            }
            result = fetcher.fetch_page(ticket.request) => result,
        };
        guard.armed = false;
        if let Err(e) = &result {
            warn!(cursor = ticket.request.cursor, "fetch failed: {e}");
        }

        let mut inner = self.lock_inner()?;
        let outcome = match inner.machine.complete(ticket, result) {
            Completion::Appended { received } => {
                let state = inner.machine.state();
                info!(
                    received,
                    loaded = state.records.len(),
                    total = state.total,
                    has_more = state.has_more,
                    "page appended"
                );
                FetchOutcome::Appended { received }
            }
            Completion::Failed => FetchOutcome::Failed,
            Completion::Stale => return Ok(FetchOutcome::Superseded),
        };
        self.publish(inner.machine.state());
        Ok(outcome)
    }
}
