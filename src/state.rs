//! Loader state and its transition rules.
//!
//! Everything here is synchronous and free of I/O: the async loader feeds
//! events in and executes the returned tickets.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::LoaderError,
    page::{PageRequest, PageResponse, Record},
};

/// Coarse phase of a loader, derived from its state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Ready to fetch the next page
    Idle,
    /// A fetch is in flight
    Loading,
    /// No further pages for the current query
    Exhausted,
    /// The last fetch failed, a new request may retry
    Error,
}

/// Snapshot handed to renderers after every transition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderState {
    /// Accumulated records, in server order
    pub records: Arc<Vec<Record>>,
    /// A fetch is in flight
    pub loading: bool,
    /// More pages may exist
    pub has_more: bool,
    /// Last server reported total
    pub total: usize,
    /// Message of the last failed fetch, cleared by the next success
    pub error: Option<String>,
}

impl Default for LoaderState {
    fn default() -> Self {
        Self { records: Arc::default(), loading: false, has_more: true, total: 0, error: None }
    }
}

impl LoaderState {
    /// Offset of the next page
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.records.len()
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else if !self.has_more {
            Phase::Exhausted
        } else {
            Phase::Idle
        }
    }
}

/// Why a request did not start a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is in flight
    InFlight,
    /// The query has no more pages
    Exhausted,
    /// The scroll position is short of the trigger
    BelowThreshold,
    /// The sentinel reported itself hidden
    NotVisible,
    /// `initialize` was never called
    Uninitialized,
}

/// Permission to run one fetch, bound to the session that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    /// Session counter at issue time
    pub generation: u64,
    /// What to fetch
    pub request: PageRequest,
}

/// Effect of a completed fetch on the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Records were appended
    Appended {
        /// Number of records in the page
        received: usize,
    },
    /// The fetch failed, state keeps its records
    Failed,
    /// The ticket belongs to a session that was reset since
    Stale,
}

/// Pure pagination state machine
#[derive(Debug, Default)]
pub struct Machine {
    state: LoaderState,
    generation: u64,
}

impl Machine {
    /// Create an uninitialized machine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the current state
    #[must_use]
    pub const fn state(&self) -> &LoaderState {
        &self.state
    }

    /// Current session counter, zero until the first reset
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop all state and start a new session with its first fetch.
    ///
    /// Applies in any phase. Tickets of earlier sessions become stale.
    pub fn reset(&mut self, page_size: usize) -> Ticket {
        self.generation += 1;
        self.state = LoaderState { loading: true, ..LoaderState::default() };
        Ticket { generation: self.generation, request: PageRequest::new(0, page_size) }
    }

    /// Whether [`Self::begin`] would hand out a ticket right now
    #[must_use]
    pub const fn ready(&self) -> bool {
        self.generation != 0 && !self.state.loading && self.state.has_more
    }

    /// Ask for the next page
    pub fn begin(&mut self, page_size: usize) -> Result<Ticket, SkipReason> {
        if self.generation == 0 {
            return Err(SkipReason::Uninitialized);
        }
        if self.state.loading {
            return Err(SkipReason::InFlight);
        }
        if !self.state.has_more {
            return Err(SkipReason::Exhausted);
        }
        self.state.loading = true;
        Ok(Ticket {
            generation: self.generation,
            request: PageRequest::new(self.state.cursor(), page_size),
        })
    }

    /// Hand back a ticket whose fetch ended without a result.
    ///
    /// Returns whether the state changed, i.e. the ticket was the one in
    /// flight for the current session.
    pub fn abort(&mut self, ticket: Ticket) -> bool {
        if ticket.generation != self.generation || !self.state.loading {
            return false;
        }
        self.state.loading = false;
        true
    }

    /// Fold the result of a ticket's fetch into the state
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<PageResponse, LoaderError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            return Completion::Stale;
        }
        self.state.loading = false;
        match result {
            Ok(page) => {
                let received = page.records.len();
                let records = Arc::make_mut(&mut self.state.records);
                records.extend(page.records);
                self.state.total = page.total;
                self.state.has_more = received == ticket.request.page_size
                    && records.len() < page.total
                    && page.has_more != Some(false);
                self.state.error = None;
                Completion::Appended { received }
            }
            Err(e) => {
                self.state.error = Some(e.to_string());
                Completion::Failed
            }
        }
    }
}
