//! Debounced search session.
//!
//! [`SearchSession`] is a pure state machine: every event (a keystroke, the debounce
//! timer firing, a network completion, a selection) returns the list of [`Effect`]s
//! the caller has to carry out. It never sleeps, spawns or performs I/O itself, which
//! keeps ordering questions confined to one place. [`SessionHandle`] drives it on a
//! tokio task.
//!
//! A response is only applied when it belongs to the request the session is currently
//! awaiting. Each eligible query bumps the generation counter, so anything tagged with
//! an older generation is dropped on arrival no matter how it raced with cancellation.

mod runner;

use std::time::Duration;

use tracing::{debug, info};
use usig_transport::{RawResponse, TransportError};

pub use runner::{SessionEvent, SessionHandle};

use crate::{
    SearchConfig,
    address::Address,
    search::{SearchOutcome, classify, normalize},
};

/// The request a session is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Normalized query sent to the service
    pub query: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    /// Waiting for typing to settle; holds the raw input as last seen.
    Debouncing { input: String },
    Awaiting { generation: u64, query: String },
    Settled(SearchOutcome),
    Closed,
}

/// Work requested by a state transition, in the order it must be carried out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// (Re)arm the debounce timer, replacing any pending deadline.
    StartDebounce(Duration),
    /// Issue a request; its completion must be reported with the same generation.
    Fetch(PendingRequest),
    /// Cancel the in-flight request. Advisory only.
    CancelFetch,
    /// Publish a new current outcome.
    Emit(SearchOutcome),
    /// Replace the text shown in the input field.
    Reseed(String),
    /// The user picked a final address; the session is now closed.
    Commit(Address),
}

#[derive(Debug, Clone)]
pub struct SearchSession {
    config: SearchConfig,
    state: SessionState,
    generation: u64,
    outcome: SearchOutcome,
}

impl SearchSession {
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            generation: 0,
            outcome: SearchOutcome::Empty,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The latest emitted outcome. Stays visible while a newer search is under way.
    #[must_use]
    pub fn outcome(&self) -> &SearchOutcome {
        &self.outcome
    }

    #[must_use]
    pub fn pending(&self) -> Option<PendingRequest> {
        match &self.state {
            SessionState::Awaiting { generation, query } => Some(PendingRequest {
                query: query.clone(),
                generation: *generation,
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// The input text changed.
    pub fn on_input(&mut self, raw: impl Into<String>) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);
        match self.state {
            SessionState::Closed => return effects,
            SessionState::Awaiting { .. } => effects.push(Effect::CancelFetch),
            _ => {}
        }
        self.state = SessionState::Debouncing { input: raw.into() };
        effects.push(Effect::StartDebounce(self.config.debounce));
        effects
    }

    /// The debounce timer fired.
    pub fn on_debounce_elapsed(&mut self) -> Vec<Effect> {
        let SessionState::Debouncing { input } = &self.state else {
            return Vec::new();
        };

        match normalize(input) {
            None => {
                self.state = SessionState::Idle;
                self.outcome = SearchOutcome::Empty;
                vec![Effect::Emit(SearchOutcome::Empty)]
            }
            Some(query) => {
                self.generation += 1;
                let request = PendingRequest {
                    query: query.clone(),
                    generation: self.generation,
                };
                self.state = SessionState::Awaiting {
                    generation: self.generation,
                    query,
                };
                vec![Effect::Fetch(request)]
            }
        }
    }

    /// A request issued for `generation` completed.
    pub fn on_response(
        &mut self,
        generation: u64,
        response: Result<&RawResponse, &TransportError>,
    ) -> Vec<Effect> {
        match self.state {
            SessionState::Awaiting {
                generation: current,
                ..
            } if current == generation => {}
            _ => {
                debug!(
                    generation,
                    current = self.generation,
                    "Discarding stale response"
                );
                return Vec::new();
            }
        }

        let outcome = classify(response, &self.config);
        self.state = SessionState::Settled(outcome.clone());
        self.outcome = outcome.clone();
        vec![Effect::Emit(outcome)]
    }

    /// The user picked the `index`-th address of the current outcome.
    ///
    /// Selectable addresses are committed and close the session. Anything else is
    /// treated as a refinement: the input is re-seeded with the street name and a
    /// new search starts. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> Vec<Effect> {
        if self.is_closed() {
            return Vec::new();
        }
        let Some(address) = self.outcome.addresses().get(index).cloned() else {
            debug!(index, "Ignoring selection outside of current results");
            return Vec::new();
        };

        if address.is_selectable() {
            info!(address = %address.full_text(), "Address committed");
            let mut effects = self.close();
            effects.push(Effect::Commit(address));
            return effects;
        }

        let text = address.refinement_query();
        debug!(refinement = %text, "Refining non-selectable address");
        let mut effects = vec![Effect::Reseed(text.clone())];
        effects.extend(self.on_input(text));
        effects
    }

    /// Ends the session. Nothing is emitted afterwards.
    pub fn close(&mut self) -> Vec<Effect> {
        let was_awaiting = matches!(self.state, SessionState::Awaiting { .. });
        self.state = SessionState::Closed;
        if was_awaiting {
            vec![Effect::CancelFetch]
        } else {
            Vec::new()
        }
    }
}
