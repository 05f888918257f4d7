use std::sync::Arc;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, trace};
use usig_transport::{GeocodeClient, RawResponse, TransportError};

use super::{Effect, PendingRequest, SearchSession};
use crate::{
    SearchConfig,
    address::Address,
    error::{Result, UsigError},
    search::SearchOutcome,
};

/// Something the presentation layer should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A request started (`true`) or is no longer outstanding (`false`).
    Searching(bool),
    /// A new current outcome; replaces whatever was shown before.
    Outcome(SearchOutcome),
    /// The input field text was replaced by the session.
    Reseeded(String),
    /// The user committed this address. Delivered once, right before `Closed`.
    Committed(Address),
    Closed,
}

#[derive(Debug)]
enum Command {
    Input(String),
    Select(usize),
    Close,
}

type Completion = (u64, std::result::Result<RawResponse, TransportError>);

/// Owner side of a search session running on a tokio task.
///
/// Dropping the handle closes the session.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    outcome: watch::Receiver<SearchOutcome>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Starts a session. Must be called from within a tokio runtime.
    pub fn spawn<C: GeocodeClient>(client: Arc<C>, config: SearchConfig) -> Self {
        Self::spawn_inner(client, config, None)
    }

    /// Starts a session with the input pre-filled from a previously chosen address.
    pub fn spawn_with_initial<C: GeocodeClient>(
        client: Arc<C>,
        config: SearchConfig,
        initial: &Address,
    ) -> Self {
        Self::spawn_inner(client, config, Some(initial.display_text().to_string()))
    }

    fn spawn_inner<C: GeocodeClient>(
        client: Arc<C>,
        config: SearchConfig,
        initial: Option<String>,
    ) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (outcome_tx, outcome) = watch::channel(SearchOutcome::Empty);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        if let Some(text) = initial {
            // The receiver is alive until the task below exits
            let _ = commands.send(Command::Input(text));
        }

        let runner = Runner {
            session: SearchSession::new(config),
            client,
            commands: commands_rx,
            completions_tx,
            completions: completions_rx,
            events: events_tx,
            outcome: outcome_tx,
            deadline: None,
            in_flight: None,
            searching: false,
        };
        let task = tokio::spawn(runner.run().instrument(info_span!("search_session")));

        Self {
            commands,
            events,
            outcome,
            task,
        }
    }

    /// Reports new raw input text.
    pub fn input(&self, raw: impl Into<String>) -> Result<()> {
        self.send(Command::Input(raw.into()))
    }

    /// Reports that the user picked the `index`-th address of the current outcome.
    pub fn select(&self, index: usize) -> Result<()> {
        self.send(Command::Select(index))
    }

    /// Closes the session. Closing twice is harmless.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Next event, or `None` once the session task has finished and all events were read.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Latest outcome, without consuming events.
    #[must_use]
    pub fn outcome(&self) -> SearchOutcome {
        self.outcome.borrow().clone()
    }

    /// Watch channel tracking the latest outcome.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchOutcome> {
        self.outcome.clone()
    }

    /// Waits for the session task to finish, closing the session first.
    pub async fn join(self) -> Result<()> {
        self.close();
        self.task
            .await
            .map_err(|e| UsigError::Other(anyhow::anyhow!("search session task failed: {e}")))
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| UsigError::SessionClosed)
    }
}

struct Runner<C> {
    session: SearchSession,
    client: Arc<C>,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    events: mpsc::UnboundedSender<SessionEvent>,
    outcome: watch::Sender<SearchOutcome>,
    deadline: Option<Instant>,
    in_flight: Option<CancellationToken>,
    searching: bool,
}

impl<C: GeocodeClient> Runner<C> {
    async fn run(mut self) {
        debug!("Search session started");
        while !self.session.is_closed() {
            let effects = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Input(raw)) => self.session.on_input(raw),
                    Some(Command::Select(index)) => self.session.select(index),
                    Some(Command::Close) | None => self.session.close(),
                },
                () = sleep_until(self.deadline.unwrap_or_else(Instant::now)), if self.deadline.is_some() => {
                    self.deadline = None;
                    self.session.on_debounce_elapsed()
                }
                Some((generation, response)) = self.completions.recv() => {
                    self.session.on_response(generation, response.as_ref())
                }
            };
            self.apply(effects);
        }

        self.commands.close();
        self.cancel_fetch();
        self.set_searching(false);
        self.emit(SessionEvent::Closed);
        debug!("Search session closed");
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            trace!(?effect, "Applying effect");
            match effect {
                Effect::StartDebounce(delay) => self.deadline = Some(Instant::now() + delay),
                Effect::Fetch(request) => self.start_fetch(request),
                Effect::CancelFetch => self.cancel_fetch(),
                Effect::Emit(outcome) => {
                    self.in_flight = None;
                    self.set_searching(false);
                    self.outcome.send_replace(outcome.clone());
                    self.emit(SessionEvent::Outcome(outcome));
                }
                Effect::Reseed(text) => self.emit(SessionEvent::Reseeded(text)),
                Effect::Commit(address) => self.emit(SessionEvent::Committed(address)),
            }
        }
    }

    fn start_fetch(&mut self, request: PendingRequest) {
        self.cancel_fetch();

        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        self.set_searching(true);

        let client = Arc::clone(&self.client);
        let completions = self.completions_tx.clone();
        let config = self.session.config();
        let (geocode, max_results) = (config.geocode, config.max_results);
        let span = info_span!("fetch", generation = request.generation, query = %request.query);

        tokio::spawn(
            async move {
                let response = tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("Request cancelled");
                        return;
                    }
                    response = client.fetch(&request.query, geocode, max_results) => response,
                };
                let _ = completions.send((request.generation, response));
            }
            .instrument(span),
        );
    }

    fn cancel_fetch(&mut self) {
        if let Some(cancel) = self.in_flight.take() {
            cancel.cancel();
            self.set_searching(false);
        }
    }

    fn set_searching(&mut self, searching: bool) {
        if self.searching != searching {
            self.searching = searching;
            self.emit(SessionEvent::Searching(searching));
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine; the session keeps its own state
        let _ = self.events.send(event);
    }
}
