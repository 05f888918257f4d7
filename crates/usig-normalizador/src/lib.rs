//! USIG Normalizador - address autocomplete for Buenos Aires
//!
//! This crate turns keystrokes into normalized addresses using the city's USIG
//! `normalizar` service. Input is debounced, superseded requests are cancelled and
//! their late answers ignored, and every response is classified into a single
//! [`SearchOutcome`] that a presentation layer can render as a list, an empty state or
//! an error banner.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use usig_normalizador::{Normalizador, SearchOutcome, SessionEvent};
//!
//! # async fn demo() -> Result<(), usig_normalizador::error::UsigError> {
//! let normalizador = Normalizador::new()?;
//! let mut session = normalizador.session();
//!
//! // Feed every change of the text field
//! session.input("corr")?;
//! session.input("corrientes 10")?;
//!
//! while let Some(event) = session.next_event().await {
//!     match event {
//!         SessionEvent::Outcome(SearchOutcome::Results(addresses)) => {
//!             for address in &addresses {
//!                 println!("{address}");
//!             }
//!             // The user picks the first one
//!             session.select(0)?;
//!         }
//!         SessionEvent::Committed(address) => println!("Chosen: {}", address.full_text()),
//!         SessionEvent::Closed => break,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! - [`normalize`]: trims and lowercases input, rejects blank queries
//! - [`GeocodeClient`]: performs the request (reqwest implementation behind the `http` feature)
//! - [`classify`]: maps a response onto a [`SearchOutcome`]
//! - [`SearchSession`]: pure state machine tying the above together; [`SessionHandle`] runs it
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod address;
mod config;
mod core;
pub mod error;
mod search;
mod session;

pub use crate::core::Normalizador;

pub use address::{Address, AddressKind, Coordinates};
pub use config::{
    DEFAULT_DEBOUNCE, DEFAULT_MAX_RESULTS, DEFAULT_NOT_FOUND_PHRASE, MAX_RESULTS_LIMIT,
    SearchConfig, SearchConfigBuilder,
};
pub use search::{
    MALFORMED_RESPONSE, SearchOutcome, UNEXPECTED_RESPONSE, classify, classify_location,
    normalize,
};
pub use session::{Effect, PendingRequest, SearchSession, SessionEvent, SessionHandle, SessionState};
pub use usig_transport as transport;
pub use usig_transport::{GeocodeClient, RawResponse, TransportError};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the library.
///
/// Installs a `tracing-subscriber` formatter filtered by `RUST_LOG` when set, or by
/// `level` otherwise. Only the first call has any effect.
///
/// # Examples
///
/// ```rust
/// use tracing::Level;
/// use usig_normalizador::init_logging;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), usig_normalizador::error::UsigError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::UsigError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| error::UsigError::Other(anyhow::anyhow!(e)))?;
        Ok(())
    })
}
