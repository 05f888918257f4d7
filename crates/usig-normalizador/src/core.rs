//! Entry point tying a [`GeocodeClient`] to a [`SearchConfig`].
//!
//! [`Normalizador`] hands out search sessions for interactive autocomplete and offers
//! one-shot forward and reverse lookups for everything else.
//!
//! ```rust,no_run
//! use usig_normalizador::{Normalizador, SearchOutcome};
//!
//! # async fn demo() -> Result<(), usig_normalizador::error::UsigError> {
//! let normalizador = Normalizador::new()?;
//!
//! // One-shot lookup, no debounce
//! if let SearchOutcome::Results(addresses) = normalizador.search("corrientes 1000").await {
//!     println!("First match: {}", addresses[0]);
//! }
//!
//! // Current location to address
//! let address = normalizador.locate(-34.6037, -58.3816).await?;
//! println!("You are at {address}");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::{debug, info, instrument};
use usig_transport::GeocodeClient;
#[cfg(feature = "http")]
use usig_transport::{ClientConfig, HttpGeocodeClient};

use crate::{
    SearchConfig,
    address::Address,
    error::Result,
    search::{SearchOutcome, classify, classify_location, normalize},
    session::SessionHandle,
};
#[cfg(feature = "http")]
use crate::SearchConfigBuilder;

/// Shared client plus the settings every lookup and session uses.
#[derive(Debug)]
pub struct Normalizador<C> {
    client: Arc<C>,
    config: SearchConfig,
}

impl<C> Clone for Normalizador<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
        }
    }
}

#[cfg(feature = "http")]
impl Normalizador<HttpGeocodeClient> {
    /// Creates a `Normalizador` talking to the public USIG service.
    ///
    /// Settings come from the defaults, overridable through `USIG_BASE_URL`,
    /// `USIG_MAX_RESULTS` and `USIG_DEBOUNCE_MS`.
    #[instrument(name = "Create Normalizador", level = "info")]
    pub fn new() -> Result<Self> {
        let config = SearchConfigBuilder::from_env()?.try_build()?;
        Self::with_configs(ClientConfig::from_env(), config)
    }

    /// Creates a `Normalizador` with explicit transport and search settings.
    pub fn with_configs(client_config: ClientConfig, config: SearchConfig) -> Result<Self> {
        info!(
            base_url = %client_config.base_url,
            cache_policy = ?client_config.cache_policy,
            max_results = config.max_results,
            "Creating HTTP Normalizador"
        );
        let client = HttpGeocodeClient::with_config(client_config)?;
        Ok(Self::with_client(client, config))
    }
}

impl<C: GeocodeClient> Normalizador<C> {
    pub fn with_client(client: C, config: SearchConfig) -> Self {
        Self::with_shared_client(Arc::new(client), config)
    }

    pub fn with_shared_client(client: Arc<C>, config: SearchConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Normalizes, fetches and classifies a single query right away.
    #[instrument(name = "One-shot search", skip(self), level = "debug")]
    pub async fn search(&self, raw: &str) -> SearchOutcome {
        let Some(query) = normalize(raw) else {
            debug!("Blank query, nothing to search");
            return SearchOutcome::Empty;
        };
        let response = self
            .client
            .fetch(&query, self.config.geocode, self.config.max_results)
            .await;
        classify(response.as_ref(), &self.config)
    }

    /// Finds the address closest to a WGS84 coordinate.
    #[instrument(name = "Locate", skip(self), level = "debug")]
    pub async fn locate(&self, latitude: f64, longitude: f64) -> Result<Address> {
        let response = self.client.reverse(latitude, longitude).await;
        let address = classify_location(response)?;
        debug!(address = %address.full_text(), "Location resolved");
        Ok(address)
    }

    /// Starts an interactive search session. Must be called from within a tokio runtime.
    #[must_use]
    pub fn session(&self) -> SessionHandle {
        SessionHandle::spawn(Arc::clone(&self.client), self.config.clone())
    }

    /// Starts a session whose input is pre-filled with a previously chosen address.
    #[must_use]
    pub fn session_with_initial(&self, initial: &Address) -> SessionHandle {
        SessionHandle::spawn_with_initial(Arc::clone(&self.client), self.config.clone(), initial)
    }
}
