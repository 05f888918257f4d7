use std::time::Duration;

use crate::error::UsigError;

/// Default number of addresses requested from the service and kept per outcome.
pub const DEFAULT_MAX_RESULTS: usize = 10;
/// Upper bound accepted for `max_results`.
pub const MAX_RESULTS_LIMIT: usize = 50;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
/// Substring of the upstream error message meaning "no such street".
pub const DEFAULT_NOT_FOUND_PHRASE: &str = "calle inexistente";

/// Settings shared by the classifier and the search session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of addresses requested and kept in a `Results` outcome
    pub max_results: usize,
    /// Quiet period after the last keystroke before a request goes out
    pub debounce: Duration,
    /// Ask the service to attach coordinates to each address
    pub geocode: bool,
    /// Case-insensitive substring identifying a "not found" error message
    pub not_found_phrase: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            debounce: DEFAULT_DEBOUNCE,
            geocode: true,
            not_found_phrase: DEFAULT_NOT_FOUND_PHRASE.to_string(),
        }
    }
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::new()
    }

    /// Whether an upstream error message means "no such street" rather than a failure.
    #[must_use]
    pub fn is_not_found_message(&self, message: &str) -> bool {
        message
            .to_lowercase()
            .contains(&self.not_found_phrase.to_lowercase())
    }
}

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Create a builder that searches on every change, without waiting for typing to settle
    pub fn instant() -> Self {
        Self::new().debounce(Duration::ZERO)
    }

    /// Create a builder from the defaults overridden by `USIG_MAX_RESULTS` and `USIG_DEBOUNCE_MS`
    pub fn from_env() -> Result<Self, UsigError> {
        let mut builder = Self::new();
        if let Ok(value) = std::env::var("USIG_MAX_RESULTS") {
            let max = value.trim().parse::<usize>().map_err(|e| {
                UsigError::ConfigError(format!("USIG_MAX_RESULTS must be a number, got {value:?}: {e}"))
            })?;
            builder = builder.max_results(max);
        }
        if let Ok(value) = std::env::var("USIG_DEBOUNCE_MS") {
            let millis = value.trim().parse::<u64>().map_err(|e| {
                UsigError::ConfigError(format!("USIG_DEBOUNCE_MS must be a number, got {value:?}: {e}"))
            })?;
            builder = builder.debounce(Duration::from_millis(millis));
        }
        Ok(builder)
    }

    /// Set the maximum number of results, clamped to `1..=MAX_RESULTS_LIMIT`
    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max.clamp(1, MAX_RESULTS_LIMIT);
        self
    }

    /// Set the debounce window
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.config.debounce = debounce;
        self
    }

    /// Enable or disable coordinates in responses
    pub fn geocode(mut self, enabled: bool) -> Self {
        self.config.geocode = enabled;
        self
    }

    /// Set the phrase that marks an upstream error message as "not found"
    pub fn not_found_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.config.not_found_phrase = phrase.into().trim().to_string();
        self
    }

    /// Build the final configuration
    pub fn build(self) -> SearchConfig {
        self.config
    }

    /// Build the final configuration, rejecting settings that would misclassify responses
    pub fn try_build(self) -> Result<SearchConfig, UsigError> {
        if self.config.not_found_phrase.is_empty() {
            return Err(UsigError::ConfigError(
                "Not-found phrase must not be empty, it would match every error message".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builder() {
        let config = SearchConfigBuilder::new().build();
        assert_eq!(config.max_results, 10);
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert!(config.geocode);
        assert_eq!(config.not_found_phrase, "calle inexistente");
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn test_instant_preset() {
        let config = SearchConfigBuilder::instant().build();
        assert_eq!(config.debounce, Duration::ZERO);
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_method_chaining() {
        let config = SearchConfig::builder()
            .max_results(5)
            .debounce(Duration::from_millis(250))
            .geocode(false)
            .not_found_phrase("  Sin Resultados ")
            .build();

        assert_eq!(config.max_results, 5);
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert!(!config.geocode);
        assert_eq!(config.not_found_phrase, "Sin Resultados");
    }

    #[test]
    fn test_max_results_is_clamped() {
        assert_eq!(SearchConfigBuilder::new().max_results(0).build().max_results, 1);
        assert_eq!(
            SearchConfigBuilder::new().max_results(1000).build().max_results,
            MAX_RESULTS_LIMIT
        );
    }

    #[test]
    fn test_empty_phrase_is_rejected() {
        let result = SearchConfigBuilder::new().not_found_phrase("   ").try_build();
        assert!(matches!(result, Err(UsigError::ConfigError(_))));
        assert!(SearchConfigBuilder::new().try_build().is_ok());
    }

    #[test]
    fn test_not_found_matching_is_case_insensitive_substring() {
        let config = SearchConfig::default();
        assert!(config.is_not_found_message("Calle inexistente"));
        assert!(config.is_not_found_message("Error: CALLE INEXISTENTE (foo)"));
        assert!(!config.is_not_found_message("Calle no existe"));
        assert!(!config.is_not_found_message(""));
    }
}
