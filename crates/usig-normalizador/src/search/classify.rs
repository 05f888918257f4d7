use itertools::{Either, Itertools};
use tracing::{debug, warn};
use usig_transport::{RawAddress, RawResponse, TransportError};

use super::SearchOutcome;
use crate::{
    SearchConfig,
    address::Address,
    error::{Result, UsigError},
};

/// Message for bodies that decoded but do not look like a normalization response.
pub const UNEXPECTED_RESPONSE: &str = "unexpected response";
/// Message for responses whose every entry was missing required fields.
pub const MALFORMED_RESPONSE: &str = "malformed response";

/// Maps the result of a forward lookup onto a [`SearchOutcome`].
///
/// Classification never fails: transport problems and odd payloads become
/// [`SearchOutcome::Error`], an explicit "no such street" answer becomes
/// [`SearchOutcome::NotFound`]. Individual malformed entries are skipped.
pub fn classify(
    response: std::result::Result<&RawResponse, &TransportError>,
    config: &SearchConfig,
) -> SearchOutcome {
    let raw = match response {
        Ok(raw) => raw,
        Err(err) if err.is_decode() => {
            warn!(error = %err, "Undecodable response body");
            return SearchOutcome::Error(UNEXPECTED_RESPONSE.to_string());
        }
        Err(err) => return SearchOutcome::Error(err.to_string()),
    };

    let entries = match raw.entries() {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            return match raw.error_message() {
                Some(message) if config.is_not_found_message(message) => {
                    debug!(message, "Service reported no match");
                    SearchOutcome::NotFound
                }
                message => {
                    warn!(?message, "Response carries no results");
                    SearchOutcome::Error(UNEXPECTED_RESPONSE.to_string())
                }
            };
        }
    };

    let (mut addresses, malformed): (Vec<Address>, Vec<TransportError>) =
        entries.iter().partition_map(|entry| match RawAddress::from_value(entry) {
            Ok(raw) => Either::Left(Address::from_raw(raw)),
            Err(err) => Either::Right(err),
        });

    if !malformed.is_empty() {
        warn!(
            skipped = malformed.len(),
            total = entries.len(),
            first_error = %malformed[0],
            "Skipping malformed response entries"
        );
    }
    if addresses.is_empty() {
        return if malformed.is_empty() {
            SearchOutcome::NotFound
        } else {
            SearchOutcome::Error(MALFORMED_RESPONSE.to_string())
        };
    }

    addresses.truncate(config.max_results);
    SearchOutcome::Results(addresses)
}

/// Interprets a reverse lookup response, which is a single address object.
pub fn classify_location(response: std::result::Result<RawResponse, TransportError>) -> Result<Address> {
    let raw = response?;
    if let Some(message) = raw.error_message() {
        return Err(UsigError::Location(message.trim().to_string()));
    }
    RawAddress::from_value(raw.as_value())
        .map(Address::from_raw)
        .map_err(|err| {
            warn!(error = %err, "Unexpected reverse lookup response");
            UsigError::Location(UNEXPECTED_RESPONSE.to_string())
        })
}
