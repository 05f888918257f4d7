//! Transport layer for the USIG address normalization service.
//!
//! This crate knows how to talk to `normalizar`: it builds requests with the exact
//! upstream parameter names, decodes response bodies into [`RawResponse`] and exposes
//! the [`GeocodeClient`] trait the search pipeline depends on. Interpreting responses
//! (results, "not found", errors) is left to the caller.
//!
//! The reqwest implementation, [`HttpGeocodeClient`], lives behind the default `http`
//! feature.

mod client;
mod error;
pub mod wire;

#[cfg(feature = "http")]
pub mod http;

pub use client::GeocodeClient;
pub use error::{Result, TransportError};
pub use wire::{NormalizeParams, RawAddress, RawCoordinates, RawResponse, ReverseParams};

#[cfg(feature = "http")]
pub use http::{CachePolicy, ClientConfig, HttpGeocodeClient};
