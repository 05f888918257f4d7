use std::{future::Future, sync::Arc};

use crate::{Result, wire::RawResponse};

/// Anything that can answer USIG normalization requests.
///
/// Implementations must tolerate being invoked repeatedly and having their futures
/// dropped mid-flight: dropping the future is how callers cancel a request.
pub trait GeocodeClient: Send + Sync + 'static {
    /// Forward lookup of a (normalized) free-text query.
    fn fetch(
        &self,
        query: &str,
        geocode: bool,
        max_results: usize,
    ) -> impl Future<Output = Result<RawResponse>> + Send;

    /// Reverse lookup of the address closest to a WGS84 coordinate.
    fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}

impl<C: GeocodeClient> GeocodeClient for Arc<C> {
    fn fetch(
        &self,
        query: &str,
        geocode: bool,
        max_results: usize,
    ) -> impl Future<Output = Result<RawResponse>> + Send {
        (**self).fetch(query, geocode, max_results)
    }

    fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<RawResponse>> + Send {
        (**self).reverse(latitude, longitude)
    }
}
