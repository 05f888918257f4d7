//! reqwest-backed [`GeocodeClient`] for the public USIG service.

use std::{future::Future, time::Duration};

use reqwest::{Client, Request, Url};
use tracing::{debug, instrument};

use crate::{
    Result, TransportError,
    client::GeocodeClient,
    wire::{NormalizeParams, RawResponse, ReverseParams},
};

mod cache;
use cache::ResponseCache;

pub const DEFAULT_BASE_URL: &str = "https://servicios.usig.buenosaires.gob.ar/normalizar/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Whether previously fetched responses may be served without hitting the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Serve from the cache when possible, otherwise fetch and remember.
    #[default]
    ReturnCacheElseLoad,
    /// Always fetch; the cache is neither read nor written.
    ReloadIgnoringCache,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub cache_policy: CachePolicy,
    pub cache_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_policy: CachePolicy::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Defaults, with the endpoint overridable through `USIG_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("USIG_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }
}

#[derive(Debug)]
pub struct HttpGeocodeClient {
    http: Client,
    base_url: Url,
    cache_policy: CachePolicy,
    cache: ResponseCache,
}

impl HttpGeocodeClient {
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url,
            cache_policy: config.cache_policy,
            cache: ResponseCache::new(config.cache_capacity),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Number of responses currently held in the cache.
    #[must_use]
    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    #[instrument(name = "USIG request", skip_all, fields(url = %request.url()), level = "debug")]
    async fn send(&self, request: Request) -> Result<RawResponse> {
        let key = request.url().to_string();
        let use_cache = self.cache_policy == CachePolicy::ReturnCacheElseLoad;

        if use_cache && let Some(hit) = self.cache.get(&key) {
            debug!("Serving response from cache");
            return Ok(hit);
        }

        let response = self.http.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: key,
            });
        }

        let body = response.bytes().await?;
        let raw = RawResponse::from_slice(&body)?;
        debug!(bytes = body.len(), "Response decoded");

        if use_cache {
            self.cache.insert(key, raw.clone());
        }
        Ok(raw)
    }
}

impl GeocodeClient for HttpGeocodeClient {
    fn fetch(
        &self,
        query: &str,
        geocode: bool,
        max_results: usize,
    ) -> impl Future<Output = Result<RawResponse>> + Send {
        let params = NormalizeParams::new(query, geocode, max_results);
        let request = self.http.get(self.base_url.clone()).query(&params).build();
        async move { self.send(request?).await }
    }

    fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<RawResponse>> + Send {
        let params = ReverseParams {
            lat: latitude,
            lng: longitude,
        };
        let request = self.http.get(self.base_url.clone()).query(&params).build();
        async move { self.send(request?).await }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use serde_json::json;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    struct StubServer {
        base_url: String,
        hits: Arc<AtomicUsize>,
        request_lines: Arc<Mutex<Vec<String>>>,
    }

    /// Serves the same canned response to every connection.
    async fn stub_server(status: u16, body: &'static str) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let request_lines = Arc::new(Mutex::new(Vec::new()));

        let (task_hits, task_lines) = (hits.clone(), request_lines.clone());
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let request = String::from_utf8_lossy(&buf);
                let first_line = request.lines().next().unwrap_or_default().to_string();
                task_lines.lock().unwrap().push(first_line);
                task_hits.fetch_add(1, Ordering::SeqCst);

                let response = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        StubServer {
            base_url: format!("http://{addr}/normalizar/"),
            hits,
            request_lines,
        }
    }

    fn client_for(server: &StubServer, policy: CachePolicy) -> HttpGeocodeClient {
        HttpGeocodeClient::with_config(
            ClientConfig::default()
                .with_base_url(server.base_url.clone())
                .with_cache_policy(policy),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_wire_parameters() {
        let server = stub_server(200, r#"{"direccionesNormalizadas": []}"#).await;
        let client = client_for(&server, CachePolicy::ReloadIgnoringCache);

        let raw = client.fetch("corrientes 1000", true, 7).await.unwrap();
        assert_eq!(raw.as_value(), &json!({"direccionesNormalizadas": []}));

        let lines = server.request_lines.lock().unwrap().clone();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(line.starts_with("GET /normalizar/?"), "got {line}");
        assert!(line.contains("direccion=corrientes+1000"), "got {line}");
        assert!(line.contains("geocodificar=true"), "got {line}");
        assert!(line.contains("max=7"), "got {line}");
    }

    #[tokio::test]
    async fn test_reverse_sends_coordinates() {
        let server = stub_server(200, r#"{"errorMessage": "fuera de CABA"}"#).await;
        let client = client_for(&server, CachePolicy::ReloadIgnoringCache);

        let raw = client.reverse(-34.6037, -58.3816).await.unwrap();
        assert_eq!(raw.error_message(), Some("fuera de CABA"));

        let line = server.request_lines.lock().unwrap()[0].clone();
        assert!(line.contains("lat=-34.6037"), "got {line}");
        assert!(line.contains("lng=-58.3816"), "got {line}");
    }

    #[tokio::test]
    async fn test_cache_serves_repeated_queries() {
        let server = stub_server(200, r#"{"direccionesNormalizadas": []}"#).await;
        let client = client_for(&server, CachePolicy::ReturnCacheElseLoad);

        client.fetch("callao", true, 10).await.unwrap();
        client.fetch("callao", true, 10).await.unwrap();
        assert_eq!(server.hits.load(Ordering::SeqCst), 1);
        assert_eq!(client.cached_responses(), 1);

        // Different parameters are a different cache key
        client.fetch("callao", true, 5).await.unwrap();
        assert_eq!(server.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reload_policy_bypasses_cache() {
        let server = stub_server(200, r#"{"direccionesNormalizadas": []}"#).await;
        let client = client_for(&server, CachePolicy::ReloadIgnoringCache);

        client.fetch("callao", true, 10).await.unwrap();
        client.fetch("callao", true, 10).await.unwrap();
        assert_eq!(server.hits.load(Ordering::SeqCst), 2);
        assert_eq!(client.cached_responses(), 0);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = stub_server(503, r#"{"message": "down"}"#).await;
        let client = client_for(&server, CachePolicy::ReturnCacheElseLoad);

        let err = client.fetch("callao", true, 10).await.unwrap_err();
        assert!(
            matches!(err, TransportError::Status { status: 503, .. }),
            "unexpected error: {err}"
        );
        assert_eq!(client.cached_responses(), 0, "Errors must not be cached");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_a_decode_error() {
        let server = stub_server(200, "<html>oops</html>").await;
        let client = client_for(&server, CachePolicy::ReturnCacheElseLoad);

        let err = client.fetch("callao", true, 10).await.unwrap_err();
        assert!(err.is_decode(), "unexpected error: {err}");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpGeocodeClient::with_config(ClientConfig::default().with_base_url("not a url"))
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.cache_policy, CachePolicy::ReturnCacheElseLoad);
        assert_eq!(config.cache_capacity, 256);

        let client = HttpGeocodeClient::with_config(
            config.with_cache_policy(CachePolicy::ReloadIgnoringCache),
        )
        .unwrap();
        assert_eq!(client.base_url().host_str(), Some("servicios.usig.buenosaires.gob.ar"));
        assert_eq!(client.cached_responses(), 0);
    }
}
