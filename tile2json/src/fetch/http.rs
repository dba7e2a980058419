//! HTTP tile fetcher.
//!
//! One pooled `reqwest` client is shared across all workers for the
//! lifetime of a job. Requests carry protobuf/gzip accept headers, the
//! configured user agent and optional bearer authentication; configured
//! default headers are merged with per-request headers (the request wins).
//! Responses with `Content-Encoding: gzip` are decompressed before the
//! payload is handed on.

use super::{FetchError, Fetcher};
use crate::config::Config;
use crate::types::{TileRequest, TileResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy, StatusCode, Url};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tile2json_core::Blob;
use tile2json_core::utils::decompress_gzip;
use tokio::time::sleep;

const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpFetcher {
	client: Client,
	api_key: String,
	user_agent: String,
	default_headers: BTreeMap<String, String>,
	max_retries: u32,
}

impl HttpFetcher {
	/// Builds the shared client from the server and network sections.
	pub fn new(config: &Config) -> Result<HttpFetcher> {
		let mut builder = Client::builder()
			.timeout(config.server_timeout())
			.connect_timeout(TLS_HANDSHAKE_TIMEOUT)
			.pool_max_idle_per_host(config.network.max_idle_conns)
			.pool_idle_timeout(Duration::from_secs(config.network.idle_conn_timeout))
			.use_rustls_tls();

		if config.network.disable_keep_alive {
			builder = builder.pool_max_idle_per_host(0);
		} else {
			builder = builder.tcp_keepalive(Duration::from_secs(config.network.keep_alive));
		}

		if !config.network.proxy_url.is_empty() {
			let proxy = Proxy::all(&config.network.proxy_url)
				.with_context(|| format!("invalid proxy_url: {:?}", config.network.proxy_url))?;
			builder = builder.proxy(proxy);
		}

		Ok(HttpFetcher {
			client: builder.build().context("failed to build HTTP client")?,
			api_key: config.server.api_key.clone(),
			user_agent: config.network.user_agent.clone(),
			default_headers: config.server.headers.clone(),
			max_retries: config.server.max_retries,
		})
	}

	/// Assembles the header set for one request: fixed accept headers, user
	/// agent, optional bearer auth, configured defaults, then per-request
	/// headers.
	fn build_headers(&self, request: &TileRequest) -> Result<HeaderMap, FetchError> {
		let mut headers = HeaderMap::new();
		let mut set = |name: &str, value: &str| -> Result<(), FetchError> {
			let name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|_| FetchError::Validation(format!("invalid header name {name:?}")))?;
			let value = HeaderValue::from_str(value)
				.map_err(|_| FetchError::Validation(format!("invalid header value for {name:?}")))?;
			headers.insert(name, value);
			Ok(())
		};

		set("accept", "application/x-protobuf")?;
		set("accept-encoding", "gzip, deflate")?;
		set("user-agent", &self.user_agent)?;
		if !self.api_key.is_empty() {
			set("authorization", &format!("Bearer {}", self.api_key))?;
		}
		for (name, value) in &self.default_headers {
			set(name, value)?;
		}
		for (name, value) in &request.headers {
			set(name, value)?;
		}
		Ok(headers)
	}

	fn classify_status(status: StatusCode) -> Option<FetchError> {
		if status.is_success() {
			return None;
		}
		let message = status
			.canonical_reason()
			.unwrap_or("unexpected status")
			.to_string();
		Some(match status.as_u16() {
			404 => FetchError::NotFound(message),
			401 | 403 => FetchError::PermissionDenied(message),
			500..=599 => FetchError::ServerError {
				status: status.as_u16(),
				message,
			},
			// Remaining 4xx plus anything else unexpected (e.g. a 3xx after
			// redirect exhaustion) is final.
			_ => FetchError::ClientError {
				status: status.as_u16(),
				message,
			},
		})
	}

	fn classify_transport(error: reqwest::Error) -> FetchError {
		if error.is_timeout() {
			FetchError::Timeout(error.to_string())
		} else {
			FetchError::Network(error.to_string())
		}
	}
}

#[async_trait]
impl Fetcher for HttpFetcher {
	async fn fetch(&self, request: &TileRequest) -> Result<TileResponse, FetchError> {
		let start = Instant::now();

		let url = Url::parse(&request.locator)
			.map_err(|err| FetchError::Validation(format!("invalid tile URL {:?}: {err}", request.locator)))?;
		let headers = self.build_headers(request)?;

		let response = self
			.client
			.get(url)
			.headers(headers)
			.send()
			.await
			.map_err(Self::classify_transport)?;

		let status = response.status();
		let response_headers: Vec<(String, String)> = response
			.headers()
			.iter()
			.map(|(name, value)| {
				(
					name.as_str().to_string(),
					value.to_str().unwrap_or_default().to_string(),
				)
			})
			.collect();

		if let Some(error) = Self::classify_status(status) {
			return Err(error);
		}

		let body = response.bytes().await.map_err(Self::classify_transport)?;
		let mut data = Blob::from(body.as_ref());

		let gzipped = response_headers
			.iter()
			.any(|(name, value)| name.eq_ignore_ascii_case("content-encoding") && value.contains("gzip"));
		if gzipped {
			data = decompress_gzip(&data).map_err(|err| FetchError::Decompression(format!("{err:#}")))?;
		}

		Ok(TileResponse {
			coord: request.coord,
			data,
			status: status.as_u16(),
			headers: response_headers,
			fetch_time: start.elapsed(),
		})
	}

	/// Quadratic backoff: 1 s, 4 s, 9 s, … before each retry.
	async fn fetch_with_retry(&self, request: &TileRequest) -> Result<TileResponse, FetchError> {
		let mut last_error = None;

		for attempt in 0..=self.max_retries {
			if attempt > 0 {
				let backoff = Duration::from_secs((attempt as u64).pow(2));
				log::warn!(
					"retrying tile {} (attempt {}/{}) after {backoff:?}",
					request.coord,
					attempt + 1,
					self.max_retries + 1
				);
				sleep(backoff).await;
			}

			match self.fetch(request).await {
				Ok(response) => return Ok(response),
				Err(error) => {
					let retryable = error.is_retryable();
					last_error = Some(error);
					if !retryable {
						break;
					}
				}
			}
		}

		Err(last_error.expect("at least one attempt was made"))
	}
}
