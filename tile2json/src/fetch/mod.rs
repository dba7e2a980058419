//! The tile source abstraction.
//!
//! Two implementations sit behind [`Fetcher`]: an HTTP client with
//! connection pooling and quadratic-backoff retry, and a local filesystem
//! reader with transparent gunzip and linear-backoff retry. The
//! [`FetcherFactory`] selects between them based on the configuration.

mod error;
mod factory;
mod http;
mod local;

pub use error::FetchError;
pub use factory::FetcherFactory;
pub use http::HttpFetcher;
pub use local::LocalFetcher;

use crate::types::{TileRequest, TileResponse};
use async_trait::async_trait;

/// A source of tiles. Implementations are stateless apart from
/// configuration read at construction and may be shared across workers.
#[async_trait]
pub trait Fetcher: Send + Sync {
	/// Fetches once, classifying any failure.
	async fn fetch(&self, request: &TileRequest) -> Result<TileResponse, FetchError>;

	/// Fetches with the implementation's retry policy. Total attempts are
	/// bounded by `max_retries + 1`; non-retryable failures surface after a
	/// single attempt.
	async fn fetch_with_retry(&self, request: &TileRequest) -> Result<TileResponse, FetchError>;
}
