//! Classified fetch failures.
//!
//! The classification drives the retry policy: client errors, missing
//! tiles, permission problems and validation failures are final; network
//! trouble, timeouts and server errors are worth another attempt.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("tile not found: {0}")]
	NotFound(String),

	#[error("permission denied: {0}")]
	PermissionDenied(String),

	#[error("request timed out: {0}")]
	Timeout(String),

	#[error("network error: {0}")]
	Network(String),

	#[error("server error (HTTP {status}): {message}")]
	ServerError { status: u16, message: String },

	#[error("client error (HTTP {status}): {message}")]
	ClientError { status: u16, message: String },

	#[error("decompression failed: {0}")]
	Decompression(String),

	#[error("filesystem error: {0}")]
	Filesystem(String),

	#[error("validation failed: {0}")]
	Validation(String),
}

impl FetchError {
	/// Whether another attempt could succeed.
	#[must_use]
	pub fn is_retryable(&self) -> bool {
		!matches!(
			self,
			FetchError::ClientError { .. }
				| FetchError::NotFound(_)
				| FetchError::PermissionDenied(_)
				| FetchError::Validation(_)
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(FetchError::Network("reset".into()), true)]
	#[case(FetchError::Timeout("deadline".into()), true)]
	#[case(FetchError::ServerError { status: 503, message: "unavailable".into() }, true)]
	#[case(FetchError::Decompression("bad gzip".into()), true)]
	#[case(FetchError::Filesystem("io".into()), true)]
	#[case(FetchError::NotFound("missing".into()), false)]
	#[case(FetchError::PermissionDenied("locked".into()), false)]
	#[case(FetchError::ClientError { status: 400, message: "bad request".into() }, false)]
	#[case(FetchError::Validation("bad template".into()), false)]
	fn retry_classification(#[case] error: FetchError, #[case] retryable: bool) {
		assert_eq!(error.is_retryable(), retryable);
	}

	#[test]
	fn messages_carry_status() {
		let error = FetchError::ServerError {
			status: 500,
			message: String::from("boom"),
		};
		assert!(error.to_string().contains("500"));
	}
}
