//! Relay client for the meta-transaction service.
//!
//! Transmits an authorized package to the relay endpoint as a single JSON
//! POST and interprets the response. The client performs no retries and no
//! idempotency de-duplication; resubmitting the same request is the
//! caller's decision, and callers keep ownership of the request in every
//! outcome so they can inspect or retry it.

use async_trait::async_trait;
use metatx_types::{RelayRequest, RelayResponseBody};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while submitting to the relay service.
#[derive(Debug, Error)]
pub enum RelayError {
	/// Error that occurs when no response was obtained at all.
	#[error("relay endpoint unreachable: {0}")]
	Unreachable(String),
	/// Error that occurs when the client cannot be constructed.
	#[error("relay client configuration error: {0}")]
	Configuration(String),
}

/// Result of a relay submission that produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
	/// The relayer accepted the package and submitted a transaction.
	Accepted {
		/// Hash of the submitted transaction.
		tx_hash: String,
	},
	/// The relayer answered but refused the package.
	Rejected {
		/// HTTP status code of the response.
		status: u16,
		/// Diagnostic extracted from the response body, or the raw body.
		reason: String,
	},
}

/// Trait defining the interface to a relay service.
#[async_trait]
pub trait RelayInterface: Send + Sync {
	/// Submits an authorized package and classifies the response.
	async fn submit(&self, request: &RelayRequest) -> Result<RelayOutcome, RelayError>;
}

/// HTTP implementation of the relay interface.
///
/// Submission is machine-to-machine, so unlike the signer path a request
/// timeout always applies.
pub struct HttpRelayClient {
	client: reqwest::Client,
	endpoint: String,
}

impl HttpRelayClient {
	/// Creates a client for the given relay endpoint with the given
	/// request timeout.
	pub fn new(endpoint: String, timeout: Duration) -> Result<Self, RelayError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| RelayError::Configuration(e.to_string()))?;
		Ok(Self { client, endpoint })
	}
}

#[async_trait]
impl RelayInterface for HttpRelayClient {
	async fn submit(&self, request: &RelayRequest) -> Result<RelayOutcome, RelayError> {
		tracing::debug!(
			endpoint = %self.endpoint,
			method = %request.method,
			nonce = request.nonce,
			"submitting authorized package to relay"
		);

		let response = self
			.client
			.post(&self.endpoint)
			.json(request)
			.send()
			.await
			.map_err(|e| RelayError::Unreachable(e.to_string()))?;

		let status = response.status().as_u16();
		let body = response
			.text()
			.await
			.map_err(|e| RelayError::Unreachable(e.to_string()))?;

		let outcome = classify_response(status, &body);
		match &outcome {
			RelayOutcome::Accepted { tx_hash } => {
				tracing::info!(tx_hash = %tx_hash, "relay accepted authorization");
			}
			RelayOutcome::Rejected { status, reason } => {
				tracing::warn!(status, reason = %reason, "relay rejected authorization");
			}
		}
		Ok(outcome)
	}
}

/// Classifies a relay HTTP response into an outcome.
///
/// A success status whose body carries a transaction hash is accepted;
/// everything else is a rejection. The failure-body schema is not formally
/// specified, so the reason falls back from known JSON fields to the raw
/// body text to the bare status code.
pub fn classify_response(status: u16, body: &str) -> RelayOutcome {
	let parsed: Option<RelayResponseBody> = serde_json::from_str(body).ok();

	if (200..300).contains(&status) {
		if let Some(tx_hash) = parsed
			.as_ref()
			.and_then(|b| b.transaction_hash())
			.filter(|h| !h.is_empty())
		{
			return RelayOutcome::Accepted {
				tx_hash: tx_hash.to_string(),
			};
		}
		return RelayOutcome::Rejected {
			status,
			reason: "relay response carried no transaction hash".to_string(),
		};
	}

	let reason = parsed
		.and_then(|b| {
			b.message
				.or_else(|| b.error.map(|e| e.to_string()))
		})
		.or_else(|| {
			let trimmed = body.trim();
			(!trimmed.is_empty()).then(|| trimmed.to_string())
		})
		.unwrap_or_else(|| format!("relay returned HTTP {}", status));

	RelayOutcome::Rejected { status, reason }
}

/// Service wrapping a relay implementation.
pub struct RelayService {
	/// The underlying relay implementation.
	implementation: Box<dyn RelayInterface>,
}

impl RelayService {
	/// Creates a new RelayService with the specified implementation.
	pub fn new(implementation: Box<dyn RelayInterface>) -> Self {
		Self { implementation }
	}

	/// Submits an authorized package through the managed implementation.
	pub async fn submit(&self, request: &RelayRequest) -> Result<RelayOutcome, RelayError> {
		self.implementation.submit(request).await
	}
}
