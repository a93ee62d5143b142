//! The end-to-end authorization flow.
//!
//! One flow instance per deployment; per-account nonce sequencing lives in
//! the shared [`NonceSequencer`]. The two external calls are strictly
//! sequential: the relay submission is never constructed before the signer
//! has produced a signature over the same nonce.

use crate::packet::{packet_message, packet_schema, PACKET_TYPE_NAME};
use crate::registry::MethodRegistry;
use crate::AuthorizationError;
use alloy_primitives::Address;
use metatx_abi::{AbiValue, MethodDescriptor};
use metatx_nonce::NonceSequencer;
use metatx_relay::{RelayError, RelayOutcome, RelayService};
use metatx_signer::SignerService;
use metatx_types::{DomainDescriptor, RelayRequest, TypedDataDocument};
use std::sync::Arc;

/// A successfully relayed authorization.
#[derive(Debug, Clone)]
pub struct Authorization {
	/// Transaction hash reported by the relayer.
	pub tx_hash: String,
	/// Nonce the signature was bound to.
	pub nonce: u64,
	/// The package that was submitted, kept for audit or inspection.
	pub request: RelayRequest,
}

/// Orchestrates one authorization from nonce reservation to relay outcome.
pub struct AuthorizationFlow {
	domain: DomainDescriptor,
	registry: MethodRegistry,
	signer: Arc<SignerService>,
	nonce: Arc<NonceSequencer>,
	relay: Arc<RelayService>,
}

impl std::fmt::Debug for AuthorizationFlow {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthorizationFlow")
			.field("domain", &self.domain)
			.field("registry", &self.registry)
			.finish_non_exhaustive()
	}
}

impl AuthorizationFlow {
	/// Creates a flow over the deployment's domain and services.
	pub fn new(
		domain: DomainDescriptor,
		registry: MethodRegistry,
		signer: Arc<SignerService>,
		nonce: Arc<NonceSequencer>,
		relay: Arc<RelayService>,
	) -> Self {
		Self {
			domain,
			registry,
			signer,
			nonce,
			relay,
		}
	}

	/// The registered methods this flow can authorize.
	pub fn registry(&self) -> &MethodRegistry {
		&self.registry
	}

	/// Authorizes one call of a registered method and relays it.
	///
	/// A rejection indicating a stale nonce triggers exactly one
	/// reconcile-and-retry with a fresh nonce and a fresh signature; a
	/// second nonce rejection is fatal.
	pub async fn authorize(
		&self,
		account: Address,
		method: &str,
		args: &[AbiValue],
	) -> Result<Authorization, AuthorizationError> {
		let descriptor = self.registry.get(method)?.clone();

		let nonce = self.nonce.reserve_nonce(account).await?;
		tracing::info!(account = %account, method, nonce, "starting authorization");

		match self.attempt(account, &descriptor, args, nonce).await {
			Ok(authorization) => {
				self.nonce.complete_reservation(account, nonce).await;
				Ok(authorization)
			}
			Err(err) if is_nonce_rejection(&err) => {
				tracing::warn!(account = %account, nonce, "relay reports stale nonce, reconciling");
				let fresh = self.nonce.reconcile(account).await?;
				if fresh == nonce {
					return Err(AuthorizationError::NonceStale { account });
				}
				let retry_nonce = self.nonce.reserve_nonce(account).await?;
				match self.attempt(account, &descriptor, args, retry_nonce).await {
					Ok(authorization) => {
						self.nonce.complete_reservation(account, retry_nonce).await;
						Ok(authorization)
					}
					Err(err) if is_nonce_rejection(&err) => {
						Err(AuthorizationError::NonceStale { account })
					}
					Err(err) => {
						self.settle_failed_reservation(account, retry_nonce, &err).await;
						Err(err)
					}
				}
			}
			Err(err) => {
				self.settle_failed_reservation(account, nonce, &err).await;
				Err(err)
			}
		}
	}

	/// One signing-and-relay attempt for a fixed nonce.
	async fn attempt(
		&self,
		account: Address,
		descriptor: &MethodDescriptor,
		args: &[AbiValue],
		nonce: u64,
	) -> Result<Authorization, AuthorizationError> {
		let selector = descriptor.selector();
		let params = descriptor.encode_args(args)?;

		let message = packet_message(selector, &params, nonce);
		let document = TypedDataDocument::build(
			self.domain.clone(),
			&packet_schema(),
			PACKET_TYPE_NAME,
			&message,
		)?;

		// May wait indefinitely on user interaction; no timeout here.
		let signature = self.signer.sign_typed_data(account, &document).await?;

		let request = RelayRequest::new(
			self.domain.verifying_contract,
			account,
			selector,
			&params,
			&signature,
			nonce,
		);

		match self.relay.submit(&request).await {
			Ok(RelayOutcome::Accepted { tx_hash }) => Ok(Authorization {
				tx_hash,
				nonce,
				request,
			}),
			Ok(RelayOutcome::Rejected { status, reason }) => {
				Err(AuthorizationError::RelayRejected {
					status,
					reason,
					request: Box::new(request),
				})
			}
			Err(RelayError::Unreachable(reason)) | Err(RelayError::Configuration(reason)) => {
				Err(AuthorizationError::RelayUnreachable {
					reason,
					request: Box::new(request),
				})
			}
		}
	}

	/// Frees the reservation when nothing was dispatched.
	///
	/// Once a package may have reached the relayer the reservation stays
	/// pending; the next reservation reconciles against the contract.
	async fn settle_failed_reservation(
		&self,
		account: Address,
		nonce: u64,
		err: &AuthorizationError,
	) {
		let dispatched = matches!(
			err,
			AuthorizationError::RelayRejected { .. } | AuthorizationError::RelayUnreachable { .. }
		);
		if !dispatched {
			self.nonce.release_reservation(account, nonce).await;
		}
	}
}

fn is_nonce_rejection(err: &AuthorizationError) -> bool {
	matches!(
		err,
		AuthorizationError::RelayRejected { reason, .. } if reason.to_lowercase().contains("nonce")
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use metatx_abi::encode_selector;
	use metatx_nonce::{NonceError, NonceSource};
	use metatx_relay::RelayInterface;
	use metatx_signer::{SignerError, SignerInterface};
	use metatx_types::Signature;
	use std::collections::VecDeque;
	use std::sync::Mutex;

	const TEST_SALT: &str = "0xf2d857f4a3edcb9b78b4d503bfe733db1e3f6cdc2b7971ee739626c97e86a558";

	fn test_domain() -> DomainDescriptor {
		DomainDescriptor {
			name: "EIP712Dapp".to_string(),
			version: "1".to_string(),
			chain_id: 3,
			verifying_contract: "0x07637624e1de92a886C2f37A219C1749784D5367"
				.parse()
				.unwrap(),
			salt: TEST_SALT.parse().unwrap(),
		}
	}

	fn test_account() -> Address {
		"0xABcdABcdABcdABcdABcdABcdABcdABcd12341234".parse().unwrap()
	}

	fn known_raw_signature() -> Vec<u8> {
		let mut raw = Vec::with_capacity(65);
		raw.extend_from_slice(&[0x11; 32]);
		raw.extend_from_slice(&[0x22; 32]);
		raw.push(0x1b);
		raw
	}

	/// Signer returning a fixed raw result, capturing the signed document.
	struct ScriptedSigner {
		raw: Vec<u8>,
		decline: bool,
		documents: Mutex<Vec<serde_json::Value>>,
	}

	impl ScriptedSigner {
		fn accepting() -> Self {
			Self {
				raw: known_raw_signature(),
				decline: false,
				documents: Mutex::new(Vec::new()),
			}
		}

		fn declining() -> Self {
			Self {
				raw: Vec::new(),
				decline: true,
				documents: Mutex::new(Vec::new()),
			}
		}
	}

	#[async_trait]
	impl SignerInterface for ScriptedSigner {
		async fn sign_typed_data(
			&self,
			_account: Address,
			document: &TypedDataDocument,
		) -> Result<Signature, SignerError> {
			self.documents
				.lock()
				.unwrap()
				.push(serde_json::to_value(document).unwrap());
			if self.decline {
				return Err(SignerError::Declined);
			}
			Signature::from_raw(&self.raw).map_err(|e| SignerError::SigningFailed(e.to_string()))
		}
	}

	/// Nonce source replaying a scripted sequence of reads.
	struct SequenceSource {
		values: Mutex<VecDeque<u64>>,
	}

	impl SequenceSource {
		fn new(values: &[u64]) -> Arc<Self> {
			Arc::new(Self {
				values: Mutex::new(values.iter().copied().collect()),
			})
		}
	}

	#[async_trait]
	impl NonceSource for SequenceSource {
		async fn get_nonce(&self, _account: Address) -> Result<u64, NonceError> {
			let mut values = self.values.lock().unwrap();
			match values.len() {
				0 => Err(NonceError::Unavailable("script exhausted".to_string())),
				1 => Ok(*values.front().unwrap()),
				_ => Ok(values.pop_front().unwrap()),
			}
		}
	}

	/// Relay replaying scripted outcomes and recording every request.
	struct ScriptedRelay {
		outcomes: Mutex<VecDeque<Result<RelayOutcome, RelayError>>>,
		requests: Arc<Mutex<Vec<RelayRequest>>>,
	}

	impl ScriptedRelay {
		fn new(
			outcomes: Vec<Result<RelayOutcome, RelayError>>,
		) -> (Self, Arc<Mutex<Vec<RelayRequest>>>) {
			let requests = Arc::new(Mutex::new(Vec::new()));
			(
				Self {
					outcomes: Mutex::new(outcomes.into()),
					requests: requests.clone(),
				},
				requests,
			)
		}

		fn accepting(hash: &str) -> (Self, Arc<Mutex<Vec<RelayRequest>>>) {
			Self::new(vec![Ok(RelayOutcome::Accepted {
				tx_hash: hash.to_string(),
			})])
		}
	}

	#[async_trait]
	impl RelayInterface for ScriptedRelay {
		async fn submit(&self, request: &RelayRequest) -> Result<RelayOutcome, RelayError> {
			self.requests.lock().unwrap().push(request.clone());
			self.outcomes
				.lock()
				.unwrap()
				.pop_front()
				.unwrap_or(Err(RelayError::Unreachable("script exhausted".to_string())))
		}
	}

	fn build_flow(
		signer: ScriptedSigner,
		source: Arc<SequenceSource>,
		relay: ScriptedRelay,
	) -> AuthorizationFlow {
		let mut registry = MethodRegistry::new();
		registry.register_signature("smile(address,uint256)").unwrap();

		AuthorizationFlow::new(
			test_domain(),
			registry,
			Arc::new(SignerService::new(Box::new(signer))),
			Arc::new(NonceSequencer::new(source)),
			Arc::new(RelayService::new(Box::new(relay))),
		)
	}

	#[tokio::test]
	async fn test_scenario_a_end_to_end_package() {
		use alloy_primitives::U256;

		let account = test_account();
		let (relay, requests) = ScriptedRelay::accepting("0xfeed");
		let flow = build_flow(ScriptedSigner::accepting(), SequenceSource::new(&[0]), relay);

		let authorization = flow
			.authorize(
				account,
				"smile",
				&[AbiValue::Address(account), AbiValue::Uint(U256::from(10u64))],
			)
			.await
			.unwrap();

		assert_eq!(authorization.tx_hash, "0xfeed");
		assert_eq!(authorization.nonce, 0);

		let requests = requests.lock().unwrap();
		assert_eq!(requests.len(), 1);
		let request = &requests[0];

		let selector = encode_selector("smile(address,uint256)");
		assert_eq!(request.method, format!("0x{}", hex::encode(selector)));

		// param = encodeParameters(["address","uint256"], [account, 10])
		let expected = metatx_abi::encode_parameters(
			&[metatx_abi::AbiType::Address, metatx_abi::AbiType::Uint(256)],
			&[AbiValue::Address(account), AbiValue::Uint(U256::from(10u64))],
		)
		.unwrap();
		assert_eq!(request.param, format!("0x{}", hex::encode(&expected)));

		// r/s/v decomposed from the known 65-byte signature
		assert_eq!(request.r, format!("0x{}", "11".repeat(32)));
		assert_eq!(request.s, format!("0x{}", "22".repeat(32)));
		assert_eq!(request.v, 27);
		assert_eq!(request.nonce, 0);
		assert_eq!(
			request.contract_address,
			test_domain().verifying_contract.to_checksum(None)
		);
	}

	#[tokio::test]
	async fn test_scenario_a_signed_document_contents() {
		let account = test_account();
		let (relay, _) = ScriptedRelay::accepting("0xfeed");
		let signer = ScriptedSigner::accepting();

		let mut registry = MethodRegistry::new();
		registry.register_signature("smile(address,uint256)").unwrap();
		let signer_documents = Arc::new(signer);
		let flow = AuthorizationFlow::new(
			test_domain(),
			registry,
			Arc::new(SignerService::new(Box::new(CapturingSigner(
				signer_documents.clone(),
			)))),
			Arc::new(NonceSequencer::new(SequenceSource::new(&[0]))),
			Arc::new(RelayService::new(Box::new(relay))),
		);

		flow.authorize(
			account,
			"smile",
			&[
				AbiValue::Address(account),
				AbiValue::Uint(alloy_primitives::U256::from(10u64)),
			],
		)
		.await
		.unwrap();

		let documents = signer_documents.documents.lock().unwrap();
		assert_eq!(documents.len(), 1);
		let document = &documents[0];

		assert_eq!(document["primaryType"], "Packet");
		assert_eq!(document["domain"]["name"], "EIP712Dapp");
		assert_eq!(document["domain"]["chainId"], 3);
		let selector_hex = format!("0x{}", hex::encode(encode_selector("smile(address,uint256)")));
		assert_eq!(document["message"]["method"], selector_hex);
		let packed = metatx_abi::encode_parameters(
			&[metatx_abi::AbiType::Address, metatx_abi::AbiType::Uint(256)],
			&[
				AbiValue::Address(account),
				AbiValue::Uint(alloy_primitives::U256::from(10u64)),
			],
		)
		.unwrap();
		assert_eq!(document["message"]["params"], format!("0x{}", hex::encode(&packed)));
		assert_eq!(document["message"]["nonce"], 0);
		assert_eq!(document["types"]["Packet"][0]["type"], "bytes4");
	}

	/// Delegating wrapper so tests can keep a handle on the scripted signer.
	struct CapturingSigner(Arc<ScriptedSigner>);

	#[async_trait]
	impl SignerInterface for CapturingSigner {
		async fn sign_typed_data(
			&self,
			account: Address,
			document: &TypedDataDocument,
		) -> Result<Signature, SignerError> {
			self.0.sign_typed_data(account, document).await
		}
	}

	#[tokio::test]
	async fn test_scenario_b_no_duplicate_nonce_reservation() {
		use alloy_primitives::U256;

		let account = test_account();
		// Relay never answers the first submission's outcome slot again.
		let (relay, _) = ScriptedRelay::new(vec![
			Ok(RelayOutcome::Rejected {
				status: 503,
				reason: "relayer busy".to_string(),
			}),
			Ok(RelayOutcome::Accepted {
				tx_hash: "0xsecond".to_string(),
			}),
		]);
		let flow = build_flow(ScriptedSigner::accepting(), SequenceSource::new(&[0]), relay);
		let args = [AbiValue::Address(account), AbiValue::Uint(U256::from(10u64))];

		// First attempt dispatched with nonce 0 and was rejected for an
		// unrelated reason; the reservation stays pending.
		let err = flow.authorize(account, "smile", &args).await.unwrap_err();
		assert!(matches!(err, AuthorizationError::RelayRejected { status: 503, .. }));

		// Back-to-back second attempt must not reuse nonce 0: the contract
		// still reports 0, so the reservation is refused rather than
		// double-signed.
		let err = flow.authorize(account, "smile", &args).await.unwrap_err();
		assert!(matches!(
			err,
			AuthorizationError::Nonce(NonceError::ReservationPending { nonce: 0, .. })
		));
	}

	#[tokio::test]
	async fn test_scenario_b_second_attempt_uses_next_nonce_after_consumption() {
		use alloy_primitives::U256;

		let account = test_account();
		let (relay, requests) = ScriptedRelay::new(vec![
			Ok(RelayOutcome::Accepted {
				tx_hash: "0xone".to_string(),
			}),
			Ok(RelayOutcome::Accepted {
				tx_hash: "0xtwo".to_string(),
			}),
		]);
		let flow = build_flow(ScriptedSigner::accepting(), SequenceSource::new(&[0]), relay);
		let args = [AbiValue::Address(account), AbiValue::Uint(U256::from(10u64))];

		let first = flow.authorize(account, "smile", &args).await.unwrap();
		let second = flow.authorize(account, "smile", &args).await.unwrap();

		assert_eq!(first.nonce, 0);
		assert_eq!(second.nonce, 1, "optimistic advance after acceptance");
		let requests = requests.lock().unwrap();
		assert_eq!(requests[0].nonce, 0);
		assert_eq!(requests[1].nonce, 1);
	}

	#[tokio::test]
	async fn test_stale_nonce_triggers_single_retry() {
		use alloy_primitives::U256;

		let account = test_account();
		let (relay, requests) = ScriptedRelay::new(vec![
			Ok(RelayOutcome::Rejected {
				status: 422,
				reason: "nonce already used".to_string(),
			}),
			Ok(RelayOutcome::Accepted {
				tx_hash: "0xretried".to_string(),
			}),
		]);
		// reserve -> 0, reconcile -> 1, reserve -> 1
		let flow = build_flow(ScriptedSigner::accepting(), SequenceSource::new(&[0, 1]), relay);

		let authorization = flow
			.authorize(
				account,
				"smile",
				&[AbiValue::Address(account), AbiValue::Uint(U256::from(10u64))],
			)
			.await
			.unwrap();

		assert_eq!(authorization.nonce, 1);
		assert_eq!(authorization.tx_hash, "0xretried");
		let requests = requests.lock().unwrap();
		assert_eq!(requests.len(), 2, "one automatic retry, no more");
		assert_eq!(requests[0].nonce, 0);
		assert_eq!(requests[1].nonce, 1, "retry re-signed with the fresh nonce");
	}

	#[tokio::test]
	async fn test_persistent_stale_nonce_is_fatal() {
		use alloy_primitives::U256;

		let account = test_account();
		let (relay, requests) = ScriptedRelay::new(vec![
			Ok(RelayOutcome::Rejected {
				status: 422,
				reason: "nonce already used".to_string(),
			}),
			Ok(RelayOutcome::Rejected {
				status: 422,
				reason: "nonce already used".to_string(),
			}),
		]);
		let flow = build_flow(ScriptedSigner::accepting(), SequenceSource::new(&[0, 1]), relay);

		let err = flow
			.authorize(
				account,
				"smile",
				&[AbiValue::Address(account), AbiValue::Uint(U256::from(10u64))],
			)
			.await
			.unwrap_err();

		assert!(matches!(err, AuthorizationError::NonceStale { .. }));
		assert_eq!(requests.lock().unwrap().len(), 2, "never loops past the retry");
	}

	#[tokio::test]
	async fn test_stale_nonce_with_unmoved_source_is_fatal_without_resubmit() {
		use alloy_primitives::U256;

		let account = test_account();
		let (relay, requests) = ScriptedRelay::new(vec![Ok(RelayOutcome::Rejected {
			status: 422,
			reason: "nonce already used".to_string(),
		})]);
		// The contract still reports the reserved value on reconcile.
		let flow = build_flow(ScriptedSigner::accepting(), SequenceSource::new(&[0, 0]), relay);

		let err = flow
			.authorize(
				account,
				"smile",
				&[AbiValue::Address(account), AbiValue::Uint(U256::from(10u64))],
			)
			.await
			.unwrap_err();

		assert!(matches!(err, AuthorizationError::NonceStale { .. }));
		assert_eq!(requests.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_declined_signing_frees_the_reservation() {
		use alloy_primitives::U256;

		let account = test_account();
		let (relay, requests) = ScriptedRelay::accepting("0xnever");
		let flow = build_flow(ScriptedSigner::declining(), SequenceSource::new(&[0]), relay);
		let args = [AbiValue::Address(account), AbiValue::Uint(U256::from(10u64))];

		let err = flow.authorize(account, "smile", &args).await.unwrap_err();
		assert!(matches!(err, AuthorizationError::Declined));
		assert!(requests.lock().unwrap().is_empty(), "nothing reached the relay");

		// The account is not deadlocked: the same nonce is reservable again.
		let err = flow.authorize(account, "smile", &args).await.unwrap_err();
		assert!(matches!(err, AuthorizationError::Declined));
	}

	#[tokio::test]
	async fn test_unreachable_relay_keeps_request_for_caller() {
		use alloy_primitives::U256;

		let account = test_account();
		let (relay, _) = ScriptedRelay::new(vec![Err(RelayError::Unreachable(
			"connection refused".to_string(),
		))]);
		let flow = build_flow(ScriptedSigner::accepting(), SequenceSource::new(&[0]), relay);

		let err = flow
			.authorize(
				account,
				"smile",
				&[AbiValue::Address(account), AbiValue::Uint(U256::from(10u64))],
			)
			.await
			.unwrap_err();

		match err {
			AuthorizationError::RelayUnreachable { request, reason } => {
				assert!(reason.contains("connection refused"));
				assert_eq!(request.nonce, 0, "original package intact for retry");
			}
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_unknown_method_is_rejected_before_any_side_effect() {
		let account = test_account();
		let (relay, requests) = ScriptedRelay::accepting("0xnever");
		let flow = build_flow(ScriptedSigner::accepting(), SequenceSource::new(&[0]), relay);

		let err = flow.authorize(account, "frown", &[]).await.unwrap_err();
		assert!(matches!(err, AuthorizationError::UnknownMethod(_)));
		assert!(requests.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_bad_arguments_surface_encoding_error() {
		let account = test_account();
		let (relay, requests) = ScriptedRelay::accepting("0xnever");
		let flow = build_flow(ScriptedSigner::accepting(), SequenceSource::new(&[0]), relay);

		// Wrong arity for smile(address,uint256).
		let err = flow.authorize(account, "smile", &[]).await.unwrap_err();
		assert!(matches!(err, AuthorizationError::Encoding(_)));
		assert!(requests.lock().unwrap().is_empty());
	}
}
