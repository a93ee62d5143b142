//! Per-account nonce sequencing for the meta-transaction client.
//!
//! The verifying contract owns the authoritative nonce; this crate keeps a
//! cached copy per account and sequences reservations so that two in-flight
//! authorizations can never be signed over the same value. Each account is
//! either Synced (cache matches the source of truth at last read) or
//! Pending (a reservation is attached to an unconfirmed authorization).
//!
//! At most one unconfirmed reservation exists per account at a time. A
//! reservation attempt while one is pending performs a fresh authoritative
//! read first: if the contract still reports the reserved value the attempt
//! is refused, otherwise the sequencer reconciles and hands out the fresh
//! value.

use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur during nonce sequencing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NonceError {
	/// Error that occurs when the authoritative nonce cannot be read.
	/// Authorization is blocked until the source is reachable again.
	#[error("nonce unavailable: {0}")]
	Unavailable(String),
	/// Error that occurs when a reservation is requested while the previous
	/// one has not been consumed on-chain yet.
	#[error("nonce {nonce} is still reserved for account {account}")]
	ReservationPending { account: Address, nonce: u64 },
}

/// Trait defining the chain-state reader for authoritative nonces.
///
/// Implementations query the verifying contract's view state.
#[async_trait]
pub trait NonceSource: Send + Sync {
	/// Reads the next unused authorization nonce for an account.
	async fn get_nonce(&self, account: Address) -> Result<u64, NonceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonceState {
	/// Local cache matches the source of truth as of the last read.
	Synced(u64),
	/// The contained value is attached to an in-flight authorization.
	Pending(u64),
}

/// Sequences nonce reservations per account over a [`NonceSource`].
///
/// All state transitions happen under one async mutex, so concurrent
/// authorization attempts against the same account are serialized.
pub struct NonceSequencer {
	source: Arc<dyn NonceSource>,
	accounts: Mutex<HashMap<Address, NonceState>>,
}

impl NonceSequencer {
	/// Creates a sequencer over the given authoritative source.
	pub fn new(source: Arc<dyn NonceSource>) -> Self {
		Self {
			source,
			accounts: Mutex::new(HashMap::new()),
		}
	}

	/// Reads the authoritative nonce and overwrites the local cache.
	///
	/// Clears any pending reservation: the fresh value is the source of
	/// truth regardless of what was reserved before.
	pub async fn read_nonce(&self, account: Address) -> Result<u64, NonceError> {
		let mut accounts = self.accounts.lock().await;
		let value = self.source.get_nonce(account).await?;
		accounts.insert(account, NonceState::Synced(value));
		tracing::debug!(account = %account, nonce = value, "nonce cache reconciled");
		Ok(value)
	}

	/// Re-reads the authoritative nonce, resolving any stale reservation.
	pub async fn reconcile(&self, account: Address) -> Result<u64, NonceError> {
		self.read_nonce(account).await
	}

	/// Reserves the current nonce for one authorization attempt.
	///
	/// Returns the reserved value and marks the account Pending. While a
	/// reservation is outstanding, a further call re-reads the source: if
	/// the reserved value is still unconsumed the call fails with
	/// [`NonceError::ReservationPending`]; otherwise the fresh value is
	/// reserved instead.
	pub async fn reserve_nonce(&self, account: Address) -> Result<u64, NonceError> {
		let mut accounts = self.accounts.lock().await;
		let value = match accounts.get(&account).copied() {
			None => self.source.get_nonce(account).await?,
			Some(NonceState::Synced(value)) => value,
			Some(NonceState::Pending(reserved)) => {
				let fresh = self.source.get_nonce(account).await?;
				if fresh == reserved {
					return Err(NonceError::ReservationPending {
						account,
						nonce: reserved,
					});
				}
				fresh
			}
		};
		accounts.insert(account, NonceState::Pending(value));
		Ok(value)
	}

	/// Records that the reserved authorization was dispatched and accepted.
	///
	/// Advances the cache optimistically to the next sequence number; the
	/// next reservation proceeds without an extra authoritative read.
	pub async fn complete_reservation(&self, account: Address, nonce: u64) {
		let mut accounts = self.accounts.lock().await;
		if accounts.get(&account) == Some(&NonceState::Pending(nonce)) {
			accounts.insert(account, NonceState::Synced(nonce + 1));
		}
	}

	/// Returns an unused reservation to the pool.
	///
	/// Called when the flow fails before anything reached the relayer
	/// (signer declined, encoding failed), so the value can be reserved
	/// again without a round trip to the source.
	pub async fn release_reservation(&self, account: Address, nonce: u64) {
		let mut accounts = self.accounts.lock().await;
		if accounts.get(&account) == Some(&NonceState::Pending(nonce)) {
			accounts.insert(account, NonceState::Synced(nonce));
		}
	}
}
