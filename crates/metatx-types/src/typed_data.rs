//! EIP-712 domain descriptor, field schemas and the typed-data document.
//!
//! The document built here is the exact structure handed to the external
//! signer capability (`eth_signTypedData_v4` shape: `types`, `primaryType`,
//! `domain`, `message`). It is never hashed locally; domain separation and
//! struct hashing happen inside the signer. The verifying contract must
//! reconstruct the same schemas byte-for-byte, so field order is preserved
//! exactly as declared.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the fixed domain type declaration.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// Errors produced while assembling a typed-data document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypedDataError {
	/// Error that occurs when a declared field is absent from the message.
	#[error("message is missing declared field: {0}")]
	MissingField(String),
}

/// One (name, type tag) entry of an ordered field schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
	/// Field name as it appears in the message value.
	pub name: String,
	/// ABI type tag of the field, e.g. `bytes4` or `uint256`.
	#[serde(rename = "type")]
	pub type_tag: String,
}

impl TypedField {
	pub fn new(name: &str, type_tag: &str) -> Self {
		Self {
			name: name.to_string(),
			type_tag: type_tag.to_string(),
		}
	}
}

/// The fixed schema of the domain type.
///
/// Order is significant: the verifying contract hashes the domain with this
/// exact field sequence.
pub fn domain_schema() -> Vec<TypedField> {
	vec![
		TypedField::new("name", "string"),
		TypedField::new("version", "string"),
		TypedField::new("chainId", "uint256"),
		TypedField::new("verifyingContract", "address"),
		TypedField::new("salt", "bytes32"),
	]
}

/// Identifies the signing context a signature is bound to.
///
/// Must match the domain the verifying contract reconstructs on-chain, or
/// signature recovery yields the wrong signer. Immutable per deployment;
/// created once from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDescriptor {
	/// Application name, e.g. `EIP712Dapp`.
	pub name: String,
	/// Domain version string.
	pub version: String,
	/// Chain the verifying contract is deployed on.
	#[serde(rename = "chainId")]
	pub chain_id: u64,
	/// Address of the contract that re-verifies signatures.
	#[serde(rename = "verifyingContract")]
	pub verifying_contract: Address,
	/// Deployment-specific 32-byte salt.
	pub salt: B256,
}

/// A canonical signable document.
///
/// Declares exactly two types (the domain type and one message type), the
/// domain value, the message value and the primary-type tag selecting what
/// is being signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataDocument {
	/// Type declarations keyed by type name.
	pub types: BTreeMap<String, Vec<TypedField>>,
	/// Name of the declared type the signature covers.
	#[serde(rename = "primaryType")]
	pub primary_type: String,
	/// Domain separation value.
	pub domain: DomainDescriptor,
	/// Message value, field order matching the message schema.
	pub message: serde_json::Map<String, serde_json::Value>,
}

impl TypedDataDocument {
	/// Assembles a signable document from a domain, a message schema and an
	/// ordered message value.
	///
	/// Fields are neither resorted nor deduplicated; the message is taken
	/// in the order given, which must match the schema's order on the
	/// verifying side. Fails with [`TypedDataError::MissingField`] when a
	/// declared field is absent from the message.
	pub fn build(
		domain: DomainDescriptor,
		message_schema: &[TypedField],
		primary_type: &str,
		message: &[(String, serde_json::Value)],
	) -> Result<Self, TypedDataError> {
		for field in message_schema {
			if !message.iter().any(|(name, _)| *name == field.name) {
				return Err(TypedDataError::MissingField(field.name.clone()));
			}
		}

		let mut types = BTreeMap::new();
		types.insert(DOMAIN_TYPE_NAME.to_string(), domain_schema());
		types.insert(primary_type.to_string(), message_schema.to_vec());

		let mut message_value = serde_json::Map::new();
		for (name, value) in message {
			message_value.insert(name.clone(), value.clone());
		}

		Ok(Self {
			types,
			primary_type: primary_type.to_string(),
			domain,
			message: message_value,
		})
	}
}
