//! Shared protocol types for the meta-transaction client.
//!
//! This crate centralizes the data structures exchanged between the
//! authorization flow's components: the EIP-712 domain descriptor and
//! typed-data document, the decomposed signature, and the relay wire
//! request. Keeping them in one place ensures the document the user signs
//! and the package the relayer re-verifies are built from the same types.

/// Relay wire request and response structures.
pub mod relay;
/// Signature decomposition (65-byte raw result into r/s/v).
pub mod signature;
/// Domain descriptor, field schemas and the typed-data document builder.
pub mod typed_data;
/// Hex string formatting helpers.
pub mod utils;

pub use relay::{RelayRequest, RelayResponseBody};
pub use signature::{Signature, SignatureError};
pub use typed_data::{
	domain_schema, DomainDescriptor, TypedDataDocument, TypedDataError, TypedField,
};
pub use utils::{encode_0x, with_0x_prefix, without_0x_prefix};
