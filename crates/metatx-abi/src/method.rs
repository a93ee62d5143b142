//! Method call descriptors.
//!
//! A descriptor pairs a canonical method signature with its parsed argument
//! types. New contract methods enter the system by constructing a descriptor
//! from their signature string; nothing else is method-specific.

use crate::{codec, AbiError, AbiType, AbiValue};

/// A contract method, described by its canonical signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
	/// Bare method name, e.g. `smile`.
	pub name: String,
	/// Canonical signature string, e.g. `smile(address,uint256)`.
	pub signature: String,
	/// Parsed argument types, in declaration order.
	pub param_types: Vec<AbiType>,
}

impl MethodDescriptor {
	/// Parses a canonical signature string such as `smile(address,uint256)`.
	///
	/// The signature must contain no whitespace; the argument list may be
	/// empty (`ping()`).
	pub fn parse(signature: &str) -> Result<Self, AbiError> {
		let malformed = || AbiError::InvalidMethodSignature(signature.to_string());

		let open = signature.find('(').ok_or_else(malformed)?;
		let name = &signature[..open];
		let args = signature
			.strip_suffix(')')
			.map(|s| &s[open + 1..])
			.ok_or_else(malformed)?;
		if name.is_empty() || name.contains(char::is_whitespace) || args.contains('(') {
			return Err(malformed());
		}

		let param_types = if args.is_empty() {
			Vec::new()
		} else {
			args.split(',')
				.map(AbiType::parse)
				.collect::<Result<Vec<_>, _>>()?
		};

		Ok(Self {
			name: name.to_string(),
			signature: signature.to_string(),
			param_types,
		})
	}

	/// The 4-byte selector derived from the signature string.
	pub fn selector(&self) -> [u8; 4] {
		codec::encode_selector(&self.signature)
	}

	/// Encodes an argument list against this method's declared types.
	pub fn encode_args(&self, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
		codec::encode_parameters(&self.param_types, args)
	}
}
