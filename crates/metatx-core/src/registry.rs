//! Registry of authorized contract methods.
//!
//! A method enters the system as a descriptor parsed from its canonical
//! signature; the flow looks descriptors up by bare name. This replaces
//! per-method code paths with a single parametrized flow.

use crate::AuthorizationError;
use metatx_abi::MethodDescriptor;
use std::collections::HashMap;

/// Maps method names to their call descriptors.
#[derive(Debug, Default)]
pub struct MethodRegistry {
	methods: HashMap<String, MethodDescriptor>,
}

impl MethodRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a method by its canonical signature string.
	pub fn register_signature(&mut self, signature: &str) -> Result<(), AuthorizationError> {
		let descriptor = MethodDescriptor::parse(signature)?;
		self.register(descriptor)
	}

	/// Registers an already-parsed descriptor.
	pub fn register(&mut self, descriptor: MethodDescriptor) -> Result<(), AuthorizationError> {
		if self.methods.contains_key(&descriptor.name) {
			return Err(AuthorizationError::DuplicateMethod(descriptor.name));
		}
		self.methods.insert(descriptor.name.clone(), descriptor);
		Ok(())
	}

	/// Looks up a descriptor by bare method name.
	pub fn get(&self, name: &str) -> Result<&MethodDescriptor, AuthorizationError> {
		self.methods
			.get(name)
			.ok_or_else(|| AuthorizationError::UnknownMethod(name.to_string()))
	}

	/// Names of all registered methods.
	pub fn method_names(&self) -> impl Iterator<Item = &str> {
		self.methods.keys().map(String::as_str)
	}
}
