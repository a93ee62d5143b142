//! Word-aligned encoding and decoding of typed parameter lists.
//!
//! Static types occupy one 32-byte word each: addresses are left-padded,
//! unsigned integers are big-endian zero-padded, fixed byte arrays are
//! right-padded. Dynamic byte strings follow the head/tail convention: the
//! head holds a byte offset into the encoding, the tail holds a length word
//! followed by the data padded to a word boundary.

use crate::{AbiError, AbiType, AbiValue};
use alloy_primitives::{keccak256, Address, U256};

const WORD: usize = 32;

/// Derives the 4-byte function selector from a canonical signature string.
///
/// The selector is the first four bytes of the keccak256 digest of the
/// UTF-8 signature, e.g. `smile(address,uint256)`.
pub fn encode_selector(signature: &str) -> [u8; 4] {
	let digest = keccak256(signature.as_bytes());
	let mut selector = [0u8; 4];
	selector.copy_from_slice(&digest[..4]);
	selector
}

/// Encodes a heterogeneous argument list against its declared types.
///
/// The result is deterministic: the same types and values always produce
/// identical bytes. Values are range-checked against their declared widths
/// before any byte is emitted.
pub fn encode_parameters(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
	if types.len() != values.len() {
		return Err(AbiError::ArityMismatch {
			expected: types.len(),
			actual: values.len(),
		});
	}

	let head_len = types.len() * WORD;
	let mut head = Vec::with_capacity(head_len);
	let mut tail = Vec::new();

	for (ty, value) in types.iter().zip(values) {
		match (ty, value) {
			(AbiType::Address, AbiValue::Address(addr)) => {
				head.extend_from_slice(&address_word(addr));
			}
			(AbiType::Uint(bits), AbiValue::Uint(v)) => {
				if !fits_width(v, *bits) {
					return Err(AbiError::ValueOutOfRange(ty.to_string()));
				}
				head.extend_from_slice(&v.to_be_bytes::<WORD>());
			}
			(AbiType::Bool, AbiValue::Bool(b)) => {
				let mut word = [0u8; WORD];
				word[WORD - 1] = *b as u8;
				head.extend_from_slice(&word);
			}
			(AbiType::FixedBytes(n), AbiValue::FixedBytes(data)) => {
				if data.len() != *n {
					return Err(AbiError::ValueOutOfRange(ty.to_string()));
				}
				let mut word = [0u8; WORD];
				word[..data.len()].copy_from_slice(data);
				head.extend_from_slice(&word);
			}
			(AbiType::Bytes, AbiValue::Bytes(data)) => {
				let offset = head_len + tail.len();
				head.extend_from_slice(&U256::from(offset).to_be_bytes::<WORD>());
				tail.extend_from_slice(&encode_bytes(data));
			}
			(ty, value) => {
				return Err(AbiError::TypeMismatch {
					expected: ty.to_string(),
					actual: value.kind().to_string(),
				});
			}
		}
	}

	head.extend_from_slice(&tail);
	Ok(head)
}

/// Encodes a standalone dynamic byte string: a length word followed by the
/// data right-padded to a word boundary.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
	let mut out = U256::from(data.len()).to_be_bytes::<WORD>().to_vec();
	out.extend_from_slice(data);
	let rem = data.len() % WORD;
	if rem != 0 {
		out.resize(out.len() + WORD - rem, 0);
	}
	out
}

/// Decodes an encoding produced by [`encode_parameters`] back into values.
///
/// Exact inverse of the encoder: `decode_parameters(types,
/// &encode_parameters(types, values)?) == values` for every supported type
/// tag and in-range value.
pub fn decode_parameters(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
	let mut values = Vec::with_capacity(types.len());

	for (index, ty) in types.iter().enumerate() {
		let word = read_word(data, index * WORD)?;
		let value = match ty {
			AbiType::Address => {
				if word[..12].iter().any(|b| *b != 0) {
					return Err(AbiError::ValueOutOfRange(ty.to_string()));
				}
				AbiValue::Address(Address::from_slice(&word[12..]))
			}
			AbiType::Uint(bits) => {
				let v = U256::from_be_slice(&word);
				if !fits_width(&v, *bits) {
					return Err(AbiError::ValueOutOfRange(ty.to_string()));
				}
				AbiValue::Uint(v)
			}
			AbiType::Bool => {
				if word[..WORD - 1].iter().any(|b| *b != 0) || word[WORD - 1] > 1 {
					return Err(AbiError::ValueOutOfRange(ty.to_string()));
				}
				AbiValue::Bool(word[WORD - 1] == 1)
			}
			AbiType::FixedBytes(n) => {
				if word[*n..].iter().any(|b| *b != 0) {
					return Err(AbiError::ValueOutOfRange(ty.to_string()));
				}
				AbiValue::FixedBytes(word[..*n].to_vec())
			}
			AbiType::Bytes => {
				let offset = word_to_offset(&word)?;
				let len = word_to_offset(&read_word(data, offset)?)?;
				let start = offset + WORD;
				let end = start.checked_add(len).ok_or(AbiError::DecodeTruncated)?;
				if end > data.len() {
					return Err(AbiError::DecodeTruncated);
				}
				AbiValue::Bytes(data[start..end].to_vec())
			}
		};
		values.push(value);
	}

	Ok(values)
}

fn address_word(addr: &Address) -> [u8; WORD] {
	let mut word = [0u8; WORD];
	word[12..].copy_from_slice(addr.as_slice());
	word
}

fn fits_width(v: &U256, bits: usize) -> bool {
	bits == 256 || v.bit_len() <= bits
}

fn read_word(data: &[u8], at: usize) -> Result<[u8; WORD], AbiError> {
	let end = at.checked_add(WORD).ok_or(AbiError::DecodeTruncated)?;
	if end > data.len() {
		return Err(AbiError::DecodeTruncated);
	}
	let mut word = [0u8; WORD];
	word.copy_from_slice(&data[at..end]);
	Ok(word)
}

fn word_to_offset(word: &[u8; WORD]) -> Result<usize, AbiError> {
	// Offsets and lengths beyond the addressable range cannot point at
	// valid data in this encoding.
	if word[..WORD - 8].iter().any(|b| *b != 0) {
		return Err(AbiError::DecodeTruncated);
	}
	let mut tail = [0u8; 8];
	tail.copy_from_slice(&word[WORD - 8..]);
	usize::try_from(u64::from_be_bytes(tail)).map_err(|_| AbiError::DecodeTruncated)
}
