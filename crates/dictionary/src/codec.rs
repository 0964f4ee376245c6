// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Text form of instant-default values inside se-private property bags: two lower-case hex
/// digits per byte.
pub struct DefaultValueCodec;

impl DefaultValueCodec {
	pub fn encode(bytes: &[u8]) -> String {
		let mut result = String::with_capacity(bytes.len() * 2);
		for &byte in bytes {
			result.push(HEX_DIGITS[(byte >> 4) as usize] as char);
			result.push(HEX_DIGITS[(byte & 0x0f) as usize] as char);
		}
		result
	}

	/// Inverse of [`DefaultValueCodec::encode`]. Only ever applied to text the encoder produced;
	/// anything else is a broken invariant and panics.
	pub fn decode(text: &str) -> Vec<u8> {
		let text = text.as_bytes();
		assert!(text.len() % 2 == 0, "encoded default has odd length {}", text.len());
		text.chunks_exact(2).map(|pair| (nibble(pair[0]) << 4) | nibble(pair[1])).collect()
	}
}

fn nibble(digit: u8) -> u8 {
	match digit {
		b'0'..=b'9' => digit - b'0',
		b'a'..=b'f' => digit - b'a' + 10,
		b'A'..=b'F' => digit - b'A' + 10,
		_ => panic!("invalid hex digit {:?} in encoded default", digit as char),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_encode() {
		assert_eq!(DefaultValueCodec::encode(&[]), "");
		assert_eq!(DefaultValueCodec::encode(&[0x00, 0x7f, 0xab, 0xff]), "007fabff");
	}

	#[test]
	fn test_decode() {
		assert_eq!(DefaultValueCodec::decode(""), Vec::<u8>::new());
		assert_eq!(DefaultValueCodec::decode("007fabff"), vec![0x00, 0x7f, 0xab, 0xff]);
		assert_eq!(DefaultValueCodec::decode("AB"), vec![0xab]);
	}

	#[test]
	fn test_all_bytes_survive() {
		let bytes: Vec<u8> = (0..=255).collect();
		assert_eq!(DefaultValueCodec::decode(&DefaultValueCodec::encode(&bytes)), bytes);
	}

	#[test]
	#[should_panic(expected = "odd length")]
	fn test_decode_odd_length() {
		DefaultValueCodec::decode("abc");
	}

	#[test]
	#[should_panic(expected = "invalid hex digit")]
	fn test_decode_invalid_digit() {
		DefaultValueCodec::decode("zz");
	}
}
