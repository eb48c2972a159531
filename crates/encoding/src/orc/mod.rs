// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! ORC run length encoding, version 2.
//!
//! Every run starts with a header byte whose top two bits select one of four
//! sub encodings:
//!
//! | tag | sub encoding | header                                                  |
//! |-----|--------------|---------------------------------------------------------|
//! | 0   | short repeat | `[5:3]` value bytes - 1, `[2:0]` run length - 3          |
//! | 1   | direct       | `[5:1]` width tag, 9 bit run length - 1                  |
//! | 2   | patched base | as direct, plus base bytes, patch width, gap width, patch count |
//! | 3   | delta        | as direct, width tag 0 means a constant delta            |

mod context;
mod decoder;
mod encoder;

pub use decoder::OrcDecoder;
pub use encoder::OrcEncoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EncodingType {
	ShortRepeat = 0,
	Direct = 1,
	PatchedBase = 2,
	Delta = 3,
}

impl EncodingType {
	/// Reads the sub encoding from a run header byte.
	#[inline]
	pub fn from_header(byte: u8) -> Self {
		match (byte >> 6) & 0x03 {
			0 => EncodingType::ShortRepeat,
			1 => EncodingType::Direct,
			2 => EncodingType::PatchedBase,
			_ => EncodingType::Delta,
		}
	}

	#[inline]
	pub(crate) fn header_bits(self) -> u8 {
		(self as u8) << 6
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_header() {
		assert_eq!(EncodingType::from_header(0x07), EncodingType::ShortRepeat);
		assert_eq!(EncodingType::from_header(0x5e), EncodingType::Direct);
		assert_eq!(EncodingType::from_header(0x8e), EncodingType::PatchedBase);
		assert_eq!(EncodingType::from_header(0xc6), EncodingType::Delta);
	}

	#[test]
	fn test_header_bits() {
		for kind in [EncodingType::ShortRepeat, EncodingType::Direct, EncodingType::PatchedBase, EncodingType::Delta] {
			assert_eq!(EncodingType::from_header(kind.header_bits()), kind);
		}
	}
}
