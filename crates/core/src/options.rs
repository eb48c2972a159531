// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Transform applied to one column stream.
///
/// Exactly one kind applies per stream. Run length encoding and block compression
/// are never stacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColumnEncodingKind {
	NoEncoded = 0,
	RleV2 = 1,
	DirectDelta = 2,
	CompressZstd = 3,
	CompressZlib = 4,
	/// Placeholder resolved per column type, never written to a stream.
	DefEncoded = 5,
}

impl ColumnEncodingKind {
	pub fn is_compress(&self) -> bool {
		matches!(self, ColumnEncodingKind::CompressZstd | ColumnEncodingKind::CompressZlib)
	}

	pub fn is_rle(&self) -> bool {
		matches!(self, ColumnEncodingKind::RleV2 | ColumnEncodingKind::DirectDelta)
	}

	pub fn to_u8(self) -> u8 {
		self as u8
	}

	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(ColumnEncodingKind::NoEncoded),
			1 => Some(ColumnEncodingKind::RleV2),
			2 => Some(ColumnEncodingKind::DirectDelta),
			3 => Some(ColumnEncodingKind::CompressZstd),
			4 => Some(ColumnEncodingKind::CompressZlib),
			5 => Some(ColumnEncodingKind::DefEncoded),
			_ => None,
		}
	}
}

impl Display for ColumnEncodingKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ColumnEncodingKind::NoEncoded => f.write_str("NO_ENCODED"),
			ColumnEncodingKind::RleV2 => f.write_str("RLE_V2"),
			ColumnEncodingKind::DirectDelta => f.write_str("DIRECT_DELTA"),
			ColumnEncodingKind::CompressZstd => f.write_str("COMPRESS_ZSTD"),
			ColumnEncodingKind::CompressZlib => f.write_str("COMPRESS_ZLIB"),
			ColumnEncodingKind::DefEncoded => f.write_str("DEF_ENCODED"),
		}
	}
}

/// Write side options, fixed once handed to an encoder or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingOptions {
	pub kind: ColumnEncodingKind,
	pub is_sign: bool,
	pub compress_level: i32,
	pub lengths_kind: ColumnEncodingKind,
	pub lengths_compress_level: i32,
}

impl Default for EncodingOptions {
	fn default() -> Self {
		Self {
			kind: ColumnEncodingKind::DefEncoded,
			is_sign: true,
			compress_level: 0,
			lengths_kind: ColumnEncodingKind::DefEncoded,
			lengths_compress_level: 0,
		}
	}
}

impl EncodingOptions {
	pub fn new(kind: ColumnEncodingKind, is_sign: bool) -> Self {
		Self {
			kind,
			is_sign,
			..Self::default()
		}
	}

	pub fn with_compress_level(mut self, level: i32) -> Self {
		self.compress_level = level;
		self
	}

	pub fn with_lengths(mut self, kind: ColumnEncodingKind, level: i32) -> Self {
		self.lengths_kind = kind;
		self.lengths_compress_level = level;
		self
	}
}

/// Read side options, mirrors the options the stream was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodingOptions {
	pub kind: ColumnEncodingKind,
	pub is_sign: bool,
	pub compress_level: i32,
	pub lengths_kind: ColumnEncodingKind,
	pub lengths_compress_level: i32,
}

impl Default for DecodingOptions {
	fn default() -> Self {
		Self {
			kind: ColumnEncodingKind::DefEncoded,
			is_sign: true,
			compress_level: 0,
			lengths_kind: ColumnEncodingKind::DefEncoded,
			lengths_compress_level: 0,
		}
	}
}

impl DecodingOptions {
	pub fn new(kind: ColumnEncodingKind, is_sign: bool) -> Self {
		Self {
			kind,
			is_sign,
			..Self::default()
		}
	}

	pub fn with_compress_level(mut self, level: i32) -> Self {
		self.compress_level = level;
		self
	}

	pub fn with_lengths(mut self, kind: ColumnEncodingKind, level: i32) -> Self {
		self.lengths_kind = kind;
		self.lengths_compress_level = level;
		self
	}
}

impl From<EncodingOptions> for DecodingOptions {
	fn from(options: EncodingOptions) -> Self {
		Self {
			kind: options.kind,
			is_sign: options.is_sign,
			compress_level: options.compress_level,
			lengths_kind: options.lengths_kind,
			lengths_compress_level: options.lengths_compress_level,
		}
	}
}
