// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{ErrorKind, error::diagnostic::Diagnostic};

/// DEF_ENCODED was requested as a block compressor
pub fn default_compress_kind() -> Diagnostic {
	Diagnostic {
		code: "COMPRESSION_001".to_string(),
		kind: ErrorKind::LogicError,
		message: "DEF_ENCODED does not name a block compressor".to_string(),
		label: Some("unresolved compression kind".to_string()),
		help: Some("Use COMPRESS_ZSTD or COMPRESS_ZLIB to request block compression".to_string()),
		notes: vec!["DEF_ENCODED means the column relies on its own run length encoding".to_string()],
		cause: None,
	}
}

/// The underlying library rejected a compress call
pub fn compress_failed(algorithm: &str, name: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "COMPRESSION_002".to_string(),
		kind: ErrorKind::OutOfRange,
		message: format!("{} compression failed: {}", algorithm, name.into()),
		label: None,
		help: Some("Size the destination with the compress bound of the source".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// The underlying library rejected a decompress call
pub fn decompress_failed(algorithm: &str, name: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "COMPRESSION_003".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!("{} decompression failed: {}", algorithm, name.into()),
		label: Some("invalid compressed frame".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A decompressed block does not have the length recorded for it
pub fn decompress_size_mismatch(expected: usize, actual: usize) -> Diagnostic {
	Diagnostic {
		code: "COMPRESSION_004".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!("Decompressed {} bytes, expected {}", actual, expected),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
