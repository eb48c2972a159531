// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{ErrorKind, error::diagnostic::Diagnostic};

/// DEF_ENCODED reached an encoder or decoder factory unresolved
pub fn default_encoding_kind() -> Diagnostic {
	Diagnostic {
		code: "ENCODING_001".to_string(),
		kind: ErrorKind::LogicError,
		message: "DEF_ENCODED is not a concrete encoding".to_string(),
		label: Some("unresolved encoding kind".to_string()),
		help: Some("Resolve the default encoding for the column type before creating a codec".to_string()),
		notes: vec!["DEF_ENCODED is a placeholder and never appears on the wire".to_string()],
		cause: None,
	}
}

/// A patched base header announced an empty patch list
pub fn invalid_patch_length() -> Diagnostic {
	Diagnostic {
		code: "ENCODING_002".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: "Patched base run has a patch list length of zero".to_string(),
		label: Some("invalid encoded format".to_string()),
		help: None,
		notes: vec!["The stream is corrupt or was not produced by this encoder".to_string()],
		cause: None,
	}
}

/// Patch width plus gap width does not fit into one 64 bit word
pub fn patch_width_overflow(patch_bits: u32, gap_bits: u32) -> Diagnostic {
	Diagnostic {
		code: "ENCODING_003".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!(
			"Patch width {} plus gap width {} exceeds 64 bits",
			patch_bits, gap_bits
		),
		label: Some("invalid encoded format".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// The encoded stream ended in the middle of a run
pub fn truncated_stream(needed: usize, available: usize) -> Diagnostic {
	Diagnostic {
		code: "ENCODING_004".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!("Encoded stream truncated: needed {} bytes, {} available", needed, available),
		label: Some("invalid encoded format".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// Decoding produced more values than the destination can hold
pub fn decode_capacity_exceeded(decoded: usize, capacity: usize) -> Diagnostic {
	Diagnostic {
		code: "ENCODING_005".to_string(),
		kind: ErrorKind::OutOfRange,
		message: format!("Decoded {} values into a destination of {} values", decoded, capacity),
		label: Some("destination too small".to_string()),
		help: Some("Size the destination from the original length recorded for the column".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// A value was appended after the encoder was flushed to completion
pub fn encoder_finished() -> Diagnostic {
	Diagnostic {
		code: "ENCODING_006".to_string(),
		kind: ErrorKind::LogicError,
		message: "Cannot append to an encoder that has already been flushed".to_string(),
		label: None,
		help: Some("Create a new encoder for every column chunk".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// A block header carries a bit width that no encoder produces
pub fn invalid_bit_width(bits: u32) -> Diagnostic {
	Diagnostic {
		code: "ENCODING_007".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!("Invalid bit width {}", bits),
		label: Some("invalid encoded format".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// Decoding was started before a destination buffer was attached
pub fn missing_data_buffer() -> Diagnostic {
	Diagnostic {
		code: "ENCODING_008".to_string(),
		kind: ErrorKind::LogicError,
		message: "Decoder has no destination buffer".to_string(),
		label: None,
		help: Some("Attach a destination with set_data_buffer before decoding".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// A base 128 varint did not terminate within 64 bits
pub fn varint_overflow() -> Diagnostic {
	Diagnostic {
		code: "ENCODING_009".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: "Varint exceeds 64 bits".to_string(),
		label: Some("invalid encoded format".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A patch list ran out of entries while a gap was still being accumulated
pub fn patch_list_overrun(entries: usize) -> Diagnostic {
	Diagnostic {
		code: "ENCODING_010".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!("Patch gap runs past the end of a patch list of {} entries", entries),
		label: Some("invalid encoded format".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A run header announced a length its sub encoding cannot carry
pub fn invalid_run_length(len: usize) -> Diagnostic {
	Diagnostic {
		code: "ENCODING_011".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!("Invalid run length {}", len),
		label: Some("invalid encoded format".to_string()),
		help: None,
		notes: vec!["Delta runs with packed deltas carry at least two values".to_string()],
		cause: None,
	}
}

/// The stream decoded to a different number of values than the caller expected
pub fn decode_length_mismatch(expected: usize, actual: usize) -> Diagnostic {
	Diagnostic {
		code: "ENCODING_012".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!("Expected {} decoded values, stream produced {}", expected, actual),
		label: Some("invalid encoded format".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}
