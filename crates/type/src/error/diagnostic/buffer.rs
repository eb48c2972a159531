// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{ErrorKind, error::diagnostic::Diagnostic};

/// A resize asked for more memory than the hard buffer ceiling allows
pub fn capacity_exceeded(requested: usize, limit: usize) -> Diagnostic {
	Diagnostic {
		code: "BUFFER_001".to_string(),
		kind: ErrorKind::OutOfMemory,
		message: format!("Buffer capacity of {} bytes exceeds the limit of {} bytes", requested, limit),
		label: Some("buffer growth rejected".to_string()),
		help: Some("Flush the column chunk earlier so a single buffer stays below the limit".to_string()),
		notes: vec![
			"Buffers grow geometrically, a runaway size usually means corrupt input".to_string(),
		],
		cause: None,
	}
}

/// The allocator could not provide the requested memory
pub fn allocation_failed(requested: usize) -> Diagnostic {
	Diagnostic {
		code: "BUFFER_002".to_string(),
		kind: ErrorKind::OutOfMemory,
		message: format!("Failed to allocate {} bytes", requested),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// Growing or shrinking was requested on memory the buffer does not own
pub fn buffer_not_owned(operation: &str) -> Diagnostic {
	Diagnostic {
		code: "BUFFER_003".to_string(),
		kind: ErrorKind::LogicError,
		message: format!("Cannot {} a buffer that does not own its memory", operation),
		label: Some("shared buffer".to_string()),
		help: Some("Copy the buffer into owned memory before changing its capacity".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// A byte region cannot be viewed as whole elements of the requested width
pub fn element_size_mismatch(bytes: usize, element_size: usize) -> Diagnostic {
	Diagnostic {
		code: "BUFFER_004".to_string(),
		kind: ErrorKind::LogicError,
		message: format!("{} bytes is not a multiple of the element size {}", bytes, element_size),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
