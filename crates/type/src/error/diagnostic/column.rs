// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{ErrorKind, error::diagnostic::Diagnostic};

/// A single row position is outside the column
pub fn position_out_of_range(position: usize, rows: usize) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_001".to_string(),
		kind: ErrorKind::OutOfRange,
		message: format!("Position {} is out of range for {} rows", position, rows),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A row range reaches past the end of the column
pub fn range_out_of_bounds(start: usize, len: usize, rows: usize) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_002".to_string(),
		kind: ErrorKind::OutOfRange,
		message: format!("Range [{}, {}) is out of bounds for {} rows", start, start.saturating_add(len), rows),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A fixed width column received a value of a different width
pub fn value_width_mismatch(expected: usize, actual: usize) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_003".to_string(),
		kind: ErrorKind::LogicError,
		message: format!("Expected a value of {} bytes, got {}", expected, actual),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// Decoded or decompressed data does not match the recorded original length
pub fn origin_length_mismatch(expected: usize, actual: usize) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_004".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!("Column data has {} bytes, expected {}", actual, expected),
		label: Some("decode length mismatch".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A column index is outside a column group
pub fn column_index_out_of_range(position: usize, columns: usize) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_005".to_string(),
		kind: ErrorKind::OutOfRange,
		message: format!("Column {} is out of range for {} columns", position, columns),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// The operation is not available on this column
pub fn unsupported_operation(operation: &str) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_006".to_string(),
		kind: ErrorKind::LogicError,
		message: format!("Operation '{}' is not supported by this column", operation),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// Columns combined into one group disagree on their storage format
pub fn storage_format_mismatch(expected: &str, actual: &str) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_007".to_string(),
		kind: ErrorKind::LogicError,
		message: format!("Column uses {} storage format, group uses {}", actual, expected),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A not null bitmap handed to a column covers a different number of rows
pub fn bitmap_length_mismatch(rows: usize, bits: usize) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_008".to_string(),
		kind: ErrorKind::InvalidFormat,
		message: format!("Not null bitmap has {} bits for {} rows", bits, rows),
		label: None,
		help: Some("The bitmap needs exactly one bit per row".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// Two column groups merged into one hold a different number of columns
pub fn column_count_mismatch(expected: usize, actual: usize) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_009".to_string(),
		kind: ErrorKind::LogicError,
		message: format!("Cannot merge a group of {} columns into a group of {}", actual, expected),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A merge would replace a column that is already present
pub fn column_slot_occupied(position: usize) -> Diagnostic {
	Diagnostic {
		code: "COLUMN_010".to_string(),
		kind: ErrorKind::LogicError,
		message: format!("Column {} is present in both groups", position),
		label: None,
		help: Some("Merged groups must fill disjoint columns".to_string()),
		notes: vec![],
		cause: None,
	}
}
