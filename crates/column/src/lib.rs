// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

use std::fmt::{Display, Formatter};

use pax_core::{Bitmap8, ColumnEncodingKind};
use pax_type::{Result, diagnostic::column, return_error};
use serde::{Deserialize, Serialize};

mod columns;
mod fixed;
mod non_fixed;
mod stream;

pub use columns::{ColumnEncodingInfo, Columns, CombinedBuffer, StreamInfo, StreamKind};
pub use fixed::FixedColumn;
pub use non_fixed::NonFixedColumn;

/// How a column lays out null rows in its data buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageFormat {
	/// Null rows take no slot, values are indexed by their position among the non null rows.
	#[default]
	NonVectorized,
	/// Every row takes a slot, values are indexed by row.
	Vectorized,
}

impl Display for StorageFormat {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			StorageFormat::NonVectorized => f.write_str("non-vectorized"),
			StorageFormat::Vectorized => f.write_str("vectorized"),
		}
	}
}

/// A column chunk under construction or read back from its streams.
///
/// Positions passed to [`buffer_at`](Column::buffer_at) and
/// [`range_buffer`](Column::range_buffer) are rows for vectorized columns and
/// non null value indexes for non vectorized ones. In the vectorized layout a
/// fixed width column reports the zero filled slot of a null row while a
/// variable width column reports `None`.
pub trait Column {
	fn storage_format(&self) -> StorageFormat;

	/// Appends one non null value.
	fn append(&mut self, value: &[u8]) -> Result<()>;

	fn append_null(&mut self) -> Result<()>;

	fn rows(&self) -> usize;

	fn non_null_rows(&self) -> usize;

	/// The not null bitmap, present once the column holds a null row.
	fn bitmap(&self) -> Option<&Bitmap8>;

	fn has_null(&self) -> bool {
		self.non_null_rows() < self.rows()
	}

	fn range_non_null_rows(&self, start: usize, len: usize) -> Result<usize> {
		check_range(start, len, self.rows())?;
		Ok(match self.bitmap() {
			Some(bitmap) => bitmap.count_range(start, start + len),
			None => len,
		})
	}

	/// The physical data stream: encoded, compressed or raw depending on the
	/// column encoding. Encoding closes the column for further appends.
	fn buffer(&mut self) -> Result<&[u8]>;

	fn buffer_at(&self, position: usize) -> Result<Option<&[u8]>>;

	fn range_buffer(&self, start: usize, len: usize) -> Result<&[u8]>;

	/// The physical lengths stream of variable width columns.
	fn lengths_buffer(&mut self) -> Result<Option<&[u8]>> {
		Ok(None)
	}

	/// Size of the physical data stream as of now.
	fn physical_size(&self) -> usize;

	/// Size of the raw data before encoding or compression.
	fn origin_length(&self) -> usize;

	fn lengths_origin_length(&self) -> usize {
		0
	}

	fn encoding_kind(&self) -> ColumnEncodingKind;

	fn compress_level(&self) -> i32;

	fn lengths_encoding_kind(&self) -> ColumnEncodingKind {
		ColumnEncodingKind::NoEncoded
	}

	fn lengths_compress_level(&self) -> i32 {
		0
	}

	/// Alignment of the data stream inside a non vectorized column group.
	fn align_size(&self) -> usize;
}

pub(crate) fn check_range(start: usize, len: usize, bound: usize) -> Result<()> {
	if start.checked_add(len).is_none_or(|end| end > bound) {
		return_error!(column::range_out_of_bounds(start, len, bound));
	}
	Ok(())
}

pub(crate) fn check_position(position: usize, bound: usize) -> Result<()> {
	if position >= bound {
		return_error!(column::position_out_of_range(position, bound));
	}
	Ok(())
}

/// Creates the bitmap on the first null row, every earlier row is non null.
pub(crate) fn push_null(bitmap: &mut Option<Bitmap8>, rows: usize) {
	bitmap.get_or_insert_with(|| Bitmap8::repeat(true, rows)).push(false);
}

pub(crate) fn push_not_null(bitmap: &mut Option<Bitmap8>) {
	if let Some(bitmap) = bitmap {
		bitmap.push(true);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_check_range() {
		assert!(check_range(0, 10, 10).is_ok());
		assert!(check_range(10, 0, 10).is_ok());
		assert_eq!(check_range(5, 6, 10).unwrap_err().code, "COLUMN_002");
		assert!(check_range(usize::MAX, 2, 10).is_err());
	}

	#[test]
	fn test_push_null() {
		let mut bitmap = None;
		push_not_null(&mut bitmap);
		assert!(bitmap.is_none());

		push_null(&mut bitmap, 3);
		push_not_null(&mut bitmap);
		let bitmap = bitmap.unwrap();
		assert_eq!(bitmap.len(), 5);
		assert_eq!(bitmap.count_ones(), 4);
		assert!(!bitmap.get(3));
	}
}
