// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_core::{Bitmap8, BufferConfig, ColumnEncodingKind, DataBuffer, DecodingOptions, EncodingOptions};
use pax_encoding::Integer;
use pax_type::{Result, diagnostic::column, return_error};
use tracing::{debug, instrument};

use crate::{
	Column, StorageFormat, check_position, check_range, push_not_null, push_null,
	stream::{StreamWriter, decode_stream},
};

/// Column of fixed width integers.
///
/// The raw values are kept next to the stream writer so positions and ranges
/// stay addressable after the column was encoded.
pub struct FixedColumn<T: Integer> {
	format: StorageFormat,
	options: EncodingOptions,
	config: BufferConfig,
	data: DataBuffer<T>,
	bitmap: Option<Bitmap8>,
	rows: usize,
	non_null: usize,
	stream: StreamWriter,
}

impl<T: Integer> FixedColumn<T> {
	/// An unencoded column with room for `capacity` values.
	pub fn new(capacity: usize, format: StorageFormat) -> Result<Self> {
		Self::with_encoding(capacity, format, EncodingOptions::new(ColumnEncodingKind::NoEncoded, true))
	}

	pub fn with_encoding(capacity: usize, format: StorageFormat, options: EncodingOptions) -> Result<Self> {
		Self::with_config(format, options, &BufferConfig::default().with_initial_capacity(capacity))
	}

	pub fn with_config(format: StorageFormat, options: EncodingOptions, config: &BufferConfig) -> Result<Self> {
		let stream = StreamWriter::new(options.kind, options.is_sign, options.compress_level, true, config)?;
		Ok(Self {
			format,
			options,
			config: *config,
			data: DataBuffer::with_config(config)?,
			bitmap: None,
			rows: 0,
			non_null: 0,
			stream,
		})
	}

	/// A column to be filled from a physical stream with [`set`](FixedColumn::set).
	pub fn with_decoding(format: StorageFormat, options: DecodingOptions) -> Result<Self> {
		let options = EncodingOptions::new(options.kind, options.is_sign).with_compress_level(options.compress_level);
		Self::with_config(format, options, &BufferConfig::default())
	}

	/// Replaces the content with `rows` rows decoded from the physical stream `src`.
	///
	/// `not_null` marks the rows holding a value, `None` means no row is null.
	#[instrument(name = "column::fixed::set", level = "debug", skip(self, src, not_null), fields(len = src.len()))]
	pub fn set(&mut self, src: &[u8], rows: usize, not_null: Option<Bitmap8>) -> Result<()> {
		if let Some(bitmap) = not_null.as_ref() {
			if bitmap.len() != rows {
				return_error!(column::bitmap_length_mismatch(rows, bitmap.len()));
			}
		}

		let non_null = not_null.as_ref().map_or(rows, Bitmap8::count_ones);
		let (slots, spread) = match self.format {
			StorageFormat::Vectorized => (rows, not_null.as_ref()),
			StorageFormat::NonVectorized => (non_null, None),
		};
		let data = decode_stream::<T>(&DecodingOptions::from(self.options), src, slots, spread)?;

		let mut stream = StreamWriter::new(
			self.options.kind,
			self.options.is_sign,
			self.options.compress_level,
			true,
			&self.config,
		)?;
		for (slot, value) in data.as_slice().iter().enumerate() {
			if spread.is_none_or(|bitmap| bitmap.get(slot)) {
				stream.append(value.to_i64())?;
			}
		}

		debug!(rows, non_null, "column filled from {} stream", stream.kind());
		self.data = data;
		self.stream = stream;
		self.bitmap = not_null;
		self.rows = rows;
		self.non_null = non_null;
		Ok(())
	}

	pub fn push(&mut self, value: T) -> Result<()> {
		self.stream.append(value.to_i64())?;
		self.data.push(value)?;
		push_not_null(&mut self.bitmap);
		self.rows += 1;
		self.non_null += 1;
		Ok(())
	}

	/// The values per slot, nulls included as zero in the vectorized layout.
	pub fn values(&self) -> &[T] {
		self.data.as_slice()
	}

	fn slots(&self) -> usize {
		self.data.used()
	}
}

impl<T: Integer> Column for FixedColumn<T> {
	fn storage_format(&self) -> StorageFormat {
		self.format
	}

	fn append(&mut self, value: &[u8]) -> Result<()> {
		if value.len() != T::WIDTH {
			return_error!(column::value_width_mismatch(T::WIDTH, value.len()));
		}
		self.push(bytemuck::pod_read_unaligned(value))
	}

	fn append_null(&mut self) -> Result<()> {
		self.stream.touch()?;
		if self.format == StorageFormat::Vectorized {
			self.data.push(T::default())?;
		}
		push_null(&mut self.bitmap, self.rows);
		self.rows += 1;
		Ok(())
	}

	fn rows(&self) -> usize {
		self.rows
	}

	fn non_null_rows(&self) -> usize {
		self.non_null
	}

	fn bitmap(&self) -> Option<&Bitmap8> {
		self.bitmap.as_ref()
	}

	fn buffer(&mut self) -> Result<&[u8]> {
		self.stream.finish(self.data.as_bytes())
	}

	fn buffer_at(&self, position: usize) -> Result<Option<&[u8]>> {
		check_position(position, self.slots())?;
		let start = position * T::WIDTH;
		Ok(Some(&self.data.as_bytes()[start..start + T::WIDTH]))
	}

	fn range_buffer(&self, start: usize, len: usize) -> Result<&[u8]> {
		check_range(start, len, self.slots())?;
		Ok(&self.data.as_bytes()[start * T::WIDTH..(start + len) * T::WIDTH])
	}

	fn physical_size(&self) -> usize {
		self.stream.physical_size(self.origin_length())
	}

	fn origin_length(&self) -> usize {
		self.data.used() * T::WIDTH
	}

	fn encoding_kind(&self) -> ColumnEncodingKind {
		self.stream.kind()
	}

	fn compress_level(&self) -> i32 {
		self.stream.level()
	}

	fn align_size(&self) -> usize {
		T::WIDTH
	}
}
