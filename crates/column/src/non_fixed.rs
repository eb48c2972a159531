// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_core::{Bitmap8, BufferConfig, ColumnEncodingKind, DataBuffer, DecodingOptions, EncodingOptions, MEMORY_ALIGN_SIZE};
use pax_type::{Result, diagnostic::column, return_error};
use tracing::{debug, instrument};

use crate::{
	Column, StorageFormat, check_position, check_range, push_not_null, push_null,
	stream::{StreamWriter, decode_bytes, decode_stream},
};

/// Column of variable width values.
///
/// Values are concatenated into the data stream, their lengths go into a
/// separate `i32` stream that may be run length encoded or compressed on its own.
pub struct NonFixedColumn {
	format: StorageFormat,
	options: EncodingOptions,
	config: BufferConfig,
	data: DataBuffer<u8>,
	lengths: DataBuffer<i32>,
	// slot boundaries into `data`, one more than there are slots
	offsets: Vec<usize>,
	bitmap: Option<Bitmap8>,
	rows: usize,
	non_null: usize,
	data_stream: StreamWriter,
	lengths_stream: StreamWriter,
	align: usize,
}

impl NonFixedColumn {
	/// An unencoded column with room for `capacity` bytes of values.
	pub fn new(capacity: usize, format: StorageFormat) -> Result<Self> {
		Self::with_encoding(capacity, format, EncodingOptions::new(ColumnEncodingKind::NoEncoded, false))
	}

	pub fn with_encoding(capacity: usize, format: StorageFormat, options: EncodingOptions) -> Result<Self> {
		Self::with_config(format, options, &BufferConfig::default().with_initial_capacity(capacity))
	}

	pub fn with_config(format: StorageFormat, options: EncodingOptions, config: &BufferConfig) -> Result<Self> {
		let data_stream = StreamWriter::new(options.kind, options.is_sign, options.compress_level, false, config)?;
		let lengths_stream =
			StreamWriter::new(options.lengths_kind, false, options.lengths_compress_level, true, config)?;

		Ok(Self {
			format,
			options,
			config: *config,
			data: DataBuffer::with_config(config)?,
			lengths: DataBuffer::with_config(&config.with_initial_capacity(config.initial_capacity / 8))?,
			offsets: vec![0],
			bitmap: None,
			rows: 0,
			non_null: 0,
			data_stream,
			lengths_stream,
			align: MEMORY_ALIGN_SIZE,
		})
	}

	/// A column to be filled from physical streams with [`set`](NonFixedColumn::set).
	pub fn with_decoding(format: StorageFormat, options: DecodingOptions) -> Result<Self> {
		let options = EncodingOptions::new(options.kind, options.is_sign)
			.with_compress_level(options.compress_level)
			.with_lengths(options.lengths_kind, options.lengths_compress_level);
		Self::with_config(format, options, &BufferConfig::default())
	}

	pub fn with_align_size(mut self, align: usize) -> Self {
		self.align = align.max(1);
		self
	}

	/// Replaces the content with `rows` rows decoded from the physical data and
	/// lengths streams. `origin_length` is the raw size of the data stream.
	#[instrument(
		name = "column::non_fixed::set",
		level = "debug",
		skip(self, data, lengths, not_null),
		fields(data = data.len(), lengths = lengths.len())
	)]
	pub fn set(
		&mut self,
		data: &[u8],
		lengths: &[u8],
		origin_length: usize,
		rows: usize,
		not_null: Option<Bitmap8>,
	) -> Result<()> {
		if let Some(bitmap) = not_null.as_ref() {
			if bitmap.len() != rows {
				return_error!(column::bitmap_length_mismatch(rows, bitmap.len()));
			}
		}

		let non_null = not_null.as_ref().map_or(rows, Bitmap8::count_ones);
		let slots = match self.format {
			StorageFormat::Vectorized => rows,
			StorageFormat::NonVectorized => non_null,
		};

		let lengths_options = DecodingOptions::new(self.options.lengths_kind, false)
			.with_compress_level(self.options.lengths_compress_level);
		let lengths = decode_stream::<i32>(&lengths_options, lengths, slots, None)?;
		let data = decode_bytes(&DecodingOptions::from(self.options), data, origin_length)?;

		let mut offsets = Vec::with_capacity(slots + 1);
		offsets.push(0usize);
		let mut end = 0usize;
		for &len in lengths.as_slice() {
			end = end.saturating_add(usize::try_from(len).unwrap_or(usize::MAX));
			offsets.push(end);
		}
		if end != origin_length {
			return_error!(column::origin_length_mismatch(origin_length, end));
		}

		let data_stream = StreamWriter::new(
			self.options.kind,
			self.options.is_sign,
			self.options.compress_level,
			false,
			&self.config,
		)?;
		let mut lengths_stream = StreamWriter::new(
			self.options.lengths_kind,
			false,
			self.options.lengths_compress_level,
			true,
			&self.config,
		)?;
		for &len in lengths.as_slice() {
			lengths_stream.append(len as i64)?;
		}

		debug!(rows, non_null, bytes = origin_length, "column filled from {} stream", data_stream.kind());
		self.data = data;
		self.lengths = lengths;
		self.offsets = offsets;
		self.data_stream = data_stream;
		self.lengths_stream = lengths_stream;
		self.bitmap = not_null;
		self.rows = rows;
		self.non_null = non_null;
		Ok(())
	}

	/// The length of every slot, null slots of the vectorized layout included as zero.
	pub fn lengths(&self) -> &[i32] {
		self.lengths.as_slice()
	}

	fn slots(&self) -> usize {
		self.offsets.len() - 1
	}

	fn push_slot(&mut self, len: i32) -> Result<()> {
		self.lengths_stream.append(len as i64)?;
		self.lengths.push(len)?;
		self.offsets.push(self.data.used());
		Ok(())
	}
}

impl Column for NonFixedColumn {
	fn storage_format(&self) -> StorageFormat {
		self.format
	}

	fn append(&mut self, value: &[u8]) -> Result<()> {
		self.data_stream.touch()?;
		self.lengths_stream.touch()?;

		self.data.extend_from_slice(value)?;
		self.push_slot(value.len() as i32)?;
		push_not_null(&mut self.bitmap);
		self.rows += 1;
		self.non_null += 1;
		Ok(())
	}

	fn append_null(&mut self) -> Result<()> {
		self.data_stream.touch()?;
		self.lengths_stream.touch()?;

		if self.format == StorageFormat::Vectorized {
			self.push_slot(0)?;
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
		self.data_stream.finish(self.data.as_slice())
	}

	fn buffer_at(&self, position: usize) -> Result<Option<&[u8]>> {
		check_position(position, self.slots())?;
		if self.format == StorageFormat::Vectorized
			&& self.bitmap.as_ref().is_some_and(|bitmap| !bitmap.get(position))
		{
			return Ok(None);
		}
		Ok(Some(&self.data.as_slice()[self.offsets[position]..self.offsets[position + 1]]))
	}

	fn range_buffer(&self, start: usize, len: usize) -> Result<&[u8]> {
		check_range(start, len, self.slots())?;
		Ok(&self.data.as_slice()[self.offsets[start]..self.offsets[start + len]])
	}

	fn lengths_buffer(&mut self) -> Result<Option<&[u8]>> {
		self.lengths_stream.finish(self.lengths.as_bytes()).map(Some)
	}

	fn physical_size(&self) -> usize {
		self.data_stream.physical_size(self.data.used())
	}

	fn origin_length(&self) -> usize {
		self.data.used()
	}

	fn lengths_origin_length(&self) -> usize {
		self.lengths.used() * size_of::<i32>()
	}

	fn encoding_kind(&self) -> ColumnEncodingKind {
		self.data_stream.kind()
	}

	fn compress_level(&self) -> i32 {
		self.data_stream.level()
	}

	fn lengths_encoding_kind(&self) -> ColumnEncodingKind {
		self.lengths_stream.kind()
	}

	fn lengths_compress_level(&self) -> i32 {
		self.lengths_stream.level()
	}

	fn align_size(&self) -> usize {
		self.align
	}
}
