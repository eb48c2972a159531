// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_compression::{BlockCompressor, create_compressor};
use pax_core::{Bitmap8, BufferConfig, ColumnEncodingKind, DataBuffer, DecodingOptions, EncodingOptions};
use pax_encoding::{Encoder, Integer, create_decoder, create_encoder};
use pax_type::{
	Result,
	diagnostic::{column, encoding},
	error, return_error,
};
use tracing::{debug, instrument};

/// The transform a stream actually gets.
///
/// `DEF_ENCODED` falls back to raw values and a block compression kind without
/// a positive level leaves the stream uncompressed.
pub(crate) fn resolve_kind(kind: ColumnEncodingKind, level: i32) -> ColumnEncodingKind {
	match kind {
		ColumnEncodingKind::DefEncoded => ColumnEncodingKind::NoEncoded,
		kind if kind.is_compress() && level <= 0 => ColumnEncodingKind::NoEncoded,
		kind => kind,
	}
}

/// Write side of one column stream.
///
/// Run length encoded streams are fed value by value, compressed streams are
/// compressed from the raw data when the physical buffer is requested.
pub(crate) struct StreamWriter {
	kind: ColumnEncodingKind,
	level: i32,
	encoder: Option<Box<dyn Encoder>>,
	compressor: Option<Box<dyn BlockCompressor>>,
	compressed: Option<DataBuffer<u8>>,
	flushed: bool,
}

impl StreamWriter {
	/// `integers` tells whether the stream carries integers a run length encoder can take.
	pub fn new(
		kind: ColumnEncodingKind,
		is_sign: bool,
		level: i32,
		integers: bool,
		config: &BufferConfig,
	) -> Result<Self> {
		let kind = resolve_kind(kind, level);
		if kind.is_rle() && !integers {
			return_error!(column::unsupported_operation("run length encoding of variable width values"));
		}

		let encoder = create_encoder(&EncodingOptions::new(kind, is_sign), config)?;
		let compressor = create_compressor(kind)?;
		debug!("column stream uses {} at level {}", kind, level);

		Ok(Self {
			kind,
			level,
			encoder,
			compressor,
			compressed: None,
			flushed: false,
		})
	}

	pub fn kind(&self) -> ColumnEncodingKind {
		self.kind
	}

	pub fn level(&self) -> i32 {
		self.level
	}

	/// Feeds one non null value to the run length encoder, if any.
	pub fn append(&mut self, value: i64) -> Result<()> {
		self.touch()?;
		match self.encoder.as_mut() {
			Some(encoder) => encoder.append(value),
			None => Ok(()),
		}
	}

	/// Marks the raw data as changed. An encoded stream can no longer change
	/// once it was flushed.
	pub fn touch(&mut self) -> Result<()> {
		if self.flushed {
			return_error!(encoding::encoder_finished());
		}
		self.compressed = None;
		Ok(())
	}

	/// The physical stream for `raw`.
	pub fn finish<'a>(&'a mut self, raw: &'a [u8]) -> Result<&'a [u8]> {
		if let Some(encoder) = self.encoder.as_mut() {
			encoder.flush()?;
			self.flushed = true;
			return Ok(encoder.buffer());
		}

		let Some(compressor) = self.compressor.as_ref() else {
			return Ok(raw);
		};
		if self.compressed.is_none() {
			self.compressed = Some(compressor.compress_block(raw, self.level)?);
		}
		Ok(self.compressed.as_ref().map_or(&[][..], |buffer| buffer.as_slice()))
	}

	pub fn physical_size(&self, raw_len: usize) -> usize {
		if let Some(encoder) = self.encoder.as_ref() {
			return encoder.buffer_size();
		}
		match self.compressed.as_ref() {
			Some(buffer) => buffer.used(),
			None => raw_len,
		}
	}
}

/// Rebuilds `slots` values of `T` from a physical stream.
///
/// With a not null bitmap the run length decoder spreads the values over the
/// rows set in it, `slots` then counts every row.
#[instrument(name = "column::decode_stream", level = "trace", skip(src, not_null), fields(len = src.len()))]
pub(crate) fn decode_stream<T: Integer>(
	options: &DecodingOptions,
	src: &[u8],
	slots: usize,
	not_null: Option<&Bitmap8>,
) -> Result<DataBuffer<T>> {
	let kind = resolve_kind(options.kind, options.compress_level);
	let origin_len = slots * T::WIDTH;

	if kind.is_rle() {
		let mut decoder = create_decoder::<T>(&DecodingOptions::new(kind, options.is_sign))?
			.ok_or_else(|| error!(encoding::default_encoding_kind()))?;
		decoder.set_src_buffer(if src.is_empty() { None } else { Some(src) });
		decoder.set_data_buffer(DataBuffer::with_capacity(slots)?);

		let decoded = match not_null {
			Some(bitmap) => decoder.decoding_with_nulls(bitmap, slots)?,
			None => decoder.decoding()?,
		};
		if decoded != origin_len {
			return_error!(column::origin_length_mismatch(origin_len, decoded));
		}
		return decoder.take_data_buffer().ok_or_else(|| error!(encoding::missing_data_buffer()));
	}

	let raw = match create_compressor(kind)? {
		Some(compressor) => compressor.decompress_block(src, origin_len)?,
		None => DataBuffer::from_vec(src.to_vec()),
	};
	if raw.used() != origin_len {
		return_error!(column::origin_length_mismatch(origin_len, raw.used()));
	}
	raw.cast::<T>()
}

/// Rebuilds a byte stream of `origin_len` bytes.
pub(crate) fn decode_bytes(options: &DecodingOptions, src: &[u8], origin_len: usize) -> Result<DataBuffer<u8>> {
	let kind = resolve_kind(options.kind, options.compress_level);
	if kind.is_rle() {
		return_error!(column::unsupported_operation("run length decoding of variable width values"));
	}

	let raw = match create_compressor(kind)? {
		Some(compressor) => compressor.decompress_block(src, origin_len)?,
		None => DataBuffer::from_vec(src.to_vec()),
	};
	if raw.used() != origin_len {
		return_error!(column::origin_length_mismatch(origin_len, raw.used()));
	}
	Ok(raw)
}
