// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_core::{Bitmap8, BufferConfig, ColumnEncodingKind, DataBuffer, DecodingOptions, EncodingOptions};
use pax_type::{Result, diagnostic::encoding, error, return_error};
use tracing::{instrument, trace};

use crate::{DeltaDecoder, DeltaEncoder, Integer, OrcDecoder, OrcEncoder};

/// Write side of an integer stream codec.
pub trait Encoder {
	fn append(&mut self, value: i64) -> Result<()>;

	/// Emits everything still staged. Calling it again without new values changes nothing.
	fn flush(&mut self) -> Result<()>;

	fn buffer(&self) -> &[u8];

	fn buffer_size(&self) -> usize {
		self.buffer().len()
	}

	/// Replaces the output buffer, encoded bytes are appended after its used part.
	fn set_data_buffer(&mut self, buffer: DataBuffer<u8>);

	/// Hands out the output buffer, leaving an empty one behind.
	fn take_buffer(&mut self) -> DataBuffer<u8>;
}

/// Read side of an integer stream codec, decoding into `T`.
pub trait Decoder<'a, T: Integer> {
	/// Attaches the encoded stream. `None` stands for a chunk without any non null value.
	fn set_src_buffer(&mut self, src: Option<&'a [u8]>);

	/// Attaches the destination, decoded values are written after its used part.
	fn set_data_buffer(&mut self, buffer: DataBuffer<T>);

	fn data_buffer(&self) -> Option<&DataBuffer<T>>;

	fn data_buffer_mut(&mut self) -> Option<&mut DataBuffer<T>>;

	fn take_data_buffer(&mut self) -> Option<DataBuffer<T>>;

	/// Decodes one block and returns the decoded size in bytes, null slots
	/// included. Returns the unchanged size once the stream is exhausted.
	fn next(&mut self, not_null: Option<&Bitmap8>) -> Result<usize>;

	fn buffer(&self) -> &[T] {
		self.data_buffer().map(|b| b.as_slice()).unwrap_or(&[])
	}

	/// Decoded size in bytes.
	fn buffer_size(&self) -> usize {
		self.data_buffer().map(|b| b.used() * T::WIDTH).unwrap_or(0)
	}

	/// Drains the stream, returns the decoded size in bytes.
	#[instrument(name = "encoding::decoding", level = "trace", skip(self))]
	fn decoding(&mut self) -> Result<usize> {
		drain(self, None)
	}

	/// Drains the stream into `total` rows, placing values on the rows set in `not_null`.
	#[instrument(name = "encoding::decoding_with_nulls", level = "trace", skip(self, not_null))]
	fn decoding_with_nulls(&mut self, not_null: &Bitmap8, total: usize) -> Result<usize> {
		let decoded = drain(self, Some(not_null))?;

		let result = self.data_buffer_mut().ok_or_else(|| error!(encoding::missing_data_buffer()))?;
		skip_nulls(result, not_null, total)?;

		if result.used() != total {
			return_error!(encoding::decode_length_mismatch(total, result.used()));
		}

		trace!("decoded {} bytes, {} with trailing nulls", decoded, result.used() * T::WIDTH);
		Ok(result.used() * T::WIDTH)
	}
}

fn drain<'a, T: Integer, D: Decoder<'a, T> + ?Sized>(decoder: &mut D, not_null: Option<&Bitmap8>) -> Result<usize> {
	let mut decoded = decoder.next(not_null)?;
	loop {
		let last = decoded;
		decoded = decoder.next(not_null)?;
		if decoded == last {
			return Ok(decoded);
		}
	}
}

/// Advances the cursor of `dst` over null rows, stopping at the first non null
/// row or at `end`.
pub(crate) fn skip_nulls<T: Integer>(dst: &mut DataBuffer<T>, not_null: &Bitmap8, end: usize) -> Result<()> {
	let end = end.min(not_null.len());
	let mut index = dst.used();
	while index < end && !not_null.get(index) {
		index += 1;
	}

	if index > dst.capacity() {
		return_error!(encoding::decode_capacity_exceeded(index, dst.capacity()));
	}
	dst.brush(index - dst.used());
	Ok(())
}

/// Writes a decoded block after the used part of `dst`, skipping null rows.
/// Returns the number of slots consumed, nulls included.
pub(crate) fn copy_run<T: Integer>(
	dst: &mut DataBuffer<T>,
	literals: &[i64],
	not_null: Option<&Bitmap8>,
) -> Result<usize> {
	let start = dst.used();
	let capacity = dst.capacity();
	let region = dst.region_mut();

	let Some(bitmap) = not_null else {
		if start + literals.len() > capacity {
			return_error!(encoding::decode_capacity_exceeded(start + literals.len(), capacity));
		}
		for (slot, value) in region[start..start + literals.len()].iter_mut().zip(literals) {
			*slot = T::from_i64(*value);
		}
		return Ok(literals.len());
	};

	let mut skipped = 0;
	let mut pos = 0;
	while pos < literals.len() {
		let index = start + pos + skipped;
		if index >= capacity || index >= bitmap.len() {
			return_error!(encoding::decode_capacity_exceeded(index + 1, capacity.min(bitmap.len())));
		}

		if bitmap.get(index) {
			region[index] = T::from_i64(literals[pos]);
			pos += 1;
		} else {
			skipped += 1;
		}
	}

	Ok(skipped + literals.len())
}

/// Creates the encoder for `options.kind`.
///
/// Returns `None` for kinds that leave values unencoded, raw and block
/// compressed chunks included. `DEF_ENCODED` has to be resolved by the column
/// before it gets here.
pub fn create_encoder(options: &EncodingOptions, config: &BufferConfig) -> Result<Option<Box<dyn Encoder>>> {
	match options.kind {
		ColumnEncodingKind::RleV2 => Ok(Some(Box::new(OrcEncoder::with_config(*options, config)?))),
		ColumnEncodingKind::DirectDelta => Ok(Some(Box::new(DeltaEncoder::with_config(*options, config)?))),
		ColumnEncodingKind::DefEncoded => Err(error!(encoding::default_encoding_kind())),
		ColumnEncodingKind::NoEncoded | ColumnEncodingKind::CompressZstd | ColumnEncodingKind::CompressZlib => {
			Ok(None)
		}
	}
}

/// Creates the decoder for `options.kind`, see [`create_encoder`].
pub fn create_decoder<'a, T: Integer>(options: &DecodingOptions) -> Result<Option<Box<dyn Decoder<'a, T> + 'a>>> {
	match options.kind {
		ColumnEncodingKind::RleV2 => Ok(Some(Box::new(OrcDecoder::<T>::new(*options)))),
		ColumnEncodingKind::DirectDelta => Ok(Some(Box::new(DeltaDecoder::<T>::new(*options)))),
		ColumnEncodingKind::DefEncoded => Err(error!(encoding::default_encoding_kind())),
		ColumnEncodingKind::NoEncoded | ColumnEncodingKind::CompressZstd | ColumnEncodingKind::CompressZlib => {
			Ok(None)
		}
	}
}

#[cfg(test)]
mod tests {
	use pax_type::ErrorKind;

	use super::*;

	#[test]
	fn test_create_encoder() {
		let config = BufferConfig::default();
		for kind in [ColumnEncodingKind::RleV2, ColumnEncodingKind::DirectDelta] {
			assert!(create_encoder(&EncodingOptions::new(kind, true), &config).unwrap().is_some());
		}
		for kind in
			[ColumnEncodingKind::NoEncoded, ColumnEncodingKind::CompressZstd, ColumnEncodingKind::CompressZlib]
		{
			assert!(create_encoder(&EncodingOptions::new(kind, true), &config).unwrap().is_none());
		}
	}

	#[test]
	fn test_default_encoding_is_logic_error() {
		let err = create_encoder(&EncodingOptions::default(), &BufferConfig::default()).err().unwrap();
		assert_eq!(err.code, "ENCODING_001");
		assert_eq!(err.kind(), ErrorKind::LogicError);

		let err = create_decoder::<i64>(&DecodingOptions::default()).err().unwrap();
		assert_eq!(err.kind(), ErrorKind::LogicError);
	}

	#[test]
	fn test_codec_pairs() {
		let values: Vec<i64> = (0..700).map(|i| (i * 37) % 101 - 50).collect();

		for kind in [ColumnEncodingKind::RleV2, ColumnEncodingKind::DirectDelta] {
			let mut encoder =
				create_encoder(&EncodingOptions::new(kind, true), &BufferConfig::default()).unwrap().unwrap();
			for value in &values {
				encoder.append(*value).unwrap();
			}
			encoder.flush().unwrap();
			let bytes = encoder.take_buffer();
			assert_eq!(encoder.buffer_size(), 0);

			let mut decoder = create_decoder::<i32>(&DecodingOptions::new(kind, true)).unwrap().unwrap();
			decoder.set_src_buffer(Some(bytes.as_slice()));
			decoder.set_data_buffer(DataBuffer::with_capacity(values.len()).unwrap());
			assert_eq!(decoder.decoding().unwrap(), values.len() * 4);
			assert!(decoder.buffer().iter().zip(&values).all(|(a, b)| *a as i64 == *b), "{kind}");
		}
	}

	#[test]
	fn test_copy_run_skips_nulls() {
		let mut dst = DataBuffer::<i64>::with_capacity(6).unwrap();
		let not_null = Bitmap8::from_bools(&[true, false, false, true, false, true]);

		assert_eq!(copy_run(&mut dst, &[1, 2, 3], Some(&not_null)).unwrap(), 6);
		assert_eq!(dst.region(), &[1, 0, 0, 2, 0, 3]);
	}

	#[test]
	fn test_copy_run_past_bitmap() {
		let mut dst = DataBuffer::<i64>::with_capacity(8).unwrap();
		let not_null = Bitmap8::from_bools(&[true, false, true]);
		assert!(copy_run(&mut dst, &[1, 2, 3], Some(&not_null)).is_err());
	}

	#[test]
	fn test_skip_nulls() {
		let mut dst = DataBuffer::<i16>::with_capacity(5).unwrap();
		let not_null = Bitmap8::from_bools(&[false, false, true, false, false]);

		skip_nulls(&mut dst, &not_null, 5).unwrap();
		assert_eq!(dst.used(), 2);

		dst.brush(1);
		skip_nulls(&mut dst, &not_null, 5).unwrap();
		assert_eq!(dst.used(), 5);
	}
}
