// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_core::{BufferConfig, DataBuffer, EncodingOptions};
use pax_type::{Result, diagnostic::encoding, return_error};
use tracing::{instrument, trace};

use super::DELTA_BLOCK_SIZE;
use crate::{
	Encoder,
	io::{write_longs, write_signed_varint, write_unsigned_varint},
};

/// Block wise delta encoder.
///
/// Values are staged until a block is full, [`flush`](Encoder::flush) writes the
/// partial block and closes the encoder.
pub struct DeltaEncoder {
	options: EncodingOptions,
	block: DataBuffer<i64>,
	result: DataBuffer<u8>,
	deltas: Vec<i64>,
	finished: bool,
}

impl DeltaEncoder {
	pub fn new(options: EncodingOptions) -> Result<Self> {
		Self::with_config(options, &BufferConfig::default())
	}

	pub fn with_config(options: EncodingOptions, config: &BufferConfig) -> Result<Self> {
		Ok(Self {
			options,
			block: DataBuffer::with_capacity(DELTA_BLOCK_SIZE)?,
			result: DataBuffer::with_config(config)?,
			deltas: Vec::with_capacity(DELTA_BLOCK_SIZE),
			finished: false,
		})
	}

	pub fn options(&self) -> &EncodingOptions {
		&self.options
	}

	pub fn into_buffer(self) -> DataBuffer<u8> {
		self.result
	}

	fn write_block(&mut self) -> Result<()> {
		let values = self.block.as_slice();
		let Some(&first) = values.first() else {
			return Ok(());
		};

		write_unsigned_varint(&mut self.result, values.len() as u64)?;
		if self.options.is_sign {
			write_signed_varint(&mut self.result, first)?;
		} else {
			write_unsigned_varint(&mut self.result, first as u64)?;
		}

		if values.len() > 1 {
			self.deltas.clear();
			self.deltas.extend(values.windows(2).map(|pair| pair[1].wrapping_sub(pair[0])));

			let min = self.deltas.iter().copied().min().unwrap_or(0);
			let mut bits = 0u64;
			for delta in self.deltas.iter_mut() {
				*delta = delta.wrapping_sub(min);
				bits |= *delta as u64;
			}
			let width = 64 - bits.leading_zeros();

			write_signed_varint(&mut self.result, min)?;
			self.result.push(width as u8)?;
			write_longs(&mut self.result, &self.deltas, width)?;
		}

		trace!(len = values.len(), "wrote delta block");
		self.block.clear();
		Ok(())
	}
}

impl Encoder for DeltaEncoder {
	fn append(&mut self, value: i64) -> Result<()> {
		if self.finished {
			return_error!(encoding::encoder_finished());
		}

		self.block.push(value)?;
		if self.block.used() == DELTA_BLOCK_SIZE {
			self.write_block()?;
		}
		Ok(())
	}

	#[instrument(name = "encoding::delta::flush", level = "trace", skip(self))]
	fn flush(&mut self) -> Result<()> {
		if self.finished {
			return Ok(());
		}

		self.write_block()?;
		self.finished = true;
		Ok(())
	}

	fn buffer(&self) -> &[u8] {
		self.result.as_slice()
	}

	fn set_data_buffer(&mut self, buffer: DataBuffer<u8>) {
		self.result = buffer;
	}

	fn take_buffer(&mut self) -> DataBuffer<u8> {
		std::mem::replace(&mut self.result, DataBuffer::from_vec(Vec::new()))
	}
}

#[cfg(test)]
mod tests {
	use pax_core::ColumnEncodingKind;
	use pax_type::ErrorKind;

	use super::*;

	fn encode(values: &[i64], is_sign: bool) -> Vec<u8> {
		let mut encoder = DeltaEncoder::new(EncodingOptions::new(ColumnEncodingKind::DirectDelta, is_sign)).unwrap();
		for value in values {
			encoder.append(*value).unwrap();
		}
		encoder.flush().unwrap();
		encoder.buffer().to_vec()
	}

	#[test]
	fn test_constant_step() {
		assert_eq!(encode(&[1, 2, 3, 4], true), vec![0x04, 0x02, 0x02, 0x00]);
	}

	#[test]
	fn test_packed_deltas() {
		// deltas -3 and 5, packed as 0 and 8 over 4 bits
		assert_eq!(encode(&[10, 7, 12], false), vec![0x03, 0x0a, 0x05, 0x04, 0x08]);
	}

	#[test]
	fn test_single_value() {
		assert_eq!(encode(&[-1], true), vec![0x01, 0x01]);
		assert_eq!(encode(&[300], false), vec![0x01, 0xac, 0x02]);
	}

	#[test]
	fn test_empty() {
		assert!(encode(&[], true).is_empty());
	}

	#[test]
	fn test_blocks() {
		let values: Vec<i64> = (0..300).collect();
		let bytes = encode(&values, true);

		// three blocks of a constant step, 128 + 128 + 44 values
		assert_eq!(bytes.len(), 5 + 6 + 5);
		assert_eq!(&bytes[..5], &[0x80, 0x01, 0x00, 0x02, 0x00]);
		assert_eq!(&bytes[5..11], &[0x80, 0x01, 0x80, 0x02, 0x02, 0x00]);
		assert_eq!(&bytes[11..], &[0x2c, 0x80, 0x04, 0x02, 0x00]);
	}

	#[test]
	fn test_flush_idempotent() {
		let mut encoder = DeltaEncoder::new(EncodingOptions::new(ColumnEncodingKind::DirectDelta, true)).unwrap();
		encoder.append(5).unwrap();
		encoder.flush().unwrap();
		let size = encoder.buffer_size();
		encoder.flush().unwrap();
		assert_eq!(encoder.buffer_size(), size);

		let err = encoder.append(6).unwrap_err();
		assert_eq!(err.code, "ENCODING_006");
		assert_eq!(err.kind(), ErrorKind::LogicError);
	}
}
