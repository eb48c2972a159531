// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_core::{Bitmap8, DataBuffer, DecodingOptions, TreatedBuffer};
use pax_type::{Result, diagnostic::encoding, error, return_error};

use super::DELTA_BLOCK_SIZE;
use crate::{
	Decoder, Integer,
	codec::{copy_run, skip_nulls},
	io::{read_longs, read_signed_varint, read_unsigned_varint},
};

/// Decodes a delta encoded stream into a buffer of `T`, one block per
/// [`next`](Decoder::next).
pub struct DeltaDecoder<'a, T: Integer> {
	options: DecodingOptions,
	src: Option<TreatedBuffer<'a>>,
	result: Option<DataBuffer<T>>,
	literals: Vec<i64>,
}

impl<T: Integer> DeltaDecoder<'_, T> {
	pub fn new(options: DecodingOptions) -> Self {
		Self {
			options,
			src: None,
			result: None,
			literals: Vec::with_capacity(DELTA_BLOCK_SIZE),
		}
	}

	pub fn options(&self) -> &DecodingOptions {
		&self.options
	}
}

impl<'a, T: Integer> Decoder<'a, T> for DeltaDecoder<'a, T> {
	fn set_src_buffer(&mut self, src: Option<&'a [u8]>) {
		self.src = src.map(TreatedBuffer::new);
	}

	fn set_data_buffer(&mut self, buffer: DataBuffer<T>) {
		self.result = Some(buffer);
	}

	fn data_buffer(&self) -> Option<&DataBuffer<T>> {
		self.result.as_ref()
	}

	fn data_buffer_mut(&mut self) -> Option<&mut DataBuffer<T>> {
		self.result.as_mut()
	}

	fn take_data_buffer(&mut self) -> Option<DataBuffer<T>> {
		self.result.take()
	}

	fn next(&mut self, not_null: Option<&Bitmap8>) -> Result<usize> {
		let result = self.result.as_mut().ok_or_else(|| error!(encoding::missing_data_buffer()))?;

		let Some(src) = self.src.as_mut() else {
			return Ok(result.used() * T::WIDTH);
		};
		if src.is_exhausted() {
			return Ok(result.used() * T::WIDTH);
		}

		if let Some(bitmap) = not_null {
			skip_nulls(result, bitmap, bitmap.len())?;
		}

		read_block(src, self.options.is_sign, &mut self.literals)?;

		let filled = copy_run(result, &self.literals, not_null)?;
		result.brush(filled);

		Ok(result.used() * T::WIDTH)
	}
}

fn read_block(src: &mut TreatedBuffer<'_>, is_sign: bool, literals: &mut Vec<i64>) -> Result<()> {
	let len = read_unsigned_varint(src)? as usize;
	if len == 0 || len > DELTA_BLOCK_SIZE {
		return_error!(encoding::invalid_run_length(len));
	}

	let first = if is_sign {
		read_signed_varint(src)?
	} else {
		read_unsigned_varint(src)? as i64
	};

	literals.clear();
	literals.resize(len, 0);
	literals[0] = first;
	if len == 1 {
		return Ok(());
	}

	let min = read_signed_varint(src)?;
	let width = src.read_u8()? as u32;
	if width > 64 {
		return_error!(encoding::invalid_bit_width(width));
	}
	if width > 0 {
		read_longs(src, &mut literals[1..], width)?;
	}

	let mut prev = first;
	for slot in literals[1..].iter_mut() {
		prev = prev.wrapping_add(slot.wrapping_add(min));
		*slot = prev;
	}
	Ok(())
}
