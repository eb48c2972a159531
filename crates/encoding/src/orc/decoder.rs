// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_core::{Bitmap8, DataBuffer, DecodingOptions, TreatedBuffer};
use pax_type::{Result, diagnostic::encoding, error, return_error};

use super::EncodingType;
use crate::{
	Decoder, Integer,
	bitpacking::{ORC_MAX_LITERAL_SIZE, ORC_MIN_REPEAT, closest_fixed_bits, decode_bits, unzigzag},
	codec::{copy_run, skip_nulls},
	io::{read_long_be, read_longs, read_signed_varint, read_unsigned_varint},
};

/// Decodes an ORC run length encoded stream into a buffer of `T`.
///
/// Runs are decoded through an `i64` scratch and narrowed on copy. With a not
/// null bitmap, values land only on rows whose bit is set, null rows are skipped
/// and left untouched in the destination.
pub struct OrcDecoder<'a, T: Integer> {
	options: DecodingOptions,
	src: Option<TreatedBuffer<'a>>,
	result: Option<DataBuffer<T>>,
	literals: Vec<i64>,
	patches: Vec<i64>,
}

impl<T: Integer> OrcDecoder<'_, T> {
	pub fn new(options: DecodingOptions) -> Self {
		Self {
			options,
			src: None,
			result: None,
			literals: Vec::with_capacity(ORC_MAX_LITERAL_SIZE),
			patches: Vec::new(),
		}
	}

	pub fn options(&self) -> &DecodingOptions {
		&self.options
	}
}

impl<'a, T: Integer> Decoder<'a, T> for OrcDecoder<'a, T> {
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
		let Some(&header) = src.remaining().first() else {
			return Ok(result.used() * T::WIDTH);
		};

		if let Some(bitmap) = not_null {
			skip_nulls(result, bitmap, bitmap.len())?;
		}

		let is_sign = self.options.is_sign;
		match EncodingType::from_header(header) {
			EncodingType::ShortRepeat => read_short_repeat(src, is_sign, &mut self.literals)?,
			EncodingType::Direct => read_direct(src, is_sign, &mut self.literals)?,
			EncodingType::PatchedBase => read_patched_base(src, &mut self.literals, &mut self.patches)?,
			EncodingType::Delta => read_delta(src, is_sign, &mut self.literals)?,
		}

		let filled = copy_run(result, &self.literals, not_null)?;
		result.brush(filled);

		Ok(result.used() * T::WIDTH)
	}
}

#[inline]
fn read_run_length(src: &mut TreatedBuffer<'_>, first: u8) -> Result<usize> {
	Ok(((((first & 0x01) as usize) << 8) | src.read_u8()? as usize) + 1)
}

fn read_short_repeat(src: &mut TreatedBuffer<'_>, is_sign: bool, literals: &mut Vec<i64>) -> Result<()> {
	let first = src.read_u8()?;
	let bytes = (((first >> 3) & 0x07) + 1) as usize;
	let len = (first & 0x07) as usize + ORC_MIN_REPEAT;

	let raw = read_long_be(src, bytes)?;
	let value = if is_sign { unzigzag(raw) } else { raw as i64 };

	literals.clear();
	literals.resize(len, value);
	Ok(())
}

fn read_direct(src: &mut TreatedBuffer<'_>, is_sign: bool, literals: &mut Vec<i64>) -> Result<()> {
	let first = src.read_u8()?;
	let bits = decode_bits(((first >> 1) & 0x1f) as u32);
	let len = read_run_length(src, first)?;

	literals.clear();
	literals.resize(len, 0);
	read_longs(src, literals, bits)?;

	if is_sign {
		for value in literals.iter_mut() {
			*value = unzigzag(*value as u64);
		}
	}
	Ok(())
}

fn read_delta(src: &mut TreatedBuffer<'_>, is_sign: bool, literals: &mut Vec<i64>) -> Result<()> {
	let first = src.read_u8()?;
	let width_tag = ((first >> 1) & 0x1f) as u32;
	let bits = if width_tag == 0 { 0 } else { decode_bits(width_tag) };
	let len = read_run_length(src, first)?;

	let base = if is_sign {
		read_signed_varint(src)?
	} else {
		read_unsigned_varint(src)? as i64
	};
	let delta_base = read_signed_varint(src)?;

	literals.clear();
	literals.resize(len, 0);
	literals[0] = base;

	if bits == 0 {
		for i in 1..len {
			literals[i] = literals[i - 1].wrapping_add(delta_base);
		}
		return Ok(());
	}

	if len < 2 {
		return_error!(encoding::invalid_run_length(len));
	}

	literals[1] = base.wrapping_add(delta_base);
	read_longs(src, &mut literals[2..], bits)?;

	// packed deltas are magnitudes, the sign of the first delta gives the direction
	for i in 2..len {
		literals[i] = if delta_base < 0 {
			literals[i - 1].wrapping_sub(literals[i])
		} else {
			literals[i - 1].wrapping_add(literals[i])
		};
	}
	Ok(())
}

fn read_patched_base(src: &mut TreatedBuffer<'_>, literals: &mut Vec<i64>, patches: &mut Vec<i64>) -> Result<()> {
	let first = src.read_u8()?;
	let bits = decode_bits(((first >> 1) & 0x1f) as u32);
	let len = read_run_length(src, first)?;

	let third = src.read_u8()?;
	let base_bytes = (((third >> 5) & 0x07) + 1) as usize;
	let patch_bits = decode_bits((third & 0x1f) as u32);

	let fourth = src.read_u8()?;
	let gap_bits = (((fourth >> 5) & 0x07) + 1) as u32;
	let patch_len = (fourth & 0x1f) as usize;
	if patch_len == 0 {
		return_error!(encoding::invalid_patch_length());
	}

	let raw_base = read_long_be(src, base_bytes)?;
	let sign_bit = 1u64 << (base_bytes * 8 - 1);
	let base = if raw_base & sign_bit != 0 {
		((raw_base & !sign_bit) as i64).wrapping_neg()
	} else {
		raw_base as i64
	};

	literals.clear();
	literals.resize(len, 0);
	read_longs(src, literals, bits)?;

	if patch_bits + gap_bits > 64 {
		return_error!(encoding::patch_width_overflow(patch_bits, gap_bits));
	}

	patches.clear();
	patches.resize(patch_len, 0);
	read_longs(src, patches, closest_fixed_bits(patch_bits + gap_bits))?;

	let patch_mask = if patch_bits >= 64 { -1i64 } else { (1i64 << patch_bits) - 1 };
	let mut patch_idx = 0;
	let (mut gap, mut patch) = next_patch(patches, patch_bits, patch_mask, &mut patch_idx)?;

	for (i, literal) in literals.iter_mut().enumerate() {
		if i as i64 != gap {
			*literal = literal.wrapping_add(base);
			continue;
		}

		let patched = *literal | ((patch as u64).checked_shl(bits).unwrap_or(0) as i64);
		*literal = base.wrapping_add(patched);

		patch_idx += 1;
		if patch_idx < patch_len {
			let (next_gap, next) = next_patch(patches, patch_bits, patch_mask, &mut patch_idx)?;
			gap = next_gap + i as i64;
			patch = next;
		}
	}
	Ok(())
}

/// Reads the gap and patch at `idx`, folding in 255 step gap extensions.
fn next_patch(patches: &[i64], patch_bits: u32, patch_mask: i64, idx: &mut usize) -> Result<(i64, i64)> {
	let split = |entry: i64| {
		let gap = (entry as u64).checked_shr(patch_bits).unwrap_or(0) as i64;
		(gap, entry & patch_mask)
	};

	let mut gap_total = 0i64;
	let (mut gap, mut patch) = split(patches[*idx]);
	while gap == 255 && patch == 0 {
		gap_total += 255;
		*idx += 1;
		let Some(entry) = patches.get(*idx) else {
			return_error!(encoding::patch_list_overrun(patches.len()));
		};
		(gap, patch) = split(*entry);
	}

	Ok((gap_total + gap, patch))
}

#[cfg(test)]
mod tests {
	use pax_core::{ColumnEncodingKind, EncodingOptions};
	use rand::random;

	use super::*;
	use crate::{Encoder, OrcEncoder};

	fn encode(values: &[i64], is_sign: bool) -> Vec<u8> {
		let mut encoder = OrcEncoder::new(EncodingOptions::new(ColumnEncodingKind::RleV2, is_sign)).unwrap();
		for value in values {
			encoder.append(*value).unwrap();
		}
		encoder.flush().unwrap();
		encoder.buffer().to_vec()
	}

	fn decode<T: Integer>(bytes: &[u8], is_sign: bool, capacity: usize) -> Vec<T> {
		let mut decoder = OrcDecoder::<T>::new(DecodingOptions::new(ColumnEncodingKind::RleV2, is_sign));
		decoder.set_src_buffer(Some(bytes));
		decoder.set_data_buffer(DataBuffer::with_capacity(capacity).unwrap());
		let size = decoder.decoding().unwrap();
		assert_eq!(size % T::WIDTH, 0);
		decoder.buffer().to_vec()
	}

	fn decode_err(bytes: Option<&[u8]>, capacity: usize) -> pax_type::Error {
		let mut decoder = OrcDecoder::<i64>::new(DecodingOptions::default());
		decoder.set_src_buffer(bytes);
		decoder.set_data_buffer(DataBuffer::with_capacity(capacity).unwrap());
		decoder.decoding().unwrap_err()
	}

	fn roundtrip(values: &[i64], is_sign: bool) {
		let bytes = encode(values, is_sign);
		assert_eq!(decode::<i64>(&bytes, is_sign, values.len()), values);
	}

	#[test]
	fn test_short_repeat() {
		let bytes = encode(&[-2; 10], true);
		assert_eq!(bytes, vec![0x07, 0x03]);

		assert_eq!(decode::<i8>(&bytes, true, 10), vec![-2i8; 10]);
		assert_eq!(decode::<i16>(&bytes, true, 10), vec![-2i16; 10]);
		assert_eq!(decode::<i32>(&bytes, true, 10), vec![-2i32; 10]);
		assert_eq!(decode::<i64>(&bytes, true, 10), vec![-2i64; 10]);
	}

	#[test]
	fn test_direct() {
		let bytes = [0x5e, 0x03, 0x5c, 0xa1, 0xab, 0x1e, 0xde, 0xad, 0xbe, 0xef];
		assert_eq!(decode::<i64>(&bytes, false, 4), vec![23713, 43806, 57005, 48879]);
	}

	#[test]
	fn test_delta() {
		let bytes = [0xc6, 0x09, 0x02, 0x02, 0x22, 0x42, 0x42, 0x46];
		assert_eq!(decode::<i32>(&bytes, false, 10), vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
	}

	#[test]
	fn test_patched_base() {
		let bytes = [
			0x8e, 0x13, 0x2b, 0x21, 0x07, 0xd0, 0x1e, 0x00, 0x14, 0x70, 0x28, 0x32, 0x3c, 0x46, 0x50, 0x5a, 0x64,
			0x6e, 0x78, 0x82, 0x8c, 0x96, 0xa0, 0xaa, 0xb4, 0xbe, 0xfc, 0xe8,
		];
		let mut expected = vec![2030, 2000, 2020, 1_000_000];
		expected.extend((2040..=2190).step_by(10));
		assert_eq!(decode::<i64>(&bytes, false, 20), expected);
	}

	#[test]
	fn test_leading_nulls() {
		let bytes = encode(&[2; 20], true);

		let mut not_null = Bitmap8::repeat(true, 20);
		for i in 0..5 {
			not_null.clear(i);
		}

		let mut decoder = OrcDecoder::<i32>::new(DecodingOptions::new(ColumnEncodingKind::RleV2, true));
		decoder.set_src_buffer(Some(&bytes[..]));
		decoder.set_data_buffer(DataBuffer::with_capacity(20).unwrap());

		// 15 values across 20 rows
		let bytes_15 = encode(&[2; 15], true);
		let mut decoder_15 = OrcDecoder::<i32>::new(DecodingOptions::new(ColumnEncodingKind::RleV2, true));
		decoder_15.set_src_buffer(Some(&bytes_15[..]));
		decoder_15.set_data_buffer(DataBuffer::with_capacity(20).unwrap());
		let size = decoder_15.decoding_with_nulls(&not_null, 20).unwrap();
		assert_eq!(size, 20 * 4);
		assert_eq!(&decoder_15.buffer()[..5], &[0; 5]);
		assert_eq!(&decoder_15.buffer()[5..], &[2; 15]);

		// 20 values do not fit into 15 non null rows
		assert!(decoder.decoding_with_nulls(&not_null, 20).is_err());
	}

	#[test]
	fn test_scattered_nulls() {
		// rows [null, 5, null, null, 5]
		let bytes = encode(&[5, 5, 5], true);
		let not_null = Bitmap8::from_bools(&[false, true, false, false, true, true]);

		let mut decoder = OrcDecoder::<i64>::new(DecodingOptions::new(ColumnEncodingKind::RleV2, true));
		decoder.set_src_buffer(Some(&bytes[..]));
		decoder.set_data_buffer(DataBuffer::with_capacity(6).unwrap());
		assert_eq!(decoder.decoding_with_nulls(&not_null, 6).unwrap(), 6 * 8);
		assert_eq!(decoder.buffer(), &[0, 5, 0, 0, 5, 5]);
	}

	#[test]
	fn test_trailing_nulls() {
		let values: Vec<i64> = (0..30).map(|i| i * 3 - 40).collect();
		let bytes = encode(&values, true);

		let mut not_null = Bitmap8::repeat(true, 30);
		for _ in 0..10 {
			not_null.push(false);
		}

		let mut decoder = OrcDecoder::<i64>::new(DecodingOptions::new(ColumnEncodingKind::RleV2, true));
		decoder.set_src_buffer(Some(&bytes[..]));
		decoder.set_data_buffer(DataBuffer::with_capacity(40).unwrap());
		assert_eq!(decoder.decoding_with_nulls(&not_null, 40).unwrap(), 40 * 8);
		assert_eq!(&decoder.buffer()[..30], values.as_slice());
		assert_eq!(&decoder.buffer()[30..], &[0; 10]);
	}

	#[test]
	fn test_all_null() {
		let not_null = Bitmap8::repeat(false, 12);

		let mut decoder = OrcDecoder::<i16>::new(DecodingOptions::default());
		decoder.set_src_buffer(None);
		decoder.set_data_buffer(DataBuffer::with_capacity(12).unwrap());
		assert_eq!(decoder.decoding_with_nulls(&not_null, 12).unwrap(), 12 * 2);
		assert_eq!(decoder.buffer(), &[0; 12]);
	}

	#[test]
	fn test_next_steps_one_run() {
		let mut values = vec![7; 5];
		values.extend([1, 9, 4]);
		let bytes = encode(&values, true);

		let mut decoder = OrcDecoder::<i64>::new(DecodingOptions::new(ColumnEncodingKind::RleV2, true));
		decoder.set_src_buffer(Some(&bytes[..]));
		decoder.set_data_buffer(DataBuffer::with_capacity(8).unwrap());
		assert_eq!(decoder.next(None).unwrap(), 5 * 8);
		assert_eq!(decoder.next(None).unwrap(), 8 * 8);
		assert_eq!(decoder.next(None).unwrap(), 8 * 8);
	}

	#[test]
	fn test_destination_too_small() {
		let bytes = encode(&[1; 10], true);
		let mut decoder = OrcDecoder::<i64>::new(DecodingOptions::default());
		decoder.set_src_buffer(Some(&bytes[..]));
		decoder.set_data_buffer(DataBuffer::with_capacity(9).unwrap());

		let err = decoder.decoding().unwrap_err();
		assert_eq!(err.code, "ENCODING_005");
		assert_eq!(err.kind(), pax_type::ErrorKind::OutOfRange);
	}

	#[test]
	fn test_missing_destination() {
		let bytes = encode(&[1; 10], true);
		let mut decoder = OrcDecoder::<i64>::new(DecodingOptions::default());
		decoder.set_src_buffer(Some(&bytes[..]));
		assert_eq!(decoder.decoding().unwrap_err().code, "ENCODING_008");
	}

	#[test]
	fn test_zero_patch_length() {
		let bytes = [0x8e, 0x13, 0x2b, 0x20, 0x07, 0xd0];
		let err = decode_err(Some(&bytes[..]), 20);
		assert_eq!(err.code, "ENCODING_002");
		assert_eq!(err.kind(), pax_type::ErrorKind::InvalidFormat);
	}

	#[test]
	fn test_patch_width_overflow() {
		// 8 bit gaps next to 64 bit patches
		let mut bytes = vec![0x8e, 0x13, 0x1f, 0xe1, 0x07, 0xd0];
		bytes.extend([0u8; 30]);
		let err = decode_err(Some(&bytes[..]), 20);
		assert_eq!(err.code, "ENCODING_003");
	}

	#[test]
	fn test_truncated_stream() {
		let bytes = encode(&(0..100).map(|i| i * i).collect::<Vec<_>>(), false);
		let err = decode_err(Some(&bytes[..bytes.len() - 3]), 100);
		assert_eq!(err.kind(), pax_type::ErrorKind::InvalidFormat);
	}

	#[test]
	fn test_roundtrip_shapes() {
		roundtrip(&[0; 1000], true);
		roundtrip(&[-1; 1000], true);
		roundtrip(&(0..1000).collect::<Vec<_>>(), true);
		roundtrip(&(0..1000).rev().collect::<Vec<_>>(), true);
		roundtrip(&(0..1000).map(|i| -i * 17).collect::<Vec<_>>(), true);
		roundtrip(&(0..1000).map(|i| i * i).collect::<Vec<_>>(), false);
		roundtrip(&[i64::MIN, i64::MAX, 0, -1, 1, i64::MIN, i64::MIN], true);
		roundtrip(&[u32::MAX as i64, 0, 1 << 62, 3, 5], false);
	}

	#[test]
	fn test_roundtrip_arithmetic() {
		for step in [1i64, -1, 3, -1000, 1 << 40, -(1 << 40), i64::MAX / 20, i64::MIN / 20] {
			let values: Vec<i64> = (0..11).map(|i| 5i64.wrapping_add(step.wrapping_mul(i))).collect();
			let bytes = encode(&values, true);
			assert_eq!(bytes[0] >> 6, EncodingType::Delta as u8, "step {step}");
			assert_eq!(decode::<i64>(&bytes, true, values.len()), values, "step {step}");
		}
	}

	#[test]
	fn test_roundtrip_mixed_runs() {
		let mut values = Vec::new();
		for block in 0..40i64 {
			match block % 4 {
				0 => values.extend(std::iter::repeat_n(block, (block as usize % 9) + 3)),
				1 => values.extend((0..50).map(|i| block * 100 + i)),
				2 => values.extend((0..30).map(|i| (i * 7919 + block) % 257 - 128)),
				_ => {
					values.extend((0..40).map(|i| i % 5));
					values.push(1 << 45);
				}
			}
		}
		roundtrip(&values, true);
	}

	#[test]
	fn test_roundtrip_patched_gaps() {
		// outliers far apart force gaps above 255
		let mut values: Vec<i64> = (0..512).map(|i| i % 16).collect();
		values[3] = 1 << 30;
		values[300] = 1 << 31;
		values[511] = 1 << 29;
		let bytes = encode(&values, false);
		assert_eq!(bytes[0] >> 6, EncodingType::PatchedBase as u8);
		assert_eq!(decode::<i64>(&bytes, false, values.len()), values);

		let mut values: Vec<i64> = (0..512).map(|i| i % 16).collect();
		values[0] = 1 << 33;
		values[511] = 1 << 33;
		assert_eq!(decode::<i64>(&encode(&values, false), false, values.len()), values);
	}

	#[test]
	fn test_roundtrip_random() {
		for _ in 0..20 {
			let len = (random::<u32>() % 3000 + 1) as usize;
			let shift = random::<u32>() % 64;
			let values: Vec<i64> = (0..len).map(|_| random::<i64>() >> shift).collect();
			roundtrip(&values, true);

			let narrow: Vec<i64> = values.iter().map(|v| (*v as i16) as i64).collect();
			let bytes = encode(&narrow, true);
			let decoded = decode::<i16>(&bytes, true, narrow.len());
			assert_eq!(decoded.iter().map(|v| *v as i64).collect::<Vec<_>>(), narrow);
		}
	}
}
