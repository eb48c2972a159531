// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Byte and bit level readers and writers for encoded streams.
//!
//! Bit packed values are written most significant bit first. Every `write_longs`
//! call starts on a fresh byte and flushes its trailing partial byte, every
//! `read_longs` call starts on a fresh byte as well.

use pax_core::{DataBuffer, TreatedBuffer};
use pax_type::{Result, diagnostic::encoding, return_error};

use crate::bitpacking::{unzigzag, zigzag};

#[inline]
fn mask(bits: u32) -> u64 {
	if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}

/// Base 128 varint, least significant group first.
pub fn write_unsigned_varint(out: &mut DataBuffer<u8>, mut value: u64) -> Result<()> {
	out.reserve(10)?;
	loop {
		if value & !0x7f == 0 {
			out.write_value(value as u8);
			out.brush(1);
			return Ok(());
		}
		out.write_value(0x80 | (value & 0x7f) as u8);
		out.brush(1);
		value >>= 7;
	}
}

pub fn write_signed_varint(out: &mut DataBuffer<u8>, value: i64) -> Result<()> {
	write_unsigned_varint(out, zigzag(value) as u64)
}

pub fn read_unsigned_varint(src: &mut TreatedBuffer<'_>) -> Result<u64> {
	let mut result = 0u64;
	let mut offset = 0u32;
	loop {
		if offset >= 64 {
			return_error!(encoding::varint_overflow());
		}
		let byte = src.read_u8()?;
		result |= ((byte & 0x7f) as u64) << offset;
		offset += 7;
		if byte < 0x80 {
			return Ok(result);
		}
	}
}

pub fn read_signed_varint(src: &mut TreatedBuffer<'_>) -> Result<i64> {
	Ok(unzigzag(read_unsigned_varint(src)?))
}

/// Writes the low `bytes` bytes of `value`, most significant first.
pub fn write_long_be(out: &mut DataBuffer<u8>, value: u64, bytes: usize) -> Result<()> {
	debug_assert!(bytes <= 8);
	out.reserve(bytes)?;
	for i in (0..bytes).rev() {
		out.write_value((value >> (i * 8)) as u8);
		out.brush(1);
	}
	Ok(())
}

pub fn read_long_be(src: &mut TreatedBuffer<'_>, bytes: usize) -> Result<u64> {
	debug_assert!(bytes <= 8);
	let mut result = 0u64;
	for &byte in src.read_bytes(bytes)? {
		result = (result << 8) | byte as u64;
	}
	Ok(result)
}

/// Bit packs the low `bits` bits of every value.
pub fn write_longs(out: &mut DataBuffer<u8>, input: &[i64], bits: u32) -> Result<()> {
	if input.is_empty() || bits < 1 {
		return Ok(());
	}

	out.reserve((input.len() * bits as usize).div_ceil(8))?;

	let mut current = 0u8;
	let mut bits_left = 8u32;
	for &value in input {
		let value = value as u64 & mask(bits);
		let mut remaining = bits;

		while remaining > 0 {
			let take = remaining.min(bits_left);
			let chunk = ((value >> (remaining - take)) & mask(take)) as u8;
			bits_left -= take;
			current |= chunk << bits_left;
			remaining -= take;

			if bits_left == 0 {
				out.write_value(current);
				out.brush(1);
				current = 0;
				bits_left = 8;
			}
		}
	}

	if bits_left != 8 {
		out.write_value(current);
		out.brush(1);
	}

	Ok(())
}

/// Unpacks `out.len()` values of `bits` bits each.
pub fn read_longs(src: &mut TreatedBuffer<'_>, out: &mut [i64], bits: u32) -> Result<()> {
	if out.is_empty() {
		return Ok(());
	}
	if bits == 0 || bits > 64 {
		return_error!(encoding::invalid_bit_width(bits));
	}

	let bytes = src.read_bytes((out.len() * bits as usize).div_ceil(8))?;

	let mut position = 0usize;
	for slot in out.iter_mut() {
		let mut result = 0u64;
		let mut remaining = bits;

		while remaining > 0 {
			let offset = (position & 7) as u32;
			let available = 8 - offset;
			let take = remaining.min(available);
			let chunk = (bytes[position >> 3] as u64 >> (available - take)) & mask(take);

			result = (result << take) | chunk;
			remaining -= take;
			position += take as usize;
		}

		*slot = result as i64;
	}

	Ok(())
}
