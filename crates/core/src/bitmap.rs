// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};

/// Bitmap with one bit per row, least significant bit first.
///
/// A set bit marks a row that holds a value, a cleared bit marks a null row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap8 {
	bytes: Vec<u8>,
	len: usize,
}

impl Bitmap8 {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(bits: usize) -> Self {
		Self {
			bytes: Vec::with_capacity(bits.div_ceil(8)),
			len: 0,
		}
	}

	/// A bitmap of `len` bits, all set to `value`.
	pub fn repeat(value: bool, len: usize) -> Self {
		let mut bytes = vec![if value { 0xff } else { 0 }; len.div_ceil(8)];
		if value && len % 8 != 0 {
			if let Some(last) = bytes.last_mut() {
				*last = (1u8 << (len % 8)) - 1;
			}
		}
		Self {
			bytes,
			len,
		}
	}

	pub fn from_bools(values: &[bool]) -> Self {
		let mut bitmap = Self::with_capacity(values.len());
		for &value in values {
			bitmap.push(value);
		}
		bitmap
	}

	/// Rebuilds a bitmap from its serialized bytes.
	pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
		let mut bytes = bytes[..len.div_ceil(8).min(bytes.len())].to_vec();
		bytes.resize(len.div_ceil(8), 0);
		if len % 8 != 0 {
			if let Some(last) = bytes.last_mut() {
				*last &= (1u8 << (len % 8)) - 1;
			}
		}
		Self {
			bytes,
			len,
		}
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn push(&mut self, value: bool) {
		if self.len % 8 == 0 {
			self.bytes.push(0);
		}
		self.len += 1;
		if value {
			self.set(self.len - 1);
		}
	}

	#[inline]
	pub fn get(&self, index: usize) -> bool {
		debug_assert!(index < self.len);
		self.bytes[index >> 3] & (1 << (index & 7)) != 0
	}

	#[inline]
	pub fn set(&mut self, index: usize) {
		debug_assert!(index < self.len);
		self.bytes[index >> 3] |= 1 << (index & 7);
	}

	#[inline]
	pub fn clear(&mut self, index: usize) {
		debug_assert!(index < self.len);
		self.bytes[index >> 3] &= !(1 << (index & 7));
	}

	/// Number of set bits.
	pub fn count_ones(&self) -> usize {
		self.bytes.iter().map(|b| b.count_ones() as usize).sum()
	}

	/// Number of set bits in `[start, end)`.
	pub fn count_range(&self, start: usize, end: usize) -> usize {
		debug_assert!(start <= end && end <= self.len);
		if start >= end {
			return 0;
		}

		let first = start >> 3;
		let last = (end - 1) >> 3;
		let head_mask = 0xffu8 << (start & 7);
		let tail_mask = 0xffu8 >> (7 - ((end - 1) & 7));

		if first == last {
			return (self.bytes[first] & head_mask & tail_mask).count_ones() as usize;
		}

		let mut count = (self.bytes[first] & head_mask).count_ones() as usize;
		count += self.bytes[first + 1..last].iter().map(|b| b.count_ones() as usize).sum::<usize>();
		count + (self.bytes[last] & tail_mask).count_ones() as usize
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
		(0..self.len).map(move |i| self.get(i))
	}
}
