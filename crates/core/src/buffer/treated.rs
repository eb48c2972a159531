// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_type::{Result, diagnostic::encoding, return_error};

/// Read side view over caller supplied bytes.
///
/// `[0, treated)` has been parsed, `[treated, used)` is still pending.
#[derive(Debug, Clone, Copy)]
pub struct TreatedBuffer<'a> {
	data: &'a [u8],
	treated: usize,
}

impl<'a> TreatedBuffer<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		Self {
			data,
			treated: 0,
		}
	}

	#[inline]
	pub fn used(&self) -> usize {
		self.data.len()
	}

	#[inline]
	pub fn treated(&self) -> usize {
		self.treated
	}

	#[inline]
	pub fn untreated(&self) -> usize {
		self.data.len() - self.treated
	}

	#[inline]
	pub fn is_exhausted(&self) -> bool {
		self.treated >= self.data.len()
	}

	pub fn brush_treated(&mut self, len: usize) {
		debug_assert!(self.treated + len <= self.data.len());
		self.treated += len;
	}

	pub fn brush_treated_all(&mut self) {
		self.treated = self.data.len();
	}

	/// The bytes not parsed yet.
	pub fn remaining(&self) -> &'a [u8] {
		&self.data[self.treated..]
	}

	/// Consumes one byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		let Some(&byte) = self.data.get(self.treated) else {
			return_error!(encoding::truncated_stream(1, 0));
		};
		self.treated += 1;
		Ok(byte)
	}

	/// Consumes `len` bytes.
	pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
		let available = self.untreated();
		if len > available {
			return_error!(encoding::truncated_stream(len, available));
		}

		let start = self.treated;
		self.treated += len;
		Ok(&self.data[start..start + len])
	}
}
