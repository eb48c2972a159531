// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::ops::Index;

use bytemuck::Pod;
use pax_type::Result;

use super::DataBuffer;
use crate::config::BufferConfig;

/// Write side staging buffer.
///
/// The used part splits into `[0, untreated)`, values ready to be encoded, and
/// `[untreated, used)`, values held back for the next run. `treated_all` drops the
/// untreated part and moves the held back values to the front.
#[derive(Debug, Clone)]
pub struct UntreatedBuffer<T: Pod> {
	buffer: DataBuffer<T>,
	untreated: usize,
}

impl<T: Pod> UntreatedBuffer<T> {
	pub fn with_capacity(capacity: usize) -> Result<Self> {
		Ok(Self {
			buffer: DataBuffer::with_capacity(capacity)?,
			untreated: 0,
		})
	}

	pub fn with_config(config: &BufferConfig) -> Result<Self> {
		Ok(Self {
			buffer: DataBuffer::with_config(config)?,
			untreated: 0,
		})
	}

	#[inline]
	pub fn used(&self) -> usize {
		self.buffer.used()
	}

	#[inline]
	pub fn untreated(&self) -> usize {
		self.untreated
	}

	#[inline]
	pub fn untouched(&self) -> usize {
		self.buffer.used() - self.untreated
	}

	#[inline]
	pub fn capacity(&self) -> usize {
		self.buffer.capacity()
	}

	#[inline]
	pub fn available(&self) -> usize {
		self.buffer.available()
	}

	pub fn write(&mut self, src: &[T]) {
		self.buffer.write(src);
	}

	pub fn write_value(&mut self, value: T) {
		self.buffer.write_value(value);
	}

	pub fn brush(&mut self, len: usize) {
		self.buffer.brush(len);
	}

	pub fn brush_back(&mut self, len: usize) {
		debug_assert!(self.buffer.used() - len >= self.untreated);
		self.buffer.brush_back(len);
	}

	pub fn brush_untreated(&mut self, len: usize) {
		debug_assert!(self.untreated + len <= self.buffer.used());
		self.untreated += len;
	}

	pub fn brush_back_untreated(&mut self, len: usize) {
		debug_assert!(len <= self.untreated);
		self.untreated -= len;
	}

	pub fn brush_untreated_all(&mut self) {
		self.untreated = self.buffer.used();
	}

	/// Appends a value to the untreated part, growing when full.
	pub fn push(&mut self, value: T) -> Result<()> {
		self.buffer.push(value)?;
		self.untreated += 1;
		Ok(())
	}

	/// Discards the untreated part and compacts the untouched values to offset 0.
	pub fn treated_all(&mut self) {
		let used = self.buffer.used();
		let untreated = self.untreated;
		let untouched = used - untreated;

		if untouched > 0 && untreated > 0 {
			self.buffer.region_mut().copy_within(untreated..used, 0);
		}

		self.buffer.brush_back(untreated);
		self.untreated = 0;
	}

	pub fn reserve(&mut self, additional: usize) -> Result<()> {
		self.buffer.reserve(additional)
	}

	pub fn resize(&mut self, capacity: usize) -> Result<()> {
		self.buffer.resize(capacity)?;
		self.untreated = self.untreated.min(self.buffer.used());
		Ok(())
	}

	pub fn clear(&mut self) {
		self.buffer.clear();
		self.untreated = 0;
	}

	pub fn as_slice(&self) -> &[T] {
		self.buffer.as_slice()
	}

	pub fn untreated_slice(&self) -> &[T] {
		&self.buffer.as_slice()[..self.untreated]
	}

	pub fn untouched_slice(&self) -> &[T] {
		&self.buffer.as_slice()[self.untreated..]
	}
}

impl<T: Pod> Index<usize> for UntreatedBuffer<T> {
	type Output = T;

	fn index(&self, index: usize) -> &T {
		&self.buffer.as_slice()[index]
	}
}
