// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{fmt, mem::size_of, sync::Arc};

use bytemuck::Pod;
use pax_type::{Result, diagnostic::buffer, error, return_error};
use tracing::{debug, trace};

use crate::config::BufferConfig;

mod treated;
mod untreated;

pub use treated::TreatedBuffer;
pub use untreated::UntreatedBuffer;

/// Hard ceiling in bytes for any single buffer.
pub const MAX_BUFFER_CAPACITY: usize = 768 * 1024 * 1024;

/// Alignment of streams inside a vectorized column group.
pub const MEMORY_ALIGN_SIZE: usize = 8;

#[derive(Clone)]
enum Memory<T> {
	Owned(Vec<T>),
	Shared(Arc<[T]>),
}

impl<T> Memory<T> {
	fn as_slice(&self) -> &[T] {
		match self {
			Memory::Owned(vec) => vec.as_slice(),
			Memory::Shared(shared) => &shared[..],
		}
	}
}

/// A typed, growable region with a `used` cursor.
///
/// The region always spans `capacity` initialized elements. `write` places data at the
/// cursor without moving it, `brush` confirms written elements and `brush_back` retracts
/// them again. Only owned memory can change its capacity; writing into shared memory
/// detaches it into an owned copy first.
#[derive(Clone)]
pub struct DataBuffer<T: Pod> {
	memory: Memory<T>,
	used: usize,
	growth_factor: usize,
	limit: usize,
}

impl<T: Pod> DataBuffer<T> {
	pub fn with_capacity(capacity: usize) -> Result<Self> {
		Self::with_config(&BufferConfig::default().with_initial_capacity(capacity))
	}

	pub fn with_config(config: &BufferConfig) -> Result<Self> {
		let limit = config.effective_limit();
		let mut vec = Vec::new();
		allocate(&mut vec, config.initial_capacity, limit)?;

		Ok(Self {
			memory: Memory::Owned(vec),
			used: 0,
			growth_factor: config.growth_factor.max(2),
			limit,
		})
	}

	/// Takes ownership of pre-filled data, every element counts as used.
	pub fn from_vec(data: Vec<T>) -> Self {
		Self {
			used: data.len(),
			memory: Memory::Owned(data),
			growth_factor: 2,
			limit: MAX_BUFFER_CAPACITY,
		}
	}

	/// Wraps data owned elsewhere, every element counts as used.
	pub fn from_shared(data: Arc<[T]>) -> Self {
		Self {
			used: data.len(),
			memory: Memory::Shared(data),
			growth_factor: 2,
			limit: MAX_BUFFER_CAPACITY,
		}
	}

	pub fn is_owned(&self) -> bool {
		matches!(self.memory, Memory::Owned(_))
	}

	#[inline]
	pub fn capacity(&self) -> usize {
		self.memory.as_slice().len()
	}

	#[inline]
	pub fn used(&self) -> usize {
		self.used
	}

	#[inline]
	pub fn available(&self) -> usize {
		self.capacity() - self.used
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.used == 0
	}

	/// Copies `src` to `[used, used + src.len())`. The caller guarantees `available() >= src.len()`.
	#[inline]
	pub fn write(&mut self, src: &[T]) {
		let used = self.used;
		self.make_mut()[used..used + src.len()].copy_from_slice(src);
	}

	#[inline]
	pub fn write_value(&mut self, value: T) {
		let used = self.used;
		self.make_mut()[used] = value;
	}

	pub fn write_zero(&mut self, len: usize) {
		let used = self.used;
		self.make_mut()[used..used + len].fill(T::zeroed());
	}

	#[inline]
	pub fn brush(&mut self, len: usize) {
		debug_assert!(self.used + len <= self.capacity());
		self.used += len;
	}

	#[inline]
	pub fn brush_back(&mut self, len: usize) {
		debug_assert!(len <= self.used);
		self.used -= len;
	}

	pub fn brush_all(&mut self) {
		self.used = self.capacity();
	}

	pub fn brush_back_all(&mut self) {
		self.used = 0;
	}

	pub fn clear(&mut self) {
		self.used = 0;
	}

	/// Appends one element, growing the buffer when it is full.
	pub fn push(&mut self, value: T) -> Result<()> {
		self.reserve(1)?;
		self.write_value(value);
		self.brush(1);
		Ok(())
	}

	pub fn extend_from_slice(&mut self, src: &[T]) -> Result<()> {
		self.reserve(src.len())?;
		self.write(src);
		self.brush(src.len());
		Ok(())
	}

	/// Appends `len` zero elements.
	pub fn extend_zero(&mut self, len: usize) -> Result<()> {
		self.reserve(len)?;
		self.write_zero(len);
		self.brush(len);
		Ok(())
	}

	/// Ensures room for `additional` more elements, growing geometrically.
	pub fn reserve(&mut self, additional: usize) -> Result<()> {
		if self.available() >= additional {
			return Ok(());
		}

		let required = self.used.saturating_add(additional);
		let mut capacity = self.capacity().saturating_mul(self.growth_factor).max(required);

		let element_limit = self.limit / size_of::<T>().max(1);
		if capacity > element_limit && required <= element_limit {
			capacity = element_limit;
		}

		self.resize(capacity)
	}

	/// Reallocates owned memory to exactly `capacity` elements.
	pub fn resize(&mut self, capacity: usize) -> Result<()> {
		let limit = self.limit;
		let Memory::Owned(vec) = &mut self.memory else {
			return_error!(buffer::buffer_not_owned("resize"));
		};

		allocate(vec, capacity, limit)?;
		self.used = self.used.min(capacity);
		trace!(capacity, used = self.used, "resized buffer");
		Ok(())
	}

	/// The used part of the region.
	pub fn as_slice(&self) -> &[T] {
		&self.memory.as_slice()[..self.used]
	}

	pub fn as_mut_slice(&mut self) -> &mut [T] {
		let used = self.used;
		&mut self.make_mut()[..used]
	}

	/// The whole region, including elements past the cursor.
	pub fn region(&self) -> &[T] {
		self.memory.as_slice()
	}

	pub fn region_mut(&mut self) -> &mut [T] {
		self.make_mut().as_mut_slice()
	}

	pub fn as_bytes(&self) -> &[u8] {
		bytemuck::cast_slice(self.as_slice())
	}

	pub fn into_vec(self) -> Vec<T> {
		match self.memory {
			Memory::Owned(mut vec) => {
				vec.truncate(self.used);
				vec
			}
			Memory::Shared(shared) => shared[..self.used].to_vec(),
		}
	}

	fn make_mut(&mut self) -> &mut Vec<T> {
		if let Memory::Shared(shared) = &self.memory {
			let owned = shared.to_vec();
			self.memory = Memory::Owned(owned);
		}

		match &mut self.memory {
			Memory::Owned(vec) => vec,
			Memory::Shared(_) => unreachable!(),
		}
	}
}

impl DataBuffer<u8> {
	/// Reinterprets the used bytes as elements of `U`.
	pub fn cast<U: Pod>(&self) -> Result<DataBuffer<U>> {
		let size = size_of::<U>();
		if size == 0 || self.used % size != 0 {
			return_error!(buffer::element_size_mismatch(self.used, size));
		}

		Ok(DataBuffer::from_vec(bytemuck::pod_collect_to_vec(self.as_slice())))
	}
}

impl<T: Pod> fmt::Debug for DataBuffer<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DataBuffer")
			.field("used", &self.used)
			.field("capacity", &self.capacity())
			.field("owned", &self.is_owned())
			.finish()
	}
}

fn allocate<T: Pod>(vec: &mut Vec<T>, capacity: usize, limit: usize) -> Result<()> {
	let bytes = capacity.saturating_mul(size_of::<T>());
	if bytes > limit {
		debug!(requested = bytes, limit, "buffer capacity exceeds limit");
		return_error!(buffer::capacity_exceeded(bytes, limit));
	}

	if capacity > vec.len() {
		vec.try_reserve_exact(capacity - vec.len()).map_err(|_| error!(buffer::allocation_failed(bytes)))?;
	}

	vec.resize(capacity, T::zeroed());
	Ok(())
}
