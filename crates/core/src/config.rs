// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};

use crate::buffer::MAX_BUFFER_CAPACITY;

/// Sizing of the buffers behind encoders, decoders and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
	/// Number of elements allocated up front.
	pub initial_capacity: usize,
	/// Capacity multiplier applied when a buffer runs out of space.
	pub growth_factor: usize,
	/// Upper bound in bytes for a single buffer. Clamped to [`MAX_BUFFER_CAPACITY`].
	pub capacity_limit: usize,
}

impl Default for BufferConfig {
	fn default() -> Self {
		Self {
			initial_capacity: 2048,
			growth_factor: 2,
			capacity_limit: MAX_BUFFER_CAPACITY,
		}
	}
}

impl BufferConfig {
	pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
		self.initial_capacity = initial_capacity;
		self
	}

	pub fn with_growth_factor(mut self, growth_factor: usize) -> Self {
		self.growth_factor = growth_factor.max(2);
		self
	}

	pub fn with_capacity_limit(mut self, capacity_limit: usize) -> Self {
		self.capacity_limit = capacity_limit.min(MAX_BUFFER_CAPACITY);
		self
	}

	pub(crate) fn effective_limit(&self) -> usize {
		self.capacity_limit.min(MAX_BUFFER_CAPACITY)
	}
}
