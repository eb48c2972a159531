// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::bitpacking::{ORC_HIST_LEN, ORC_MAX_LITERAL_SIZE};

#[derive(Debug)]
pub(crate) struct DeltaContext {
	/// First delta as is, then the absolute value of every following delta.
	pub adj_deltas: Vec<i64>,
	pub is_fixed_delta: bool,
	pub fixed_delta_val: i64,
	pub bits_delta_max: u32,
}

impl DeltaContext {
	fn new() -> Self {
		Self {
			adj_deltas: Vec::with_capacity(ORC_MAX_LITERAL_SIZE),
			is_fixed_delta: false,
			fixed_delta_val: 0,
			bits_delta_max: 0,
		}
	}

	pub fn reset(&mut self) {
		self.adj_deltas.clear();
		self.is_fixed_delta = false;
		self.fixed_delta_val = 0;
		self.bits_delta_max = 0;
	}
}

#[derive(Debug, Default)]
pub(crate) struct DirectContext {
	/// Width of the widest literal, cached when the histogram was already built.
	pub zigzag_bits_100_p: Option<u32>,
}

impl DirectContext {
	pub fn reset(&mut self) {
		self.zigzag_bits_100_p = None;
	}
}

#[derive(Debug)]
pub(crate) struct PatchBaseContext {
	pub histogram: [i32; ORC_HIST_LEN],
	/// Literals reduced by the run minimum.
	pub base_patch: Vec<i64>,
	pub hist_bits_95_p: u32,
	pub hist_bits_100_p: u32,
	pub min: i64,
	pub max: i64,
}

impl PatchBaseContext {
	fn new() -> Self {
		Self {
			histogram: [0; ORC_HIST_LEN],
			base_patch: Vec::with_capacity(ORC_MAX_LITERAL_SIZE),
			hist_bits_95_p: 0,
			hist_bits_100_p: 0,
			min: 0,
			max: 0,
		}
	}

	pub fn reset(&mut self) {
		self.histogram.fill(0);
		self.base_patch.clear();
		self.hist_bits_95_p = 0;
		self.hist_bits_100_p = 0;
		self.min = 0;
		self.max = 0;
	}
}

/// Run detection state of the encoder.
#[derive(Debug)]
pub(crate) struct EncoderContext {
	pub is_sign: bool,
	/// Length of the trailing run of identical values.
	pub fixed_len: usize,
	/// Length of the leading run of values that do not repeat.
	pub var_len: usize,
	pub prev_delta: i64,
	pub current_delta: i64,
	pub delta: DeltaContext,
	pub direct: DirectContext,
	pub patched: PatchBaseContext,
}

impl EncoderContext {
	pub fn new(is_sign: bool) -> Self {
		Self {
			is_sign,
			fixed_len: 0,
			var_len: 0,
			prev_delta: 0,
			current_delta: 0,
			delta: DeltaContext::new(),
			direct: DirectContext::default(),
			patched: PatchBaseContext::new(),
		}
	}

	pub fn reset_runs(&mut self) {
		self.delta.reset();
		self.direct.reset();
		self.patched.reset();
	}
}
