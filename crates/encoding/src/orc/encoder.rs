// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_core::{BufferConfig, DataBuffer, EncodingOptions, UntreatedBuffer};
use pax_type::{Result, diagnostic::encoding, return_error};
use tracing::{debug, instrument, trace};

use super::{EncodingType, context::EncoderContext};
use crate::{
	Encoder,
	bitpacking::{
		ORC_HIST_LEN, ORC_MAX_LITERAL_SIZE, ORC_MAX_SHORT_REPEAT_LENGTH, ORC_MIN_REPEAT, build_histogram,
		closest_aligned_bits, closest_fixed_bits, encode_bits, find_closest_bits, is_safe_subtract,
		percentile_bits, zigzag,
	},
	io::{write_long_be, write_longs, write_signed_varint, write_unsigned_varint},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderStatus {
	Init,
	TwoElements,
	Untreated,
	UntreatedDiscontinuous,
	TreatPrevBuffer,
	Flush,
	DetermineFlushPrevBuffer,
	TreatShortRepeat,
	TreatDirect,
	TreatPatchedBase,
	TreatDelta,
	TreatDone,
	Finish,
	Invalid,
}

/// Streaming ORC run length encoder.
///
/// Values are staged until the run they belong to can be classified, at most
/// [`ORC_MAX_LITERAL_SIZE`] values per run. [`flush`](Self::flush) emits whatever
/// is still staged and closes the encoder, appending afterwards is an error while
/// flushing again is a no-op.
pub struct OrcEncoder {
	options: EncodingOptions,
	data: UntreatedBuffer<i64>,
	result: DataBuffer<u8>,
	context: EncoderContext,
	status: EncoderStatus,
	/// Zigzag encoded (or raw when unsigned) copy of the untreated values.
	scratch: Vec<i64>,
}

impl OrcEncoder {
	pub fn new(options: EncodingOptions) -> Result<Self> {
		Self::with_config(options, &BufferConfig::default())
	}

	pub fn with_config(options: EncodingOptions, config: &BufferConfig) -> Result<Self> {
		let staging = (*config).with_initial_capacity(config.initial_capacity.min(ORC_MAX_LITERAL_SIZE));

		Ok(Self {
			options,
			data: UntreatedBuffer::with_config(&staging)?,
			result: DataBuffer::with_config(config)?,
			context: EncoderContext::new(options.is_sign),
			status: EncoderStatus::Init,
			scratch: Vec::with_capacity(ORC_MAX_LITERAL_SIZE),
		})
	}

	pub fn options(&self) -> &EncodingOptions {
		&self.options
	}

	pub fn into_buffer(self) -> DataBuffer<u8> {
		self.result
	}

	fn process(&mut self, value: i64, is_flush: bool) -> Result<()> {
		let mut reprocess = false;
		let mut keep = true;

		if is_flush {
			self.status = EncoderStatus::Flush;
		}

		while keep {
			keep = false;

			match self.status {
				EncoderStatus::Invalid => {
					return_error!(encoding::encoder_finished());
				}
				EncoderStatus::Init => {
					self.data.push(value)?;
					self.context.fixed_len = 1;
					self.context.var_len = 1;
					self.status = EncoderStatus::TwoElements;
				}
				EncoderStatus::TwoElements => {
					self.context.prev_delta = value.wrapping_sub(self.last());
					self.data.push(value)?;

					if self.context.prev_delta == 0 {
						self.context.fixed_len = 2;
						self.context.var_len = 0;
					} else {
						self.context.fixed_len = 0;
						self.context.var_len = 2;
					}
					self.status = EncoderStatus::Untreated;
				}
				EncoderStatus::Untreated => {
					if self.data.untreated() == 0 {
						keep = true;
						self.status = EncoderStatus::Init;
						continue;
					}

					self.context.current_delta = value.wrapping_sub(self.last());

					if self.context.current_delta == 0 && self.context.prev_delta == 0 {
						self.data.push(value)?;
						if self.context.var_len > 0 {
							// the last two values of the variable run start the repeat
							self.context.fixed_len = 2;
						}
						self.context.fixed_len += 1;

						if self.context.fixed_len >= ORC_MIN_REPEAT && self.context.var_len > 0 {
							keep = true;
							self.status = EncoderStatus::TreatPrevBuffer;
						} else if self.context.fixed_len == ORC_MAX_LITERAL_SIZE {
							self.context.delta.is_fixed_delta = true;
							keep = true;
							self.status = EncoderStatus::TreatDelta;
						}
						continue;
					}

					if self.context.fixed_len >= ORC_MIN_REPEAT {
						keep = true;
						self.status = EncoderStatus::UntreatedDiscontinuous;
						continue;
					}

					if self.context.fixed_len > 0
						&& self.context.fixed_len < ORC_MIN_REPEAT
						&& self.context.current_delta != 0
					{
						self.context.var_len = self.context.fixed_len;
						self.context.fixed_len = 0;
					}

					self.context.prev_delta = self.context.current_delta;
					self.data.push(value)?;
					self.context.var_len += 1;

					if self.context.var_len == ORC_MAX_LITERAL_SIZE {
						keep = true;
						self.status = EncoderStatus::DetermineFlushPrevBuffer;
					}
				}
				EncoderStatus::UntreatedDiscontinuous => {
					// the value that broke the repeat is replayed once the repeat is written
					reprocess = true;
					keep = true;

					if self.context.fixed_len <= ORC_MAX_SHORT_REPEAT_LENGTH {
						self.status = EncoderStatus::TreatShortRepeat;
					} else {
						self.context.delta.is_fixed_delta = true;
						self.status = EncoderStatus::TreatDelta;
					}
				}
				EncoderStatus::TreatPrevBuffer => {
					debug_assert_eq!(self.context.fixed_len, ORC_MIN_REPEAT);
					debug_assert_eq!(self.data.untouched(), 0);

					// the repeat stays staged and is shifted to the front in TreatDone
					self.data.brush_back_untreated(ORC_MIN_REPEAT);
					self.context.var_len -= ORC_MIN_REPEAT - 1;

					keep = true;
					self.status = EncoderStatus::DetermineFlushPrevBuffer;
				}
				EncoderStatus::Flush => {
					keep = true;

					if self.data.used() == 0 {
						self.status = EncoderStatus::Finish;
						continue;
					}

					debug_assert_eq!(self.data.untreated(), self.data.used());

					if self.context.fixed_len != 0 {
						if self.context.fixed_len < ORC_MIN_REPEAT {
							self.context.var_len = self.context.fixed_len;
							self.context.fixed_len = 0;
						} else if self.context.fixed_len <= ORC_MAX_SHORT_REPEAT_LENGTH {
							self.status = EncoderStatus::TreatShortRepeat;
							continue;
						} else {
							self.context.delta.is_fixed_delta = true;
							self.status = EncoderStatus::TreatDelta;
							continue;
						}
					}

					self.status = EncoderStatus::DetermineFlushPrevBuffer;
				}
				EncoderStatus::DetermineFlushPrevBuffer => {
					keep = true;
					self.status = self.determine();
				}
				EncoderStatus::TreatShortRepeat => {
					self.write_short_repeat()?;
					self.context.fixed_len = 0;

					keep = true;
					self.status = EncoderStatus::TreatDone;
				}
				EncoderStatus::TreatDirect => {
					self.write_direct()?;
					self.context.var_len = 0;

					keep = true;
					self.status = EncoderStatus::TreatDone;
				}
				EncoderStatus::TreatPatchedBase => {
					self.write_patched_base()?;
					self.context.var_len = 0;

					keep = true;
					self.status = EncoderStatus::TreatDone;
				}
				EncoderStatus::TreatDelta => {
					if self.write_delta()? {
						self.context.fixed_len = 0;
					} else {
						self.context.var_len = 0;
					}

					keep = true;
					self.status = EncoderStatus::TreatDone;
				}
				EncoderStatus::TreatDone => {
					debug_assert!(self.data.untreated() != 0);
					self.context.reset_runs();

					self.data.treated_all();
					self.data.brush_untreated_all();

					if is_flush {
						keep = true;
						self.status = if self.context.fixed_len == 0 && self.context.var_len == 0 {
							EncoderStatus::Finish
						} else {
							EncoderStatus::Flush
						};
					} else {
						keep = reprocess;
						reprocess = false;
						self.status = EncoderStatus::Untreated;
					}
				}
				EncoderStatus::Finish => {
					debug!(bytes = self.result.used(), "orc encoder finished");
					self.status = EncoderStatus::Invalid;
				}
			}
		}

		Ok(())
	}

	#[inline]
	fn last(&self) -> i64 {
		self.data[self.data.used() - 1]
	}

	/// Picks the sub encoding for the untreated values.
	fn determine(&mut self) -> EncoderStatus {
		let values = self.data.untreated_slice();
		let count = values.len();

		if count <= ORC_MIN_REPEAT {
			return EncoderStatus::TreatDirect;
		}

		let ctx = &mut self.context;
		let init_delta = values[1].wrapping_sub(values[0]);
		let mut current_delta = 0i64;
		let mut max_delta = 0i64;
		let mut increasing = true;
		let mut decreasing = true;

		ctx.delta.is_fixed_delta = true;
		ctx.delta.adj_deltas.push(init_delta);
		ctx.patched.min = values[0];
		ctx.patched.max = values[0];

		for i in 1..count {
			let (l0, l1) = (values[i - 1], values[i]);
			current_delta = l1.wrapping_sub(l0);
			ctx.patched.min = ctx.patched.min.min(l1);
			ctx.patched.max = ctx.patched.max.max(l1);

			increasing &= l0 <= l1;
			decreasing &= l0 >= l1;

			ctx.delta.is_fixed_delta &= current_delta == init_delta;
			if i > 1 {
				let adjusted = current_delta.wrapping_abs();
				ctx.delta.adj_deltas.push(adjusted);
				max_delta = max_delta.max(adjusted);
			}
		}

		if !is_safe_subtract(ctx.patched.max, ctx.patched.min) {
			return EncoderStatus::TreatDirect;
		}

		if ctx.patched.min == ctx.patched.max {
			debug_assert!(ctx.delta.is_fixed_delta);
			ctx.delta.fixed_delta_val = 0;
			return EncoderStatus::TreatDelta;
		}

		if ctx.delta.is_fixed_delta {
			debug_assert_eq!(current_delta, init_delta);
			ctx.delta.fixed_delta_val = current_delta;
			return EncoderStatus::TreatDelta;
		}

		if init_delta != 0 {
			ctx.delta.bits_delta_max = find_closest_bits(max_delta);
			if increasing || decreasing {
				return EncoderStatus::TreatDelta;
			}
		}

		ctx.delta.reset();

		self.scratch.clear();
		if ctx.is_sign {
			self.scratch.extend(values.iter().map(|v| zigzag(*v)));
		} else {
			self.scratch.extend_from_slice(values);
		}

		build_histogram(&mut ctx.patched.histogram, &self.scratch);
		let bits_100 = percentile_bits(&ctx.patched.histogram, count, 1.0);
		let bits_90 = percentile_bits(&ctx.patched.histogram, count, 0.9);
		ctx.direct.zigzag_bits_100_p = Some(bits_100);

		if bits_100 - bits_90 > 1 && Self::base_fits_header(ctx.patched.min) {
			let min = ctx.patched.min;
			ctx.patched.base_patch.extend(values.iter().map(|v| v.wrapping_sub(min)));

			build_histogram(&mut ctx.patched.histogram, &ctx.patched.base_patch);
			ctx.patched.hist_bits_95_p = percentile_bits(&ctx.patched.histogram, count, 0.95);
			ctx.patched.hist_bits_100_p = percentile_bits(&ctx.patched.histogram, count, 1.0);

			if ctx.patched.hist_bits_100_p != ctx.patched.hist_bits_95_p {
				return EncoderStatus::TreatPatchedBase;
			}
		}

		ctx.patched.reset();
		EncoderStatus::TreatDirect
	}

	/// Whether the run minimum, sign bit included, fits the 8 byte base field.
	fn base_fits_header(min: i64) -> bool {
		min != i64::MIN && find_closest_bits(min.abs()) < 64
	}

	fn write_header(&mut self, kind: EncodingType, width_tag: u32, len: usize) -> Result<()> {
		let len = len - 1;
		let first = kind.header_bits() | (width_tag << 1) as u8 | ((len & 0x100) >> 8) as u8;
		self.result.extend_from_slice(&[first, (len & 0xff) as u8])
	}

	fn write_short_repeat(&mut self) -> Result<()> {
		let value = self.data[0];
		let repeat = if self.context.is_sign { zigzag(value) } else { value };
		let bytes = find_closest_bits(repeat).div_ceil(8) as usize;

		let header = EncodingType::ShortRepeat.header_bits()
			| (self.context.fixed_len - ORC_MIN_REPEAT) as u8
			| ((bytes - 1) << 3) as u8;

		trace!("short repeat run of {} values", self.context.fixed_len);
		self.result.push(header)?;
		write_long_be(&mut self.result, repeat as u64, bytes)
	}

	fn write_direct(&mut self) -> Result<()> {
		let bits_100 = match self.context.direct.zigzag_bits_100_p {
			Some(bits) => bits,
			None => {
				let values = self.data.untreated_slice();
				self.scratch.clear();
				if self.context.is_sign {
					self.scratch.extend(values.iter().map(|v| zigzag(*v)));
				} else {
					self.scratch.extend_from_slice(values);
				}

				let mut histogram = [0; ORC_HIST_LEN];
				build_histogram(&mut histogram, &self.scratch);
				percentile_bits(&histogram, self.scratch.len(), 1.0)
			}
		};
		debug_assert_eq!(self.scratch.len(), self.data.untreated());

		let width = closest_aligned_bits(bits_100);
		trace!("direct run of {} values at {} bits", self.context.var_len, width);

		self.write_header(EncodingType::Direct, encode_bits(width), self.context.var_len)?;
		write_longs(&mut self.result, &self.scratch, width)?;

		self.context.direct.reset();
		Ok(())
	}

	fn write_patched_base(&mut self) -> Result<()> {
		let var_len = self.context.var_len;
		let pb = &mut self.context.patched;

		let mut bits_95 = pb.hist_bits_95_p;
		let mut patch_width = closest_fixed_bits(pb.hist_bits_100_p - bits_95);

		// gap and patch have to share one 64 bit word
		if patch_width == 64 {
			patch_width = 56;
			bits_95 = 8;
		}
		let mask = (1i64 << bits_95).wrapping_sub(1);

		let mut gaps = Vec::new();
		let mut patches = Vec::new();
		let mut prev = 0usize;
		let mut max_gap = 0usize;

		for (i, value) in pb.base_patch.iter_mut().enumerate() {
			if *value > mask {
				let gap = i - prev;
				max_gap = max_gap.max(gap);
				prev = i;

				gaps.push(gap as i64);
				patches.push(*value >> bits_95);
				*value &= mask;
			}
		}

		let mut gap_width = if max_gap == 0 && !gaps.is_empty() {
			1
		} else {
			find_closest_bits(max_gap as i64)
		};
		// longer gaps are split into 255 steps with an empty patch
		gap_width = gap_width.min(8);

		let mut patch_list = Vec::with_capacity(gaps.len() + 2);
		for (gap, patch) in gaps.into_iter().zip(patches) {
			let mut gap = gap;
			while gap > 255 {
				patch_list.push(255i64 << patch_width);
				gap -= 255;
			}
			patch_list.push((gap << patch_width) | patch);
		}
		debug_assert!(!patch_list.is_empty() && patch_list.len() < 32);

		let negative = pb.min < 0;
		let magnitude = pb.min.unsigned_abs();
		let base_bytes = (find_closest_bits(magnitude as i64) + 1).div_ceil(8) as usize;
		let base = if negative {
			magnitude | (1u64 << (base_bytes * 8 - 1))
		} else {
			magnitude
		};

		trace!("patched base run of {} values with {} patches", var_len, patch_list.len());

		let len = var_len - 1;
		let header = [
			EncodingType::PatchedBase.header_bits() | (encode_bits(bits_95) << 1) as u8 | ((len & 0x100) >> 8) as u8,
			(len & 0xff) as u8,
			(((base_bytes - 1) << 5) as u32 | encode_bits(patch_width)) as u8,
			(((gap_width - 1) << 5) as usize | patch_list.len()) as u8,
		];
		self.result.extend_from_slice(&header)?;

		write_long_be(&mut self.result, base, base_bytes)?;
		write_longs(&mut self.result, &pb.base_patch, closest_fixed_bits(bits_95))?;
		write_longs(&mut self.result, &patch_list, closest_fixed_bits(gap_width + patch_width))
	}

	/// Returns true when the run consumed the fixed run rather than the variable one.
	fn write_delta(&mut self) -> Result<bool> {
		let first = self.data[0];
		let (width_tag, len, reset_fixed, width) = if self.context.delta.is_fixed_delta {
			if self.context.fixed_len > ORC_MIN_REPEAT {
				(0, self.context.fixed_len, true, 0)
			} else {
				(0, self.context.var_len, false, 0)
			}
		} else {
			let mut width = closest_aligned_bits(self.context.delta.bits_delta_max);
			if width == 1 {
				width = 2;
			}
			(encode_bits(width), self.context.var_len, false, width)
		};

		trace!("delta run of {} values", len);
		self.write_header(EncodingType::Delta, width_tag, len)?;

		if self.context.is_sign {
			write_signed_varint(&mut self.result, first)?;
		} else {
			write_unsigned_varint(&mut self.result, first as u64)?;
		}

		let delta = &self.context.delta;
		if delta.is_fixed_delta {
			write_signed_varint(&mut self.result, delta.fixed_delta_val)?;
		} else {
			write_signed_varint(&mut self.result, delta.adj_deltas[0])?;
			write_longs(&mut self.result, &delta.adj_deltas[1..], width)?;
		}

		Ok(reset_fixed)
	}
}

impl Encoder for OrcEncoder {
	fn append(&mut self, value: i64) -> Result<()> {
		self.process(value, false)
	}

	#[instrument(name = "encoding::orc::flush", level = "trace", skip(self))]
	fn flush(&mut self) -> Result<()> {
		self.process(0, true)
	}

	fn buffer(&self) -> &[u8] {
		self.result.as_slice()
	}

	fn buffer_size(&self) -> usize {
		self.result.used()
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

	use super::*;

	fn encode(values: &[i64], is_sign: bool) -> Vec<u8> {
		let mut encoder = OrcEncoder::new(EncodingOptions::new(ColumnEncodingKind::RleV2, is_sign)).unwrap();
		for value in values {
			encoder.append(*value).unwrap();
		}
		encoder.flush().unwrap();
		encoder.buffer().to_vec()
	}

	#[test]
	fn test_short_repeat() {
		assert_eq!(encode(&[-2; 10], true), vec![0x07, 0x03]);
		assert_eq!(encode(&[10000; 5], false), vec![0x0a, 0x27, 0x10]);
	}

	#[test]
	fn test_short_repeat_boundaries() {
		for len in ORC_MIN_REPEAT..=ORC_MAX_SHORT_REPEAT_LENGTH {
			let bytes = encode(&vec![7; len], true);
			assert_eq!(bytes[0] >> 6, EncodingType::ShortRepeat as u8);
			assert_eq!((bytes[0] & 0x07) as usize, len - ORC_MIN_REPEAT);
			assert_eq!(bytes.len(), 2);
		}

		let bytes = encode(&[1 << 40; 4], false);
		assert_eq!(bytes[0], (5 << 3) | 1);
		assert_eq!(bytes.len(), 1 + 6);
	}

	#[test]
	fn test_fixed_repeat_as_delta() {
		assert_eq!(encode(&[-10; 11], true), vec![0xc0, 0x0a, 0x13, 0x00]);
	}

	#[test]
	fn test_fixed_delta() {
		let values: Vec<i64> = (1..=20).collect();
		assert_eq!(encode(&values, true), vec![0xc0, 0x13, 0x02, 0x02]);
	}

	#[test]
	fn test_short_run_direct() {
		assert_eq!(encode(&[1, 2, 4], true), vec![0x46, 0x02, 0x24, 0x80]);
	}

	#[test]
	fn test_direct() {
		assert_eq!(
			encode(&[23713, 43806, 57005, 48879], false),
			vec![0x5e, 0x03, 0x5c, 0xa1, 0xab, 0x1e, 0xde, 0xad, 0xbe, 0xef]
		);
	}

	#[test]
	fn test_delta() {
		assert_eq!(
			encode(&[2, 3, 5, 7, 11, 13, 17, 19, 23, 29], false),
			vec![0xc6, 0x09, 0x02, 0x02, 0x22, 0x42, 0x42, 0x46]
		);
	}

	#[test]
	fn test_patched_base() {
		let mut values = vec![2030, 2000, 2020, 1_000_000];
		values.extend((2040..=2190).step_by(10));
		assert_eq!(values.len(), 20);

		assert_eq!(
			encode(&values, false),
			vec![
				0x8e, 0x13, 0x2b, 0x21, 0x07, 0xd0, 0x1e, 0x00, 0x14, 0x70, 0x28, 0x32, 0x3c, 0x46, 0x50, 0x5a,
				0x64, 0x6e, 0x78, 0x82, 0x8c, 0x96, 0xa0, 0xaa, 0xb4, 0xbe, 0xfc, 0xe8
			]
		);
	}

	#[test]
	fn test_flush_idempotent() {
		let mut encoder = OrcEncoder::new(EncodingOptions::new(ColumnEncodingKind::RleV2, true)).unwrap();
		for value in [5, 1, 9, 9, 9, 9, 3] {
			encoder.append(value).unwrap();
		}
		encoder.flush().unwrap();
		let bytes = encoder.buffer().to_vec();

		for _ in 0..3 {
			encoder.flush().unwrap();
			assert_eq!(encoder.buffer(), bytes.as_slice());
			assert_eq!(encoder.buffer_size(), bytes.len());
		}
	}

	#[test]
	fn test_flush_empty() {
		let mut encoder = OrcEncoder::new(EncodingOptions::default()).unwrap();
		encoder.flush().unwrap();
		encoder.flush().unwrap();
		assert_eq!(encoder.buffer_size(), 0);
	}

	#[test]
	fn test_append_after_flush() {
		let mut encoder = OrcEncoder::new(EncodingOptions::default()).unwrap();
		encoder.append(1).unwrap();
		encoder.flush().unwrap();

		let err = encoder.append(2).unwrap_err();
		assert_eq!(err.code, "ENCODING_006");
		assert_eq!(err.kind(), pax_type::ErrorKind::LogicError);
	}

	#[test]
	fn test_repeat_after_variable_run() {
		// [5, 1] direct, [9 x 4] short repeat, [3] direct
		let bytes = encode(&[5, 1, 9, 9, 9, 9, 3], true);
		assert_eq!(bytes[0] >> 6, EncodingType::Direct as u8);
		assert_eq!(bytes[1], 1);
		let repeat = 2 + 1;
		assert_eq!(bytes[repeat], 1);
		assert_eq!(bytes[repeat + 1], 18);
		assert_eq!(bytes[repeat + 2] >> 6, EncodingType::Direct as u8);
		assert_eq!(bytes[repeat + 3], 0);
	}

	#[test]
	fn test_long_variable_run_splits() {
		let values: Vec<i64> = (0..ORC_MAX_LITERAL_SIZE as i64 + 10).map(|i| (i * 7919) % 1013).collect();
		let bytes = encode(&values, false);

		let len = (((bytes[0] & 1) as usize) << 8 | bytes[1] as usize) + 1;
		assert_eq!(len, ORC_MAX_LITERAL_SIZE);
	}

	#[test]
	fn test_overflowing_range_is_direct() {
		let bytes = encode(&[i64::MIN, i64::MAX, 0, 1, -1], true);
		assert_eq!(bytes[0] >> 6, EncodingType::Direct as u8);
	}
}
