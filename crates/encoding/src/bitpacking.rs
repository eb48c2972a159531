// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Bit width helpers shared by the run length encoder and decoder.
//!
//! Widths are counted in bits. Only the widths of the fixed set can be expressed
//! in a run header, every other width is rounded up to the next member.

/// Minimum run of identical values before short repeat applies.
pub const ORC_MIN_REPEAT: usize = 3;

/// Longest run short repeat can express.
pub const ORC_MAX_SHORT_REPEAT_LENGTH: usize = 10;

/// Longest run any sub encoding can express.
pub const ORC_MAX_LITERAL_SIZE: usize = 512;

/// One histogram bucket per width tag.
pub const ORC_HIST_LEN: usize = 32;

/// Rounds `n` up to the nearest width of
/// `{1..=24, 26, 28, 30, 32, 40, 48, 56, 64}`.
#[inline]
pub fn closest_fixed_bits(n: u32) -> u32 {
	match n {
		0 => 1,
		1..=24 => n,
		25..=26 => 26,
		27..=28 => 28,
		29..=30 => 30,
		31..=32 => 32,
		33..=40 => 40,
		41..=48 => 48,
		49..=56 => 56,
		_ => 64,
	}
}

/// Rounds `n` up to the nearest width of `{1, 2, 4, 8, 16, 24, 32, 40, 48, 56, 64}`.
#[inline]
pub fn closest_aligned_bits(n: u32) -> u32 {
	match n {
		0..=1 => 1,
		2 => 2,
		3..=4 => 4,
		5..=8 => 8,
		9..=16 => 16,
		17..=24 => 24,
		25..=32 => 32,
		33..=40 => 40,
		41..=48 => 48,
		49..=56 => 56,
		_ => 64,
	}
}

/// Maps a width to its 5 bit header tag.
#[inline]
pub fn encode_bits(width: u32) -> u32 {
	match closest_fixed_bits(width) {
		n @ 1..=24 => n - 1,
		26 => 24,
		28 => 25,
		30 => 26,
		32 => 27,
		40 => 28,
		48 => 29,
		56 => 30,
		_ => 31,
	}
}

/// Maps a 5 bit header tag back to its width.
#[inline]
pub fn decode_bits(tag: u32) -> u32 {
	match tag & 0x1f {
		n @ 0..=23 => n + 1,
		24 => 26,
		25 => 28,
		26 => 30,
		27 => 32,
		28 => 40,
		29 => 48,
		30 => 56,
		_ => 64,
	}
}

/// Fixed width needed to hold `value` as unsigned. Negative values need all 64 bits.
#[inline]
pub fn find_closest_bits(value: i64) -> u32 {
	if value < 0 {
		return closest_fixed_bits(64);
	}
	closest_fixed_bits(64 - value.leading_zeros())
}

#[inline]
pub fn zigzag(value: i64) -> i64 {
	(value << 1) ^ (value >> 63)
}

#[inline]
pub fn unzigzag(value: u64) -> i64 {
	((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Counts how many values need each width, bucketed by width tag.
pub fn build_histogram(histogram: &mut [i32; ORC_HIST_LEN], data: &[i64]) {
	histogram.fill(0);
	for &value in data {
		histogram[encode_bits(find_closest_bits(value)) as usize] += 1;
	}
}

/// Smallest width that holds at least `p` of the `len` values counted in `histogram`.
pub fn percentile_bits(histogram: &[i32; ORC_HIST_LEN], len: usize, p: f64) -> u32 {
	debug_assert!(p > 0.0 && p <= 1.0);

	let mut remaining = (len as f64 * (1.0 - p)) as i64;
	for tag in (0..ORC_HIST_LEN).rev() {
		remaining -= histogram[tag] as i64;
		if remaining < 0 {
			return decode_bits(tag as u32);
		}
	}
	0
}

/// Whether `left - right` stays within `i64`.
#[inline]
pub fn is_safe_subtract(left: i64, right: i64) -> bool {
	((left ^ right) >= 0) || ((left ^ left.wrapping_sub(right)) >= 0)
}

#[cfg(test)]
mod tests {
	use super::*;

	const FIXED: [u32; 32] = [
		1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 26, 28, 30, 32,
		40, 48, 56, 64,
	];

	#[test]
	fn test_closest_fixed_bits() {
		assert_eq!(closest_fixed_bits(0), 1);
		for n in 1..=64 {
			let closest = closest_fixed_bits(n);
			assert!(closest >= n);
			assert!(FIXED.contains(&closest));
			let smaller = FIXED.iter().filter(|w| **w < closest).max().copied().unwrap_or(0);
			assert!(smaller < n, "{n} rounded to {closest}, {smaller} would do");
		}
	}

	#[test]
	fn test_closest_aligned_bits() {
		assert_eq!(closest_aligned_bits(0), 1);
		assert_eq!(closest_aligned_bits(1), 1);
		assert_eq!(closest_aligned_bits(2), 2);
		assert_eq!(closest_aligned_bits(3), 4);
		assert_eq!(closest_aligned_bits(5), 8);
		assert_eq!(closest_aligned_bits(9), 16);
		assert_eq!(closest_aligned_bits(17), 24);
		assert_eq!(closest_aligned_bits(25), 32);
		assert_eq!(closest_aligned_bits(33), 40);
		assert_eq!(closest_aligned_bits(41), 48);
		assert_eq!(closest_aligned_bits(49), 56);
		assert_eq!(closest_aligned_bits(57), 64);
	}

	#[test]
	fn test_bits_tag_roundtrip() {
		for (tag, width) in FIXED.iter().enumerate() {
			assert_eq!(encode_bits(*width), tag as u32);
			assert_eq!(decode_bits(tag as u32), *width);
		}
	}

	#[test]
	fn test_find_closest_bits() {
		assert_eq!(find_closest_bits(0), 1);
		assert_eq!(find_closest_bits(1), 1);
		assert_eq!(find_closest_bits(3), 2);
		assert_eq!(find_closest_bits(255), 8);
		assert_eq!(find_closest_bits(1 << 24), 26);
		assert_eq!(find_closest_bits(i64::MAX), 64);
		assert_eq!(find_closest_bits(-1), 64);
	}

	#[test]
	fn test_zigzag() {
		assert_eq!(zigzag(0), 0);
		assert_eq!(zigzag(-1), 1);
		assert_eq!(zigzag(1), 2);
		assert_eq!(zigzag(-2), 3);
		assert_eq!(zigzag(i64::MAX), -2);
		assert_eq!(zigzag(i64::MIN), -1);

		for value in [0, 1, -1, 63, -64, i64::MAX, i64::MIN, 123_456_789, -987_654_321] {
			assert_eq!(unzigzag(zigzag(value) as u64), value);
		}
	}

	#[test]
	fn test_percentile_bits() {
		let mut data = vec![1i64; 97];
		data.push(1 << 20);
		data.push(1 << 30);
		data.push(1 << 30);

		let mut histogram = [0; ORC_HIST_LEN];
		build_histogram(&mut histogram, &data);
		assert_eq!(histogram[0], 97);
		assert_eq!(histogram[20], 1);
		assert_eq!(histogram[27], 2);

		assert_eq!(percentile_bits(&histogram, data.len(), 1.0), 32);
		assert_eq!(percentile_bits(&histogram, data.len(), 0.99), 32);
		assert_eq!(percentile_bits(&histogram, data.len(), 0.98), 21);
		assert_eq!(percentile_bits(&histogram, data.len(), 0.95), 1);
	}

	#[test]
	fn test_percentile_bits_empty() {
		let histogram = [0; ORC_HIST_LEN];
		assert_eq!(percentile_bits(&histogram, 0, 1.0), 0);
	}

	#[test]
	fn test_is_safe_subtract() {
		assert!(is_safe_subtract(10, 3));
		assert!(is_safe_subtract(-10, 3));
		assert!(is_safe_subtract(i64::MAX, 0));
		assert!(is_safe_subtract(i64::MAX, 1));
		assert!(!is_safe_subtract(i64::MAX, -1));
		assert!(!is_safe_subtract(i64::MIN, 1));
		assert!(is_safe_subtract(i64::MIN, i64::MIN));
	}
}
