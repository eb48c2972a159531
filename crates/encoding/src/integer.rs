// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Debug;

use bytemuck::Pod;

/// Integer widths a decoder can produce.
///
/// Conversions wrap, a value that does not fit the target width keeps its low bits.
pub trait Integer: Pod + Default + Debug + PartialEq + Send + Sync + 'static {
	const WIDTH: usize;

	fn from_i64(value: i64) -> Self;

	fn to_i64(self) -> i64;
}

macro_rules! impl_integer {
	($($t:ty),*) => {
		$(
			impl Integer for $t {
				const WIDTH: usize = std::mem::size_of::<$t>();

				#[inline]
				fn from_i64(value: i64) -> Self {
					value as $t
				}

				#[inline]
				fn to_i64(self) -> i64 {
					self as i64
				}
			}
		)*
	};
}

impl_integer!(i8, i16, i32, i64);
