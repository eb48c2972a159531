// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Direct delta encoding.
//!
//! Values are split into self contained blocks of at most [`DELTA_BLOCK_SIZE`]:
//!
//! ```text
//! [count: varint] [first value: varint] [min delta: zigzag varint] [width: u8] [packed deltas]
//! ```
//!
//! A block of a single value ends after the first value. Every delta is stored
//! as `delta - min delta` bit packed at `width` bits, a width of 0 means all
//! deltas equal the minimum and nothing is packed.

mod decoder;
mod encoder;

pub use decoder::DeltaDecoder;
pub use encoder::DeltaEncoder;

/// Values per block.
pub const DELTA_BLOCK_SIZE: usize = 128;
