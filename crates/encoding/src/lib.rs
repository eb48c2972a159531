// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod bitpacking;
mod codec;
pub mod delta;
mod integer;
pub mod io;
pub mod orc;

pub use codec::{Decoder, Encoder, create_decoder, create_encoder};
pub use delta::{DeltaDecoder, DeltaEncoder};
pub use integer::Integer;
pub use orc::{EncodingType, OrcDecoder, OrcEncoder};
