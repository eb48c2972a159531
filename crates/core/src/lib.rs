// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod bitmap;
pub mod buffer;
pub mod config;
pub mod options;

pub use bitmap::Bitmap8;
pub use buffer::{DataBuffer, MAX_BUFFER_CAPACITY, MEMORY_ALIGN_SIZE, TreatedBuffer, UntreatedBuffer};
pub use config::BufferConfig;
pub use options::{ColumnEncodingKind, DecodingOptions, EncodingOptions};
