// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use ::zstd::{bulk, zstd_safe};
use pax_type::{Result, diagnostic::compression, error};

use crate::BlockCompressor;

/// Single call zstd compressor, the frame records its own content size.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdCompressor;

impl BlockCompressor for ZstdCompressor {
	fn name(&self) -> &'static str {
		"zstd"
	}

	fn compress_bound(&self, src_len: usize) -> usize {
		zstd_safe::compress_bound(src_len)
	}

	fn compress(&self, dst: &mut [u8], src: &[u8], level: i32) -> Result<usize> {
		bulk::compress_to_buffer(src, dst, level).map_err(|e| error!(compression::compress_failed("zstd", e.to_string())))
	}

	fn decompress_size(&self, src: &[u8]) -> Result<Option<usize>> {
		match zstd_safe::get_frame_content_size(src) {
			Ok(size) => Ok(size.map(|s| s as usize)),
			Err(_) => Err(error!(compression::decompress_failed("zstd", "invalid frame header"))),
		}
	}

	fn decompress(&self, dst: &mut [u8], src: &[u8]) -> Result<usize> {
		bulk::decompress_to_buffer(src, dst).map_err(|e| error!(compression::decompress_failed("zstd", e.to_string())))
	}
}
