// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use pax_type::{Result, diagnostic::compression, error, return_error};
use tracing::trace;

use crate::BlockCompressor;

/// Output window handed to the stream per call.
const ZLIB_CHUNK_SIZE: usize = 16 * 1024;

/// zlib compressor driven through the streaming interface.
///
/// The zlib frame does not record the uncompressed size, callers size the
/// destination from the original length kept with the column.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibCompressor;

impl BlockCompressor for ZlibCompressor {
	fn name(&self) -> &'static str {
		"zlib"
	}

	fn compress_bound(&self, src_len: usize) -> usize {
		src_len + (src_len >> 12) + (src_len >> 14) + (src_len >> 25) + 13
	}

	fn compress(&self, dst: &mut [u8], src: &[u8], level: i32) -> Result<usize> {
		let mut stream = Compress::new(Compression::new(level.clamp(0, 9) as u32), true);

		loop {
			let consumed = stream.total_in() as usize;
			let produced = stream.total_out() as usize;
			if produced == dst.len() {
				return_error!(compression::compress_failed("zlib", "destination buffer too small"));
			}

			let end = (produced + ZLIB_CHUNK_SIZE).min(dst.len());
			let status = stream
				.compress(&src[consumed..], &mut dst[produced..end], FlushCompress::Finish)
				.map_err(|e| error!(compression::compress_failed("zlib", e.to_string())))?;

			if status == Status::StreamEnd {
				trace!(len = stream.total_out(), "zlib stream finished");
				return Ok(stream.total_out() as usize);
			}
			if stream.total_in() as usize == consumed && stream.total_out() as usize == produced {
				return_error!(compression::compress_failed("zlib", "stream made no progress"));
			}
		}
	}

	fn decompress_size(&self, _src: &[u8]) -> Result<Option<usize>> {
		Ok(None)
	}

	fn decompress(&self, dst: &mut [u8], src: &[u8]) -> Result<usize> {
		let mut stream = Decompress::new(true);

		loop {
			let consumed = stream.total_in() as usize;
			let produced = stream.total_out() as usize;

			let end = (produced + ZLIB_CHUNK_SIZE).min(dst.len());
			let status = stream
				.decompress(&src[consumed..], &mut dst[produced..end], FlushDecompress::None)
				.map_err(|e| error!(compression::decompress_failed("zlib", e.to_string())))?;

			if status == Status::StreamEnd {
				return Ok(stream.total_out() as usize);
			}
			if stream.total_in() as usize == consumed && stream.total_out() as usize == produced {
				if produced == dst.len() {
					return_error!(compression::decompress_failed("zlib", "destination buffer too small"));
				}
				return_error!(compression::decompress_failed("zlib", "truncated stream"));
			}
		}
	}
}
