// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

use pax_core::{ColumnEncodingKind, DataBuffer};
use pax_type::{Result, diagnostic::compression, error, return_error};
use tracing::{debug, instrument};

pub mod zlib;
pub mod zstd;

pub use self::{zlib::ZlibCompressor, zstd::ZstdCompressor};

/// Generic byte oriented compressor applied to a whole column stream.
///
/// Implementations are stateless, one instance may serve any number of calls.
pub trait BlockCompressor {
	/// Short algorithm name used in diagnostics.
	fn name(&self) -> &'static str;

	/// Upper bound of the compressed size of `src_len` bytes.
	fn compress_bound(&self, src_len: usize) -> usize;

	/// Compresses `src` into `dst`, returns the compressed length.
	fn compress(&self, dst: &mut [u8], src: &[u8], level: i32) -> Result<usize>;

	/// Decompressed size recorded in the frame, `None` when the format does not
	/// carry it.
	fn decompress_size(&self, src: &[u8]) -> Result<Option<usize>>;

	/// Decompresses `src` into `dst`, returns the decompressed length.
	fn decompress(&self, dst: &mut [u8], src: &[u8]) -> Result<usize>;

	/// Compresses `src` into a new buffer sized by [`compress_bound`](Self::compress_bound).
	#[instrument(name = "compression::compress_block", level = "trace", skip(self, src), fields(len = src.len()))]
	fn compress_block(&self, src: &[u8], level: i32) -> Result<DataBuffer<u8>> {
		let mut dst = DataBuffer::with_capacity(self.compress_bound(src.len()))?;
		let len = self.compress(dst.region_mut(), src, level)?;
		dst.brush(len);

		debug!("{} compressed {} bytes into {}", self.name(), src.len(), len);
		Ok(dst)
	}

	/// Decompresses `src` into a new buffer of exactly `origin_len` bytes.
	#[instrument(name = "compression::decompress_block", level = "trace", skip(self, src), fields(len = src.len()))]
	fn decompress_block(&self, src: &[u8], origin_len: usize) -> Result<DataBuffer<u8>> {
		let mut dst = DataBuffer::with_capacity(origin_len)?;
		let len = self.decompress(dst.region_mut(), src)?;
		if len != origin_len {
			return_error!(compression::decompress_size_mismatch(origin_len, len));
		}
		dst.brush(len);
		Ok(dst)
	}
}

/// Creates the block compressor for `kind`.
///
/// Kinds that are not block compression return `None`. `DEF_ENCODED` is a
/// logic error, it never names a compressor.
pub fn create_compressor(kind: ColumnEncodingKind) -> Result<Option<Box<dyn BlockCompressor>>> {
	match kind {
		ColumnEncodingKind::CompressZstd => Ok(Some(Box::new(ZstdCompressor))),
		ColumnEncodingKind::CompressZlib => Ok(Some(Box::new(ZlibCompressor))),
		ColumnEncodingKind::DefEncoded => Err(error!(compression::default_compress_kind())),
		ColumnEncodingKind::NoEncoded | ColumnEncodingKind::RleV2 | ColumnEncodingKind::DirectDelta => Ok(None),
	}
}
