// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use pax_core::{ColumnEncodingKind, DataBuffer, MEMORY_ALIGN_SIZE};
use pax_type::{Result, diagnostic::column, error, return_error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::{Column, StorageFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
	/// Not null bitmap, one bit per row.
	Present,
	/// Lengths of a variable width column.
	Length,
	Data,
}

/// Placement of one stream inside a [`CombinedBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
	pub kind: StreamKind,
	pub column: usize,
	/// Number of entries the stream describes.
	pub count: usize,
	pub offset: usize,
	/// Bytes taken in the buffer, padding included.
	pub length: usize,
	/// Trailing zero bytes inside `length`.
	pub padding: usize,
}

impl StreamInfo {
	/// The stream bytes without padding.
	pub fn range(&self) -> std::ops::Range<usize> {
		self.offset..self.offset + self.length - self.padding
	}
}

/// How the streams of one column were written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEncodingInfo {
	pub column: usize,
	pub kind: ColumnEncodingKind,
	pub compress_level: i32,
	pub origin_length: usize,
	pub lengths_kind: ColumnEncodingKind,
	pub lengths_compress_level: i32,
	pub lengths_origin_length: usize,
}

#[derive(Debug)]
pub struct CombinedBuffer {
	pub data: DataBuffer<u8>,
	pub streams: Vec<StreamInfo>,
	pub encodings: Vec<ColumnEncodingInfo>,
}

impl CombinedBuffer {
	pub fn stream(&self, info: &StreamInfo) -> &[u8] {
		&self.data.as_slice()[info.range()]
	}

	pub fn streams_of(&self, column: usize) -> impl Iterator<Item = &StreamInfo> + '_ {
		self.streams.iter().filter(move |info| info.column == column)
	}
}

/// A group of columns sharing one storage format, combined into a single buffer.
///
/// Slots may be empty for columns that are not part of the group.
pub struct Columns {
	format: StorageFormat,
	columns: Vec<Option<Box<dyn Column>>>,
}

impl Columns {
	pub fn new(format: StorageFormat) -> Self {
		Self {
			format,
			columns: Vec::new(),
		}
	}

	pub fn storage_format(&self) -> StorageFormat {
		self.format
	}

	pub fn push(&mut self, column: Box<dyn Column>) -> Result<()> {
		if column.storage_format() != self.format {
			return_error!(column::storage_format_mismatch(
				&self.format.to_string(),
				&column.storage_format().to_string()
			));
		}
		self.columns.push(Some(column));
		Ok(())
	}

	pub fn push_none(&mut self) {
		self.columns.push(None);
	}

	pub fn len(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	pub fn get(&self, position: usize) -> Result<Option<&dyn Column>> {
		match self.columns.get(position) {
			Some(column) => Ok(column.as_deref()),
			None => Err(error!(column::column_index_out_of_range(position, self.columns.len()))),
		}
	}

	pub fn get_mut(&mut self, position: usize) -> Result<Option<&mut Box<dyn Column>>> {
		let len = self.columns.len();
		match self.columns.get_mut(position) {
			Some(column) => Ok(column.as_mut()),
			None => Err(error!(column::column_index_out_of_range(position, len))),
		}
	}

	/// Rows of the group, taken from the first present column.
	pub fn rows(&self) -> usize {
		self.columns.iter().flatten().next().map_or(0, |column| column.rows())
	}

	/// The physical data stream of one column, `None` for an empty slot.
	pub fn buffer_at(&mut self, position: usize) -> Result<Option<&[u8]>> {
		match self.get_mut(position)? {
			Some(column) => column.buffer().map(Some),
			None => Ok(None),
		}
	}

	pub fn physical_size(&self) -> usize {
		self.columns.iter().flatten().map(|column| column.physical_size()).sum()
	}

	/// Moves the columns of `other` into the empty slots of this group.
	pub fn merge(&mut self, other: Columns) -> Result<()> {
		if other.format != self.format {
			return_error!(column::storage_format_mismatch(&self.format.to_string(), &other.format.to_string()));
		}
		if other.columns.len() != self.columns.len() {
			return_error!(column::column_count_mismatch(self.columns.len(), other.columns.len()));
		}
		if let Some(position) =
			self.columns.iter().zip(&other.columns).position(|(ours, theirs)| ours.is_some() && theirs.is_some())
		{
			return_error!(column::column_slot_occupied(position));
		}

		for (ours, theirs) in self.columns.iter_mut().zip(other.columns) {
			if theirs.is_some() {
				*ours = theirs;
			}
		}
		Ok(())
	}

	/// Writes the streams of every present column into one buffer.
	///
	/// Per column the not null bitmap comes first when the column holds a null,
	/// followed by the lengths stream of variable width columns and the data
	/// stream. The vectorized format pads every stream to [`MEMORY_ALIGN_SIZE`],
	/// data streams only when they are not encoded. The non vectorized format
	/// pads the lengths stream so the data starts at the column alignment.
	#[instrument(name = "column::columns::combine", level = "debug", skip(self), fields(columns = self.columns.len()))]
	pub fn combine(&mut self) -> Result<CombinedBuffer> {
		let vectorized = self.format == StorageFormat::Vectorized;
		let mut data = DataBuffer::<u8>::with_capacity(self.physical_size())?;
		let mut streams = Vec::new();
		let mut encodings = Vec::new();

		for (index, slot) in self.columns.iter_mut().enumerate() {
			let Some(column) = slot.as_mut() else {
				continue;
			};
			let rows = column.rows();
			let non_null = column.non_null_rows();

			if column.has_null() {
				if let Some(bitmap) = column.bitmap() {
					let bytes = &bitmap.as_bytes()[..rows.div_ceil(8)];
					let padding = if vectorized {
						padding_for(bytes.len(), MEMORY_ALIGN_SIZE)
					} else {
						0
					};
					streams.push(write_stream(&mut data, StreamKind::Present, index, rows, bytes, padding)?);
				}
			}

			let align = column.align_size().max(1);
			let lengths_count = if vectorized {
				rows
			} else {
				non_null
			};
			if let Some(lengths) = column.lengths_buffer()? {
				let padding = if vectorized {
					padding_for(lengths.len(), MEMORY_ALIGN_SIZE)
				} else {
					padding_for(data.used() + lengths.len(), align)
				};
				streams.push(write_stream(&mut data, StreamKind::Length, index, lengths_count, lengths, padding)?);
			}

			let kind = column.encoding_kind();
			let buffer = column.buffer()?;
			let padding = if vectorized && kind == ColumnEncodingKind::NoEncoded {
				padding_for(buffer.len(), MEMORY_ALIGN_SIZE)
			} else {
				0
			};
			streams.push(write_stream(&mut data, StreamKind::Data, index, non_null, buffer, padding)?);

			encodings.push(ColumnEncodingInfo {
				column: index,
				kind,
				compress_level: column.compress_level(),
				origin_length: column.origin_length(),
				lengths_kind: column.lengths_encoding_kind(),
				lengths_compress_level: column.lengths_compress_level(),
				lengths_origin_length: column.lengths_origin_length(),
			});
		}

		debug!(bytes = data.used(), streams = streams.len(), "combined {} column group", self.format);
		Ok(CombinedBuffer {
			data,
			streams,
			encodings,
		})
	}
}

fn padding_for(len: usize, align: usize) -> usize {
	len.next_multiple_of(align) - len
}

fn write_stream(
	data: &mut DataBuffer<u8>,
	kind: StreamKind,
	column: usize,
	count: usize,
	bytes: &[u8],
	padding: usize,
) -> Result<StreamInfo> {
	let offset = data.used();
	data.extend_from_slice(bytes)?;
	data.extend_zero(padding)?;
	trace!(?kind, column, offset, len = bytes.len(), padding, "wrote stream");

	Ok(StreamInfo {
		kind,
		column,
		count,
		offset,
		length: bytes.len() + padding,
		padding,
	})
}

#[cfg(test)]
mod tests {
	use pax_core::{Bitmap8, DecodingOptions, EncodingOptions};
	use rand::random;

	use super::*;
	use crate::{FixedColumn, NonFixedColumn};

	fn fixed(format: StorageFormat, kind: ColumnEncodingKind, values: &[Option<i32>]) -> Box<dyn Column> {
		let options = EncodingOptions::new(kind, true).with_compress_level(3);
		let mut column = FixedColumn::<i32>::with_encoding(values.len(), format, options).unwrap();
		for value in values {
			match value {
				Some(value) => column.push(*value).unwrap(),
				None => column.append_null().unwrap(),
			}
		}
		Box::new(column)
	}

	fn non_fixed(format: StorageFormat, values: &[Option<&str>]) -> Box<dyn Column> {
		let options = EncodingOptions::new(ColumnEncodingKind::NoEncoded, false)
			.with_lengths(ColumnEncodingKind::RleV2, 0);
		let mut column = NonFixedColumn::with_encoding(64, format, options).unwrap().with_align_size(4);
		for value in values {
			match value {
				Some(value) => column.append(value.as_bytes()).unwrap(),
				None => column.append_null().unwrap(),
			}
		}
		Box::new(column)
	}

	#[test]
	fn test_push_rejects_other_format() {
		let mut columns = Columns::new(StorageFormat::Vectorized);
		let err = columns.push(fixed(StorageFormat::NonVectorized, ColumnEncodingKind::NoEncoded, &[])).unwrap_err();
		assert_eq!(err.code, "COLUMN_007");
		assert!(columns.is_empty());
	}

	#[test]
	fn test_get_out_of_range() {
		let mut columns = Columns::new(StorageFormat::NonVectorized);
		columns.push_none();
		assert!(columns.get(0).unwrap().is_none());
		assert_eq!(columns.get(1).err().unwrap().code, "COLUMN_005");
		assert_eq!(columns.buffer_at(3).unwrap_err().code, "COLUMN_005");
		assert_eq!(columns.buffer_at(0).unwrap(), None);
	}

	#[test]
	fn test_merge() {
		let format = StorageFormat::NonVectorized;
		let mut left = Columns::new(format);
		left.push(fixed(format, ColumnEncodingKind::NoEncoded, &[Some(1), Some(2)])).unwrap();
		left.push_none();

		let mut right = Columns::new(format);
		right.push_none();
		right.push(non_fixed(format, &[Some("a"), None])).unwrap();

		left.merge(right).unwrap();
		assert_eq!(left.len(), 2);
		assert_eq!(left.get(1).unwrap().unwrap().rows(), 2);
		assert_eq!(left.rows(), 2);
		assert_eq!(left.physical_size(), 8 + 1);

		let mut occupied = Columns::new(format);
		occupied.push(fixed(format, ColumnEncodingKind::NoEncoded, &[Some(3), Some(4)])).unwrap();
		occupied.push_none();
		assert_eq!(left.merge(occupied).unwrap_err().code, "COLUMN_010");

		let mut short = Columns::new(format);
		short.push_none();
		assert_eq!(left.merge(short).unwrap_err().code, "COLUMN_009");
	}

	#[test]
	fn test_combine_non_vectorized() {
		let format = StorageFormat::NonVectorized;
		let mut columns = Columns::new(format);
		columns.push(non_fixed(format, &[Some("abc"), None, Some("de")])).unwrap();
		columns.push_none();
		columns.push(fixed(format, ColumnEncodingKind::NoEncoded, &[Some(7), Some(8), Some(9)])).unwrap();

		let combined = columns.combine().unwrap();
		let kinds: Vec<_> = combined.streams.iter().map(|info| (info.kind, info.column)).collect();
		assert_eq!(
			kinds,
			vec![(StreamKind::Present, 0), (StreamKind::Length, 0), (StreamKind::Data, 0), (StreamKind::Data, 2)]
		);

		// one bitmap byte, then the lengths padded so the data starts at a multiple of four
		let length = combined.streams[1];
		assert_eq!(length.offset, 1);
		assert_eq!(length.count, 2);
		assert_eq!(combined.streams[2].offset, length.offset + length.length);
		assert_eq!(combined.streams[2].offset % 4, 0);
		assert_eq!(combined.stream(&combined.streams[2]), b"abcde");
		assert_eq!(combined.stream(&combined.streams[0]), &[0b101]);

		assert_eq!(combined.encodings.len(), 2);
		assert_eq!(combined.encodings[0].lengths_kind, ColumnEncodingKind::RleV2);
		assert_eq!(combined.encodings[0].origin_length, 5);
		assert_eq!(combined.encodings[1].origin_length, 12);
		assert_eq!(combined.data.used(), combined.streams[3].offset + 12);
	}

	#[test]
	fn test_combine_vectorized_alignment() {
		let format = StorageFormat::Vectorized;
		let mut columns = Columns::new(format);
		columns.push(fixed(format, ColumnEncodingKind::NoEncoded, &[Some(1), None, Some(3)])).unwrap();
		columns.push(non_fixed(format, &[Some("x"), Some("yz"), None])).unwrap();

		let combined = columns.combine().unwrap();
		for info in &combined.streams {
			assert_eq!(info.offset % MEMORY_ALIGN_SIZE, 0, "{:?}", info);
			assert_eq!(info.length % MEMORY_ALIGN_SIZE, 0, "{:?}", info);
		}

		let data = combined.streams_of(0).find(|info| info.kind == StreamKind::Data).unwrap();
		assert_eq!(data.count, 2);
		assert_eq!(data.padding, 4);
		assert_eq!(combined.stream(data), bytemuck::cast_slice::<i32, u8>(&[1, 0, 3]));

		let length = combined.streams_of(1).find(|info| info.kind == StreamKind::Length).unwrap();
		assert_eq!(length.count, 3);
	}

	#[test]
	fn test_encoded_data_is_not_padded() {
		let format = StorageFormat::Vectorized;
		let mut columns = Columns::new(format);
		columns.push(fixed(format, ColumnEncodingKind::RleV2, &[Some(5), Some(5), Some(5)])).unwrap();

		let combined = columns.combine().unwrap();
		assert_eq!(combined.streams.len(), 1);
		assert_eq!(combined.streams[0].padding, 0);
		assert_eq!(combined.encodings[0].kind, ColumnEncodingKind::RleV2);
	}

	#[test]
	fn test_combine_then_read_back() {
		for format in [StorageFormat::NonVectorized, StorageFormat::Vectorized] {
			let ints: Vec<Option<i32>> =
				(0..2000).map(|i| if i % 7 == 0 { None } else { Some(random::<i16>() as i32) }).collect();
			let words: Vec<String> = (0..2000).map(|i| format!("w{}", i % 97)).collect();
			let texts: Vec<Option<&str>> =
				words.iter().enumerate().map(|(i, w)| if i % 5 == 0 { None } else { Some(w.as_str()) }).collect();

			let mut columns = Columns::new(format);
			columns.push(fixed(format, ColumnEncodingKind::CompressZstd, &ints)).unwrap();
			columns.push(non_fixed(format, &texts)).unwrap();
			let combined = columns.combine().unwrap();

			let present = |column: usize| {
				combined
					.streams_of(column)
					.find(|info| info.kind == StreamKind::Present)
					.map(|info| Bitmap8::from_bytes(combined.stream(info), 2000))
			};
			let stream = |column: usize, kind: StreamKind| {
				combined.streams_of(column).find(|info| info.kind == kind).map(|info| combined.stream(info)).unwrap()
			};

			let info = combined.encodings[0];
			let options = DecodingOptions::new(info.kind, true).with_compress_level(info.compress_level);
			let mut read = FixedColumn::<i32>::with_decoding(format, options).unwrap();
			read.set(stream(0, StreamKind::Data), 2000, present(0)).unwrap();
			let expected: Vec<i32> = match format {
				StorageFormat::Vectorized => ints.iter().map(|value| value.unwrap_or(0)).collect(),
				StorageFormat::NonVectorized => ints.iter().flatten().copied().collect(),
			};
			assert_eq!(read.values(), expected.as_slice());
			assert_eq!(read.non_null_rows(), ints.iter().flatten().count());

			let info = combined.encodings[1];
			let options = DecodingOptions::new(info.kind, false)
				.with_compress_level(info.compress_level)
				.with_lengths(info.lengths_kind, info.lengths_compress_level);
			let mut read = NonFixedColumn::with_decoding(format, options).unwrap();
			read.set(
				stream(1, StreamKind::Data),
				stream(1, StreamKind::Length),
				info.origin_length,
				2000,
				present(1),
			)
			.unwrap();
			let expected: Vec<u8> = texts.iter().flatten().flat_map(|text| text.bytes()).collect();
			assert_eq!(read.range_buffer(0, read.lengths().len()).unwrap(), expected.as_slice());
		}
	}
}
