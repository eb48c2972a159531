// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	fmt::{Display, Formatter},
	ops::{Deref, DerefMut},
};

use serde::{Deserialize, Serialize};

pub mod diagnostic;
mod r#macro;
mod render;

use diagnostic::Diagnostic;
pub use render::DefaultRenderer;

/// The failure classes raised by the codec.
///
/// Every error is fatal for the operation that raised it. Nothing in the codec retries or recovers locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
	/// Allocation failed or a buffer would grow beyond the hard capacity ceiling.
	OutOfMemory,
	/// Encoded input is malformed, truncated or from a foreign format.
	InvalidFormat,
	/// The caller broke an API contract, e.g. requested a placeholder encoding kind.
	LogicError,
	/// A destination is too small or a requested row range is outside the column.
	OutOfRange,
}

impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ErrorKind::OutOfMemory => f.write_str("out of memory"),
			ErrorKind::InvalidFormat => f.write_str("invalid encoded format"),
			ErrorKind::LogicError => f.write_str("logic error"),
			ErrorKind::OutOfRange => f.write_str("out of range"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error(pub Diagnostic);

impl Deref for Error {
	type Target = Diagnostic;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl DerefMut for Error {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.0
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let out = DefaultRenderer::render_string(&self.0);
		f.write_str(out.as_str())
	}
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		self.0.kind
	}

	pub fn diagnostic(self) -> Diagnostic {
		self.0
	}
}

impl std::error::Error for Error {}

impl From<Diagnostic> for Error {
	fn from(diagnostic: Diagnostic) -> Self {
		Error(diagnostic)
	}
}
