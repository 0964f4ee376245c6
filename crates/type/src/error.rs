// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	fmt::{Display, Formatter},
};

use crate::{SpaceId, TableId};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ObjectKind {
	Table,
	Partition,
	Column,
	Index,
	ForeignKey,
	Tablespace,
}

impl Display for ObjectKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ObjectKind::Table => f.write_str("table"),
			ObjectKind::Partition => f.write_str("partition"),
			ObjectKind::Column => f.write_str("column"),
			ObjectKind::Index => f.write_str("index"),
			ObjectKind::ForeignKey => f.write_str("foreign key"),
			ObjectKind::Tablespace => f.write_str("tablespace"),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{kind} '{name}' not found")]
	NotFound {
		kind: ObjectKind,
		name: String,
	},

	#[error("{kind} '{name}' already exists")]
	AlreadyExists {
		kind: ObjectKind,
		name: String,
	},

	#[error("column '{column}' of table '{table}' conflicts with {existing}")]
	ColumnConflict {
		table: String,
		column: String,
		existing: String,
	},

	#[error("table {table} was renamed concurrently on each of {attempts} open attempts")]
	RenameConflict {
		table: TableId,
		attempts: usize,
	},

	#[error("table '{table}' reached the limit of {limit} instant row versions and must be rebuilt")]
	RowVersionLimit {
		table: String,
		limit: u32,
	},

	#[error("table '{table}' does not match the unified catalog: {detail}")]
	StructuralMismatch {
		table: String,
		detail: String,
	},

	#[error("migration aborted: {} of {total} table(s) failed verification", failures.len())]
	MigrationAborted {
		total: usize,
		failures: Vec<Error>,
	},

	#[error("tablespace {space} of '{table}' is unavailable: {reason}")]
	StorageUnavailable {
		table: String,
		space: SpaceId,
		reason: String,
	},

	#[error("{kind} '{name}' has corrupt metadata: {detail}")]
	Corrupt {
		kind: ObjectKind,
		name: String,
		detail: String,
	},

	#[error("timed out waiting for {mode} metadata lock on '{name}'")]
	LockTimeout {
		name: String,
		mode: &'static str,
	},

	#[error("table '{name}' is still referenced by {references} handle(s)")]
	InUse {
		name: String,
		references: usize,
	},

	#[error("tablespace '{name}' cannot move from {from} to {to}")]
	InvalidState {
		name: String,
		from: String,
		to: String,
	},

	#[error(transparent)]
	Serialization(#[from] serde_json::Error),
}

impl Error {
	pub fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
		Error::NotFound {
			kind,
			name: name.into(),
		}
	}

	pub fn already_exists(kind: ObjectKind, name: impl Into<String>) -> Self {
		Error::AlreadyExists {
			kind,
			name: name.into(),
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Error::NotFound { .. })
	}
}

#[macro_export]
macro_rules! return_error {
	($err:expr) => {
		return Err($err.into())
	};
}

/// Builds an [`Error::Corrupt`]. Debug builds treat corrupt metadata as a broken invariant and
/// panic here; release builds hand the error back to the caller.
#[macro_export]
macro_rules! corrupt {
	($kind:expr, $name:expr, $($arg:tt)*) => {{
		let detail = format!($($arg)*);
		debug_assert!(false, "corrupt {} '{}': {}", $kind, $name, detail);
		$crate::Error::Corrupt {
			kind: $kind,
			name: ($name).to_string(),
			detail,
		}
	}};
}
