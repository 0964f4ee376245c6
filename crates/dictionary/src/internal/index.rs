// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_catalog::{CatalogColumn, IndexElement, IndexKind};
use reifydb_type::{IndexId, PageNo, SpaceId, TableId};
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexField {
	pub column: String,
	/// Slot the field reads from; `None` for system columns.
	pub slot: Option<u32>,
	/// Indexed prefix in bytes, 0 for the whole value.
	pub prefix_len: u32,
	pub descending: bool,
	/// Appended by the engine, e.g. the clustering key of a secondary index.
	pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternalIndex {
	pub id: IndexId,
	pub name: String,
	pub kind: IndexKind,
	pub table: TableId,
	pub space: SpaceId,
	pub root: PageNo,
	pub trx_id: u64,
	pub nulls_equal: bool,
	pub fields: SmallVec<[IndexField; 4]>,
}

impl InternalIndex {
	pub fn is_clustered(&self) -> bool {
		self.kind == IndexKind::Primary
	}

	pub fn is_unique(&self) -> bool {
		self.kind.is_unique()
	}

	/// Fields the index was declared with.
	pub fn user_fields(&self) -> impl Iterator<Item = &IndexField> {
		self.fields.iter().filter(|f| !f.hidden)
	}
}

/// Indexed prefix length of `element`, 0 when the whole column value is indexed.
pub fn key_prefix_length(element: &IndexElement, column: &CatalogColumn) -> u32 {
	match element.length {
		Some(length) if length < column.char_length || column.ty.is_lob() => length,
		_ => 0,
	}
}
