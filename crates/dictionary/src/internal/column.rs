// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeMap;

use reifydb_catalog::HiddenKind;
use reifydb_type::{Charset, ColumnType};

use crate::InstantDefault;

#[derive(Debug, Clone, PartialEq)]
pub struct InternalColumn {
	pub name: String,
	/// Position in the catalog's column order, starting at 1.
	pub ordinal: u32,
	pub ty: ColumnType,
	pub len: u32,
	pub nullable: bool,
	pub unsigned: bool,
	pub charset: Charset,
	pub hidden: HiddenKind,
	pub is_virtual: bool,
	pub system: bool,
	/// Slot in the stored row; `None` for system and virtual columns.
	pub physical_position: Option<u32>,
	pub version_added: Option<u32>,
	pub version_dropped: Option<u32>,
	pub default: InstantDefault,
}

impl InternalColumn {
	pub fn is_dropped(&self) -> bool {
		self.version_dropped.is_some()
	}

	pub fn is_visible(&self) -> bool {
		self.hidden == HiddenKind::Visible && !self.is_dropped()
	}

	pub fn is_instantly_added(&self) -> bool {
		self.version_added.is_some()
	}

	/// Whether a row written under `row_version` stores this column.
	pub fn is_stored_in(&self, row_version: u32) -> bool {
		if self.physical_position.is_none() {
			return false;
		}
		let added = self.version_added.unwrap_or(0);
		let dropped = self.version_dropped.unwrap_or(u32::MAX);
		added <= row_version && row_version < dropped
	}
}

/// Owns a table's columns and answers lookups in both orders: logical (what SQL sees) and
/// physical (how rows are laid out).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnArena {
	columns: Vec<InternalColumn>,
	physical: BTreeMap<u32, usize>,
}

impl ColumnArena {
	pub fn new(mut columns: Vec<InternalColumn>) -> Self {
		columns.sort_by_key(|c| c.ordinal);
		let physical = columns
			.iter()
			.enumerate()
			.filter_map(|(idx, c)| c.physical_position.map(|pos| (pos, idx)))
			.collect();
		Self {
			columns,
			physical,
		}
	}

	pub fn len(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	/// All columns in catalog order, hidden and dropped ones included.
	pub fn iter(&self) -> impl Iterator<Item = &InternalColumn> {
		self.columns.iter()
	}

	pub fn get(&self, name: &str) -> Option<&InternalColumn> {
		self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
	}

	/// Columns visible to SQL in their declared order.
	pub fn logical(&self) -> impl Iterator<Item = &InternalColumn> {
		self.columns.iter().filter(|c| c.is_visible())
	}

	/// Stored columns by ascending slot, dropped ones included.
	pub fn physical(&self) -> impl Iterator<Item = &InternalColumn> {
		self.physical.values().map(|&idx| &self.columns[idx])
	}

	pub fn by_physical(&self, pos: u32) -> Option<&InternalColumn> {
		self.physical.get(&pos).map(|&idx| &self.columns[idx])
	}

	pub fn dropped(&self) -> impl Iterator<Item = &InternalColumn> {
		self.columns.iter().filter(|c| c.is_dropped())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn column(name: &str, ordinal: u32, pos: Option<u32>) -> InternalColumn {
		InternalColumn {
			name: name.to_string(),
			ordinal,
			ty: ColumnType::Int,
			len: 4,
			nullable: true,
			unsigned: false,
			charset: Charset::BINARY,
			hidden: HiddenKind::Visible,
			is_virtual: false,
			system: false,
			physical_position: pos,
			version_added: None,
			version_dropped: None,
			default: InstantDefault::None,
		}
	}

	#[test]
	fn test_logical_and_physical_order_differ() {
		let mut first = column("z", 1, Some(2));
		first.version_added = Some(1);
		let arena = ColumnArena::new(vec![column("b", 3, Some(1)), first, column("a", 2, Some(0))]);

		let logical: Vec<_> = arena.logical().map(|c| c.name.as_str()).collect();
		assert_eq!(logical, ["z", "a", "b"]);
		let physical: Vec<_> = arena.physical().map(|c| c.name.as_str()).collect();
		assert_eq!(physical, ["a", "b", "z"]);
		assert_eq!(arena.by_physical(2).map(|c| c.name.as_str()), Some("z"));
		assert_eq!(arena.get("Z").map(|c| c.ordinal), Some(1));
	}

	#[test]
	fn test_stored_in_row_version() {
		let mut c = column("c", 1, Some(2));
		c.version_added = Some(1);
		c.version_dropped = Some(3);
		assert!(!c.is_stored_in(0));
		assert!(c.is_stored_in(1));
		assert!(c.is_stored_in(2));
		assert!(!c.is_stored_in(3));
		assert!(!column("v", 2, None).is_stored_in(0));
	}
}
