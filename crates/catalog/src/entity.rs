// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_type::{SpaceId, TableId};

use crate::{CatalogPartition, CatalogTable, Properties, QualifiedName};

/// Separator between table and partition name in engine-level names.
const PARTITION_SEPARATOR: &str = "#p#";

/// Something the engine opens as a table: a whole table or one partition of a table.
///
/// Both variants read columns and index definitions from `table`; a partition substitutes its
/// own id, tablespace and index se-private data.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntity {
	pub table: CatalogTable,
	pub kind: EntityKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
	Whole,
	Partition {
		parent: TableId,
		partition: CatalogPartition,
	},
}

impl CatalogEntity {
	pub fn whole(table: CatalogTable) -> Self {
		Self {
			table,
			kind: EntityKind::Whole,
		}
	}

	pub fn partition(table: CatalogTable, partition: CatalogPartition) -> Self {
		Self {
			kind: EntityKind::Partition {
				parent: table.id,
				partition,
			},
			table,
		}
	}

	pub fn id(&self) -> TableId {
		match &self.kind {
			EntityKind::Whole => self.table.id,
			EntityKind::Partition {
				partition,
				..
			} => partition.id,
		}
	}

	/// The name metadata locks are taken on; partitions lock their parent table.
	pub fn lock_name(&self) -> QualifiedName {
		self.table.qualified_name()
	}

	/// The engine-level name, `table#p#partition` for partitions.
	pub fn engine_name(&self) -> QualifiedName {
		match &self.kind {
			EntityKind::Whole => self.table.qualified_name(),
			EntityKind::Partition {
				partition,
				..
			} => QualifiedName::new(
				&self.table.schema,
				format!("{}{}{}", self.table.name, PARTITION_SEPARATOR, partition.name),
			),
		}
	}

	pub fn space(&self) -> SpaceId {
		match &self.kind {
			EntityKind::Whole => self.table.tablespace,
			EntityKind::Partition {
				partition,
				..
			} => partition.tablespace,
		}
	}

	pub fn se_private(&self) -> &Properties {
		match &self.kind {
			EntityKind::Whole => &self.table.se_private,
			EntityKind::Partition {
				partition,
				..
			} => &partition.se_private,
		}
	}

	/// Storage-level se-private data of the index named `index`.
	pub fn index_private(&self, index: &str) -> Option<&Properties> {
		match &self.kind {
			EntityKind::Whole => self.table.index(index).map(|i| &i.se_private),
			EntityKind::Partition {
				partition,
				..
			} => partition.index(index).map(|i| &i.se_private),
		}
	}

	pub fn is_partition(&self) -> bool {
		matches!(self.kind, EntityKind::Partition { .. })
	}
}
