// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Interface of the durable catalog. The dictionary shapes what is persisted through these
//! calls but never writes bytes itself.

pub use memory::{MemoryCatalogStore, NameLookupInterceptor};
use reifydb_type::{Result, SpaceId, TableId};

use crate::{CatalogPartition, CatalogTable, CatalogTablespace, QualifiedName};

mod memory;

pub trait CatalogStore: Send + Sync {
	fn acquire_table(&self, name: &QualifiedName) -> Result<Option<CatalogTable>>;

	fn acquire_table_by_id(&self, id: TableId) -> Result<Option<CatalogTable>>;

	/// Resolves the name currently bound to a whole-table id.
	fn table_name_by_id(&self, id: TableId) -> Result<Option<QualifiedName>>;

	/// Resolves a partition id to its parent table and the partition itself.
	fn acquire_partition_by_id(&self, id: TableId) -> Result<Option<(CatalogTable, CatalogPartition)>>;

	/// Returns a copy intended to be changed and written back with [`CatalogStore::update_table`].
	fn acquire_for_modification(&self, name: &QualifiedName) -> Result<Option<CatalogTable>> {
		self.acquire_table(name)
	}

	fn store_table(&self, table: CatalogTable) -> Result<()>;

	fn update_table(&self, table: CatalogTable) -> Result<()>;

	fn rename_table(&self, from: &QualifiedName, to: &QualifiedName) -> Result<()>;

	fn drop_table(&self, name: &QualifiedName) -> Result<()>;

	fn list_tables(&self) -> Result<Vec<QualifiedName>>;

	/// Child-table index: tables holding a foreign key that references `name`.
	fn list_referencing_tables(&self, name: &QualifiedName) -> Result<Vec<QualifiedName>>;

	fn acquire_tablespace(&self, name: &str) -> Result<Option<CatalogTablespace>>;

	fn acquire_tablespace_by_id(&self, id: SpaceId) -> Result<Option<CatalogTablespace>>;

	fn store_tablespace(&self, tablespace: CatalogTablespace) -> Result<()>;

	/// Replaces the tablespace with the same name; the id may change (import).
	fn update_tablespace(&self, tablespace: CatalogTablespace) -> Result<()>;

	/// Highest engine space id known to the catalog, [`SpaceId::SYSTEM`] if none.
	fn max_space_id(&self) -> Result<SpaceId>;
}
