// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! DDL drivers. Each statement holds the exclusive metadata lock on the table it changes, writes
//! the catalog, and then brings cached tables in line.

use reifydb_catalog::{CatalogColumn, CatalogTable, MdlGuard, PartitionIndex, Properties, QualifiedName};
use reifydb_type::{Error, IndexId, ObjectKind, PageNo, Result, SpaceId, TableId};
use tracing::{debug, instrument};

use crate::{
	Dictionary, IndexPrivate, InstantChange, RowVersionTracker, TableHandle, TablePrivate, version::assign_initial_layout,
};

/// Root page of the first index in a new data file.
const FIRST_ROOT_PAGE: u32 = 4;

fn index_private(table: TableId, space: SpaceId, position: usize) -> IndexPrivate {
	IndexPrivate {
		id: IndexId((table.0 << 16) | (position as u64 + 1)),
		root: PageNo(FIRST_ROOT_PAGE + position as u32),
		space,
		table,
		trx_id: 0,
		nulls_equal: false,
		extra: Properties::new(),
	}
}

impl Dictionary {
	/// Creates `table`: assigns the initial column layout and index storage, creates data files
	/// and stores the table in the catalog.
	#[instrument(name = "dictionary::ddl::create_table", level = "debug", skip_all, fields(table = %table.qualified_name()))]
	pub fn create_table(&self, mut table: CatalogTable) -> Result<TableId> {
		let name = table.qualified_name();
		let _guard = MdlGuard::exclusive(&*self.locks, &name)?;
		if self.store.acquire_table(&name)?.is_some() {
			return Err(Error::already_exists(ObjectKind::Table, name.to_string()));
		}

		assign_initial_layout(&mut table)?;
		let data_directory = TablePrivate::read(&table.se_private, &name.to_string())?.data_directory;
		let roots: Vec<PageNo> = (0..table.indexes.len()).map(|i| PageNo(FIRST_ROOT_PAGE + i as u32)).collect();

		let (id, space) = (table.id, table.tablespace);
		for (position, index) in table.indexes.iter_mut().enumerate() {
			index_private(id, space, position).write(&mut index.se_private);
		}

		let index_names: Vec<String> = table.indexes.iter().map(|i| i.name.clone()).collect();
		for partition in &mut table.partitions {
			partition.indexes = index_names
				.iter()
				.enumerate()
				.map(|(position, index)| {
					let mut se_private = Properties::new();
					index_private(partition.id, partition.tablespace, position).write(&mut se_private);
					PartitionIndex {
						index: index.clone(),
						se_private,
					}
				})
				.collect();
		}

		if table.partitions.is_empty() {
			self.spaces.create_file(space, &name, data_directory.as_deref(), &roots)?;
		}
		for partition in &table.partitions {
			let engine_name = QualifiedName::new(&name.schema, format!("{}#p#{}", name.name, partition.name));
			self.spaces.create_file(partition.tablespace, &engine_name, data_directory.as_deref(), &roots)?;
		}

		self.store.store_table(table)?;
		debug!(%id, "created table");
		Ok(id)
	}

	pub fn add_columns(&self, name: &QualifiedName, columns: Vec<CatalogColumn>) -> Result<InstantChange> {
		self.alter_columns(name, columns, &[])
	}

	pub fn drop_columns(&self, name: &QualifiedName, columns: &[&str]) -> Result<InstantChange> {
		self.alter_columns(name, vec![], columns)
	}

	/// One instant ALTER TABLE: drops `dropped`, then adds `added`, under a single row-version
	/// bump. Cached copies of the table see the new layout when this returns.
	#[instrument(name = "dictionary::ddl::alter_columns", level = "debug", skip(self, added, dropped), fields(table = %name))]
	pub fn alter_columns(
		&self,
		name: &QualifiedName,
		added: Vec<CatalogColumn>,
		dropped: &[&str],
	) -> Result<InstantChange> {
		let _guard = MdlGuard::exclusive(&*self.locks, name)?;
		let Some(mut table) = self.store.acquire_for_modification(name)? else {
			return Err(Error::not_found(ObjectKind::Table, name.to_string()));
		};

		let mut tracker = RowVersionTracker::new(&mut table)?;
		tracker.begin_drop_columns(dropped)?;
		tracker.begin_add_columns(added)?;
		let change = tracker.finish()?;

		self.store.update_table(table)?;
		self.tables.refresh(name)?;
		Ok(change)
	}

	#[instrument(name = "dictionary::ddl::rename_table", level = "debug", skip(self), fields(from = %from, to = %to))]
	pub fn rename_table(&self, from: &QualifiedName, to: &QualifiedName) -> Result<()> {
		if from == to {
			return Err(Error::already_exists(ObjectKind::Table, to.to_string()));
		}
		// both names, in a fixed order
		let (first, second) = if from < to {
			(from, to)
		} else {
			(to, from)
		};
		let _first = MdlGuard::exclusive(&*self.locks, first)?;
		let _second = MdlGuard::exclusive(&*self.locks, second)?;

		self.store.rename_table(from, to)?;
		self.tables.rename_cached(from, to);

		// links keyed by the old name are rebuilt on the next load
		for table in self.tables.cached() {
			let stale = table.lock_name() == *to
				|| table.foreign_keys().iter().any(|fk| fk.referenced == *from)
				|| table.referenced_by().iter().any(|fk| fk.table == *from);
			if stale {
				table.reset_foreign_keys();
			}
		}
		Ok(())
	}

	/// Drops `name` from the catalog and the cache. Fails with [`Error::InUse`] while handles
	/// to the table or any of its partitions exist.
	#[instrument(name = "dictionary::ddl::drop_table", level = "debug", skip(self), fields(table = %name))]
	pub fn drop_table(&self, name: &QualifiedName) -> Result<()> {
		let _guard = MdlGuard::exclusive(&*self.locks, name)?;
		let Some(table) = self.store.acquire_table(name)? else {
			return Err(Error::not_found(ObjectKind::Table, name.to_string()));
		};

		let evicted = self.tables.evict_under(name)?;
		self.store.drop_table(name)?;

		self.spaces.release(table.tablespace);
		for partition in &table.partitions {
			self.spaces.release(partition.tablespace);
		}
		for cached in self.tables.cached() {
			if cached.foreign_keys().iter().any(|fk| fk.referenced == *name) {
				cached.reset_foreign_keys();
			}
		}
		debug!(evicted = evicted.len(), "dropped table");
		Ok(())
	}

	/// ALTER TABLE ... DISCARD TABLESPACE, for the table or all of its partitions.
	pub fn discard_tablespace(&self, name: &QualifiedName) -> Result<()> {
		let _guard = MdlGuard::exclusive(&*self.locks, name)?;
		for handle in self.open_storage_units(name)? {
			self.spaces.discard(&handle)?;
		}
		Ok(())
	}

	/// ALTER TABLE ... IMPORT TABLESPACE. Returns the new space ids.
	pub fn import_tablespace(&self, name: &QualifiedName) -> Result<Vec<SpaceId>> {
		let _guard = MdlGuard::exclusive(&*self.locks, name)?;
		self.open_storage_units(name)?.iter().map(|handle| self.spaces.import(handle)).collect()
	}

	/// Handles to the entities of `name` that own a data file: its partitions, or the table
	/// itself. The caller holds the exclusive metadata lock.
	fn open_storage_units(&self, name: &QualifiedName) -> Result<Vec<TableHandle>> {
		let Some(table) = self.store.acquire_table(name)? else {
			return Err(Error::not_found(ObjectKind::Table, name.to_string()));
		};
		if table.partitions.is_empty() {
			return Ok(vec![self.tables.open_locked(table.id)?]);
		}
		table.partitions.iter().map(|p| self.tables.open_locked(p.id)).collect()
	}
}
