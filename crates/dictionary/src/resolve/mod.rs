// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Opening tables through the cache.
//!
//! A cache miss reads the catalog under a shared metadata lock on the table's name. Opening by
//! id has to learn that name first, and a rename can commit between the lookup and the lock: the
//! resolver then drops the lock it holds on the stale name and starts over.

pub use handle::TableHandle;

mod handle;

use std::sync::Arc;

use reifydb_catalog::{CatalogEntity, CatalogStore, MdlGuard, MetadataLocks, QualifiedName};
use reifydb_type::{Error, ObjectKind, Result, TableId};
use tracing::{debug, instrument};

use crate::{
	InternalTable, TablespaceResolver,
	internal::{build_layout, build_table},
	registry::Registry,
};

pub struct TableResolver {
	registry: Arc<Registry>,
	store: Arc<dyn CatalogStore>,
	locks: Arc<dyn MetadataLocks>,
	spaces: Arc<TablespaceResolver>,
	rename_retry_limit: Option<usize>,
}

impl TableResolver {
	pub(crate) fn new(
		registry: Arc<Registry>,
		store: Arc<dyn CatalogStore>,
		locks: Arc<dyn MetadataLocks>,
		spaces: Arc<TablespaceResolver>,
		rename_retry_limit: Option<usize>,
	) -> Self {
		Self {
			registry,
			store,
			locks,
			spaces,
			rename_retry_limit,
		}
	}

	/// Opens the table or partition with engine id `id`.
	#[instrument(name = "dictionary::resolve::open_by_id", level = "debug", skip(self))]
	pub fn open_by_id(&self, id: TableId) -> Result<TableHandle> {
		let mut attempts = 0;
		loop {
			if let Some(handle) = self.registry.lock().acquire(id) {
				return Ok(handle);
			}

			let Some(bound) = self.lock_name_of(id)? else {
				return Err(Error::not_found(ObjectKind::Table, format!("id {}", id)));
			};

			let guard = MdlGuard::shared(&*self.locks, &bound)?;
			if let Some(handle) = self.registry.lock().acquire(id) {
				return Ok(handle);
			}

			let Some(entity) = self.fetch_entity(id)? else {
				return Err(Error::not_found(ObjectKind::Table, format!("id {}", id)));
			};

			if entity.lock_name() != bound {
				drop(guard);
				attempts += 1;
				debug!(%bound, current = %entity.lock_name(), attempts, "table renamed while opening");
				if self.rename_retry_limit.is_some_and(|limit| attempts >= limit) {
					return Err(Error::RenameConflict {
						table: id,
						attempts,
					});
				}
				continue;
			}

			let handle = self.load(&entity)?;
			drop(guard);
			return Ok(handle);
		}
	}

	/// Opens a whole table by name.
	#[instrument(name = "dictionary::resolve::open_by_name", level = "debug", skip(self), fields(table = %name))]
	pub fn open_by_name(&self, name: &QualifiedName) -> Result<TableHandle> {
		if let Some(handle) = self.registry.lock().acquire_by_name(name) {
			return Ok(handle);
		}

		let _guard = MdlGuard::shared(&*self.locks, name)?;
		if let Some(handle) = self.registry.lock().acquire_by_name(name) {
			return Ok(handle);
		}

		let Some(table) = self.store.acquire_table(name)? else {
			return Err(Error::not_found(ObjectKind::Table, name.to_string()));
		};
		self.load(&CatalogEntity::whole(table))
	}

	/// A cached table by engine name, without touching the catalog.
	pub fn lookup_cached(&self, name: &QualifiedName) -> Option<TableHandle> {
		self.registry.lock().acquire_by_name(name)
	}

	pub fn is_cached(&self, id: TableId) -> bool {
		self.registry.lock().tables.contains_key(&id)
	}

	pub fn cached_count(&self) -> usize {
		self.registry.lock().tables.len()
	}

	/// Evicts table `id` from the cache. Fails with [`Error::InUse`] while handles to it exist;
	/// returns whether the table was cached.
	#[instrument(name = "dictionary::resolve::close", level = "debug", skip(self))]
	pub fn close(&self, id: TableId) -> Result<bool> {
		let mut registry = self.registry.lock();
		let Some(table) = registry.tables.get(&id) else {
			return Ok(false);
		};
		let references = table.references();
		if references > 0 {
			return Err(Error::InUse {
				name: table.name().to_string(),
				references,
			});
		}
		registry.remove(id);
		Ok(true)
	}

	/// Opens table `id` for a caller that already holds the exclusive metadata lock on its name.
	pub(crate) fn open_locked(&self, id: TableId) -> Result<TableHandle> {
		if let Some(handle) = self.registry.lock().acquire(id) {
			return Ok(handle);
		}
		let Some(entity) = self.fetch_entity(id)? else {
			return Err(Error::not_found(ObjectKind::Table, format!("id {}", id)));
		};
		self.load(&entity)
	}

	/// Evicts every cached table locked under `name`, all or nothing.
	pub(crate) fn evict_under(&self, name: &QualifiedName) -> Result<Vec<Arc<InternalTable>>> {
		let mut registry = self.registry.lock();
		let tables = registry.locked_by(name);
		if let Some(table) = tables.iter().find(|t| t.references() > 0) {
			return Err(Error::InUse {
				name: table.name().to_string(),
				references: table.references(),
			});
		}
		for table in &tables {
			registry.remove(table.id());
		}
		Ok(tables)
	}

	/// Snapshot of the cached tables.
	pub(crate) fn cached(&self) -> Vec<Arc<InternalTable>> {
		self.registry.lock().tables.values().cloned().collect()
	}

	/// Cached tables locked under `name`: the table and any cached partitions of it.
	pub(crate) fn cached_under(&self, name: &QualifiedName) -> Vec<Arc<InternalTable>> {
		self.registry.lock().locked_by(name)
	}

	/// Rebuilds the layout of cached tables locked under `name` from the catalog. The caller holds
	/// the exclusive metadata lock.
	pub(crate) fn refresh(&self, name: &QualifiedName) -> Result<()> {
		let cached = self.cached_under(name);
		if cached.is_empty() {
			return Ok(());
		}
		let Some(catalog) = self.store.acquire_table(name)? else {
			return Err(Error::not_found(ObjectKind::Table, name.to_string()));
		};
		for table in cached {
			let entity = crate::space::entity_for(catalog.clone(), &table)?;
			table.replace_layout(build_layout(&entity)?);
		}
		Ok(())
	}

	/// Moves cached tables locked under `from` to `to`. The caller holds both exclusive locks.
	pub(crate) fn rename_cached(&self, from: &QualifiedName, to: &QualifiedName) {
		let mut registry = self.registry.lock();
		for table in registry.locked_by(from) {
			let old = table.name();
			let new = QualifiedName::new(&to.schema, old.name.replacen(&from.name, &to.name, 1));
			registry.names.remove(&old);
			registry.names.insert(new.clone(), table.id());
			table.rename(new, to.clone());
		}
	}

	fn lock_name_of(&self, id: TableId) -> Result<Option<QualifiedName>> {
		if let Some(name) = self.store.table_name_by_id(id)? {
			return Ok(Some(name));
		}
		Ok(self.store.acquire_partition_by_id(id)?.map(|(table, _)| table.qualified_name()))
	}

	fn fetch_entity(&self, id: TableId) -> Result<Option<CatalogEntity>> {
		if let Some(table) = self.store.acquire_table_by_id(id)? {
			return Ok(Some(CatalogEntity::whole(table)));
		}
		Ok(self.store.acquire_partition_by_id(id)?.map(|(table, partition)| CatalogEntity::partition(table, partition)))
	}

	/// Builds, binds and caches `entity`. Runs under the shared metadata lock; the catalog lock
	/// is only taken for the final insert.
	fn load(&self, entity: &CatalogEntity) -> Result<TableHandle> {
		let table = build_table(entity)?;
		self.spaces.bind(entity, &table)?;
		let handle = self.registry.lock().insert(Arc::new(table));
		debug!(table = %handle.name(), id = %handle.id(), "cached table");
		Ok(handle)
	}
}
