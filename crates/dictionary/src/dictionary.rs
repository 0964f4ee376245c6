// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use reifydb_catalog::{CatalogStore, LockManager, MetadataLocks, QualifiedName};
use reifydb_type::{Error, Result, TableId};
use tracing::{debug, instrument};

use crate::{
	DictionaryConfig, ForeignKeyLoader, LegacyCatalog, PageStorage, TableHandle, TableResolver, TablespaceResolver,
	UpgradeReconciler, UpgradeReport, registry::Registry,
};

/// Entry point of the data dictionary: the table cache, the space registry and the DDL drivers
/// over one catalog store.
pub struct Dictionary {
	pub(crate) config: DictionaryConfig,
	pub(crate) store: Arc<dyn CatalogStore>,
	pub(crate) locks: Arc<dyn MetadataLocks>,
	pub(crate) registry: Arc<Registry>,
	pub(crate) spaces: Arc<TablespaceResolver>,
	pub(crate) tables: TableResolver,
}

impl Dictionary {
	pub fn new(
		config: DictionaryConfig,
		store: Arc<dyn CatalogStore>,
		locks: Arc<dyn MetadataLocks>,
		storage: Arc<dyn PageStorage>,
	) -> Self {
		let registry = Arc::new(Registry::new());
		let spaces = Arc::new(TablespaceResolver::new(registry.clone(), store.clone(), storage, &config));
		spaces.init();
		let tables = TableResolver::new(
			registry.clone(),
			store.clone(),
			locks.clone(),
			spaces.clone(),
			config.rename_retry_limit,
		);

		Self {
			config,
			store,
			locks,
			registry,
			spaces,
			tables,
		}
	}

	/// A dictionary with its own in-process lock manager, honouring the configured wait timeout.
	pub fn with_lock_manager(config: DictionaryConfig, store: Arc<dyn CatalogStore>, storage: Arc<dyn PageStorage>) -> Self {
		let locks = Arc::new(LockManager::new().with_wait_timeout(config.lock_wait_timeout));
		Self::new(config, store, locks, storage)
	}

	pub fn config(&self) -> &DictionaryConfig {
		&self.config
	}

	pub fn tables(&self) -> &TableResolver {
		&self.tables
	}

	pub fn spaces(&self) -> &TablespaceResolver {
		&self.spaces
	}

	pub fn store(&self) -> &dyn CatalogStore {
		&*self.store
	}

	pub fn open_by_id(&self, id: TableId) -> Result<TableHandle> {
		let handle = self.tables.open_by_id(id)?;
		self.link_foreign_keys(&handle)?;
		Ok(handle)
	}

	pub fn open_by_name(&self, name: &QualifiedName) -> Result<TableHandle> {
		let handle = self.tables.open_by_name(name)?;
		self.link_foreign_keys(&handle)?;
		Ok(handle)
	}

	pub fn close(&self, id: TableId) -> Result<bool> {
		self.tables.close(id)
	}

	pub fn foreign_keys(&self) -> ForeignKeyLoader<'_> {
		ForeignKeyLoader::new(&self.tables, &*self.store)
	}

	/// Reconciles a legacy catalog with this dictionary's store.
	pub fn upgrade(&self, legacy: &LegacyCatalog) -> Result<UpgradeReport> {
		UpgradeReconciler::new(&*self.store).run(legacy)
	}

	/// Empties the table cache and closes every non-resident space. Fails with
	/// [`Error::InUse`] while any handle is alive.
	#[instrument(name = "dictionary::shutdown", level = "debug", skip(self))]
	pub fn shutdown(&self) -> Result<()> {
		{
			let mut registry = self.registry.lock();
			if let Some(table) = registry.tables.values().find(|t| t.references() > 0) {
				return Err(Error::InUse {
					name: table.name().to_string(),
					references: table.references(),
				});
			}
			debug!(tables = registry.tables.len(), "evicting table cache");
			registry.tables.clear();
			registry.names.clear();
		}
		self.spaces.shutdown();
		Ok(())
	}

	fn link_foreign_keys(&self, handle: &TableHandle) -> Result<()> {
		if self.config.load_foreign_keys && !handle.foreign_keys_loaded() {
			self.foreign_keys().load(handle)?;
		}
		Ok(())
	}
}
