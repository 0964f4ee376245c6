// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{ops::Deref, path::PathBuf, sync::Arc};

use reifydb_catalog::{CatalogStore, CatalogTable, LockManager, MemoryCatalogStore, QualifiedName};
use reifydb_type::TableId;

use crate::{Dictionary, DictionaryConfig, MemoryStorage};

pub const TEST_DATA_DIR: &str = "/data";

/// A dictionary over in-memory collaborators, with the collaborators kept at hand so tests can
/// inspect or change them behind the dictionary's back.
pub struct TestDictionary {
	pub dictionary: Dictionary,
	pub store: Arc<MemoryCatalogStore>,
	pub locks: Arc<LockManager>,
	pub storage: Arc<MemoryStorage>,
}

impl TestDictionary {
	pub fn new() -> Self {
		Self::with_config(DictionaryConfig::builder().data_dir(TEST_DATA_DIR).build())
	}

	pub fn with_config(config: DictionaryConfig) -> Self {
		Self::with_store(config, MemoryCatalogStore::new())
	}

	pub fn with_store(config: DictionaryConfig, store: MemoryCatalogStore) -> Self {
		let store = Arc::new(store);
		let locks = Arc::new(LockManager::new().with_wait_timeout(config.lock_wait_timeout));
		let storage = Arc::new(MemoryStorage::new());
		let dictionary = Dictionary::new(config, store.clone(), locks.clone(), storage.clone());
		Self {
			dictionary,
			store,
			locks,
			storage,
		}
	}

	pub fn create(&self, table: CatalogTable) -> TableId {
		self.dictionary.create_table(table).unwrap()
	}

	/// The stored catalog copy of `schema.name`.
	pub fn stored(&self, schema: &str, name: &str) -> CatalogTable {
		self.store.acquire_table(&QualifiedName::new(schema, name)).unwrap().expect("table not found")
	}

	pub fn data_file(&self, schema: &str, name: &str) -> PathBuf {
		self.dictionary.spaces().default_path(&QualifiedName::new(schema, name), None)
	}
}

impl Default for TestDictionary {
	fn default() -> Self {
		Self::new()
	}
}

impl Deref for TestDictionary {
	type Target = Dictionary;

	fn deref(&self) -> &Self::Target {
		&self.dictionary
	}
}

pub fn name(schema: &str, table: &str) -> QualifiedName {
	QualifiedName::new(schema, table)
}
