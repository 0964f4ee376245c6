// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::{BTreeMap, HashMap},
	sync::Arc,
};

use parking_lot::RwLock;
use reifydb_type::{Error, ObjectKind, Result, SpaceId, TableId, return_error};
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::{CatalogPartition, CatalogStore, CatalogTable, CatalogTablespace, QualifiedName};

/// Invoked after `table_name_by_id` answered, outside the store lock. Lets a caller commit a
/// concurrent change at the exact point a resolver has looked a name up.
pub type NameLookupInterceptor = Arc<dyn Fn(&MemoryCatalogStore, TableId) + Send + Sync>;

/// In-process durable catalog. Every call observes a committed state; there are no
/// transactions.
#[derive(Default)]
pub struct MemoryCatalogStore {
	state: RwLock<StoreState>,
	interceptor: RwLock<Option<NameLookupInterceptor>>,
}

#[derive(Default)]
struct StoreState {
	tables: BTreeMap<QualifiedName, CatalogTable>,
	table_ids: HashMap<TableId, QualifiedName>,
	partition_ids: HashMap<TableId, QualifiedName>,
	tablespaces: BTreeMap<String, CatalogTablespace>,
	space_ids: HashMap<SpaceId, String>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
	tables: Vec<CatalogTable>,
	tablespaces: Vec<CatalogTablespace>,
}

impl StoreState {
	fn index_table(&mut self, table: &CatalogTable) {
		let name = table.qualified_name();
		self.table_ids.insert(table.id, name.clone());
		for partition in &table.partitions {
			self.partition_ids.insert(partition.id, name.clone());
		}
	}

	fn unindex_table(&mut self, table: &CatalogTable) {
		self.table_ids.remove(&table.id);
		for partition in &table.partitions {
			self.partition_ids.remove(&partition.id);
		}
	}
}

impl MemoryCatalogStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn intercept_name_lookup(&self, interceptor: NameLookupInterceptor) {
		*self.interceptor.write() = Some(interceptor);
	}

	pub fn clear_interceptor(&self) {
		*self.interceptor.write() = None;
	}

	pub fn to_json(&self) -> Result<String> {
		let state = self.state.read();
		let snapshot = Snapshot {
			tables: state.tables.values().cloned().collect(),
			tablespaces: state.tablespaces.values().cloned().collect(),
		};
		Ok(serde_json::to_string_pretty(&snapshot)?)
	}

	pub fn from_json(json: &str) -> Result<Self> {
		let snapshot: Snapshot = serde_json::from_str(json)?;
		let store = Self::new();
		for tablespace in snapshot.tablespaces {
			store.store_tablespace(tablespace)?;
		}
		for table in snapshot.tables {
			store.store_table(table)?;
		}
		Ok(store)
	}
}

impl CatalogStore for MemoryCatalogStore {
	fn acquire_table(&self, name: &QualifiedName) -> Result<Option<CatalogTable>> {
		Ok(self.state.read().tables.get(name).cloned())
	}

	fn acquire_table_by_id(&self, id: TableId) -> Result<Option<CatalogTable>> {
		let state = self.state.read();
		Ok(state.table_ids.get(&id).and_then(|name| state.tables.get(name)).cloned())
	}

	fn table_name_by_id(&self, id: TableId) -> Result<Option<QualifiedName>> {
		let result = self.state.read().table_ids.get(&id).cloned();
		let interceptor = self.interceptor.read().clone();
		if let Some(interceptor) = interceptor {
			interceptor(self, id);
		}
		Ok(result)
	}

	fn acquire_partition_by_id(&self, id: TableId) -> Result<Option<(CatalogTable, CatalogPartition)>> {
		let state = self.state.read();
		let Some(table) = state.partition_ids.get(&id).and_then(|name| state.tables.get(name)) else {
			return Ok(None);
		};
		Ok(table.partition(id).map(|partition| (table.clone(), partition.clone())))
	}

	#[instrument(name = "catalog::store::store_table", level = "trace", skip(self, table), fields(table = %table.qualified_name()))]
	fn store_table(&self, table: CatalogTable) -> Result<()> {
		let mut state = self.state.write();
		let name = table.qualified_name();
		if state.tables.contains_key(&name) {
			return_error!(Error::already_exists(ObjectKind::Table, name.to_string()));
		}
		if state.table_ids.contains_key(&table.id) || state.partition_ids.contains_key(&table.id) {
			return_error!(Error::already_exists(ObjectKind::Table, format!("id {}", table.id)));
		}
		state.index_table(&table);
		state.tables.insert(name, table);
		Ok(())
	}

	#[instrument(name = "catalog::store::update_table", level = "trace", skip(self, table), fields(table = %table.qualified_name()))]
	fn update_table(&self, table: CatalogTable) -> Result<()> {
		let mut state = self.state.write();
		let name = table.qualified_name();
		let Some(previous) = state.tables.remove(&name) else {
			return_error!(Error::not_found(ObjectKind::Table, name.to_string()));
		};
		state.unindex_table(&previous);
		state.index_table(&table);
		state.tables.insert(name, table);
		Ok(())
	}

	#[instrument(name = "catalog::store::rename_table", level = "trace", skip(self))]
	fn rename_table(&self, from: &QualifiedName, to: &QualifiedName) -> Result<()> {
		let mut state = self.state.write();
		if state.tables.contains_key(to) {
			return_error!(Error::already_exists(ObjectKind::Table, to.to_string()));
		}
		let Some(mut table) = state.tables.remove(from) else {
			return_error!(Error::not_found(ObjectKind::Table, from.to_string()));
		};
		table.schema = to.schema.clone();
		table.name = to.name.clone();
		state.index_table(&table);
		state.tables.insert(to.clone(), table);
		trace!(%from, %to, "renamed table");
		Ok(())
	}

	fn drop_table(&self, name: &QualifiedName) -> Result<()> {
		let mut state = self.state.write();
		let Some(table) = state.tables.remove(name) else {
			return_error!(Error::not_found(ObjectKind::Table, name.to_string()));
		};
		state.unindex_table(&table);
		Ok(())
	}

	fn list_tables(&self) -> Result<Vec<QualifiedName>> {
		Ok(self.state.read().tables.keys().cloned().collect())
	}

	fn list_referencing_tables(&self, name: &QualifiedName) -> Result<Vec<QualifiedName>> {
		let state = self.state.read();
		Ok(state.tables
			.values()
			.filter(|t| t.foreign_keys.iter().any(|fk| &fk.referenced_name() == name))
			.map(|t| t.qualified_name())
			.collect())
	}

	fn acquire_tablespace(&self, name: &str) -> Result<Option<CatalogTablespace>> {
		Ok(self.state.read().tablespaces.get(name).cloned())
	}

	fn acquire_tablespace_by_id(&self, id: SpaceId) -> Result<Option<CatalogTablespace>> {
		let state = self.state.read();
		Ok(state.space_ids.get(&id).and_then(|name| state.tablespaces.get(name)).cloned())
	}

	fn store_tablespace(&self, tablespace: CatalogTablespace) -> Result<()> {
		let mut state = self.state.write();
		if state.tablespaces.contains_key(&tablespace.name) || state.space_ids.contains_key(&tablespace.id) {
			return_error!(Error::already_exists(ObjectKind::Tablespace, tablespace.name));
		}
		state.space_ids.insert(tablespace.id, tablespace.name.clone());
		state.tablespaces.insert(tablespace.name.clone(), tablespace);
		Ok(())
	}

	fn update_tablespace(&self, tablespace: CatalogTablespace) -> Result<()> {
		let mut state = self.state.write();
		let Some(previous) = state.tablespaces.remove(&tablespace.name) else {
			return_error!(Error::not_found(ObjectKind::Tablespace, tablespace.name));
		};
		state.space_ids.remove(&previous.id);
		state.space_ids.insert(tablespace.id, tablespace.name.clone());
		state.tablespaces.insert(tablespace.name.clone(), tablespace);
		Ok(())
	}

	fn max_space_id(&self) -> Result<SpaceId> {
		let state = self.state.read();
		let from_spaces = state.space_ids.keys().copied();
		let from_tables = state
			.tables
			.values()
			.flat_map(|t| std::iter::once(t.tablespace).chain(t.partitions.iter().map(|p| p.tablespace)));
		Ok(from_spaces
			.chain(from_tables)
			.filter(|id| !id.is_resident() && !id.is_undo())
			.max()
			.unwrap_or(SpaceId::SYSTEM))
	}
}
