// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use parking_lot::{Mutex, MutexGuard};
use reifydb_catalog::QualifiedName;
use reifydb_type::{SpaceId, TableId};

use crate::{InternalTable, TableHandle, Tablespace};

/// The dictionary's catalog lock. One mutex covers the table cache and the space registry; it is
/// only ever held for in-memory bookkeeping, never across catalog-store calls or lock waits.
#[derive(Default)]
pub(crate) struct Registry {
	state: Mutex<RegistryState>,
}

#[derive(Default)]
pub(crate) struct RegistryState {
	pub tables: HashMap<TableId, Arc<InternalTable>>,
	/// Engine name to id.
	pub names: HashMap<QualifiedName, TableId>,
	pub spaces: HashMap<SpaceId, Arc<Tablespace>>,
	/// Paths of spaces that were open once, reused when they are opened again.
	pub paths: HashMap<SpaceId, PathBuf>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn lock(&self) -> MutexGuard<'_, RegistryState> {
		self.state.lock()
	}
}

impl RegistryState {
	pub fn acquire(&self, id: TableId) -> Option<TableHandle> {
		self.tables.get(&id).map(|table| TableHandle::new(table.clone()))
	}

	pub fn acquire_by_name(&self, name: &QualifiedName) -> Option<TableHandle> {
		self.names.get(name).and_then(|id| self.acquire(*id))
	}

	/// Caches `table` unless a concurrent open got there first, in which case the cached table
	/// wins and `table` is dropped.
	pub fn insert(&mut self, table: Arc<InternalTable>) -> TableHandle {
		if let Some(existing) = self.acquire(table.id()) {
			return existing;
		}
		self.names.insert(table.name(), table.id());
		self.tables.insert(table.id(), table.clone());
		TableHandle::new(table)
	}

	pub fn remove(&mut self, id: TableId) -> Option<Arc<InternalTable>> {
		let table = self.tables.remove(&id)?;
		let name = table.name();
		if self.names.get(&name) == Some(&id) {
			self.names.remove(&name);
		}
		Some(table)
	}

	/// Tables whose metadata lock name is `name`: the table itself and its cached partitions.
	pub fn locked_by(&self, name: &QualifiedName) -> Vec<Arc<InternalTable>> {
		self.tables.values().filter(|t| &t.lock_name() == name).cloned().collect()
	}

	pub fn max_space_id(&self) -> SpaceId {
		self.spaces.keys().copied().filter(|id| !id.is_resident() && !id.is_undo()).max().unwrap_or(SpaceId::SYSTEM)
	}
}
