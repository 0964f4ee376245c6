// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc, Weak,
	atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

use parking_lot::{RwLock, RwLockReadGuard};
use reifydb_catalog::QualifiedName;
use reifydb_type::{Error, Result, SpaceId, TableId};

use crate::{ColumnArena, ColumnCounters, ForeignKeyConstraint, InternalColumn, InternalIndex, Tablespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
	Whole,
	Partition {
		parent: TableId,
	},
}

/// Columns, indexes and counters of a table. Replaced as a whole when instant DDL changes the
/// layout of a cached table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
	pub columns: ColumnArena,
	pub indexes: Vec<InternalIndex>,
	pub counters: ColumnCounters,
}

impl TableLayout {
	pub fn clustered_index(&self) -> Option<&InternalIndex> {
		self.indexes.iter().find(|i| i.is_clustered())
	}

	pub fn index(&self, name: &str) -> Option<&InternalIndex> {
		self.indexes.iter().find(|i| i.name.eq_ignore_ascii_case(name))
	}
}

/// Where a table's data lives. The table never owns its tablespace: the space registry does,
/// and a table that outlives an evicted space sees [`SpaceBinding::Bound`] fail to upgrade.
#[derive(Debug, Clone, Default)]
pub enum SpaceBinding {
	#[default]
	Unbound,
	Bound(Weak<Tablespace>),
	Discarded,
	Unavailable(String),
}

/// The engine's in-memory form of a table or partition.
#[derive(Debug)]
pub struct InternalTable {
	id: TableId,
	kind: TableKind,
	name: RwLock<QualifiedName>,
	lock_name: RwLock<QualifiedName>,
	space: RwLock<SpaceId>,
	layout: RwLock<TableLayout>,
	binding: RwLock<SpaceBinding>,
	foreign: RwLock<Vec<Arc<ForeignKeyConstraint>>>,
	referenced: RwLock<Vec<Arc<ForeignKeyConstraint>>>,
	foreign_keys_loaded: AtomicBool,
	refs: AtomicUsize,
	autoinc: AtomicU64,
}

impl InternalTable {
	pub fn new(
		id: TableId,
		kind: TableKind,
		name: QualifiedName,
		lock_name: QualifiedName,
		space: SpaceId,
		layout: TableLayout,
		autoinc: u64,
	) -> Self {
		Self {
			id,
			kind,
			name: RwLock::new(name),
			lock_name: RwLock::new(lock_name),
			space: RwLock::new(space),
			layout: RwLock::new(layout),
			binding: RwLock::new(SpaceBinding::Unbound),
			foreign: RwLock::new(vec![]),
			referenced: RwLock::new(vec![]),
			foreign_keys_loaded: AtomicBool::new(false),
			refs: AtomicUsize::new(0),
			autoinc: AtomicU64::new(autoinc),
		}
	}

	pub fn id(&self) -> TableId {
		self.id
	}

	pub fn kind(&self) -> TableKind {
		self.kind
	}

	pub fn is_partition(&self) -> bool {
		matches!(self.kind, TableKind::Partition { .. })
	}

	/// Engine-level name, `table#p#partition` for partitions.
	pub fn name(&self) -> QualifiedName {
		self.name.read().clone()
	}

	/// Name metadata locks are taken on.
	pub fn lock_name(&self) -> QualifiedName {
		self.lock_name.read().clone()
	}

	pub fn space_id(&self) -> SpaceId {
		*self.space.read()
	}

	pub fn layout(&self) -> RwLockReadGuard<'_, TableLayout> {
		self.layout.read()
	}

	pub fn counters(&self) -> ColumnCounters {
		self.layout.read().counters
	}

	pub fn row_version(&self) -> u32 {
		self.layout.read().counters.row_version
	}

	pub fn column(&self, name: &str) -> Option<InternalColumn> {
		self.layout.read().columns.get(name).cloned()
	}

	pub fn binding(&self) -> SpaceBinding {
		self.binding.read().clone()
	}

	pub fn tablespace(&self) -> Option<Arc<Tablespace>> {
		match &*self.binding.read() {
			SpaceBinding::Bound(space) => space.upgrade(),
			_ => None,
		}
	}

	pub fn is_storage_available(&self) -> bool {
		self.tablespace().is_some()
	}

	/// The bound tablespace, or [`Error::StorageUnavailable`] for tables that can be inspected
	/// but not read or written.
	pub fn require_storage(&self) -> Result<Arc<Tablespace>> {
		let reason = match &*self.binding.read() {
			SpaceBinding::Bound(space) => match space.upgrade() {
				Some(space) => return Ok(space),
				None => "tablespace was closed".to_string(),
			},
			SpaceBinding::Unbound => "not bound to a tablespace".to_string(),
			SpaceBinding::Discarded => "tablespace is discarded".to_string(),
			SpaceBinding::Unavailable(reason) => reason.clone(),
		};
		Err(Error::StorageUnavailable {
			table: self.name().to_string(),
			space: self.space_id(),
			reason,
		})
	}

	/// Live handles to this table.
	pub fn references(&self) -> usize {
		self.refs.load(Ordering::Acquire)
	}

	pub fn autoinc(&self) -> u64 {
		self.autoinc.load(Ordering::Acquire)
	}

	/// Raises the auto-increment counter to at least `value`.
	pub fn observe_autoinc(&self, value: u64) {
		self.autoinc.fetch_max(value, Ordering::AcqRel);
	}

	pub fn foreign_keys(&self) -> Vec<Arc<ForeignKeyConstraint>> {
		self.foreign.read().clone()
	}

	/// Constraints of other tables (or this one) referencing this table.
	pub fn referenced_by(&self) -> Vec<Arc<ForeignKeyConstraint>> {
		self.referenced.read().clone()
	}

	pub fn foreign_keys_loaded(&self) -> bool {
		self.foreign_keys_loaded.load(Ordering::Acquire)
	}

	pub(crate) fn acquire_ref(&self) {
		self.refs.fetch_add(1, Ordering::AcqRel);
	}

	pub(crate) fn release_ref(&self) {
		let previous = self.refs.fetch_sub(1, Ordering::AcqRel);
		debug_assert!(previous > 0, "table {} released more often than acquired", self.id);
	}

	pub(crate) fn bind(&self, binding: SpaceBinding) {
		*self.binding.write() = binding;
	}

	pub(crate) fn set_space_id(&self, space: SpaceId) {
		*self.space.write() = space;
	}

	pub(crate) fn replace_layout(&self, layout: TableLayout) {
		*self.layout.write() = layout;
	}

	pub(crate) fn rename(&self, name: QualifiedName, lock_name: QualifiedName) {
		*self.name.write() = name;
		*self.lock_name.write() = lock_name;
	}

	pub(crate) fn add_foreign_key(&self, constraint: Arc<ForeignKeyConstraint>) {
		add_unique(&mut self.foreign.write(), constraint);
	}

	pub(crate) fn add_referenced_by(&self, constraint: Arc<ForeignKeyConstraint>) {
		add_unique(&mut self.referenced.write(), constraint);
	}

	pub(crate) fn mark_foreign_keys_loaded(&self) {
		self.foreign_keys_loaded.store(true, Ordering::Release);
	}

	/// Forgets all foreign-key links so the next load re-reads them.
	pub(crate) fn reset_foreign_keys(&self) {
		self.foreign.write().clear();
		self.referenced.write().clear();
		self.foreign_keys_loaded.store(false, Ordering::Release);
	}
}

fn add_unique(set: &mut Vec<Arc<ForeignKeyConstraint>>, constraint: Arc<ForeignKeyConstraint>) {
	if !set.iter().any(|c| c.table == constraint.table && c.name == constraint.name) {
		set.push(constraint);
	}
}
