// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Binding tables to tablespaces.
//!
//! Open tablespaces live in the registry keyed by space id. A table is bound through a weak
//! reference, so evicting a space never leaves a table pointing at freed state. Tablespaces that
//! cannot be opened do not fail the table open: the table is cached with its storage marked
//! unavailable and can be inspected and dropped, but not read or written.

pub use storage::{MemoryStorage, OpenStatus, PageStorage};
pub use tablespace::Tablespace;
pub use undo::{UndoSpace, UndoSpaces};

mod storage;
mod tablespace;
mod undo;

use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use once_cell::sync::Lazy;
use reifydb_catalog::{CatalogEntity, CatalogStore, CatalogTable, CatalogTablespace, Properties, QualifiedName};
use reifydb_type::{Error, ObjectKind, PageNo, Result, SpaceId};
use tracing::{debug, instrument, warn};

use crate::{
	DictionaryConfig, IndexPrivate, InternalTable, SpaceBinding, SpaceState, TableKind, TablePrivate, TablespacePrivate,
	internal::build_layout, registry::Registry,
};

struct ResidentSpace {
	id: SpaceId,
	name: &'static str,
	path: PathBuf,
}

/// Spaces that are open for the whole lifetime of the dictionary.
static RESIDENT_SPACES: Lazy<Vec<ResidentSpace>> = Lazy::new(|| {
	vec![
		ResidentSpace {
			id: SpaceId::SYSTEM,
			name: "innodb_system",
			path: PathBuf::from("ibdata1"),
		},
		ResidentSpace {
			id: SpaceId::DICTIONARY,
			name: "mysql",
			path: PathBuf::from("mysql.ibd"),
		},
		ResidentSpace {
			id: SpaceId::TEMPORARY,
			name: "innodb_temporary",
			path: PathBuf::from("ibtmp1"),
		},
	]
});

/// Tablespace name of a file-per-table space: `schema/table`.
pub fn file_per_table_name(name: &QualifiedName) -> String {
	format!("{}/{}", name.schema, name.name)
}

pub struct TablespaceResolver {
	registry: Arc<Registry>,
	store: Arc<dyn CatalogStore>,
	storage: Arc<dyn PageStorage>,
	undo: UndoSpaces,
	data_dir: PathBuf,
	validate_root_pages: bool,
}

impl TablespaceResolver {
	pub(crate) fn new(
		registry: Arc<Registry>,
		store: Arc<dyn CatalogStore>,
		storage: Arc<dyn PageStorage>,
		config: &DictionaryConfig,
	) -> Self {
		Self {
			registry,
			store,
			storage,
			undo: UndoSpaces::new(),
			data_dir: config.data_dir.clone(),
			validate_root_pages: config.validate_root_pages,
		}
	}

	pub(crate) fn init(&self) {
		let mut registry = self.registry.lock();
		for resident in RESIDENT_SPACES.iter() {
			registry.spaces.entry(resident.id).or_insert_with(|| {
				Arc::new(Tablespace::new(resident.id, resident.name, 0, resident.path.clone(), SpaceState::Normal))
			});
			registry.paths.insert(resident.id, resident.path.clone());
		}
	}

	/// Closes every non-resident space.
	pub(crate) fn shutdown(&self) {
		let closed: Vec<SpaceId> = {
			let mut registry = self.registry.lock();
			let ids: Vec<SpaceId> = registry.spaces.keys().copied().filter(|id| !id.is_resident()).collect();
			for id in &ids {
				registry.spaces.remove(id);
			}
			ids
		};
		for id in closed {
			self.storage.close(id);
		}
	}

	pub fn lookup(&self, id: SpaceId) -> Option<Arc<Tablespace>> {
		self.registry.lock().spaces.get(&id).cloned()
	}

	pub fn lookup_by_name(&self, name: &str) -> Option<Arc<Tablespace>> {
		self.registry.lock().spaces.values().find(|s| s.name() == name).cloned()
	}

	pub fn undo(&self) -> &UndoSpaces {
		&self.undo
	}

	/// Default location of a file-per-table data file.
	pub fn default_path(&self, name: &QualifiedName, data_directory: Option<&str>) -> PathBuf {
		let root = data_directory.map(Path::new).unwrap_or(self.data_dir.as_path());
		root.join(&name.schema).join(format!("{}.ibd", name.name))
	}

	/// Binds `table` to the space of `entity`, opening the space if this is its first user.
	#[instrument(name = "dictionary::space::bind", level = "debug", skip(self, entity, table), fields(table = %entity.engine_name(), space = %entity.space()))]
	pub(crate) fn bind(&self, entity: &CatalogEntity, table: &InternalTable) -> Result<()> {
		let space_id = entity.space();
		if space_id.is_resident() {
			match self.lookup(space_id) {
				Some(space) => table.bind(SpaceBinding::Bound(Arc::downgrade(&space))),
				None => table.bind(SpaceBinding::Unavailable("resident tablespace is not registered".to_string())),
			}
			return Ok(());
		}

		let engine_name = entity.engine_name();
		let private = TablePrivate::read(entity.se_private(), &engine_name.to_string())?;
		let catalog_space = self.store.acquire_tablespace_by_id(space_id)?;
		let space_private = match &catalog_space {
			Some(space) => TablespacePrivate::read(&space.se_private, &space.name)?,
			None => TablespacePrivate::default(),
		};

		if private.discarded || space_private.state == SpaceState::Discarded {
			debug!("tablespace is discarded");
			table.bind(SpaceBinding::Discarded);
			return Ok(());
		}

		let expected_name =
			catalog_space.as_ref().map(|s| s.name.clone()).unwrap_or_else(|| file_per_table_name(&engine_name));

		let (open, remembered) = {
			let registry = self.registry.lock();
			(registry.spaces.get(&space_id).cloned(), registry.paths.get(&space_id).cloned())
		};
		if let Some(open) = open {
			if open.name() != expected_name {
				debug!(from = %open.name(), to = %expected_name, "relabelling open tablespace");
				open.set_name(expected_name);
			}
			return self.finish_bind(table, &open);
		}

		let path = remembered
			.or_else(|| catalog_space.as_ref().and_then(|s| s.first_file()).map(PathBuf::from))
			.unwrap_or_else(|| self.default_path(&engine_name, private.data_directory.as_deref()));

		let status = self.storage.open(space_id, &path, space_private.flags);
		if status != OpenStatus::Opened {
			warn!(path = %path.display(), %status, "tablespace could not be opened");
			table.bind(SpaceBinding::Unavailable(status.to_string()));
			return Ok(());
		}

		let space = {
			let mut registry = self.registry.lock();
			registry.paths.insert(space_id, path.clone());
			registry
				.spaces
				.entry(space_id)
				.or_insert_with(|| {
					Arc::new(Tablespace::new(space_id, expected_name, space_private.flags, path, SpaceState::Normal))
				})
				.clone()
		};
		self.finish_bind(table, &space)
	}

	fn finish_bind(&self, table: &InternalTable, space: &Arc<Tablespace>) -> Result<()> {
		if self.validate_root_pages {
			let missing = table
				.layout()
				.indexes
				.iter()
				.find(|i| i.root == PageNo::NULL || !self.storage.has_page(space.id(), i.root))
				.map(|i| (i.name.clone(), i.root));
			if let Some((index, root)) = missing {
				warn!(%index, %root, "index root page is missing");
				table.bind(SpaceBinding::Unavailable(format!("root page {} of index '{}' is missing", root, index)));
				return Ok(());
			}
		}
		table.bind(SpaceBinding::Bound(Arc::downgrade(space)));
		Ok(())
	}

	/// Creates the file-per-table data file of a new table or partition named `name` and records
	/// it in the catalog. Spaces that already exist (resident or general) are left alone.
	pub(crate) fn create_file(
		&self,
		space: SpaceId,
		name: &QualifiedName,
		data_directory: Option<&str>,
		roots: &[PageNo],
	) -> Result<()> {
		if space.is_resident() || self.store.acquire_tablespace_by_id(space)?.is_some() {
			return Ok(());
		}
		let path = self.default_path(name, data_directory);
		self.storage.create(space, &path, 0, roots)?;

		let mut tablespace = CatalogTablespace::new(space, file_per_table_name(name), path.display().to_string());
		TablespacePrivate::default().write(&mut tablespace.se_private);
		self.store.store_tablespace(tablespace)
	}

	/// Forgets a space no table uses any more.
	pub(crate) fn release(&self, space: SpaceId) {
		if space.is_resident() {
			return;
		}
		let removed = {
			let mut registry = self.registry.lock();
			registry.paths.remove(&space);
			registry.spaces.remove(&space)
		};
		if removed.is_some() {
			self.storage.close(space);
		}
	}

	/// Detaches `table` from its data file. The caller holds the exclusive metadata lock.
	#[instrument(name = "dictionary::space::discard", level = "debug", skip(self, table), fields(table = %table.name()))]
	pub(crate) fn discard(&self, table: &InternalTable) -> Result<()> {
		let space_id = table.space_id();
		let name = table.name().to_string();
		if space_id.is_resident() {
			return Err(Error::InvalidState {
				name,
				from: "resident".to_string(),
				to: SpaceState::Discarded.to_string(),
			});
		}

		let mut catalog = self.acquire_catalog(table)?;
		let props = entity_private_mut(&mut catalog, table)?;
		let mut private = TablePrivate::read(props, &name)?;
		if private.discarded {
			return Err(Error::InvalidState {
				name,
				from: SpaceState::Discarded.to_string(),
				to: SpaceState::Discarded.to_string(),
			});
		}
		private.discarded = true;
		private.write(props);
		self.store.update_table(catalog)?;

		if let Some(mut space) = self.store.acquire_tablespace_by_id(space_id)? {
			self.write_state(&mut space, SpaceState::Discarded)?;
			self.store.update_tablespace(space)?;
		}

		let removed = self.registry.lock().spaces.remove(&space_id);
		if let Some(space) = removed {
			space.set_state(SpaceState::Discarded);
			self.storage.close(space_id);
		}
		table.bind(SpaceBinding::Discarded);
		debug!(space = %space_id, "discarded tablespace");
		Ok(())
	}

	/// Attaches a discarded table to a data file again. The space gets a fresh id above every id
	/// in use; the table, its indexes and the catalog tablespace are moved to it.
	#[instrument(name = "dictionary::space::import", level = "debug", skip(self, table), fields(table = %table.name()))]
	pub(crate) fn import(&self, table: &InternalTable) -> Result<SpaceId> {
		let old_id = table.space_id();
		let name = table.name().to_string();

		let mut catalog = self.acquire_catalog(table)?;
		let private = TablePrivate::read(entity_private_mut(&mut catalog, table)?, &name)?;
		if !private.discarded {
			return Err(Error::InvalidState {
				name,
				from: SpaceState::Normal.to_string(),
				to: SpaceState::Normal.to_string(),
			});
		}

		let catalog_space = self.store.acquire_tablespace_by_id(old_id)?;
		let flags = match &catalog_space {
			Some(space) => TablespacePrivate::read(&space.se_private, &space.name)?.flags,
			None => 0,
		};
		let remembered = self.registry.lock().paths.get(&old_id).cloned();
		let path = catalog_space
			.as_ref()
			.and_then(|s| s.first_file())
			.map(PathBuf::from)
			.or(remembered)
			.unwrap_or_else(|| self.default_path(&table.name(), private.data_directory.as_deref()));

		let new_id = self.allocate_space_id()?;
		let status = self.storage.open(new_id, &path, flags);
		if status != OpenStatus::Opened {
			return Err(Error::StorageUnavailable {
				table: name,
				space: new_id,
				reason: status.to_string(),
			});
		}

		retarget(&mut catalog, table, new_id, &name)?;
		self.store.update_table(catalog.clone())?;
		let space_name = match catalog_space {
			Some(mut space) => {
				space.id = new_id;
				self.write_state(&mut space, SpaceState::Normal)?;
				let space_name = space.name.clone();
				self.store.update_tablespace(space)?;
				space_name
			}
			None => file_per_table_name(&table.name()),
		};

		let space = Arc::new(Tablespace::new(new_id, space_name, flags, path.clone(), SpaceState::Normal));
		{
			let mut registry = self.registry.lock();
			registry.paths.remove(&old_id);
			registry.paths.insert(new_id, path);
			registry.spaces.insert(new_id, space.clone());
		}

		let entity = entity_for(catalog, table)?;
		table.replace_layout(build_layout(&entity)?);
		table.set_space_id(new_id);
		self.finish_bind(table, &space)?;
		debug!(from = %old_id, to = %new_id, "imported tablespace");
		Ok(new_id)
	}

	/// Moves an undo space to `to` and records the state in the catalog, if the catalog knows it.
	pub fn set_undo_state(&self, id: SpaceId, to: SpaceState) -> Result<()> {
		self.undo.transition(id, to)?;
		if let Some(mut space) = self.store.acquire_tablespace_by_id(id)? {
			self.write_state(&mut space, to)?;
			self.store.update_tablespace(space)?;
		}
		Ok(())
	}

	fn allocate_space_id(&self) -> Result<SpaceId> {
		let cached = self.registry.lock().max_space_id();
		let stored = self.store.max_space_id()?;
		Ok(SpaceId(cached.max(stored).0 + 1))
	}

	fn acquire_catalog(&self, table: &InternalTable) -> Result<CatalogTable> {
		let lock_name = table.lock_name();
		self.store
			.acquire_for_modification(&lock_name)?
			.ok_or_else(|| Error::not_found(ObjectKind::Table, lock_name.to_string()))
	}

	fn write_state(&self, space: &mut CatalogTablespace, state: SpaceState) -> Result<()> {
		let mut private = TablespacePrivate::read(&space.se_private, &space.name)?;
		private.state = state;
		private.write(&mut space.se_private);
		Ok(())
	}
}

/// The se-private bag of the entity `table` was built from.
fn entity_private_mut<'a>(catalog: &'a mut CatalogTable, table: &InternalTable) -> Result<&'a mut Properties> {
	match table.kind() {
		TableKind::Whole => Ok(&mut catalog.se_private),
		TableKind::Partition {
			..
		} => catalog
			.partitions
			.iter_mut()
			.find(|p| p.id == table.id())
			.map(|p| &mut p.se_private)
			.ok_or_else(|| Error::not_found(ObjectKind::Partition, table.name().to_string())),
	}
}

fn retarget(catalog: &mut CatalogTable, table: &InternalTable, space: SpaceId, name: &str) -> Result<()> {
	let props = entity_private_mut(catalog, table)?;
	let mut private = TablePrivate::read(props, name)?;
	private.discarded = false;
	private.write(props);

	let index_bags: Vec<&mut Properties> = match table.kind() {
		TableKind::Whole => {
			catalog.tablespace = space;
			catalog.indexes.iter_mut().map(|i| &mut i.se_private).collect()
		}
		TableKind::Partition {
			..
		} => {
			let Some(partition) = catalog.partitions.iter_mut().find(|p| p.id == table.id()) else {
				return Err(Error::not_found(ObjectKind::Partition, name.to_string()));
			};
			partition.tablespace = space;
			partition.indexes.iter_mut().map(|i| &mut i.se_private).collect()
		}
	};
	for props in index_bags {
		let mut private = IndexPrivate::read(props, name)?;
		private.space = space;
		private.write(props);
	}
	Ok(())
}

pub(crate) fn entity_for(catalog: CatalogTable, table: &InternalTable) -> Result<CatalogEntity> {
	match table.kind() {
		TableKind::Whole => Ok(CatalogEntity::whole(catalog)),
		TableKind::Partition {
			..
		} => {
			let Some(partition) = catalog.partition(table.id()).cloned() else {
				return Err(Error::not_found(ObjectKind::Partition, table.name().to_string()));
			};
			Ok(CatalogEntity::partition(catalog, partition))
		}
	}
}
