// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! The server-wide durable catalog as the storage engine sees it: generically typed tables,
//! columns, indexes, partitions and tablespaces that carry engine data in opaque se-private
//! property bags, plus the interfaces of the collaborators that persist them
//! ([`CatalogStore`]) and serialize access to them by name ([`MetadataLocks`]).

pub use entity::{CatalogEntity, EntityKind};
pub use lock::{LockManager, LockMode, MdlGuard, MdlTicket, MetadataLocks};
pub use name::QualifiedName;
pub use partition::{CatalogPartition, PartitionIndex};
pub use property::Properties;
pub use reifydb_type::{Error, Result};
pub use store::{CatalogStore, MemoryCatalogStore};
pub use table::{
	CatalogColumn, CatalogForeignKey, CatalogIndex, CatalogTable, ForeignKeyRule, GENERATED_CLUSTERED_INDEX,
	HiddenKind, IndexElement, IndexKind, ROLL_PTR_COLUMN, ROW_ID_COLUMN, TRX_ID_COLUMN,
};
pub use tablespace::{CatalogTablespace, TablespaceFile};

mod entity;
pub mod lock;
mod name;
mod partition;
mod property;
pub mod store;
mod table;
mod tablespace;
pub mod test_utils;
