// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! The storage engine's data dictionary.
//!
//! Tables live in the server-wide catalog ([`reifydb_catalog`]) as generic objects with opaque
//! se-private property bags. This crate turns them into [`InternalTable`]s the engine works with,
//! caches them by id and name, binds them to their tablespaces, tracks instantly added and dropped
//! columns across row versions, links foreign keys between cached tables and reconciles a legacy
//! engine catalog with the unified one after an upgrade.

pub use codec::DefaultValueCodec;
pub use config::{DictionaryConfig, DictionaryConfigBuilder};
pub use dictionary::Dictionary;
pub use foreign::{ForeignKeyConstraint, ForeignKeyLoad, ForeignKeyLoader};
pub use internal::{
	ColumnArena, IndexField, InternalColumn, InternalIndex, InternalTable, SpaceBinding, TableKind, TableLayout,
};
pub use private::{ColumnCounters, ColumnPrivate, IndexPrivate, InstantDefault, SpaceState, TablePrivate, TablespacePrivate};
pub use reifydb_type::{Error, Result};
pub use resolve::{TableHandle, TableResolver};
pub use space::{MemoryStorage, OpenStatus, PageStorage, Tablespace, TablespaceResolver, UndoSpaces};
pub use upgrade::{
	AuxiliaryRename, AuxiliaryRenamer, LegacyCatalog, StoreAuxiliaryRenamer, TableReport, UpgradeReconciler,
	UpgradeReport,
};
pub use version::{InstantChange, MAX_ROW_VERSIONS, RowVersionTracker};

mod codec;
mod config;
mod ddl;
mod dictionary;
mod foreign;
pub mod internal;
pub mod private;
mod registry;
mod resolve;
pub mod space;
pub mod test_utils;
pub mod upgrade;
pub mod version;
