// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Reconciling the legacy engine catalog with the unified catalog after an upgrade.
//!
//! Every legacy table is verified against its unified counterpart, and every write it needs is
//! prepared, before anything is written. A single failure aborts the whole migration and leaves
//! the unified catalog untouched; a write that still fails undoes the writes before it.

pub use apply::{AuxiliaryRename, AuxiliaryRenamer, StoreAuxiliaryRenamer, fts_prefix};
pub use legacy::{
	LegacyCatalog, LegacyColumn, LegacyField, LegacyForeignKey, LegacyIndex, LegacyTable, fk_type, index_type, mtype,
	prtype, translate_rules, type_class,
};
pub use verify::verify_table;

mod apply;
mod legacy;
mod verify;

use reifydb_catalog::{CatalogStore, CatalogTable, QualifiedName};
use reifydb_type::{Error, ObjectKind, Result, TableId};
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
	pub name: QualifiedName,
	pub legacy_id: TableId,
	pub unified_id: TableId,
	pub autoinc: u64,
	pub foreign_keys: usize,
	pub auxiliary_renamed: usize,
	pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeReport {
	pub tables: Vec<TableReport>,
}

impl UpgradeReport {
	pub fn warnings(&self) -> impl Iterator<Item = &str> {
		self.tables.iter().flat_map(|t| t.warnings.iter().map(String::as_str))
	}

	pub fn table(&self, name: &QualifiedName) -> Option<&TableReport> {
		self.tables.iter().find(|t| &t.name == name)
	}
}

pub struct UpgradeReconciler<'a> {
	store: &'a dyn CatalogStore,
	renamer: Box<dyn AuxiliaryRenamer + 'a>,
}

impl<'a> UpgradeReconciler<'a> {
	pub fn new(store: &'a dyn CatalogStore) -> Self {
		Self {
			store,
			renamer: Box::new(StoreAuxiliaryRenamer::new(store)),
		}
	}

	pub fn with_renamer(mut self, renamer: impl AuxiliaryRenamer + 'a) -> Self {
		self.renamer = Box::new(renamer);
		self
	}

	/// Verifies one legacy table, returning its unified counterpart and any warnings.
	pub fn verify(&self, legacy: &LegacyTable) -> Result<(CatalogTable, Vec<String>)> {
		let Some(name) = legacy.qualified_name() else {
			return Err(Error::StructuralMismatch {
				table: legacy.name.clone(),
				detail: "not of the form schema/table".to_string(),
			});
		};
		let Some(unified) = self.store.acquire_table(&name)? else {
			return Err(Error::not_found(ObjectKind::Table, name.to_string()));
		};
		let warnings = verify_table(legacy, &unified)?;
		Ok((unified, warnings))
	}

	#[instrument(name = "dictionary::upgrade::run", level = "info", skip_all, fields(tables = catalog.tables.len()))]
	pub fn run(&self, catalog: &LegacyCatalog) -> Result<UpgradeReport> {
		let mut prepared = Vec::with_capacity(catalog.tables.len());
		let mut failures = vec![];
		for legacy in &catalog.tables {
			let result = self.verify(legacy).and_then(|(unified, warnings)| {
				for warning in &warnings {
					warn!(table = %legacy.name, "{}", warning);
				}
				apply::prepare(legacy, unified, warnings, &*self.renamer)
			});
			match result {
				Ok(table) => prepared.push(table),
				Err(err) => {
					error!(table = %legacy.name, %err, "upgrade verification failed");
					failures.push(err);
				}
			}
		}

		if !failures.is_empty() {
			return Err(Error::MigrationAborted {
				total: catalog.tables.len(),
				failures,
			});
		}

		let report = UpgradeReport {
			tables: apply::write_all(prepared, self.store, &*self.renamer)?,
		};
		info!(tables = report.tables.len(), "legacy catalog reconciled");
		Ok(report)
	}
}
