// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_catalog::{CatalogForeignKey, CatalogStore, CatalogTable, QualifiedName};
use reifydb_type::{Error, ObjectKind, Result, TableId};
use tracing::{debug, error, instrument};

use super::{TableReport, legacy::LegacyTable};
use crate::TablePrivate;

/// One full-text auxiliary table moving from the legacy to the unified id prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryRename {
	pub from: QualifiedName,
	pub to: QualifiedName,
}

/// Renames the auxiliary tables a table's full-text indexes keep, whose names embed the table id.
pub trait AuxiliaryRenamer {
	/// Lists the renames `table` needs without performing any of them.
	fn plan(&self, table: &QualifiedName, legacy: TableId, unified: TableId) -> Result<Vec<AuxiliaryRename>>;

	fn rename(&self, from: &QualifiedName, to: &QualifiedName) -> Result<()>;
}

/// Name prefix of the full-text auxiliary tables of table `id`.
pub fn fts_prefix(id: TableId) -> String {
	format!("FTS_{:016x}_", id.0)
}

/// Renames auxiliary tables through the catalog store.
pub struct StoreAuxiliaryRenamer<'a> {
	store: &'a dyn CatalogStore,
}

impl<'a> StoreAuxiliaryRenamer<'a> {
	pub fn new(store: &'a dyn CatalogStore) -> Self {
		Self {
			store,
		}
	}
}

impl AuxiliaryRenamer for StoreAuxiliaryRenamer<'_> {
	fn plan(&self, table: &QualifiedName, legacy: TableId, unified: TableId) -> Result<Vec<AuxiliaryRename>> {
		if legacy == unified {
			return Ok(vec![]);
		}
		let from = fts_prefix(legacy);
		let to = fts_prefix(unified);

		let existing = self.store.list_tables()?;
		let mut renames = vec![];
		for name in &existing {
			if name.schema != table.schema {
				continue;
			}
			let Some(rest) = name.name.strip_prefix(&from) else {
				continue;
			};
			let target = QualifiedName::new(&name.schema, format!("{}{}", to, rest));
			if existing.contains(&target) {
				return Err(Error::already_exists(ObjectKind::Table, target.to_string()));
			}
			renames.push(AuxiliaryRename {
				from: name.clone(),
				to: target,
			});
		}
		renames.sort_by(|a, b| a.from.cmp(&b.from));
		Ok(renames)
	}

	fn rename(&self, from: &QualifiedName, to: &QualifiedName) -> Result<()> {
		self.store.rename_table(from, to)?;
		debug!(%from, %to, "renamed full-text auxiliary table");
		Ok(())
	}
}

/// The writes one verified table needs, computed before anything is written.
pub(crate) struct Prepared {
	original: CatalogTable,
	updated: CatalogTable,
	renames: Vec<AuxiliaryRename>,
	report: TableReport,
}

/// Carries the legacy state that survives the upgrade into a copy of the verified unified table.
#[instrument(name = "dictionary::upgrade::prepare", level = "debug", skip_all, fields(table = %unified.qualified_name()))]
pub(crate) fn prepare(
	legacy: &LegacyTable,
	unified: CatalogTable,
	warnings: Vec<String>,
	renamer: &dyn AuxiliaryRenamer,
) -> Result<Prepared> {
	let name = unified.qualified_name();
	let mut updated = unified.clone();

	let mut private = TablePrivate::read(&updated.se_private, &name.to_string())?;
	private.autoinc = legacy.autoinc;
	private.write(&mut updated.se_private);

	for fk in &legacy.foreign_keys {
		let (update_rule, delete_rule) = fk.rules();
		let constraint = fk.constraint_name();
		match updated.foreign_keys.iter_mut().find(|f| f.name.eq_ignore_ascii_case(constraint)) {
			Some(existing) => {
				existing.update_rule = update_rule;
				existing.delete_rule = delete_rule;
			}
			None => {
				let Some(referenced) = QualifiedName::from_legacy(&fk.referenced_table) else {
					return Err(Error::StructuralMismatch {
						table: name.to_string(),
						detail: format!("foreign key '{}' references malformed table name", fk.id),
					});
				};
				updated.foreign_keys.push(CatalogForeignKey {
					name: constraint.to_string(),
					columns: fk.for_columns.clone(),
					referenced_schema: referenced.schema,
					referenced_table: referenced.name,
					referenced_columns: fk.referenced_columns.clone(),
					update_rule,
					delete_rule,
				});
			}
		}
	}

	let renames = if updated.has_fulltext_index() {
		renamer.plan(&name, legacy.id, updated.id)?
	} else {
		vec![]
	};

	let report = TableReport {
		name,
		legacy_id: legacy.id,
		unified_id: updated.id,
		autoinc: legacy.autoinc,
		foreign_keys: legacy.foreign_keys.len(),
		auxiliary_renamed: renames.len(),
		warnings,
	};
	Ok(Prepared {
		original: unified,
		updated,
		renames,
		report,
	})
}

/// Writes every prepared table. A failing write undoes the writes before it.
pub(crate) fn write_all(
	prepared: Vec<Prepared>,
	store: &dyn CatalogStore,
	renamer: &dyn AuxiliaryRenamer,
) -> Result<Vec<TableReport>> {
	let mut updated: Vec<CatalogTable> = vec![];
	let mut renamed: Vec<&AuxiliaryRename> = vec![];

	let result = (|| -> Result<()> {
		for table in &prepared {
			store.update_table(table.updated.clone())?;
			updated.push(table.original.clone());
			for rename in &table.renames {
				renamer.rename(&rename.from, &rename.to)?;
				renamed.push(rename);
			}
		}
		Ok(())
	})();

	if let Err(err) = result {
		error!(%err, tables = updated.len(), renames = renamed.len(), "upgrade write failed, rolling back");
		for rename in renamed.into_iter().rev() {
			if let Err(undo) = renamer.rename(&rename.to, &rename.from) {
				error!(from = %rename.to, to = %rename.from, %undo, "could not restore auxiliary table name");
			}
		}
		for original in updated.into_iter().rev() {
			let name = original.qualified_name();
			if let Err(undo) = store.update_table(original) {
				error!(table = %name, %undo, "could not restore table");
			}
		}
		return Err(err);
	}

	Ok(prepared.into_iter().map(|p| p.report).collect())
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use reifydb_catalog::{CatalogColumn, IndexElement, IndexKind, MemoryCatalogStore, test_utils::TableBuilder};
	use reifydb_type::ColumnType;

	use super::*;
	use crate::upgrade::legacy::LegacyTable;

	fn docs(id: u64) -> CatalogTable {
		TableBuilder::new("shop", "docs", id)
			.int("id")
			.column(CatalogColumn::new("body", ColumnType::Text))
			.primary_key(&["id"])
			.index("ft_body", IndexKind::Fulltext, vec![IndexElement::new("body")])
			.build()
	}

	fn legacy(id: u64, autoinc: u64) -> LegacyTable {
		LegacyTable {
			id: TableId(id),
			name: "shop/docs".to_string(),
			columns: vec![],
			indexes: vec![],
			autoinc,
			foreign_keys: vec![],
		}
	}

	/// Fails the rename of `fail_on`, and records every rename it performs.
	struct FailingRenamer<'a> {
		inner: StoreAuxiliaryRenamer<'a>,
		fail_on: QualifiedName,
		done: RefCell<Vec<(QualifiedName, QualifiedName)>>,
	}

	impl AuxiliaryRenamer for FailingRenamer<'_> {
		fn plan(&self, table: &QualifiedName, legacy: TableId, unified: TableId) -> Result<Vec<AuxiliaryRename>> {
			self.inner.plan(table, legacy, unified)
		}

		fn rename(&self, from: &QualifiedName, to: &QualifiedName) -> Result<()> {
			if from == &self.fail_on {
				return Err(Error::not_found(ObjectKind::Table, from.to_string()));
			}
			self.inner.rename(from, to)?;
			self.done.borrow_mut().push((from.clone(), to.clone()));
			Ok(())
		}
	}

	#[test]
	fn test_plan_refuses_taken_target() {
		let store = MemoryCatalogStore::new();
		store.store_table(docs(7)).unwrap();
		let aux = format!("{}CONFIG", fts_prefix(TableId(100)));
		let taken = format!("{}CONFIG", fts_prefix(TableId(7)));
		store.store_table(TableBuilder::new("shop", &aux, 200).int("k").build()).unwrap();
		store.store_table(TableBuilder::new("shop", &taken, 201).int("k").build()).unwrap();

		let renamer = StoreAuxiliaryRenamer::new(&store);
		let err = renamer.plan(&QualifiedName::new("shop", "docs"), TableId(100), TableId(7)).unwrap_err();
		assert!(matches!(err, Error::AlreadyExists { .. }));
	}

	#[test]
	fn test_failed_write_is_rolled_back() {
		let store = MemoryCatalogStore::new();
		store.store_table(docs(7)).unwrap();
		let first = QualifiedName::new("shop", format!("{}BEING_DELETED", fts_prefix(TableId(100))));
		let second = QualifiedName::new("shop", format!("{}CONFIG", fts_prefix(TableId(100))));
		store.store_table(TableBuilder::new("shop", &first.name, 200).int("k").build()).unwrap();
		store.store_table(TableBuilder::new("shop", &second.name, 201).int("k").build()).unwrap();
		let before = store.to_json().unwrap();

		let renamer = FailingRenamer {
			inner: StoreAuxiliaryRenamer::new(&store),
			fail_on: second.clone(),
			done: RefCell::new(vec![]),
		};
		let prepared = prepare(&legacy(100, 9), docs(7), vec![], &renamer).unwrap();
		assert_eq!(prepared.report.auxiliary_renamed, 2);

		let err = write_all(vec![prepared], &store, &renamer).unwrap_err();
		assert!(err.is_not_found());
		// the first rename went through and was undone
		assert_eq!(renamer.done.borrow().len(), 2);
		assert_eq!(store.to_json().unwrap(), before);
	}
}
