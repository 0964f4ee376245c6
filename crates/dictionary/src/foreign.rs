// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Linking foreign keys between cached tables.
//!
//! Loading the constraints of one table pulls in the tables it references, and then the tables
//! that reference it. Both walks use an explicit worklist with a visited set; the catalog may
//! contain reference cycles.

use std::{
	collections::{HashSet, VecDeque},
	sync::Arc,
};

use reifydb_catalog::{CatalogStore, CatalogTable, ForeignKeyRule, QualifiedName};
use reifydb_type::{Error, ObjectKind, Result, corrupt};
use tracing::{debug, instrument, warn};

use crate::{InternalTable, TableHandle, TableResolver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyConstraint {
	pub name: String,
	/// The referencing table.
	pub table: QualifiedName,
	pub columns: Vec<String>,
	pub referenced: QualifiedName,
	pub referenced_columns: Vec<String>,
	pub update_rule: ForeignKeyRule,
	pub delete_rule: ForeignKeyRule,
}

impl ForeignKeyConstraint {
	pub fn is_self_referencing(&self) -> bool {
		self.table == self.referenced
	}
}

/// Tables visited by one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignKeyLoad {
	pub loaded: Vec<QualifiedName>,
	/// Referencing tables that could not be loaded, with the reason.
	pub failed: Vec<(QualifiedName, String)>,
}

pub struct ForeignKeyLoader<'a> {
	tables: &'a TableResolver,
	store: &'a dyn CatalogStore,
}

impl<'a> ForeignKeyLoader<'a> {
	pub fn new(tables: &'a TableResolver, store: &'a dyn CatalogStore) -> Self {
		Self {
			tables,
			store,
		}
	}

	#[instrument(name = "dictionary::foreign::load", level = "debug", skip_all, fields(table = %table.name()))]
	pub fn load(&self, table: &TableHandle) -> Result<ForeignKeyLoad> {
		let mut report = ForeignKeyLoad::default();
		let mut visited = HashSet::new();
		let mut pending = VecDeque::new();

		let name = table.lock_name();
		visited.insert(name.clone());
		self.load_one(table, &visited, &mut pending)?;
		report.loaded.push(name.clone());

		// referenced tables: their constraints must resolve for this table to be usable
		while let Some(next) = pending.pop_front() {
			if !visited.insert(next.clone()) {
				continue;
			}
			match self.tables.open_by_name(&next) {
				Ok(handle) => {
					self.load_one(&handle, &visited, &mut pending)?;
					report.loaded.push(next);
				}
				Err(err) if err.is_not_found() => {
					warn!(table = %next, "referenced table does not exist");
				}
				Err(err) => return Err(err),
			}
		}

		// referencing tables: best effort
		let mut children: VecDeque<QualifiedName> = self.store.list_referencing_tables(&name)?.into();
		while let Some(next) = children.pop_front() {
			if !visited.insert(next.clone()) {
				continue;
			}
			let result = self.tables.open_by_name(&next).and_then(|handle| self.load_one(&handle, &visited, &mut children));
			match result {
				Ok(()) => report.loaded.push(next),
				Err(err) => {
					warn!(table = %next, %err, "could not load foreign keys of referencing table");
					report.failed.push((next, err.to_string()));
				}
			}
		}

		debug!(loaded = report.loaded.len(), failed = report.failed.len(), "foreign keys loaded");
		Ok(report)
	}

	/// Registers the constraints of `table` on it and on every cached table they touch. Names of
	/// referenced tables that are not cached yet are queued in `pending`.
	fn load_one(
		&self,
		table: &InternalTable,
		visited: &HashSet<QualifiedName>,
		pending: &mut VecDeque<QualifiedName>,
	) -> Result<()> {
		if table.foreign_keys_loaded() {
			return Ok(());
		}
		if table.is_partition() {
			table.mark_foreign_keys_loaded();
			return Ok(());
		}

		let name = table.lock_name();
		let Some(catalog) = self.store.acquire_table(&name)? else {
			return Err(Error::not_found(ObjectKind::Table, name.to_string()));
		};

		for constraint in constraints_of(&catalog, table)? {
			let constraint = Arc::new(constraint);
			table.add_foreign_key(constraint.clone());

			if constraint.is_self_referencing() {
				table.add_referenced_by(constraint);
				continue;
			}
			match self.tables.lookup_cached(&constraint.referenced) {
				Some(parent) => parent.add_referenced_by(constraint),
				None => {
					if !visited.contains(&constraint.referenced) && !pending.contains(&constraint.referenced) {
						pending.push_back(constraint.referenced.clone());
					}
				}
			}
		}

		// children cached before this table could not link to it
		for child in self.tables.cached() {
			if child.id() == table.id() {
				continue;
			}
			for constraint in child.foreign_keys() {
				if constraint.referenced == name {
					table.add_referenced_by(constraint);
				}
			}
		}

		table.mark_foreign_keys_loaded();
		Ok(())
	}
}

fn constraints_of(catalog: &CatalogTable, table: &InternalTable) -> Result<Vec<ForeignKeyConstraint>> {
	let name = catalog.qualified_name();
	let layout = table.layout();
	catalog.foreign_keys
		.iter()
		.map(|fk| {
			if fk.columns.is_empty() || fk.columns.len() != fk.referenced_columns.len() {
				return Err(corrupt!(
					ObjectKind::ForeignKey,
					format!("{}.{}", name, fk.name),
					"{} columns reference {} columns",
					fk.columns.len(),
					fk.referenced_columns.len()
				));
			}
			if let Some(missing) = fk.columns.iter().find(|c| layout.columns.get(c).filter(|c| !c.is_dropped()).is_none()) {
				return Err(corrupt!(
					ObjectKind::ForeignKey,
					format!("{}.{}", name, fk.name),
					"references unknown column '{}'",
					missing
				));
			}
			Ok(ForeignKeyConstraint {
				name: fk.name.clone(),
				table: name.clone(),
				columns: fk.columns.clone(),
				referenced: fk.referenced_name(),
				referenced_columns: fk.referenced_columns.clone(),
				update_rule: fk.update_rule,
				delete_rule: fk.delete_rule,
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use reifydb_catalog::test_utils::TableBuilder;

	use crate::test_utils::{TestDictionary, name};

	#[test]
	fn test_cycle_terminates() {
		let dictionary = TestDictionary::new();
		dictionary.create(
			TableBuilder::new("db", "a", 1)
				.int("id")
				.int("b_id")
				.primary_key(&["id"])
				.foreign_key("fk_a_b", &["b_id"], ("db", "b"), &["id"])
				.build(),
		);
		dictionary.create(
			TableBuilder::new("db", "b", 2)
				.int("id")
				.int("a_id")
				.primary_key(&["id"])
				.foreign_key("fk_b_a", &["a_id"], ("db", "a"), &["id"])
				.build(),
		);

		let a = dictionary.tables().open_by_name(&name("db", "a")).unwrap();
		let report = dictionary.foreign_keys().load(&a).unwrap();
		assert_eq!(report.loaded, [name("db", "a"), name("db", "b")]);
		assert!(report.failed.is_empty());

		let b = dictionary.tables().lookup_cached(&name("db", "b")).unwrap();
		assert_eq!(a.foreign_keys()[0].referenced, name("db", "b"));
		assert_eq!(a.referenced_by()[0].name, "fk_b_a");
		assert_eq!(b.referenced_by()[0].name, "fk_a_b");
		assert!(a.foreign_keys_loaded() && b.foreign_keys_loaded());
	}

	#[test]
	fn test_self_reference() {
		let dictionary = TestDictionary::new();
		dictionary.create(
			TableBuilder::new("db", "tree", 1)
				.int("id")
				.int("parent_id")
				.primary_key(&["id"])
				.foreign_key("fk_parent", &["parent_id"], ("db", "tree"), &["id"])
				.build(),
		);

		let tree = dictionary.tables().open_by_name(&name("db", "tree")).unwrap();
		let report = dictionary.foreign_keys().load(&tree).unwrap();
		assert_eq!(report.loaded, [name("db", "tree")]);
		assert_eq!(tree.foreign_keys().len(), 1);
		assert_eq!(tree.referenced_by().len(), 1);
		assert!(tree.foreign_keys()[0].is_self_referencing());
	}

	#[test]
	fn test_missing_referenced_table_is_skipped() {
		let dictionary = TestDictionary::new();
		dictionary.create(
			TableBuilder::new("db", "child", 1)
				.int("id")
				.int("gone_id")
				.primary_key(&["id"])
				.foreign_key("fk_gone", &["gone_id"], ("db", "gone"), &["id"])
				.build(),
		);

		let child = dictionary.tables().open_by_name(&name("db", "child")).unwrap();
		let report = dictionary.foreign_keys().load(&child).unwrap();
		assert_eq!(report.loaded, [name("db", "child")]);
		assert_eq!(child.foreign_keys().len(), 1);
	}

	#[test]
	fn test_parent_opened_after_child_links_back() {
		let dictionary = TestDictionary::new();
		dictionary.create(TableBuilder::new("db", "parent", 1).int("id").primary_key(&["id"]).build());
		dictionary.create(
			TableBuilder::new("db", "child", 2)
				.int("id")
				.int("parent_id")
				.primary_key(&["id"])
				.foreign_key("fk_child_parent", &["parent_id"], ("db", "parent"), &["id"])
				.build(),
		);

		let child = dictionary.open_by_name(&name("db", "child")).unwrap();
		let parent = dictionary.open_by_name(&name("db", "parent")).unwrap();
		assert_eq!(child.foreign_keys().len(), 1);
		assert_eq!(parent.referenced_by().len(), 1);
		assert_eq!(parent.referenced_by()[0].table, name("db", "child"));
	}
}
