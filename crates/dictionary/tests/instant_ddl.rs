// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Instant ADD/DROP COLUMN through the dictionary: catalog counters, cached layouts and the
//! failure paths that must leave both untouched.

mod common;

use common::init_tracing;
use reifydb_catalog::{CatalogColumn, CatalogStore, HiddenKind, IndexElement, IndexKind, test_utils::TableBuilder};
use reifydb_dictionary::{
	ColumnCounters, Error, InstantDefault, MAX_ROW_VERSIONS, TablePrivate,
	test_utils::{TestDictionary, name},
	version::dropped_column_name,
};
use reifydb_type::{ColumnType, TableId};

fn stored_counters(dictionary: &TestDictionary) -> Option<ColumnCounters> {
	let table = dictionary.stored("db", "t");
	TablePrivate::read(&table.se_private, "db.t").unwrap().counters
}

#[test]
fn test_create_assigns_initial_layout() {
	init_tracing();
	let dictionary = TestDictionary::new();
	dictionary.create(TableBuilder::new("db", "t", 1).int("a").int("b").build());

	assert_eq!(stored_counters(&dictionary), Some(ColumnCounters::initial(2)));

	let table = dictionary.open_by_name(&name("db", "t")).unwrap();
	let layout = table.layout();
	let slots: Vec<_> = layout.columns.physical().map(|c| (c.name.as_str(), c.physical_position)).collect();
	assert_eq!(slots, [("a", Some(0)), ("b", Some(1))]);
	assert!(layout.columns.iter().all(|c| !c.is_instantly_added()));
	assert!(table.is_storage_available());
}

#[test]
fn test_add_then_drop_updates_cached_table() {
	init_tracing();
	let dictionary = TestDictionary::new();
	dictionary.create(TableBuilder::new("db", "t", 1).int("a").int("b").build());
	let table = dictionary.open_by_name(&name("db", "t")).unwrap();

	let change = dictionary
		.add_columns(&name("db", "t"), vec![CatalogColumn::new("c", ColumnType::Int).not_null().with_default(vec![0, 0, 0, 7])])
		.unwrap();
	assert_eq!(change.row_version, 1);
	assert_eq!(change.added, ["c"]);

	// the open handle sees the new layout
	assert_eq!(
		table.counters(),
		ColumnCounters {
			row_version: 1,
			initial: 2,
			current: 3,
			total: 3,
		}
	);
	let c = table.column("c").unwrap();
	assert_eq!(c.physical_position, Some(2));
	assert_eq!(c.default, InstantDefault::Value(vec![0, 0, 0, 7]));
	assert!(!c.is_stored_in(0));
	assert!(c.is_stored_in(1));

	let change = dictionary.drop_columns(&name("db", "t"), &["b"]).unwrap();
	assert_eq!(change.row_version, 2);
	assert_eq!(change.dropped, ["b"]);
	assert_eq!(
		table.counters(),
		ColumnCounters {
			row_version: 2,
			initial: 2,
			current: 2,
			total: 3,
		}
	);
	assert!(table.column("b").is_none());

	let layout = table.layout();
	let dropped: Vec<_> = layout.columns.dropped().collect();
	assert_eq!(dropped.len(), 1);
	assert_eq!(dropped[0].name, dropped_column_name(2, 1, "b"));
	assert_eq!(dropped[0].hidden, HiddenKind::Engine);
	assert!(dropped[0].is_stored_in(1));
	assert!(!dropped[0].is_stored_in(2));

	let visible: Vec<_> = layout.columns.logical().map(|c| c.name.as_str()).collect();
	assert_eq!(visible, ["a", "c"]);
	assert_eq!(stored_counters(&dictionary), Some(table.counters()));
}

#[test]
fn test_drop_and_add_in_one_statement() {
	init_tracing();
	let dictionary = TestDictionary::new();
	dictionary.create(TableBuilder::new("db", "t", 1).int("a").int("b").build());

	let change = dictionary
		.alter_columns(&name("db", "t"), vec![CatalogColumn::new("b", ColumnType::BigInt)], &["b"])
		.unwrap();
	assert_eq!(change.row_version, 1);
	assert_eq!(change.dropped, ["b"]);
	assert_eq!(change.added, ["b"]);

	let table = dictionary.open_by_name(&name("db", "t")).unwrap();
	let b = table.column("b").unwrap();
	assert_eq!(b.ty, ColumnType::BigInt);
	assert_eq!(b.physical_position, Some(2));
	assert_eq!(b.version_added, Some(1));
	assert_eq!(b.default, InstantDefault::Null);
	assert_eq!(
		table.counters(),
		ColumnCounters {
			row_version: 1,
			initial: 2,
			current: 2,
			total: 3,
		}
	);
}

#[test]
fn test_failed_statement_changes_nothing() {
	init_tracing();
	let dictionary = TestDictionary::new();
	dictionary.create(
		TableBuilder::new("db", "t", 1)
			.int("a")
			.int("b")
			.index("idx_b", IndexKind::Multiple, vec![IndexElement::new("b")])
			.build(),
	);
	let table = dictionary.open_by_name(&name("db", "t")).unwrap();
	let before = dictionary.stored("db", "t");

	let err = dictionary.add_columns(&name("db", "t"), vec![CatalogColumn::new("A", ColumnType::Int)]).unwrap_err();
	assert!(matches!(err, Error::ColumnConflict { ref existing, .. } if existing == "an existing column"));

	let err = dictionary.drop_columns(&name("db", "t"), &["b"]).unwrap_err();
	assert!(matches!(err, Error::ColumnConflict { ref existing, .. } if existing == "index 'idx_b'"));

	let err = dictionary.drop_columns(&name("db", "t"), &["missing"]).unwrap_err();
	assert!(err.is_not_found());

	// the add is rejected before the drop of the same statement is written
	let err = dictionary
		.alter_columns(&name("db", "t"), vec![CatalogColumn::new("DB_ROW_ID", ColumnType::Int)], &["a"])
		.unwrap_err();
	assert!(matches!(err, Error::ColumnConflict { .. }));

	assert_eq!(dictionary.stored("db", "t"), before);
	assert_eq!(table.row_version(), 0);
	assert!(table.column("a").is_some());
}

#[test]
fn test_unknown_table() {
	init_tracing();
	let dictionary = TestDictionary::new();
	let err = dictionary.add_columns(&name("db", "missing"), vec![CatalogColumn::new("c", ColumnType::Int)]).unwrap_err();
	assert!(err.is_not_found());
	assert_eq!(dictionary.locks.held(), 0);
}

#[test]
fn test_row_version_limit() {
	init_tracing();
	let dictionary = TestDictionary::new();
	dictionary.create(TableBuilder::new("db", "t", 1).int("a").build());

	for n in 0..MAX_ROW_VERSIONS {
		dictionary.add_columns(&name("db", "t"), vec![CatalogColumn::new(format!("c{}", n), ColumnType::Int)]).unwrap();
	}
	let err = dictionary.add_columns(&name("db", "t"), vec![CatalogColumn::new("last", ColumnType::Int)]).unwrap_err();
	assert!(matches!(err, Error::RowVersionLimit { limit: MAX_ROW_VERSIONS, .. }));
	assert_eq!(stored_counters(&dictionary).map(|c| c.row_version), Some(MAX_ROW_VERSIONS));
	assert!(dictionary.stored("db", "t").column("last").is_none());
}

#[test]
fn test_table_without_counters_is_laid_out_on_first_change() {
	init_tracing();
	let dictionary = TestDictionary::new();
	// written by a server that never ran instant DDL on it
	dictionary.store.store_table(TableBuilder::new("db", "t", 1).int("a").int("b").build()).unwrap();
	assert_eq!(stored_counters(&dictionary), None);

	dictionary.add_columns(&name("db", "t"), vec![CatalogColumn::new("c", ColumnType::Int)]).unwrap();
	assert_eq!(
		stored_counters(&dictionary),
		Some(ColumnCounters {
			row_version: 1,
			initial: 2,
			current: 3,
			total: 3,
		})
	);
	assert_eq!(dictionary.stored("db", "t").id, TableId(1));
}

#[test]
fn test_drop_foreign_key_column_is_refused() {
	init_tracing();
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
	let before = dictionary.stored("db", "child");

	let err = dictionary.drop_columns(&name("db", "child"), &["PARENT_ID"]).unwrap_err();
	assert!(matches!(err, Error::ColumnConflict { ref existing, .. } if existing == "foreign key 'fk_child_parent'"));
	assert_eq!(dictionary.stored("db", "child"), before);

	// both ends of the constraint still open
	let child = dictionary.open_by_name(&name("db", "child")).unwrap();
	assert!(child.column("parent_id").is_some());
	let parent = dictionary.open_by_name(&name("db", "parent")).unwrap();
	assert_eq!(parent.referenced_by().len(), 1);
}
