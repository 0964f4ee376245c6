// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod common;

use common::init_tracing;
use reifydb_catalog::{
	CatalogColumn, CatalogStore, ForeignKeyRule, IndexElement, IndexKind, QualifiedName, test_utils::TableBuilder,
};
use reifydb_dictionary::{
	Error, TablePrivate,
	test_utils::{TestDictionary, name},
	upgrade::{
		LegacyCatalog, LegacyColumn, LegacyField, LegacyForeignKey, LegacyIndex, LegacyTable, fk_type, fts_prefix,
		index_type, mtype, prtype,
	},
};
use reifydb_type::{ColumnType, IndexId, TableId};

const UTF8MB4: u32 = 255 << 16;

fn column(name: &str, mtype: u8, prtype: u32, len: u32) -> LegacyColumn {
	LegacyColumn {
		name: name.to_string(),
		mtype,
		prtype,
		len,
	}
}

fn system_columns() -> Vec<LegacyColumn> {
	vec![column("DB_TRX_ID", mtype::SYS, prtype::NOT_NULL, 6), column("DB_ROLL_PTR", mtype::SYS, prtype::NOT_NULL, 7)]
}

fn index(id: u64, name: &str, type_flags: u32, fields: &[&str]) -> LegacyIndex {
	LegacyIndex {
		id: IndexId(id),
		name: name.to_string(),
		type_flags,
		fields: fields
			.iter()
			.map(|f| LegacyField {
				name: f.to_string(),
				prefix_len: 0,
			})
			.collect(),
		nulls_equal: false,
	}
}

fn primary(id: u64) -> LegacyIndex {
	index(id, "PRIMARY", index_type::CLUSTERED | index_type::UNIQUE, &["id"])
}

fn legacy_table(id: u64, name: &str, mut columns: Vec<LegacyColumn>, indexes: Vec<LegacyIndex>) -> LegacyTable {
	columns.extend(system_columns());
	LegacyTable {
		id: TableId(id),
		name: name.to_string(),
		columns,
		indexes,
		autoinc: 0,
		foreign_keys: vec![],
	}
}

/// `shop.parent (id)` and `shop.child (id, parent_id)` with a foreign key between them, in both
/// catalogs.
fn shop() -> (TestDictionary, LegacyCatalog) {
	let dictionary = TestDictionary::new();
	dictionary.create(TableBuilder::new("shop", "parent", 1).int("id").primary_key(&["id"]).build());
	dictionary.create(
		TableBuilder::new("shop", "child", 2)
			.int("id")
			.int("parent_id")
			.primary_key(&["id"])
			.foreign_key("fk_child_parent", &["parent_id"], ("shop", "parent"), &["id"])
			.build(),
	);

	let mut parent = legacy_table(101, "shop/parent", vec![column("id", mtype::INT, prtype::NOT_NULL, 4)], vec![primary(1)]);
	parent.autoinc = 42;

	let mut child = legacy_table(
		102,
		"shop/child",
		vec![column("id", mtype::INT, prtype::NOT_NULL, 4), column("parent_id", mtype::INT, 0, 4)],
		vec![primary(2)],
	);
	child.foreign_keys.push(LegacyForeignKey {
		id: "shop/fk_child_parent".to_string(),
		for_columns: vec!["parent_id".to_string()],
		referenced_table: "shop/parent".to_string(),
		referenced_columns: vec!["id".to_string()],
		type_flags: fk_type::DELETE_CASCADE | fk_type::UPDATE_SET_NULL,
	});

	(
		dictionary,
		LegacyCatalog {
			tables: vec![parent, child],
		},
	)
}

#[test]
fn test_matching_catalog_is_carried_over() {
	init_tracing();
	let (dictionary, legacy) = shop();

	let report = dictionary.upgrade(&legacy).unwrap();
	assert_eq!(report.tables.len(), 2);
	assert_eq!(report.warnings().count(), 0);
	let parent = report.table(&name("shop", "parent")).unwrap();
	assert_eq!((parent.legacy_id, parent.unified_id, parent.autoinc), (TableId(101), TableId(1), 42));

	let stored = dictionary.stored("shop", "parent");
	assert_eq!(TablePrivate::read(&stored.se_private, "shop.parent").unwrap().autoinc, 42);

	let child = dictionary.stored("shop", "child");
	assert_eq!(child.foreign_keys.len(), 1);
	assert_eq!(child.foreign_keys[0].update_rule, ForeignKeyRule::SetNull);
	assert_eq!(child.foreign_keys[0].delete_rule, ForeignKeyRule::Cascade);

	// the upgraded state is what opening the tables sees
	let parent = dictionary.open_by_name(&name("shop", "parent")).unwrap();
	assert_eq!(parent.autoinc(), 42);
	let referenced_by = parent.referenced_by();
	assert_eq!(referenced_by.len(), 1);
	assert_eq!(referenced_by[0].table, name("shop", "child"));
	assert_eq!(referenced_by[0].delete_rule, ForeignKeyRule::Cascade);
}

#[test]
fn test_mismatch_aborts_without_writing() {
	init_tracing();
	let (dictionary, mut legacy) = shop();
	legacy.tables[1].columns.retain(|c| c.name != "parent_id");
	let before = dictionary.store.to_json().unwrap();

	let err = dictionary.upgrade(&legacy).unwrap_err();
	match err {
		Error::MigrationAborted {
			total,
			failures,
		} => {
			assert_eq!(total, 2);
			assert_eq!(failures.len(), 1);
			assert!(matches!(&failures[0], Error::StructuralMismatch { table, .. } if table == "shop.child"));
		}
		other => panic!("unexpected error: {other}"),
	}
	assert_eq!(dictionary.store.to_json().unwrap(), before);
}

#[test]
fn test_missing_unified_table_aborts() {
	init_tracing();
	let (dictionary, mut legacy) = shop();
	legacy.tables.push(legacy_table(103, "shop/gone", vec![column("id", mtype::INT, prtype::NOT_NULL, 4)], vec![primary(3)]));

	let err = dictionary.upgrade(&legacy).unwrap_err();
	assert!(matches!(err, Error::MigrationAborted { total: 3, ref failures } if failures[0].is_not_found()));
	assert_eq!(TablePrivate::read(&dictionary.stored("shop", "parent").se_private, "shop.parent").unwrap().autoinc, 0);
}

#[test]
fn test_geometry_stored_as_blob_is_a_warning() {
	init_tracing();
	let dictionary = TestDictionary::new();
	dictionary.create(
		TableBuilder::new("shop", "shapes", 4)
			.int("id")
			.column(CatalogColumn::new("g", ColumnType::Geometry))
			.primary_key(&["id"])
			.build(),
	);
	let legacy = LegacyCatalog {
		tables: vec![legacy_table(
			104,
			"shop/shapes",
			vec![column("id", mtype::INT, prtype::NOT_NULL, 4), column("g", mtype::BLOB, prtype::BINARY_TYPE, 12)],
			vec![primary(4)],
		)],
	};

	let report = dictionary.upgrade(&legacy).unwrap();
	let warnings: Vec<_> = report.warnings().collect();
	assert_eq!(warnings.len(), 1);
	assert!(warnings[0].contains("GEOMETRY"));
}

#[test]
fn test_fulltext_auxiliary_tables_are_renamed() {
	init_tracing();
	let dictionary = TestDictionary::new();
	dictionary.create(
		TableBuilder::new("shop", "docs", 7)
			.int("id")
			.column(CatalogColumn::new("body", ColumnType::Text))
			.primary_key(&["id"])
			.index("ft_body", IndexKind::Fulltext, vec![IndexElement::new("body")])
			.build(),
	);

	let legacy_prefix = fts_prefix(TableId(100));
	let auxiliary = [format!("{}BEING_DELETED", legacy_prefix), format!("{}0000000000000002_INDEX_1", legacy_prefix)];
	for (n, aux) in auxiliary.iter().enumerate() {
		dictionary.store.store_table(TableBuilder::new("shop", aux, 200 + n as u64).int("doc_id").build()).unwrap();
	}
	// same prefix in another schema belongs to another table
	dictionary.store.store_table(TableBuilder::new("other", &auxiliary[0], 300).int("doc_id").build()).unwrap();

	let legacy = LegacyCatalog {
		tables: vec![legacy_table(
			100,
			"shop/docs",
			vec![column("id", mtype::INT, prtype::NOT_NULL, 4), column("body", mtype::BLOB, UTF8MB4, 10)],
			vec![primary(9), index(10, "ft_body", index_type::FTS, &["body"])],
		)],
	};

	let report = dictionary.upgrade(&legacy).unwrap();
	assert_eq!(report.table(&name("shop", "docs")).unwrap().auxiliary_renamed, 2);

	let tables = dictionary.store.list_tables().unwrap();
	let unified_prefix = fts_prefix(TableId(7));
	assert!(tables.contains(&QualifiedName::new("shop", format!("{}BEING_DELETED", unified_prefix))));
	assert!(tables.contains(&QualifiedName::new("shop", format!("{}0000000000000002_INDEX_1", unified_prefix))));
	assert!(tables.contains(&QualifiedName::new("other", &auxiliary[0])));
	assert!(!tables.iter().any(|t| t.schema == "shop" && t.name.starts_with(&legacy_prefix)));
}

#[test]
fn test_taken_auxiliary_name_aborts_before_any_write() {
	init_tracing();
	let (dictionary, mut legacy) = shop();
	dictionary.create(
		TableBuilder::new("shop", "docs", 7)
			.int("id")
			.column(CatalogColumn::new("body", ColumnType::Text))
			.primary_key(&["id"])
			.index("ft_body", IndexKind::Fulltext, vec![IndexElement::new("body")])
			.build(),
	);
	let config = format!("{}CONFIG", fts_prefix(TableId(100)));
	dictionary.store.store_table(TableBuilder::new("shop", &config, 200).int("key").build()).unwrap();
	// the unified name the auxiliary table would move to is already in use
	let taken = format!("{}CONFIG", fts_prefix(TableId(7)));
	dictionary.store.store_table(TableBuilder::new("shop", &taken, 201).int("key").build()).unwrap();

	let mut docs = legacy_table(
		100,
		"shop/docs",
		vec![column("id", mtype::INT, prtype::NOT_NULL, 4), column("body", mtype::BLOB, UTF8MB4, 10)],
		vec![primary(9), index(10, "ft_body", index_type::FTS, &["body"])],
	);
	docs.autoinc = 9;
	legacy.tables.push(docs);
	let before = dictionary.store.to_json().unwrap();

	let err = dictionary.upgrade(&legacy).unwrap_err();
	assert!(matches!(err, Error::MigrationAborted { total: 3, ref failures }
		if matches!(&failures[0], Error::AlreadyExists { name, .. } if name == "shop.FTS_0000000000000007_CONFIG")));
	assert_eq!(dictionary.store.to_json().unwrap(), before);
	assert_eq!(TablePrivate::read(&dictionary.stored("shop", "parent").se_private, "shop.parent").unwrap().autoinc, 0);
}
