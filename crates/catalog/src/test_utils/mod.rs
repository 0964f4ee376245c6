// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_type::{ColumnType, SpaceId, TableId};

use crate::{
	CatalogColumn, CatalogForeignKey, CatalogIndex, CatalogTable, ForeignKeyRule, GENERATED_CLUSTERED_INDEX,
	HiddenKind, IndexElement, IndexKind, Properties, ROW_ID_COLUMN,
};

/// Builds catalog tables the way the server would hand them to the engine: a table without a
/// primary key gets the hidden row-id column and generated clustered index, secondary indexes
/// get the clustering key appended as hidden elements.
pub struct TableBuilder {
	table: CatalogTable,
	primary_key: Option<Vec<IndexElement>>,
}

impl TableBuilder {
	pub fn new(schema: &str, name: &str, id: u64) -> Self {
		Self {
			table: CatalogTable {
				id: TableId(id),
				schema: schema.to_string(),
				name: name.to_string(),
				columns: vec![],
				indexes: vec![],
				partitions: vec![],
				foreign_keys: vec![],
				tablespace: SpaceId(id as u32),
				se_private: Properties::new(),
			},
			primary_key: None,
		}
	}

	pub fn column(mut self, mut column: CatalogColumn) -> Self {
		column.ordinal = self.table.columns.len() as u32 + 1;
		self.table.columns.push(column);
		self
	}

	pub fn int(self, name: &str) -> Self {
		self.column(CatalogColumn::new(name, ColumnType::Int))
	}

	pub fn varchar(self, name: &str, length: u32) -> Self {
		self.column(CatalogColumn::new(name, ColumnType::Varchar).with_length(length))
	}

	pub fn primary_key(mut self, columns: &[&str]) -> Self {
		self.primary_key = Some(columns.iter().map(|c| IndexElement::new(*c)).collect());
		self
	}

	pub fn primary_key_elements(mut self, elements: Vec<IndexElement>) -> Self {
		self.primary_key = Some(elements);
		self
	}

	pub fn index(mut self, name: &str, kind: IndexKind, elements: Vec<IndexElement>) -> Self {
		self.table.indexes.push(CatalogIndex::new(name, kind, elements));
		self
	}

	pub fn foreign_key(mut self, name: &str, columns: &[&str], referenced: (&str, &str), referenced_columns: &[&str]) -> Self {
		self.table.foreign_keys.push(CatalogForeignKey {
			name: name.to_string(),
			columns: columns.iter().map(|c| c.to_string()).collect(),
			referenced_schema: referenced.0.to_string(),
			referenced_table: referenced.1.to_string(),
			referenced_columns: referenced_columns.iter().map(|c| c.to_string()).collect(),
			update_rule: ForeignKeyRule::NoAction,
			delete_rule: ForeignKeyRule::NoAction,
		});
		self
	}

	pub fn tablespace(mut self, space: SpaceId) -> Self {
		self.table.tablespace = space;
		self
	}

	pub fn build(mut self) -> CatalogTable {
		for element in self.primary_key.iter().flatten() {
			if let Some(column) = self.table.column_mut(&element.column) {
				column.nullable = false;
			}
		}

		let clustered = match self.primary_key.take() {
			Some(elements) => CatalogIndex::new("PRIMARY", IndexKind::Primary, elements),
			None => {
				let row_id = CatalogColumn::new(ROW_ID_COLUMN, ColumnType::BigInt)
					.with_length(6)
					.not_null()
					.unsigned()
					.hidden(HiddenKind::Engine);
				self = self.column(row_id);
				let mut index = CatalogIndex::new(
					GENERATED_CLUSTERED_INDEX,
					IndexKind::Primary,
					vec![IndexElement::new(ROW_ID_COLUMN)],
				);
				index.hidden = true;
				index
			}
		};

		let key: Vec<String> = clustered.elements.iter().map(|e| e.column.clone()).collect();
		for index in &mut self.table.indexes {
			if matches!(index.kind, IndexKind::Fulltext | IndexKind::Spatial) {
				continue;
			}
			for column in &key {
				if !index.elements.iter().any(|e| &e.column == column) {
					index.elements.push(IndexElement {
						hidden: true,
						..IndexElement::new(column.clone())
					});
				}
			}
		}

		self.table.indexes.insert(0, clustered);
		self.table
	}
}
