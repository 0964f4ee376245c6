// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	fmt::{Display, Formatter},
};

use reifydb_type::{Charset, ColumnType, SpaceId, TableId};
use serde::{Deserialize, Serialize};

use crate::{CatalogPartition, Properties, QualifiedName};

/// Synthetic clustering key of tables declared without a primary key.
pub const ROW_ID_COLUMN: &str = "DB_ROW_ID";
pub const TRX_ID_COLUMN: &str = "DB_TRX_ID";
pub const ROLL_PTR_COLUMN: &str = "DB_ROLL_PTR";
/// Name of the hidden clustered index over [`ROW_ID_COLUMN`].
pub const GENERATED_CLUSTERED_INDEX: &str = "GEN_CLUST_INDEX";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTable {
	pub id: TableId,
	pub schema: String,
	pub name: String,
	pub columns: Vec<CatalogColumn>,
	#[serde(default)]
	pub indexes: Vec<CatalogIndex>,
	#[serde(default)]
	pub partitions: Vec<CatalogPartition>,
	#[serde(default)]
	pub foreign_keys: Vec<CatalogForeignKey>,
	pub tablespace: SpaceId,
	#[serde(default)]
	pub se_private: Properties,
}

impl CatalogTable {
	pub fn qualified_name(&self) -> QualifiedName {
		QualifiedName::new(&self.schema, &self.name)
	}

	pub fn column(&self, name: &str) -> Option<&CatalogColumn> {
		self.columns.iter().find(|c| c.name == name)
	}

	pub fn column_mut(&mut self, name: &str) -> Option<&mut CatalogColumn> {
		self.columns.iter_mut().find(|c| c.name == name)
	}

	pub fn index(&self, name: &str) -> Option<&CatalogIndex> {
		self.indexes.iter().find(|i| i.name == name)
	}

	/// The clustered index: the declared primary key or the hidden generated one.
	pub fn clustered_index(&self) -> Option<&CatalogIndex> {
		self.indexes.iter().find(|i| i.kind == IndexKind::Primary)
	}

	pub fn has_explicit_primary_key(&self) -> bool {
		self.clustered_index().map(|i| !i.hidden).unwrap_or(false)
	}

	pub fn has_fulltext_index(&self) -> bool {
		self.indexes.iter().any(|i| i.kind == IndexKind::Fulltext)
	}

	pub fn partition(&self, id: TableId) -> Option<&CatalogPartition> {
		self.partitions.iter().find(|p| p.id == id)
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HiddenKind {
	#[default]
	Visible,
	/// Hidden by the storage engine: system columns and retained dropped columns.
	Engine,
	/// Hidden from SQL by the server, e.g. functional index helpers.
	Sql,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogColumn {
	pub name: String,
	pub ordinal: u32,
	#[serde(rename = "type")]
	pub ty: ColumnType,
	/// Maximum data length in bytes.
	pub char_length: u32,
	pub nullable: bool,
	#[serde(default)]
	pub unsigned: bool,
	#[serde(default)]
	pub charset: Charset,
	#[serde(default)]
	pub hidden: HiddenKind,
	#[serde(default)]
	pub is_virtual: bool,
	/// Binary image of the declared default, as the server evaluated it.
	#[serde(default)]
	pub default_value: Option<Vec<u8>>,
	#[serde(default)]
	pub default_is_null: bool,
	#[serde(default)]
	pub se_private: Properties,
}

impl CatalogColumn {
	pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
		Self {
			name: name.into(),
			ordinal: 0,
			ty,
			char_length: ty.fixed_length().unwrap_or(0),
			nullable: true,
			unsigned: false,
			charset: if ty.is_character() {
				Charset::UTF8MB4
			} else {
				Charset::BINARY
			},
			hidden: HiddenKind::Visible,
			is_virtual: false,
			default_value: None,
			default_is_null: false,
			se_private: Properties::new(),
		}
	}

	pub fn with_length(mut self, char_length: u32) -> Self {
		self.char_length = char_length;
		self
	}

	pub fn not_null(mut self) -> Self {
		self.nullable = false;
		self
	}

	pub fn unsigned(mut self) -> Self {
		self.unsigned = true;
		self
	}

	pub fn with_charset(mut self, charset: Charset) -> Self {
		self.charset = charset;
		self
	}

	pub fn hidden(mut self, hidden: HiddenKind) -> Self {
		self.hidden = hidden;
		self
	}

	pub fn virtual_column(mut self) -> Self {
		self.is_virtual = true;
		self
	}

	pub fn with_default(mut self, value: impl Into<Vec<u8>>) -> Self {
		self.default_value = Some(value.into());
		self.default_is_null = false;
		self
	}

	pub fn with_null_default(mut self) -> Self {
		self.default_value = None;
		self.default_is_null = true;
		self
	}

	pub fn is_system(&self) -> bool {
		self.hidden == HiddenKind::Engine
			&& matches!(self.name.as_str(), ROW_ID_COLUMN | TRX_ID_COLUMN | ROLL_PTR_COLUMN)
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
	Primary,
	Unique,
	Multiple,
	Fulltext,
	Spatial,
}

impl IndexKind {
	pub fn is_unique(self) -> bool {
		matches!(self, IndexKind::Primary | IndexKind::Unique)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexElement {
	pub column: String,
	/// Key length in bytes if only a prefix of the column is indexed.
	#[serde(default)]
	pub length: Option<u32>,
	#[serde(default)]
	pub descending: bool,
	/// Elements the engine appends on its own, e.g. primary key columns of a secondary index.
	#[serde(default)]
	pub hidden: bool,
}

impl IndexElement {
	pub fn new(column: impl Into<String>) -> Self {
		Self {
			column: column.into(),
			length: None,
			descending: false,
			hidden: false,
		}
	}

	pub fn prefix(column: impl Into<String>, length: u32) -> Self {
		Self {
			length: Some(length),
			..Self::new(column)
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogIndex {
	pub name: String,
	pub kind: IndexKind,
	#[serde(default)]
	pub hidden: bool,
	pub elements: Vec<IndexElement>,
	#[serde(default)]
	pub se_private: Properties,
}

impl CatalogIndex {
	pub fn new(name: impl Into<String>, kind: IndexKind, elements: Vec<IndexElement>) -> Self {
		Self {
			name: name.into(),
			kind,
			hidden: false,
			elements,
			se_private: Properties::new(),
		}
	}

	pub fn visible_elements(&self) -> impl Iterator<Item = &IndexElement> {
		self.elements.iter().filter(|e| !e.hidden)
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyRule {
	#[default]
	NoAction,
	Restrict,
	Cascade,
	SetNull,
}

impl Display for ForeignKeyRule {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ForeignKeyRule::NoAction => f.write_str("NO ACTION"),
			ForeignKeyRule::Restrict => f.write_str("RESTRICT"),
			ForeignKeyRule::Cascade => f.write_str("CASCADE"),
			ForeignKeyRule::SetNull => f.write_str("SET NULL"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogForeignKey {
	pub name: String,
	pub columns: Vec<String>,
	pub referenced_schema: String,
	pub referenced_table: String,
	pub referenced_columns: Vec<String>,
	#[serde(default)]
	pub update_rule: ForeignKeyRule,
	#[serde(default)]
	pub delete_rule: ForeignKeyRule,
}

impl CatalogForeignKey {
	pub fn referenced_name(&self) -> QualifiedName {
		QualifiedName::new(&self.referenced_schema, &self.referenced_table)
	}
}
