// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The engine-private catalog of the previous release, as read back during an upgrade.

use reifydb_catalog::{ForeignKeyRule, GENERATED_CLUSTERED_INDEX, QualifiedName};
use reifydb_type::{Charset, ColumnType, IndexId, Result, TableId};
use serde::{Deserialize, Serialize};

/// Main type codes of legacy column definitions.
pub mod mtype {
	pub const VARCHAR: u8 = 1;
	pub const CHAR: u8 = 2;
	pub const FIXBINARY: u8 = 3;
	pub const BINARY: u8 = 4;
	pub const BLOB: u8 = 5;
	pub const INT: u8 = 6;
	pub const SYS: u8 = 8;
	pub const FLOAT: u8 = 9;
	pub const DOUBLE: u8 = 10;
	pub const DECIMAL: u8 = 11;
	pub const VARMYSQL: u8 = 12;
	pub const MYSQL: u8 = 13;
	pub const GEOMETRY: u8 = 14;
}

/// Precise-type flags of legacy column definitions. Bits 16..24 hold the charset.
pub mod prtype {
	pub const NOT_NULL: u32 = 256;
	pub const UNSIGNED: u32 = 512;
	pub const BINARY_TYPE: u32 = 1024;

	pub fn charset(prtype: u32) -> u32 {
		(prtype >> 16) & 0xFF
	}
}

pub mod index_type {
	pub const CLUSTERED: u32 = 1;
	pub const UNIQUE: u32 = 2;
	pub const FTS: u32 = 32;
	pub const SPATIAL: u32 = 64;
}

pub mod fk_type {
	pub const DELETE_CASCADE: u32 = 1;
	pub const DELETE_SET_NULL: u32 = 2;
	pub const UPDATE_CASCADE: u32 = 4;
	pub const UPDATE_SET_NULL: u32 = 8;
	pub const DELETE_NO_ACTION: u32 = 16;
	pub const UPDATE_NO_ACTION: u32 = 32;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyCatalog {
	pub tables: Vec<LegacyTable>,
}

impl LegacyCatalog {
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	pub fn table(&self, name: &str) -> Option<&LegacyTable> {
		self.tables.iter().find(|t| t.name == name)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTable {
	pub id: TableId,
	/// `schema/table`.
	pub name: String,
	/// Includes the system columns, typed [`mtype::SYS`].
	pub columns: Vec<LegacyColumn>,
	pub indexes: Vec<LegacyIndex>,
	#[serde(default)]
	pub autoinc: u64,
	#[serde(default)]
	pub foreign_keys: Vec<LegacyForeignKey>,
}

impl LegacyTable {
	/// `None` if the name is not of the form `schema/table`.
	pub fn qualified_name(&self) -> Option<QualifiedName> {
		QualifiedName::from_legacy(&self.name)
	}

	pub fn user_columns(&self) -> impl Iterator<Item = &LegacyColumn> {
		self.columns.iter().filter(|c| c.mtype != mtype::SYS)
	}

	pub fn has_explicit_primary_key(&self) -> bool {
		self.indexes.iter().any(|i| i.is_clustered() && i.name != GENERATED_CLUSTERED_INDEX)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyColumn {
	pub name: String,
	pub mtype: u8,
	pub prtype: u32,
	pub len: u32,
}

impl LegacyColumn {
	pub fn is_nullable(&self) -> bool {
		self.prtype & prtype::NOT_NULL == 0
	}

	pub fn is_unsigned(&self) -> bool {
		self.prtype & prtype::UNSIGNED != 0
	}

	pub fn is_binary(&self) -> bool {
		self.prtype & prtype::BINARY_TYPE != 0
	}

	pub fn charset(&self) -> u32 {
		prtype::charset(self.prtype)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyIndex {
	pub id: IndexId,
	pub name: String,
	pub type_flags: u32,
	pub fields: Vec<LegacyField>,
	#[serde(default)]
	pub nulls_equal: bool,
}

impl LegacyIndex {
	pub fn is_clustered(&self) -> bool {
		self.type_flags & index_type::CLUSTERED != 0
	}

	pub fn is_unique(&self) -> bool {
		self.type_flags & (index_type::UNIQUE | index_type::CLUSTERED) != 0
	}

	pub fn is_fulltext(&self) -> bool {
		self.type_flags & index_type::FTS != 0
	}

	pub fn is_spatial(&self) -> bool {
		self.type_flags & index_type::SPATIAL != 0
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyField {
	pub name: String,
	#[serde(default)]
	pub prefix_len: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyForeignKey {
	/// `schema/constraint`.
	pub id: String,
	pub for_columns: Vec<String>,
	/// `schema/table`.
	pub referenced_table: String,
	pub referenced_columns: Vec<String>,
	pub type_flags: u32,
}

impl LegacyForeignKey {
	pub fn constraint_name(&self) -> &str {
		self.id.rsplit_once('/').map(|(_, name)| name).unwrap_or(&self.id)
	}

	/// `(update, delete)` rules encoded in the type flags.
	pub fn rules(&self) -> (ForeignKeyRule, ForeignKeyRule) {
		translate_rules(self.type_flags)
	}
}

pub fn translate_rules(flags: u32) -> (ForeignKeyRule, ForeignKeyRule) {
	let update = if flags & fk_type::UPDATE_CASCADE != 0 {
		ForeignKeyRule::Cascade
	} else if flags & fk_type::UPDATE_SET_NULL != 0 {
		ForeignKeyRule::SetNull
	} else if flags & fk_type::UPDATE_NO_ACTION != 0 {
		ForeignKeyRule::NoAction
	} else {
		ForeignKeyRule::Restrict
	};
	let delete = if flags & fk_type::DELETE_CASCADE != 0 {
		ForeignKeyRule::Cascade
	} else if flags & fk_type::DELETE_SET_NULL != 0 {
		ForeignKeyRule::SetNull
	} else if flags & fk_type::DELETE_NO_ACTION != 0 {
		ForeignKeyRule::NoAction
	} else {
		ForeignKeyRule::Restrict
	};
	(update, delete)
}

/// Legacy main type code a unified column is stored as.
pub fn type_class(ty: ColumnType, charset: Charset) -> u8 {
	match ty {
		ColumnType::TinyInt
		| ColumnType::SmallInt
		| ColumnType::MediumInt
		| ColumnType::Int
		| ColumnType::BigInt
		| ColumnType::Year => mtype::INT,
		ColumnType::Float => mtype::FLOAT,
		ColumnType::Double => mtype::DOUBLE,
		ColumnType::Decimal => mtype::FIXBINARY,
		ColumnType::Char if charset == Charset::LATIN1 => mtype::CHAR,
		ColumnType::Char => mtype::MYSQL,
		ColumnType::Varchar if charset == Charset::LATIN1 => mtype::VARCHAR,
		ColumnType::Varchar => mtype::VARMYSQL,
		ColumnType::Binary
		| ColumnType::Bit
		| ColumnType::Date
		| ColumnType::Time
		| ColumnType::DateTime
		| ColumnType::Timestamp
		| ColumnType::Enum
		| ColumnType::Set => mtype::FIXBINARY,
		ColumnType::VarBinary => mtype::BINARY,
		ColumnType::Blob | ColumnType::Text | ColumnType::Json => mtype::BLOB,
		ColumnType::Geometry => mtype::GEOMETRY,
	}
}
