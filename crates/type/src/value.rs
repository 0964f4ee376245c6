// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

/// Semantic type tag of a column as the server declares it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
	TinyInt,
	SmallInt,
	MediumInt,
	Int,
	BigInt,
	Float,
	Double,
	Decimal,
	Char,
	Varchar,
	Binary,
	VarBinary,
	Blob,
	Text,
	Json,
	Geometry,
	Date,
	Time,
	DateTime,
	Timestamp,
	Year,
	Enum,
	Set,
	Bit,
}

impl ColumnType {
	pub fn is_integer(self) -> bool {
		matches!(
			self,
			ColumnType::TinyInt
				| ColumnType::SmallInt
				| ColumnType::MediumInt
				| ColumnType::Int | ColumnType::BigInt
				| ColumnType::Year
		)
	}

	/// Types carrying a sign flag.
	pub fn is_numeric(self) -> bool {
		self.is_integer() || matches!(self, ColumnType::Float | ColumnType::Double | ColumnType::Decimal)
	}

	/// Character types whose charset is significant.
	pub fn is_character(self) -> bool {
		matches!(self, ColumnType::Char | ColumnType::Varchar | ColumnType::Text)
	}

	pub fn is_binary(self) -> bool {
		matches!(self, ColumnType::Binary | ColumnType::VarBinary | ColumnType::Blob | ColumnType::Geometry)
	}

	/// Types stored off-row with a length-prefixed pointer.
	pub fn is_lob(self) -> bool {
		matches!(self, ColumnType::Blob | ColumnType::Text | ColumnType::Json | ColumnType::Geometry)
	}

	pub fn is_variable_length(self) -> bool {
		self.is_lob() || matches!(self, ColumnType::Varchar | ColumnType::VarBinary)
	}

	/// Byte length of fixed-width types, `None` where the declared length decides.
	pub fn fixed_length(self) -> Option<u32> {
		match self {
			ColumnType::TinyInt | ColumnType::Year => Some(1),
			ColumnType::SmallInt => Some(2),
			ColumnType::MediumInt | ColumnType::Date | ColumnType::Time => Some(3),
			ColumnType::Int | ColumnType::Float | ColumnType::Timestamp => Some(4),
			ColumnType::DateTime => Some(5),
			ColumnType::BigInt | ColumnType::Double => Some(8),
			_ => None,
		}
	}

	/// Number of bytes used to prefix a variable-length value with its length.
	pub fn length_prefix_bytes(self, char_length: u32) -> u32 {
		match self {
			ColumnType::Varchar | ColumnType::VarBinary => {
				if char_length < 256 {
					1
				} else {
					2
				}
			}
			_ => 0,
		}
	}

	/// Value used for a NOT NULL column that was added without an explicit default.
	pub fn implicit_default(self, char_length: u32) -> Vec<u8> {
		if let Some(len) = self.fixed_length() {
			return vec![0; len as usize];
		}
		match self {
			ColumnType::Char => vec![b' '; char_length as usize],
			ColumnType::Binary | ColumnType::Decimal | ColumnType::Bit => vec![0; char_length as usize],
			ColumnType::Enum | ColumnType::Set => vec![0; char_length.max(1) as usize],
			_ => Vec::new(),
		}
	}
}

impl Display for ColumnType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let name = match self {
			ColumnType::TinyInt => "TINYINT",
			ColumnType::SmallInt => "SMALLINT",
			ColumnType::MediumInt => "MEDIUMINT",
			ColumnType::Int => "INT",
			ColumnType::BigInt => "BIGINT",
			ColumnType::Float => "FLOAT",
			ColumnType::Double => "DOUBLE",
			ColumnType::Decimal => "DECIMAL",
			ColumnType::Char => "CHAR",
			ColumnType::Varchar => "VARCHAR",
			ColumnType::Binary => "BINARY",
			ColumnType::VarBinary => "VARBINARY",
			ColumnType::Blob => "BLOB",
			ColumnType::Text => "TEXT",
			ColumnType::Json => "JSON",
			ColumnType::Geometry => "GEOMETRY",
			ColumnType::Date => "DATE",
			ColumnType::Time => "TIME",
			ColumnType::DateTime => "DATETIME",
			ColumnType::Timestamp => "TIMESTAMP",
			ColumnType::Year => "YEAR",
			ColumnType::Enum => "ENUM",
			ColumnType::Set => "SET",
			ColumnType::Bit => "BIT",
		};
		f.write_str(name)
	}
}

/// Collation / character-set id as recorded by the server.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Charset(pub u32);

impl Charset {
	pub const LATIN1: Charset = Charset(8);
	pub const BINARY: Charset = Charset(63);
	pub const UTF8MB4: Charset = Charset(255);

	pub fn is_binary(self) -> bool {
		self == Self::BINARY
	}
}

impl Default for Charset {
	fn default() -> Self {
		Self::UTF8MB4
	}
}

impl Display for Charset {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_length_prefix_bytes() {
		assert_eq!(ColumnType::Varchar.length_prefix_bytes(255), 1);
		assert_eq!(ColumnType::Varchar.length_prefix_bytes(256), 2);
		assert_eq!(ColumnType::Char.length_prefix_bytes(300), 0);
	}

	#[test]
	fn test_implicit_default() {
		assert_eq!(ColumnType::Int.implicit_default(0), vec![0, 0, 0, 0]);
		assert_eq!(ColumnType::Char.implicit_default(3), b"   ".to_vec());
		assert!(ColumnType::Varchar.implicit_default(20).is_empty());
	}
}
