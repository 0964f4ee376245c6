// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_catalog::Properties;
use reifydb_type::{IndexId, ObjectKind, PageNo, Result, SpaceId, TableId, corrupt};

pub const ID: &str = "id";
pub const ROOT: &str = "root";
pub const SPACE_ID: &str = "space_id";
pub const TABLE_ID: &str = "table_id";
pub const TRX_ID: &str = "trx_id";
pub const NULLS_EQUAL: &str = "nulls_equal";

const KNOWN: &[&str] = &[ID, ROOT, SPACE_ID, TABLE_ID, TRX_ID, NULLS_EQUAL];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPrivate {
	pub id: IndexId,
	pub root: PageNo,
	pub space: SpaceId,
	pub table: TableId,
	/// Transaction that created the index.
	pub trx_id: u64,
	/// Unique index treating NULLs as equal.
	pub nulls_equal: bool,
	pub extra: Properties,
}

impl IndexPrivate {
	/// Null equality alone, for index definitions that carry no engine ids yet.
	pub fn read_nulls_equal(props: &Properties, name: &str) -> Result<bool> {
		match props.parse::<bool>(NULLS_EQUAL) {
			Ok(value) => Ok(value.unwrap_or(false)),
			Err(e) => Err(corrupt!(ObjectKind::Index, name, "{}", e)),
		}
	}

	pub fn read(props: &Properties, name: &str) -> Result<Self> {
		let bad = |e: String| corrupt!(ObjectKind::Index, name, "{}", e);
		let missing = |key: &str| corrupt!(ObjectKind::Index, name, "property '{}' is missing", key);

		Ok(Self {
			id: IndexId(props.parse::<u64>(ID).map_err(bad)?.ok_or_else(|| missing(ID))?),
			root: props.parse::<u32>(ROOT).map_err(bad)?.map(PageNo).unwrap_or(PageNo::NULL),
			space: SpaceId(props.parse::<u32>(SPACE_ID).map_err(bad)?.ok_or_else(|| missing(SPACE_ID))?),
			table: TableId(props.parse::<u64>(TABLE_ID).map_err(bad)?.ok_or_else(|| missing(TABLE_ID))?),
			trx_id: props.parse::<u64>(TRX_ID).map_err(bad)?.unwrap_or(0),
			nulls_equal: Self::read_nulls_equal(props, name)?,
			extra: super::extra(props, KNOWN),
		})
	}

	pub fn write(&self, props: &mut Properties) {
		for key in KNOWN {
			props.remove(key);
		}
		props.set(ID, self.id);
		if self.root != PageNo::NULL {
			props.set(ROOT, self.root);
		}
		props.set(SPACE_ID, self.space);
		props.set(TABLE_ID, self.table);
		props.set(TRX_ID, self.trx_id);
		if self.nulls_equal {
			props.set(NULLS_EQUAL, true);
		}
		for (key, value) in self.extra.iter() {
			props.set(key, value);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_round_trip() {
		let private = IndexPrivate {
			id: IndexId(42),
			root: PageNo(4),
			space: SpaceId(7),
			table: TableId(3),
			trx_id: 99,
			nulls_equal: false,
			extra: Properties::new(),
		};
		let mut props = Properties::new();
		private.write(&mut props);
		assert_eq!(props.get(ROOT), Some("4"));
		assert_eq!(IndexPrivate::read(&props, "PRIMARY").unwrap(), private);
	}

	#[test]
	fn test_missing_root_reads_as_null_page() {
		let props = Properties::from_iter([(ID, "1"), (SPACE_ID, "2"), (TABLE_ID, "3")]);
		assert_eq!(IndexPrivate::read(&props, "PRIMARY").unwrap().root, PageNo::NULL);
	}
}
