// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_catalog::{CatalogColumn, Properties};
use reifydb_type::{ObjectKind, Result, corrupt};

use crate::DefaultValueCodec;

pub const PHYSICAL_POS: &str = "physical_pos";
pub const VERSION_ADDED: &str = "version_added";
pub const VERSION_DROPPED: &str = "version_dropped";
pub const DEFAULT: &str = "default";
pub const DEFAULT_NULL: &str = "default_null";

const KNOWN: &[&str] = &[PHYSICAL_POS, VERSION_ADDED, VERSION_DROPPED, DEFAULT, DEFAULT_NULL];

/// Value rows written before a column existed read for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InstantDefault {
	/// The column is part of the initial layout, every row stores it.
	#[default]
	None,
	Null,
	Value(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnPrivate {
	pub physical_position: Option<u32>,
	pub version_added: Option<u32>,
	pub version_dropped: Option<u32>,
	pub default: InstantDefault,
	pub extra: Properties,
}

impl ColumnPrivate {
	/// `table` names the owner in corruption reports.
	pub fn read(column: &CatalogColumn, table: &str) -> Result<Self> {
		let props = &column.se_private;
		let name = || format!("{}.{}", table, column.name);

		let physical_position = props.parse::<u32>(PHYSICAL_POS).map_err(|e| corrupt!(ObjectKind::Column, name(), "{}", e))?;
		let version_added = props.parse::<u32>(VERSION_ADDED).map_err(|e| corrupt!(ObjectKind::Column, name(), "{}", e))?;
		let version_dropped =
			props.parse::<u32>(VERSION_DROPPED).map_err(|e| corrupt!(ObjectKind::Column, name(), "{}", e))?;
		let default_null =
			props.parse::<bool>(DEFAULT_NULL).map_err(|e| corrupt!(ObjectKind::Column, name(), "{}", e))?.unwrap_or(false);

		let default = match (default_null, props.get(DEFAULT)) {
			(true, Some(_)) => {
				return Err(corrupt!(ObjectKind::Column, name(), "instant default is both null and a value"));
			}
			(true, None) => InstantDefault::Null,
			(false, Some(encoded)) => InstantDefault::Value(DefaultValueCodec::decode(encoded)),
			(false, None) => InstantDefault::None,
		};

		if let (Some(added), Some(dropped)) = (version_added, version_dropped) {
			if dropped <= added {
				return Err(corrupt!(
					ObjectKind::Column,
					name(),
					"dropped in version {} before being added in version {}",
					dropped,
					added
				));
			}
		}

		Ok(Self {
			physical_position,
			version_added,
			version_dropped,
			default,
			extra: super::extra(props, KNOWN),
		})
	}

	pub fn write(&self, props: &mut Properties) {
		for key in KNOWN {
			props.remove(key);
		}
		if let Some(pos) = self.physical_position {
			props.set(PHYSICAL_POS, pos);
		}
		if let Some(version) = self.version_added {
			props.set(VERSION_ADDED, version);
		}
		if let Some(version) = self.version_dropped {
			props.set(VERSION_DROPPED, version);
		}
		match &self.default {
			InstantDefault::None => {}
			InstantDefault::Null => props.set(DEFAULT_NULL, true),
			InstantDefault::Value(bytes) => props.set(DEFAULT, DefaultValueCodec::encode(bytes)),
		}
		for (key, value) in self.extra.iter() {
			props.set(key, value);
		}
	}

	pub fn is_dropped(&self) -> bool {
		self.version_dropped.is_some()
	}
}

#[cfg(test)]
mod tests {
	use reifydb_type::ColumnType;

	use super::*;

	#[test]
	fn test_write_then_read() {
		let private = ColumnPrivate {
			physical_position: Some(2),
			version_added: Some(1),
			version_dropped: None,
			default: InstantDefault::Value(vec![0, 0, 0, 7]),
			extra: Properties::from_iter([("vendor", "x")]),
		};
		let mut column = CatalogColumn::new("c", ColumnType::Int);
		private.write(&mut column.se_private);

		assert_eq!(column.se_private.get(PHYSICAL_POS), Some("2"));
		assert_eq!(column.se_private.get(DEFAULT), Some("00000007"));
		assert_eq!(ColumnPrivate::read(&column, "db.t").unwrap(), private);
	}

	#[test]
	fn test_write_replaces_previous_keys() {
		let mut column = CatalogColumn::new("c", ColumnType::Int);
		ColumnPrivate {
			default: InstantDefault::Value(vec![1]),
			..Default::default()
		}
		.write(&mut column.se_private);
		ColumnPrivate {
			default: InstantDefault::Null,
			..Default::default()
		}
		.write(&mut column.se_private);

		assert!(!column.se_private.contains(DEFAULT));
		assert_eq!(ColumnPrivate::read(&column, "db.t").unwrap().default, InstantDefault::Null);
	}

	#[test]
	fn test_empty_bag_is_initial_layout() {
		let column = CatalogColumn::new("c", ColumnType::Int);
		let private = ColumnPrivate::read(&column, "db.t").unwrap();
		assert_eq!(private, ColumnPrivate::default());
		assert!(!private.is_dropped());
	}
}
