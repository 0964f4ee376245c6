// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_catalog::Properties;
use reifydb_type::{ObjectKind, Result, corrupt};

pub const ROW_VERSION: &str = "row_version";
pub const INITIAL_COL_COUNT: &str = "initial_col_count";
pub const CURRENT_COL_COUNT: &str = "current_col_count";
pub const TOTAL_COL_COUNT: &str = "total_col_count";
pub const AUTOINC: &str = "autoinc";
pub const DISCARD: &str = "discard";
pub const DATA_DIRECTORY: &str = "data_directory";

const COUNTERS: &[&str] = &[ROW_VERSION, INITIAL_COL_COUNT, CURRENT_COL_COUNT, TOTAL_COL_COUNT];
const KNOWN: &[&str] = &[ROW_VERSION, INITIAL_COL_COUNT, CURRENT_COL_COUNT, TOTAL_COL_COUNT, AUTOINC, DISCARD, DATA_DIRECTORY];

/// Row-version counters of a table. All counts cover stored user columns only: system columns
/// and virtual columns are excluded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ColumnCounters {
	pub row_version: u32,
	/// Columns of the layout the table was created with.
	pub initial: u32,
	/// Live columns.
	pub current: u32,
	/// Live columns plus retained dropped ones.
	pub total: u32,
}

impl ColumnCounters {
	pub fn initial(columns: u32) -> Self {
		Self {
			row_version: 0,
			initial: columns,
			current: columns,
			total: columns,
		}
	}

	pub fn has_instant_changes(&self) -> bool {
		self.row_version > 0
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TablePrivate {
	/// `None` for tables that were never assigned a versioned layout.
	pub counters: Option<ColumnCounters>,
	pub autoinc: u64,
	pub discarded: bool,
	pub data_directory: Option<String>,
	pub extra: Properties,
}

impl TablePrivate {
	/// Reads a table's or partition's bag; `name` identifies it in corruption reports.
	pub fn read(props: &Properties, name: &str) -> Result<Self> {
		let field = |key: &str| props.parse::<u32>(key).map_err(|e| corrupt!(ObjectKind::Table, name, "{}", e));

		let present = COUNTERS.iter().filter(|key| props.contains(key)).count();
		let counters = match present {
			0 => None,
			n if n == COUNTERS.len() => {
				let counters = ColumnCounters {
					row_version: field(ROW_VERSION)?.unwrap_or_default(),
					initial: field(INITIAL_COL_COUNT)?.unwrap_or_default(),
					current: field(CURRENT_COL_COUNT)?.unwrap_or_default(),
					total: field(TOTAL_COL_COUNT)?.unwrap_or_default(),
				};
				if counters.current > counters.total {
					return Err(corrupt!(
						ObjectKind::Table,
						name,
						"{} live columns exceed total of {}",
						counters.current,
						counters.total
					));
				}
				Some(counters)
			}
			_ => return Err(corrupt!(ObjectKind::Table, name, "incomplete row-version counters")),
		};

		Ok(Self {
			counters,
			autoinc: props.parse::<u64>(AUTOINC).map_err(|e| corrupt!(ObjectKind::Table, name, "{}", e))?.unwrap_or(0),
			discarded: props.parse::<bool>(DISCARD).map_err(|e| corrupt!(ObjectKind::Table, name, "{}", e))?.unwrap_or(false),
			data_directory: props.get(DATA_DIRECTORY).map(str::to_string),
			extra: super::extra(props, KNOWN),
		})
	}

	pub fn write(&self, props: &mut Properties) {
		for key in KNOWN {
			props.remove(key);
		}
		if let Some(counters) = &self.counters {
			props.set(ROW_VERSION, counters.row_version);
			props.set(INITIAL_COL_COUNT, counters.initial);
			props.set(CURRENT_COL_COUNT, counters.current);
			props.set(TOTAL_COL_COUNT, counters.total);
		}
		if self.autoinc > 0 {
			props.set(AUTOINC, self.autoinc);
		}
		if self.discarded {
			props.set(DISCARD, true);
		}
		if let Some(dir) = &self.data_directory {
			props.set(DATA_DIRECTORY, dir);
		}
		for (key, value) in self.extra.iter() {
			props.set(key, value);
		}
	}
}
