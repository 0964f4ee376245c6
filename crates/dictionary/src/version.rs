// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Row versions of instantly altered tables.
//!
//! Adding or dropping columns never rewrites rows. Every statement that changes the stored
//! column set bumps the table's row version once; rows remember the version they were written
//! under, and each column remembers the versions it was added and dropped in. Dropped columns
//! stay in the catalog, renamed and hidden, until the table is rebuilt.

use std::collections::HashSet;

use reifydb_catalog::{CatalogColumn, CatalogTable, HiddenKind, Properties, ROLL_PTR_COLUMN, ROW_ID_COLUMN, TRX_ID_COLUMN};
use reifydb_type::{Error, ObjectKind, Result, corrupt};
use tracing::{debug, instrument};

use crate::{ColumnCounters, ColumnPrivate, InstantDefault, TablePrivate, internal::key_prefix_length};

/// Row versions a table can accumulate before it has to be rebuilt.
pub const MAX_ROW_VERSIONS: u32 = 64;

const DROPPED_PREFIX: &str = "!hidden!_dropped_";

/// Name a dropped column is retained under.
pub fn dropped_column_name(version: u32, pos: u32, name: &str) -> String {
	format!("{}v{}_p{}_{}", DROPPED_PREFIX, version, pos, name)
}

pub fn is_dropped_column_name(name: &str) -> bool {
	name.starts_with(DROPPED_PREFIX)
}

/// Columns whose value is stored in the row: everything but virtual and system columns.
pub(crate) fn is_stored_user_column(column: &CatalogColumn) -> bool {
	!column.is_virtual && !column.is_system()
}

/// Columns the clustered index stores a key prefix of. Each takes an extra slot.
pub(crate) fn clustered_prefix_columns(table: &CatalogTable) -> HashSet<String> {
	let Some(clustered) = table.clustered_index() else {
		return HashSet::new();
	};
	clustered
		.elements
		.iter()
		.filter(|element| table.column(&element.column).map(|c| key_prefix_length(element, c) > 0).unwrap_or(false))
		.map(|element| element.column.clone())
		.collect()
}

/// Slots of a freshly created layout in declaration order, aligned with `table.columns`.
pub(crate) fn initial_positions(table: &CatalogTable) -> Vec<Option<u32>> {
	let prefixed = clustered_prefix_columns(table);
	let mut next = 0;
	table.columns
		.iter()
		.map(|column| {
			if !is_stored_user_column(column) {
				return None;
			}
			let pos = next;
			next += if prefixed.contains(&column.name) {
				2
			} else {
				1
			};
			Some(pos)
		})
		.collect()
}

/// Assigns slots in declaration order and resets the counters to version 0.
pub fn assign_initial_layout(table: &mut CatalogTable) -> Result<()> {
	let name = table.qualified_name().to_string();
	let positions = initial_positions(table);
	let mut stored = 0;
	for (column, pos) in table.columns.iter_mut().zip(positions) {
		let mut private = ColumnPrivate::read(column, &name)?;
		private.physical_position = pos;
		private.version_added = None;
		private.version_dropped = None;
		private.default = InstantDefault::None;
		private.write(&mut column.se_private);
		if pos.is_some() {
			stored += 1;
		}
	}

	let mut private = TablePrivate::read(&table.se_private, &name)?;
	private.counters = Some(ColumnCounters::initial(stored));
	private.write(&mut table.se_private);
	Ok(())
}

/// Value older rows read for a column added after they were written.
fn instant_default(column: &CatalogColumn) -> InstantDefault {
	if column.default_is_null && column.nullable {
		InstantDefault::Null
	} else if let Some(value) = &column.default_value {
		InstantDefault::Value(value.clone())
	} else if column.nullable {
		InstantDefault::Null
	} else {
		InstantDefault::Value(column.ty.implicit_default(column.char_length))
	}
}

/// Outcome of one instant statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstantChange {
	pub row_version: u32,
	pub added: Vec<String>,
	/// Original names of the dropped columns.
	pub dropped: Vec<String>,
}

impl InstantChange {
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.dropped.is_empty()
	}
}

/// Applies the instant column changes of one statement to a table about to be written back to
/// the catalog. The row version moves at most once, in [`RowVersionTracker::finish`].
pub struct RowVersionTracker<'a> {
	table: &'a mut CatalogTable,
	name: String,
	counters: ColumnCounters,
	next_slot: u32,
	pending_version: u32,
	added: Vec<String>,
	dropped: Vec<String>,
}

impl<'a> RowVersionTracker<'a> {
	pub fn new(table: &'a mut CatalogTable) -> Result<Self> {
		let name = table.qualified_name().to_string();
		if TablePrivate::read(&table.se_private, &name)?.counters.is_none() {
			assign_initial_layout(table)?;
		}
		let counters = TablePrivate::read(&table.se_private, &name)?.counters.unwrap_or_default();
		let next_slot = next_free_slot(table, &name)?;

		Ok(Self {
			table,
			name,
			counters,
			next_slot,
			pending_version: counters.row_version + 1,
			added: vec![],
			dropped: vec![],
		})
	}

	/// Appends `columns` to the stored layout. A column's `ordinal` selects its position among
	/// the visible columns (1 = first); 0 places it after the last one.
	#[instrument(name = "dictionary::version::add_columns", level = "debug", skip_all, fields(table = %self.name))]
	pub fn begin_add_columns(&mut self, columns: Vec<CatalogColumn>) -> Result<()> {
		for mut column in columns {
			self.check_name_free(&column.name)?;
			let requested = column.ordinal;

			if !column.is_virtual {
				ColumnPrivate {
					physical_position: Some(self.next_slot),
					version_added: Some(self.pending_version),
					version_dropped: None,
					default: instant_default(&column),
					extra: Properties::new(),
				}
				.write(&mut column.se_private);

				self.next_slot += 1;
				self.counters.current += 1;
				self.counters.total += 1;
				self.added.push(column.name.clone());
			}

			self.insert_logical(column, requested);
		}
		Ok(())
	}

	/// Hides `names` from SQL while keeping their stored values readable for older rows.
	#[instrument(name = "dictionary::version::drop_columns", level = "debug", skip_all, fields(table = %self.name))]
	pub fn begin_drop_columns(&mut self, names: &[&str]) -> Result<()> {
		for &name in names {
			let Some(idx) = self.table.columns.iter().position(|c| {
				c.name.eq_ignore_ascii_case(name) && !c.is_system() && !is_dropped_column_name(&c.name)
			}) else {
				return Err(Error::not_found(ObjectKind::Column, format!("{}.{}", self.name, name)));
			};

			let original = self.table.columns[idx].name.clone();
			if let Some(index) = self
				.table
				.indexes
				.iter()
				.find(|i| i.elements.iter().any(|e| e.column.eq_ignore_ascii_case(&original)))
			{
				return Err(Error::ColumnConflict {
					table: self.name.clone(),
					column: original,
					existing: format!("index '{}'", index.name),
				});
			}
			if let Some(fk) = self
				.table
				.foreign_keys
				.iter()
				.find(|fk| fk.columns.iter().any(|c| c.eq_ignore_ascii_case(&original)))
			{
				return Err(Error::ColumnConflict {
					table: self.name.clone(),
					column: original,
					existing: format!("foreign key '{}'", fk.name),
				});
			}

			if self.table.columns[idx].is_virtual {
				self.table.columns.remove(idx);
				continue;
			}

			let mut column = self.table.columns.remove(idx);
			let mut private = ColumnPrivate::read(&column, &self.name)?;
			let Some(pos) = private.physical_position else {
				return Err(corrupt!(
					ObjectKind::Column,
					format!("{}.{}", self.name, original),
					"stored column has no physical position"
				));
			};
			private.version_dropped = Some(self.pending_version);
			private.write(&mut column.se_private);
			column.name = dropped_column_name(self.pending_version, pos, &original);
			column.hidden = HiddenKind::Engine;
			self.table.columns.push(column);

			self.counters.current -= 1;
			self.dropped.push(original);
		}
		Ok(())
	}

	/// Commits the version bump, if any column changed, and writes the counters back.
	pub fn finish(self) -> Result<InstantChange> {
		let mut counters = self.counters;
		if !self.added.is_empty() || !self.dropped.is_empty() {
			if self.pending_version > MAX_ROW_VERSIONS {
				return Err(Error::RowVersionLimit {
					table: self.name,
					limit: MAX_ROW_VERSIONS,
				});
			}
			counters.row_version = self.pending_version;
		}

		for (idx, column) in self.table.columns.iter_mut().enumerate() {
			column.ordinal = idx as u32 + 1;
		}

		let mut private = TablePrivate::read(&self.table.se_private, &self.name)?;
		private.counters = Some(counters);
		private.write(&mut self.table.se_private);

		debug!(
			table = %self.name,
			row_version = counters.row_version,
			added = self.added.len(),
			dropped = self.dropped.len(),
			"instant column change"
		);

		Ok(InstantChange {
			row_version: counters.row_version,
			added: self.added,
			dropped: self.dropped,
		})
	}

	fn check_name_free(&self, name: &str) -> Result<()> {
		let conflict = |existing: &str| Error::ColumnConflict {
			table: self.name.clone(),
			column: name.to_string(),
			existing: existing.to_string(),
		};

		if let Some(column) = self.table.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
			return Err(if is_dropped_column_name(&column.name) {
				conflict("a retained dropped column")
			} else if column.is_system() {
				conflict("a system column")
			} else {
				conflict("an existing column")
			});
		}
		if [ROW_ID_COLUMN, TRX_ID_COLUMN, ROLL_PTR_COLUMN].iter().any(|s| s.eq_ignore_ascii_case(name)) {
			return Err(conflict("a reserved system column"));
		}
		Ok(())
	}

	/// Engine-hidden columns stay behind every column the server orders.
	fn insert_logical(&mut self, column: CatalogColumn, requested: u32) {
		let ordered: Vec<usize> = self
			.table
			.columns
			.iter()
			.enumerate()
			.filter(|(_, c)| c.hidden != HiddenKind::Engine)
			.map(|(idx, _)| idx)
			.collect();

		let at = match requested {
			0 => ordered.last().map(|idx| idx + 1).unwrap_or(0),
			n => match ordered.get(n as usize - 1) {
				Some(&idx) => idx,
				None => ordered.last().map(|idx| idx + 1).unwrap_or(0),
			},
		};
		self.table.columns.insert(at, column);
	}
}

/// First slot after every stored column, retained dropped ones included.
fn next_free_slot(table: &CatalogTable, name: &str) -> Result<u32> {
	let prefixed = clustered_prefix_columns(table);
	let mut next = 0;
	for column in table.columns.iter().filter(|c| is_stored_user_column(c)) {
		if let Some(pos) = ColumnPrivate::read(column, name)?.physical_position {
			let width = if prefixed.contains(&column.name) {
				2
			} else {
				1
			};
			next = next.max(pos + width);
		}
	}
	Ok(next)
}

#[cfg(test)]
mod tests {
	use reifydb_catalog::{IndexElement, test_utils::TableBuilder};
	use reifydb_type::ColumnType;

	use super::*;

	fn counters(table: &CatalogTable) -> ColumnCounters {
		TablePrivate::read(&table.se_private, "t").unwrap().counters.unwrap()
	}

	fn private(table: &CatalogTable, column: &str) -> ColumnPrivate {
		ColumnPrivate::read(table.column(column).unwrap(), "t").unwrap()
	}

	#[test]
	fn test_initial_layout_follows_declaration_order() {
		let mut table = TableBuilder::new("db", "t", 1).int("a").int("b").build();
		assign_initial_layout(&mut table).unwrap();

		assert_eq!(private(&table, "a").physical_position, Some(0));
		assert_eq!(private(&table, "b").physical_position, Some(1));
		assert_eq!(private(&table, ROW_ID_COLUMN).physical_position, None);
		assert_eq!(counters(&table), ColumnCounters::initial(2));
	}

	#[test]
	fn test_prefixed_key_takes_two_slots() {
		let mut table = TableBuilder::new("db", "t", 1)
			.varchar("name", 100)
			.int("n")
			.primary_key_elements(vec![IndexElement::prefix("name", 10)])
			.build();
		assign_initial_layout(&mut table).unwrap();
		assert_eq!(private(&table, "name").physical_position, Some(0));
		assert_eq!(private(&table, "n").physical_position, Some(2));

		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		tracker.begin_add_columns(vec![CatalogColumn::new("c", ColumnType::Int)]).unwrap();
		tracker.finish().unwrap();
		assert_eq!(private(&table, "c").physical_position, Some(3));
	}

	#[test]
	fn test_add_then_drop() {
		let mut table = TableBuilder::new("db", "t", 1).int("a").int("b").build();
		assign_initial_layout(&mut table).unwrap();

		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		tracker.begin_add_columns(vec![CatalogColumn::new("c", ColumnType::Int).not_null().with_default(vec![0, 0, 0, 5])])
			.unwrap();
		let change = tracker.finish().unwrap();
		assert_eq!(change.row_version, 1);
		assert_eq!(change.added, ["c"]);

		let c = private(&table, "c");
		assert_eq!(c.physical_position, Some(2));
		assert_eq!(c.version_added, Some(1));
		assert_eq!(c.default, InstantDefault::Value(vec![0, 0, 0, 5]));
		assert_eq!(
			counters(&table),
			ColumnCounters {
				row_version: 1,
				initial: 2,
				current: 3,
				total: 3
			}
		);

		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		tracker.begin_drop_columns(&["b"]).unwrap();
		let change = tracker.finish().unwrap();
		assert_eq!(change.dropped, ["b"]);
		assert!(table.column("b").is_none());

		let hidden = table.column("!hidden!_dropped_v2_p1_b").unwrap();
		assert_eq!(hidden.hidden, HiddenKind::Engine);
		assert_eq!(private(&table, "!hidden!_dropped_v2_p1_b").version_dropped, Some(2));
		assert_eq!(
			counters(&table),
			ColumnCounters {
				row_version: 2,
				initial: 2,
				current: 2,
				total: 3
			}
		);
	}

	#[test]
	fn test_one_bump_per_statement() {
		let mut table = TableBuilder::new("db", "t", 1).int("a").int("b").build();
		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		tracker.begin_drop_columns(&["a"]).unwrap();
		tracker.begin_add_columns(vec![CatalogColumn::new("a", ColumnType::BigInt), CatalogColumn::new("d", ColumnType::Int)])
			.unwrap();
		let change = tracker.finish().unwrap();

		assert_eq!(change.row_version, 1);
		assert_eq!(private(&table, "a").physical_position, Some(2));
		assert_eq!(private(&table, "d").physical_position, Some(3));
		assert_eq!(private(&table, "!hidden!_dropped_v1_p0_a").version_dropped, Some(1));
	}

	#[test]
	fn test_add_conflicts() {
		let mut table = TableBuilder::new("db", "t", 1).int("a").build();
		let mut tracker = RowVersionTracker::new(&mut table).unwrap();

		let err = tracker.begin_add_columns(vec![CatalogColumn::new("A", ColumnType::Int)]).unwrap_err();
		assert!(matches!(err, Error::ColumnConflict { .. }));
		let err = tracker.begin_add_columns(vec![CatalogColumn::new("db_row_id", ColumnType::Int)]).unwrap_err();
		assert!(matches!(err, Error::ColumnConflict { .. }));

		tracker.begin_drop_columns(&["a"]).unwrap();
		let err = tracker.begin_add_columns(vec![CatalogColumn::new("!hidden!_dropped_v1_p0_a", ColumnType::Int)]).unwrap_err();
		assert!(matches!(err, Error::ColumnConflict { existing, .. } if existing == "a retained dropped column"));
	}

	#[test]
	fn test_drop_unknown_system_or_dropped_column() {
		let mut table = TableBuilder::new("db", "t", 1).int("a").int("b").build();
		let mut tracker = RowVersionTracker::new(&mut table).unwrap();

		assert!(tracker.begin_drop_columns(&["missing"]).unwrap_err().is_not_found());
		assert!(tracker.begin_drop_columns(&[ROW_ID_COLUMN]).unwrap_err().is_not_found());
		tracker.begin_drop_columns(&["b"]).unwrap();
		assert!(tracker.begin_drop_columns(&["b"]).unwrap_err().is_not_found());
	}

	#[test]
	fn test_drop_indexed_column_conflicts() {
		let mut table = TableBuilder::new("db", "t", 1).int("id").int("a").primary_key(&["id"]).build();
		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		let err = tracker.begin_drop_columns(&["id"]).unwrap_err();
		assert!(matches!(err, Error::ColumnConflict { existing, .. } if existing == "index 'PRIMARY'"));
	}

	#[test]
	fn test_drop_foreign_key_column_conflicts() {
		let mut table = TableBuilder::new("db", "child", 2)
			.int("id")
			.int("parent_id")
			.primary_key(&["id"])
			.foreign_key("fk_parent", &["parent_id"], ("db", "parent"), &["id"])
			.build();
		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		let err = tracker.begin_drop_columns(&["parent_id"]).unwrap_err();
		assert!(matches!(err, Error::ColumnConflict { existing, .. } if existing == "foreign key 'fk_parent'"));
	}

	#[test]
	fn test_not_null_without_default_gets_implicit_default() {
		let mut table = TableBuilder::new("db", "t", 1).int("a").build();
		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		tracker.begin_add_columns(vec![
			CatalogColumn::new("n", ColumnType::Int).not_null(),
			CatalogColumn::new("m", ColumnType::Int),
		])
		.unwrap();
		tracker.finish().unwrap();

		assert_eq!(private(&table, "n").default, InstantDefault::Value(vec![0; 4]));
		assert_eq!(private(&table, "m").default, InstantDefault::Null);
	}

	#[test]
	fn test_virtual_columns_take_no_slot() {
		let mut table = TableBuilder::new("db", "t", 1).int("a").build();
		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		tracker.begin_add_columns(vec![CatalogColumn::new("v", ColumnType::Int).virtual_column()]).unwrap();
		let change = tracker.finish().unwrap();

		assert!(change.is_empty());
		assert_eq!(change.row_version, 0);
		assert_eq!(private(&table, "v").physical_position, None);
		assert_eq!(counters(&table).current, 1);
	}

	#[test]
	fn test_requested_position() {
		let mut table = TableBuilder::new("db", "t", 1).int("a").int("b").build();
		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		let mut first = CatalogColumn::new("z", ColumnType::Int);
		first.ordinal = 1;
		tracker.begin_add_columns(vec![first]).unwrap();
		tracker.finish().unwrap();

		let order: Vec<_> = table.columns.iter().map(|c| (c.name.as_str(), c.ordinal)).collect();
		assert_eq!(order, [("z", 1), ("a", 2), ("b", 3), (ROW_ID_COLUMN, 4)]);
		assert_eq!(private(&table, "z").physical_position, Some(2));
	}

	#[test]
	fn test_row_version_limit() {
		let mut table = TableBuilder::new("db", "t", 1).int("a").build();
		for n in 0..MAX_ROW_VERSIONS {
			let mut tracker = RowVersionTracker::new(&mut table).unwrap();
			tracker.begin_add_columns(vec![CatalogColumn::new(format!("c{}", n), ColumnType::Int)]).unwrap();
			tracker.finish().unwrap();
		}
		assert_eq!(counters(&table).row_version, MAX_ROW_VERSIONS);

		let mut tracker = RowVersionTracker::new(&mut table).unwrap();
		tracker.begin_add_columns(vec![CatalogColumn::new("last", ColumnType::Int)]).unwrap();
		assert!(matches!(tracker.finish().unwrap_err(), Error::RowVersionLimit { limit: MAX_ROW_VERSIONS, .. }));
	}

	#[test]
	fn test_dropped_column_name() {
		assert_eq!(dropped_column_name(3, 7, "price"), "!hidden!_dropped_v3_p7_price");
		assert!(is_dropped_column_name("!hidden!_dropped_v3_p7_price"));
		assert!(!is_dropped_column_name("price"));
	}
}
