// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_catalog::{CatalogEntity, CatalogIndex, EntityKind, IndexKind};
use reifydb_type::{ObjectKind, Result, corrupt};
use smallvec::SmallVec;
use tracing::instrument;

use crate::{
	ColumnArena, ColumnCounters, ColumnPrivate, IndexField, IndexPrivate, InternalColumn, InternalIndex, InternalTable,
	TableKind, TableLayout, TablePrivate,
	internal::key_prefix_length,
	version::{initial_positions, is_stored_user_column},
};

/// Builds the in-memory table for a catalog entity. The result is not yet bound to storage.
#[instrument(name = "dictionary::internal::build_table", level = "trace", skip(entity), fields(table = %entity.engine_name()))]
pub fn build_table(entity: &CatalogEntity) -> Result<InternalTable> {
	let layout = build_layout(entity)?;
	let private = TablePrivate::read(&entity.table.se_private, &entity.table.qualified_name().to_string())?;
	let kind = match &entity.kind {
		EntityKind::Whole => TableKind::Whole,
		EntityKind::Partition {
			parent,
			..
		} => TableKind::Partition {
			parent: *parent,
		},
	};

	Ok(InternalTable::new(
		entity.id(),
		kind,
		entity.engine_name(),
		entity.lock_name(),
		entity.space(),
		layout,
		private.autoinc,
	))
}

pub fn build_layout(entity: &CatalogEntity) -> Result<TableLayout> {
	let table = &entity.table;
	let name = table.qualified_name().to_string();
	let private = TablePrivate::read(&table.se_private, &name)?;
	let mut privates = table.columns.iter().map(|c| ColumnPrivate::read(c, &name)).collect::<Result<Vec<_>>>()?;

	let counters = match private.counters {
		Some(counters) => {
			for (column, private) in table.columns.iter().zip(&privates) {
				if is_stored_user_column(column) && private.physical_position.is_none() {
					return Err(corrupt!(
						ObjectKind::Column,
						format!("{}.{}", name, column.name),
						"stored column has no physical position"
					));
				}
			}
			counters
		}
		None => {
			// never altered instantly: the layout is implied by declaration order
			if privates.iter().any(|p| p.physical_position.is_some() || p.version_added.is_some()) {
				return Err(corrupt!(ObjectKind::Table, name, "column layout without row-version counters"));
			}
			let positions = initial_positions(table);
			let stored = positions.iter().filter(|p| p.is_some()).count() as u32;
			for (private, pos) in privates.iter_mut().zip(positions) {
				private.physical_position = pos;
			}
			ColumnCounters::initial(stored)
		}
	};

	let mut live = 0;
	let mut total = 0;
	for (column, private) in table.columns.iter().zip(&privates) {
		if !is_stored_user_column(column) {
			continue;
		}
		total += 1;
		if !private.is_dropped() {
			live += 1;
		}
		let newest = private.version_dropped.or(private.version_added).unwrap_or(0);
		if newest > counters.row_version {
			return Err(corrupt!(
				ObjectKind::Column,
				format!("{}.{}", name, column.name),
				"stamped with row version {} beyond table version {}",
				newest,
				counters.row_version
			));
		}
	}
	if live != counters.current || total != counters.total {
		return Err(corrupt!(
			ObjectKind::Table,
			name,
			"counters say {} live of {} stored columns, found {} of {}",
			counters.current,
			counters.total,
			live,
			total
		));
	}

	let columns: Vec<InternalColumn> = table
		.columns
		.iter()
		.zip(privates)
		.map(|(column, private)| InternalColumn {
			name: column.name.clone(),
			ordinal: column.ordinal,
			ty: column.ty,
			len: column.char_length,
			nullable: column.nullable,
			unsigned: column.unsigned,
			charset: column.charset,
			hidden: column.hidden,
			is_virtual: column.is_virtual,
			system: column.is_system(),
			physical_position: if is_stored_user_column(column) {
				private.physical_position
			} else {
				None
			},
			version_added: private.version_added,
			version_dropped: private.version_dropped,
			default: private.default,
		})
		.collect();

	let indexes = table.indexes.iter().map(|index| build_index(entity, index, &columns)).collect::<Result<Vec<_>>>()?;

	Ok(TableLayout {
		columns: ColumnArena::new(columns),
		indexes,
		counters,
	})
}

fn build_index(entity: &CatalogEntity, index: &CatalogIndex, columns: &[InternalColumn]) -> Result<InternalIndex> {
	let index_name = format!("{}.{}", entity.engine_name(), index.name);
	let Some(props) = entity.index_private(&index.name) else {
		return Err(corrupt!(ObjectKind::Index, index_name, "no storage metadata"));
	};
	let private = IndexPrivate::read(props, &index_name)?;
	if private.table != entity.id() {
		return Err(corrupt!(ObjectKind::Index, index_name, "belongs to table {}, not {}", private.table, entity.id()));
	}
	let clustered = index.kind == IndexKind::Primary;

	let fields = index
		.elements
		.iter()
		.map(|element| {
			let (Some(catalog_column), Some(column)) = (
				entity.table.column(&element.column),
				columns.iter().find(|c| c.name == element.column),
			) else {
				return Err(corrupt!(ObjectKind::Index, index_name, "references unknown column '{}'", element.column));
			};
			let prefix_len = key_prefix_length(element, catalog_column);
			Ok(IndexField {
				column: column.name.clone(),
				slot: column.physical_position.map(|pos| {
					if clustered && prefix_len > 0 {
						pos + 1
					} else {
						pos
					}
				}),
				prefix_len,
				descending: element.descending,
				hidden: element.hidden,
			})
		})
		.collect::<Result<SmallVec<[IndexField; 4]>>>()?;

	Ok(InternalIndex {
		id: private.id,
		name: index.name.clone(),
		kind: index.kind,
		table: private.table,
		space: private.space,
		root: private.root,
		trx_id: private.trx_id,
		nulls_equal: private.nulls_equal,
		fields,
	})
}
