// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_catalog::{CatalogColumn, CatalogIndex, CatalogTable, IndexKind, QualifiedName};
use reifydb_type::{ColumnType, Error, Result};

use super::legacy::{LegacyColumn, LegacyIndex, LegacyTable, mtype, type_class};
use crate::{IndexPrivate, internal::key_prefix_length, version::is_dropped_column_name};

/// The one tolerated type drift: legacy servers stored GEOMETRY columns with the BLOB main type.
const GEOMETRY_STORED_AS_BLOB: (ColumnType, u8) = (ColumnType::Geometry, mtype::BLOB);

/// Compares a legacy table with its unified counterpart. Returns the warnings of a match;
/// any structural difference is an [`Error::StructuralMismatch`].
pub fn verify_table(legacy: &LegacyTable, unified: &CatalogTable) -> Result<Vec<String>> {
	let mut check = Check {
		table: unified.qualified_name().to_string(),
		warnings: vec![],
	};
	check.columns(legacy, unified)?;
	check.indexes(legacy, unified)?;
	check.foreign_keys(legacy)?;
	Ok(check.warnings)
}

struct Check {
	table: String,
	warnings: Vec<String>,
}

impl Check {
	fn mismatch(&self, detail: String) -> Error {
		Error::StructuralMismatch {
			table: self.table.clone(),
			detail,
		}
	}

	fn columns(&mut self, legacy: &LegacyTable, unified: &CatalogTable) -> Result<()> {
		let unified_columns: Vec<&CatalogColumn> =
			unified.columns.iter().filter(|c| !is_dropped_column_name(&c.name)).collect();
		let row_id = usize::from(!legacy.has_explicit_primary_key());
		let expected = legacy.user_columns().count() + row_id;
		if unified_columns.len() != expected {
			return Err(self.mismatch(format!(
				"unified catalog has {} columns, legacy catalog implies {}",
				unified_columns.len(),
				expected
			)));
		}

		let user = unified_columns.into_iter().filter(|c| !c.is_system());
		for (column, old) in user.zip(legacy.user_columns()) {
			self.column(column, old)?;
		}
		Ok(())
	}

	fn column(&mut self, column: &CatalogColumn, old: &LegacyColumn) -> Result<()> {
		let name = &column.name;
		if !name.eq_ignore_ascii_case(&old.name) {
			return Err(self.mismatch(format!("column '{}' found where '{}' was expected", name, old.name)));
		}

		let stored_as_blob = (column.ty, old.mtype) == GEOMETRY_STORED_AS_BLOB;
		if stored_as_blob {
			self.warnings.push(format!("column '{}' is GEOMETRY but was stored as BLOB", name));
		} else {
			let class = type_class(column.ty, column.charset);
			if class != old.mtype {
				return Err(self.mismatch(format!(
					"column '{}' has type class {}, legacy catalog has {}",
					name, class, old.mtype
				)));
			}
		}

		if column.nullable != old.is_nullable() {
			return Err(self.mismatch(format!("column '{}' differs in nullability", name)));
		}
		if column.ty.is_numeric() && column.unsigned != old.is_unsigned() {
			return Err(self.mismatch(format!("column '{}' differs in signedness", name)));
		}
		if column.ty.is_binary() != old.is_binary() {
			return Err(self.mismatch(format!("column '{}' differs in binary flag", name)));
		}
		if !stored_as_blob {
			if let Some(length) = declared_length(column) {
				if length != old.len {
					return Err(self.mismatch(format!(
						"column '{}' has length {}, legacy catalog has {}",
						name, length, old.len
					)));
				}
			}
		}
		if column.ty.is_character() && column.charset.0 != old.charset() {
			return Err(self.mismatch(format!(
				"column '{}' has charset {}, legacy catalog has {}",
				name,
				column.charset.0,
				old.charset()
			)));
		}
		Ok(())
	}

	fn indexes(&mut self, legacy: &LegacyTable, unified: &CatalogTable) -> Result<()> {
		if unified.indexes.len() != legacy.indexes.len() {
			return Err(self.mismatch(format!(
				"unified catalog has {} indexes, legacy catalog has {}",
				unified.indexes.len(),
				legacy.indexes.len()
			)));
		}
		for (index, old) in unified.indexes.iter().zip(&legacy.indexes) {
			self.index(unified, index, old)?;
		}
		Ok(())
	}

	fn index(&mut self, table: &CatalogTable, index: &CatalogIndex, old: &LegacyIndex) -> Result<()> {
		let name = &index.name;
		if !name.eq_ignore_ascii_case(&old.name) {
			return Err(self.mismatch(format!("index '{}' found where '{}' was expected", name, old.name)));
		}

		let flags = [
			("clustered", index.kind == IndexKind::Primary, old.is_clustered()),
			("unique", index.kind.is_unique(), old.is_unique()),
			("fulltext", index.kind == IndexKind::Fulltext, old.is_fulltext()),
			("spatial", index.kind == IndexKind::Spatial, old.is_spatial()),
		];
		if let Some((flag, _, _)) = flags.iter().find(|(_, unified, legacy)| unified != legacy) {
			return Err(self.mismatch(format!("index '{}' differs in {} flag", name, flag)));
		}

		let nulls_equal = IndexPrivate::read_nulls_equal(&index.se_private, &format!("{}.{}", self.table, name))?;
		if nulls_equal != old.nulls_equal {
			return Err(self.mismatch(format!("index '{}' differs in null equality", name)));
		}

		let elements: Vec<_> = index.visible_elements().collect();
		if elements.len() != old.fields.len() {
			return Err(self.mismatch(format!(
				"index '{}' has {} fields, legacy catalog has {}",
				name,
				elements.len(),
				old.fields.len()
			)));
		}
		for (element, field) in elements.into_iter().zip(&old.fields) {
			if !element.column.eq_ignore_ascii_case(&field.name) {
				return Err(self.mismatch(format!(
					"index '{}' has field '{}' where '{}' was expected",
					name, element.column, field.name
				)));
			}
			let prefix = table.column(&element.column).map(|c| key_prefix_length(element, c)).unwrap_or(0);
			if prefix != field.prefix_len {
				return Err(self.mismatch(format!(
					"field '{}' of index '{}' has prefix {}, legacy catalog has {}",
					element.column, name, prefix, field.prefix_len
				)));
			}
		}
		Ok(())
	}
}

impl Check {
	fn foreign_keys(&mut self, legacy: &LegacyTable) -> Result<()> {
		for fk in &legacy.foreign_keys {
			if QualifiedName::from_legacy(&fk.referenced_table).is_none() {
				return Err(self.mismatch(format!(
					"foreign key '{}' references malformed table name '{}'",
					fk.id, fk.referenced_table
				)));
			}
			if fk.for_columns.is_empty() || fk.for_columns.len() != fk.referenced_columns.len() {
				return Err(self.mismatch(format!(
					"foreign key '{}' maps {} columns to {}",
					fk.id,
					fk.for_columns.len(),
					fk.referenced_columns.len()
				)));
			}
		}
		Ok(())
	}
}

/// Declared data length as the legacy catalog records it. Off-row types are not compared.
fn declared_length(column: &CatalogColumn) -> Option<u32> {
	if column.ty.is_lob() {
		return None;
	}
	let prefix = column.ty.length_prefix_bytes(column.char_length);
	let pack_length = column.ty.fixed_length().unwrap_or(column.char_length + prefix);
	Some(pack_length - prefix)
}
