// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{ops::Deref, sync::Arc};

use crate::InternalTable;

/// A counted reference to a cached table. The table cannot be evicted while any handle is alive.
#[derive(Debug)]
pub struct TableHandle {
	table: Arc<InternalTable>,
}

impl TableHandle {
	pub(crate) fn new(table: Arc<InternalTable>) -> Self {
		table.acquire_ref();
		Self {
			table,
		}
	}

	pub fn ptr_eq(&self, other: &TableHandle) -> bool {
		Arc::ptr_eq(&self.table, &other.table)
	}
}

impl Clone for TableHandle {
	fn clone(&self) -> Self {
		Self::new(self.table.clone())
	}
}

impl Deref for TableHandle {
	type Target = InternalTable;

	fn deref(&self) -> &Self::Target {
		&self.table
	}
}

impl Drop for TableHandle {
	fn drop(&mut self) {
		self.table.release_ref();
	}
}
