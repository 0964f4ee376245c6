// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![allow(dead_code)]

use reifydb_catalog::{CatalogPartition, Properties, test_utils::TableBuilder};
use reifydb_type::{SpaceId, TableId};

/// Routes dictionary logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
		)
		.with_test_writer()
		.try_init();
}

pub fn partition(id: u64, name: &str, parent: u64, space: u32) -> CatalogPartition {
	CatalogPartition {
		id: TableId(id),
		name: name.to_string(),
		parent: TableId(parent),
		tablespace: SpaceId(space),
		indexes: vec![],
		se_private: Properties::new(),
	}
}

/// `schema.name (id INT PRIMARY KEY, v VARCHAR(40))`.
pub fn keyed(schema: &str, name: &str, id: u64) -> TableBuilder {
	TableBuilder::new(schema, name, id).int("id").varchar("v", 40).primary_key(&["id"])
}
