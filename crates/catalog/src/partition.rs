// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_type::{SpaceId, TableId};
use serde::{Deserialize, Serialize};

use crate::Properties;

/// A partition shares columns and index definitions with its parent table but owns its
/// storage: its own engine id, tablespace and index roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPartition {
	pub id: TableId,
	pub name: String,
	pub parent: TableId,
	pub tablespace: SpaceId,
	#[serde(default)]
	pub indexes: Vec<PartitionIndex>,
	#[serde(default)]
	pub se_private: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionIndex {
	/// Name of the parent table index this partition index implements.
	pub index: String,
	#[serde(default)]
	pub se_private: Properties,
}

impl CatalogPartition {
	pub fn index(&self, name: &str) -> Option<&PartitionIndex> {
		self.indexes.iter().find(|i| i.index == name)
	}
}
