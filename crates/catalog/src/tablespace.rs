// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_type::SpaceId;
use serde::{Deserialize, Serialize};

use crate::Properties;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTablespace {
	pub id: SpaceId,
	pub name: String,
	pub files: Vec<TablespaceFile>,
	#[serde(default)]
	pub se_private: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablespaceFile {
	pub path: String,
	#[serde(default)]
	pub se_private: Properties,
}

impl CatalogTablespace {
	pub fn new(id: SpaceId, name: impl Into<String>, path: impl Into<String>) -> Self {
		Self {
			id,
			name: name.into(),
			files: vec![TablespaceFile {
				path: path.into(),
				se_private: Properties::new(),
			}],
			se_private: Properties::new(),
		}
	}

	pub fn first_file(&self) -> Option<&str> {
		self.files.first().map(|f| f.path.as_str())
	}
}
