// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

/// A schema-qualified object name; the unit metadata locks are taken on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
	pub schema: String,
	pub name: String,
}

impl QualifiedName {
	pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			schema: schema.into(),
			name: name.into(),
		}
	}

	/// Parses the legacy `schema/name` form.
	pub fn from_legacy(path: &str) -> Option<Self> {
		let (schema, name) = path.split_once('/')?;
		if schema.is_empty() || name.is_empty() {
			return None;
		}
		Some(Self::new(schema, name))
	}
}

impl Display for QualifiedName {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.schema, self.name)
	}
}
