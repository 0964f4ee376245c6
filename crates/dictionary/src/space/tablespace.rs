// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use reifydb_type::SpaceId;

use crate::SpaceState;

/// An open tablespace. Owned by the space registry; tables only hold weak references.
#[derive(Debug)]
pub struct Tablespace {
	id: SpaceId,
	name: RwLock<String>,
	flags: u32,
	path: PathBuf,
	state: RwLock<SpaceState>,
}

impl Tablespace {
	pub fn new(id: SpaceId, name: impl Into<String>, flags: u32, path: impl Into<PathBuf>, state: SpaceState) -> Self {
		Self {
			id,
			name: RwLock::new(name.into()),
			flags,
			path: path.into(),
			state: RwLock::new(state),
		}
	}

	pub fn id(&self) -> SpaceId {
		self.id
	}

	pub fn name(&self) -> String {
		self.name.read().clone()
	}

	pub fn flags(&self) -> u32 {
		self.flags
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn state(&self) -> SpaceState {
		*self.state.read()
	}

	pub(crate) fn set_name(&self, name: impl Into<String>) {
		*self.name.write() = name.into();
	}

	pub(crate) fn set_state(&self, state: SpaceState) {
		*self.state.write() = state;
	}
}
