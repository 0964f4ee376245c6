// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeMap;

use parking_lot::Mutex;
use reifydb_type::{Error, ObjectKind, Result, SpaceId};
use tracing::debug;

use crate::SpaceState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoSpace {
	pub id: SpaceId,
	pub name: String,
	pub state: SpaceState,
}

/// Undo tablespaces, tracked apart from table spaces. An undo space is taken out of service
/// by moving it `active -> inactive -> empty` and put back with `empty -> active`.
#[derive(Debug, Default)]
pub struct UndoSpaces {
	spaces: Mutex<BTreeMap<SpaceId, UndoSpace>>,
}

impl UndoSpaces {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, id: SpaceId, name: impl Into<String>) -> Result<()> {
		let name = name.into();
		if !id.is_undo() {
			return Err(Error::InvalidState {
				name,
				from: format!("space id {}", id),
				to: SpaceState::Active.to_string(),
			});
		}
		let mut spaces = self.spaces.lock();
		if spaces.contains_key(&id) || spaces.values().any(|s| s.name == name) {
			return Err(Error::already_exists(ObjectKind::Tablespace, name));
		}
		spaces.insert(
			id,
			UndoSpace {
				id,
				name,
				state: SpaceState::Active,
			},
		);
		Ok(())
	}

	pub fn get(&self, id: SpaceId) -> Option<UndoSpace> {
		self.spaces.lock().get(&id).cloned()
	}

	pub fn by_name(&self, name: &str) -> Option<UndoSpace> {
		self.spaces.lock().values().find(|s| s.name == name).cloned()
	}

	pub fn state(&self, id: SpaceId) -> Option<SpaceState> {
		self.spaces.lock().get(&id).map(|s| s.state)
	}

	/// Spaces currently accepting undo records.
	pub fn active(&self) -> Vec<SpaceId> {
		self.spaces.lock().values().filter(|s| s.state == SpaceState::Active).map(|s| s.id).collect()
	}

	pub fn transition(&self, id: SpaceId, to: SpaceState) -> Result<()> {
		let mut spaces = self.spaces.lock();
		let Some(space) = spaces.get_mut(&id) else {
			return Err(Error::not_found(ObjectKind::Tablespace, format!("undo space {}", id)));
		};
		let allowed = matches!(
			(space.state, to),
			(SpaceState::Active, SpaceState::Inactive)
				| (SpaceState::Inactive, SpaceState::Empty)
				| (SpaceState::Inactive, SpaceState::Active)
				| (SpaceState::Empty, SpaceState::Active)
		);
		if !allowed {
			return Err(Error::InvalidState {
				name: space.name.clone(),
				from: space.state.to_string(),
				to: to.to_string(),
			});
		}
		debug!(space = %space.name, from = %space.state, %to, "undo space state change");
		space.state = to;
		Ok(())
	}

	pub fn remove(&self, id: SpaceId) -> Option<UndoSpace> {
		self.spaces.lock().remove(&id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_lifecycle() {
		let undo = UndoSpaces::new();
		undo.register(SpaceId::UNDO_FIRST, "undo_001").unwrap();
		assert_eq!(undo.active(), [SpaceId::UNDO_FIRST]);

		undo.transition(SpaceId::UNDO_FIRST, SpaceState::Inactive).unwrap();
		assert!(undo.active().is_empty());
		undo.transition(SpaceId::UNDO_FIRST, SpaceState::Empty).unwrap();
		undo.transition(SpaceId::UNDO_FIRST, SpaceState::Active).unwrap();
		assert_eq!(undo.state(SpaceId::UNDO_FIRST), Some(SpaceState::Active));
	}

	#[test]
	fn test_invalid_transitions() {
		let undo = UndoSpaces::new();
		undo.register(SpaceId::UNDO_FIRST, "undo_001").unwrap();

		let err = undo.transition(SpaceId::UNDO_FIRST, SpaceState::Empty).unwrap_err();
		assert!(matches!(err, Error::InvalidState { ref from, ref to, .. } if from == "active" && to == "empty"));
		assert!(undo.transition(SpaceId::UNDO_FIRST, SpaceState::Discarded).is_err());
		assert!(undo.transition(SpaceId(0xFFFF_FF01), SpaceState::Inactive).unwrap_err().is_not_found());
	}

	#[test]
	fn test_register_outside_undo_range() {
		let undo = UndoSpaces::new();
		assert!(undo.register(SpaceId(12), "undo_x").is_err());
		undo.register(SpaceId::UNDO_LAST, "undo_002").unwrap();
		assert!(matches!(undo.register(SpaceId::UNDO_FIRST, "undo_002"), Err(Error::AlreadyExists { .. })));
	}
}
