// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	fmt::{Display, Formatter},
	str::FromStr,
};

use reifydb_catalog::Properties;
use reifydb_type::{ObjectKind, Result, corrupt};

pub const FLAGS: &str = "flags";
pub const STATE: &str = "state";
pub const AUTOEXTEND_SIZE: &str = "autoextend_size";

const KNOWN: &[&str] = &[FLAGS, STATE, AUTOEXTEND_SIZE];

/// Lifecycle state of a tablespace. `Active`, `Inactive` and `Empty` apply to undo spaces only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum SpaceState {
	#[default]
	Normal,
	Discarded,
	Active,
	Inactive,
	Empty,
}

impl SpaceState {
	pub fn as_str(self) -> &'static str {
		match self {
			SpaceState::Normal => "normal",
			SpaceState::Discarded => "discarded",
			SpaceState::Active => "active",
			SpaceState::Inactive => "inactive",
			SpaceState::Empty => "empty",
		}
	}
}

impl Display for SpaceState {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SpaceState {
	type Err = ();

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"normal" => Ok(SpaceState::Normal),
			"discarded" => Ok(SpaceState::Discarded),
			"active" => Ok(SpaceState::Active),
			"inactive" => Ok(SpaceState::Inactive),
			"empty" => Ok(SpaceState::Empty),
			_ => Err(()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TablespacePrivate {
	pub flags: u32,
	pub state: SpaceState,
	pub autoextend_size: u64,
	pub extra: Properties,
}

impl TablespacePrivate {
	pub fn read(props: &Properties, name: &str) -> Result<Self> {
		Ok(Self {
			flags: props.parse::<u32>(FLAGS).map_err(|e| corrupt!(ObjectKind::Tablespace, name, "{}", e))?.unwrap_or(0),
			state: props
				.parse::<SpaceState>(STATE)
				.map_err(|e| corrupt!(ObjectKind::Tablespace, name, "{}", e))?
				.unwrap_or_default(),
			autoextend_size: props
				.parse::<u64>(AUTOEXTEND_SIZE)
				.map_err(|e| corrupt!(ObjectKind::Tablespace, name, "{}", e))?
				.unwrap_or(0),
			extra: super::extra(props, KNOWN),
		})
	}

	pub fn write(&self, props: &mut Properties) {
		for key in KNOWN {
			props.remove(key);
		}
		props.set(FLAGS, self.flags);
		props.set(STATE, self.state);
		if self.autoextend_size > 0 {
			props.set(AUTOEXTEND_SIZE, self.autoextend_size);
		}
		for (key, value) in self.extra.iter() {
			props.set(key, value);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_state_text() {
		for state in [SpaceState::Normal, SpaceState::Discarded, SpaceState::Active, SpaceState::Inactive, SpaceState::Empty] {
			assert_eq!(state.as_str().parse::<SpaceState>(), Ok(state));
		}
		assert!("gone".parse::<SpaceState>().is_err());
	}

	#[test]
	fn test_round_trip() {
		let private = TablespacePrivate {
			flags: 0x21,
			state: SpaceState::Discarded,
			autoextend_size: 0,
			extra: Properties::new(),
		};
		let mut props = Properties::new();
		private.write(&mut props);
		assert_eq!(props.get(STATE), Some("discarded"));
		assert_eq!(TablespacePrivate::read(&props, "db/t").unwrap(), private);
	}
}
