// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	fmt::{Display, Formatter},
	ops::Deref,
};

use serde::{Deserialize, Serialize};

macro_rules! define_id {
	($(#[$meta:meta])* $name:ident($inner:ty)) => {
		$(#[$meta])*
		#[repr(transparent)]
		#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(pub $inner);

		impl Deref for $name {
			type Target = $inner;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}

		impl PartialEq<$inner> for $name {
			fn eq(&self, other: &$inner) -> bool {
				self.0.eq(other)
			}
		}

		impl From<$name> for $inner {
			fn from(value: $name) -> Self {
				value.0
			}
		}

		impl From<$inner> for $name {
			fn from(value: $inner) -> Self {
				Self(value)
			}
		}

		impl Display for $name {
			fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
				Display::fmt(&self.0, f)
			}
		}
	};
}

define_id!(
	/// Engine table id. Partitions share the id space with whole tables.
	TableId(u64)
);

define_id!(IndexId(u64));

define_id!(
	/// Engine tablespace id.
	SpaceId(u32)
);

define_id!(PageNo(u32));

impl SpaceId {
	/// The shared system tablespace.
	pub const SYSTEM: SpaceId = SpaceId(0);
	/// The tablespace holding the unified dictionary itself.
	pub const DICTIONARY: SpaceId = SpaceId(0xFFFF_FFFE);
	/// The session temporary tablespace.
	pub const TEMPORARY: SpaceId = SpaceId(0xFFFF_FFFD);

	pub const UNDO_FIRST: SpaceId = SpaceId(0xFFFF_FF00);
	pub const UNDO_LAST: SpaceId = SpaceId(0xFFFF_FFEF);

	/// Resident spaces are opened at startup and never resolved through the catalog.
	pub fn is_resident(self) -> bool {
		self == Self::SYSTEM || self == Self::DICTIONARY || self == Self::TEMPORARY
	}

	pub fn is_undo(self) -> bool {
		(Self::UNDO_FIRST.0..=Self::UNDO_LAST.0).contains(&self.0)
	}
}

impl PageNo {
	pub const NULL: PageNo = PageNo(u32::MAX);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_resident_spaces() {
		assert!(SpaceId::SYSTEM.is_resident());
		assert!(SpaceId::TEMPORARY.is_resident());
		assert!(SpaceId::DICTIONARY.is_resident());
		assert!(!SpaceId(7).is_resident());
	}

	#[test]
	fn test_undo_range() {
		assert!(SpaceId(0xFFFF_FF00).is_undo());
		assert!(SpaceId(0xFFFF_FFEF).is_undo());
		assert!(!SpaceId::TEMPORARY.is_undo());
		assert!(!SpaceId(12).is_undo());
	}

	#[test]
	fn test_serde_transparent() {
		let json = serde_json::to_string(&TableId(42)).unwrap();
		assert_eq!(json, "42");
		let id: TableId = serde_json::from_str("42").unwrap();
		assert_eq!(id, 42);
	}
}
