// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Typed views of the engine data kept in se-private property bags.
//!
//! Every read of a bag goes through one of these structs, so malformed values surface as
//! [`reifydb_type::Error::Corrupt`] at this boundary and nowhere else. Keys this crate does not
//! know are carried through `extra` untouched.

pub use column::{ColumnPrivate, InstantDefault};
pub use index::IndexPrivate;
pub use table::{ColumnCounters, TablePrivate};
pub use tablespace::{SpaceState, TablespacePrivate};

pub mod column;
pub mod index;
pub mod table;
pub mod tablespace;

use reifydb_catalog::Properties;

/// Copies every entry whose key is not in `known`.
fn extra(props: &Properties, known: &[&str]) -> Properties {
	props.iter().filter(|(key, _)| !known.contains(key)).collect()
}
