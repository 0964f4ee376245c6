// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub use build::{build_layout, build_table};
pub use column::{ColumnArena, InternalColumn};
pub use index::{IndexField, InternalIndex, key_prefix_length};
pub use table::{InternalTable, SpaceBinding, TableKind, TableLayout};

mod build;
mod column;
mod index;
mod table;
