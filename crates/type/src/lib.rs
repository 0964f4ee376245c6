// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use error::{Error, ObjectKind};
pub use id::{IndexId, PageNo, SpaceId, TableId};
pub use value::{Charset, ColumnType};

pub mod error;
pub mod id;
pub mod value;

pub type Result<T> = std::result::Result<T, Error>;
