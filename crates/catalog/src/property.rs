// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{fmt::Display, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// String-keyed property bag attached to generic catalog objects.
///
/// Values are kept as text; typed access happens only where a bag is read into or written from
/// an engine structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, String>);

impl Properties {
	pub fn new() -> Self {
		Self(IndexMap::new())
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn set(&mut self, key: impl Into<String>, value: impl Display) {
		self.0.insert(key.into(), value.to_string());
	}

	pub fn remove(&mut self, key: &str) -> Option<String> {
		self.0.shift_remove(key)
	}

	/// Parses `key` as `T`. `Ok(None)` if absent, `Err` carries the offending text.
	pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, String> {
		match self.0.get(key) {
			None => Ok(None),
			Some(raw) => raw.parse::<T>().map(Some).map_err(|_| format!("property '{}' has invalid value '{}'", key, raw)),
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn clear(&mut self) {
		self.0.clear();
	}
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Properties {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut result = Properties::new();
		for (k, v) in iter {
			result.set(k, v);
		}
		result
	}
}
