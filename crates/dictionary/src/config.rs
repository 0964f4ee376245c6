// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{path::PathBuf, time::Duration};

/// Configuration of a [`crate::Dictionary`].
#[derive(Debug, Clone)]
pub struct DictionaryConfig {
	/// How often opening a table by id may observe a concurrent rename before giving up with
	/// [`crate::Error::RenameConflict`]. `None` retries until the name is stable.
	pub rename_retry_limit: Option<usize>,
	/// Maximum wait for a metadata lock, `None` waits indefinitely.
	pub lock_wait_timeout: Option<Duration>,
	/// Root under which file-per-table tablespaces without a recorded path are looked up.
	pub data_dir: PathBuf,
	/// Probe every index root page when binding a table to its tablespace.
	pub validate_root_pages: bool,
	/// Load and link foreign keys when a table is opened.
	pub load_foreign_keys: bool,
}

impl Default for DictionaryConfig {
	fn default() -> Self {
		Self {
			rename_retry_limit: None,
			lock_wait_timeout: None,
			data_dir: PathBuf::from("."),
			validate_root_pages: true,
			load_foreign_keys: true,
		}
	}
}

impl DictionaryConfig {
	pub fn builder() -> DictionaryConfigBuilder {
		DictionaryConfigBuilder::new()
	}
}

pub struct DictionaryConfigBuilder {
	config: DictionaryConfig,
}

impl Default for DictionaryConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl DictionaryConfigBuilder {
	pub fn new() -> Self {
		Self {
			config: DictionaryConfig::default(),
		}
	}

	pub fn rename_retry_limit(mut self, limit: usize) -> Self {
		self.config.rename_retry_limit = Some(limit);
		self
	}

	pub fn lock_wait_timeout(mut self, timeout: Duration) -> Self {
		self.config.lock_wait_timeout = Some(timeout);
		self
	}

	pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.config.data_dir = dir.into();
		self
	}

	pub fn validate_root_pages(mut self, validate: bool) -> Self {
		self.config.validate_root_pages = validate;
		self
	}

	pub fn load_foreign_keys(mut self, load: bool) -> Self {
		self.config.load_foreign_keys = load;
		self
	}

	pub fn build(self) -> DictionaryConfig {
		self.config
	}
}
