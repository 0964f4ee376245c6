// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::{HashMap, HashSet},
	fmt,
	fmt::{Display, Formatter},
	path::{Path, PathBuf},
	sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::RwLock;
use reifydb_type::{Error, ObjectKind, PageNo, Result, SpaceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenStatus {
	Opened,
	Missing,
	FlagsMismatch {
		expected: u32,
		found: u32,
	},
}

impl Display for OpenStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			OpenStatus::Opened => f.write_str("opened"),
			OpenStatus::Missing => f.write_str("data file is missing"),
			OpenStatus::FlagsMismatch {
				expected,
				found,
			} => write!(f, "data file has flags {:#x}, expected {:#x}", found, expected),
		}
	}
}

/// Page-level storage below the dictionary. Only the calls needed to bind tables to their
/// data files are part of this interface.
pub trait PageStorage: Send + Sync {
	/// Creates a data file whose index root pages are `roots`.
	fn create(&self, space: SpaceId, path: &Path, flags: u32, roots: &[PageNo]) -> Result<()>;

	fn open(&self, space: SpaceId, path: &Path, flags: u32) -> OpenStatus;

	fn close(&self, space: SpaceId);

	/// Whether `page` exists in the open space `space`.
	fn has_page(&self, space: SpaceId, page: PageNo) -> bool;
}

#[derive(Debug, Clone)]
struct MemoryFile {
	flags: u32,
	pages: HashSet<PageNo>,
}

/// [`PageStorage`] over an in-memory file table.
#[derive(Debug, Default)]
pub struct MemoryStorage {
	files: RwLock<HashMap<PathBuf, MemoryFile>>,
	open: RwLock<HashMap<SpaceId, PathBuf>>,
	opens: AtomicUsize,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_file(&self, path: impl Into<PathBuf>, flags: u32, pages: &[u32]) {
		self.files.write().insert(
			path.into(),
			MemoryFile {
				flags,
				pages: pages.iter().copied().map(PageNo).collect(),
			},
		);
	}

	pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
		self.files.write().remove(path.as_ref()).is_some()
	}

	pub fn has_file(&self, path: impl AsRef<Path>) -> bool {
		self.files.read().contains_key(path.as_ref())
	}

	pub fn is_open(&self, space: SpaceId) -> bool {
		self.open.read().contains_key(&space)
	}

	/// Successful opens so far.
	pub fn open_count(&self) -> usize {
		self.opens.load(Ordering::Relaxed)
	}
}

impl PageStorage for MemoryStorage {
	fn create(&self, _space: SpaceId, path: &Path, flags: u32, roots: &[PageNo]) -> Result<()> {
		let mut files = self.files.write();
		if files.contains_key(path) {
			return Err(Error::already_exists(ObjectKind::Tablespace, path.display().to_string()));
		}
		files.insert(
			path.to_path_buf(),
			MemoryFile {
				flags,
				pages: roots.iter().copied().collect(),
			},
		);
		Ok(())
	}

	fn open(&self, space: SpaceId, path: &Path, flags: u32) -> OpenStatus {
		let files = self.files.read();
		let Some(file) = files.get(path) else {
			return OpenStatus::Missing;
		};
		if file.flags != flags {
			return OpenStatus::FlagsMismatch {
				expected: flags,
				found: file.flags,
			};
		}
		self.open.write().insert(space, path.to_path_buf());
		self.opens.fetch_add(1, Ordering::Relaxed);
		OpenStatus::Opened
	}

	fn close(&self, space: SpaceId) {
		self.open.write().remove(&space);
	}

	fn has_page(&self, space: SpaceId, page: PageNo) -> bool {
		let open = self.open.read();
		let Some(path) = open.get(&space) else {
			return false;
		};
		self.files.read().get(path).map(|f| f.pages.contains(&page)).unwrap_or(false)
	}
}
