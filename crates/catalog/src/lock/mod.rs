// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Metadata locks (MDL) on schema-qualified names.
//!
//! Opening a table takes a shared lock, DDL takes an exclusive one. Locks are acquired before
//! the dictionary's own catalog lock and released in reverse order, which [`MdlGuard`] enforces
//! by releasing on drop.

use std::{
	collections::HashMap,
	fmt,
	fmt::{Display, Formatter},
	sync::atomic::{AtomicU64, Ordering},
	time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};
use reifydb_type::{Error, Result};
use tracing::{debug, instrument};

use crate::QualifiedName;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LockMode {
	Shared,
	Exclusive,
}

impl Display for LockMode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			LockMode::Shared => f.write_str("shared"),
			LockMode::Exclusive => f.write_str("exclusive"),
		}
	}
}

/// Proof of a granted lock. Deliberately not `Clone`: each ticket is released exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct MdlTicket {
	id: u64,
	name: QualifiedName,
	mode: LockMode,
}

impl MdlTicket {
	pub fn new(id: u64, name: QualifiedName, mode: LockMode) -> Self {
		Self {
			id,
			name,
			mode,
		}
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn name(&self) -> &QualifiedName {
		&self.name
	}

	pub fn mode(&self) -> LockMode {
		self.mode
	}
}

pub trait MetadataLocks: Send + Sync {
	fn acquire_shared(&self, name: &QualifiedName) -> Result<MdlTicket>;

	fn acquire_exclusive(&self, name: &QualifiedName) -> Result<MdlTicket>;

	fn release(&self, ticket: MdlTicket);
}

/// Releases its ticket when dropped.
pub struct MdlGuard<'a> {
	locks: &'a dyn MetadataLocks,
	ticket: Option<MdlTicket>,
}

impl<'a> MdlGuard<'a> {
	pub fn shared(locks: &'a dyn MetadataLocks, name: &QualifiedName) -> Result<Self> {
		let ticket = locks.acquire_shared(name)?;
		Ok(Self {
			locks,
			ticket: Some(ticket),
		})
	}

	pub fn exclusive(locks: &'a dyn MetadataLocks, name: &QualifiedName) -> Result<Self> {
		let ticket = locks.acquire_exclusive(name)?;
		Ok(Self {
			locks,
			ticket: Some(ticket),
		})
	}

	pub fn name(&self) -> Option<&QualifiedName> {
		self.ticket.as_ref().map(MdlTicket::name)
	}

	pub fn release(mut self) {
		if let Some(ticket) = self.ticket.take() {
			self.locks.release(ticket);
		}
	}
}

impl Drop for MdlGuard<'_> {
	fn drop(&mut self) {
		if let Some(ticket) = self.ticket.take() {
			self.locks.release(ticket);
		}
	}
}

#[derive(Debug, Default)]
struct LockEntry {
	shared: usize,
	exclusive: bool,
}

impl LockEntry {
	fn grantable(&self, mode: LockMode) -> bool {
		match mode {
			LockMode::Shared => !self.exclusive,
			LockMode::Exclusive => !self.exclusive && self.shared == 0,
		}
	}

	fn is_free(&self) -> bool {
		self.shared == 0 && !self.exclusive
	}
}

/// In-process lock manager. Waiters block on a condition variable; with a wait timeout set,
/// an over-long wait fails with [`Error::LockTimeout`].
pub struct LockManager {
	entries: Mutex<HashMap<QualifiedName, LockEntry>>,
	released: Condvar,
	next_ticket: AtomicU64,
	wait_timeout: Option<Duration>,
}

impl Default for LockManager {
	fn default() -> Self {
		Self::new()
	}
}

impl LockManager {
	pub fn new() -> Self {
		Self {
			entries: Mutex::new(HashMap::new()),
			released: Condvar::new(),
			next_ticket: AtomicU64::new(1),
			wait_timeout: None,
		}
	}

	pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.wait_timeout = timeout;
		self
	}

	/// Number of granted locks across all names.
	pub fn held(&self) -> usize {
		self.entries.lock().values().map(|e| e.shared + usize::from(e.exclusive)).sum()
	}

	pub fn mode_held(&self, name: &QualifiedName) -> Option<LockMode> {
		let entries = self.entries.lock();
		let entry = entries.get(name)?;
		if entry.exclusive {
			Some(LockMode::Exclusive)
		} else if entry.shared > 0 {
			Some(LockMode::Shared)
		} else {
			None
		}
	}

	#[instrument(name = "catalog::lock::acquire", level = "trace", skip(self))]
	fn acquire(&self, name: &QualifiedName, mode: LockMode) -> Result<MdlTicket> {
		let deadline = self.wait_timeout.map(|t| Instant::now() + t);
		let mut entries = self.entries.lock();
		loop {
			let entry = entries.entry(name.clone()).or_default();
			if entry.grantable(mode) {
				match mode {
					LockMode::Shared => entry.shared += 1,
					LockMode::Exclusive => entry.exclusive = true,
				}
				break;
			}

			debug!(%name, %mode, "waiting for metadata lock");
			match deadline {
				Some(deadline) => {
					if self.released.wait_until(&mut entries, deadline).timed_out() {
						if entries.get(name).map(LockEntry::is_free).unwrap_or(false) {
							entries.remove(name);
						}
						return Err(Error::LockTimeout {
							name: name.to_string(),
							mode: match mode {
								LockMode::Shared => "shared",
								LockMode::Exclusive => "exclusive",
							},
						});
					}
				}
				None => self.released.wait(&mut entries),
			}
		}

		let id = self.next_ticket.fetch_add(1, Ordering::Relaxed);
		Ok(MdlTicket::new(id, name.clone(), mode))
	}
}

impl MetadataLocks for LockManager {
	fn acquire_shared(&self, name: &QualifiedName) -> Result<MdlTicket> {
		self.acquire(name, LockMode::Shared)
	}

	fn acquire_exclusive(&self, name: &QualifiedName) -> Result<MdlTicket> {
		self.acquire(name, LockMode::Exclusive)
	}

	fn release(&self, ticket: MdlTicket) {
		let mut entries = self.entries.lock();
		if let Some(entry) = entries.get_mut(&ticket.name) {
			match ticket.mode {
				LockMode::Shared => entry.shared = entry.shared.saturating_sub(1),
				LockMode::Exclusive => entry.exclusive = false,
			}
			if entry.is_free() {
				entries.remove(&ticket.name);
			}
		}
		drop(entries);
		self.released.notify_all();
	}
}
