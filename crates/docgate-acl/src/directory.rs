// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User directory: resolves user ids to their attributes.
//!
//! The compiler never reads the directory directly; the façade looks the user
//! up once per query and compiles against the returned copy.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::types::UserAttributes;

/// Read-only lookup of user attributes.
pub trait UserDirectory: Send + Sync {
	/// Returns an owned copy of the user's attributes, or `None` if the user is
	/// not known.
	fn lookup(&self, user_id: &str) -> Option<UserAttributes>;
}

impl<D: UserDirectory + ?Sized> UserDirectory for Arc<D> {
	fn lookup(&self, user_id: &str) -> Option<UserAttributes> {
		(**self).lookup(user_id)
	}
}

/// A fixed directory built once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
	users: HashMap<String, UserAttributes>,
}

impl StaticDirectory {
	pub fn new<I>(users: I) -> Self
	where
		I: IntoIterator<Item = UserAttributes>,
	{
		Self {
			users: users
				.into_iter()
				.map(|u| (u.user_id.clone(), u))
				.collect(),
		}
	}

	pub fn len(&self) -> usize {
		self.users.len()
	}

	pub fn is_empty(&self) -> bool {
		self.users.is_empty()
	}

	/// Users sorted by id.
	pub fn users(&self) -> Vec<&UserAttributes> {
		let mut users: Vec<_> = self.users.values().collect();
		users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
		users
	}
}

impl UserDirectory for StaticDirectory {
	fn lookup(&self, user_id: &str) -> Option<UserAttributes> {
		self.users.get(user_id).cloned()
	}
}

/// A directory whose contents can be replaced at runtime.
///
/// Replacement swaps in a whole new snapshot. A lookup sees either the old
/// snapshot or the new one, never a mix.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDirectory {
	current: Arc<RwLock<Arc<StaticDirectory>>>,
}

impl SnapshotDirectory {
	pub fn new(initial: StaticDirectory) -> Self {
		Self {
			current: Arc::new(RwLock::new(Arc::new(initial))),
		}
	}

	/// Returns the snapshot in effect right now.
	pub fn snapshot(&self) -> Arc<StaticDirectory> {
		match self.current.read() {
			Ok(guard) => Arc::clone(&*guard),
			Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
		}
	}

	/// Atomically replaces the directory contents.
	pub fn replace(&self, next: StaticDirectory) {
		debug!(user_count = next.len(), "replacing user directory snapshot");
		let next = Arc::new(next);
		match self.current.write() {
			Ok(mut guard) => *guard = next,
			Err(poisoned) => *poisoned.into_inner() = next,
		}
	}
}

impl UserDirectory for SnapshotDirectory {
	fn lookup(&self, user_id: &str) -> Option<UserAttributes> {
		self.snapshot().lookup(user_id)
	}
}
