// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute types for document access control.
//!
//! - [`UserAttributes`]: who is asking (identity, group memberships, roles)
//! - [`DocumentAttributes`]: what a document was tagged with at indexing time
//!
//! Both are plain values. The compiler borrows them and never mutates them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Owner sentinel for documents that every user may see.
pub const GLOBAL_OWNER: &str = "global";

/// Attributes of the user a filter is compiled for.
///
/// Groups and roles are ordered sets so the compiled filter text is stable
/// regardless of the order memberships were loaded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributes {
	pub user_id: String,
	#[serde(default)]
	pub groups: BTreeSet<String>,
	#[serde(default)]
	pub roles: BTreeSet<String>,
}

impl UserAttributes {
	/// Creates a user with no groups or roles.
	pub fn new(user_id: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			groups: BTreeSet::new(),
			roles: BTreeSet::new(),
		}
	}

	/// Builder: add group memberships.
	pub fn with_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.groups.extend(groups.into_iter().map(Into::into));
		self
	}

	/// Builder: add roles.
	pub fn with_roles<I, S>(mut self, roles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.roles.extend(roles.into_iter().map(Into::into));
		self
	}

	pub fn is_member_of(&self, group: &str) -> bool {
		self.groups.contains(group)
	}

	pub fn has_role(&self, role: &str) -> bool {
		self.roles.contains(role)
	}
}

/// Document-level attributes the access filter is evaluated against.
///
/// Field names match the corpus filter attributes. Serialization omits
/// attributes that were never set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAttributes {
	pub owner: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub groups: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub roles: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub project: Option<String>,
}

impl DocumentAttributes {
	/// Creates a private document owned by `owner`.
	pub fn owned_by(owner: impl Into<String>) -> Self {
		Self {
			owner: owner.into(),
			groups: None,
			roles: None,
			project: None,
		}
	}

	/// Creates a document visible to everyone.
	pub fn global() -> Self {
		Self::owned_by(GLOBAL_OWNER)
	}

	/// Builder: set the groups permitted to see the document.
	pub fn with_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.groups = Some(groups.into_iter().map(Into::into).collect());
		self
	}

	/// Builder: set the roles permitted to see the document.
	pub fn with_roles<I, S>(mut self, roles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.roles = Some(roles.into_iter().map(Into::into).collect());
		self
	}

	/// Builder: set the project tag.
	pub fn with_project(mut self, project: impl Into<String>) -> Self {
		self.project = Some(project.into());
		self
	}

	/// Looks up a document-level attribute by name.
	///
	/// Unknown names and unset attributes both come back as `None`, which the
	/// predicate language treats as null.
	pub fn get(&self, name: &str) -> Option<AttributeValue<'_>> {
		match name {
			"owner" => Some(AttributeValue::Text(&self.owner)),
			"groups" => self.groups.as_deref().map(AttributeValue::List),
			"roles" => self.roles.as_deref().map(AttributeValue::List),
			"project" => self.project.as_deref().map(AttributeValue::Text),
			_ => None,
		}
	}
}

/// A borrowed attribute value as seen by the predicate language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue<'a> {
	Text(&'a str),
	List(&'a [String]),
}
