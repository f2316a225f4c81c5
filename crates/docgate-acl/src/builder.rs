// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sub-clause builders for the access predicate.
//!
//! Each builder looks at one attribute family of the document:
//!
//! - [`owner_clause`]: the document is global or owned by the user
//! - [`group_clause`]: the document is shared with one of the user's groups
//! - [`role_clause`]: the document has no role requirement, or the user holds one
//!   of the required roles
//!
//! All builders are pure; they borrow the user and allocate a fresh [`Expr`].

use serde::{Deserialize, Serialize};

use crate::expr::{Attribute, Expr, GROUPS, OWNER, ROLES};
use crate::types::{UserAttributes, GLOBAL_OWNER};

/// How the group clause treats a user that belongs to no groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMatchMode {
	/// A groupless user never matches through the group pathway. With this mode
	/// the compiled predicate is monotonic in the user's groups and roles.
	#[default]
	RequireMembership,
	/// A groupless user matches every document that has any groups set. Legacy
	/// behaviour, kept for compatibility with existing corpora.
	PresenceOnly,
}

impl GroupMatchMode {
	pub fn as_str(self) -> &'static str {
		match self {
			GroupMatchMode::RequireMembership => "require_membership",
			GroupMatchMode::PresenceOnly => "presence_only",
		}
	}
}

impl std::fmt::Display for GroupMatchMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for GroupMatchMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
			"require_membership" => Ok(GroupMatchMode::RequireMembership),
			"presence_only" => Ok(GroupMatchMode::PresenceOnly),
			other => Err(format!(
				"unknown group match mode '{other}' (expected require_membership or presence_only)"
			)),
		}
	}
}

/// `doc.owner IN ('global', '<user_id>')`
pub fn owner_clause(user: &UserAttributes) -> Expr {
	Expr::one_of(
		Attribute::doc(OWNER),
		[GLOBAL_OWNER, user.user_id.as_str()],
	)
}

/// Documents shared with at least one of the user's groups.
///
/// With groups: `(doc.groups IS NOT NULL) AND (('g1' IN doc.groups) OR ...)`.
/// Without groups the result depends on `mode`.
pub fn group_clause(user: &UserAttributes, mode: GroupMatchMode) -> Expr {
	let groups = Attribute::doc(GROUPS);
	let present = Expr::is_not_null(groups.clone());

	if user.groups.is_empty() {
		return match mode {
			GroupMatchMode::PresenceOnly => present,
			// Empty membership disjunction: nothing can satisfy it.
			GroupMatchMode::RequireMembership => Expr::and(present, Expr::is_null(groups)),
		};
	}

	let checks = user
		.groups
		.iter()
		.map(|g| Expr::contains(groups.clone(), g.as_str()))
		.collect();

	Expr::and(present, Expr::Or(checks))
}

/// Documents without a role requirement, or requiring a role the user holds.
///
/// With roles: `(doc.roles IS NULL) OR (('r1' IN doc.roles) OR ...)`.
/// Without roles: `doc.roles IS NULL`.
pub fn role_clause(user: &UserAttributes) -> Expr {
	let roles = Attribute::doc(ROLES);
	let unrestricted = Expr::is_null(roles.clone());

	if user.roles.is_empty() {
		return unrestricted;
	}

	let checks = user
		.roles
		.iter()
		.map(|r| Expr::contains(roles.clone(), r.as_str()))
		.collect();

	Expr::or(unrestricted, Expr::Or(checks))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::DocumentAttributes;

	#[test]
	fn group_match_mode_parses_both_spellings() {
		assert_eq!(
			"presence-only".parse::<GroupMatchMode>(),
			Ok(GroupMatchMode::PresenceOnly)
		);
		assert_eq!(
			"Require_Membership".parse::<GroupMatchMode>(),
			Ok(GroupMatchMode::RequireMembership)
		);
		assert!("any".parse::<GroupMatchMode>().is_err());
		assert_eq!(GroupMatchMode::PresenceOnly.to_string(), "presence_only");
	}

	fn jun() -> UserAttributes {
		UserAttributes::new("jun")
			.with_groups(["history"])
			.with_roles(["analyst"])
	}

	fn mary() -> UserAttributes {
		UserAttributes::new("mary")
			.with_groups(["history", "religion"])
			.with_roles(["professor", "dean"])
	}

	mod owner {
		use super::*;

		#[test]
		fn lists_global_and_user() {
			assert_eq!(
				owner_clause(&jun()).to_string(),
				"doc.owner IN ('global', 'jun')"
			);
		}

		#[test]
		fn escapes_user_id() {
			let user = UserAttributes::new("o'neil");
			assert_eq!(
				owner_clause(&user).to_string(),
				"doc.owner IN ('global', 'o''neil')"
			);
		}
	}

	mod group {
		use super::*;

		#[test]
		fn single_group() {
			assert_eq!(
				group_clause(&jun(), GroupMatchMode::RequireMembership).to_string(),
				"(doc.groups IS NOT NULL) AND (('history' IN doc.groups))"
			);
		}

		#[test]
		fn groups_are_emitted_in_sorted_order() {
			assert_eq!(
				group_clause(&mary(), GroupMatchMode::RequireMembership).to_string(),
				"(doc.groups IS NOT NULL) AND (('history' IN doc.groups) OR ('religion' IN doc.groups))"
			);
		}

		#[test]
		fn mode_does_not_matter_when_user_has_groups() {
			assert_eq!(
				group_clause(&mary(), GroupMatchMode::PresenceOnly),
				group_clause(&mary(), GroupMatchMode::RequireMembership)
			);
		}

		#[test]
		fn presence_only_returns_unwrapped_base_for_groupless_user() {
			let user = UserAttributes::new("nobody");
			assert_eq!(
				group_clause(&user, GroupMatchMode::PresenceOnly).to_string(),
				"doc.groups IS NOT NULL"
			);
		}

		#[test]
		fn presence_only_groupless_user_matches_any_grouped_document() {
			let user = UserAttributes::new("nobody");
			let clause = group_clause(&user, GroupMatchMode::PresenceOnly);
			let doc = DocumentAttributes::owned_by("stephanie").with_groups(["physics"]);
			assert!(clause.evaluate(&doc));
		}

		#[test]
		fn require_membership_groupless_user_matches_nothing() {
			let user = UserAttributes::new("nobody");
			let clause = group_clause(&user, GroupMatchMode::RequireMembership);
			assert_eq!(
				clause.to_string(),
				"(doc.groups IS NOT NULL) AND (doc.groups IS NULL)"
			);

			let grouped = DocumentAttributes::owned_by("stephanie").with_groups(["physics"]);
			let ungrouped = DocumentAttributes::owned_by("stephanie");
			assert!(!clause.evaluate(&grouped));
			assert!(!clause.evaluate(&ungrouped));
		}

		#[test]
		fn disjoint_groups_do_not_match() {
			let clause = group_clause(&jun(), GroupMatchMode::RequireMembership);
			let doc = DocumentAttributes::owned_by("stephanie").with_groups(["physics"]);
			assert!(!clause.evaluate(&doc));
		}
	}

	mod role {
		use super::*;

		#[test]
		fn roleless_user_only_sees_unrestricted_documents() {
			let user = UserAttributes::new("jun").with_groups(["history"]);
			assert_eq!(role_clause(&user).to_string(), "doc.roles IS NULL");
		}

		#[test]
		fn roles_extend_the_base_test() {
			assert_eq!(
				role_clause(&mary()).to_string(),
				"(doc.roles IS NULL) OR (('dean' IN doc.roles) OR ('professor' IN doc.roles))"
			);
		}

		#[test]
		fn matching_role_satisfies_clause() {
			let doc = DocumentAttributes::owned_by("stephanie").with_roles(["pii", "dean"]);
			assert!(role_clause(&mary()).evaluate(&doc));
			assert!(!role_clause(&jun()).evaluate(&doc));
		}
	}
}
