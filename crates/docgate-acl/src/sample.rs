// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A small university corpus with six users and four documents.
//!
//! Used by the demo command and by integration tests to walk through the
//! owner, group and role rules end to end.

use crate::directory::StaticDirectory;
use crate::memory::IndexedDocument;
use crate::types::{DocumentAttributes, UserAttributes};

pub fn users() -> Vec<UserAttributes> {
	vec![
		UserAttributes::new("justin")
			.with_groups(["biology", "religion"])
			.with_roles(["student"]),
		UserAttributes::new("mary")
			.with_groups(["history", "religion"])
			.with_roles(["professor", "dean"]),
		UserAttributes::new("ashish")
			.with_groups(["physics"])
			.with_roles(["student"]),
		UserAttributes::new("jun")
			.with_groups(["history"])
			.with_roles(["analyst"]),
		UserAttributes::new("eliza")
			.with_groups(["physics"])
			.with_roles(["dean"]),
		UserAttributes::new("stephanie")
			.with_groups(["physics"])
			.with_roles(["pii"]),
	]
}

pub fn directory() -> StaticDirectory {
	StaticDirectory::new(users())
}

pub fn documents() -> Vec<IndexedDocument> {
	vec![
		IndexedDocument::new(
			"TheGoldenBough",
			"The Golden Bough",
			"The Golden Bough is a comparative study of mythology and religion. \
			 Osiris, the Egyptian god of the dead, symbolizes the yearly death and \
			 rebirth of vegetation along the Nile.",
			DocumentAttributes::owned_by("justin")
				.with_groups(["history"])
				.with_roles(["analyst"])
				.with_project("lectures"),
		),
		IndexedDocument::new(
			"TheHerosJourney",
			"The Hero's Journey",
			"The Hero with a Thousand Faces describes the monomyth: the hero departs, \
			 is initiated and returns. The hero has a thousand faces, one for every \
			 culture that tells the story.",
			DocumentAttributes::owned_by("jun").with_groups(["history", "religion"]),
		),
		IndexedDocument::new(
			"GreatPhysicists",
			"Great Physicists",
			"Isaac Newton formulated the laws of motion and universal gravitation, and \
			 his work on gravity shaped physics for two centuries. Albert Einstein \
			 later extended it with general relativity.",
			DocumentAttributes::owned_by("stephanie")
				.with_groups(["physics"])
				.with_roles(["pii", "dean"]),
		),
		IndexedDocument::new(
			"UniversityRules",
			"University Rules",
			"Students are not allowed in the forbidden forest because it is home to \
			 dangerous creatures. Students must return to their dormitories before curfew.",
			DocumentAttributes::global().with_project("orientation"),
		),
	]
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::directory::UserDirectory;

	#[test]
	fn every_document_owner_is_a_user_or_global() {
		let dir = directory();
		for doc in documents() {
			let owner = &doc.attributes.owner;
			assert!(owner == crate::types::GLOBAL_OWNER || dir.lookup(owner).is_some());
		}
	}

	#[test]
	fn six_users() {
		assert_eq!(directory().len(), 6);
	}
}
