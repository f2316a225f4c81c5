// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Local evaluation of predicates against document attributes.
//!
//! The retrieval backend is the authority on filter semantics. This module
//! mirrors those semantics for the in-memory backend and for tests:
//!
//! - a null attribute never equals, matches or contains anything
//! - an empty list counts as null
//! - part-level attributes are always null, since only document metadata is held
//!   locally

use crate::expr::{Attribute, AttributeLevel, Expr};
use crate::parse::parse_filter;
use crate::types::{AttributeValue, DocumentAttributes};

fn lookup<'a>(doc: &'a DocumentAttributes, attribute: &Attribute) -> Option<AttributeValue<'a>> {
	match attribute.level {
		AttributeLevel::Document => match doc.get(&attribute.name) {
			Some(AttributeValue::List(items)) if items.is_empty() => None,
			other => other,
		},
		AttributeLevel::Part => None,
	}
}

impl Expr {
	/// Evaluates the predicate for a single document.
	///
	/// Raw filter text is parsed first; text that does not parse matches
	/// nothing.
	pub fn evaluate(&self, doc: &DocumentAttributes) -> bool {
		match self {
			Expr::And(operands) => operands.iter().all(|e| e.evaluate(doc)),
			Expr::Or(operands) => operands.iter().any(|e| e.evaluate(doc)),
			Expr::Eq { attribute, value } => {
				matches!(lookup(doc, attribute), Some(AttributeValue::Text(t)) if t == value)
			}
			Expr::In { attribute, values } => match lookup(doc, attribute) {
				Some(AttributeValue::Text(t)) => values.iter().any(|v| v == t),
				_ => false,
			},
			Expr::Contains { attribute, value } => match lookup(doc, attribute) {
				Some(AttributeValue::List(items)) => items.iter().any(|item| item == value),
				_ => false,
			},
			Expr::IsNull(attribute) => lookup(doc, attribute).is_none(),
			Expr::IsNotNull(attribute) => lookup(doc, attribute).is_some(),
			Expr::Raw(text) => parse_filter(text)
				.map(|parsed| parsed.evaluate(doc))
				.unwrap_or(false),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::{GROUPS, OWNER, PROJECT, ROLES};

	fn doc() -> DocumentAttributes {
		DocumentAttributes::owned_by("stephanie")
			.with_groups(["physics"])
			.with_roles(["pii", "dean"])
	}

	#[test]
	fn eq_matches_text_only() {
		let lectures = doc().with_project("lectures");
		assert!(Expr::eq(Attribute::doc(PROJECT), "lectures").evaluate(&lectures));
		assert!(!Expr::eq(Attribute::doc(PROJECT), "labs").evaluate(&lectures));
		assert!(!Expr::eq(Attribute::doc(PROJECT), "lectures").evaluate(&doc()));
		assert!(!Expr::eq(Attribute::doc(GROUPS), "physics").evaluate(&doc()));
	}

	#[test]
	fn in_checks_scalar_membership() {
		assert!(Expr::one_of(Attribute::doc(OWNER), ["global", "stephanie"]).evaluate(&doc()));
		assert!(!Expr::one_of(Attribute::doc(OWNER), ["global", "jun"]).evaluate(&doc()));
	}

	#[test]
	fn contains_checks_list_membership() {
		assert!(Expr::contains(Attribute::doc(ROLES), "dean").evaluate(&doc()));
		assert!(!Expr::contains(Attribute::doc(ROLES), "student").evaluate(&doc()));
		assert!(!Expr::contains(Attribute::doc(OWNER), "stephanie").evaluate(&doc()));
	}

	#[test]
	fn empty_lists_are_null() {
		let empty = DocumentAttributes::owned_by("jun").with_groups(Vec::<String>::new());
		assert!(Expr::is_null(Attribute::doc(GROUPS)).evaluate(&empty));
		assert!(!Expr::is_not_null(Attribute::doc(GROUPS)).evaluate(&empty));
	}

	#[test]
	fn part_attributes_are_null() {
		assert!(Expr::is_null(Attribute::part(OWNER)).evaluate(&doc()));
	}

	#[test]
	fn raw_filters_are_parsed() {
		let lectures = doc().with_project("lectures");
		assert!(Expr::raw("doc.project = 'lectures'").evaluate(&lectures));
		assert!(!Expr::raw("doc.project = 'labs'").evaluate(&lectures));
		assert!(!Expr::raw("doc.project = ").evaluate(&lectures));
	}

	#[test]
	fn connectives() {
		let yes = Expr::is_not_null(Attribute::doc(GROUPS));
		let no = Expr::is_null(Attribute::doc(GROUPS));
		assert!(Expr::and(yes.clone(), yes.clone()).evaluate(&doc()));
		assert!(!Expr::and(yes.clone(), no.clone()).evaluate(&doc()));
		assert!(Expr::or(no.clone(), yes).evaluate(&doc()));
		assert!(!Expr::or(no.clone(), no).evaluate(&doc()));
	}
}
