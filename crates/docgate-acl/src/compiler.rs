// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access filter compiler.
//!
//! Combines the owner, group and role clauses into the access predicate:
//!
//! ```text
//! (owner) OR ((group) AND (role))
//! ```
//!
//! and conjoins an optional caller-supplied content filter:
//!
//! ```text
//! (access) AND (content)
//! ```
//!
//! Compilation is pure and deterministic: the same user and content filter
//! always produce the same [`Expr`], and therefore byte-identical filter text.

use crate::builder::{group_clause, owner_clause, role_clause, GroupMatchMode};
use crate::expr::Expr;
use crate::parse::{check_balanced, ParseError};
use crate::types::UserAttributes;

/// Filter text in the backend grammar whose parentheses balance and whose
/// literals are terminated, so it stays inside the operand it is placed in.
///
/// Only the backend validates the grammar; the text is passed through
/// byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilter(String);

impl RawFilter {
	pub fn new(text: impl Into<String>) -> Result<Self, ParseError> {
		let text = text.into();
		check_balanced(&text)?;
		Ok(Self(text))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// A caller-supplied filter narrowing results by business attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFilter {
	Raw(RawFilter),
	/// A structured filter, serialized with escaped literals.
	Expr(Expr),
}

impl ContentFilter {
	/// Wraps filter text, rejecting text that would close the parenthesis
	/// it is serialized in.
	pub fn raw(text: impl Into<String>) -> Result<Self, ParseError> {
		RawFilter::new(text).map(ContentFilter::Raw)
	}

	fn to_expr(&self) -> Expr {
		match self {
			ContentFilter::Raw(raw) => Expr::Raw(raw.as_str().to_string()),
			ContentFilter::Expr(expr) => expr.clone(),
		}
	}
}

impl From<Expr> for ContentFilter {
	fn from(expr: Expr) -> Self {
		ContentFilter::Expr(expr)
	}
}

/// Compiles access predicates for a fixed [`GroupMatchMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessFilterCompiler {
	mode: GroupMatchMode,
}

impl AccessFilterCompiler {
	pub fn new(mode: GroupMatchMode) -> Self {
		Self { mode }
	}

	pub fn mode(&self) -> GroupMatchMode {
		self.mode
	}

	/// `(owner) OR ((group) AND (role))` for the given user.
	pub fn compile_access_filter(&self, user: &UserAttributes) -> Expr {
		let group_role = Expr::and(group_clause(user, self.mode), role_clause(user));
		Expr::or(owner_clause(user), group_role)
	}

	/// The access predicate, conjoined with `content` when one is given.
	pub fn compile_final_filter(
		&self,
		user: &UserAttributes,
		content: Option<&ContentFilter>,
	) -> Expr {
		let access = self.compile_access_filter(user);
		match content {
			Some(filter) => Expr::and(access, filter.to_expr()),
			None => access,
		}
	}
}

/// Compiles the access predicate with the default [`GroupMatchMode`].
pub fn compile_access_filter(user: &UserAttributes) -> Expr {
	AccessFilterCompiler::default().compile_access_filter(user)
}

/// Compiles the final filter with the default [`GroupMatchMode`].
pub fn compile_final_filter(user: &UserAttributes, content: Option<&ContentFilter>) -> Expr {
	AccessFilterCompiler::default().compile_final_filter(user, content)
}
