// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Predicate expression AST.
//!
//! Filters are built as [`Expr`] trees and only turned into the retrieval
//! backend's textual grammar at the boundary, via [`std::fmt::Display`]. Every
//! literal is quoted and escaped during serialization, so group, role and
//! owner names can never change the shape of the predicate.
//!
//! Serialization wraps each operand of `AND`/`OR` in parentheses. The output
//! never relies on operator precedence in the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute name of the document owner.
pub const OWNER: &str = "owner";
/// Attribute name of the groups allowed to see a document.
pub const GROUPS: &str = "groups";
/// Attribute name of the roles allowed to see a document.
pub const ROLES: &str = "roles";
/// Attribute name of the free-text project tag.
pub const PROJECT: &str = "project";

/// Whether an attribute lives on the whole document or on a document part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeLevel {
	Document,
	Part,
}

impl AttributeLevel {
	/// Prefix used in the filter grammar.
	pub fn prefix(self) -> &'static str {
		match self {
			AttributeLevel::Document => "doc",
			AttributeLevel::Part => "part",
		}
	}
}

/// A reference to a filterable attribute, e.g. `doc.groups`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
	pub level: AttributeLevel,
	pub name: String,
}

impl Attribute {
	pub fn doc(name: impl Into<String>) -> Self {
		Self {
			level: AttributeLevel::Document,
			name: name.into(),
		}
	}

	pub fn part(name: impl Into<String>) -> Self {
		Self {
			level: AttributeLevel::Part,
			name: name.into(),
		}
	}
}

impl fmt::Display for Attribute {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.level.prefix(), self.name)
	}
}

/// A boolean predicate over document attributes.
///
/// `And` and `Or` are n-ary and expected to hold at least one operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
	/// All operands hold.
	And(Vec<Expr>),
	/// At least one operand holds.
	Or(Vec<Expr>),
	/// `attr = 'value'`
	Eq { attribute: Attribute, value: String },
	/// `attr IN ('a', 'b')`: a scalar attribute equals one of the values.
	In {
		attribute: Attribute,
		values: Vec<String>,
	},
	/// `'value' IN attr`: a list attribute contains the value.
	Contains { attribute: Attribute, value: String },
	/// `attr IS NULL`
	IsNull(Attribute),
	/// `attr IS NOT NULL`
	IsNotNull(Attribute),
	/// Caller-supplied filter text, emitted verbatim.
	Raw(String),
}

impl Expr {
	/// Binary conjunction.
	pub fn and(left: Expr, right: Expr) -> Self {
		Expr::And(vec![left, right])
	}

	/// Binary disjunction.
	pub fn or(left: Expr, right: Expr) -> Self {
		Expr::Or(vec![left, right])
	}

	pub fn eq(attribute: Attribute, value: impl Into<String>) -> Self {
		Expr::Eq {
			attribute,
			value: value.into(),
		}
	}

	pub fn one_of<I, S>(attribute: Attribute, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Expr::In {
			attribute,
			values: values.into_iter().map(Into::into).collect(),
		}
	}

	pub fn contains(attribute: Attribute, value: impl Into<String>) -> Self {
		Expr::Contains {
			attribute,
			value: value.into(),
		}
	}

	pub fn is_null(attribute: Attribute) -> Self {
		Expr::IsNull(attribute)
	}

	pub fn is_not_null(attribute: Attribute) -> Self {
		Expr::IsNotNull(attribute)
	}

	pub fn raw(text: impl Into<String>) -> Self {
		Expr::Raw(text.into())
	}

	/// Serializes the expression into the backend filter grammar.
	pub fn to_filter_string(&self) -> String {
		self.to_string()
	}
}

/// Quotes a literal for the filter grammar, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
	let mut out = String::with_capacity(value.len() + 2);
	out.push('\'');
	for ch in value.chars() {
		if ch == '\'' {
			out.push('\'');
		}
		out.push(ch);
	}
	out.push('\'');
	out
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[Expr], op: &str) -> fmt::Result {
	for (i, operand) in operands.iter().enumerate() {
		if i > 0 {
			write!(f, " {op} ")?;
		}
		write!(f, "({operand})")?;
	}
	Ok(())
}

impl fmt::Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Expr::And(operands) => write_joined(f, operands, "AND"),
			Expr::Or(operands) => write_joined(f, operands, "OR"),
			Expr::Eq { attribute, value } => {
				write!(f, "{attribute} = {}", quote_literal(value))
			}
			Expr::In { attribute, values } => {
				let quoted: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
				write!(f, "{attribute} IN ({})", quoted.join(", "))
			}
			Expr::Contains { attribute, value } => {
				write!(f, "{} IN {attribute}", quote_literal(value))
			}
			Expr::IsNull(attribute) => write!(f, "{attribute} IS NULL"),
			Expr::IsNotNull(attribute) => write!(f, "{attribute} IS NOT NULL"),
			Expr::Raw(text) => f.write_str(text),
		}
	}
}
