// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Parser for the backend filter grammar.
//!
//! Used on the backend side of the boundary (the in-memory backend validates
//! incoming filters with it). Supported forms:
//!
//! ```text
//! expr      := conj ( OR conj )*
//! conj      := term ( AND term )*
//! term      := '(' expr ')' | predicate
//! predicate := attr '=' literal
//!            | attr IN '(' literal ( ',' literal )* ')'
//!            | attr IS [NOT] NULL
//!            | literal IN attr
//! attr      := ( doc | part ) '.' name
//! literal   := single-quoted, '' escapes a quote
//! ```
//!
//! Keywords are case-insensitive. `AND` binds tighter than `OR`.

use thiserror::Error;

use crate::expr::{Attribute, Expr};

/// A filter that does not conform to the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid filter at offset {position}: {message}")]
pub struct ParseError {
	pub position: usize,
	pub message: String,
}

impl ParseError {
	fn new(position: usize, message: impl Into<String>) -> Self {
		Self {
			position,
			message: message.into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	LParen,
	RParen,
	Comma,
	Equals,
	Word(String),
	Literal(String),
}

#[derive(Debug, Clone)]
struct Spanned {
	token: Token,
	offset: usize,
}

fn is_word_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
	let mut tokens = Vec::new();
	let mut chars = input.char_indices().peekable();

	while let Some(&(offset, c)) = chars.peek() {
		let token = match c {
			c if c.is_whitespace() => {
				chars.next();
				continue;
			}
			'(' => {
				chars.next();
				Token::LParen
			}
			')' => {
				chars.next();
				Token::RParen
			}
			',' => {
				chars.next();
				Token::Comma
			}
			'=' => {
				chars.next();
				Token::Equals
			}
			'\'' => {
				chars.next();
				let mut value = String::new();
				loop {
					match chars.next() {
						Some((_, '\'')) => {
							if matches!(chars.peek(), Some((_, '\''))) {
								chars.next();
								value.push('\'');
							} else {
								break;
							}
						}
						Some((_, ch)) => value.push(ch),
						None => return Err(ParseError::new(offset, "unterminated string literal")),
					}
				}
				Token::Literal(value)
			}
			c if is_word_char(c) => {
				let mut word = String::new();
				while let Some(&(_, ch)) = chars.peek() {
					if !is_word_char(ch) {
						break;
					}
					word.push(ch);
					chars.next();
				}
				Token::Word(word)
			}
			other => {
				return Err(ParseError::new(
					offset,
					format!("unexpected character '{other}'"),
				))
			}
		};
		tokens.push(Spanned { token, offset });
	}

	Ok(tokens)
}

struct Parser {
	tokens: Vec<Spanned>,
	pos: usize,
	end: usize,
}

impl Parser {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos).map(|s| &s.token)
	}

	fn offset(&self) -> usize {
		self.tokens.get(self.pos).map(|s| s.offset).unwrap_or(self.end)
	}

	fn next(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.pos).map(|s| s.token.clone());
		if token.is_some() {
			self.pos += 1;
		}
		token
	}

	fn peek_keyword(&self, keyword: &str) -> bool {
		matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
	}

	fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
		if self.peek_keyword(keyword) {
			self.pos += 1;
			Ok(())
		} else {
			Err(ParseError::new(self.offset(), format!("expected {keyword}")))
		}
	}

	fn expect(&mut self, expected: Token, what: &str) -> Result<(), ParseError> {
		let offset = self.offset();
		match self.next() {
			Some(token) if token == expected => Ok(()),
			_ => Err(ParseError::new(offset, format!("expected {what}"))),
		}
	}

	fn expr(&mut self) -> Result<Expr, ParseError> {
		let mut operands = vec![self.conj()?];
		while self.peek_keyword("OR") {
			self.pos += 1;
			operands.push(self.conj()?);
		}
		Ok(collapse(operands, Expr::Or))
	}

	fn conj(&mut self) -> Result<Expr, ParseError> {
		let mut operands = vec![self.term()?];
		while self.peek_keyword("AND") {
			self.pos += 1;
			operands.push(self.term()?);
		}
		Ok(collapse(operands, Expr::And))
	}

	fn term(&mut self) -> Result<Expr, ParseError> {
		if matches!(self.peek(), Some(Token::LParen)) {
			self.pos += 1;
			let inner = self.expr()?;
			self.expect(Token::RParen, "')'")?;
			return Ok(inner);
		}
		self.predicate()
	}

	fn predicate(&mut self) -> Result<Expr, ParseError> {
		let offset = self.offset();
		match self.next() {
			Some(Token::Literal(value)) => {
				self.expect_keyword("IN")?;
				let attribute = self.attribute()?;
				Ok(Expr::Contains { attribute, value })
			}
			Some(Token::Word(word)) => {
				let attribute = attribute_from_word(&word, offset)?;
				self.attribute_predicate(attribute)
			}
			_ => Err(ParseError::new(offset, "expected a predicate")),
		}
	}

	fn attribute_predicate(&mut self, attribute: Attribute) -> Result<Expr, ParseError> {
		let offset = self.offset();
		match self.next() {
			Some(Token::Equals) => {
				let value = self.literal()?;
				Ok(Expr::Eq { attribute, value })
			}
			Some(Token::Word(w)) if w.eq_ignore_ascii_case("IS") => {
				if self.peek_keyword("NOT") {
					self.pos += 1;
					self.expect_keyword("NULL")?;
					Ok(Expr::IsNotNull(attribute))
				} else {
					self.expect_keyword("NULL")?;
					Ok(Expr::IsNull(attribute))
				}
			}
			Some(Token::Word(w)) if w.eq_ignore_ascii_case("IN") => {
				self.expect(Token::LParen, "'('")?;
				let mut values = vec![self.literal()?];
				while matches!(self.peek(), Some(Token::Comma)) {
					self.pos += 1;
					values.push(self.literal()?);
				}
				self.expect(Token::RParen, "')'")?;
				Ok(Expr::In { attribute, values })
			}
			_ => Err(ParseError::new(offset, "expected '=', IN or IS after attribute")),
		}
	}

	fn attribute(&mut self) -> Result<Attribute, ParseError> {
		let offset = self.offset();
		match self.next() {
			Some(Token::Word(word)) => attribute_from_word(&word, offset),
			_ => Err(ParseError::new(offset, "expected an attribute")),
		}
	}

	fn literal(&mut self) -> Result<String, ParseError> {
		let offset = self.offset();
		match self.next() {
			Some(Token::Literal(value)) => Ok(value),
			_ => Err(ParseError::new(offset, "expected a string literal")),
		}
	}
}

fn collapse(mut operands: Vec<Expr>, join: fn(Vec<Expr>) -> Expr) -> Expr {
	if operands.len() == 1 {
		operands.remove(0)
	} else {
		join(operands)
	}
}

fn attribute_from_word(word: &str, offset: usize) -> Result<Attribute, ParseError> {
	let (prefix, name) = word
		.split_once('.')
		.ok_or_else(|| ParseError::new(offset, format!("'{word}' is not an attribute reference")))?;

	if name.is_empty() || name.contains('.') {
		return Err(ParseError::new(offset, format!("invalid attribute name in '{word}'")));
	}

	match prefix {
		"doc" => Ok(Attribute::doc(name)),
		"part" => Ok(Attribute::part(name)),
		other => Err(ParseError::new(
			offset,
			format!("unknown attribute level '{other}'"),
		)),
	}
}

/// Parses filter text into an [`Expr`].
///
/// Parenthesized single operands are unwrapped, so parsing a serialized
/// expression yields an equivalent predicate, not necessarily an identical
/// tree.
pub fn parse_filter(input: &str) -> Result<Expr, ParseError> {
	let tokens = tokenize(input)?;
	if tokens.is_empty() {
		return Err(ParseError::new(0, "empty filter"));
	}

	let mut parser = Parser {
		tokens,
		pos: 0,
		end: input.len(),
	};
	let expr = parser.expr()?;

	if parser.pos < parser.tokens.len() {
		return Err(ParseError::new(parser.offset(), "unexpected trailing input"));
	}

	Ok(expr)
}

/// Checks that `input` is a self-contained operand: parentheses outside
/// string literals never close more than they opened and all balance by the
/// end, and every literal is terminated.
///
/// Text that passes cannot escape the parentheses it is wrapped in when
/// serialized as an operand of `AND`. The grammar itself is not checked.
pub fn check_balanced(input: &str) -> Result<(), ParseError> {
	if input.trim().is_empty() {
		return Err(ParseError::new(0, "empty filter"));
	}

	let mut depth = 0usize;
	let mut literal_start = None;

	for (offset, c) in input.char_indices() {
		match (literal_start, c) {
			// A doubled quote closes and reopens the literal, so it needs no
			// special case.
			(Some(_), '\'') => literal_start = None,
			(Some(_), _) => {}
			(None, '\'') => literal_start = Some(offset),
			(None, '(') => depth += 1,
			(None, ')') => {
				depth = depth
					.checked_sub(1)
					.ok_or_else(|| ParseError::new(offset, "unmatched ')'"))?;
			}
			(None, _) => {}
		}
	}

	if let Some(offset) = literal_start {
		return Err(ParseError::new(offset, "unterminated string literal"));
	}
	if depth > 0 {
		return Err(ParseError::new(
			input.len(),
			format!("{depth} unclosed '('"),
		));
	}
	Ok(())
}
