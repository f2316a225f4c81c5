// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The retrieval backend seam.
//!
//! The policy core consumes exactly two backend operations: creating a corpus
//! with filterable attributes, and running a query under a filter expression.
//! Implementations own transport, retries and grammar validation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expr::{AttributeLevel, GROUPS, OWNER, PROJECT, ROLES};
use crate::parse::ParseError;

/// Errors reported by a retrieval backend.
///
/// These pass through the façade unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
	/// The backend rejected the filter expression. The message is the backend's
	/// own, verbatim.
	#[error("malformed filter: {message}")]
	MalformedFilter { message: String },

	#[error("backend rejected credentials")]
	Unauthorized,

	#[error("backend rate limit exceeded")]
	RateLimited,

	#[error("backend request timed out")]
	Timeout,

	#[error("backend unavailable: {0}")]
	Unavailable(String),

	#[error("transport error: {0}")]
	Transport(String),

	#[error("backend error: {status} - {message}")]
	Api { status: u16, message: String },

	#[error("invalid response from backend: {0}")]
	InvalidResponse(String),
}

impl From<ParseError> for BackendError {
	fn from(err: ParseError) -> Self {
		BackendError::MalformedFilter {
			message: err.to_string(),
		}
	}
}

/// Value type of a filterable attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
	#[serde(rename = "text")]
	Text,
	#[serde(rename = "list[text]")]
	ListText,
	#[serde(rename = "integer")]
	Integer,
	#[serde(rename = "real_number")]
	Real,
	#[serde(rename = "boolean")]
	Boolean,
}

/// A filterable attribute declared on a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterAttribute {
	pub name: String,
	pub level: AttributeLevel,
	#[serde(rename = "type")]
	pub kind: AttributeType,
	pub indexed: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl FilterAttribute {
	/// An indexed document-level attribute.
	pub fn document(name: impl Into<String>, kind: AttributeType) -> Self {
		Self {
			name: name.into(),
			level: AttributeLevel::Document,
			kind,
			indexed: true,
			description: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}
}

/// Definition of a corpus and its filterable attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSchema {
	pub key: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	pub filter_attributes: Vec<FilterAttribute>,
}

impl CorpusSchema {
	/// The schema access-controlled corpora need: owner, groups, roles and a
	/// project tag for content filtering.
	pub fn access_control(key: impl Into<String>) -> Self {
		let key = key.into();
		Self {
			name: key.clone(),
			key,
			description: Some("Corpus with owner, group and role based access control.".to_string()),
			filter_attributes: vec![
				FilterAttribute::document(OWNER, AttributeType::Text).with_description(
					"Owner of the document: the id of the user who indexed it, or 'global' if it is public.",
				),
				FilterAttribute::document(GROUPS, AttributeType::ListText).with_description(
					"Groups permitted to query the document. Unset or empty means only the owner can see it.",
				),
				FilterAttribute::document(ROLES, AttributeType::ListText).with_description(
					"Roles permitted to query the document. Unset or empty means no role is required.",
				),
				FilterAttribute::document(PROJECT, AttributeType::Text).with_description(
					"Project the document belongs to. Used to narrow queries, not for access control.",
				),
			],
		}
	}
}

/// A query as handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
	pub query_text: String,
	/// Filter expression in the backend grammar.
	pub filter: String,
}

impl QueryRequest {
	pub fn new(query_text: impl Into<String>, filter: impl Into<String>) -> Self {
		Self {
			query_text: query_text.into(),
			filter: filter.into(),
		}
	}
}

/// A document passage that satisfied the filter and matched the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
	pub document_id: String,
	pub text: String,
	pub score: f64,
}

/// The backend's answer to a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
	pub summary: Option<String>,
	pub matches: Vec<SearchMatch>,
}

/// A retrieval service that evaluates filters per document.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
	async fn create_corpus(&self, schema: &CorpusSchema) -> Result<(), BackendError>;

	async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResult, BackendError>;
}

#[async_trait]
impl<B: RetrievalBackend + ?Sized> RetrievalBackend for Arc<B> {
	async fn create_corpus(&self, schema: &CorpusSchema) -> Result<(), BackendError> {
		(**self).create_corpus(schema).await
	}

	async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResult, BackendError> {
		(**self).execute_query(request).await
	}
}
