// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! An in-process retrieval backend.
//!
//! Holds documents in memory, validates incoming filters with the local
//! parser and evaluates them per document. Ranking is plain keyword overlap;
//! it exists so access decisions can be exercised without a remote service.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::backend::{
	BackendError, CorpusSchema, QueryRequest, QueryResult, RetrievalBackend, SearchMatch,
};
use crate::expr::{Attribute, Expr};
use crate::parse::parse_filter;
use crate::types::DocumentAttributes;

const DEFAULT_MAX_RESULTS: usize = 5;

const STOPWORDS: &[&str] = &[
	"about", "and", "are", "can", "did", "does", "for", "from", "has", "have", "how", "into",
	"not", "that", "the", "their", "them", "they", "this", "was", "were", "what", "when", "where",
	"which", "who", "why", "will", "with", "you",
];

/// A document held by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
	pub id: String,
	pub title: String,
	pub text: String,
	pub attributes: DocumentAttributes,
}

impl IndexedDocument {
	pub fn new(
		id: impl Into<String>,
		title: impl Into<String>,
		text: impl Into<String>,
		attributes: DocumentAttributes,
	) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			text: text.into(),
			attributes,
		}
	}
}

#[derive(Debug, Default)]
struct State {
	schema: Option<CorpusSchema>,
	documents: Vec<IndexedDocument>,
}

/// Retrieval backend backed by a `Vec` of documents.
#[derive(Debug)]
pub struct MemoryBackend {
	state: RwLock<State>,
	max_results: usize,
}

impl Default for MemoryBackend {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self {
			state: RwLock::new(State::default()),
			max_results: DEFAULT_MAX_RESULTS,
		}
	}

	pub fn with_documents<I>(documents: I) -> Self
	where
		I: IntoIterator<Item = IndexedDocument>,
	{
		Self {
			state: RwLock::new(State {
				schema: None,
				documents: documents.into_iter().collect(),
			}),
			max_results: DEFAULT_MAX_RESULTS,
		}
	}

	/// Caps the matches returned per query; at least one is always allowed.
	pub fn with_max_results(mut self, max_results: usize) -> Self {
		self.max_results = max_results.max(1);
		self
	}

	/// Adds a document, replacing any existing document with the same id.
	pub async fn index(&self, document: IndexedDocument) {
		let mut state = self.state.write().await;
		state.documents.retain(|d| d.id != document.id);
		debug!(document_id = %document.id, "indexed document");
		state.documents.push(document);
	}

	pub async fn document_count(&self) -> usize {
		self.state.read().await.documents.len()
	}
}

fn terms(text: &str) -> BTreeSet<String> {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|w| w.len() > 2)
		.map(str::to_lowercase)
		.filter(|w| !STOPWORDS.contains(&w.as_str()))
		.collect()
}

fn collect_attributes<'a>(expr: &'a Expr, out: &mut Vec<&'a Attribute>) {
	match expr {
		Expr::And(operands) | Expr::Or(operands) => {
			for operand in operands {
				collect_attributes(operand, out);
			}
		}
		Expr::Eq { attribute, .. }
		| Expr::In { attribute, .. }
		| Expr::Contains { attribute, .. }
		| Expr::IsNull(attribute)
		| Expr::IsNotNull(attribute) => out.push(attribute),
		Expr::Raw(_) => {}
	}
}

/// Rejects attributes the corpus did not declare as filterable.
fn check_declared(schema: &CorpusSchema, expr: &Expr) -> Result<(), BackendError> {
	let mut referenced = Vec::new();
	collect_attributes(expr, &mut referenced);
	for attribute in referenced {
		let declared = schema
			.filter_attributes
			.iter()
			.any(|f| f.name == attribute.name && f.level == attribute.level);
		if !declared {
			return Err(BackendError::MalformedFilter {
				message: format!("attribute '{attribute}' is not a filter attribute of this corpus"),
			});
		}
	}
	Ok(())
}

#[async_trait]
impl RetrievalBackend for MemoryBackend {
	async fn create_corpus(&self, schema: &CorpusSchema) -> Result<(), BackendError> {
		debug!(corpus_key = %schema.key, "creating in-memory corpus");
		self.state.write().await.schema = Some(schema.clone());
		Ok(())
	}

	#[instrument(skip(self, request), fields(filter_len = request.filter.len()))]
	async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResult, BackendError> {
		let filter = parse_filter(&request.filter).map_err(BackendError::from)?;

		let state = self.state.read().await;
		if let Some(schema) = &state.schema {
			check_declared(schema, &filter)?;
		}

		let wanted = terms(&request.query_text);
		let mut matches: Vec<SearchMatch> = state
			.documents
			.iter()
			.filter(|doc| filter.evaluate(&doc.attributes))
			.filter_map(|doc| {
				let found = terms(&format!("{} {}", doc.title, doc.text));
				let overlap = wanted.intersection(&found).count();
				if overlap == 0 {
					return None;
				}
				Some(SearchMatch {
					document_id: doc.id.clone(),
					text: doc.text.clone(),
					score: overlap as f64 / wanted.len() as f64,
				})
			})
			.collect();

		matches.sort_by(|a, b| {
			b.score
				.total_cmp(&a.score)
				.then_with(|| a.document_id.cmp(&b.document_id))
		});
		matches.truncate(self.max_results);

		debug!(match_count = matches.len(), "in-memory query evaluated");
		Ok(QueryResult {
			summary: matches.first().map(|m| m.text.clone()),
			matches,
		})
	}
}
