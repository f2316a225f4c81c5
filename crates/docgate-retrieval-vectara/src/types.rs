// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the Vectara v2 query endpoint.

use serde::{Deserialize, Serialize};

pub const DEFAULT_GENERATION_PRESET: &str = "mockingbird-1.0-2024-07-16";
pub const DEFAULT_RERANKER: &str = "Rerank_Multilingual_v1";
pub const DEFAULT_MAX_USED_SEARCH_RESULTS: u32 = 5;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Summary generation and reranking options sent with every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
	pub preset: String,
	pub max_used_search_results: u32,
	pub factual_consistency_score: bool,
	/// Customer reranker name. `None` disables reranking.
	pub reranker: Option<String>,
	pub search_limit: u32,
	pub save_history: bool,
}

impl Default for GenerationSettings {
	fn default() -> Self {
		Self {
			preset: DEFAULT_GENERATION_PRESET.to_string(),
			max_used_search_results: DEFAULT_MAX_USED_SEARCH_RESULTS,
			factual_consistency_score: true,
			reranker: Some(DEFAULT_RERANKER.to_string()),
			search_limit: DEFAULT_SEARCH_LIMIT,
			save_history: true,
		}
	}
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryBody<'a> {
	pub query: &'a str,
	pub search: SearchParams<'a>,
	pub generation: GenerationParams<'a>,
	pub stream_response: bool,
	pub save_history: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchParams<'a> {
	pub metadata_filter: &'a str,
	pub limit: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reranker: Option<RerankerParams<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RerankerParams<'a> {
	#[serde(rename = "type")]
	pub kind: &'static str,
	pub reranker_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerationParams<'a> {
	pub generation_preset_name: &'a str,
	pub max_used_search_results: u32,
	pub enable_factual_consistency_score: bool,
}

impl<'a> QueryBody<'a> {
	pub fn new(query: &'a str, filter: &'a str, settings: &'a GenerationSettings) -> Self {
		Self {
			query,
			search: SearchParams {
				metadata_filter: filter,
				limit: settings.search_limit,
				reranker: settings.reranker.as_deref().map(|name| RerankerParams {
					kind: "customer_reranker",
					reranker_name: name,
				}),
			},
			generation: GenerationParams {
				generation_preset_name: &settings.preset,
				max_used_search_results: settings.max_used_search_results,
				enable_factual_consistency_score: settings.factual_consistency_score,
			},
			stream_response: false,
			save_history: settings.save_history,
		}
	}
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
	#[serde(default)]
	pub summary: Option<String>,
	#[serde(default)]
	pub search_results: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResultItem {
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub score: f64,
	#[serde(default)]
	pub document_id: String,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn query_body_matches_api_shape() {
		let settings = GenerationSettings::default();
		let body = QueryBody::new("What does Osiris symbolize?", "doc.project='lectures'", &settings);

		assert_eq!(
			serde_json::to_value(&body).unwrap(),
			json!({
				"query": "What does Osiris symbolize?",
				"search": {
					"metadata_filter": "doc.project='lectures'",
					"limit": 10,
					"reranker": {
						"type": "customer_reranker",
						"reranker_name": "Rerank_Multilingual_v1"
					}
				},
				"generation": {
					"generation_preset_name": "mockingbird-1.0-2024-07-16",
					"max_used_search_results": 5,
					"enable_factual_consistency_score": true
				},
				"stream_response": false,
				"save_history": true
			})
		);
	}

	#[test]
	fn reranker_is_omitted_when_disabled() {
		let settings = GenerationSettings {
			reranker: None,
			..Default::default()
		};
		let body = serde_json::to_value(QueryBody::new("q", "f", &settings)).unwrap();
		assert!(body["search"].get("reranker").is_none());
	}

	#[test]
	fn response_tolerates_missing_fields() {
		let resp: QueryResponse = serde_json::from_value(json!({})).unwrap();
		assert!(resp.summary.is_none());
		assert!(resp.search_results.is_empty());

		let resp: QueryResponse = serde_json::from_value(json!({
			"summary": "A thousand.",
			"search_results": [{"text": "t", "score": 0.8, "document_id": "TheHerosJourney", "part_metadata": {}}],
			"factual_consistency_score": 0.9
		}))
		.unwrap();
		assert_eq!(resp.summary.as_deref(), Some("A thousand."));
		assert_eq!(resp.search_results[0].document_id, "TheHerosJourney");
	}
}
