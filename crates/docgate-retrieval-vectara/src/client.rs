// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Vectara v2 API client.

use std::time::Duration;

use async_trait::async_trait;
use docgate_acl::{
	BackendError, CorpusSchema, QueryRequest, QueryResult, RetrievalBackend, SearchMatch,
};
use docgate_common_config::SecretString;
use docgate_common_http::{retry, RetryConfig};
use reqwest::{Client, Response};
use tracing::{debug, error, info, instrument, trace};

use crate::error::VectaraError;
use crate::types::{GenerationSettings, QueryBody, QueryResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.vectara.io";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const API_KEY_HEADER: &str = "x-api-key";

/// Client for a single Vectara corpus.
#[derive(Debug, Clone)]
pub struct VectaraClient {
	http_client: Client,
	api_key: SecretString,
	corpus_key: String,
	base_url: String,
	retry_config: RetryConfig,
	generation: GenerationSettings,
}

fn http_client(timeout: Duration) -> Result<Client, VectaraError> {
	Ok(docgate_common_http::new_client_with_timeout(timeout)?)
}

impl VectaraClient {
	pub fn new(api_key: SecretString, corpus_key: impl Into<String>) -> Result<Self, VectaraError> {
		Ok(Self {
			http_client: http_client(DEFAULT_TIMEOUT)?,
			api_key,
			corpus_key: corpus_key.into(),
			base_url: DEFAULT_BASE_URL.to_string(),
			retry_config: RetryConfig::default(),
			generation: GenerationSettings::default(),
		})
	}

	/// Sets a custom base URL for the API (useful for testing).
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	pub fn with_generation(mut self, generation: GenerationSettings) -> Self {
		self.generation = generation;
		self
	}

	/// Rebuilds the HTTP client with a per-request timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, VectaraError> {
		self.http_client = http_client(timeout)?;
		Ok(self)
	}

	pub fn corpus_key(&self) -> &str {
		&self.corpus_key
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn corpora_url(&self) -> String {
		format!("{}/v2/corpora", self.base_url)
	}

	fn corpus_url(&self) -> String {
		format!("{}/v2/corpora/{}", self.base_url, self.corpus_key)
	}

	/// Creates a corpus. The schema's key names the corpus.
	#[instrument(skip(self, schema), fields(corpus_key = %schema.key))]
	pub async fn create(&self, schema: &CorpusSchema) -> Result<(), VectaraError> {
		retry(&self.retry_config, || async {
			let response = self
				.http_client
				.post(self.corpora_url())
				.header(API_KEY_HEADER, self.api_key.expose())
				.json(schema)
				.send()
				.await
				.map_err(network_error)?;
			check_status(response).await?;
			Ok::<(), VectaraError>(())
		})
		.await?;

		info!("corpus created");
		Ok(())
	}

	/// Deletes this client's corpus and everything indexed in it.
	#[instrument(skip(self), fields(corpus_key = %self.corpus_key))]
	pub async fn delete_corpus(&self) -> Result<(), VectaraError> {
		retry(&self.retry_config, || async {
			let response = self
				.http_client
				.delete(self.corpus_url())
				.header(API_KEY_HEADER, self.api_key.expose())
				.send()
				.await
				.map_err(network_error)?;
			check_status(response).await?;
			Ok::<(), VectaraError>(())
		})
		.await?;

		info!("corpus deleted");
		Ok(())
	}

	/// Runs a query with `filter` as the metadata filter.
	#[instrument(skip(self, query, filter), fields(corpus_key = %self.corpus_key))]
	pub async fn query(&self, query: &str, filter: &str) -> Result<QueryResult, VectaraError> {
		retry(&self.retry_config, || self.query_inner(query, filter)).await
	}

	async fn query_inner(&self, query: &str, filter: &str) -> Result<QueryResult, VectaraError> {
		let url = format!("{}/query", self.corpus_url());
		let body = QueryBody::new(query, filter, &self.generation);

		debug!(url = %url, "sending query to Vectara");
		trace!(metadata_filter = %filter, "query parameters");

		let response = self
			.http_client
			.post(&url)
			.header(API_KEY_HEADER, self.api_key.expose())
			.json(&body)
			.send()
			.await
			.map_err(network_error)?;

		let response = check_status(response).await?;
		let text = response.text().await.map_err(|e| {
			error!(error = %e, "failed to read response body");
			VectaraError::Network(e)
		})?;
		trace!(body = %text, "response body");

		let parsed: QueryResponse = serde_json::from_str(&text).map_err(|e| {
			error!(error = %e, "failed to parse Vectara response");
			VectaraError::InvalidResponse(format!("JSON parse error: {e}"))
		})?;

		let matches: Vec<SearchMatch> = parsed
			.search_results
			.into_iter()
			.map(|item| SearchMatch {
				document_id: item.document_id,
				text: item.text,
				score: item.score,
			})
			.collect();

		debug!(match_count = matches.len(), "query completed");
		Ok(QueryResult {
			summary: parsed.summary.filter(|s| !s.is_empty()),
			matches,
		})
	}
}

fn network_error(e: reqwest::Error) -> VectaraError {
	if e.is_timeout() {
		error!("request timed out");
		return VectaraError::Timeout;
	}
	error!(error = %e, "network error during Vectara request");
	VectaraError::Network(e)
}

/// Maps non-success statuses to errors. The body is kept verbatim.
async fn check_status(response: Response) -> Result<Response, VectaraError> {
	let status = response.status();
	debug!(status = %status, "received response from Vectara");
	if status.is_success() {
		return Ok(response);
	}

	let code = status.as_u16();
	let body = response.text().await.unwrap_or_default();
	error!(status = code, body = %body, "Vectara request failed");

	Err(match code {
		400 => VectaraError::BadRequest(body),
		401 | 403 => VectaraError::Unauthorized,
		429 => VectaraError::RateLimited,
		500..=599 => VectaraError::Unavailable {
			status: code,
			message: body,
		},
		_ => VectaraError::ApiError {
			status: code,
			message: body,
		},
	})
}

#[async_trait]
impl RetrievalBackend for VectaraClient {
	async fn create_corpus(&self, schema: &CorpusSchema) -> Result<(), BackendError> {
		Ok(self.create(schema).await?)
	}

	async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResult, BackendError> {
		Ok(self.query(&request.query_text, &request.filter).await?)
	}
}
