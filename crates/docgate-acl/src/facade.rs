// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Query façade: authenticate, compile, query.
//!
//! Each call is a single stateless transaction. The façade looks the user up
//! in the injected directory, compiles the final filter for that user, and
//! submits the query to the injected backend. Unknown users fail before the
//! backend is contacted; backend errors are returned unchanged.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::backend::{BackendError, QueryRequest, QueryResult, RetrievalBackend};
use crate::builder::GroupMatchMode;
use crate::compiler::{AccessFilterCompiler, ContentFilter};
use crate::directory::UserDirectory;
use crate::error::AccessError;
use crate::expr::Expr;
use crate::types::UserAttributes;

/// Ties a user directory and a retrieval backend together.
#[derive(Debug, Clone)]
pub struct QueryFacade<D, B> {
	directory: D,
	backend: B,
	compiler: AccessFilterCompiler,
	timeout: Option<Duration>,
}

impl<D, B> QueryFacade<D, B>
where
	D: UserDirectory,
	B: RetrievalBackend,
{
	pub fn new(directory: D, backend: B) -> Self {
		Self {
			directory,
			backend,
			compiler: AccessFilterCompiler::default(),
			timeout: None,
		}
	}

	/// Sets how groupless users are treated by the group clause.
	pub fn with_group_match(mut self, mode: GroupMatchMode) -> Self {
		self.compiler = AccessFilterCompiler::new(mode);
		self
	}

	/// Bounds each backend call. Without a timeout the call waits as long as
	/// the backend does.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	pub fn directory(&self) -> &D {
		&self.directory
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Resolves a user id to its attributes.
	pub fn authenticate(&self, user_id: &str) -> Result<UserAttributes, AccessError> {
		self.directory.lookup(user_id).ok_or_else(|| {
			warn!(user_id = %user_id, "user not found in directory");
			AccessError::unknown_user(user_id)
		})
	}

	/// Authenticates `user_id` and compiles its final filter without querying.
	pub fn compile(
		&self,
		user_id: &str,
		content: Option<&ContentFilter>,
	) -> Result<Expr, AccessError> {
		let user = self.authenticate(user_id)?;
		Ok(self.compiler.compile_final_filter(&user, content))
	}

	/// Runs `query_text` on behalf of `user_id`.
	pub async fn query(
		&self,
		query_text: &str,
		content: Option<&ContentFilter>,
		user_id: &str,
	) -> Result<QueryResult, AccessError> {
		self.query_with_filter(query_text, content, user_id)
			.await
			.map(|(_, result)| result)
	}

	/// Like [`QueryFacade::query`], also returning the filter text the backend
	/// was given. The user is authenticated once.
	#[instrument(
		skip(self, query_text, content),
		fields(
			user_id = %user_id,
			request_id = %uuid::Uuid::new_v4(),
			has_content_filter = content.is_some(),
		)
	)]
	pub async fn query_with_filter(
		&self,
		query_text: &str,
		content: Option<&ContentFilter>,
		user_id: &str,
	) -> Result<(String, QueryResult), AccessError> {
		let filter = self.compile(user_id, content)?.to_filter_string();
		debug!(filter = %filter, "compiled access filter");

		let request = QueryRequest::new(query_text, filter.as_str());
		let call = self.backend.execute_query(&request);

		let result = match self.timeout {
			Some(limit) => match tokio::time::timeout(limit, call).await {
				Ok(result) => result,
				Err(_) => {
					warn!(timeout_ms = limit.as_millis(), "backend query timed out");
					Err(BackendError::Timeout)
				}
			},
			None => call.await,
		};

		let result = result?;
		debug!(match_count = result.matches.len(), "query completed");
		Ok((filter, result))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::CorpusSchema;
	use crate::directory::StaticDirectory;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::{Arc, Mutex};

	#[derive(Default)]
	struct RecordingBackend {
		calls: AtomicU32,
		last_filter: Mutex<Option<String>>,
		fail_with: Option<BackendError>,
		delay: Option<Duration>,
	}

	#[async_trait]
	impl RetrievalBackend for RecordingBackend {
		async fn create_corpus(&self, _schema: &CorpusSchema) -> Result<(), BackendError> {
			Ok(())
		}

		async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResult, BackendError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			*self.last_filter.lock().unwrap() = Some(request.filter.clone());
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			match &self.fail_with {
				Some(err) => Err(err.clone()),
				None => Ok(QueryResult::default()),
			}
		}
	}

	struct CountingDirectory {
		inner: StaticDirectory,
		lookups: AtomicU32,
	}

	impl UserDirectory for CountingDirectory {
		fn lookup(&self, user_id: &str) -> Option<UserAttributes> {
			self.lookups.fetch_add(1, Ordering::SeqCst);
			self.inner.lookup(user_id)
		}
	}

	fn directory() -> StaticDirectory {
		StaticDirectory::new([UserAttributes::new("jun")
			.with_groups(["history"])
			.with_roles(["analyst"])])
	}

	#[test]
	fn authenticate_known_user() {
		let facade = QueryFacade::new(directory(), RecordingBackend::default());
		let user = facade.authenticate("jun").unwrap();
		assert!(user.is_member_of("history"));
	}

	#[test]
	fn authenticate_unknown_user_fails() {
		let facade = QueryFacade::new(directory(), RecordingBackend::default());
		let err = facade.authenticate("nobody").unwrap_err();
		assert_eq!(err, AccessError::unknown_user("nobody"));
	}

	#[tokio::test]
	async fn unknown_user_never_reaches_backend() {
		let backend = Arc::new(RecordingBackend::default());
		let facade = QueryFacade::new(directory(), Arc::clone(&backend));

		let err = facade.query("anything", None, "nobody").await.unwrap_err();

		assert!(err.is_unknown_user());
		assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn content_filter_is_passed_through_verbatim() {
		let backend = Arc::new(RecordingBackend::default());
		let facade = QueryFacade::new(directory(), Arc::clone(&backend));
		let content = ContentFilter::raw("doc.project='labs'").unwrap();

		facade.query("q", Some(&content), "jun").await.unwrap();

		let filter = backend.last_filter.lock().unwrap().clone().unwrap();
		assert!(filter.ends_with(" AND (doc.project='labs')"));
		assert_eq!(filter, facade.compile("jun", Some(&content)).unwrap().to_string());
	}

	#[tokio::test]
	async fn query_with_filter_returns_the_submitted_filter() {
		let backend = Arc::new(RecordingBackend::default());
		let counting = Arc::new(CountingDirectory {
			inner: directory(),
			lookups: AtomicU32::new(0),
		});
		let facade = QueryFacade::new(Arc::clone(&counting), Arc::clone(&backend));
		let content = ContentFilter::raw("doc.project='labs'").unwrap();

		let (filter, _) = facade
			.query_with_filter("q", Some(&content), "jun")
			.await
			.unwrap();

		assert_eq!(counting.lookups.load(Ordering::SeqCst), 1);
		assert_eq!(backend.last_filter.lock().unwrap().as_deref(), Some(filter.as_str()));
	}

	#[tokio::test]
	async fn backend_errors_propagate_unchanged() {
		let rejection = BackendError::MalformedFilter {
			message: "unexpected token at 3".to_string(),
		};
		let backend = RecordingBackend {
			fail_with: Some(rejection.clone()),
			..Default::default()
		};
		let facade = QueryFacade::new(directory(), backend);

		let err = facade.query("q", None, "jun").await.unwrap_err();
		assert_eq!(err, AccessError::Backend(rejection));
	}

	#[tokio::test]
	async fn slow_backend_times_out() {
		let backend = RecordingBackend {
			delay: Some(Duration::from_secs(5)),
			..Default::default()
		};
		let facade =
			QueryFacade::new(directory(), backend).with_timeout(Duration::from_millis(10));

		let err = facade.query("q", None, "jun").await.unwrap_err();
		assert_eq!(err, AccessError::Backend(BackendError::Timeout));
	}

	#[test]
	fn group_match_mode_changes_compiled_filter() {
		let dir = StaticDirectory::new([UserAttributes::new("nobody")]);
		let strict = QueryFacade::new(dir.clone(), RecordingBackend::default());
		let legacy = QueryFacade::new(dir, RecordingBackend::default())
			.with_group_match(GroupMatchMode::PresenceOnly);

		assert_ne!(
			strict.compile("nobody", None).unwrap(),
			legacy.compile("nobody", None).unwrap()
		);
	}
}
