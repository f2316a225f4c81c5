// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Replays the narrated access-control walkthrough against the in-memory
//! backend seeded with the sample university corpus.

use std::io::Write;

use anyhow::{Context, Result};
use docgate_acl::{
	sample, ContentFilter, CorpusSchema, GroupMatchMode, MemoryBackend, QueryFacade,
	RetrievalBackend, StaticDirectory,
};
use tracing::{debug, info, instrument};

pub struct NarratedQuery {
	pub user: &'static str,
	pub query: &'static str,
	pub content_filter: Option<&'static str>,
	pub narration: &'static str,
	/// Document expected to answer, `None` when access must be denied.
	pub expected: Option<&'static str>,
}

pub const NARRATED_QUERIES: [NarratedQuery; 8] = [
	NarratedQuery {
		user: "jun",
		query: "How many faces does the hero have?",
		content_filter: None,
		narration: "jun gets an answer: they own the document that has it",
		expected: Some("TheHerosJourney"),
	},
	NarratedQuery {
		user: "justin",
		query: "How many faces does the hero have?",
		content_filter: None,
		narration: "justin gets an answer: the religion group may see the document",
		expected: Some("TheHerosJourney"),
	},
	NarratedQuery {
		user: "eliza",
		query: "How many faces does the hero have?",
		content_filter: None,
		narration: "eliza gets no answer: physics is not a permitted group",
		expected: None,
	},
	NarratedQuery {
		user: "ashish",
		query: "Did Isaac Newton work on gravity?",
		content_filter: None,
		narration: "ashish gets no answer: physics member, but holds neither 'pii' nor 'dean'",
		expected: None,
	},
	NarratedQuery {
		user: "eliza",
		query: "Did Isaac Newton work on gravity?",
		content_filter: None,
		narration: "eliza gets an answer: physics member holding the 'dean' role",
		expected: Some("GreatPhysicists"),
	},
	NarratedQuery {
		user: "mary",
		query: "Why are students not allowed to go to the forbidden forest?",
		content_filter: None,
		narration: "mary gets an answer: the rules document is globally owned",
		expected: Some("UniversityRules"),
	},
	NarratedQuery {
		user: "jun",
		query: "What does Osiris symbolize?",
		content_filter: Some("doc.project='lectures'"),
		narration: "jun gets an answer: history member with the 'analyst' role, asking about 'lectures'",
		expected: Some("TheGoldenBough"),
	},
	NarratedQuery {
		user: "jun",
		query: "What does Osiris symbolize?",
		content_filter: Some("doc.project='labs'"),
		narration: "jun gets no answer: same access, but the 'labs' project filter excludes the document",
		expected: None,
	},
];

/// What one narrated query produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoOutcome {
	pub user: &'static str,
	pub filter: String,
	pub top_document: Option<String>,
	pub summary: Option<String>,
}

/// Matches kept per query when no configured limit applies.
pub const DEMO_MAX_RESULTS: usize = 5;

/// Creates the in-memory corpus and indexes the sample documents into it.
pub async fn build_facade(
	mode: GroupMatchMode,
	max_results: usize,
) -> Result<QueryFacade<StaticDirectory, MemoryBackend>> {
	let backend = MemoryBackend::new().with_max_results(max_results);
	backend
		.create_corpus(&CorpusSchema::access_control("acl-demo"))
		.await
		.context("failed to create demo corpus")?;
	for document in sample::documents() {
		backend.index(document).await;
	}
	debug!(documents = backend.document_count().await, "seeded demo corpus");
	Ok(QueryFacade::new(sample::directory(), backend).with_group_match(mode))
}

/// Runs every narrated query, writing a transcript to `out`.
#[instrument(skip(out))]
pub async fn run<W: Write>(mode: GroupMatchMode, out: &mut W) -> Result<Vec<DemoOutcome>> {
	let facade = build_facade(mode, DEMO_MAX_RESULTS).await?;
	let mut outcomes = Vec::with_capacity(NARRATED_QUERIES.len());

	for step in &NARRATED_QUERIES {
		let content = step
			.content_filter
			.map(ContentFilter::raw)
			.transpose()
			.with_context(|| format!("invalid content filter for {}", step.user))?;
		let (filter, result) = facade
			.query_with_filter(step.query, content.as_ref(), step.user)
			.await
			.with_context(|| format!("query for {} failed", step.user))?;

		writeln!(out, "####################################")?;
		writeln!(out, "# {}", step.narration)?;
		writeln!(out, "[{}]>>> {}", step.user, step.query)?;
		match &result.summary {
			Some(summary) => writeln!(out, "[{}]<<< {}", step.user, summary)?,
			None => writeln!(out, "[{}]<<< (no answer)", step.user)?,
		}
		writeln!(out, "# Filter used: {filter}\n")?;

		outcomes.push(DemoOutcome {
			user: step.user,
			filter,
			top_document: result.matches.first().map(|m| m.document_id.clone()),
			summary: result.summary,
		});
	}

	let mismatches = NARRATED_QUERIES
		.iter()
		.zip(&outcomes)
		.filter(|(step, outcome)| step.expected != outcome.top_document.as_deref())
		.count();
	info!(queries = outcomes.len(), mismatches, "demo finished");

	Ok(outcomes)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn every_narrated_query_matches_its_expectation() {
		let mut transcript = Vec::new();
		let outcomes = run(GroupMatchMode::RequireMembership, &mut transcript)
			.await
			.unwrap();

		for (step, outcome) in NARRATED_QUERIES.iter().zip(&outcomes) {
			assert_eq!(
				outcome.top_document.as_deref(),
				step.expected,
				"{}",
				step.narration
			);
		}

		let transcript = String::from_utf8(transcript).unwrap();
		assert_eq!(transcript.matches("# Filter used:").count(), 8);
		assert!(transcript.contains("[eliza]<<< (no answer)"));
	}

	#[tokio::test]
	async fn legacy_mode_gives_the_same_answers_for_sample_users() {
		// Every sample user belongs to a group, so the modes agree.
		let outcomes = run(GroupMatchMode::PresenceOnly, &mut std::io::sink())
			.await
			.unwrap();
		let answered: Vec<_> = outcomes.iter().map(|o| o.top_document.is_some()).collect();
		assert_eq!(
			answered,
			vec![true, true, false, false, true, true, true, false]
		);
	}

	#[tokio::test]
	async fn content_filter_is_appended_to_the_access_filter() {
		let outcomes = run(GroupMatchMode::default(), &mut std::io::sink())
			.await
			.unwrap();
		assert!(outcomes[6].filter.ends_with("AND (doc.project='lectures')"));
		assert!(outcomes[6].filter.starts_with("((doc.owner IN ('global', 'jun'))"));
		assert!(outcomes[0].filter.starts_with("(doc.owner IN ('global', 'jun')) OR "));
	}

	#[tokio::test]
	async fn demo_corpus_holds_every_sample_document() {
		let capped = build_facade(GroupMatchMode::default(), 1).await.unwrap();
		assert_eq!(
			capped.backend().document_count().await,
			sample::documents().len()
		);

		// mary sees the religion-group journey and the global rules.
		let uncapped = build_facade(GroupMatchMode::default(), DEMO_MAX_RESULTS)
			.await
			.unwrap();
		let both = uncapped.query("hero students", None, "mary").await.unwrap();
		assert_eq!(both.matches.len(), 2);
		let one = capped.query("hero students", None, "mary").await.unwrap();
		assert_eq!(one.matches.len(), 1);
	}

	#[tokio::test]
	async fn filter_in_transcript_is_the_one_queried() {
		let mut transcript = Vec::new();
		let outcomes = run(GroupMatchMode::default(), &mut transcript).await.unwrap();
		let transcript = String::from_utf8(transcript).unwrap();
		for outcome in &outcomes {
			assert!(transcript.contains(&format!("# Filter used: {}\n", outcome.filter)));
		}
	}
}
