// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer for merging from multiple sources.

use std::collections::BTreeMap;

use docgate_acl::GroupMatchMode;
use docgate_common_config::SecretString;
use serde::Deserialize;

/// Partial configuration: every field is optional so layers can be stacked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
	#[serde(default)]
	pub backend: Option<BackendLayer>,
	#[serde(default)]
	pub acl: Option<AclLayer>,
	#[serde(default)]
	pub retry: Option<RetryLayer>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
	#[serde(default)]
	pub directory: Option<DirectoryLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub corpus_key: Option<String>,
	#[serde(default)]
	pub api_key: Option<SecretString>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub max_used_search_results: Option<u32>,
	#[serde(default)]
	pub generation_preset: Option<String>,
	/// An empty string disables reranking.
	#[serde(default)]
	pub reranker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AclLayer {
	#[serde(default)]
	pub group_match: Option<GroupMatchMode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetryLayer {
	#[serde(default)]
	pub max_attempts: Option<u32>,
	#[serde(default)]
	pub base_delay_ms: Option<u64>,
	#[serde(default)]
	pub max_delay_ms: Option<u64>,
	#[serde(default)]
	pub backoff_factor: Option<f64>,
	#[serde(default)]
	pub jitter: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
}

/// `[directory.users.<id>]` tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryLayer {
	#[serde(default)]
	pub users: BTreeMap<String, UserLayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserLayer {
	#[serde(default)]
	pub groups: Vec<String>,
	#[serde(default)]
	pub roles: Vec<String>,
}

impl ConfigLayer {
	/// Merge another layer into this one. `other` takes precedence.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.backend, other.backend, BackendLayer::merge);
		merge_option(&mut self.acl, other.acl, AclLayer::merge);
		merge_option(&mut self.retry, other.retry, RetryLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingLayer::merge);
		merge_option(&mut self.directory, other.directory, DirectoryLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

fn replace_if_some<T>(target: &mut Option<T>, source: Option<T>) {
	if source.is_some() {
		*target = source;
	}
}

impl BackendLayer {
	fn merge(&mut self, other: BackendLayer) {
		replace_if_some(&mut self.base_url, other.base_url);
		replace_if_some(&mut self.corpus_key, other.corpus_key);
		replace_if_some(&mut self.api_key, other.api_key);
		replace_if_some(&mut self.timeout_secs, other.timeout_secs);
		replace_if_some(
			&mut self.max_used_search_results,
			other.max_used_search_results,
		);
		replace_if_some(&mut self.generation_preset, other.generation_preset);
		replace_if_some(&mut self.reranker, other.reranker);
	}
}

impl AclLayer {
	fn merge(&mut self, other: AclLayer) {
		replace_if_some(&mut self.group_match, other.group_match);
	}
}

impl RetryLayer {
	fn merge(&mut self, other: RetryLayer) {
		replace_if_some(&mut self.max_attempts, other.max_attempts);
		replace_if_some(&mut self.base_delay_ms, other.base_delay_ms);
		replace_if_some(&mut self.max_delay_ms, other.max_delay_ms);
		replace_if_some(&mut self.backoff_factor, other.backoff_factor);
		replace_if_some(&mut self.jitter, other.jitter);
	}
}

impl LoggingLayer {
	fn merge(&mut self, other: LoggingLayer) {
		replace_if_some(&mut self.level, other.level);
		replace_if_some(&mut self.format, other.format);
	}
}

impl DirectoryLayer {
	/// A user defined in a higher layer replaces that user's whole entry;
	/// memberships are not unioned across layers.
	fn merge(&mut self, other: DirectoryLayer) {
		self.users.extend(other.users);
	}
}
