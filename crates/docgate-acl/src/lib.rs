// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access-control filter compiler for shared retrieval corpora.
//!
//! Documents in a shared corpus carry `owner`, `groups` and `roles` metadata.
//! For each query this crate compiles the querying user's attributes into a
//! filter expression that the retrieval backend evaluates per document, so
//! only documents the user may see can contribute to the answer.
//!
//! A document is visible to a user when:
//!
//! - the user owns it, or it is owned by `global`; or
//! - it lists a group the user belongs to, and it either lists no roles or
//!   lists a role the user holds.
//!
//! An optional content filter supplied by the caller is conjoined with the
//! access filter and can only narrow the result. Raw filter text whose
//! parentheses or quotes do not balance is rejected before any query.
//!
//! # Example
//!
//! ```
//! use docgate_acl::{compile_final_filter, ContentFilter, UserAttributes};
//!
//! let jun = UserAttributes::new("jun")
//! 	.with_groups(["history"])
//! 	.with_roles(["analyst"]);
//! let filter = compile_final_filter(&jun, Some(&ContentFilter::raw("doc.project='lectures'").unwrap()));
//! assert!(filter.to_string().ends_with("AND (doc.project='lectures')"));
//! ```

pub mod backend;
pub mod builder;
pub mod compiler;
pub mod directory;
pub mod error;
mod eval;
pub mod expr;
pub mod facade;
pub mod memory;
pub mod parse;
pub mod sample;
pub mod types;

pub use backend::{
	AttributeType, BackendError, CorpusSchema, FilterAttribute, QueryRequest, QueryResult,
	RetrievalBackend, SearchMatch,
};
pub use builder::{group_clause, owner_clause, role_clause, GroupMatchMode};
pub use compiler::{
	compile_access_filter, compile_final_filter, AccessFilterCompiler, ContentFilter, RawFilter,
};
pub use directory::{SnapshotDirectory, StaticDirectory, UserDirectory};
pub use error::AccessError;
pub use expr::{quote_literal, Attribute, AttributeLevel, Expr};
pub use facade::QueryFacade;
pub use memory::{IndexedDocument, MemoryBackend};
pub use parse::{check_balanced, parse_filter, ParseError};
pub use types::{AttributeValue, DocumentAttributes, UserAttributes, GLOBAL_OWNER};
