// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Vectara retrieval backend for docgate.
//!
//! Wraps the Vectara v2 REST API: corpus creation and deletion, and queries
//! carrying a `metadata_filter` compiled by `docgate-acl`.

pub mod client;
pub mod error;
pub mod types;

pub use client::VectaraClient;
pub use docgate_common_http::RetryConfig;
pub use error::VectaraError;
pub use types::GenerationSettings;
