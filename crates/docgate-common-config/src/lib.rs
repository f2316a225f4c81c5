// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration primitives shared by docgate crates.
//!
//! - [`Secret<T>`]: keeps API keys out of logs and config dumps
//! - [`load_secret_env`]: reads a secret from `VAR` or the file named by
//!   `VAR_FILE`

pub mod env;
pub mod secret;

pub use env::{load_secret_env, load_secret_env_any, SecretEnvError};
pub use secret::{Secret, SecretString, REDACTED};
