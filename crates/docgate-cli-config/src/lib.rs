// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the docgate CLI.
//!
//! Layers, lowest precedence first: built-in defaults, the system file, the
//! user file, an explicit `--config` file, environment variables, and CLI
//! flags.

pub mod defaults;
pub mod error;
pub mod layer;
pub mod paths;
pub mod registry;
pub mod runtime;
pub mod sources;
pub mod validation;

pub use defaults::{write_default_config, DEFAULT_CONFIG_TEMPLATE};
pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use paths::PathsConfig;
pub use registry::ConfigRegistry;
pub use runtime::{
	AclConfig, BackendConfig, DirectoryConfig, DocgateConfig, LogFormat, LogLevel, LoggingConfig,
	RetrySettings,
};
pub use sources::{CliOverrides, ConfigSource, Precedence};

/// Load configuration from every source.
pub fn load_config_with_cli(cli: CliOverrides) -> Result<DocgateConfig, ConfigError> {
	let paths = paths::resolve_xdg_paths()?;
	load_config_from(paths, cli)
}

/// Like [`load_config_with_cli`] with explicit well-known file locations.
pub fn load_config_from(paths: PathsConfig, cli: CliOverrides) -> Result<DocgateConfig, ConfigError> {
	let mut registry = ConfigRegistry::new();

	registry.register(Box::new(sources::DefaultsSource));
	registry.register(Box::new(sources::FileSource::system(&paths)));
	registry.register(Box::new(sources::FileSource::user(&paths)));
	if let Some(path) = &cli.config_file {
		registry.register(Box::new(sources::FileSource::explicit(path.clone())));
	}
	registry.register(Box::new(sources::EnvSource));
	registry.register(Box::new(sources::CliSource::new(cli)));

	registry.load(paths)
}
