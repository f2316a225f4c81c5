// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::PathBuf;

use crate::ConfigError;

pub const SYSTEM_CONFIG_FILE: &str = "/etc/docgate/config.toml";

/// Config file locations for docgate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
	/// `$XDG_CONFIG_HOME/docgate/config.toml`
	pub user_config_file: PathBuf,
	pub system_config_file: PathBuf,
}

impl PathsConfig {
	pub fn config_dir(&self) -> PathBuf {
		self.user_config_file
			.parent()
			.map(|p| p.to_path_buf())
			.unwrap_or_else(|| self.user_config_file.clone())
	}
}

impl Default for PathsConfig {
	fn default() -> Self {
		Self {
			user_config_file: PathBuf::from("~/.config/docgate/config.toml"),
			system_config_file: PathBuf::from(SYSTEM_CONFIG_FILE),
		}
	}
}

/// Uses `XDG_CONFIG_HOME` when set, otherwise `~/.config`.
pub fn resolve_xdg_paths() -> Result<PathsConfig, ConfigError> {
	let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
		Some(dir) if !dir.is_empty() => PathBuf::from(dir),
		_ => dirs::home_dir()
			.ok_or(ConfigError::HomeDirNotFound)?
			.join(".config"),
	};

	tracing::debug!(config_home = %config_home.display(), "resolved XDG config home");

	Ok(PathsConfig {
		user_config_file: config_home.join("docgate/config.toml"),
		system_config_file: PathBuf::from(SYSTEM_CONFIG_FILE),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolved_paths_live_under_docgate() {
		let paths = resolve_xdg_paths().unwrap();
		assert!(paths.user_config_file.ends_with("docgate/config.toml"));
		assert_eq!(paths.system_config_file, PathBuf::from(SYSTEM_CONFIG_FILE));
		assert!(paths.config_dir().ends_with("docgate"));
	}
}
