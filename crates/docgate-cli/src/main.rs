// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! docgate CLI - access-controlled retrieval over a shared corpus
//!
//! Compiles per-user access filters, runs filtered queries against Vectara,
//! and manages the corpus those queries target.

mod demo;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docgate_acl::{
	sample, ContentFilter, CorpusSchema, GroupMatchMode, QueryFacade, QueryResult,
	RetrievalBackend, StaticDirectory,
};
use docgate_cli_config::{
	load_config_with_cli, paths::resolve_xdg_paths, write_default_config, CliOverrides,
	DocgateConfig, LogFormat, LogLevel, LoggingConfig,
};
use docgate_retrieval_vectara::{GenerationSettings, VectaraClient};

/// docgate - access-controlled retrieval
#[derive(Parser, Debug)]
#[command(name = "docgate", version, about, long_about = None)]
struct Args {
	/// Path to a configuration file layered above the user config
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Log level (overrides config)
	#[arg(short, long, global = true)]
	log_level: Option<String>,

	/// Log format: pretty, compact or json (overrides config)
	#[arg(long, global = true)]
	log_format: Option<String>,

	/// Retrieval service base URL
	#[arg(long, global = true)]
	base_url: Option<String>,

	/// Corpus to query
	#[arg(long, global = true)]
	corpus_key: Option<String>,

	/// Per-request timeout in seconds
	#[arg(long, global = true)]
	timeout_secs: Option<u64>,

	/// How users without groups are matched: require_membership or presence_only
	#[arg(long, global = true)]
	group_match: Option<GroupMatchMode>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the compiled filter for a user
	Filter {
		#[arg(long, short)]
		user: String,

		/// Extra filter conjoined with the access filter
		#[arg(long)]
		content_filter: Option<String>,
	},

	/// Run a query on behalf of a user
	Query {
		#[arg(long, short)]
		user: String,

		#[arg(long)]
		content_filter: Option<String>,

		/// Query the built-in sample corpus in memory instead of the service
		#[arg(long)]
		local: bool,

		/// Print the raw result as JSON
		#[arg(long)]
		json: bool,

		text: String,
	},

	/// Create the corpus with the access-control filter attributes
	CreateCorpus,

	/// Delete the corpus and everything indexed in it
	DeleteCorpus {
		/// Confirm deletion
		#[arg(long)]
		yes: bool,
	},

	/// List users in the directory
	Users,

	/// Replay the narrated walkthrough against the sample corpus
	Demo,

	/// Write a starter config file
	InitConfig {
		/// Where to write it (defaults to the user config location)
		#[arg(long)]
		path: Option<PathBuf>,

		/// Overwrite an existing file
		#[arg(long)]
		force: bool,
	},
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		CliOverrides {
			config_file: args.config.clone(),
			base_url: args.base_url.clone(),
			corpus_key: args.corpus_key.clone(),
			timeout_secs: args.timeout_secs,
			group_match: args.group_match,
			log_level: args.log_level.clone(),
			log_format: args.log_format.clone(),
		}
	}
}

fn log_level_to_tracing(level: LogLevel) -> tracing::Level {
	match level {
		LogLevel::Trace => tracing::Level::TRACE,
		LogLevel::Debug => tracing::Level::DEBUG,
		LogLevel::Info => tracing::Level::INFO,
		LogLevel::Warn => tracing::Level::WARN,
		LogLevel::Error => tracing::Level::ERROR,
	}
}

// Logs go to stderr; stdout carries filters and answers.
fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		EnvFilter::new(format!("docgate={}", log_level_to_tracing(logging.level)))
	});

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

/// The configured directory, or the sample one when none is configured.
fn load_directory(config: &DocgateConfig) -> StaticDirectory {
	if config.directory.is_empty() {
		debug!("no users configured, using the sample directory");
		sample::directory()
	} else {
		config.directory.to_directory()
	}
}

fn vectara_client(config: &DocgateConfig) -> Result<VectaraClient> {
	let backend = &config.backend;
	let api_key = backend.require_api_key()?.clone();
	let corpus_key = backend.require_corpus_key()?;

	let generation = GenerationSettings {
		preset: backend.generation_preset.clone(),
		max_used_search_results: backend.max_used_search_results,
		reranker: backend.reranker.clone(),
		..Default::default()
	};

	let client = VectaraClient::new(api_key, corpus_key)
		.context("failed to build HTTP client")?
		.with_base_url(backend.base_url.as_str())
		.with_retry_config(config.retry.to_retry_config())
		.with_generation(generation)
		.with_timeout(backend.timeout)
		.context("failed to build HTTP client")?;

	Ok(client)
}

fn print_result(result: &QueryResult, user: &str, text: &str, filter: &str, json: bool) -> Result<()> {
	if json {
		let rendered = serde_json::to_string_pretty(result).context("failed to render result")?;
		println!("{rendered}");
		return Ok(());
	}

	println!("[{user}]>>> {text}");
	match &result.summary {
		Some(summary) => println!("[{user}]<<< {summary}"),
		None => println!("[{user}]<<< (no answer)"),
	}
	for (rank, found) in result.matches.iter().enumerate() {
		println!("  {}. {} ({:.3})", rank + 1, found.document_id, found.score);
	}
	println!("# Filter used: {filter}");
	Ok(())
}

fn parse_content_filter(text: Option<String>) -> Result<Option<ContentFilter>> {
	text.map(ContentFilter::raw)
		.transpose()
		.context("invalid content filter")
}

async fn run_query<B: RetrievalBackend>(
	facade: &QueryFacade<StaticDirectory, B>,
	user: &str,
	text: &str,
	content: Option<&ContentFilter>,
	json: bool,
) -> Result<()> {
	let (filter, result) = facade
		.query_with_filter(text, content, user)
		.await
		.context("query failed")?;
	print_result(&result, user, text, &filter, json)
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let config = load_config_with_cli(CliOverrides::from(&args))
		.context("failed to load configuration")?;

	init_tracing(&config.logging);

	info!(
		group_match = %config.acl.group_match,
		"starting docgate"
	);

	match args.command {
		Command::Filter {
			user,
			content_filter,
		} => {
			let facade = QueryFacade::new(load_directory(&config), docgate_acl::MemoryBackend::new())
				.with_group_match(config.acl.group_match);
			let content = parse_content_filter(content_filter)?;
			let filter = facade
				.compile(&user, content.as_ref())
				.context("failed to compile access filter")?;
			println!("{filter}");
		}

		Command::Query {
			user,
			content_filter,
			local,
			json,
			text,
		} => {
			let content = parse_content_filter(content_filter)?;
			if local {
				let max_results = config.backend.max_used_search_results as usize;
				let facade = demo::build_facade(config.acl.group_match, max_results).await?;
				run_query(&facade, &user, &text, content.as_ref(), json).await?;
			} else {
				let budget = config
					.backend
					.timeout
					.saturating_mul(config.retry.max_attempts);
				let facade = QueryFacade::new(load_directory(&config), vectara_client(&config)?)
					.with_group_match(config.acl.group_match)
					.with_timeout(budget);
				run_query(&facade, &user, &text, content.as_ref(), json).await?;
			}
		}

		Command::CreateCorpus => {
			let client = vectara_client(&config)?;
			client
				.create(&CorpusSchema::access_control(client.corpus_key()))
				.await
				.context("failed to create corpus")?;
			println!("created corpus {}", client.corpus_key());
		}

		Command::DeleteCorpus { yes } => {
			let client = vectara_client(&config)?;
			if !yes {
				bail!(
					"refusing to delete corpus {} without --yes",
					client.corpus_key()
				);
			}
			client
				.delete_corpus()
				.await
				.context("failed to delete corpus")?;
			println!("deleted corpus {}", client.corpus_key());
		}

		Command::Users => {
			let directory = load_directory(&config);
			for user in directory.users() {
				let groups: Vec<&str> = user.groups.iter().map(String::as_str).collect();
				let roles: Vec<&str> = user.roles.iter().map(String::as_str).collect();
				println!(
					"{}\tgroups=[{}]\troles=[{}]",
					user.user_id,
					groups.join(", "),
					roles.join(", ")
				);
			}
		}

		Command::Demo => {
			let mut stdout = std::io::stdout();
			demo::run(config.acl.group_match, &mut stdout).await?;
		}

		Command::InitConfig { path, force } => {
			let path = match path {
				Some(path) => path,
				None => resolve_xdg_paths()
					.context("failed to resolve config location")?
					.user_config_file,
			};
			if write_default_config(&path, force).context("failed to write config")? {
				println!("wrote {}", path.display());
			} else {
				println!("{} already exists (use --force to overwrite)", path.display());
			}
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use docgate_cli_config::{ConfigLayer, PathsConfig};

	fn config() -> DocgateConfig {
		DocgateConfig::from_layer(ConfigLayer::default(), PathsConfig::default()).unwrap()
	}

	#[test]
	fn args_map_to_overrides() {
		let args = Args::parse_from([
			"docgate",
			"--corpus-key",
			"acl-demo",
			"--group-match",
			"presence-only",
			"filter",
			"--user",
			"jun",
		]);
		let overrides = CliOverrides::from(&args);
		assert_eq!(overrides.corpus_key.as_deref(), Some("acl-demo"));
		assert_eq!(overrides.group_match, Some(GroupMatchMode::PresenceOnly));
		assert!(matches!(args.command, Command::Filter { ref user, .. } if user == "jun"));
	}

	#[test]
	fn global_flags_work_after_the_subcommand() {
		let args = Args::parse_from(["docgate", "users", "--log-level", "debug"]);
		assert_eq!(args.log_level.as_deref(), Some("debug"));
	}

	#[test]
	fn empty_directory_falls_back_to_sample() {
		assert_eq!(load_directory(&config()).len(), 6);
	}

	#[test]
	fn local_facade_knows_sample_users() {
		let facade = tokio_test::block_on(demo::build_facade(
			GroupMatchMode::default(),
			demo::DEMO_MAX_RESULTS,
		))
		.unwrap();
		assert!(facade.authenticate("mary").is_ok());
		assert!(facade.authenticate("nobody").is_err());
	}

	#[test]
	fn unbalanced_content_filter_is_refused() {
		let breakout = "doc.project='x') OR (doc.owner IS NOT NULL";
		let err = parse_content_filter(Some(breakout.into())).unwrap_err();
		assert!(err.to_string().contains("invalid content filter"));
		assert!(parse_content_filter(Some("doc.project='labs'".into())).unwrap().is_some());
		assert!(parse_content_filter(None).unwrap().is_none());
	}

	#[test]
	fn vectara_client_needs_credentials() {
		let err = vectara_client(&config()).unwrap_err();
		assert!(err.to_string().contains("Missing required field"));
	}
}
