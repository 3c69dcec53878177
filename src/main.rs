use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use standalone_gen::config::{
	CONFIG_FILE_NAME, LoadedConfig, generate_init_template, load_config, user_config_path,
};
use standalone_gen::pipeline::{Plan, Rules, resolve_base_dir};

#[derive(Parser)]
#[command(name = "standalone-gen")]
#[command(
	author,
	version,
	about = "CLI tool for extracting framework sources into standalone, dependency-free artifacts"
)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Framework base directory (defaults to the configured environment variable)
	#[arg(long, value_name = "DIR")]
	base: Option<PathBuf>,

	/// Directory receiving the artifacts, relative to the base directory
	#[arg(long, value_name = "DIR")]
	output_dir: Option<PathBuf>,

	/// Config file to use instead of the .standalone.toml cascade
	#[arg(long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Create a template .standalone.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .standalone.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Increase log verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective configuration and where it came from
	Show,
	/// Check the config file and its patterns without generating anything
	Validate,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_tracing(verbose: u8) {
	let default_directive = match verbose {
		0 => "standalone_gen=warn",
		1 => "standalone_gen=info",
		_ => "standalone_gen=debug",
	};
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	// Handle subcommands
	if let Some(ref command) = cli.command {
		return match command {
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(cli.config.as_deref(), &cwd),
				ConfigAction::Validate => handle_config_validate(cli.config.as_deref(), &cwd),
			},
		};
	}

	handle_generate(&cli, &cwd)
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn describe_source(loaded: &LoadedConfig) -> String {
	match loaded.path {
		Some(ref path) => path.display().to_string(),
		None => "built-in defaults".to_string(),
	}
}

fn handle_config_show(explicit: Option<&Path>, cwd: &Path) -> Result<ExitCode> {
	let loaded = load_config(explicit, cwd).context("Failed to load configuration")?;
	let config = &loaded.config;

	println!("# Source: {}", describe_source(&loaded));
	println!("base-env-var: {}", config.base_env_var);
	println!("formats-dir: {}", config.formats_dir.display());
	println!("output-dir: {}", config.output_dir.display());
	println!();

	println!("[header]");
	println!("  subdir: {}", config.header.subdir.display());
	println!("  files: {}", config.header.files.join(", "));
	println!("  output: {}", config.header.output);
	println!(
		"  drop_include_prefixes: {}",
		config.header.drop_include_prefixes.join(", ")
	);
	println!("  drop_markers: {}", config.header.drop_markers.join(", "));
	for pattern in &config.header.drop_patterns {
		println!("  drop_pattern: {}", pattern);
	}
	println!();

	let imp = &config.implementation;
	println!("[implementation]");
	println!("  subdir: {}", imp.subdir.display());
	println!("  files: {}", imp.files.join(", "));
	println!("  output: {}", imp.output);
	println!(
		"  drop_include_prefixes: {}",
		imp.drop_include_prefixes.join(", ")
	);
	for pattern in &imp.drop_patterns {
		println!("  drop_pattern: {}", pattern);
	}
	println!("  system_includes: {}", imp.system_includes.join(", "));
	println!("  throw_pattern: {}", imp.throw_pattern);
	println!("  diagnostic: {}", imp.diagnostic);
	println!("  raise: {}", imp.raise);
	println!("  terminator: {}", imp.terminator.as_str());
	println!("  terminator_offset: {}", imp.terminator_offset);
	println!();

	// Show user config path
	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(explicit: Option<&Path>, cwd: &Path) -> Result<ExitCode> {
	let loaded = match load_config(explicit, cwd) {
		Ok(loaded) => loaded,
		Err(e) => {
			eprintln!("Configuration error: {}", e);
			return Ok(ExitCode::FAILURE);
		}
	};

	if let Err(e) = Rules::from_config(&loaded.config) {
		eprintln!("Configuration error: {}", e);
		return Ok(ExitCode::FAILURE);
	}

	match loaded.path {
		Some(ref path) => println!("Configuration is valid: {}", path.display()),
		None => println!("No configuration file found; built-in defaults are valid."),
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_generate(cli: &Cli, cwd: &Path) -> Result<ExitCode> {
	let loaded = load_config(cli.config.as_deref(), cwd).context("Failed to load configuration")?;
	let config = &loaded.config;
	tracing::info!(source = %describe_source(&loaded), "using configuration");

	let base = resolve_base_dir(cli.base.as_deref(), config)
		.context("Failed to resolve base directory")?;
	let plan = Plan::new(config, &base, cli.output_dir.as_deref());
	let rules = Rules::from_config(config).context("Failed to compile rules")?;

	for artifact in plan.artifacts() {
		let shown = plan.display_path(&artifact.output);
		println!("Creating {}", shown.display());

		let report = rules
			.generate(artifact)
			.with_context(|| format!("Failed to create {}", shown.display()))?;

		println!(
			"  {} {} files, {} lines read, {} dropped, {} throws rewritten",
			report.files,
			artifact.role.as_str(),
			report.lines_read,
			report.lines_dropped,
			report.triggers
		);
	}

	Ok(ExitCode::SUCCESS)
}
