use crate::error::StandaloneError;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration from a `.standalone.toml` file.
///
/// Every field defaults to the layout of the BTag calibration package, so an
/// empty file (or no file at all) reproduces the stock standalone build.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
	/// Environment variable holding the framework base directory.
	pub base_env_var: String,

	/// Directory of the source package, relative to the base directory.
	pub formats_dir: PathBuf,

	/// Directory receiving both artifacts, relative to the base directory.
	pub output_dir: PathBuf,

	/// Header assembly settings.
	pub header: HeaderConfig,

	/// Implementation rewrite settings.
	pub implementation: ImplementationConfig,
}

/// Settings for the concatenated header artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HeaderConfig {
	/// Subdirectory of `formats-dir` holding the headers.
	pub subdir: PathBuf,

	/// Header file names, in output order.
	pub files: Vec<String>,

	/// Artifact file name, written into `output-dir`.
	pub output: String,

	/// `#include "<prefix>...` lines to drop.
	pub drop_include_prefixes: Vec<String>,

	/// Tokens that drop any line containing them.
	pub drop_markers: Vec<String>,

	/// Extra regex patterns; a matching line is dropped.
	pub drop_patterns: Vec<String>,
}

/// Settings for the concatenated, rewritten implementation artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ImplementationConfig {
	/// Subdirectory of `formats-dir` holding the implementation files.
	pub subdir: PathBuf,

	/// Implementation file names, in output order.
	pub files: Vec<String>,

	/// Artifact file name, written into `output-dir`.
	pub output: String,

	/// `#include "<prefix>...` lines to drop.
	pub drop_include_prefixes: Vec<String>,

	/// Extra regex patterns; a matching line is dropped.
	pub drop_patterns: Vec<String>,

	/// System headers included after the header artifact, e.g. `<iostream>`.
	pub system_includes: Vec<String>,

	/// Substring marking a framework exception throw.
	pub throw_pattern: String,

	/// Line emitted in place of the throw.
	pub diagnostic: String,

	/// Statement appended once the throw expression is closed.
	pub raise: String,

	/// How the end of the throw expression is located.
	pub terminator: TerminatorMode,

	/// Lines after the trigger at which the raise is appended (line-offset mode).
	pub terminator_offset: usize,
}

/// Strategy for finding where a rewritten throw expression ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminatorMode {
	/// Append the raise a fixed number of lines after the trigger.
	#[default]
	LineOffset,

	/// Append the raise after the first line closing the statement with `;`.
	StatementEnd,
}

impl TerminatorMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			TerminatorMode::LineOffset => "line-offset",
			TerminatorMode::StatementEnd => "statement-end",
		}
	}
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from, `None` for built-in defaults.
	pub path: Option<PathBuf>,
}

const PACKAGE_FILES: [&str; 3] = ["BTagEntry", "BTagCalibration", "BTagCalibrationReader"];

impl Default for Config {
	fn default() -> Self {
		Config {
			base_env_var: "CMSSW_BASE".to_string(),
			formats_dir: PathBuf::from("src/CondFormats/BTagObjects"),
			output_dir: PathBuf::from("src/CondTools/BTag/test"),
			header: HeaderConfig::default(),
			implementation: ImplementationConfig::default(),
		}
	}
}

impl Default for HeaderConfig {
	fn default() -> Self {
		HeaderConfig {
			subdir: PathBuf::from("interface"),
			files: PACKAGE_FILES.iter().map(|f| format!("{f}.h")).collect(),
			output: "BTagCalibrationStandalone.h".to_string(),
			drop_include_prefixes: vec!["CondFormats".to_string()],
			drop_markers: vec!["COND_SERIALIZABLE".to_string()],
			drop_patterns: Vec::new(),
		}
	}
}

impl Default for ImplementationConfig {
	fn default() -> Self {
		ImplementationConfig {
			subdir: PathBuf::from("src"),
			files: PACKAGE_FILES.iter().map(|f| format!("{f}.cc")).collect(),
			output: "BTagCalibrationStandalone.cc".to_string(),
			drop_include_prefixes: vec!["CondFormats".to_string(), "FWCore".to_string()],
			drop_patterns: Vec::new(),
			system_includes: vec!["<iostream>".to_string(), "<exception>".to_string()],
			throw_pattern: "throw cms::Exception".to_string(),
			diagnostic: r#"std::cerr << "ERROR in BTagCalibration: ""#.to_string(),
			raise: "throw std::exception();".to_string(),
			terminator: TerminatorMode::LineOffset,
			terminator_offset: 2,
		}
	}
}

fn invalid(field: &str, reason: &str) -> StandaloneError {
	StandaloneError::InvalidConfig {
		field: field.to_string(),
		reason: reason.to_string(),
	}
}

fn validate_files(field: &str, files: &[String]) -> Result<(), StandaloneError> {
	if files.iter().any(|f| f.trim().is_empty()) {
		return Err(invalid(field, "file names must not be empty"));
	}
	Ok(())
}

impl Config {
	/// Check values that deserialize fine but cannot drive a run.
	pub fn validate(&self) -> Result<(), StandaloneError> {
		validate_files("header.files", &self.header.files)?;
		validate_files("implementation.files", &self.implementation.files)?;

		if self.header.output.trim().is_empty() {
			return Err(invalid("header.output", "must not be empty"));
		}
		if self.implementation.output.trim().is_empty() {
			return Err(invalid("implementation.output", "must not be empty"));
		}
		if self.header.output == self.implementation.output {
			return Err(invalid(
				"implementation.output",
				"must differ from header.output",
			));
		}

		let imp = &self.implementation;
		if imp.throw_pattern.is_empty() {
			return Err(invalid("implementation.throw_pattern", "must not be empty"));
		}
		if imp.diagnostic.is_empty() {
			return Err(invalid("implementation.diagnostic", "must not be empty"));
		}
		if imp.terminator == TerminatorMode::LineOffset && imp.terminator_offset == 0 {
			return Err(invalid(
				"implementation.terminator_offset",
				"must be at least 1",
			));
		}

		Ok(())
	}
}
