use std::path::PathBuf;

/// Library-level structured errors for standalone-gen.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum StandaloneError {
	#[error("Failed to read source file: {path}")]
	ReadSource {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write artifact: {path}")]
	WriteArtifact {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Invalid config value for {field}: {reason}")]
	InvalidConfig { field: String, reason: String },

	#[error("Base directory not set: pass --base or set {env_var}")]
	BaseDirNotSet { env_var: String },

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using StandaloneError.
pub type Result<T> = std::result::Result<T, StandaloneError>;
