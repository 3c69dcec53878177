//! Standalone package generation.
//!
//! Resolves where the framework checkout lives, lays out the input and
//! output paths, and runs the header assembler followed by the
//! implementation rewriter.

use crate::assemble::{RewriteReport, Role, assemble_headers, rewrite_implementations};
use crate::config::Config;
use crate::error::{Result, StandaloneError};
use crate::rules::{HeaderRule, ImplementationRule};
use std::path::{Path, PathBuf};

/// Resolve the framework base directory.
///
/// An explicit directory wins; otherwise the environment variable named by
/// the config must be set and non-empty.
pub fn resolve_base_dir(explicit: Option<&Path>, config: &Config) -> Result<PathBuf> {
	if let Some(dir) = explicit {
		return Ok(dir.to_path_buf());
	}

	match std::env::var_os(&config.base_env_var) {
		Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
		_ => Err(StandaloneError::BaseDirNotSet {
			env_var: config.base_env_var.clone(),
		}),
	}
}

/// One artifact to produce: ordered inputs and the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPlan {
	pub role: Role,
	pub sources: Vec<PathBuf>,
	pub output: PathBuf,
}

/// Every path a generation run touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
	pub base: PathBuf,
	pub header: ArtifactPlan,
	pub implementation: ArtifactPlan,
}

impl Plan {
	/// Lay out paths under `base`. `output_dir` replaces the configured
	/// output directory; a relative override is taken relative to `base`.
	pub fn new(config: &Config, base: &Path, output_dir: Option<&Path>) -> Self {
		let formats = base.join(&config.formats_dir);
		let out_dir = base.join(output_dir.unwrap_or(&config.output_dir));

		let header_dir = formats.join(&config.header.subdir);
		let implementation_dir = formats.join(&config.implementation.subdir);

		Plan {
			base: base.to_path_buf(),
			header: ArtifactPlan {
				role: Role::Header,
				sources: config.header.files.iter().map(|f| header_dir.join(f)).collect(),
				output: out_dir.join(&config.header.output),
			},
			implementation: ArtifactPlan {
				role: Role::Implementation,
				sources: config
					.implementation
					.files
					.iter()
					.map(|f| implementation_dir.join(f))
					.collect(),
				output: out_dir.join(&config.implementation.output),
			},
		}
	}

	/// Artifacts in the order they are generated.
	pub fn artifacts(&self) -> [&ArtifactPlan; 2] {
		[&self.header, &self.implementation]
	}

	/// Path shown to the user, relative to the base directory when possible.
	pub fn display_path<'a>(&self, path: &'a Path) -> &'a Path {
		path.strip_prefix(&self.base).unwrap_or(path)
	}
}

/// Rules compiled from a config, ready to run.
#[derive(Debug)]
pub struct Rules {
	pub header: HeaderRule,
	pub implementation: ImplementationRule,
}

impl Rules {
	pub fn from_config(config: &Config) -> Result<Self> {
		Ok(Rules {
			header: HeaderRule::from_config(&config.header)?,
			implementation: ImplementationRule::from_config(
				&config.implementation,
				&config.header.output,
			)?,
		})
	}

	/// Produce one artifact of the plan.
	pub fn generate(&self, artifact: &ArtifactPlan) -> Result<RewriteReport> {
		match artifact.role {
			Role::Header => assemble_headers(&self.header, &artifact.sources, &artifact.output),
			Role::Implementation => {
				rewrite_implementations(&self.implementation, &artifact.sources, &artifact.output)
			}
		}
	}
}
