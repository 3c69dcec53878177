//! Artifact assembly for standalone-gen.
//!
//! This module handles:
//! - Reading source files one at a time, in caller order
//! - Threading per-file rule state through every line
//! - Writing the concatenated artifact with blank-line separators

use crate::error::{Result, StandaloneError};
use crate::rules::{HeaderRule, ImplementationRule, LineOutcome, LineRule};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Written after each file's contribution.
pub const FILE_SEPARATOR: &str = "\n\n";

/// Role a source file plays in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
	Header,
	Implementation,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Header => "header",
			Role::Implementation => "implementation",
		}
	}
}

/// Counters collected while assembling one artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
	pub files: usize,
	pub lines_read: usize,
	pub lines_dropped: usize,
	pub triggers: usize,
	pub terminators: usize,
}

impl RewriteReport {
	fn record(&mut self, outcome: LineOutcome) {
		self.lines_read += 1;
		match outcome {
			LineOutcome::Kept => {}
			LineOutcome::Dropped => self.lines_dropped += 1,
			LineOutcome::Triggered => self.triggers += 1,
			LineOutcome::Terminated => self.terminators += 1,
			LineOutcome::TriggeredAndTerminated => {
				self.triggers += 1;
				self.terminators += 1;
			}
		}
	}

	/// Triggers that never received a raise statement.
	pub fn unterminated(&self) -> usize {
		self.triggers.saturating_sub(self.terminators)
	}
}

/// Assemble `sources` into `out` using `rule`.
///
/// `artifact` names the destination in write errors. Each source is opened,
/// read to the end, and closed before the next one is opened; rule state is
/// reset at the start of every file.
pub fn assemble<R, W>(
	rule: &R,
	sources: &[PathBuf],
	out: &mut W,
	artifact: &Path,
) -> Result<RewriteReport>
where
	R: LineRule,
	W: Write,
{
	let write_err = |source| StandaloneError::WriteArtifact {
		path: artifact.to_path_buf(),
		source,
	};

	let mut report = RewriteReport::default();
	out.write_all(rule.preamble().as_bytes()).map_err(write_err)?;

	for path in sources {
		let before = report;
		process_source(rule, path, out, artifact, &mut report)?;
		out.write_all(FILE_SEPARATOR.as_bytes()).map_err(write_err)?;
		report.files += 1;

		tracing::debug!(
			source = %path.display(),
			lines = report.lines_read - before.lines_read,
			dropped = report.lines_dropped - before.lines_dropped,
			triggers = report.triggers - before.triggers,
			"processed source"
		);
		if report.unterminated() > before.unterminated() {
			tracing::warn!(
				source = %path.display(),
				"throw rewrite never received its raise statement"
			);
		}
	}

	Ok(report)
}

fn process_source<R, W>(
	rule: &R,
	path: &Path,
	out: &mut W,
	artifact: &Path,
	report: &mut RewriteReport,
) -> Result<()>
where
	R: LineRule,
	W: Write,
{
	let read_err = |source| StandaloneError::ReadSource {
		path: path.to_path_buf(),
		source,
	};

	let file = File::open(path).map_err(read_err)?;
	let mut reader = BufReader::new(file);
	let mut line = Vec::new();
	let mut state = R::State::default();
	let mut index = 0;

	// Raw bytes: sources are not required to be valid UTF-8.
	loop {
		line.clear();
		if reader.read_until(b'\n', &mut line).map_err(read_err)? == 0 {
			break;
		}

		let (output, next) = rule.apply(&line, index, state);
		report.record(output.outcome);
		out.write_all(&output.text)
			.map_err(|source| StandaloneError::WriteArtifact {
				path: artifact.to_path_buf(),
				source,
			})?;

		state = next;
		index += 1;
	}

	Ok(())
}

/// Create `output` and assemble `sources` into it.
///
/// A failure part way through leaves the partially written file in place.
pub fn write_artifact<R: LineRule>(
	rule: &R,
	sources: &[PathBuf],
	output: &Path,
) -> Result<RewriteReport> {
	let write_err = |source| StandaloneError::WriteArtifact {
		path: output.to_path_buf(),
		source,
	};

	let file = File::create(output).map_err(write_err)?;
	let mut writer = BufWriter::new(file);
	let report = assemble(rule, sources, &mut writer, output)?;
	writer.flush().map_err(write_err)?;

	tracing::info!(
		artifact = %output.display(),
		files = report.files,
		lines = report.lines_read,
		"wrote artifact"
	);

	Ok(report)
}

/// Concatenate header files into one filtered header artifact.
pub fn assemble_headers(
	rule: &HeaderRule,
	sources: &[PathBuf],
	output: &Path,
) -> Result<RewriteReport> {
	write_artifact(rule, sources, output)
}

/// Concatenate implementation files into one rewritten artifact.
pub fn rewrite_implementations(
	rule: &ImplementationRule,
	sources: &[PathBuf],
	output: &Path,
) -> Result<RewriteReport> {
	write_artifact(rule, sources, output)
}
