use crate::error::{Result, StandaloneError};
use regex::bytes::Regex;

/// Opening of a quoted include directive.
const QUOTED_INCLUDE: &[u8] = b"#include \"";

/// Byte offset of the first occurrence of `needle` in `haystack`.
///
/// Lines are matched as raw bytes so sources in any ASCII-compatible
/// encoding pass through unchanged.
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	if needle.is_empty() {
		return Some(0);
	}
	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}

/// Line filter deciding which source lines never reach an artifact.
#[derive(Debug, Default)]
pub struct DropFilter {
	/// Quoted include targets to drop, matched as path prefixes.
	pub include_prefixes: Vec<String>,

	/// Tokens that drop any line containing them.
	pub markers: Vec<String>,

	/// Compiled extra patterns.
	pub patterns: Vec<Regex>,
}

impl DropFilter {
	/// Build a filter, compiling every extra pattern.
	pub fn new(include_prefixes: &[String], markers: &[String], patterns: &[String]) -> Result<Self> {
		let patterns = patterns
			.iter()
			.map(|p| compile_regex(p))
			.collect::<Result<Vec<_>>>()?;

		Ok(DropFilter {
			include_prefixes: include_prefixes.to_vec(),
			markers: markers.to_vec(),
			patterns,
		})
	}

	/// Check whether the line is a quoted include of one of the internal prefixes.
	///
	/// Only a directive at column zero counts, so indented or commented-out
	/// includes are kept.
	pub fn is_internal_include(&self, line: &[u8]) -> bool {
		match line.strip_prefix(QUOTED_INCLUDE) {
			Some(target) => self
				.include_prefixes
				.iter()
				.any(|prefix| target.starts_with(prefix.as_bytes())),
			None => false,
		}
	}

	/// Check if this filter drops the given line.
	pub fn matches(&self, line: &[u8]) -> bool {
		if self.is_internal_include(line) {
			return true;
		}

		if self
			.markers
			.iter()
			.any(|marker| find_bytes(line, marker.as_bytes()).is_some())
		{
			return true;
		}

		self.patterns.iter().any(|regex| regex.is_match(line))
	}
}

/// Compile a regex pattern string.
pub fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| StandaloneError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}
