use crate::config::types::{HeaderConfig, ImplementationConfig, TerminatorMode};
use crate::error::Result;
use crate::rules::matcher::{DropFilter, find_bytes};
use crate::rules::scan::{StatementScanner, call_end};
use std::borrow::Cow;

/// What a rule did with one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
	/// Copied unchanged.
	Kept,
	/// Not emitted.
	Dropped,
	/// Replaced by the diagnostic header.
	Triggered,
	/// Emitted with the raise statement appended.
	Terminated,
	/// Replaced by the diagnostic header with the raise appended directly.
	TriggeredAndTerminated,
}

/// Bytes a rule emits for one input line, terminators included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutput<'a> {
	pub outcome: LineOutcome,
	pub text: Cow<'a, [u8]>,
}

impl<'a> LineOutput<'a> {
	fn kept(line: &'a [u8]) -> Self {
		LineOutput {
			outcome: LineOutcome::Kept,
			text: Cow::Borrowed(line),
		}
	}

	fn dropped() -> Self {
		LineOutput {
			outcome: LineOutcome::Dropped,
			text: Cow::Borrowed(&[]),
		}
	}

	fn owned(outcome: LineOutcome, parts: &[&[u8]]) -> Self {
		LineOutput {
			outcome,
			text: Cow::Owned(parts.concat()),
		}
	}
}

/// A per-line transformation with explicit state.
///
/// `apply` is a pure function of the raw line bytes, the line's index within
/// the file, and the state returned for the previous line. The driver starts
/// every file from `State::default()`.
pub trait LineRule {
	type State: Default;

	/// Text written once before the first file.
	fn preamble(&self) -> String {
		String::new()
	}

	fn apply<'a>(
		&self,
		line: &'a [u8],
		index: usize,
		state: Self::State,
	) -> (LineOutput<'a>, Self::State);
}

/// Split a line into its body and its terminator (`\n`, `\r\n`, or empty).
pub fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
	if let Some(body) = line.strip_suffix(b"\r\n") {
		(body, &b"\r\n"[..])
	} else if let Some(body) = line.strip_suffix(b"\n") {
		(body, &b"\n"[..])
	} else {
		(line, &[][..])
	}
}

/// Stateless header filter.
#[derive(Debug)]
pub struct HeaderRule {
	pub filter: DropFilter,
}

impl HeaderRule {
	pub fn from_config(config: &HeaderConfig) -> Result<Self> {
		let filter = DropFilter::new(
			&config.drop_include_prefixes,
			&config.drop_markers,
			&config.drop_patterns,
		)?;
		Ok(HeaderRule { filter })
	}
}

impl LineRule for HeaderRule {
	type State = ();

	fn apply<'a>(&self, line: &'a [u8], _index: usize, _state: ()) -> (LineOutput<'a>, ()) {
		if self.filter.matches(line) {
			(LineOutput::dropped(), ())
		} else {
			(LineOutput::kept(line), ())
		}
	}
}

/// Rewrite state for one implementation file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteState {
	/// Index of the most recent throw trigger still waiting for its raise.
	pub pending_rewrite_line: Option<usize>,

	scanner: StatementScanner,

	/// The diagnostic opened a `{` block that the raise must close.
	braced: bool,
}

impl RewriteState {
	fn idle() -> Self {
		RewriteState::default()
	}

	fn pending(index: usize, scanner: StatementScanner, braced: bool) -> Self {
		RewriteState {
			pending_rewrite_line: Some(index),
			scanner,
			braced,
		}
	}
}

/// Include filter plus the throw-to-diagnostic rewrite.
#[derive(Debug)]
pub struct ImplementationRule {
	pub filter: DropFilter,
	pub header_artifact: String,
	pub system_includes: Vec<String>,
	pub throw_pattern: String,
	pub diagnostic: String,
	pub raise: String,
	pub terminator: TerminatorMode,
	pub terminator_offset: usize,
}

impl ImplementationRule {
	/// Build the rule; `header_artifact` is the file name the preamble includes.
	pub fn from_config(config: &ImplementationConfig, header_artifact: &str) -> Result<Self> {
		let filter = DropFilter::new(&config.drop_include_prefixes, &[], &config.drop_patterns)?;
		Ok(ImplementationRule {
			filter,
			header_artifact: header_artifact.to_string(),
			system_includes: config.system_includes.clone(),
			throw_pattern: config.throw_pattern.clone(),
			diagnostic: config.diagnostic.clone(),
			raise: config.raise.clone(),
			terminator: config.terminator,
			terminator_offset: config.terminator_offset,
		})
	}

	fn trigger<'a>(&self, line: &'a [u8], at: usize, index: usize) -> (LineOutput<'a>, RewriteState) {
		let diagnostic = self.diagnostic.as_bytes();

		if self.terminator == TerminatorMode::LineOffset {
			return (
				LineOutput::owned(LineOutcome::Triggered, &[diagnostic, b"\n"]),
				RewriteState::pending(index, StatementScanner::default(), false),
			);
		}

		// Keep whatever follows the exception construction so a one-line
		// throw still streams its message into the diagnostic. Code before
		// the throw (an `if` guard) stays, with the replacement in a block.
		let (body, _) = split_terminator(line);
		let at = at.min(body.len());
		let prefix = &body[..at];
		let tail: &[u8] = match call_end(body, at + self.throw_pattern.len()) {
			Some(end) => &body[end..],
			None => &[],
		};

		let braced = !prefix.iter().all(u8::is_ascii_whitespace);
		let lead: &[u8] = if braced { prefix } else { &[] };
		let open: &[u8] = if braced { b"{ " } else { &[] };

		let mut scanner = StatementScanner::default();
		if scanner.find_terminator(tail).is_some() {
			let close: &[u8] = if braced { b" }" } else { &[] };
			return (
				LineOutput::owned(
					LineOutcome::TriggeredAndTerminated,
					&[
						lead,
						open,
						diagnostic,
						tail,
						b"\n",
						self.raise.as_bytes(),
						close,
						b"\n",
					],
				),
				RewriteState::idle(),
			);
		}

		(
			LineOutput::owned(LineOutcome::Triggered, &[lead, open, diagnostic, tail, b"\n"]),
			RewriteState::pending(index, scanner, braced),
		)
	}

	fn terminate<'a>(&self, line: &'a [u8], braced: bool) -> LineOutput<'a> {
		let (_, term) = split_terminator(line);
		let gap: &[u8] = if term.is_empty() { b"\n" } else { &[] };
		let close: &[u8] = if braced { b" }" } else { &[] };
		LineOutput::owned(
			LineOutcome::Terminated,
			&[line, gap, self.raise.as_bytes(), close, b"\n"],
		)
	}
}

impl LineRule for ImplementationRule {
	type State = RewriteState;

	fn preamble(&self) -> String {
		let mut preamble = format!("#include \"{}\"\n", self.header_artifact);
		for include in &self.system_includes {
			preamble.push_str(&format!("#include {}\n", include));
		}
		preamble
	}

	fn apply<'a>(
		&self,
		line: &'a [u8],
		index: usize,
		state: RewriteState,
	) -> (LineOutput<'a>, RewriteState) {
		if self.filter.matches(line) {
			return (LineOutput::dropped(), state);
		}

		if let Some(at) = find_bytes(line, self.throw_pattern.as_bytes()) {
			return self.trigger(line, at, index);
		}

		let Some(trigger_line) = state.pending_rewrite_line else {
			return (LineOutput::kept(line), state);
		};

		match self.terminator {
			TerminatorMode::LineOffset => {
				if index == trigger_line + self.terminator_offset {
					(self.terminate(line, false), RewriteState::idle())
				} else {
					(LineOutput::kept(line), state)
				}
			}
			TerminatorMode::StatementEnd => {
				let mut scanner = state.scanner;
				if scanner.find_terminator(line).is_some() {
					(self.terminate(line, state.braced), RewriteState::idle())
				} else {
					(
						LineOutput::kept(line),
						RewriteState::pending(trigger_line, scanner, state.braced),
					)
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DIAG: &str = "std::cerr << \"ERROR in BTagCalibration: \"";

	fn implementation_rule(terminator: TerminatorMode) -> ImplementationRule {
		let config = ImplementationConfig {
			terminator,
			..Default::default()
		};
		ImplementationRule::from_config(&config, "BTagCalibrationStandalone.h").unwrap()
	}

	/// Run a rule over lines from a fresh state, concatenating the output.
	fn run<R: LineRule>(rule: &R, lines: &[&str]) -> String {
		let mut state = R::State::default();
		let mut out = Vec::new();
		for (index, line) in lines.iter().enumerate() {
			let (output, next) = rule.apply(line.as_bytes(), index, state);
			out.extend_from_slice(&output.text);
			state = next;
		}
		String::from_utf8(out).unwrap()
	}

	fn text(output: &LineOutput) -> String {
		String::from_utf8(output.text.to_vec()).unwrap()
	}

	#[test]
	fn test_split_terminator() {
		assert_eq!(split_terminator(b"a\n"), (&b"a"[..], &b"\n"[..]));
		assert_eq!(split_terminator(b"a\r\n"), (&b"a"[..], &b"\r\n"[..]));
		assert_eq!(split_terminator(b"a"), (&b"a"[..], &b""[..]));
		assert_eq!(split_terminator(b""), (&b""[..], &b""[..]));
	}

	#[test]
	fn test_header_rule_drops_and_keeps() {
		let rule = HeaderRule::from_config(&HeaderConfig::default()).unwrap();
		let lines = [
			"#ifndef BTagEntry_H\n",
			"#include \"CondFormats/Serialization/interface/Serializable.h\"\n",
			"#include <string>\n",
			"  COND_SERIALIZABLE;\n",
			"};\n",
		];
		assert_eq!(
			run(&rule, &lines),
			"#ifndef BTagEntry_H\n#include <string>\n};\n"
		);
	}

	#[test]
	fn test_header_rule_keeps_non_utf8_bytes() {
		let rule = HeaderRule::from_config(&HeaderConfig::default()).unwrap();
		let line: &[u8] = b"// Author: Rapsevi\xe8ius\n";
		let (output, ()) = rule.apply(line, 0, ());
		assert_eq!(output.outcome, LineOutcome::Kept);
		assert_eq!(&*output.text, line);
	}

	#[test]
	fn test_preamble() {
		let rule = implementation_rule(TerminatorMode::LineOffset);
		assert_eq!(
			rule.preamble(),
			"#include \"BTagCalibrationStandalone.h\"\n#include <iostream>\n#include <exception>\n"
		);
	}

	#[test]
	fn test_framework_includes_dropped() {
		let rule = implementation_rule(TerminatorMode::LineOffset);
		let lines = [
			"#include \"CondFormats/BTagObjects/interface/BTagEntry.h\"\n",
			"#include \"FWCore/Utilities/interface/Exception.h\"\n",
			"#include <fstream>\n",
		];
		assert_eq!(run(&rule, &lines), "#include <fstream>\n");
	}

	#[test]
	fn test_throw_rewritten_with_raise_two_lines_later() {
		let rule = implementation_rule(TerminatorMode::LineOffset);
		let lines = [
			"if (!ok) {\n",
			"  throw cms::Exception(\"BTagCalibration\")\n",
			"        << \"Invalid csv line; \"\n",
			"        << line;\n",
			"}\n",
		];
		let expected = format!(
			"if (!ok) {{\n{DIAG}\n        << \"Invalid csv line; \"\n        << line;\nthrow std::exception();\n}}\n"
		);
		assert_eq!(run(&rule, &lines), expected);
	}

	#[test]
	fn test_trigger_sets_pending_line() {
		let rule = implementation_rule(TerminatorMode::LineOffset);
		let (output, state) = rule.apply(
			b"throw cms::Exception(\"Calibration\") << \"bad file\";\n",
			5,
			RewriteState::default(),
		);
		assert_eq!(output.outcome, LineOutcome::Triggered);
		assert_eq!(text(&output), format!("{DIAG}\n"));
		assert_eq!(state.pending_rewrite_line, Some(5));

		let (output, state) = rule.apply(b"a();\n", 6, state);
		assert_eq!(output.outcome, LineOutcome::Kept);
		let (output, state) = rule.apply(b"b();\n", 7, state);
		assert_eq!(output.outcome, LineOutcome::Terminated);
		assert_eq!(text(&output), "b();\nthrow std::exception();\n");
		assert_eq!(state.pending_rewrite_line, None);
	}

	#[test]
	fn test_dropped_line_does_not_touch_state() {
		let rule = implementation_rule(TerminatorMode::LineOffset);
		let state = RewriteState::pending(3, StatementScanner::default(), false);
		let (output, next) = rule.apply(b"#include \"FWCore/x.h\"\n", 5, state);
		assert_eq!(output.outcome, LineOutcome::Dropped);
		assert_eq!(next, state);
	}

	#[test]
	fn test_second_trigger_restarts_countdown() {
		let rule = implementation_rule(TerminatorMode::LineOffset);
		let lines = [
			"throw cms::Exception(\"A\")\n",
			"throw cms::Exception(\"B\")\n",
			"  << x\n",
			"  << y;\n",
		];
		let expected = format!("{DIAG}\n{DIAG}\n  << x\n  << y;\nthrow std::exception();\n");
		assert_eq!(run(&rule, &lines), expected);
	}

	#[test]
	fn test_unterminated_last_line_gets_newline_before_raise() {
		let rule = implementation_rule(TerminatorMode::LineOffset);
		let lines = ["throw cms::Exception(\"A\")\n", "  << x\n", "  << y;"];
		let expected = format!("{DIAG}\n  << x\n  << y;\nthrow std::exception();\n");
		assert_eq!(run(&rule, &lines), expected);
	}

	#[test]
	fn test_inserted_lines_end_with_newline_in_crlf_source() {
		let rule = implementation_rule(TerminatorMode::LineOffset);
		let lines = ["throw cms::Exception(\"A\")\r\n", "  << x\r\n", "  << y;\r\n"];
		let expected = format!("{DIAG}\n  << x\r\n  << y;\r\nthrow std::exception();\n");
		assert_eq!(run(&rule, &lines), expected);
	}

	#[test]
	fn test_non_utf8_line_at_offset_gets_raise() {
		let rule = implementation_rule(TerminatorMode::LineOffset);
		let (_, state) = rule.apply(b"throw cms::Exception(\"A\")\n", 0, RewriteState::default());
		let (_, state) = rule.apply(b"  << \"Rapsevi\xe8ius\"\n", 1, state);
		let (output, _) = rule.apply(b"  << x;\n", 2, state);
		assert_eq!(&*output.text, &b"  << x;\nthrow std::exception();\n"[..]);
	}

	#[test]
	fn test_statement_end_single_line_throw() {
		let rule = implementation_rule(TerminatorMode::StatementEnd);
		let lines = [
			"  throw cms::Exception(\"Calibration\") << \"bad file\";\n",
			"  next();\n",
		];
		let expected = format!("{DIAG} << \"bad file\";\nthrow std::exception();\n  next();\n");
		assert_eq!(run(&rule, &lines), expected);
	}

	#[test]
	fn test_statement_end_keeps_guard_on_single_line_throw() {
		let rule = implementation_rule(TerminatorMode::StatementEnd);
		let lines = [
			"  if (bad) throw cms::Exception(\"A\") << \"b\";\n",
			"  ok();\n",
		];
		let expected =
			format!("  if (bad) {{ {DIAG} << \"b\";\nthrow std::exception(); }}\n  ok();\n");
		assert_eq!(run(&rule, &lines), expected);
	}

	#[test]
	fn test_statement_end_keeps_guard_on_multi_line_throw() {
		let rule = implementation_rule(TerminatorMode::StatementEnd);
		let lines = [
			"  if (bad) throw cms::Exception(\"A\")\n",
			"    << \"b\";\n",
			"  ok();\n",
		];
		let expected =
			format!("  if (bad) {{ {DIAG}\n    << \"b\";\nthrow std::exception(); }}\n  ok();\n");
		assert_eq!(run(&rule, &lines), expected);
	}

	#[test]
	fn test_statement_end_multi_line_throw() {
		let rule = implementation_rule(TerminatorMode::StatementEnd);
		let lines = [
			"throw cms::Exception(\"BTagCalibration\")\n",
			"  << \"a;\"\n",
			"  << \"b\"\n",
			"  << c;\n",
			"next();\n",
		];
		let expected = format!(
			"{DIAG}\n  << \"a;\"\n  << \"b\"\n  << c;\nthrow std::exception();\nnext();\n"
		);
		assert_eq!(run(&rule, &lines), expected);
	}

	#[test]
	fn test_statement_end_tail_without_terminator_waits() {
		let rule = implementation_rule(TerminatorMode::StatementEnd);
		let (output, state) = rule.apply(
			b"throw cms::Exception(\"X\") << \"bad\"\n",
			0,
			RewriteState::default(),
		);
		assert_eq!(output.outcome, LineOutcome::Triggered);
		assert_eq!(text(&output), format!("{DIAG} << \"bad\"\n"));
		assert_eq!(state.pending_rewrite_line, Some(0));
	}
}
