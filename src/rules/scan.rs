//! Lexical scan for the end of a C++ statement.
//!
//! This is not a parser. It only knows enough about string and character
//! literals and comments to find a `;` that actually terminates a statement.
//! Raw string literals and macro continuations are not recognized.

/// Scanner state carried from one line to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementScanner {
	in_block_comment: bool,
}

impl StatementScanner {
	/// Byte offset of the first statement terminator in `line`, if any.
	///
	/// String and character literals end with the line; block comments carry
	/// over to the next call.
	pub fn find_terminator(&mut self, bytes: &[u8]) -> Option<usize> {
		let mut i = 0;

		while i < bytes.len() {
			if self.in_block_comment {
				if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
					self.in_block_comment = false;
					i += 2;
				} else {
					i += 1;
				}
				continue;
			}

			match bytes[i] {
				b'/' if bytes.get(i + 1) == Some(&b'/') => return None,
				b'/' if bytes.get(i + 1) == Some(&b'*') => {
					self.in_block_comment = true;
					i += 2;
				}
				quote @ (b'"' | b'\'') => i = skip_literal(bytes, i + 1, quote),
				b';' => return Some(i),
				_ => i += 1,
			}
		}

		None
	}
}

/// Skip past a literal opened just before `start`, honouring backslash escapes.
fn skip_literal(bytes: &[u8], start: usize, quote: u8) -> usize {
	let mut i = start;
	while i < bytes.len() {
		match bytes[i] {
			b'\\' => i += 2,
			b if b == quote => return i + 1,
			_ => i += 1,
		}
	}
	bytes.len()
}

/// Byte offset just past the argument list that opens at or after `start`.
///
/// Returns `None` when the first non-blank character is not `(` or the list
/// does not close on this line.
pub fn call_end(bytes: &[u8], start: usize) -> Option<usize> {
	let mut i = start;
	while i < bytes.len() && bytes[i].is_ascii_whitespace() {
		i += 1;
	}
	if bytes.get(i) != Some(&b'(') {
		return None;
	}

	let mut depth = 0usize;
	while i < bytes.len() {
		match bytes[i] {
			b'(' => {
				depth += 1;
				i += 1;
			}
			b')' => {
				depth -= 1;
				i += 1;
				if depth == 0 {
					return Some(i);
				}
			}
			quote @ (b'"' | b'\'') => i = skip_literal(bytes, i + 1, quote),
			_ => i += 1,
		}
	}

	None
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_plain_terminator() {
		let mut scanner = StatementScanner::default();
		assert_eq!(scanner.find_terminator(b"  << \"x\";\n"), Some(8));
	}

	#[test]
	fn test_no_terminator() {
		let mut scanner = StatementScanner::default();
		assert_eq!(scanner.find_terminator(b"  << \"bad file\"\n"), None);
	}

	#[test]
	fn test_semicolon_in_string_ignored() {
		let mut scanner = StatementScanner::default();
		assert_eq!(scanner.find_terminator(b"  << \"a;b\" << \"\\\";\"\n"), None);
		assert_eq!(scanner.find_terminator(b"  << ';'\n"), None);
		assert!(scanner.find_terminator(b"  << \"a;b\";\n").is_some());
	}

	#[test]
	fn test_line_comment_ignored() {
		let mut scanner = StatementScanner::default();
		assert_eq!(scanner.find_terminator(b"  << x  // done;\n"), None);
	}

	#[test]
	fn test_block_comment_spans_lines() {
		let mut scanner = StatementScanner::default();
		assert_eq!(scanner.find_terminator(b"  << x /* still;\n"), None);
		assert_eq!(scanner.find_terminator(b"  going; */ << y\n"), None);
		assert_eq!(scanner.find_terminator(b"  ;\n"), Some(2));
	}

	#[test]
	fn test_call_end() {
		let line = b"throw cms::Exception(\"Calibration\") << \"bad\";";
		let start = "throw cms::Exception".len();
		assert_eq!(call_end(line, start), Some(start + "(\"Calibration\")".len()));
	}

	#[test]
	fn test_call_end_with_paren_in_string() {
		let line = b"X(\")\", f(1)) tail";
		assert_eq!(call_end(line, 1), Some(12));
	}

	#[test]
	fn test_call_end_unclosed_or_missing() {
		assert_eq!(call_end(b"X(\"Calibration\",\n", 1), None);
		assert_eq!(call_end(b"X << 1;", 1), None);
	}
}
