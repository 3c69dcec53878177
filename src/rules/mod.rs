//! Line filtering and rewriting for standalone-gen.
//!
//! This module handles:
//! - Dropping framework-internal includes and serialization markers
//! - Rewriting framework exception throws into standalone error reports
//! - Locating the end of a rewritten throw statement

pub mod matcher;
pub mod rewriter;
pub mod scan;

pub use matcher::{DropFilter, compile_regex};
pub use rewriter::{
	HeaderRule, ImplementationRule, LineOutcome, LineOutput, LineRule, RewriteState,
	split_terminator,
};
pub use scan::StatementScanner;
