//! Standalone-gen - extract framework sources into standalone artifacts.
//!
//! This library provides the core functionality for standalone-gen, including:
//! - Configuration file parsing and cascade discovery
//! - Line filtering and throw-statement rewriting
//! - Sequential, per-file artifact assembly
//! - Path planning for a full generation run
//!
//! # Example
//!
//! ```no_run
//! use standalone_gen::config::load_config;
//! use standalone_gen::pipeline::{Plan, Rules, resolve_base_dir};
//!
//! let cwd = std::env::current_dir().unwrap();
//! let loaded = load_config(None, &cwd).unwrap();
//! let base = resolve_base_dir(None, &loaded.config).unwrap();
//!
//! let plan = Plan::new(&loaded.config, &base, None);
//! let rules = Rules::from_config(&loaded.config).unwrap();
//!
//! for artifact in plan.artifacts() {
//!     let report = rules.generate(artifact).unwrap();
//!     println!("{}: {} lines", artifact.output.display(), report.lines_read);
//! }
//! ```

pub mod assemble;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod rules;

pub use error::{Result, StandaloneError};
