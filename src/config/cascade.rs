use crate::config::parser::parse_config_file;
use crate::config::types::{Config, LoadedConfig};
use crate::error::{Result, StandaloneError};
use std::path::{Path, PathBuf};

/// File name looked up in each directory of the cascade.
pub const CONFIG_FILE_NAME: &str = ".standalone.toml";

/// Discover the config file that applies to `start_dir`.
///
/// The lookup order is:
/// 1. Start from `start_dir` and look for `.standalone.toml`
/// 2. Continue up the directory tree, nearest file wins
/// 3. Finally, check ~/.standalone.toml
///
/// Returns `None` when no file exists anywhere in the cascade.
pub fn discover_config(start_dir: &Path) -> Result<Option<PathBuf>> {
	let mut current_dir = start_dir.to_path_buf();

	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);
		if config_path.is_file() {
			return Ok(Some(config_path));
		}

		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	let user_path = user_config_path()?;
	if user_path.is_file() {
		Ok(Some(user_path))
	} else {
		Ok(None)
	}
}

/// Load the effective config.
///
/// An explicit path always wins and must exist. Otherwise the cascade from
/// `start_dir` is searched, falling back to built-in defaults.
pub fn load_config(explicit: Option<&Path>, start_dir: &Path) -> Result<LoadedConfig> {
	let path = match explicit {
		Some(path) => Some(path.to_path_buf()),
		None => discover_config(start_dir)?,
	};

	match path {
		Some(path) => {
			tracing::debug!(path = %path.display(), "loading config");
			let config = parse_config_file(&path)?;
			Ok(LoadedConfig {
				config,
				path: Some(path),
			})
		}
		None => {
			tracing::debug!("no config file found, using defaults");
			Ok(LoadedConfig {
				config: Config::default(),
				path: None,
			})
		}
	}
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(StandaloneError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}
