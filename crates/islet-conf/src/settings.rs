//! Settings file support.
//!
//! The serializable subset of [`PluginOptions`](crate::PluginOptions) can be
//! kept in a TOML file next to the site sources:
//!
//! ```toml
//! extensions = ["jsx", "tsx"]
//! targets = "defaults"
//! assets_path = "/static/islands/"
//! output_dir = "public"
//! ```

use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Conventional settings file name.
pub const SETTINGS_FILE_NAME: &str = "islet.toml";

/// Plugin settings as stored on disk. Absent keys keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginSettings {
	/// Template extensions.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extensions: Option<Vec<String>>,
	/// Browser support matrix for the client build.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub targets: Option<String>,
	/// Base path for emitted bundle references.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub assets_path: Option<String>,
	/// Site output directory.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub output_dir: Option<PathBuf>,
}

impl PluginSettings {
	/// Parses settings from TOML text.
	pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
		Ok(toml::from_str(source)?)
	}

	/// Reads and parses a settings file.
	pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path)?;
		tracing::debug!(path = %path.display(), "loaded plugin settings");
		Self::from_toml_str(&source)
	}

	/// Reads `islet.toml` from `dir` if it exists, otherwise returns the
	/// empty settings.
	pub fn discover(dir: impl AsRef<Path>) -> ConfigResult<Self> {
		let path = dir.as_ref().join(SETTINGS_FILE_NAME);
		if path.is_file() {
			Self::from_file(path)
		} else {
			Ok(Self::default())
		}
	}
}
