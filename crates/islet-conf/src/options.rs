//! Validated plugin options.

use crate::compile::{CompileConfig, CompileConfigHook, CompileTarget};
use crate::error::{ConfigError, ConfigResult};
use crate::settings::PluginSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Template extensions treated as hydration-eligible by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

/// Default browser support matrix for the client build.
pub const DEFAULT_TARGETS: &str = "last 2 versions, safari >= 12";

/// Default base path for emitted bundle references.
pub const DEFAULT_ASSETS_PATH: &str = "/assets/";

/// Default site output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "_site";

/// Title and description of a page or of the whole site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
	/// Document title.
	pub title: Option<String>,
	/// Meta description.
	pub description: Option<String>,
}

/// Data available while rendering one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageData {
	/// Page-level metadata.
	#[serde(default)]
	pub page: PageMeta,
	/// Site-wide metadata, used when the page does not set a value.
	#[serde(default)]
	pub site: PageMeta,
	/// Any further data supplied by the build pipeline.
	#[serde(default)]
	pub extra: serde_json::Value,
}

impl PageData {
	/// Page title, falling back to the site title.
	pub fn title(&self) -> Option<&str> {
		self.page.title.as_deref().or(self.site.title.as_deref())
	}

	/// Page description, falling back to the site description.
	pub fn description(&self) -> Option<&str> {
		self.page
			.description
			.as_deref()
			.or(self.site.description.as_deref())
	}
}

/// Hook replacing the default page wrapper.
///
/// Receives the rendered body markup and the page data, returns the final
/// document.
#[derive(Clone)]
pub struct PostProcessHook(Arc<dyn Fn(&str, &PageData) -> String + Send + Sync>);

impl PostProcessHook {
	/// Wraps a closure as a post-process hook.
	pub fn new<F>(hook: F) -> Self
	where
		F: Fn(&str, &PageData) -> String + Send + Sync + 'static,
	{
		Self(Arc::new(hook))
	}

	/// Applies the hook.
	pub fn apply(&self, html: &str, data: &PageData) -> String {
		(self.0)(html, data)
	}
}

impl fmt::Debug for PostProcessHook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("PostProcessHook(..)")
	}
}

/// Normalizes a template extension: trims whitespace and strips a leading dot.
///
/// # Examples
///
/// ```rust
/// use islet_conf::normalize_extension;
///
/// assert_eq!(normalize_extension(" .jsx "), "jsx");
/// assert_eq!(normalize_extension("tsx"), "tsx");
/// ```
pub fn normalize_extension(ext: &str) -> String {
	let trimmed = ext.trim();
	trimmed.strip_prefix('.').unwrap_or(trimmed).to_string()
}

/// Strips leading `./`, `../` and `/` and trailing `/` from an assets path.
///
/// Dots that belong to a directory name are kept.
///
/// # Examples
///
/// ```rust
/// use islet_conf::normalize_assets_path;
///
/// assert_eq!(normalize_assets_path("/assets/"), "assets");
/// assert_eq!(normalize_assets_path("./static/js"), "static/js");
/// assert_eq!(normalize_assets_path("/.well-known/js/"), ".well-known/js");
/// assert_eq!(normalize_assets_path("/"), "");
/// ```
pub fn normalize_assets_path(assets_path: &str) -> &str {
	let mut path = assets_path.trim();
	loop {
		let stripped = path
			.strip_prefix("./")
			.or_else(|| path.strip_prefix("../"))
			.or_else(|| path.strip_prefix('/'));
		match stripped {
			Some(rest) => path = rest,
			None => break,
		}
	}
	path.trim_end_matches('/')
}

/// Complete, validated plugin configuration.
///
/// Constructed only through [`PluginOptions::builder`], so every instance has
/// passed validation.
#[derive(Debug, Clone)]
pub struct PluginOptions {
	extensions: Vec<String>,
	targets: String,
	assets_path: String,
	output_dir: PathBuf,
	post_process: Option<PostProcessHook>,
	compile_config_hook: Option<CompileConfigHook>,
}

impl PluginOptions {
	/// Starts building options from the defaults.
	pub fn builder() -> PluginOptionsBuilder {
		PluginOptionsBuilder::default()
	}

	/// Normalized template extensions, without leading dots.
	pub fn extensions(&self) -> &[String] {
		&self.extensions
	}

	/// Returns `true` if `path` has one of the configured extensions.
	pub fn handles(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
	}

	/// Browser support matrix for the client build.
	pub fn targets(&self) -> &str {
		&self.targets
	}

	/// Base path for emitted bundle references, as configured.
	pub fn assets_path(&self) -> &str {
		&self.assets_path
	}

	/// Site output directory.
	pub fn output_dir(&self) -> &Path {
		&self.output_dir
	}

	/// Directory the client bundle is written to: the assets path resolved
	/// against the output directory.
	pub fn assets_output_dir(&self) -> PathBuf {
		self.output_dir.join(normalize_assets_path(&self.assets_path))
	}

	/// Post-process hook, if configured.
	pub fn post_process(&self) -> Option<&PostProcessHook> {
		self.post_process.as_ref()
	}

	/// Compile configuration for the given build, with the user hook applied.
	pub fn compile_config(&self, target: CompileTarget) -> CompileConfig {
		CompileConfig::generate(target, &self.targets, self.compile_config_hook.as_ref())
	}
}

impl Default for PluginOptions {
	fn default() -> Self {
		Self {
			extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
			targets: DEFAULT_TARGETS.to_string(),
			assets_path: DEFAULT_ASSETS_PATH.to_string(),
			output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
			post_process: None,
			compile_config_hook: None,
		}
	}
}

/// Builder for [`PluginOptions`].
#[derive(Debug, Default)]
pub struct PluginOptionsBuilder {
	extensions: Option<Vec<String>>,
	targets: Option<String>,
	assets_path: Option<String>,
	output_dir: Option<PathBuf>,
	post_process: Option<PostProcessHook>,
	compile_config_hook: Option<CompileConfigHook>,
}

impl PluginOptionsBuilder {
	/// Applies every value present in a settings file.
	pub fn settings(mut self, settings: PluginSettings) -> Self {
		if let Some(extensions) = settings.extensions {
			self.extensions = Some(extensions);
		}
		if let Some(targets) = settings.targets {
			self.targets = Some(targets);
		}
		if let Some(assets_path) = settings.assets_path {
			self.assets_path = Some(assets_path);
		}
		if let Some(output_dir) = settings.output_dir {
			self.output_dir = Some(output_dir);
		}
		self
	}

	/// Sets the template extensions.
	pub fn extensions<I, S>(mut self, extensions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.extensions = Some(
			extensions
				.into_iter()
				.map(|e| e.as_ref().to_string())
				.collect(),
		);
		self
	}

	/// Sets the browser support matrix.
	pub fn targets(mut self, targets: impl Into<String>) -> Self {
		self.targets = Some(targets.into());
		self
	}

	/// Sets the base path for bundle references.
	pub fn assets_path(mut self, assets_path: impl Into<String>) -> Self {
		self.assets_path = Some(assets_path.into());
		self
	}

	/// Sets the site output directory.
	pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
		self.output_dir = Some(output_dir.into());
		self
	}

	/// Sets the post-process hook.
	pub fn post_process<F>(mut self, hook: F) -> Self
	where
		F: Fn(&str, &PageData) -> String + Send + Sync + 'static,
	{
		self.post_process = Some(PostProcessHook::new(hook));
		self
	}

	/// Sets the compile config hook.
	pub fn compile_config_hook<F>(mut self, hook: F) -> Self
	where
		F: Fn(CompileConfig) -> CompileConfig + Send + Sync + 'static,
	{
		self.compile_config_hook = Some(CompileConfigHook::new(hook));
		self
	}

	/// Validates and builds the options.
	///
	/// # Errors
	///
	/// - [`ConfigError::EmptyExtensions`] if no extension remains
	/// - [`ConfigError::InvalidOption`] for blank or duplicate extensions, a
	///   blank `targets` string, or an `assets_path` with `..` segments
	pub fn build(self) -> ConfigResult<PluginOptions> {
		let defaults = PluginOptions::default();

		let extensions = match self.extensions {
			Some(raw) => validate_extensions(raw)?,
			None => defaults.extensions,
		};

		let targets = self.targets.unwrap_or(defaults.targets);
		if targets.trim().is_empty() {
			tracing::warn!(option = "targets", "rejected plugin option");
			return Err(ConfigError::invalid("targets", "must not be empty"));
		}

		let assets_path = self.assets_path.unwrap_or(defaults.assets_path);
		if assets_path.split('/').any(|segment| segment == "..") {
			tracing::warn!(option = "assets_path", %assets_path, "rejected plugin option");
			return Err(ConfigError::invalid(
				"assets_path",
				format!("`{assets_path}` must not contain `..` segments"),
			));
		}

		Ok(PluginOptions {
			extensions,
			targets,
			assets_path,
			output_dir: self.output_dir.unwrap_or(defaults.output_dir),
			post_process: self.post_process,
			compile_config_hook: self.compile_config_hook,
		})
	}
}

fn validate_extensions(raw: Vec<String>) -> ConfigResult<Vec<String>> {
	if raw.is_empty() {
		tracing::warn!(option = "extensions", "rejected plugin option");
		return Err(ConfigError::EmptyExtensions);
	}

	let mut extensions: Vec<String> = Vec::with_capacity(raw.len());
	for ext in raw {
		let normalized = normalize_extension(&ext);
		if normalized.is_empty() {
			return Err(ConfigError::invalid(
				"extensions",
				format!("`{ext}` is not a file extension"),
			));
		}
		if extensions.contains(&normalized) {
			return Err(ConfigError::invalid(
				"extensions",
				format!("`{normalized}` is listed more than once"),
			));
		}
		extensions.push(normalized);
	}
	Ok(extensions)
}
