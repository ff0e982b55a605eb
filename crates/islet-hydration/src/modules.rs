//! Compiled template module cache.
//!
//! Template sources are compiled once per build pass. Long-lived processes
//! (watch mode) must see edits made between passes, so the coordinator drops
//! every cached module when a pass resets.

use crate::error::{HydrationError, Result};
use islet_conf::{CompileConfig, PluginOptions};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Compiles template source text.
pub trait SourceTransform: Send + Sync {
	/// Compiles `source`, read from `path`, with `config`.
	///
	/// Failures are reported as a message; the cache attaches the path.
	fn transform(
		&self,
		path: &Path,
		source: &str,
		config: &CompileConfig,
	) -> std::result::Result<String, String>;
}

/// A compiled template module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
	/// Source path.
	pub path: PathBuf,
	/// Compiled output; the source text when the file is not transformed.
	pub code: String,
}

/// Pass-scoped cache of compiled template modules.
pub struct ModuleCache {
	transform: Arc<dyn SourceTransform>,
	config: CompileConfig,
	extensions: Vec<String>,
	modules: RwLock<HashMap<PathBuf, Arc<CompiledModule>>>,
}

impl ModuleCache {
	/// Creates a cache compiling with the server configuration of `options`.
	pub fn new(transform: Arc<dyn SourceTransform>, options: &PluginOptions) -> Self {
		Self {
			transform,
			config: options.compile_config(islet_conf::CompileTarget::Server),
			extensions: options.extensions().to_vec(),
			modules: RwLock::new(HashMap::new()),
		}
	}

	/// Returns the compiled module for `path`, compiling it on first use.
	///
	/// Files whose extension is not configured are cached verbatim.
	///
	/// # Errors
	///
	/// - [`HydrationError::Io`] if the file cannot be read
	/// - [`HydrationError::ModuleTransform`] if compilation fails
	pub async fn load(&self, path: impl AsRef<Path>) -> Result<Arc<CompiledModule>> {
		let path = path.as_ref();
		if let Some(module) = self.modules.read().get(path) {
			return Ok(Arc::clone(module));
		}

		let source = tokio::fs::read_to_string(path)
			.await
			.map_err(|source| HydrationError::io(path, source))?;

		let code = if self.handles(path) {
			self.transform
				.transform(path, &source, &self.config)
				.map_err(|message| HydrationError::ModuleTransform {
					path: path.to_path_buf(),
					message,
				})?
		} else {
			source
		};

		tracing::debug!(path = %path.display(), "compiled template module");

		let module = Arc::new(CompiledModule {
			path: path.to_path_buf(),
			code,
		});
		let mut modules = self.modules.write();
		let cached = modules
			.entry(path.to_path_buf())
			.or_insert_with(|| Arc::clone(&module));
		Ok(Arc::clone(cached))
	}

	/// Returns `true` if `path` is cached.
	pub fn is_loaded(&self, path: impl AsRef<Path>) -> bool {
		self.modules.read().contains_key(path.as_ref())
	}

	/// Number of cached modules.
	pub fn len(&self) -> usize {
		self.modules.read().len()
	}

	/// Returns `true` if nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.modules.read().is_empty()
	}

	/// Drops every cached module; the next `load` recompiles from disk.
	pub fn invalidate(&self) {
		let mut modules = self.modules.write();
		let dropped = modules.len();
		modules.clear();
		if dropped > 0 {
			tracing::debug!(dropped, "invalidated template modules");
		}
	}

	fn handles(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
	}
}

impl std::fmt::Debug for ModuleCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ModuleCache")
			.field("config", &self.config)
			.field("extensions", &self.extensions)
			.field("len", &self.len())
			.finish_non_exhaustive()
	}
}
