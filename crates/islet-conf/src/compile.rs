//! Source compilation configuration.
//!
//! Template sources are compiled twice: once for server-side rendering inside
//! the host runtime, and once for the client bundle. [`CompileConfig::generate`]
//! produces the configuration for either build and applies the user hook last.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Support target used for server-side compilation.
pub const SERVER_TARGETS: &str = "node current";

/// Which build a [`CompileConfig`] is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileTarget {
	/// Server-side rendering inside the host process.
	Server,
	/// Client bundle loaded by the browser.
	Client,
}

impl CompileTarget {
	/// Returns `true` for the client bundle build.
	pub fn is_client(self) -> bool {
		matches!(self, Self::Client)
	}
}

impl fmt::Display for CompileTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Server => write!(f, "server"),
			Self::Client => write!(f, "client"),
		}
	}
}

/// Module system emitted by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
	/// `require`/`module.exports`, loadable by the host runtime.
	CommonJs,
	/// `import`/`export`, left for the client bundler to resolve.
	EsModule,
}

/// Compiler settings for one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileConfig {
	/// Build this configuration belongs to.
	pub target: CompileTarget,
	/// Module system of the compiled output.
	pub module_format: ModuleFormat,
	/// Support matrix passed to the compiler (browserslist syntax for the
	/// client, [`SERVER_TARGETS`] for the server).
	pub targets: String,
	/// Compile JSX syntax.
	pub jsx: bool,
	/// Strip TypeScript syntax.
	pub typescript: bool,
	/// Import specifier aliases, applied in insertion order.
	pub aliases: IndexMap<String, String>,
}

/// Hook customizing the generated compile configuration.
///
/// The hook receives the generated configuration (its `target` field tells
/// which build it is for) and returns the configuration to use.
#[derive(Clone)]
pub struct CompileConfigHook(Arc<dyn Fn(CompileConfig) -> CompileConfig + Send + Sync>);

impl CompileConfigHook {
	/// Wraps a closure as a compile config hook.
	pub fn new<F>(hook: F) -> Self
	where
		F: Fn(CompileConfig) -> CompileConfig + Send + Sync + 'static,
	{
		Self(Arc::new(hook))
	}

	/// Applies the hook.
	pub fn apply(&self, config: CompileConfig) -> CompileConfig {
		(self.0)(config)
	}
}

impl fmt::Debug for CompileConfigHook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("CompileConfigHook(..)")
	}
}

impl CompileConfig {
	/// Generates the compile configuration for `target`.
	///
	/// Server builds emit CommonJS for the running host; client builds emit
	/// ES modules for the browser `targets`. The hook, if any, runs last.
	///
	/// # Example
	///
	/// ```rust
	/// use islet_conf::{CompileConfig, CompileTarget, ModuleFormat};
	///
	/// let client = CompileConfig::generate(CompileTarget::Client, "defaults", None);
	/// assert_eq!(client.module_format, ModuleFormat::EsModule);
	/// assert_eq!(client.targets, "defaults");
	/// ```
	pub fn generate(
		target: CompileTarget,
		targets: &str,
		hook: Option<&CompileConfigHook>,
	) -> Self {
		let config = match target {
			CompileTarget::Server => Self {
				target,
				module_format: ModuleFormat::CommonJs,
				targets: SERVER_TARGETS.to_string(),
				jsx: true,
				typescript: true,
				aliases: IndexMap::new(),
			},
			CompileTarget::Client => Self {
				target,
				module_format: ModuleFormat::EsModule,
				targets: targets.to_string(),
				jsx: true,
				typescript: true,
				aliases: IndexMap::new(),
			},
		};

		match hook {
			Some(hook) => hook.apply(config),
			None => config,
		}
	}

	/// Adds an import alias.
	pub fn alias(mut self, specifier: impl Into<String>, replacement: impl Into<String>) -> Self {
		self.aliases.insert(specifier.into(), replacement.into());
		self
	}
}
