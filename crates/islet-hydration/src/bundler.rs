//! Client bundling.
//!
//! Bundling is an external concern: hosts implement [`ClientBundler`] on top
//! of whatever toolchain produces their browser assets. This module defines
//! that seam, generates the client entry module every bundler starts from,
//! and ships [`EntryModuleBundler`], which emits the entry module as is for
//! hosts that serve ES modules directly.

use crate::markers::{COMPONENT_NAME_ATTR, PROPS_ATTR, ROOT_ID_ATTR};
use crate::registry::RegisteredComponent;
use async_trait::async_trait;
use islet_conf::CompileConfig;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// File name stem of generated client entries.
pub const ENTRY_FILE_STEM: &str = "hydrated-components";

/// Errors reported by a [`ClientBundler`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BundleError {
	/// The bundler reported a failure.
	#[error("{0}")]
	Failed(String),

	/// Writing bundler output failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

/// Input of one bundler invocation.
#[derive(Debug, Clone)]
pub struct BundleRequest {
	/// Distinct components registered during the pass.
	pub components: Vec<RegisteredComponent>,
	/// Directory the produced assets are written to.
	pub output_dir: PathBuf,
	/// Compiler configuration of the client build.
	pub compile: CompileConfig,
}

/// How pages load the assets of a bundler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScriptKind {
	/// Self-contained scripts, referenced with `<script src>`.
	#[default]
	Classic,
	/// ES modules, referenced with `<script type="module" src>`.
	Module,
}

/// Produces the browser assets hydrating the registered components.
#[async_trait]
pub trait ClientBundler: Send + Sync {
	/// Bundles the components and returns the produced asset file names,
	/// relative to the request's output directory.
	async fn bundle(&self, request: BundleRequest) -> Result<Vec<String>, BundleError>;

	/// Kind of script the produced assets are.
	fn script_kind(&self) -> ScriptKind {
		ScriptKind::Classic
	}
}

/// Client rendering library the generated entry hydrates with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientRuntime {
	/// `react` with `react-dom/client`.
	#[default]
	React,
	/// `preact`.
	Preact,
}

impl ClientRuntime {
	fn imports(self) -> &'static [(&'static str, &'static str)] {
		match self {
			Self::React => &[
				("{ createElement }", "react"),
				("{ hydrateRoot }", "react-dom/client"),
			],
			Self::Preact => &[("{ h, hydrate }", "preact")],
		}
	}

	fn hydrate_call(self) -> &'static str {
		match self {
			Self::React => "hydrateRoot(root, createElement(Component, props));",
			Self::Preact => "hydrate(h(Component, props), root);",
		}
	}
}

fn js_string(value: &str) -> String {
	serde_json::Value::String(value.to_string()).to_string()
}

/// Generates the client entry module for `components`.
///
/// The module imports each component module once and, on load, hydrates
/// every top-level hydration root container with the component named by
/// the container and the props it carries. Roots nested in another root are
/// left to the enclosing component. Import specifiers are rewritten through
/// the aliases of `compile`.
///
/// # Example
///
/// ```rust
/// use islet_conf::{CompileConfig, CompileTarget};
/// use islet_hydration::bundler::{ClientRuntime, generate_entry_module};
/// use islet_hydration::registry::{ModuleKey, RegisteredComponent};
///
/// let components = vec![RegisteredComponent {
///     module: ModuleKey::new("/site/components/Counter.jsx"),
///     name: "Counter".into(),
/// }];
/// let compile = CompileConfig::generate(CompileTarget::Client, "defaults", None);
/// let entry = generate_entry_module(&components, ClientRuntime::React, &compile);
///
/// assert!(entry.contains(r#"import __islet_c0 from "/site/components/Counter.jsx";"#));
/// assert!(entry.contains(r#""Counter": __islet_c0"#));
/// ```
pub fn generate_entry_module(
	components: &[RegisteredComponent],
	runtime: ClientRuntime,
	compile: &CompileConfig,
) -> String {
	let resolve = |specifier: &str| -> String {
		compile
			.aliases
			.get(specifier)
			.map(String::as_str)
			.unwrap_or(specifier)
			.to_string()
	};

	let mut imports = format!("// Generated client entry ({}).\n", compile.targets);
	for &(bindings, specifier) in runtime.imports() {
		imports.push_str(&format!(
			"import {bindings} from {};\n",
			js_string(&resolve(specifier))
		));
	}
	for (index, component) in components.iter().enumerate() {
		imports.push_str(&format!(
			"import __islet_c{index} from {};\n",
			js_string(&resolve(component.module.as_str()))
		));
	}

	let mut names = HashSet::new();
	let mut table = String::new();
	for (index, component) in components.iter().enumerate() {
		if !names.insert(component.name.as_str()) {
			tracing::warn!(
				component = %component.name,
				module = %component.module,
				"component name registered by more than one module; keeping the first"
			);
			continue;
		}
		table.push_str(&format!("  {}: __islet_c{index},\n", js_string(&component.name)));
	}

	format!(
		"{imports}\n\
		 const components = {{\n{table}}};\n\n\
		 for (const root of document.querySelectorAll(\"[{ROOT_ID_ATTR}]\")) {{\n\
		 \x20 if (root.parentElement && root.parentElement.closest(\"[{ROOT_ID_ATTR}]\")) continue;\n\
		 \x20 const Component = components[root.getAttribute(\"{COMPONENT_NAME_ATTR}\")];\n\
		 \x20 if (!Component) continue;\n\
		 \x20 const props = JSON.parse(root.getAttribute(\"{PROPS_ATTR}\") || \"{{}}\");\n\
		 \x20 {hydrate}\n\
		 }}\n",
		hydrate = runtime.hydrate_call(),
	)
}

/// File name of an entry module with the given contents.
pub fn entry_file_name(contents: &str) -> String {
	let digest = Sha256::digest(contents.as_bytes());
	let hash: String = digest[..8].iter().map(|byte| format!("{byte:02x}")).collect();
	format!("{ENTRY_FILE_STEM}.{hash}.js")
}

/// Bundler writing the generated entry module without further processing.
///
/// The entry imports its components and runtime by specifier, so pages load
/// it as an ES module and the host serves those specifiers (an import map or
/// a dev server). The output is named `hydrated-components.<hash>.js` after its contents,
/// so unchanged component sets keep their file name across builds.
#[derive(Debug, Clone, Default)]
pub struct EntryModuleBundler {
	runtime: ClientRuntime,
}

impl EntryModuleBundler {
	/// Creates a bundler for `runtime`.
	pub fn new(runtime: ClientRuntime) -> Self {
		Self { runtime }
	}
}

#[async_trait]
impl ClientBundler for EntryModuleBundler {
	async fn bundle(&self, request: BundleRequest) -> Result<Vec<String>, BundleError> {
		if request.components.is_empty() {
			return Err(BundleError::Failed("no components to bundle".to_string()));
		}

		let contents = generate_entry_module(&request.components, self.runtime, &request.compile);
		let file_name = entry_file_name(&contents);

		tokio::fs::create_dir_all(&request.output_dir).await?;
		tokio::fs::write(request.output_dir.join(&file_name), contents).await?;

		tracing::debug!(
			file = %file_name,
			components = request.components.len(),
			"wrote client entry module"
		);

		Ok(vec![file_name])
	}

	fn script_kind(&self) -> ScriptKind {
		ScriptKind::Module
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::registry::ModuleKey;
	use islet_conf::CompileTarget;
	use rstest::{fixture, rstest};

	fn component(module: &str, name: &str) -> RegisteredComponent {
		RegisteredComponent {
			module: ModuleKey::new(module),
			name: name.to_string(),
		}
	}

	#[fixture]
	fn compile() -> CompileConfig {
		CompileConfig::generate(CompileTarget::Client, "defaults", None)
	}

	#[rstest]
	fn test_one_import_per_module(compile: CompileConfig) {
		let components = vec![
			component("components/Counter.jsx", "Counter"),
			component("components/Search.tsx", "Search"),
		];
		let entry = generate_entry_module(&components, ClientRuntime::React, &compile);

		assert_eq!(entry.matches("import __islet_c").count(), 2);
		assert!(entry.contains(r#"import { hydrateRoot } from "react-dom/client";"#));
		assert!(entry.contains(r#""Search": __islet_c1,"#));
		assert!(entry.contains("[data-hydration-root-id]"));
	}

	#[rstest]
	fn test_duplicate_names_keep_first(compile: CompileConfig) {
		let components = vec![
			component("a/Button.jsx", "Button"),
			component("b/Button.jsx", "Button"),
		];
		let entry = generate_entry_module(&components, ClientRuntime::Preact, &compile);

		assert!(entry.contains(r#""Button": __islet_c0,"#));
		assert!(!entry.contains(r#""Button": __islet_c1,"#));
		assert!(entry.contains("hydrate(h(Component, props), root);"));
	}

	#[rstest]
	fn test_specifiers_are_escaped_and_aliased(compile: CompileConfig) {
		let compile = compile.alias("react", "preact/compat");
		let components = vec![component(r#"dir "quoted"/W.jsx"#, "W")];
		let entry = generate_entry_module(&components, ClientRuntime::React, &compile);

		assert!(entry.contains(r#"from "dir \"quoted\"/W.jsx";"#));
		assert!(entry.contains(r#"import { createElement } from "preact/compat";"#));
	}

	#[rstest]
	fn test_entry_file_name_is_content_addressed() {
		let a = entry_file_name("a");
		assert_eq!(a, entry_file_name("a"));
		assert_ne!(a, entry_file_name("b"));
		assert!(a.starts_with("hydrated-components."));
		assert_eq!(a.len(), "hydrated-components.".len() + 16 + ".js".len());
	}

	#[rstest]
	#[tokio::test]
	async fn test_entry_module_bundler_writes_file(compile: CompileConfig) {
		let dir = tempfile::tempdir().unwrap();
		let output_dir = dir.path().join("assets");
		let bundler = EntryModuleBundler::default();

		let assets = bundler
			.bundle(BundleRequest {
				components: vec![component("components/Counter.jsx", "Counter")],
				output_dir: output_dir.clone(),
				compile,
			})
			.await
			.unwrap();

		assert_eq!(assets.len(), 1);
		let written = std::fs::read_to_string(output_dir.join(&assets[0])).unwrap();
		assert!(written.contains("components/Counter.jsx"));
		assert!(written.contains("import __islet_c0"));
		assert_eq!(bundler.script_kind(), ScriptKind::Module);
	}

	#[rstest]
	#[tokio::test]
	async fn test_entry_module_bundler_rejects_empty_request(compile: CompileConfig) {
		let dir = tempfile::tempdir().unwrap();
		let err = EntryModuleBundler::default()
			.bundle(BundleRequest {
				components: Vec::new(),
				output_dir: dir.path().to_path_buf(),
				compile,
			})
			.await
			.unwrap_err();
		assert!(matches!(err, BundleError::Failed(_)));
	}
}
