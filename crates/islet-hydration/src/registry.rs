//! Render-site registry.
//!
//! One [`HydrationRegistry`] exists per build pass. Every hydrated component
//! rendered during the pass registers here and receives a fresh id; the
//! registry also deduplicates the defining modules so the client bundle
//! imports each component once, however many times it was rendered.
//!
//! ```text
//! page a: <Counter/> <Counter/>      ids 0, 1   modules: Counter.jsx
//! page b: <Counter/> <Search/>       ids 2, 3   modules: Counter.jsx, Search.jsx
//! ```

use crate::error::{HydrationError, Result};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the module defining a hydrated component.
///
/// This is the resolved path the client bundle imports the component from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleKey(String);

impl ModuleKey {
	/// Creates a module key from a resolved module path.
	pub fn new(path: impl Into<String>) -> Self {
		Self(path.into())
	}

	/// Returns the module path.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns `true` if the key carries no path.
	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl fmt::Display for ModuleKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ModuleKey {
	fn from(path: &str) -> Self {
		Self::new(path)
	}
}

impl From<String> for ModuleKey {
	fn from(path: String) -> Self {
		Self(path)
	}
}

/// Id and name assigned to one render site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSite {
	/// Render-site id, unique within the pass.
	pub id: u64,
	/// Name of the component, as first registered for its module.
	pub component_name: String,
}

/// A distinct component module registered during the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredComponent {
	/// Defining module.
	pub module: ModuleKey,
	/// Component name.
	pub name: String,
}

#[derive(Debug, Default)]
struct RegistryInner {
	components: IndexMap<ModuleKey, String>,
	next_id: u64,
}

/// Pass-scoped table of hydrated components and render-site ids.
///
/// Registration is serialized by an internal lock, so concurrent page renders
/// may share one registry.
#[derive(Debug, Default)]
pub struct HydrationRegistry {
	inner: Mutex<RegistryInner>,
}

impl HydrationRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a render site and returns its id and component name.
	///
	/// The first registration of a module fixes its name for the rest of the
	/// pass. Every call returns a new id, ids start at 0 and are dense.
	///
	/// # Errors
	///
	/// - [`HydrationError::MissingModuleIdentity`] if `module` is absent or empty
	/// - [`HydrationError::MissingComponentName`] if `display_name` is absent or empty
	pub fn register_render_site(
		&self,
		module: Option<&ModuleKey>,
		display_name: Option<&str>,
	) -> Result<RenderSite> {
		let display_name = display_name.map(str::trim).filter(|name| !name.is_empty());

		let module = match module {
			Some(module) if !module.is_empty() => module,
			_ => {
				return Err(HydrationError::MissingModuleIdentity {
					component: display_name.unwrap_or("<anonymous>").to_string(),
				});
			}
		};

		let display_name = display_name.ok_or_else(|| HydrationError::MissingComponentName {
			module: module.to_string(),
		})?;

		let mut inner = self.inner.lock();
		let component_name = inner
			.components
			.entry(module.clone())
			.or_insert_with(|| display_name.to_string())
			.clone();
		let id = inner.next_id;
		inner.next_id += 1;
		drop(inner);

		tracing::debug!(id, component = %component_name, %module, "registered render site");

		Ok(RenderSite { id, component_name })
	}

	/// Distinct registered components, in first-registration order.
	pub fn registered_components(&self) -> Vec<RegisteredComponent> {
		self.inner
			.lock()
			.components
			.iter()
			.map(|(module, name)| RegisteredComponent {
				module: module.clone(),
				name: name.clone(),
			})
			.collect()
	}

	/// Returns `true` if any component was registered during the pass.
	pub fn has_entries(&self) -> bool {
		!self.inner.lock().components.is_empty()
	}

	/// Number of render sites registered during the pass.
	pub fn render_site_count(&self) -> u64 {
		self.inner.lock().next_id
	}

	/// Clears the component table and restarts ids at 0.
	pub fn reset(&self) {
		let mut inner = self.inner.lock();
		inner.components.clear();
		inner.next_id = 0;
	}
}
