//! Component model and render context.
//!
//! The rendering library itself is an external collaborator; this module only
//! fixes the narrow contract the hydration engine needs: a component renders
//! its props to markup and may report a display name.

use crate::error::Result;
use crate::registry::HydrationRegistry;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Where a render is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionEnv {
	/// Server-side render during a build pass.
	Server,
	/// Re-render in the browser during hydration.
	Browser,
}

/// Context threaded through every render.
///
/// Set up once by the hosting environment. A server context carries the
/// registry of the current build pass; a browser context carries none and
/// hydrated components skip all bookkeeping.
#[derive(Clone)]
pub struct RenderContext {
	env: ExecutionEnv,
	registry: Option<Arc<HydrationRegistry>>,
}

impl RenderContext {
	/// Server-side context bound to the registry of the current pass.
	pub fn server(registry: Arc<HydrationRegistry>) -> Self {
		Self {
			env: ExecutionEnv::Server,
			registry: Some(registry),
		}
	}

	/// Browser context.
	pub fn browser() -> Self {
		Self {
			env: ExecutionEnv::Browser,
			registry: None,
		}
	}

	/// Execution environment.
	pub fn env(&self) -> ExecutionEnv {
		self.env
	}

	/// Registry to record render sites in, `None` in the browser.
	pub fn registry(&self) -> Option<&HydrationRegistry> {
		match self.env {
			ExecutionEnv::Server => self.registry.as_deref(),
			ExecutionEnv::Browser => None,
		}
	}
}

impl fmt::Debug for RenderContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderContext")
			.field("env", &self.env)
			.finish_non_exhaustive()
	}
}

/// A renderable component.
///
/// # Example
///
/// ```rust
/// use islet_hydration::component::{Component, RenderContext};
/// use islet_hydration::Result;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct GreetingProps {
///     name: String,
/// }
///
/// struct Greeting;
///
/// impl Component for Greeting {
///     type Props = GreetingProps;
///
///     fn display_name(&self) -> Option<&str> {
///         Some("Greeting")
///     }
///
///     fn render(&self, props: &GreetingProps, _cx: &RenderContext) -> Result<String> {
///         Ok(format!("<p>Hello, {}!</p>", props.name))
///     }
/// }
/// ```
pub trait Component: Send + Sync {
	/// Input data of the component.
	type Props: Serialize;

	/// Name used to refer to the component in markers and in the client
	/// bundle. Hydrated components must have one.
	fn display_name(&self) -> Option<&str>;

	/// Renders the component to markup.
	///
	/// Child components receive the same context so that nested hydrated
	/// components register with the same pass.
	fn render(&self, props: &Self::Props, cx: &RenderContext) -> Result<String>;
}

/// Component backed by a closure.
pub struct FnComponent<P, F> {
	name: Option<String>,
	render: F,
	_props: PhantomData<fn(&P)>,
}

impl<P, F> FnComponent<P, F>
where
	P: Serialize,
	F: Fn(&P, &RenderContext) -> Result<String> + Send + Sync,
{
	/// Creates a named closure component.
	pub fn named(name: impl Into<String>, render: F) -> Self {
		Self {
			name: Some(name.into()),
			render,
			_props: PhantomData,
		}
	}

	/// Creates a closure component without a name.
	pub fn anonymous(render: F) -> Self {
		Self {
			name: None,
			render,
			_props: PhantomData,
		}
	}
}

impl<P, F> Component for FnComponent<P, F>
where
	P: Serialize,
	F: Fn(&P, &RenderContext) -> Result<String> + Send + Sync,
{
	type Props = P;

	fn display_name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	fn render(&self, props: &P, cx: &RenderContext) -> Result<String> {
		(self.render)(props, cx)
	}
}

impl<P, F> fmt::Debug for FnComponent<P, F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnComponent")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}
