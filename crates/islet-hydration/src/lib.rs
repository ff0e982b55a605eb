//! Islet Hydration - partial hydration for statically generated sites
//!
//! Pages are rendered to static HTML at build time. Components the author
//! marks as interactive are hydrated in the browser; everything else ships
//! as plain markup with no client code.
//!
//! ## Architecture
//!
//! - [`registry`]: pass-scoped render-site ids and component module dedup
//! - [`markers`]: boundary markers around hydrated render sites
//! - [`component`]: component contract and explicit execution context
//! - [`adapter`]: [`Hydrated`], the wrapper that records and marks render sites
//! - [`rewriter`]: marker materialization and bundle-reference injection
//! - [`coordinator`]: [`BuildPass`], the per-build state machine that bundles
//!   once every page is rendered
//! - [`bundler`]: client bundler seam and client entry generation
//! - [`modules`]: compiled template cache, invalidated between passes
//! - [`store`]: page enumeration and emitted-page access
//! - [`document`] and [`page`]: default page wrapper and page rendering
//! - [`plugin`]: [`HydrationPlugin`], wiring all of the above
//!
//! ## Flow of one build pass
//!
//! ```text
//! begin_pass(pages) ─▶ render_page ─▶ transform ─▶ ... ─▶ transform (last page)
//!                          │              │                     │
//!                  registry + markers   materialize      bundle, patch pages,
//!                                                        reset
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use islet_hydration::{FnComponent, Hydrated, HydrationRegistry, RenderContext, Result};
//! use islet_hydration::component::Component;
//! use islet_hydration::rewriter::materialize_markers;
//!
//! fn main() -> Result<()> {
//!     let counter = Hydrated::new(
//!         FnComponent::named("Counter", |start: &i64, _cx: &RenderContext| {
//!             Ok(format!("<button>{start}</button>"))
//!         }),
//!         "components/Counter.jsx",
//!     );
//!
//!     let registry = Arc::new(HydrationRegistry::new());
//!     let body = counter.render(&5, &RenderContext::server(Arc::clone(&registry)))?;
//!     let page = materialize_markers(&format!("<html><body>{body}</body></html>"))?;
//!
//!     assert!(page.contains(r#"data-hydration-component-name="Counter""#));
//!     assert_eq!(registry.registered_components().len(), 1);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod bundler;
pub mod component;
pub mod coordinator;
pub mod document;
pub mod error;
pub mod markers;
pub mod modules;
pub mod page;
pub mod plugin;
pub mod registry;
pub mod rewriter;
pub mod store;

pub use adapter::Hydrated;
pub use bundler::{
	BundleError, BundleRequest, ClientBundler, ClientRuntime, EntryModuleBundler, ScriptKind,
};
pub use component::{Component, ExecutionEnv, FnComponent, RenderContext};
pub use coordinator::{BuildPass, PassPhase, PassState};
pub use error::{HydrationError, MarkerKind, Result};
pub use markers::HydrationEntry;
pub use modules::{CompiledModule, ModuleCache, SourceTransform};
pub use page::PageRenderer;
pub use plugin::{HydrationPlugin, HydrationPluginBuilder};
pub use registry::{HydrationRegistry, ModuleKey, RegisteredComponent, RenderSite};
pub use store::{FsPageStore, PageDescriptor, PageEnumerator, PageStore};
