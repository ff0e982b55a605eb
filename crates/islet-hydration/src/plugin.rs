//! Plugin entry point.
//!
//! [`HydrationPlugin`] wires the pieces of a build pass together for a host
//! site generator: one registry shared by the page renderer and the
//! coordinator, an optional module cache reset with every pass, the client
//! bundler and the page store.

use crate::bundler::{ClientBundler, EntryModuleBundler};
use crate::component::Component;
use crate::coordinator::BuildPass;
use crate::error::Result;
use crate::modules::{ModuleCache, SourceTransform};
use crate::page::PageRenderer;
use crate::registry::HydrationRegistry;
use crate::store::{FsPageStore, PageEnumerator, PageStore};
use islet_conf::{PageData, PluginOptions};
use std::path::Path;
use std::sync::Arc;

/// Partial hydration plugin.
///
/// A host drives it once per build:
///
/// 1. [`begin_pass`](Self::begin_pass) with the pages of the build
/// 2. [`render_page`](Self::render_page) for each page
/// 3. [`transform`](Self::transform) for each rendered page, before the
///    host writes it
///
/// # Example
///
/// ```rust,no_run
/// use islet_conf::{PageData, PluginOptions};
/// use islet_hydration::{FnComponent, HydrationPlugin, PageDescriptor, RenderContext};
///
/// # async fn build() -> islet_hydration::Result<()> {
/// let plugin = HydrationPlugin::builder(PluginOptions::default()).build();
/// plugin
///     .begin_pass(&vec![PageDescriptor::new("index.jsx", "_site/index.html")])
///     .await;
///
/// let page = FnComponent::named("Index", |_: &(), _cx: &RenderContext| {
///     Ok("<h1>Hello</h1>".to_string())
/// });
/// let html = plugin.render_page(&page, &(), &PageData::default())?;
/// let html = plugin.transform(html, "_site/index.html").await?;
/// std::fs::write("_site/index.html", html).ok();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HydrationPlugin {
	options: PluginOptions,
	registry: Arc<HydrationRegistry>,
	modules: Option<Arc<ModuleCache>>,
	renderer: PageRenderer,
	pass: BuildPass,
}

impl HydrationPlugin {
	/// Starts building a plugin from validated options.
	pub fn builder(options: PluginOptions) -> HydrationPluginBuilder {
		HydrationPluginBuilder {
			options,
			bundler: None,
			store: None,
			transform: None,
		}
	}

	/// Plugin options.
	pub fn options(&self) -> &PluginOptions {
		&self.options
	}

	/// Registry shared by every render of the current pass.
	pub fn registry(&self) -> &Arc<HydrationRegistry> {
		&self.registry
	}

	/// Template module cache, if a source transform is configured.
	pub fn modules(&self) -> Option<&Arc<ModuleCache>> {
		self.modules.as_ref()
	}

	/// Page renderer of the current pass.
	pub fn renderer(&self) -> &PageRenderer {
		&self.renderer
	}

	/// Build-pass coordinator.
	pub fn pass(&self) -> &BuildPass {
		&self.pass
	}

	/// Returns `true` if `path` is a template this plugin renders.
	pub fn handles(&self, path: &Path) -> bool {
		self.options.handles(path)
	}

	/// Starts a build pass over `pages`. Returns the number of pages.
	pub async fn begin_pass<E>(&self, pages: &E) -> usize
	where
		E: PageEnumerator + ?Sized,
	{
		self.pass.collect_pages(pages).await
	}

	/// Renders one page; see [`PageRenderer::render_page`].
	pub fn render_page<C>(&self, component: &C, props: &C::Props, data: &PageData) -> Result<String>
	where
		C: Component + ?Sized,
	{
		self.renderer.render_page(component, props, data)
	}

	/// Transforms a rendered page; see [`BuildPass::transform`].
	pub async fn transform(&self, content: String, output_path: impl AsRef<Path>) -> Result<String> {
		self.pass.transform(content, output_path).await
	}
}

/// Builder for [`HydrationPlugin`].
pub struct HydrationPluginBuilder {
	options: PluginOptions,
	bundler: Option<Arc<dyn ClientBundler>>,
	store: Option<Arc<dyn PageStore>>,
	transform: Option<Arc<dyn SourceTransform>>,
}

impl HydrationPluginBuilder {
	/// Client bundler. Defaults to [`EntryModuleBundler`].
	pub fn bundler(mut self, bundler: Arc<dyn ClientBundler>) -> Self {
		self.bundler = Some(bundler);
		self
	}

	/// Store used to patch emitted pages. Defaults to [`FsPageStore`] over the
	/// working directory.
	pub fn page_store(mut self, store: Arc<dyn PageStore>) -> Self {
		self.store = Some(store);
		self
	}

	/// Source transform for template modules. Enables the module cache.
	pub fn source_transform(mut self, transform: Arc<dyn SourceTransform>) -> Self {
		self.transform = Some(transform);
		self
	}

	/// Builds the plugin.
	pub fn build(self) -> HydrationPlugin {
		let registry = Arc::new(HydrationRegistry::new());
		let bundler = self
			.bundler
			.unwrap_or_else(|| Arc::new(EntryModuleBundler::default()) as Arc<dyn ClientBundler>);
		let store = self
			.store
			.unwrap_or_else(|| Arc::new(FsPageStore::default()) as Arc<dyn PageStore>);
		let modules = self
			.transform
			.map(|transform| Arc::new(ModuleCache::new(transform, &self.options)));

		let mut pass = BuildPass::new(Arc::clone(&registry), bundler, store, &self.options);
		if let Some(modules) = &modules {
			pass = pass.with_module_cache(Arc::clone(modules));
		}
		let renderer = PageRenderer::new(Arc::clone(&registry), self.options.post_process().cloned());

		tracing::debug!(
			extensions = ?self.options.extensions(),
			assets_path = self.options.assets_path(),
			"hydration plugin ready"
		);

		HydrationPlugin {
			options: self.options,
			registry,
			modules,
			renderer,
			pass,
		}
	}
}

impl std::fmt::Debug for HydrationPluginBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HydrationPluginBuilder")
			.field("options", &self.options)
			.field("bundler", &self.bundler.is_some())
			.field("store", &self.store.is_some())
			.field("transform", &self.transform.is_some())
			.finish()
	}
}
