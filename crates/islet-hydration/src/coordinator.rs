//! Build-pass coordination.
//!
//! The client bundle can only be produced once every page of a pass has
//! been rendered, because only then is the set of hydrated components known.
//! [`BuildPass`] counts submitted pages against the page set collected at the
//! start of the pass; the submission of the last page triggers bundling and
//! the patching of every emitted page with the bundle references.
//!
//! ```text
//!            collect_pages                 last page submitted
//! Collecting ─────────────▶ Transforming ─────────────────────▶ Bundling
//!     ▲                                                            │
//!     │                       reset                                ▼
//!     └──────────────────────────────────────────────────────── Finalizing
//! ```
//!
//! A pass without hydrated components never bundles. Every completed pass,
//! successful or not, resets the coordinator, the registry and the module
//! cache.

use crate::bundler::{BundleRequest, ClientBundler};
use crate::error::{HydrationError, Result};
use crate::modules::ModuleCache;
use crate::registry::HydrationRegistry;
use crate::rewriter::{insert_bundle_scripts, materialize_markers};
use crate::store::{PageEnumerator, PageStore};
use islet_conf::{CompileConfig, CompileTarget, PluginOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Phase of a build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PassPhase {
	/// Waiting for the page set of the next pass.
	#[default]
	Collecting,
	/// Accepting rendered pages.
	Transforming,
	/// Waiting for the client bundler.
	Bundling,
	/// Patching emitted pages with the bundle references.
	Finalizing,
}

/// Snapshot of the coordinator state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassState {
	/// Current phase.
	pub phase: PassPhase,
	/// Number of pages of the pass, once collected.
	pub pages_expected: Option<usize>,
	/// Pages submitted so far, whether or not their rewrite succeeded.
	pub pages_submitted: usize,
	/// Output paths of the pages rewritten successfully, in submission order.
	/// Only these are patched once the bundle exists.
	pub pages_rewritten: Vec<PathBuf>,
	/// Assets produced by the bundler.
	pub client_assets: Vec<String>,
}

/// Coordinator of one build pass at a time.
pub struct BuildPass {
	registry: Arc<HydrationRegistry>,
	modules: Option<Arc<ModuleCache>>,
	bundler: Arc<dyn ClientBundler>,
	store: Arc<dyn PageStore>,
	compile: CompileConfig,
	assets_output_dir: PathBuf,
	assets_path: String,
	state: Mutex<PassState>,
}

impl BuildPass {
	/// Creates a coordinator for the pages rendered against `registry`.
	pub fn new(
		registry: Arc<HydrationRegistry>,
		bundler: Arc<dyn ClientBundler>,
		store: Arc<dyn PageStore>,
		options: &PluginOptions,
	) -> Self {
		Self {
			registry,
			modules: None,
			bundler,
			store,
			compile: options.compile_config(CompileTarget::Client),
			assets_output_dir: options.assets_output_dir(),
			assets_path: options.assets_path().to_string(),
			state: Mutex::new(PassState::default()),
		}
	}

	/// Invalidates `modules` whenever a pass resets.
	pub fn with_module_cache(mut self, modules: Arc<ModuleCache>) -> Self {
		self.modules = Some(modules);
		self
	}

	/// Registry of the pass.
	pub fn registry(&self) -> &Arc<HydrationRegistry> {
		&self.registry
	}

	/// Starts a pass over the pages listed by `pages`.
	///
	/// Must complete before the first page of the pass is submitted. A pass
	/// that did not complete, for example because a page failed to render,
	/// is discarded.
	pub async fn collect_pages<E>(&self, pages: &E) -> usize
	where
		E: PageEnumerator + ?Sized,
	{
		let mut state = self.state.lock().await;
		if state.pages_expected.is_some() {
			tracing::warn!(
				pages_expected = ?state.pages_expected,
				pages_submitted = state.pages_submitted,
				"previous build pass did not complete; discarding its state"
			);
			self.reset_locked(&mut state);
		}

		let count = pages.all_pages().len();
		state.pages_expected = Some(count);
		state.phase = PassPhase::Transforming;
		tracing::debug!(pages = count, "collected pages for build pass");
		count
	}

	/// Transforms a rendered page before the host writes it to `output_path`.
	///
	/// HTML pages get their boundary markers materialized. The last page of
	/// the pass additionally triggers bundling: every earlier page rewritten
	/// successfully is patched in the page store and the returned content of
	/// the last page carries the bundle references too.
	///
	/// A page that fails to rewrite still counts toward the pass, but is never
	/// patched. If the last page fails, the earlier pages are bundled and
	/// patched anyway before its error is returned.
	///
	/// # Errors
	///
	/// - [`HydrationError::PagesNotCollected`] if no pass is in progress
	/// - marker protocol errors of the page
	/// - [`HydrationError::Bundler`] if bundling fails; no page is patched and
	///   the pass is reset
	/// - errors of the page store while patching earlier pages
	pub async fn transform(&self, content: String, output_path: impl AsRef<Path>) -> Result<String> {
		let output_path = output_path.as_ref();
		let mut state = self.state.lock().await;
		let Some(expected) = state.pages_expected else {
			return Err(HydrationError::PagesNotCollected);
		};

		state.pages_submitted += 1;
		let rewritten = self.rewrite(content, output_path);
		if let Err(err) = &rewritten {
			tracing::warn!(page = %output_path.display(), error = %err, "failed to rewrite page");
		}

		if state.pages_submitted < expected {
			if rewritten.is_ok() {
				state.pages_rewritten.push(output_path.to_path_buf());
			}
			return rewritten;
		}

		let result = self.finish_locked(&mut state, rewritten, output_path).await;
		self.reset_locked(&mut state);
		result
	}

	fn rewrite(&self, content: String, output_path: &Path) -> Result<String> {
		if self.registry.has_entries() && is_html(output_path) {
			materialize_markers(&content)
		} else {
			Ok(content)
		}
	}

	async fn finish_locked(
		&self,
		state: &mut PassState,
		rewritten: Result<String>,
		output_path: &Path,
	) -> Result<String> {
		if !self.registry.has_entries() {
			return rewritten;
		}

		state.phase = PassPhase::Bundling;
		let components = self.registry.registered_components();
		tracing::info!(components = components.len(), "bundling hydrated components");

		let assets = self
			.bundler
			.bundle(BundleRequest {
				components,
				output_dir: self.assets_output_dir.clone(),
				compile: self.compile.clone(),
			})
			.await
			.inspect_err(|err| {
				tracing::error!(error = %err, "bundling of hydrated components failed");
			})?;
		state.client_assets = assets.clone();

		state.phase = PassPhase::Finalizing;
		futures::future::try_join_all(
			state
				.pages_rewritten
				.iter()
				.filter(|path| is_html(path))
				.map(|path| self.patch_page(path, &assets)),
		)
		.await?;

		let content = rewritten?;
		if is_html(output_path) {
			insert_bundle_scripts(&content, &assets, &self.assets_path, self.bundler.script_kind())
		} else {
			Ok(content)
		}
	}

	async fn patch_page(&self, path: &Path, assets: &[String]) -> Result<()> {
		let html = self.store.read(path).await?;
		let patched =
			insert_bundle_scripts(&html, assets, &self.assets_path, self.bundler.script_kind())?;
		if patched != html {
			self.store.write(path, &patched).await?;
			tracing::debug!(page = %path.display(), "patched page with bundle references");
		}
		Ok(())
	}

	/// Discards the current pass.
	pub async fn reset(&self) {
		let mut state = self.state.lock().await;
		self.reset_locked(&mut state);
	}

	fn reset_locked(&self, state: &mut PassState) {
		*state = PassState::default();
		self.registry.reset();
		if let Some(modules) = &self.modules {
			modules.invalidate();
		}
		tracing::debug!("build pass reset");
	}

	/// Number of pages of the current pass, if collected.
	pub async fn pages_expected(&self) -> Option<usize> {
		self.state.lock().await.pages_expected
	}

	/// Current phase.
	pub async fn phase(&self) -> PassPhase {
		self.state.lock().await.phase
	}

	/// Copy of the coordinator state.
	pub async fn snapshot(&self) -> PassState {
		self.state.lock().await.clone()
	}
}

impl std::fmt::Debug for BuildPass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BuildPass")
			.field("assets_output_dir", &self.assets_output_dir)
			.field("assets_path", &self.assets_path)
			.finish_non_exhaustive()
	}
}

fn is_html(path: &Path) -> bool {
	path.extension()
		.is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}
