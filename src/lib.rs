//! # Islet
//!
//! Partial hydration for statically generated sites.
//!
//! Every page is rendered to plain HTML at build time. Components wrapped
//! with [`Hydrated`](hydration::Hydrated) are additionally hydrated in the
//! browser; the client bundle contains those components and nothing else.
//!
//! ## Feature Flags
//!
//! - `conf` - Plugin options and settings files ([`conf`])
//! - `hydration` - The hydration engine ([`hydration`]), implies `conf`
//! - `full` (default) - Everything
//!
//! ## Quick Example
//!
//! ```rust
//! use islet::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> islet::hydration::Result<()> {
//! let dir = std::env::temp_dir().join("islet-doc");
//! let options = PluginOptions::builder().output_dir(dir.join("_site")).build()?;
//! let plugin = HydrationPlugin::builder(options).build();
//!
//! let output = dir.join("_site/index.html");
//! plugin.begin_pass(&vec![PageDescriptor::new("index.jsx", &output)]).await;
//!
//! let counter = Hydrated::new(
//!     FnComponent::named("Counter", |start: &u32, _cx: &RenderContext| {
//!         Ok(format!("<button>{start}</button>"))
//!     }),
//!     "components/Counter.jsx",
//! );
//! let html = plugin.render_page(&counter, &0, &PageData::default())?;
//! let html = plugin.transform(html, &output).await?;
//!
//! assert!(html.contains("data-hydration-root-id"));
//! assert!(html.contains(r#"type="module""#));
//! assert!(html.contains(r#"src="/assets/hydrated-components."#));
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "conf")]
pub mod conf;
#[cfg(feature = "hydration")]
pub mod hydration;

/// Commonly used types.
pub mod prelude {
	#[cfg(feature = "conf")]
	pub use islet_conf::{
		CompileConfig, CompileTarget, ConfigError, PageData, PageMeta, PluginOptions,
		PluginSettings,
	};

	#[cfg(feature = "hydration")]
	pub use islet_hydration::{
		BuildPass, ClientBundler, Component, FnComponent, FsPageStore, Hydrated, HydrationError,
		HydrationPlugin, HydrationRegistry, ModuleKey, PageDescriptor, PageStore, RenderContext,
	};
}
