//! Page rendering.

use crate::component::{Component, RenderContext};
use crate::document::default_document;
use crate::error::Result;
use crate::registry::HydrationRegistry;
use islet_conf::{PageData, PostProcessHook};
use std::sync::Arc;

/// Renders page components to complete documents during a build pass.
#[derive(Debug, Clone)]
pub struct PageRenderer {
	registry: Arc<HydrationRegistry>,
	post_process: Option<PostProcessHook>,
}

impl PageRenderer {
	/// Creates a renderer recording render sites in `registry`.
	pub fn new(registry: Arc<HydrationRegistry>, post_process: Option<PostProcessHook>) -> Self {
		Self {
			registry,
			post_process,
		}
	}

	/// Server context for this pass.
	pub fn context(&self) -> RenderContext {
		RenderContext::server(Arc::clone(&self.registry))
	}

	/// Renders `component` for one page.
	///
	/// The rendered markup is handed to the post-process hook if one is
	/// configured, otherwise it is wrapped in [`default_document`].
	pub fn render_page<C>(&self, component: &C, props: &C::Props, data: &PageData) -> Result<String>
	where
		C: Component + ?Sized,
	{
		let body = component.render(props, &self.context())?;
		Ok(match &self.post_process {
			Some(hook) => hook.apply(&body, data),
			None => default_document(&body, data),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::adapter::Hydrated;
	use crate::component::FnComponent;
	use crate::error::HydrationError;
	use islet_conf::PageMeta;
	use rstest::{fixture, rstest};

	#[fixture]
	fn data() -> PageData {
		PageData {
			page: PageMeta {
				title: Some("Home".into()),
				description: None,
			},
			site: PageMeta::default(),
			extra: serde_json::Value::Null,
		}
	}

	fn home() -> impl Component<Props = ()> {
		let counter = Hydrated::new(
			FnComponent::named("Counter", |n: &u32, _cx: &RenderContext| {
				Ok(format!("<button>{n}</button>"))
			}),
			"components/Counter.jsx",
		);
		FnComponent::named("Home", move |_: &(), cx: &RenderContext| {
			Ok(format!("<h1>Home</h1>{}", counter.render(&0, cx)?))
		})
	}

	#[rstest]
	fn test_default_wrapper(data: PageData) {
		let registry = Arc::new(HydrationRegistry::new());
		let renderer = PageRenderer::new(Arc::clone(&registry), None);

		let html = renderer.render_page(&home(), &(), &data).unwrap();

		assert!(html.starts_with("<!doctype html>"));
		assert!(html.contains("<title>Home</title>"));
		assert!(html.contains(r#"<div id="content"><h1>Home</h1><script data-hydration-start-id="0""#));
		assert_eq!(registry.render_site_count(), 1);
	}

	#[rstest]
	fn test_post_process_replaces_wrapper(data: PageData) {
		let hook = PostProcessHook::new(|html: &str, data: &PageData| {
			format!("<main data-title=\"{}\">{html}</main>", data.title().unwrap_or_default())
		});
		let renderer = PageRenderer::new(Arc::new(HydrationRegistry::new()), Some(hook));

		let html = renderer.render_page(&home(), &(), &data).unwrap();

		assert!(html.starts_with(r#"<main data-title="Home"><h1>Home</h1>"#));
		assert!(!html.contains("<!doctype html>"));
	}

	#[rstest]
	fn test_render_errors_propagate(data: PageData) {
		let renderer = PageRenderer::new(Arc::new(HydrationRegistry::new()), None);
		let anonymous = Hydrated::new(
			FnComponent::anonymous(|_: &(), _cx: &RenderContext| Ok("<p/>".to_string())),
			"Anon.jsx",
		);

		let err = renderer.render_page(&anonymous, &(), &data).unwrap_err();
		assert!(matches!(err, HydrationError::MissingComponentName { .. }));
	}
}
