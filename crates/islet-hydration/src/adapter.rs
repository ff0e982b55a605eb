//! Render adapter for hydrated components.
//!
//! [`Hydrated`] decorates a component with hydration bookkeeping. It keeps the
//! component's prop contract; on the server it surrounds the output with
//! boundary markers, in the browser it renders the component unchanged.

use crate::component::{Component, RenderContext};
use crate::error::{HydrationError, Result};
use crate::markers::{encode_end, encode_start};
use crate::registry::ModuleKey;

/// A component wrapped for partial hydration.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use islet_hydration::{FnComponent, Hydrated, HydrationRegistry, RenderContext};
/// use islet_hydration::component::Component;
///
/// let counter = Hydrated::new(
///     FnComponent::named("Counter", |start: &u32, _cx: &RenderContext| {
///         Ok(format!("<button>{start}</button>"))
///     }),
///     "components/Counter.jsx",
/// );
///
/// let registry = Arc::new(HydrationRegistry::new());
/// let html = counter.render(&3, &RenderContext::server(registry)).unwrap();
///
/// assert!(html.starts_with(r#"<script data-hydration-start-id="0""#));
/// assert!(html.contains("<button>3</button>"));
/// assert!(html.ends_with(r#"<script data-hydration-end-id="0"></script>"#));
/// ```
#[derive(Debug)]
pub struct Hydrated<C> {
	inner: C,
	module: Option<ModuleKey>,
}

impl<C: Component> Hydrated<C> {
	/// Wraps `component`, defined in `module`.
	///
	/// `module` is the path the client bundle imports the component from.
	pub fn new(component: C, module: impl Into<ModuleKey>) -> Self {
		Self {
			inner: component,
			module: Some(module.into()),
		}
	}

	/// Wraps a component whose defining module is unknown.
	///
	/// Rendering it on the server fails with
	/// [`HydrationError::MissingModuleIdentity`].
	pub fn without_module(component: C) -> Self {
		Self {
			inner: component,
			module: None,
		}
	}

	/// The wrapped component.
	pub fn inner(&self) -> &C {
		&self.inner
	}

	/// The defining module, if known.
	pub fn module(&self) -> Option<&ModuleKey> {
		self.module.as_ref()
	}
}

impl<C: Component> Component for Hydrated<C> {
	type Props = C::Props;

	fn display_name(&self) -> Option<&str> {
		self.inner.display_name()
	}

	fn render(&self, props: &C::Props, cx: &RenderContext) -> Result<String> {
		let Some(registry) = cx.registry() else {
			return self.inner.render(props, cx);
		};

		let props_snapshot =
			serde_json::to_value(props).map_err(|source| HydrationError::UnserializableProps {
				component: self
					.inner
					.display_name()
					.unwrap_or("<anonymous>")
					.to_string(),
				source,
			})?;

		// Registering before rendering the inner output gives nested hydrated
		// components larger ids, matching start-marker document order.
		let site = registry.register_render_site(self.module.as_ref(), self.inner.display_name())?;
		let inner = self.inner.render(props, cx)?;

		let start = encode_start(site.id, &site.component_name, &props_snapshot);
		let end = encode_end(site.id);

		let mut html = String::with_capacity(start.len() + inner.len() + end.len());
		html.push_str(&start);
		html.push_str(&inner);
		html.push_str(&end);
		Ok(html)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::FnComponent;
	use crate::registry::HydrationRegistry;
	use rstest::{fixture, rstest};
	use serde::Serialize;
	use serde::ser::{Error as _, Serializer};
	use std::collections::BTreeMap;
	use std::sync::Arc;

	#[derive(Debug, Clone, Serialize)]
	struct WidgetProps {
		a: u32,
	}

	#[fixture]
	fn registry() -> Arc<HydrationRegistry> {
		Arc::new(HydrationRegistry::new())
	}

	fn widget() -> Hydrated<impl Component<Props = WidgetProps>> {
		Hydrated::new(
			FnComponent::named("Widget", |props: &WidgetProps, _cx: &RenderContext| {
				Ok(format!("<span>{}</span>", props.a))
			}),
			"components/Widget.jsx",
		)
	}

	#[rstest]
	fn test_server_render_emits_marker_pair(registry: Arc<HydrationRegistry>) {
		let cx = RenderContext::server(Arc::clone(&registry));
		let html = widget().render(&WidgetProps { a: 1 }, &cx).unwrap();

		let expected = format!(
			"{}<span>1</span>{}",
			encode_start(0, "Widget", &serde_json::json!({ "a": 1 })),
			encode_end(0)
		);
		assert_eq!(html, expected);
		assert!(registry.has_entries());
	}

	#[rstest]
	fn test_browser_render_is_plain(registry: Arc<HydrationRegistry>) {
		let html = widget()
			.render(&WidgetProps { a: 1 }, &RenderContext::browser())
			.unwrap();
		assert_eq!(html, "<span>1</span>");
		assert!(!registry.has_entries());
	}

	#[rstest]
	fn test_each_render_site_gets_its_own_id(registry: Arc<HydrationRegistry>) {
		let cx = RenderContext::server(Arc::clone(&registry));
		let widget = widget();
		for a in 0..3 {
			let html = widget.render(&WidgetProps { a }, &cx).unwrap();
			assert!(html.contains(&encode_end(a as u64)));
		}
		assert_eq!(registry.registered_components().len(), 1);
	}

	#[rstest]
	fn test_props_are_snapshotted(registry: Arc<HydrationRegistry>) {
		let cx = RenderContext::server(Arc::clone(&registry));
		let mut props = WidgetProps { a: 1 };
		let html = widget().render(&props, &cx).unwrap();
		props.a = 99;

		assert!(html.contains("{&quot;a&quot;:1}"));
		assert!(!html.contains("99"));
	}

	#[rstest]
	fn test_nested_hydrated_components_number_in_document_order(
		registry: Arc<HydrationRegistry>,
	) {
		let cx = RenderContext::server(Arc::clone(&registry));
		let child = widget();
		let parent = Hydrated::new(
			FnComponent::named("Panel", move |_: &(), cx: &RenderContext| {
				let inner = child.render(&WidgetProps { a: 5 }, cx)?;
				Ok(format!("<section>{inner}</section>"))
			}),
			"components/Panel.jsx",
		);

		let html = parent.render(&(), &cx).unwrap();
		let panel_start = html.find(r#"data-hydration-start-id="0""#).unwrap();
		let widget_start = html.find(r#"data-hydration-start-id="1""#).unwrap();
		assert!(panel_start < widget_start);
		assert!(html.contains(r#"data-hydration-component-name="Widget""#));
	}

	#[rstest]
	fn test_anonymous_component_fails_before_any_marker(registry: Arc<HydrationRegistry>) {
		let cx = RenderContext::server(Arc::clone(&registry));
		let anonymous = Hydrated::new(
			FnComponent::anonymous(|_: &(), _cx: &RenderContext| Ok("<p>anon</p>".to_string())),
			"components/Anon.jsx",
		);

		let err = anonymous.render(&(), &cx).unwrap_err();
		assert!(matches!(err, HydrationError::MissingComponentName { .. }));
		assert_eq!(registry.render_site_count(), 0);
	}

	#[rstest]
	fn test_missing_module_identity(registry: Arc<HydrationRegistry>) {
		let cx = RenderContext::server(Arc::clone(&registry));
		let orphan = Hydrated::without_module(FnComponent::named(
			"Orphan",
			|_: &(), _cx: &RenderContext| Ok("<p/>".to_string()),
		));

		let err = orphan.render(&(), &cx).unwrap_err();
		assert!(matches!(
			err,
			HydrationError::MissingModuleIdentity { ref component } if component == "Orphan"
		));
	}

	struct Unserializable;

	impl Serialize for Unserializable {
		fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
			Err(S::Error::custom("callbacks cannot be serialized"))
		}
	}

	#[rstest]
	fn test_unserializable_props(registry: Arc<HydrationRegistry>) {
		let cx = RenderContext::server(Arc::clone(&registry));
		let component = Hydrated::new(
			FnComponent::named("Clicker", |_: &Unserializable, _cx: &RenderContext| {
				Ok("<button/>".to_string())
			}),
			"components/Clicker.jsx",
		);

		let err = component.render(&Unserializable, &cx).unwrap_err();
		match err {
			HydrationError::UnserializableProps { component, source } => {
				assert_eq!(component, "Clicker");
				assert!(source.to_string().contains("callbacks"));
			}
			other => panic!("unexpected error: {other:?}"),
		}
		assert!(!registry.has_entries());
	}

	#[rstest]
	fn test_non_string_map_keys_are_unserializable(registry: Arc<HydrationRegistry>) {
		let cx = RenderContext::server(Arc::clone(&registry));
		let component = Hydrated::new(
			FnComponent::named("Grid", |_: &BTreeMap<(u8, u8), u8>, _cx: &RenderContext| {
				Ok("<table/>".to_string())
			}),
			"components/Grid.jsx",
		);

		let props = BTreeMap::from([((0, 0), 1)]);
		let err = component.render(&props, &cx).unwrap_err();
		assert!(matches!(err, HydrationError::UnserializableProps { .. }));
	}
}
