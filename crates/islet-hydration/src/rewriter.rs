//! Document rewriting.
//!
//! Two independent rewrites are applied to emitted pages:
//!
//! - [`materialize_markers`] turns every boundary pair into a hydration root
//!   container holding the nodes rendered between the markers
//! - [`insert_bundle_scripts`] appends references to the client bundle to the
//!   document body
//!
//! ```text
//! <script data-hydration-start-id="7" ..></script>      <div style="display:contents"
//! <button>1</button>                              =>         data-hydration-root-id="7" ..>
//! <script data-hydration-end-id="7"></script>             <button>1</button>
//!                                                       </div>
//! ```
//!
//! Both rewrites validate the whole document before touching it; on error
//! the caller's markup is left as it was.

use crate::bundler::ScriptKind;
use crate::document::asset_src;
use crate::error::{HydrationError, MarkerKind, Result};
use crate::markers::{
	COMPONENT_NAME_ATTR, END_ID_ATTR, PROPS_ATTR, ROOT_ID_ATTR, START_ID_ATTR, escape_attr,
	may_contain_markers, parse_marker_id,
};
use indexmap::IndexMap;
use scraper::{Html, Node};
use std::collections::HashSet;

/// Replaces every boundary pair in `markup` with a hydration root container.
///
/// Markers are paired by id. The nodes strictly between a start marker and
/// its end marker, which must be a following sibling, are moved into a
/// `<div style="display:contents">` that takes the start marker's place and
/// carries its id, component name and props. Both markers are removed.
///
/// Markup without markers is returned unchanged.
///
/// # Errors
///
/// - [`HydrationError::InvalidMarkerId`] if a marker id is not a non-negative integer
/// - [`HydrationError::MalformedHydrationMarker`] if a start marker lacks its
///   component name or props
/// - [`HydrationError::DuplicateHydrationMarker`] if two markers of one kind share an id
/// - [`HydrationError::UnmatchedHydrationMarker`] if a marker has no partner
/// - [`HydrationError::EmptyHydrationTarget`] if a pair encloses no content
///
/// # Example
///
/// ```rust
/// use islet_hydration::markers::{encode_end, encode_start};
/// use islet_hydration::rewriter::materialize_markers;
///
/// let page = format!(
///     "<html><body>{}<button>1</button>{}</body></html>",
///     encode_start(7, "Widget", &serde_json::json!({"a": 1})),
///     encode_end(7),
/// );
/// let html = materialize_markers(&page).unwrap();
///
/// assert!(html.contains(r#"data-hydration-root-id="7""#));
/// assert!(!html.contains("data-hydration-start-id"));
/// ```
pub fn materialize_markers(markup: &str) -> Result<String> {
	if !may_contain_markers(markup) {
		return Ok(markup.to_string());
	}

	let mut document = Html::parse_document(markup);

	let mut starts = IndexMap::new();
	let mut ends = IndexMap::new();
	for node in document.tree.root().descendants() {
		let Some(element) = node.value().as_element() else {
			continue;
		};
		if let Some(value) = element.attr(START_ID_ATTR) {
			let id = marker_id(value)?;
			let name = element
				.attr(COMPONENT_NAME_ATTR)
				.filter(|name| !name.trim().is_empty())
				.ok_or(HydrationError::MalformedHydrationMarker {
					id,
					attribute: COMPONENT_NAME_ATTR,
				})?;
			let props = element
				.attr(PROPS_ATTR)
				.ok_or(HydrationError::MalformedHydrationMarker {
					id,
					attribute: PROPS_ATTR,
				})?;
			if starts
				.insert(id, (node.id(), name.to_string(), props.to_string()))
				.is_some()
			{
				return Err(HydrationError::DuplicateHydrationMarker {
					id,
					kind: MarkerKind::Start,
				});
			}
		} else if let Some(value) = element.attr(END_ID_ATTR) {
			let id = marker_id(value)?;
			if ends.insert(id, node.id()).is_some() {
				return Err(HydrationError::DuplicateHydrationMarker {
					id,
					kind: MarkerKind::End,
				});
			}
		}
	}

	if starts.is_empty() && ends.is_empty() {
		return Ok(markup.to_string());
	}

	if let Some(&id) = ends.keys().find(|id| !starts.contains_key(*id)) {
		return Err(HydrationError::UnmatchedHydrationMarker {
			id,
			kind: MarkerKind::End,
		});
	}
	if let Some(&id) = starts.keys().find(|id| !ends.contains_key(*id)) {
		return Err(HydrationError::UnmatchedHydrationMarker {
			id,
			kind: MarkerKind::Start,
		});
	}

	let mut count = 0usize;
	for (&id, (start, name, props)) in &starts {
		let end = ends[&id];

		let mut enclosed = Vec::new();
		let mut has_content = false;
		let mut reached_end = false;
		let mut cursor = document.tree.get(*start).and_then(|node| node.next_sibling());
		while let Some(node) = cursor {
			if node.id() == end {
				reached_end = true;
				break;
			}
			has_content |= is_content(node.value());
			enclosed.push(node.id());
			cursor = node.next_sibling();
		}

		if !reached_end {
			return Err(HydrationError::UnmatchedHydrationMarker {
				id,
				kind: MarkerKind::Start,
			});
		}
		if !has_content {
			return Err(HydrationError::EmptyHydrationTarget { id });
		}

		let container = element_node(
			&format!(
				r#"<div style="display:contents" {ROOT_ID_ATTR}="{id}" {COMPONENT_NAME_ATTR}="{}" {PROPS_ATTR}="{}"></div>"#,
				escape_attr(name),
				escape_attr(props),
			),
			"div",
		)?;
		let container = document.tree.orphan(container).id();

		if let Some(mut marker) = document.tree.get_mut(*start) {
			marker.insert_id_before(container);
		}
		if let Some(mut root) = document.tree.get_mut(container) {
			for node in enclosed {
				root.append_id(node);
			}
		}
		for marker in [*start, end] {
			if let Some(mut marker) = document.tree.get_mut(marker) {
				marker.detach();
			}
		}
		count += 1;
	}

	tracing::debug!(count, "materialized hydration roots");

	Ok(document.html())
}

/// Appends one `<script src>` per asset to the document body.
///
/// Sources are rooted at `assets_path` (see [`asset_src`]) and module
/// assets get `type="module"`. Assets already referenced by the document
/// are skipped, so applying the same asset list twice leaves the document
/// as after the first application.
///
/// # Example
///
/// ```rust
/// use islet_hydration::ScriptKind;
/// use islet_hydration::rewriter::insert_bundle_scripts;
///
/// let assets = vec!["hydrated-components.js".to_string()];
/// let page = "<html><body><p>hi</p></body></html>";
/// let once = insert_bundle_scripts(page, &assets, "/assets/", ScriptKind::Classic).unwrap();
/// assert!(once.contains(r#"<script src="/assets/hydrated-components.js"></script>"#));
///
/// let twice = insert_bundle_scripts(&once, &assets, "/assets/", ScriptKind::Classic).unwrap();
/// assert_eq!(once, twice);
/// ```
pub fn insert_bundle_scripts(
	markup: &str,
	assets: &[String],
	assets_path: &str,
	kind: ScriptKind,
) -> Result<String> {
	if assets.is_empty() {
		return Ok(markup.to_string());
	}

	let mut document = Html::parse_document(markup);

	let mut referenced: HashSet<String> = document
		.tree
		.root()
		.descendants()
		.filter_map(|node| node.value().as_element())
		.filter(|element| element.name() == "script")
		.filter_map(|element| element.attr("src"))
		.map(str::to_string)
		.collect();

	let body = document
		.tree
		.root()
		.descendants()
		.find(|node| {
			node.value()
				.as_element()
				.is_some_and(|element| element.name() == "body")
		})
		.map(|node| node.id())
		.ok_or_else(|| HydrationError::Document {
			message: "document has no body".to_string(),
		})?;

	let mut inserted = 0usize;
	for asset in assets {
		let src = asset_src(assets_path, asset);
		if referenced.contains(&src) {
			continue;
		}
		let tag = match kind {
			ScriptKind::Classic => format!(r#"<script src="{}"></script>"#, escape_attr(&src)),
			ScriptKind::Module => {
				format!(r#"<script type="module" src="{}"></script>"#, escape_attr(&src))
			}
		};
		let script = element_node(&tag, "script")?;
		let script = document.tree.orphan(script).id();
		if let Some(mut body) = document.tree.get_mut(body) {
			body.append_id(script);
		}
		referenced.insert(src);
		inserted += 1;
	}

	if inserted == 0 {
		return Ok(markup.to_string());
	}
	Ok(document.html())
}

fn marker_id(value: &str) -> Result<u64> {
	parse_marker_id(value).ok_or_else(|| HydrationError::InvalidMarkerId {
		value: value.to_string(),
	})
}

fn is_content(node: &Node) -> bool {
	match node {
		Node::Element(_) => true,
		Node::Text(text) => !text.trim().is_empty(),
		_ => false,
	}
}

/// Parses `markup` as a fragment and returns a detached copy of its first
/// `tag` element.
fn element_node(markup: &str, tag: &str) -> Result<Node> {
	let fragment = Html::parse_fragment(markup);
	fragment
		.tree
		.root()
		.descendants()
		.find_map(|node| match node.value() {
			Node::Element(element) if element.name() == tag => Some(Node::Element(element.clone())),
			_ => None,
		})
		.ok_or_else(|| HydrationError::Document {
			message: format!("failed to build `<{tag}>` element"),
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::markers::{encode_end, encode_start};
	use rstest::rstest;
	use scraper::Selector;
	use serde_json::json;

	#[derive(Debug, PartialEq)]
	struct Root {
		id: String,
		name: String,
		props: String,
		inner: String,
	}

	fn roots(html: &str) -> Vec<Root> {
		let document = Html::parse_document(html);
		let selector = Selector::parse("[data-hydration-root-id]").unwrap();
		document
			.select(&selector)
			.map(|element| Root {
				id: element.value().attr(ROOT_ID_ATTR).unwrap().to_string(),
				name: element.value().attr(COMPONENT_NAME_ATTR).unwrap().to_string(),
				props: element.value().attr(PROPS_ATTR).unwrap().to_string(),
				inner: element.inner_html(),
			})
			.collect()
	}

	fn page(body: &str) -> String {
		format!("<!doctype html><html><head><title>t</title></head><body>{body}</body></html>")
	}

	#[rstest]
	fn test_pair_becomes_single_root() {
		let input = page(&format!(
			"<main>{}<button>1</button><span>x</span>{}</main>",
			encode_start(7, "Widget", &json!({ "a": 1 })),
			encode_end(7)
		));

		let output = materialize_markers(&input).unwrap();

		assert_eq!(
			roots(&output),
			vec![Root {
				id: "7".into(),
				name: "Widget".into(),
				props: r#"{"a":1}"#.into(),
				inner: "<button>1</button><span>x</span>".into(),
			}]
		);
		assert!(!output.contains(START_ID_ATTR));
		assert!(!output.contains(END_ID_ATTR));
		assert!(output.contains("display:contents"));
	}

	#[rstest]
	fn test_second_application_is_noop() {
		let input = page(&format!(
			"{}<p>hello</p>{}",
			encode_start(0, "Greeting", &json!({})),
			encode_end(0)
		));
		let once = materialize_markers(&input).unwrap();
		let twice = materialize_markers(&once).unwrap();
		assert_eq!(once, twice);
	}

	#[rstest]
	#[case("<p>no islands here</p>")]
	#[case("<p>text mentioning data-hydration-start-id without markers</p>")]
	fn test_marker_free_page_is_unchanged(#[case] body: &str) {
		let input = page(body);
		assert_eq!(materialize_markers(&input).unwrap(), input);
	}

	#[rstest]
	fn test_end_without_start_fails() {
		let input = page(&format!("<p>x</p>{}", encode_end(5)));
		let err = materialize_markers(&input).unwrap_err();
		assert!(matches!(
			err,
			HydrationError::UnmatchedHydrationMarker {
				id: 5,
				kind: MarkerKind::End
			}
		));
	}

	#[rstest]
	fn test_start_without_end_fails() {
		let input = page(&format!(
			"{}<p>x</p>",
			encode_start(2, "Widget", &json!({}))
		));
		let err = materialize_markers(&input).unwrap_err();
		assert!(matches!(
			err,
			HydrationError::UnmatchedHydrationMarker {
				id: 2,
				kind: MarkerKind::Start
			}
		));
	}

	#[rstest]
	#[case("")]
	#[case("   \n  ")]
	#[case("<!-- nothing -->")]
	fn test_empty_target_fails(#[case] between: &str) {
		let input = page(&format!(
			"{}{between}{}",
			encode_start(3, "Empty", &json!({})),
			encode_end(3)
		));
		let err = materialize_markers(&input).unwrap_err();
		assert!(matches!(err, HydrationError::EmptyHydrationTarget { id: 3 }));
	}

	#[rstest]
	fn test_text_only_content_is_accepted() {
		let input = page(&format!(
			"{}plain text{}",
			encode_start(0, "Text", &json!({})),
			encode_end(0)
		));
		let output = materialize_markers(&input).unwrap();
		assert_eq!(roots(&output)[0].inner, "plain text");
	}

	#[rstest]
	fn test_duplicate_start_fails() {
		let input = page(&format!(
			"{}<p>a</p>{}{}<p>b</p>{}",
			encode_start(1, "A", &json!({})),
			encode_end(1),
			encode_start(1, "A", &json!({})),
			encode_end(2)
		));
		let err = materialize_markers(&input).unwrap_err();
		assert!(matches!(
			err,
			HydrationError::DuplicateHydrationMarker {
				id: 1,
				kind: MarkerKind::Start
			}
		));
	}

	#[rstest]
	fn test_invalid_marker_id_fails() {
		let input = page(r#"<script data-hydration-end-id="rh-1"></script>"#);
		let err = materialize_markers(&input).unwrap_err();
		assert!(matches!(err, HydrationError::InvalidMarkerId { ref value } if value == "rh-1"));
	}

	#[rstest]
	fn test_end_marker_outside_start_parent_is_unmatched() {
		let input = page(&format!(
			"<div>{}<p>a</p></div>{}",
			encode_start(0, "A", &json!({})),
			encode_end(0)
		));
		let err = materialize_markers(&input).unwrap_err();
		assert!(matches!(err, HydrationError::UnmatchedHydrationMarker { id: 0, .. }));
	}

	#[rstest]
	fn test_nested_pairs() {
		let inner = format!(
			"{}<b>inner</b>{}",
			encode_start(1, "Child", &json!({ "n": 2 })),
			encode_end(1)
		);
		let input = page(&format!(
			"{}<section>{inner}</section>{}",
			encode_start(0, "Parent", &json!({})),
			encode_end(0)
		));

		let output = materialize_markers(&input).unwrap();
		let found = roots(&output);

		assert_eq!(found.len(), 2);
		assert_eq!(found[0].id, "0");
		assert_eq!(found[0].name, "Parent");
		assert!(found[0].inner.starts_with("<section>"));
		assert!(found[0].inner.contains(r#"data-hydration-root-id="1""#));
		assert_eq!(found[1].id, "1");
		assert_eq!(found[1].inner, "<b>inner</b>");
	}

	#[rstest]
	fn test_nested_sibling_pairs() {
		let input = page(&format!(
			"{}<h1>t</h1>{}<i>c</i>{}{}",
			encode_start(0, "Outer", &json!({})),
			encode_start(1, "Inner", &json!({})),
			encode_end(1),
			encode_end(0)
		));

		let output = materialize_markers(&input).unwrap();
		let found = roots(&output);

		assert_eq!(found.len(), 2);
		assert!(found[0].inner.starts_with("<h1>t</h1>"));
		assert_eq!(found[1].inner, "<i>c</i>");
	}

	#[rstest]
	fn test_props_survive_materialization() {
		let props = json!({ "label": "Tom & \"Jerry\"", "html": "</div><script>x</script>" });
		let input = page(&format!(
			"{}<p>x</p>{}",
			encode_start(0, "Quote", &props),
			encode_end(0)
		));
		let output = materialize_markers(&input).unwrap();
		let found = roots(&output);
		let parsed: serde_json::Value = serde_json::from_str(&found[0].props).unwrap();
		assert_eq!(parsed, props);
	}

	#[rstest]
	fn test_insert_bundle_scripts_appends_to_body() {
		let assets = vec!["a.js".to_string(), "b.js".to_string()];
		let output = insert_bundle_scripts(&page("<p>x</p>"), &assets, "./assets/", ScriptKind::Classic).unwrap();

		let document = Html::parse_document(&output);
		let selector = Selector::parse("body > script").unwrap();
		let srcs: Vec<&str> = document
			.select(&selector)
			.filter_map(|e| e.value().attr("src"))
			.collect();
		assert_eq!(srcs, ["/assets/a.js", "/assets/b.js"]);
	}

	#[rstest]
	fn test_insert_bundle_scripts_is_idempotent() {
		let assets = vec!["a.js".to_string()];
		let once =
			insert_bundle_scripts(&page("<p>x</p>"), &assets, "/assets/", ScriptKind::Classic).unwrap();
		let twice = insert_bundle_scripts(&once, &assets, "/assets/", ScriptKind::Classic).unwrap();
		assert_eq!(once, twice);
		assert_eq!(twice.matches(r#"src="/assets/a.js""#).count(), 1);
	}

	#[rstest]
	fn test_insert_bundle_scripts_without_assets() {
		let input = page("<p>x</p>");
		assert_eq!(
			insert_bundle_scripts(&input, &[], "/assets/", ScriptKind::Module).unwrap(),
			input
		);
	}

	#[rstest]
	fn test_module_assets_load_as_modules() {
		let assets = vec!["entry.js".to_string()];
		let once =
			insert_bundle_scripts(&page("<p>x</p>"), &assets, "/assets/", ScriptKind::Module).unwrap();

		let document = Html::parse_document(&once);
		let selector = Selector::parse("body > script").unwrap();
		let scripts: Vec<_> = document.select(&selector).collect();
		assert_eq!(scripts.len(), 1);
		assert_eq!(scripts[0].value().attr("type"), Some("module"));
		assert_eq!(scripts[0].value().attr("src"), Some("/assets/entry.js"));

		let twice = insert_bundle_scripts(&once, &assets, "/assets/", ScriptKind::Module).unwrap();
		assert_eq!(once, twice);
	}

	#[rstest]
	#[case(r#"<script data-hydration-start-id="0" data-hydration-props="{}"></script>"#, COMPONENT_NAME_ATTR)]
	#[case(
		r#"<script data-hydration-start-id="0" data-hydration-component-name=" " data-hydration-props="{}"></script>"#,
		COMPONENT_NAME_ATTR
	)]
	#[case(
		r#"<script data-hydration-start-id="0" data-hydration-component-name="Widget"></script>"#,
		PROPS_ATTR
	)]
	fn test_start_marker_missing_attribute_fails(#[case] start: &str, #[case] missing: &str) {
		let input = page(&format!("{start}<p>x</p>{}", encode_end(0)));
		let err = materialize_markers(&input).unwrap_err();
		assert!(matches!(
			err,
			HydrationError::MalformedHydrationMarker { id: 0, attribute } if attribute == missing
		));
		assert!(err.is_marker_error());
	}
}
