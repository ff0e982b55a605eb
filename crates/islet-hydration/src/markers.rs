//! Boundary markers.
//!
//! Every hydrated render site is emitted between a pair of empty `<script>`
//! elements. The start marker carries the render-site id, the component name
//! and the serialized props; the end marker carries the id only.
//!
//! ```text
//! <script data-hydration-start-id="7" data-hydration-component-name="Widget"
//!         data-hydration-props="{&quot;a&quot;:1}"></script>
//! <button>...</button>                         <- component output
//! <script data-hydration-end-id="7"></script>
//! ```
//!
//! The document rewriter later replaces each pair with a hydration root
//! container carrying the same data (see [`crate::rewriter`]).

use serde::{Deserialize, Serialize};

/// Attribute carrying the id on a start marker.
pub const START_ID_ATTR: &str = "data-hydration-start-id";

/// Attribute carrying the id on an end marker.
pub const END_ID_ATTR: &str = "data-hydration-end-id";

/// Attribute carrying the component name (start marker and root container).
pub const COMPONENT_NAME_ATTR: &str = "data-hydration-component-name";

/// Attribute carrying the serialized props (start marker and root container).
pub const PROPS_ATTR: &str = "data-hydration-props";

/// Attribute carrying the id on a materialized hydration root container.
pub const ROOT_ID_ATTR: &str = "data-hydration-root-id";

/// Data recorded for one render site.
///
/// `props` is a snapshot taken when the site is rendered; later changes to the
/// component's props do not affect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationEntry {
	/// Render-site id.
	pub id: u64,
	/// Component name.
	pub component_name: String,
	/// Serialized props.
	pub props: serde_json::Value,
}

impl HydrationEntry {
	/// Creates an entry.
	pub fn new(id: u64, component_name: impl Into<String>, props: serde_json::Value) -> Self {
		Self {
			id,
			component_name: component_name.into(),
			props,
		}
	}

	/// Start marker for this entry.
	pub fn start_marker(&self) -> String {
		encode_start(self.id, &self.component_name, &self.props)
	}

	/// End marker for this entry.
	pub fn end_marker(&self) -> String {
		encode_end(self.id)
	}
}

/// Encodes the start marker of a render site.
///
/// # Example
///
/// ```rust
/// use islet_hydration::markers::encode_start;
///
/// let marker = encode_start(7, "Widget", &serde_json::json!({"a": 1}));
/// assert_eq!(
///     marker,
///     r#"<script data-hydration-start-id="7" data-hydration-component-name="Widget" data-hydration-props="{&quot;a&quot;:1}"></script>"#
/// );
/// ```
pub fn encode_start(id: u64, component_name: &str, props: &serde_json::Value) -> String {
	format!(
		r#"<script {START_ID_ATTR}="{id}" {COMPONENT_NAME_ATTR}="{}" {PROPS_ATTR}="{}"></script>"#,
		escape_attr(component_name),
		escape_attr(&props.to_string()),
	)
}

/// Encodes the end marker of a render site.
pub fn encode_end(id: u64) -> String {
	format!(r#"<script {END_ID_ATTR}="{id}"></script>"#)
}

/// Parses a marker id attribute value.
pub fn parse_marker_id(value: &str) -> Option<u64> {
	let trimmed = value.trim();
	if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	trimmed.parse().ok()
}

/// Returns `true` if `markup` may contain boundary markers.
///
/// A cheap textual pre-check; a `false` result means the document can be
/// passed through without parsing.
pub fn may_contain_markers(markup: &str) -> bool {
	markup.contains(START_ID_ATTR) || markup.contains(END_ID_ATTR)
}

/// Escapes a string for use in a double-quoted HTML attribute value.
pub(crate) fn escape_attr(s: &str) -> String {
	let mut escaped = String::with_capacity(s.len() + 8);
	for ch in s.chars() {
		match ch {
			'&' => escaped.push_str("&amp;"),
			'"' => escaped.push_str("&quot;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			_ => escaped.push(ch),
		}
	}
	escaped
}

/// Escapes text content.
pub(crate) fn escape_text(s: &str) -> String {
	let mut escaped = String::with_capacity(s.len() + 8);
	for ch in s.chars() {
		match ch {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			_ => escaped.push(ch),
		}
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_encode_end() {
		assert_eq!(
			encode_end(42),
			r#"<script data-hydration-end-id="42"></script>"#
		);
	}

	#[rstest]
	fn test_props_cannot_break_out_of_attribute() {
		let props = json!({ "html": "</script><script>alert(\"x\")</script>", "q": "a&b" });
		let marker = encode_start(0, "Evil\"Name", &props);

		assert_eq!(marker.matches("</script>").count(), 1);
		assert!(marker.ends_with("></script>"));
		assert!(!marker.contains("Evil\"Name"));
		assert!(marker.contains("Evil&quot;Name"));
		assert!(marker.contains("a&amp;b"));
	}

	#[rstest]
	fn test_entry_markers_match_free_functions() {
		let entry = HydrationEntry::new(3, "Counter", json!({ "start": 10 }));
		assert_eq!(entry.start_marker(), encode_start(3, "Counter", &json!({ "start": 10 })));
		assert_eq!(entry.end_marker(), encode_end(3));
	}

	#[rstest]
	#[case("0", Some(0))]
	#[case("17", Some(17))]
	#[case(" 5 ", Some(5))]
	#[case("-1", None)]
	#[case("rh-1", None)]
	#[case("", None)]
	#[case("99999999999999999999999", None)]
	fn test_parse_marker_id(#[case] value: &str, #[case] expected: Option<u64>) {
		assert_eq!(parse_marker_id(value), expected);
	}

	#[rstest]
	#[case("<p>plain</p>", false)]
	#[case(r#"<script data-hydration-end-id="1"></script>"#, true)]
	#[case(r#"<div data-hydration-root-id="1"></div>"#, false)]
	fn test_may_contain_markers(#[case] markup: &str, #[case] expected: bool) {
		assert_eq!(may_contain_markers(markup), expected);
	}

	#[rstest]
	fn test_escape_text() {
		assert_eq!(escape_text("a < b & \"c\""), "a &lt; b &amp; \"c\"");
	}
}
