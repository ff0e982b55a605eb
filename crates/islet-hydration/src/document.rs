//! Page documents and asset references.

use crate::markers::{escape_attr, escape_text};
use islet_conf::{PageData, normalize_assets_path};

/// Root-relative URL of a client asset.
///
/// # Examples
///
/// ```rust
/// use islet_hydration::document::asset_src;
///
/// assert_eq!(asset_src("./assets/", "main.js"), "/assets/main.js");
/// assert_eq!(asset_src("", "main.js"), "/main.js");
/// ```
pub fn asset_src(assets_path: &str, asset: &str) -> String {
	let base = normalize_assets_path(assets_path);
	let asset = asset.trim_start_matches('/');
	if base.is_empty() {
		format!("/{asset}")
	} else {
		format!("/{base}/{asset}")
	}
}

/// Wraps rendered body markup in the default page document.
///
/// Title and description fall back from the page to the site values.
pub fn default_document(body: &str, data: &PageData) -> String {
	let title = escape_text(data.title().unwrap_or_default());
	let description = escape_attr(data.description().unwrap_or_default());

	let mut html = String::with_capacity(body.len() + 512);
	html.push_str("<!doctype html>\n");
	html.push_str("<html>\n");
	html.push_str("  <head>\n");
	html.push_str(&format!("    <title>{title}</title>\n"));
	html.push_str(&format!(
		"    <meta name=\"description\" content=\"{description}\">\n"
	));
	html.push_str(
		"    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1, shrink-to-fit=no\">\n",
	);
	html.push_str("  </head>\n");
	html.push_str("  <body>\n");
	html.push_str("    <div id=\"content\">");
	html.push_str(body);
	html.push_str("</div>\n");
	html.push_str("  </body>\n");
	html.push_str("</html>\n");
	html
}

#[cfg(test)]
mod tests {
	use super::*;
	use islet_conf::PageMeta;
	use rstest::rstest;

	#[rstest]
	#[case("/assets/", "main.abc.js", "/assets/main.abc.js")]
	#[case("assets", "/vendor.js", "/assets/vendor.js")]
	#[case("/", "main.js", "/main.js")]
	#[case(".well-known/js/", "main.js", "/.well-known/js/main.js")]
	fn test_asset_src(#[case] base: &str, #[case] asset: &str, #[case] expected: &str) {
		assert_eq!(asset_src(base, asset), expected);
	}

	#[rstest]
	fn test_default_document() {
		let data = PageData {
			page: PageMeta {
				title: Some("Tom & Jerry".into()),
				description: None,
			},
			site: PageMeta {
				title: Some("Site".into()),
				description: Some("All \"about\" cartoons".into()),
			},
			extra: serde_json::Value::Null,
		};
		let html = default_document("<p>hi</p>", &data);

		assert!(html.starts_with("<!doctype html>"));
		assert!(html.contains("<title>Tom &amp; Jerry</title>"));
		assert!(html.contains(r#"content="All &quot;about&quot; cartoons""#));
		assert!(html.contains("name=\"viewport\""));
		assert!(html.contains(r#"<div id="content"><p>hi</p></div>"#));
	}
}
