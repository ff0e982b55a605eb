//! Plugin configuration
//!
//! This module provides access to islet-conf: validated plugin options,
//! the `islet.toml` settings file and the compile configuration of the
//! server and client builds.
//!
//! ## Example
//!
//! ```rust
//! use islet::conf::{PluginOptions, PluginSettings};
//!
//! let settings = PluginSettings::from_toml_str(r#"assets_path = "/static/""#).unwrap();
//! let options = PluginOptions::builder().settings(settings).build().unwrap();
//! assert_eq!(options.assets_path(), "/static/");
//! ```

// Re-export all islet-conf functionality
pub use islet_conf::*;
