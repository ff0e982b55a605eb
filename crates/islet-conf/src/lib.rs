//! # Islet Conf
//!
//! Configuration for the islet partial hydration plugin.
//!
//! ## Overview
//!
//! Configuration is split in two layers:
//!
//! - [`PluginSettings`]: the serializable subset of the configuration, loadable
//!   from a TOML file (`islet.toml`).
//! - [`PluginOptions`]: the validated, complete configuration including the
//!   programmatic hooks (`post_process`, `compile_config_hook`).
//!
//! Validation happens once, in [`PluginOptionsBuilder::build`]. Any
//! [`ConfigError`] is fatal and is reported before a single page is rendered.
//!
//! ## Example
//!
//! ```rust
//! use islet_conf::PluginOptions;
//!
//! let options = PluginOptions::builder()
//!     .extensions([".jsx", "tsx"])
//!     .assets_path("./static/")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(options.extensions(), ["jsx", "tsx"]);
//! assert_eq!(options.assets_path(), "./static/");
//! ```

pub mod compile;
pub mod error;
pub mod options;
pub mod settings;

pub use compile::{CompileConfig, CompileConfigHook, CompileTarget, ModuleFormat};
pub use error::{ConfigError, ConfigResult};
pub use options::{
	DEFAULT_ASSETS_PATH, DEFAULT_EXTENSIONS, DEFAULT_OUTPUT_DIR, DEFAULT_TARGETS, PageData,
	PageMeta, PluginOptions, PluginOptionsBuilder, PostProcessHook, normalize_assets_path,
	normalize_extension,
};
pub use settings::PluginSettings;
