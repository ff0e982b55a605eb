//! Hydration error types.
//!
//! Errors fall into the following groups:
//!
//! - identity errors (`MissingModuleIdentity`, `MissingComponentName`) fail
//!   the render of the page that triggered them
//! - serialization errors (`UnserializableProps`) fail one render site
//! - marker protocol errors (`UnmatchedHydrationMarker`,
//!   `DuplicateHydrationMarker`, `InvalidMarkerId`, `MalformedHydrationMarker`,
//!   `EmptyHydrationTarget`)
//!   fail the rewrite of one page
//! - bundler errors abort the whole pending build pass

use islet_conf::ConfigError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::bundler::BundleError;

/// Result type for hydration operations.
pub type Result<T> = std::result::Result<T, HydrationError>;

/// Which half of a boundary pair a marker is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
	/// Marker preceding the component output.
	Start,
	/// Marker following the component output.
	End,
}

impl fmt::Display for MarkerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Start => write!(f, "start"),
			Self::End => write!(f, "end"),
		}
	}
}

/// Errors raised by the hydration engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HydrationError {
	/// A hydrated component was wrapped without a module identity.
	#[error(
		"could not determine the module of hydrated component `{component}`; \
		 pass the defining module when wrapping it"
	)]
	MissingModuleIdentity {
		/// Display name of the component, or `<anonymous>`.
		component: String,
	},

	/// A hydrated component has no display name.
	#[error("hydrated components must be named (module `{module}`)")]
	MissingComponentName {
		/// Module the component was registered from.
		module: String,
	},

	/// Props of a render site cannot be serialized.
	#[error("props of hydrated component `{component}` cannot be serialized: {source}")]
	UnserializableProps {
		/// Display name of the component.
		component: String,
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},

	/// A start marker without an end marker, or vice versa.
	#[error("unmatched hydration {kind} marker for id {id}")]
	UnmatchedHydrationMarker {
		/// Render-site id carried by the marker.
		id: u64,
		/// Which marker has no partner.
		kind: MarkerKind,
	},

	/// Two markers of the same kind carry the same id.
	#[error("duplicate hydration {kind} marker for id {id}")]
	DuplicateHydrationMarker {
		/// Render-site id carried by both markers.
		id: u64,
		/// Kind of the duplicated marker.
		kind: MarkerKind,
	},

	/// A marker id attribute is not a non-negative integer.
	#[error("invalid hydration marker id `{value}`")]
	InvalidMarkerId {
		/// Attribute value as found in the document.
		value: String,
	},

	/// A start marker lacks an attribute the hydration root needs.
	#[error("hydration start marker for id {id} has no `{attribute}` attribute")]
	MalformedHydrationMarker {
		/// Render-site id carried by the marker.
		id: u64,
		/// Missing attribute.
		attribute: &'static str,
	},

	/// A boundary pair encloses no content.
	#[error("hydrated component with id {id} rendered no content between its markers")]
	EmptyHydrationTarget {
		/// Render-site id of the empty pair.
		id: u64,
	},

	/// A page document could not be rewritten.
	#[error("failed to rewrite page document: {message}")]
	Document {
		/// Description of the failure.
		message: String,
	},

	/// The client bundler failed.
	#[error("bundling of hydrated components failed: {0}")]
	Bundler(#[from] BundleError),

	/// A page was submitted before the page set of the pass was collected.
	#[error("page submitted before the pages of the build pass were collected")]
	PagesNotCollected,

	/// Reading or writing a file failed.
	#[error("I/O error on `{}`: {source}", path.display())]
	Io {
		/// File involved.
		path: PathBuf,
		/// Underlying failure.
		#[source]
		source: std::io::Error,
	},

	/// The source transform rejected a module.
	#[error("failed to compile `{}`: {message}", path.display())]
	ModuleTransform {
		/// Module source path.
		path: PathBuf,
		/// Compiler message.
		message: String,
	},

	/// Invalid plugin configuration.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

impl HydrationError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}

	/// Returns `true` for marker protocol errors, which indicate a corrupted
	/// document rather than a misconfigured component.
	pub fn is_marker_error(&self) -> bool {
		matches!(
			self,
			Self::UnmatchedHydrationMarker { .. }
				| Self::DuplicateHydrationMarker { .. }
				| Self::InvalidMarkerId { .. }
				| Self::MalformedHydrationMarker { .. }
				| Self::EmptyHydrationTarget { .. }
		)
	}
}
