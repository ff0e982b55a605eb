//! Page collaborators of the build pass.
//!
//! The coordinator needs two things from the hosting site generator: the
//! set of pages a pass will emit, and access to pages already written so
//! they can be patched once the client bundle exists.

use crate::error::{HydrationError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A page the host will emit during the pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageDescriptor {
	/// Template the page is rendered from.
	pub input_path: PathBuf,
	/// File the page is written to.
	pub output_path: PathBuf,
}

impl PageDescriptor {
	/// Creates a descriptor.
	pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
		Self {
			input_path: input_path.into(),
			output_path: output_path.into(),
		}
	}
}

/// Enumerates the pages of a pass.
pub trait PageEnumerator {
	/// Every page the pass will emit.
	fn all_pages(&self) -> Vec<PageDescriptor>;
}

impl PageEnumerator for Vec<PageDescriptor> {
	fn all_pages(&self) -> Vec<PageDescriptor> {
		self.clone()
	}
}

impl PageEnumerator for [PageDescriptor] {
	fn all_pages(&self) -> Vec<PageDescriptor> {
		self.to_vec()
	}
}

/// Read and write access to emitted pages.
#[async_trait]
pub trait PageStore: Send + Sync {
	/// Reads an emitted page.
	async fn read(&self, path: &Path) -> Result<String>;

	/// Overwrites an emitted page.
	async fn write(&self, path: &Path, contents: &str) -> Result<()>;
}

/// [`PageStore`] over the local file system.
///
/// Relative paths resolve against `root`; absolute paths are used as given.
#[derive(Debug, Clone, Default)]
pub struct FsPageStore {
	root: PathBuf,
}

impl FsPageStore {
	/// Creates a store resolving relative paths against `root`.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	fn resolve(&self, path: &Path) -> PathBuf {
		if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.root.join(path)
		}
	}
}

#[async_trait]
impl PageStore for FsPageStore {
	async fn read(&self, path: &Path) -> Result<String> {
		let path = self.resolve(path);
		tokio::fs::read_to_string(&path)
			.await
			.map_err(|source| HydrationError::io(path, source))
	}

	async fn write(&self, path: &Path, contents: &str) -> Result<()> {
		let path = self.resolve(path);
		tokio::fs::write(&path, contents)
			.await
			.map_err(|source| HydrationError::io(path, source))
	}
}
