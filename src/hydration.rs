//! Partial hydration engine
//!
//! This module provides access to islet-hydration.
//!
//! ## Architecture
//!
//! - **Render Adapter**: [`Hydrated`] records render sites and emits boundary markers
//! - **Document Rewriter**: materializes markers into hydration roots and
//!   injects the client bundle references
//! - **Build-Pass Coordinator**: bundles once every page of a pass is rendered

// Re-export all islet-hydration functionality
pub use islet_hydration::*;
