#![doc(html_root_url = "https://docs.rs/dom-reconcile/0.0.1")]
#![warn(clippy::pedantic)]
//! Patches a live DOM subtree in place so that it matches a freshly rendered shadow tree.
//!
//! Matching is single-pass and mostly positional, driven by the reserved `id`, `class`, `hash` and `uid` attributes.
//! See [`reconcile::Reconciler`].

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod identity;
pub mod load;
pub mod memory;
pub mod node;
pub mod placement;
pub mod reconcile;
pub mod surface;
pub mod web;

pub use node::{Element, Node};
pub use reconcile::{PatchError, PatchStats, Reconciler, ReconcilerConfig};
pub use surface::{FragmentBuilder, Selector, Surface, SurfaceError};
