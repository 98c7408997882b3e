//! Relocation of head-only and deferred nodes to their canonical region.

use crate::{
	node::{Element, Node, UID},
	surface::{Selector, Surface, SurfaceError},
};
use hashbrown::HashSet;
use tracing::{instrument, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
	Head,
	Body,
}

/// Which tags are forced into which [`Region`]. Tag names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementConfig {
	head_only: HashSet<String>,
	deferred: HashSet<String>,
}

impl Default for PlacementConfig {
	fn default() -> Self {
		Self::new(["meta", "link", "title", "base"], ["script"])
	}
}

impl PlacementConfig {
	#[must_use]
	pub fn new<H, D>(head_only: H, deferred: D) -> Self
	where
		H: IntoIterator,
		H::Item: AsRef<str>,
		D: IntoIterator,
		D::Item: AsRef<str>,
	{
		Self {
			head_only: head_only.into_iter().map(|tag| tag.as_ref().to_ascii_lowercase()).collect(),
			deferred: deferred.into_iter().map(|tag| tag.as_ref().to_ascii_lowercase()).collect(),
		}
	}

	/// No relocation at all.
	#[must_use]
	pub fn none() -> Self {
		Self {
			head_only: HashSet::new(),
			deferred: HashSet::new(),
		}
	}

	#[must_use]
	pub fn is_head_only(&self, tag: &str) -> bool {
		self.head_only.contains(tag.to_ascii_lowercase().as_str())
	}

	#[must_use]
	pub fn is_deferred(&self, tag: &str) -> bool {
		self.deferred.contains(tag.to_ascii_lowercase().as_str())
	}

	/// Head-only tags go to [`Region::Head`], deferred ones to [`Region::Body`].
	#[must_use]
	pub fn region(&self, tag: &str) -> Option<Region> {
		if self.is_head_only(tag) {
			Some(Region::Head)
		} else if self.is_deferred(tag) {
			Some(Region::Body)
		} else {
			None
		}
	}

	/// The live node of `tag`'s canonical region, if it has one and the surface provides it.
	#[must_use]
	pub fn region_node<S: Surface + ?Sized>(&self, surface: &S, tag: &str) -> Option<S::Node> {
		match self.region(tag)? {
			Region::Head => surface.head(),
			Region::Body => surface.body(),
		}
	}

	/// Inserts `live`, the materialized form of `shadow`, into its canonical region instead of wherever it was headed.
	///
	/// An existing node in that region with the same tag and `uid` is replaced in place, which keeps script order stable
	/// and avoids duplicates across repeated passes. Otherwise `live` is appended to the region.
	///
	/// Returns whether the insertion was handled. If not, the caller should insert `live` itself.
	///
	/// # Errors
	///
	/// Iff a surface call fails.
	#[instrument(skip(self, surface, shadow, live), fields(tag = %shadow.tag))]
	pub fn place<S: Surface + ?Sized>(&self, surface: &mut S, shadow: &Element, live: &S::Node) -> Result<bool, SurfaceError> {
		if self.region(&shadow.tag).is_none() {
			return Ok(false);
		}
		let region_node = match self.region_node(surface, &shadow.tag) {
			Some(region_node) => region_node,
			None => {
				warn!("Canonical region for <{}> not found. Inserting in place.", shadow.tag);
				return Ok(false);
			}
		};

		let existing = match shadow.attribute(UID) {
			Some(uid) => surface.query_selector(&region_node, Selector::TagUid { tag: &shadow.tag, uid })?,
			None => None,
		};
		match existing {
			Some(existing) => {
				trace!("Replacing existing node in canonical region.");
				surface.replace_node(&existing, live)?;
			}
			None => {
				trace!("Appending to canonical region.");
				surface.append_child(&region_node, live)?;
			}
		}
		Ok(true)
	}

	/// Whether any strict descendant of `element` belongs to the deferred category.
	#[must_use]
	pub fn has_deferred_descendants(&self, element: &Element) -> bool {
		element.children.iter().any(|child| match child {
			Node::Element(child) => self.is_deferred(&child.tag) || self.has_deferred_descendants(child),
			Node::Text(_) => false,
		})
	}

	/// Clones `element` without its deferred descendants, which are returned separately in tree order.
	#[must_use]
	pub fn split_deferred<'a>(&self, element: &'a Element) -> (Element, Vec<&'a Element>) {
		let mut hoisted = Vec::new();
		let rest = self.split_deferred_into(element, &mut hoisted);
		(rest, hoisted)
	}

	fn split_deferred_into<'a>(&self, element: &'a Element, hoisted: &mut Vec<&'a Element>) -> Element {
		let mut rest = Element {
			tag: element.tag.clone(),
			attributes: element.attributes.clone(),
			children: Vec::with_capacity(element.children.len()),
		};
		for child in &element.children {
			match child {
				Node::Element(child) if self.is_deferred(&child.tag) => hoisted.push(child),
				Node::Element(child) => rest.children.push(Node::Element(self.split_deferred_into(child, hoisted))),
				Node::Text(text) => rest.children.push(Node::Text(text.clone())),
			}
		}
		rest
	}
}
