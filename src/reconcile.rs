use crate::{
	identity::{classify, Identity, SimpleKind},
	node::{Element, Node, HASH},
	placement::PlacementConfig,
	surface::{materialize, materialize_element, FragmentBuilder, Selector, Surface, SurfaceError},
};
use thiserror::Error;
use tracing::{debug, error, instrument, trace, trace_span, warn};

/// Default maximum nesting depth [`Reconciler::patch`] descends into.
pub const DEFAULT_DEPTH_LIMIT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
	pub placement: PlacementConfig,
	/// Number of nesting levels a single [`Reconciler::patch`] call may recurse into.
	pub depth_limit: usize,
}

impl Default for ReconcilerConfig {
	fn default() -> Self {
		Self {
			placement: PlacementConfig::default(),
			depth_limit: DEFAULT_DEPTH_LIMIT,
		}
	}
}

/// Recoverable failures of a patch pass. Mutations applied before the failure are kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
	#[error("depth limit of {limit} reached")]
	DepthLimitReached { limit: usize },
	#[error(transparent)]
	Surface(#[from] SurfaceError),
}

/// What a single [`Reconciler::patch`] call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PatchStats {
	/// Nodes appended or inserted where they were requested.
	pub appended: usize,
	/// Nodes appended to or replaced within their canonical region instead.
	pub relocated: usize,
	pub replaced: usize,
	pub removed: usize,
	/// Live nodes that had attributes copied onto them and their children reconciled.
	pub merged: usize,
	/// Live nodes left alone due to a matching `hash`.
	pub skipped: usize,
}

impl PatchStats {
	/// Whether the live tree was left untouched.
	#[must_use]
	pub fn is_noop(&self) -> bool {
		self.appended == 0 && self.relocated == 0 && self.replaced == 0 && self.removed == 0 && self.merged == 0
	}
}

#[allow(clippy::non_ascii_literal)]
fn redact(value: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		value
	} else {
		"…"
	}
}

/// Patches live subtrees of a [`Surface`] in place so that they match shadow trees.
///
/// # Correct Use
///
/// Only one pass may run against a given live subtree at a time.
/// Each pass runs to completion within the calling turn.
#[derive(Debug)]
pub struct Reconciler<S: Surface> {
	surface: S,
	config: ReconcilerConfig,
}

impl<S: Surface> Reconciler<S> {
	#[must_use]
	pub fn new(surface: S) -> Self {
		Self::with_config(surface, ReconcilerConfig::default())
	}

	#[must_use]
	pub fn with_config(surface: S, config: ReconcilerConfig) -> Self {
		Self { surface, config }
	}

	#[must_use]
	pub fn config(&self) -> &ReconcilerConfig {
		&self.config
	}

	#[must_use]
	pub fn surface(&self) -> &S {
		&self.surface
	}

	pub fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}

	#[must_use]
	pub fn into_surface(self) -> S {
		self.surface
	}

	/// Mutates `live` so that its children match those of `shadow`.
	///
	/// If `only_replace` is set, live nodes matched by `uid` are replaced outright instead of being merged.
	///
	/// Does nothing if the surface is unavailable.
	///
	/// # Errors
	///
	/// [`PatchError::DepthLimitReached`] iff the trees nest deeper than [`ReconcilerConfig::depth_limit`],
	/// and [`PatchError::Surface`] iff the surface reports an error, e.g. for a malformed selector.
	#[instrument(skip(self, shadow))]
	pub fn patch(&mut self, shadow: &Element, live: &S::Node, only_replace: bool) -> Result<PatchStats, PatchError> {
		if !self.surface.is_available() {
			trace!("No live surface available. Skipping patch.");
			return Ok(PatchStats::default());
		}

		let mut stats = PatchStats::default();
		let result = self.patch_level(shadow, live, only_replace, 0, &mut stats);
		match &result {
			Ok(()) => debug!(?stats, "Patched."),
			Err(error) => warn!(?stats, %error, "Patch aborted. Changes so far were kept."),
		}
		result.map(|()| stats)
	}

	/// Builds a shadow fragment from `markup` and [patches](`Reconciler::patch`) `live` with it.
	///
	/// Does nothing if the surface is unavailable.
	///
	/// # Errors
	///
	/// As [`Reconciler::patch`], and iff the markup can't be built.
	#[instrument(skip(self, markup))]
	pub fn patch_markup(&mut self, markup: &str, live: &S::Node, only_replace: bool) -> Result<PatchStats, PatchError>
	where
		S: FragmentBuilder,
	{
		if !self.surface.is_available() {
			trace!("No live surface available. Skipping patch.");
			return Ok(PatchStats::default());
		}

		let fragment = self.surface.build_fragment(markup)?;
		self.patch(&fragment, live, only_replace)
	}

	fn patch_level(&mut self, shadow: &Element, live: &S::Node, only_replace: bool, depth: usize, stats: &mut PatchStats) -> Result<(), PatchError> {
		if depth >= self.config.depth_limit {
			error!("Depth limit reached");
			return Err(PatchError::DepthLimitReached { limit: self.config.depth_limit });
		}

		let live_children = self.surface.child_nodes(live);
		if live_children.is_empty() {
			trace!("Live node is empty. Appending shadow children wholesale.");
			for child in &shadow.children {
				match child {
					Node::Element(element) if element.is_marked_removed() => self.patch_removal(live, element, only_replace, depth, stats)?,
					_ => self.append(live, child, stats)?,
				}
			}
			return Ok(());
		}

		for (n, node) in shadow.children.iter().enumerate() {
			match node {
				Node::Text(text) => {
					let span = trace_span!("Patching text node", n, text = redact(text));
					let _enter = span.enter();
					self.patch_text(live, &live_children, n, node, stats)?;
				}
				Node::Element(element) => {
					let identity = classify(element);
					let span = trace_span!("Patching element", n, tag = %element.tag, ?identity);
					let _enter = span.enter();
					match identity {
						Identity::NoIdentity => {
							let candidates = self.surface.child_nodes(live);
							self.replace_equal_or_append(live, &candidates, node, stats)?;
						}
						Identity::SimpleIdentity { kind: SimpleKind::Id, value } => self.patch_by_id(live, value, node, stats)?,
						Identity::SimpleIdentity { kind: SimpleKind::Class, value } => self.patch_by_class(live, value, node, stats)?,
						Identity::CompoundIdentity { tag, uid, hash } => self.patch_compound(live, element, tag, uid, hash, only_replace, depth, stats)?,
					}
				}
			}
		}
		Ok(())
	}

	/// Blank text is appended. Other text is inserted before the live node at its position, or appended past the end.
	fn patch_text(&mut self, live: &S::Node, live_children: &[S::Node], n: usize, node: &Node, stats: &mut PatchStats) -> Result<(), PatchError> {
		if node.is_blank_text() {
			return self.append(live, node, stats);
		}

		let live_at = match live_children.get(n) {
			None => None,
			Some(live_at) if self.surface.parent_node(live_at).as_ref() == Some(live) => Some(live_at.clone()),
			Some(_) => {
				trace!("Live node at this position moved earlier in this pass. Using the current one instead.");
				self.surface.child_nodes(live).get(n).cloned()
			}
		};
		match live_at {
			None => self.append(live, node, stats),
			Some(live_at) => {
				let new = materialize(&mut self.surface, node)?;
				self.surface.insert_before(live, &new, &live_at)?;
				stats.appended += 1;
				Ok(())
			}
		}
	}

	fn patch_by_id(&mut self, live: &S::Node, id: &str, node: &Node, stats: &mut PatchStats) -> Result<(), PatchError> {
		match self.surface.query_selector(live, Selector::Id(id))? {
			None => self.append(live, node, stats),
			Some(target) => self.replace(&target, node, stats),
		}
	}

	fn patch_by_class(&mut self, live: &S::Node, class: &str, node: &Node, stats: &mut PatchStats) -> Result<(), PatchError> {
		let candidates = self.surface.query_selector_all(live, Selector::Class(class))?;
		if candidates.is_empty() {
			self.append(live, node, stats)
		} else {
			self.replace_equal_or_append(live, &candidates, node, stats)
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn patch_compound(
		&mut self,
		live: &S::Node,
		element: &Element,
		tag: &str,
		uid: &str,
		hash: Option<&str>,
		only_replace: bool,
		depth: usize,
		stats: &mut PatchStats,
	) -> Result<(), PatchError> {
		let mut targets = self.surface.query_selector_all(live, Selector::TagUid { tag, uid })?;
		if targets.is_empty() {
			if let Some(region) = self.config.placement.region_node(&self.surface, tag) {
				trace!("No match in the live node. Looking in the canonical region.");
				targets = self.surface.query_selector_all(&region, Selector::TagUid { tag, uid })?;
			}
		}
		if targets.is_empty() {
			if element.is_marked_removed() {
				trace!("Nothing to remove.");
				return Ok(());
			}
			return self.append_element(live, element, stats);
		}

		for target in targets {
			if self.surface.parent_node(&target).is_none() {
				trace!("Match was detached earlier in this pass.");
				continue;
			}

			if only_replace {
				trace!("Replacing only.");
				self.replace_with_element(&target, element, stats)?;
				break;
			}

			if element.is_marked_removed() {
				self.remove_everywhere(&target, tag, uid, stats)?;
				continue;
			}

			if let Some(hash) = hash {
				if self.surface.get_attribute(&target, HASH).as_deref() == Some(hash) {
					trace!("Hash unchanged. Skipping subtree.");
					stats.skipped += 1;
					continue;
				}
			}

			if element.children.is_empty() {
				self.replace_with_element(&target, element, stats)?;
				continue;
			}

			for child in self.surface.child_nodes(&target) {
				if self.surface.is_blank_text(&child) {
					self.surface.remove_node(&child)?;
				}
			}
			for attribute in &element.attributes {
				self.surface.set_attribute(&target, &attribute.name, &attribute.value)?;
			}
			stats.merged += 1;

			if self.surface.child_nodes(&target).is_empty() {
				trace!("Merged node is empty. Moving shadow children in directly.");
				for child in &element.children {
					self.append(&target, child, stats)?;
				}
			} else {
				self.patch_level(element, &target, only_replace, depth + 1, stats)?;
			}
		}
		Ok(())
	}

	/// Handles a removal-marked shadow element that would otherwise be appended wholesale.
	fn patch_removal(&mut self, live: &S::Node, element: &Element, only_replace: bool, depth: usize, stats: &mut PatchStats) -> Result<(), PatchError> {
		match classify(element) {
			Identity::CompoundIdentity { tag, uid, hash } => self.patch_compound(live, element, tag, uid, hash, only_replace, depth, stats),
			_ => self.append_element(live, element, stats),
		}
	}

	/// Removes `target` from wherever it lives, along with same-`uid` duplicates in canonical regions.
	fn remove_everywhere(&mut self, target: &S::Node, tag: &str, uid: &str, stats: &mut PatchStats) -> Result<(), PatchError> {
		let placement = &self.config.placement;
		let mut regions = Vec::with_capacity(2);
		if placement.is_head_only(tag) || placement.is_deferred(tag) {
			regions.extend(self.surface.head());
		}
		if placement.is_deferred(tag) {
			regions.extend(self.surface.body());
		}

		for region in regions {
			for duplicate in self.surface.query_selector_all(&region, Selector::TagUid { tag, uid })? {
				if &duplicate != target && self.surface.parent_node(&duplicate).is_some() {
					self.surface.remove_node(&duplicate)?;
					stats.removed += 1;
				}
			}
		}

		if self.surface.parent_node(target).is_some() {
			self.surface.remove_node(target)?;
			stats.removed += 1;
		} else {
			trace!("Already detached.");
		}
		Ok(())
	}

	/// Replaces the first of `candidates` that is structurally equal to `node`, or appends `node` to `parent`.
	fn replace_equal_or_append(&mut self, parent: &S::Node, candidates: &[S::Node], node: &Node, stats: &mut PatchStats) -> Result<(), PatchError> {
		match candidates.iter().find(|candidate| self.surface.is_equal_node(candidate, node)) {
			Some(equal) => self.replace(equal, node, stats),
			None => self.append(parent, node, stats),
		}
	}

	fn replace(&mut self, target: &S::Node, node: &Node, stats: &mut PatchStats) -> Result<(), PatchError> {
		let new = materialize(&mut self.surface, node)?;
		self.surface.replace_node(target, &new)?;
		stats.replaced += 1;
		Ok(())
	}

	fn replace_with_element(&mut self, target: &S::Node, element: &Element, stats: &mut PatchStats) -> Result<(), PatchError> {
		let new = materialize_element(&mut self.surface, element)?;
		self.surface.replace_node(target, &new)?;
		stats.replaced += 1;
		Ok(())
	}

	fn append(&mut self, parent: &S::Node, node: &Node, stats: &mut PatchStats) -> Result<(), PatchError> {
		match node {
			Node::Text(_) => {
				let new = materialize(&mut self.surface, node)?;
				self.surface.append_child(parent, &new)?;
				stats.appended += 1;
				Ok(())
			}
			Node::Element(element) => self.append_element(parent, element, stats),
		}
	}

	/// Appends `element` to `parent`, unless it belongs to a canonical region.
	/// Deferred descendants are hoisted into their region separately.
	fn append_element(&mut self, parent: &S::Node, element: &Element, stats: &mut PatchStats) -> Result<(), PatchError> {
		if self.config.placement.region(&element.tag).is_some() {
			let new = materialize_element(&mut self.surface, element)?;
			return self.place_or_append(parent, element, &new, stats);
		}

		if !self.config.placement.has_deferred_descendants(element) {
			let new = materialize_element(&mut self.surface, element)?;
			self.surface.append_child(parent, &new)?;
			stats.appended += 1;
			return Ok(());
		}

		let (rest, hoisted) = self.config.placement.split_deferred(element);
		let new = materialize_element(&mut self.surface, &rest)?;
		self.surface.append_child(parent, &new)?;
		stats.appended += 1;

		for hoisted in hoisted {
			let span = trace_span!("Hoisting deferred node", tag = %hoisted.tag);
			let _enter = span.enter();
			let new = materialize_element(&mut self.surface, hoisted)?;
			self.place_or_append(parent, hoisted, &new, stats)?;
		}
		Ok(())
	}

	fn place_or_append(&mut self, parent: &S::Node, element: &Element, new: &S::Node, stats: &mut PatchStats) -> Result<(), PatchError> {
		if self.config.placement.place(&mut self.surface, element, new)? {
			stats.relocated += 1;
		} else {
			self.surface.append_child(parent, new)?;
			stats.appended += 1;
		}
		Ok(())
	}
}
