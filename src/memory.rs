//! An in-memory [`Surface`], for tests and for hosts without a browser.
//!
//! Nodes live in an arena and are never freed; removed subtrees simply become unreachable.

use crate::{
	node::{Attribute, Element, Node, CLASS, ID, UID},
	surface::{materialize, Selector, Surface, SurfaceError},
};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum Data {
	Element { tag: String, attributes: Vec<Attribute> },
	Text(String),
	Fragment,
}

#[derive(Debug, Clone)]
struct Slot {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

/// A document of the shape `<html><head></head><body></body></html>`.
///
/// Every successful append, insertion, replacement, removal and attribute write counts as one mutation.
#[derive(Debug, Clone)]
pub struct MemorySurface {
	slots: Vec<Slot>,
	document_element: NodeId,
	head: NodeId,
	body: NodeId,
	available: bool,
	mutations: usize,
}

impl Default for MemorySurface {
	fn default() -> Self {
		Self::new()
	}
}

impl MemorySurface {
	#[must_use]
	pub fn new() -> Self {
		let mut this = Self {
			slots: Vec::new(),
			document_element: NodeId(0),
			head: NodeId(0),
			body: NodeId(0),
			available: true,
			mutations: 0,
		};
		this.document_element = this.alloc_element("html");
		this.head = this.alloc_element("head");
		this.body = this.alloc_element("body");
		this.attach(this.document_element, this.head, None);
		this.attach(this.document_element, this.body, None);
		this
	}

	/// A surface that reports itself as unavailable, as in headless execution.
	#[must_use]
	pub fn headless() -> Self {
		Self { available: false, ..Self::new() }
	}

	#[must_use]
	pub fn document_element(&self) -> NodeId {
		self.document_element
	}

	#[must_use]
	pub fn head_element(&self) -> NodeId {
		self.head
	}

	#[must_use]
	pub fn body_element(&self) -> NodeId {
		self.body
	}

	#[must_use]
	pub fn mutations(&self) -> usize {
		self.mutations
	}

	pub fn reset_mutations(&mut self) {
		self.mutations = 0;
	}

	/// Materializes `node` and appends it to `parent` verbatim, bypassing placement rules.
	///
	/// # Errors
	///
	/// Iff `parent` can't hold children.
	pub fn mount(&mut self, parent: NodeId, node: &Node) -> Result<NodeId, SurfaceError> {
		let live = materialize(self, node)?;
		self.append_child(&parent, &live)?;
		Ok(live)
	}

	/// Copies the live subtree at `id` into the Node Model.
	#[must_use]
	pub fn snapshot(&self, id: NodeId) -> Node {
		let slot = &self.slots[id.0];
		match &slot.data {
			Data::Text(text) => Node::Text(text.clone()),
			Data::Element { tag, attributes } => Node::Element(Element {
				tag: tag.clone(),
				attributes: attributes.clone(),
				children: slot.children.iter().map(|&child| self.snapshot(child)).collect(),
			}),
			Data::Fragment => Node::Element(Element::fragment(slot.children.iter().map(|&child| self.snapshot(child)))),
		}
	}

	/// Markup of the live subtree at `id`, for assertions and diagnostics.
	#[must_use]
	pub fn markup(&self, id: NodeId) -> String {
		self.snapshot(id).to_string()
	}

	/// Markup of the children of `id`.
	#[must_use]
	pub fn inner_markup(&self, id: NodeId) -> String {
		self.slots[id.0].children.iter().map(|&child| self.markup(child)).collect()
	}

	fn alloc(&mut self, data: Data) -> NodeId {
		self.slots.push(Slot {
			data,
			parent: None,
			children: Vec::new(),
		});
		NodeId(self.slots.len() - 1)
	}

	fn alloc_element(&mut self, tag: &str) -> NodeId {
		self.alloc(Data::Element {
			tag: tag.to_owned(),
			attributes: Vec::new(),
		})
	}

	fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
		loop {
			if node == ancestor {
				return true;
			}
			match self.slots[node.0].parent {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.slots[node.0].parent.take() {
			self.slots[parent.0].children.retain(|&child| child != node);
		}
	}

	/// Inserts `child` (or a fragment's children) into `parent` at `index`, or at the end.
	fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
		let moved = match self.slots[child.0].data {
			Data::Fragment => core::mem::take(&mut self.slots[child.0].children),
			_ => {
				self.detach(child);
				vec![child]
			}
		};
		for &node in &moved {
			self.slots[node.0].parent = Some(parent);
		}
		let children = &mut self.slots[parent.0].children;
		let index = index.map_or(children.len(), |index| index.min(children.len()));
		for (offset, node) in moved.into_iter().enumerate() {
			children.insert(index + offset, node);
		}
	}

	fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
		if matches!(self.slots[parent.0].data, Data::Text(_)) {
			return Err(SurfaceError::Dom("HierarchyRequestError: text nodes can't have children".to_owned()));
		}
		if self.is_ancestor_or_self(child, parent) {
			return Err(SurfaceError::Dom("HierarchyRequestError: the new child is an ancestor of the parent".to_owned()));
		}
		Ok(())
	}

	fn descendants(&self, scope: NodeId, found: &mut Vec<NodeId>) {
		for &child in &self.slots[scope.0].children {
			found.push(child);
			self.descendants(child, found);
		}
	}

	fn matches(&self, node: NodeId, selector: Selector<'_>) -> bool {
		let (tag, attributes) = match &self.slots[node.0].data {
			Data::Element { tag, attributes } => (tag, attributes),
			_ => return false,
		};
		match selector {
			Selector::Tag(t) => tag.eq_ignore_ascii_case(t),
			Selector::Id(id) => attribute(attributes, ID) == Some(id),
			Selector::Class(_) => {
				let classes = attribute(attributes, CLASS).unwrap_or("");
				selector.class_names().all(|class| classes.split_ascii_whitespace().any(|c| c == class))
			}
			Selector::TagUid { tag: t, uid } => tag.eq_ignore_ascii_case(t) && attribute(attributes, UID) == Some(uid),
		}
	}
}

fn attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
	attributes.iter().find(|a| a.name.eq_ignore_ascii_case(name)).map(|a| a.value.as_str())
}

impl Surface for MemorySurface {
	type Node = NodeId;

	fn is_available(&self) -> bool {
		self.available
	}

	fn head(&self) -> Option<NodeId> {
		Some(self.head)
	}

	fn body(&self) -> Option<NodeId> {
		Some(self.body)
	}

	fn query_selector_all(&self, scope: &NodeId, selector: Selector<'_>) -> Result<Vec<NodeId>, SurfaceError> {
		selector.validate()?;
		let mut descendants = Vec::new();
		self.descendants(*scope, &mut descendants);
		descendants.retain(|&node| self.matches(node, selector));
		Ok(descendants)
	}

	fn is_equal_node(&self, live: &NodeId, shadow: &Node) -> bool {
		self.snapshot(*live).structurally_eq(shadow)
	}

	fn tag_name(&self, node: &NodeId) -> Option<String> {
		match &self.slots[node.0].data {
			Data::Element { tag, .. } => Some(tag.clone()),
			_ => None,
		}
	}

	fn is_text(&self, node: &NodeId) -> bool {
		matches!(self.slots[node.0].data, Data::Text(_))
	}

	fn text(&self, node: &NodeId) -> Option<String> {
		match &self.slots[node.0].data {
			Data::Text(text) => Some(text.clone()),
			_ => None,
		}
	}

	fn get_attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		match &self.slots[node.0].data {
			Data::Element { attributes, .. } => attribute(attributes, name).map(str::to_owned),
			_ => None,
		}
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), SurfaceError> {
		match &mut self.slots[node.0].data {
			Data::Element { attributes, .. } => {
				match attributes.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
					Some(existing) => existing.value = value.to_owned(),
					None => attributes.push(Attribute {
						name: name.to_owned(),
						value: value.to_owned(),
					}),
				}
				self.mutations += 1;
				Ok(())
			}
			_ => Err(SurfaceError::Dom(format!("can't set attribute {:?} on a non-element node", name))),
		}
	}

	fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
		self.slots[node.0].children.clone()
	}

	fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
		self.slots[node.0].parent
	}

	fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), SurfaceError> {
		self.check_insertion(*parent, *child)?;
		trace!(?parent, ?child, "append_child");
		self.attach(*parent, *child, None);
		self.mutations += 1;
		Ok(())
	}

	fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: &NodeId) -> Result<(), SurfaceError> {
		if self.slots[reference.0].parent != Some(*parent) {
			return Err(SurfaceError::NotAChild);
		}
		self.check_insertion(*parent, *child)?;
		if child == reference {
			return Ok(());
		}
		trace!(?parent, ?child, ?reference, "insert_before");
		self.detach(*child);
		let index = self.slots[parent.0].children.iter().position(|c| c == reference);
		self.attach(*parent, *child, index);
		self.mutations += 1;
		Ok(())
	}

	fn replace_node(&mut self, old: &NodeId, new: &NodeId) -> Result<(), SurfaceError> {
		let parent = self.slots[old.0].parent.ok_or(SurfaceError::Detached)?;
		if old == new {
			return Ok(());
		}
		self.check_insertion(parent, *new)?;
		trace!(?old, ?new, "replace_node");
		self.detach(*new);
		let index = self.slots[parent.0].children.iter().position(|c| c == old);
		self.detach(*old);
		self.attach(parent, *new, index);
		self.mutations += 1;
		Ok(())
	}

	fn remove_node(&mut self, node: &NodeId) -> Result<(), SurfaceError> {
		if self.slots[node.0].parent.is_none() {
			return Err(SurfaceError::Detached);
		}
		trace!(?node, "remove_node");
		self.detach(*node);
		self.mutations += 1;
		Ok(())
	}

	fn create_element(&mut self, tag: &str) -> Result<NodeId, SurfaceError> {
		if !self.available {
			return Err(SurfaceError::Unavailable);
		}
		if tag.is_empty() || tag.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
			return Err(SurfaceError::Dom(format!("InvalidCharacterError: {:?} is not a valid tag name", tag)));
		}
		Ok(self.alloc_element(tag))
	}

	fn create_text(&mut self, text: &str) -> Result<NodeId, SurfaceError> {
		if !self.available {
			return Err(SurfaceError::Unavailable);
		}
		Ok(self.alloc(Data::Text(text.to_owned())))
	}

	fn create_fragment(&mut self) -> Result<NodeId, SurfaceError> {
		if !self.available {
			return Err(SurfaceError::Unavailable);
		}
		Ok(self.alloc(Data::Fragment))
	}
}
