//! The Node Model: an owned, read-only representation of shadow trees.
//!
//! Shadow trees are produced fresh for each render pass (usually by a [`FragmentBuilder`](`crate::surface::FragmentBuilder`))
//! and are never mutated by the [`Reconciler`](`crate::reconcile::Reconciler`).

use core::fmt::{self, Display, Formatter};

/// Attribute holding an element's id.
pub const ID: &str = "id";
/// Attribute holding an element's whitespace-separated class list.
pub const CLASS: &str = "class";
/// Content fingerprint. Equal values on shadow and live node mean the subtree is unchanged.
pub const HASH: &str = "hash";
/// Stable per-instance identity, independent of tree position.
pub const UID: &str = "uid";
/// Boolean removal marker. A shadow node carrying it asks for its live counterpart to be removed.
pub const REMOVED: &str = "NodeRemoved";

/// Tag of the wrapper elements that [`Element::unwrap_text_wrappers`] dissolves.
pub const TEXT_WRAPPER: &str = "text";

/// Tag used for the root of a shadow fragment.
pub const FRAGMENT: &str = "#fragment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub name: String,
	pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	Element(Element),
	Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
	pub tag: String,
	/// Unique by (ASCII-case-insensitive) name. Use [`Element::set_attribute`] to keep it that way.
	pub attributes: Vec<Attribute>,
	pub children: Vec<Node>,
}

impl Node {
	#[must_use]
	pub fn text(content: impl Into<String>) -> Self {
		Self::Text(content.into())
	}

	#[must_use]
	pub fn is_text(&self) -> bool {
		matches!(self, Self::Text(_))
	}

	/// Empty or whitespace-only text.
	#[must_use]
	pub fn is_blank_text(&self) -> bool {
		match self {
			Self::Text(content) => is_blank(content),
			Self::Element(_) => false,
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Self::Element(element) => Some(element),
			Self::Text(_) => None,
		}
	}

	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		self.as_element().map(|element| element.tag.as_str())
	}

	/// Structural equality in the sense of the DOM's [***isEqualNode***](https://developer.mozilla.org/en-US/docs/Web/API/Node/isEqualNode):
	/// Tags compare ASCII-case-insensitively and attribute order is irrelevant.
	#[must_use]
	pub fn structurally_eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Text(t_1), Self::Text(t_2)) => t_1 == t_2,
			(Self::Element(e_1), Self::Element(e_2)) => e_1.structurally_eq(e_2),
			_ => false,
		}
	}

	/// Nesting depth of this subtree, counting this node as 1.
	#[must_use]
	pub fn depth(&self) -> usize {
		match self {
			Self::Text(_) => 1,
			Self::Element(element) => 1 + element.children.iter().map(Self::depth).max().unwrap_or(0),
		}
	}
}

impl From<Element> for Node {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}

impl Element {
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			attributes: Vec::new(),
			children: Vec::new(),
		}
	}

	/// A tagless container, standing in for a [***DocumentFragment***](https://developer.mozilla.org/en-US/docs/Web/API/DocumentFragment).
	#[must_use]
	pub fn fragment(children: impl IntoIterator<Item = Node>) -> Self {
		Self::new(FRAGMENT).with_children(children)
	}

	#[must_use]
	pub fn is_fragment(&self) -> bool {
		self.tag == FRAGMENT
	}

	#[must_use]
	pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.set_attribute(name, value);
		self
	}

	#[must_use]
	pub fn with_child(mut self, child: impl Into<Node>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
		self.children.extend(children);
		self
	}

	#[must_use]
	pub fn with_text(self, content: impl Into<String>) -> Self {
		self.with_child(Node::Text(content.into()))
	}

	/// Sets or overwrites an attribute, keeping names unique.
	pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		match self.attributes.iter_mut().find(|a| a.name.eq_ignore_ascii_case(&name)) {
			Some(existing) => existing.value = value,
			None => self.attributes.push(Attribute { name, value }),
		}
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.iter().find(|a| a.name.eq_ignore_ascii_case(name)).map(|a| a.value.as_str())
	}

	#[must_use]
	pub fn has_attribute(&self, name: &str) -> bool {
		self.attribute(name).is_some()
	}

	/// Whether this shadow node asks for its live counterpart to be removed.
	#[must_use]
	pub fn is_marked_removed(&self) -> bool {
		self.has_attribute(REMOVED)
	}

	#[must_use]
	pub fn tag_is(&self, tag: &str) -> bool {
		self.tag.eq_ignore_ascii_case(tag)
	}

	#[must_use]
	pub fn structurally_eq(&self, other: &Self) -> bool {
		self.tag_is(&other.tag)
			&& self.attributes.len() == other.attributes.len()
			&& self.attributes.iter().all(|a| other.attribute(&a.name) == Some(a.value.as_str()))
			&& self.children.len() == other.children.len()
			&& self.children.iter().zip(&other.children).all(|(c_1, c_2)| c_1.structurally_eq(c_2))
	}

	/// Splices the children of every `<text>` wrapper element into the wrapper's place, recursively.
	pub fn unwrap_text_wrappers(&mut self) {
		let children = core::mem::take(&mut self.children);
		for child in children {
			match child {
				Node::Element(mut element) => {
					element.unwrap_text_wrappers();
					if element.tag_is(TEXT_WRAPPER) {
						self.children.append(&mut element.children);
					} else {
						self.children.push(Node::Element(element));
					}
				}
				text @ Node::Text(_) => self.children.push(text),
			}
		}
	}
}

/// Empty or whitespace-only.
#[must_use]
pub fn is_blank(text: &str) -> bool {
	text.trim().is_empty()
}

/// Serializes to markup. Meant for diagnostics; no escaping is performed.
impl Display for Node {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text(content) => f.write_str(content),
			Self::Element(element) => element.fmt(f),
		}
	}
}

impl Display for Element {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if !self.is_fragment() {
			write!(f, "<{}", self.tag)?;
			for Attribute { name, value } in &self.attributes {
				write!(f, " {}=\"{}\"", name, value)?;
			}
			f.write_str(">")?;
		}
		for child in &self.children {
			child.fmt(f)?;
		}
		if !self.is_fragment() {
			write!(f, "</{}>", self.tag)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn set_attribute_keeps_names_unique() {
		let mut element = Element::new("div").with_attribute("id", "a");
		element.set_attribute("ID", "b");
		assert_eq!(element.attributes.len(), 1);
		assert_eq!(element.attribute("id"), Some("b"));
	}

	#[test]
	fn structural_equality_ignores_attribute_order() {
		let a = Element::new("span").with_attribute("a", "1").with_attribute("b", "2").with_text("Hi");
		let b = Element::new("SPAN").with_attribute("b", "2").with_attribute("a", "1").with_text("Hi");
		assert!(Node::from(a.clone()).structurally_eq(&b.into()));
		assert!(!Node::from(a).structurally_eq(&Element::new("span").with_text("Hi").into()));
	}

	#[test]
	fn blank_text() {
		assert!(Node::text(" \n\t").is_blank_text());
		assert!(Node::text("").is_blank_text());
		assert!(!Node::text(" x ").is_blank_text());
		assert!(!Node::from(Element::new("p")).is_blank_text());
	}

	#[test]
	fn text_wrappers_are_spliced() {
		let mut root = Element::fragment(vec![
			Element::new("text").with_text("a").with_child(Element::new("text").with_text("b")).into(),
			Element::new("p").with_child(Element::new("text").with_text("c")).into(),
		]);
		root.unwrap_text_wrappers();
		assert_eq!(root.to_string(), "ab<p>c</p>");
	}

	#[test]
	fn depth() {
		let tree = Node::from(Element::new("div").with_child(Element::new("p").with_text("x")));
		assert_eq!(tree.depth(), 3);
	}
}
