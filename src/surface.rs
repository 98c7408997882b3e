//! The capability set the reconciler needs from a real display surface.
//!
//! Live nodes are opaque handles owned by the surface. All mutation goes through [`Surface`].

use crate::node::{Element, Node};
use core::fmt::{self, Debug, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
	#[error("no live display surface is available")]
	Unavailable,
	#[error("malformed selector {selector:?}: {reason}")]
	InvalidSelector { selector: String, reason: &'static str },
	#[error("the reference node is not a child of the given parent")]
	NotAChild,
	#[error("the node has no parent")]
	Detached,
	#[error("unsupported by this surface: {0}")]
	Unsupported(&'static str),
	#[error("DOM exception: {0}")]
	Dom(String),
}

/// Selector-like query criteria. Queries always match descendants, never the scope node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
	Tag(&'a str),
	Id(&'a str),
	/// One or more whitespace-separated class names, all of which must be present.
	Class(&'a str),
	TagUid { tag: &'a str, uid: &'a str },
}

impl<'a> Selector<'a> {
	/// Rejects selectors that can't match anything meaningful.
	///
	/// # Errors
	///
	/// Iff the selector is malformed.
	pub fn validate(&self) -> Result<(), SurfaceError> {
		let invalid = |reason| {
			Err(SurfaceError::InvalidSelector {
				selector: self.to_string(),
				reason,
			})
		};
		match *self {
			Selector::Tag(tag) | Selector::TagUid { tag, .. } if !is_valid_tag(tag) => invalid("tag names must be non-empty and consist of ASCII letters, digits and '-'"),
			Selector::Id(id) if id.is_empty() => invalid("empty id"),
			Selector::Class(class) if class.trim().is_empty() => invalid("empty class list"),
			_ => Ok(()),
		}
	}

	/// Class names of a [`Selector::Class`], otherwise empty.
	pub fn class_names(&self) -> impl Iterator<Item = &'a str> {
		let class = match *self {
			Selector::Class(class) => class,
			_ => "",
		};
		class.split_ascii_whitespace()
	}
}

fn is_valid_tag(tag: &str) -> bool {
	!tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Renders as a CSS selector, quoting values as CSS strings.
impl Display for Selector<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		fn quoted(f: &mut Formatter<'_>, value: &str) -> fmt::Result {
			f.write_str("\"")?;
			for c in value.chars() {
				match c {
					'"' | '\\' => write!(f, "\\{}", c)?,
					'\n' => f.write_str("\\a ")?,
					c => write!(f, "{}", c)?,
				}
			}
			f.write_str("\"")
		}

		match *self {
			Selector::Tag(tag) => f.write_str(tag),
			Selector::Id(id) => {
				f.write_str("[id=")?;
				quoted(f, id)?;
				f.write_str("]")
			}
			Selector::Class(_) => {
				for class in self.class_names() {
					f.write_str("[class~=")?;
					quoted(f, class)?;
					f.write_str("]")?;
				}
				Ok(())
			}
			Selector::TagUid { tag, uid } => {
				write!(f, "{}[uid=", tag.to_ascii_lowercase())?;
				quoted(f, uid)?;
				f.write_str("]")
			}
		}
	}
}

/// A live display surface, e.g. a browser document.
///
/// "Not found" outcomes are `None` or empty, never errors.
/// Implementations must only report [`Err`] for contract violations and host failures.
pub trait Surface {
	/// An opaque, cheaply clonable handle to a live node. Equality is identity.
	type Node: Clone + PartialEq + Debug;

	/// `false` for headless execution, in which case the reconciler does nothing.
	fn is_available(&self) -> bool {
		true
	}

	/// The document's `<head>`, if any.
	fn head(&self) -> Option<Self::Node>;

	/// The document's `<body>`, if any.
	fn body(&self) -> Option<Self::Node>;

	/// First matching descendant of `scope` in tree order.
	///
	/// # Errors
	///
	/// Iff `selector` is malformed or the host fails.
	fn query_selector(&self, scope: &Self::Node, selector: Selector<'_>) -> Result<Option<Self::Node>, SurfaceError> {
		Ok(self.query_selector_all(scope, selector)?.into_iter().next())
	}

	/// All matching descendants of `scope` in tree order.
	///
	/// # Errors
	///
	/// Iff `selector` is malformed or the host fails.
	fn query_selector_all(&self, scope: &Self::Node, selector: Selector<'_>) -> Result<Vec<Self::Node>, SurfaceError>;

	/// Structural equality between a live node and a shadow node.
	fn is_equal_node(&self, live: &Self::Node, shadow: &Node) -> bool;

	/// `None` for non-element nodes.
	fn tag_name(&self, node: &Self::Node) -> Option<String>;

	fn is_text(&self, node: &Self::Node) -> bool;

	/// `None` for non-text nodes.
	fn text(&self, node: &Self::Node) -> Option<String>;

	/// Whether `node` is a text node that is empty or whitespace-only.
	fn is_blank_text(&self, node: &Self::Node) -> bool {
		self.text(node).map_or(false, |text| crate::node::is_blank(&text))
	}

	fn get_attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

	fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
		self.get_attribute(node, name).is_some()
	}

	/// # Errors
	///
	/// Iff `node` isn't an element or the host rejects the attribute.
	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<(), SurfaceError>;

	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Moves `child` to the end of `parent`'s children.
	/// Appending a fragment moves the fragment's children instead.
	///
	/// # Errors
	///
	/// Iff the host rejects the insertion.
	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), SurfaceError>;

	/// # Errors
	///
	/// [`SurfaceError::NotAChild`] iff `reference` isn't a child of `parent`.
	fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: &Self::Node) -> Result<(), SurfaceError>;

	/// Puts `new` in the place of `old` via `old`'s parent.
	///
	/// # Errors
	///
	/// [`SurfaceError::Detached`] iff `old` has no parent.
	fn replace_node(&mut self, old: &Self::Node, new: &Self::Node) -> Result<(), SurfaceError>;

	/// Removes `node` from its current parent.
	///
	/// # Errors
	///
	/// [`SurfaceError::Detached`] iff `node` has no parent.
	fn remove_node(&mut self, node: &Self::Node) -> Result<(), SurfaceError>;

	/// # Errors
	///
	/// Iff the host rejects the tag name.
	fn create_element(&mut self, tag: &str) -> Result<Self::Node, SurfaceError>;

	/// # Errors
	///
	/// Iff the surface is unavailable.
	fn create_text(&mut self, text: &str) -> Result<Self::Node, SurfaceError>;

	/// # Errors
	///
	/// Iff the surface is unavailable.
	fn create_fragment(&mut self) -> Result<Self::Node, SurfaceError>;
}

/// Turns a markup string into a shadow fragment.
pub trait FragmentBuilder {
	/// The returned root is a [fragment](`Element::fragment`).
	///
	/// # Errors
	///
	/// Iff the surface is unavailable or can't parse markup.
	fn build_fragment(&mut self, markup: &str) -> Result<Element, SurfaceError>;
}

/// Creates a detached live copy of `node`. Fragment roots become live fragments.
///
/// # Errors
///
/// Iff any of the underlying surface calls fail.
pub fn materialize<S: Surface + ?Sized>(surface: &mut S, node: &Node) -> Result<S::Node, SurfaceError> {
	match node {
		Node::Text(text) => surface.create_text(text),
		Node::Element(element) => materialize_element(surface, element),
	}
}

/// See [`materialize`].
///
/// # Errors
///
/// Iff any of the underlying surface calls fail.
pub fn materialize_element<S: Surface + ?Sized>(surface: &mut S, element: &Element) -> Result<S::Node, SurfaceError> {
	let live = if element.is_fragment() {
		surface.create_fragment()?
	} else {
		let live = surface.create_element(&element.tag)?;
		for attribute in &element.attributes {
			surface.set_attribute(&live, &attribute.name, &attribute.value)?;
		}
		live
	};
	for child in &element.children {
		let child = materialize(surface, child)?;
		surface.append_child(&live, &child)?;
	}
	Ok(live)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn selector_css() {
		assert_eq!(Selector::TagUid { tag: "META", uid: "a\"b" }.to_string(), r#"meta[uid="a\"b"]"#);
		assert_eq!(Selector::Class("x  y").to_string(), r#"[class~="x"][class~="y"]"#);
		assert_eq!(Selector::Id("main").to_string(), r#"[id="main"]"#);
	}

	#[test]
	fn malformed_selectors() {
		assert!(matches!(Selector::Id("").validate(), Err(SurfaceError::InvalidSelector { .. })));
		assert!(matches!(Selector::Class(" ").validate(), Err(SurfaceError::InvalidSelector { .. })));
		assert!(matches!(Selector::TagUid { tag: "di v", uid: "1" }.validate(), Err(SurfaceError::InvalidSelector { .. })));
		assert_eq!(Selector::TagUid { tag: "my-el", uid: "" }.validate(), Ok(()));
	}
}
