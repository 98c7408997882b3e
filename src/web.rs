//! [`Surface`] binding for a browser [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document).

use crate::{
	load::load_child_nodes,
	node::{Element, Node},
	surface::{FragmentBuilder, Selector, Surface, SurfaceError},
};
use tracing::{instrument, trace};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, DocumentFragment, NodeList};

/// Operates on live [`web_sys::Node`]s of a single [`Document`].
///
/// Without a document (for example outside of a browser), the surface is unavailable and reconciliation does nothing.
#[derive(Debug, Clone)]
pub struct WebSurface {
	document: Option<Document>,
}

impl Default for WebSurface {
	fn default() -> Self {
		Self::new()
	}
}

impl WebSurface {
	/// Binds to the global window's document, if there is one.
	#[must_use]
	#[instrument]
	pub fn new() -> Self {
		let document = web_sys::window().and_then(|window| window.document());
		if document.is_none() {
			trace!("No document found. The surface is unavailable.");
		}
		Self { document }
	}

	#[must_use]
	pub fn for_document(document: Document) -> Self {
		Self { document: Some(document) }
	}

	#[must_use]
	pub fn document(&self) -> Option<&Document> {
		self.document.as_ref()
	}

	fn require_document(&self) -> Result<&Document, SurfaceError> {
		self.document.as_ref().ok_or(SurfaceError::Unavailable)
	}

	/// Creates a detached live copy of `node`.
	fn build(&self, node: &Node) -> Result<web_sys::Node, SurfaceError> {
		let document = self.require_document()?;
		let element = match node {
			Node::Text(text) => return Ok(document.create_text_node(text).into()),
			Node::Element(element) => element,
		};

		let live: web_sys::Node = if element.is_fragment() {
			document.create_document_fragment().into()
		} else {
			let live = document.create_element(&element.tag).map_err(dom_error)?;
			for attribute in &element.attributes {
				live.set_attribute(&attribute.name, &attribute.value).map_err(dom_error)?;
			}
			live.into()
		};
		for child in &element.children {
			live.append_child(&self.build(child)?).map_err(dom_error)?;
		}
		Ok(live)
	}
}

#[allow(clippy::needless_pass_by_value)]
fn dom_error(error: JsValue) -> SurfaceError {
	SurfaceError::Dom(match error.dyn_ref::<js_sys::Error>() {
		Some(error) => String::from(error.message()),
		None => format!("{:?}", error),
	})
}

fn collect(node_list: &NodeList) -> Vec<web_sys::Node> {
	(0..node_list.length()).filter_map(|i| node_list.item(i)).collect()
}

impl Surface for WebSurface {
	type Node = web_sys::Node;

	fn is_available(&self) -> bool {
		self.document.is_some()
	}

	fn head(&self) -> Option<web_sys::Node> {
		self.document.as_ref()?.head().map(Into::into)
	}

	fn body(&self) -> Option<web_sys::Node> {
		self.document.as_ref()?.body().map(Into::into)
	}

	fn query_selector_all(&self, scope: &web_sys::Node, selector: Selector<'_>) -> Result<Vec<web_sys::Node>, SurfaceError> {
		selector.validate()?;
		let selector = selector.to_string();
		let found = if let Some(element) = scope.dyn_ref::<web_sys::Element>() {
			element.query_selector_all(&selector)
		} else if let Some(fragment) = scope.dyn_ref::<DocumentFragment>() {
			fragment.query_selector_all(&selector)
		} else if let Some(document) = scope.dyn_ref::<Document>() {
			document.query_selector_all(&selector)
		} else {
			return Ok(Vec::new());
		};
		found.map(|node_list| collect(&node_list)).map_err(dom_error)
	}

	/// Defers to the DOM's `isEqualNode`, which also takes comments and other non-element nodes into account.
	fn is_equal_node(&self, live: &web_sys::Node, shadow: &Node) -> bool {
		match self.build(shadow) {
			Ok(shadow) => live.is_equal_node(Some(&shadow)),
			Err(error) => {
				trace!(%error, "Shadow node could not be built for comparison.");
				false
			}
		}
	}

	fn tag_name(&self, node: &web_sys::Node) -> Option<String> {
		node.dyn_ref::<web_sys::Element>().map(web_sys::Element::local_name)
	}

	fn is_text(&self, node: &web_sys::Node) -> bool {
		node.node_type() == web_sys::Node::TEXT_NODE
	}

	fn text(&self, node: &web_sys::Node) -> Option<String> {
		node.dyn_ref::<web_sys::Text>().map(|text| text.data())
	}

	fn get_attribute(&self, node: &web_sys::Node, name: &str) -> Option<String> {
		node.dyn_ref::<web_sys::Element>()?.get_attribute(name)
	}

	fn has_attribute(&self, node: &web_sys::Node, name: &str) -> bool {
		node.dyn_ref::<web_sys::Element>().map_or(false, |element| element.has_attribute(name))
	}

	fn set_attribute(&mut self, node: &web_sys::Node, name: &str, value: &str) -> Result<(), SurfaceError> {
		match node.dyn_ref::<web_sys::Element>() {
			Some(element) => element.set_attribute(name, value).map_err(dom_error),
			None => Err(SurfaceError::Dom(format!("can't set attribute {:?} on a non-element node", name))),
		}
	}

	fn child_nodes(&self, node: &web_sys::Node) -> Vec<web_sys::Node> {
		collect(&node.child_nodes())
	}

	fn parent_node(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn append_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) -> Result<(), SurfaceError> {
		parent.append_child(child).map(drop).map_err(dom_error)
	}

	fn insert_before(&mut self, parent: &web_sys::Node, child: &web_sys::Node, reference: &web_sys::Node) -> Result<(), SurfaceError> {
		if reference.parent_node().as_ref() != Some(parent) {
			return Err(SurfaceError::NotAChild);
		}
		parent.insert_before(child, Some(reference)).map(drop).map_err(dom_error)
	}

	fn replace_node(&mut self, old: &web_sys::Node, new: &web_sys::Node) -> Result<(), SurfaceError> {
		let parent = old.parent_node().ok_or(SurfaceError::Detached)?;
		if old == new {
			return Ok(());
		}
		parent.replace_child(new, old).map(drop).map_err(dom_error)
	}

	fn remove_node(&mut self, node: &web_sys::Node) -> Result<(), SurfaceError> {
		let parent = node.parent_node().ok_or(SurfaceError::Detached)?;
		parent.remove_child(node).map(drop).map_err(dom_error)
	}

	fn create_element(&mut self, tag: &str) -> Result<web_sys::Node, SurfaceError> {
		self.require_document()?.create_element(tag).map(Into::into).map_err(dom_error)
	}

	fn create_text(&mut self, text: &str) -> Result<web_sys::Node, SurfaceError> {
		Ok(self.require_document()?.create_text_node(text).into())
	}

	fn create_fragment(&mut self) -> Result<web_sys::Node, SurfaceError> {
		Ok(self.require_document()?.create_document_fragment().into())
	}
}

impl FragmentBuilder for WebSurface {
	/// Parses `markup` as the content of a detached `<div>` and loads the result.
	#[instrument(skip(self, markup))]
	fn build_fragment(&mut self, markup: &str) -> Result<Element, SurfaceError> {
		let scratch = self.require_document()?.create_element("div").map_err(dom_error)?;
		scratch.set_inner_html(markup);
		let node: &web_sys::Node = scratch.as_ref();
		let mut fragment = Element::fragment(load_child_nodes(&node.child_nodes()));
		fragment.unwrap_text_wrappers();
		Ok(fragment)
	}
}
