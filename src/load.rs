//! Loading of live [`web_sys`] nodes into the Node Model.

use crate::node::{Attribute, Element, Node};
use tracing::trace;
use wasm_bindgen::JsCast;
use web_sys::{Attr, NamedNodeMap, NodeList, Text};

/// Element and text children of a node list. Comments and other node types are skipped.
#[must_use]
pub fn load_child_nodes(child_nodes: &NodeList) -> Vec<Node> {
	(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).filter_map(|child| load_node(&child)).collect()
}

#[must_use]
pub fn load_node(node: &web_sys::Node) -> Option<Node> {
	if let Some(element) = node.dyn_ref::<web_sys::Element>() {
		Some(Node::Element(load_element(element)))
	} else if let Some(text) = node.dyn_ref::<Text>() {
		Some(Node::Text(text.data()))
	} else {
		trace!("Skipping unrecognised child node: {:?}", node);
		None
	}
}

#[must_use]
pub fn load_element(element: &web_sys::Element) -> Element {
	let node: &web_sys::Node = element.as_ref();
	Element {
		tag: element.local_name(),
		attributes: load_attributes(&element.attributes()),
		children: load_child_nodes(&node.child_nodes()),
	}
}

#[must_use]
pub fn load_attributes(attributes: &NamedNodeMap) -> Vec<Attribute> {
	(0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| load_attribute(&attribute)).collect()
}

#[must_use]
pub fn load_attribute(attribute: &Attr) -> Attribute {
	Attribute {
		name: attribute.name(),
		value: attribute.value(),
	}
}
