//! Reads existing DOM content back into declared nodes, e.g. server-rendered markup to [hydrate](`crate::dispatch::Program::hydrate`) against.
//!
//! Loaded elements carry no event bindings. Comments and other non-element, non-text nodes are skipped.
//! [`DomHost`](`crate::web::DomHost`) skips the same node kinds when it resolves child indices,
//! so positions in a loaded tree line up with the DOM they were read from.

use crate::declared::{DeclaredElement, DeclaredNode};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{instrument, warn};
use wasm_bindgen::JsCast;
use web_sys::{Attr, Element, NamedNodeMap, Node, NodeList, Text};

#[must_use]
#[instrument(skip_all, fields(length = child_nodes.length()))]
pub fn load_child_nodes<E, M>(child_nodes: &NodeList) -> Vec<DeclaredNode<E, M>> {
	(0..child_nodes.length())
		.filter_map(|i| child_nodes.item(i))
		.filter_map(|child| load_node(&child))
		.collect()
}

/// Whether `node` is of a kind the declared tree can express, i.e. an element or text.
#[must_use]
pub fn is_loadable(node: &Node) -> bool {
	node.dyn_ref::<Element>().is_some() || node.dyn_ref::<Text>().is_some()
}

/// [`None`] for node kinds the declared tree can't express.
#[must_use]
pub fn load_node<E, M>(node: &Node) -> Option<DeclaredNode<E, M>> {
	if let Some(element) = node.dyn_ref::<Element>() {
		Some(load_element(element))
	} else if let Some(text) = node.dyn_ref::<Text>() {
		Some(DeclaredNode::Text(text.data().into()))
	} else {
		warn!("Skipping unsupported node type {} while loading.", node.node_type());
		None
	}
}

/// Tag names are read as [***localName***](https://developer.mozilla.org/en-US/docs/Web/API/Element/localName),
/// so HTML elements come back lower-case like they are usually declared.
#[must_use]
pub fn load_element<E, M>(element: &Element) -> DeclaredNode<E, M> {
	let node: &Node = element.as_ref();
	DeclaredNode::Element(Rc::new(DeclaredElement {
		tag: element.local_name().into(),
		attributes: load_attributes(&element.attributes()),
		events: HashMap::new(),
		children: load_child_nodes(&node.child_nodes()),
	}))
}

#[must_use]
pub fn load_attributes(attributes: &NamedNodeMap) -> HashMap<String, String> {
	(0..attributes.length())
		.filter_map(|i| attributes.item(i))
		.map(|attribute| load_attribute(&attribute))
		.collect()
}

#[must_use]
pub fn load_attribute(attribute: &Attr) -> (String, String) {
	(attribute.name(), attribute.value())
}
