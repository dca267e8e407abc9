//! The rendered tree: what was last materialized, used as the baseline for the next diff.
//!
//! Rendered nodes are never mutated. Each diff step returns a new node that shares unchanged
//! subtrees with the old one. The one exception is the content of [`EventCell`]s, which is swapped
//! so host subscriptions survive.

use crate::{
	declared::DeclaredNode,
	event::{EventCell, EventTable, Handler, Listener},
};
use core::fmt;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{instrument, trace_span};

pub enum RenderedNode<E> {
	Element(Rc<RenderedElement<E>>),
	Text(Rc<str>),
}

pub struct RenderedElement<E> {
	pub(crate) tag: Rc<str>,
	pub(crate) attributes: HashMap<String, String>,
	pub(crate) events: EventTable<E>,
	pub(crate) children: Vec<RenderedNode<E>>,
}

impl<E> RenderedElement<E> {
	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn attributes(&self) -> &HashMap<String, String> {
		&self.attributes
	}

	#[must_use]
	pub fn events(&self) -> &EventTable<E> {
		&self.events
	}

	#[must_use]
	pub fn children(&self) -> &[RenderedNode<E>] {
		&self.children
	}
}

impl<E> RenderedNode<E> {
	#[must_use]
	pub fn as_element(&self) -> Option<&RenderedElement<E>> {
		match self {
			Self::Element(element) => Some(element),
			Self::Text(_) => None,
		}
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Element(_) => None,
			Self::Text(text) => Some(text),
		}
	}

	/// Whether both values are the same allocation, i.e. one was reused for the other.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Element(a), Self::Element(b)) => Rc::ptr_eq(a, b),
			(Self::Text(a), Self::Text(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}

	/// Number of nodes in this subtree, including `self`.
	#[must_use]
	pub fn node_count(&self) -> usize {
		match self {
			Self::Element(element) => 1 + element.children.iter().map(Self::node_count).sum::<usize>(),
			Self::Text(_) => 1,
		}
	}
}

impl<E> Clone for RenderedNode<E> {
	fn clone(&self) -> Self {
		match self {
			Self::Element(element) => Self::Element(Rc::clone(element)),
			Self::Text(text) => Self::Text(Rc::clone(text)),
		}
	}
}

/// Structural equality: tag, attributes, registered event names and children. Listener contents are not compared.
impl<E> PartialEq for RenderedNode<E> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Element(a), Self::Element(b)) => Rc::ptr_eq(a, b) || (a.tag == b.tag && a.attributes == b.attributes && a.events == b.events && a.children == b.children),
			(Self::Text(a), Self::Text(b)) => a == b,
			_ => false,
		}
	}
}

impl<E> fmt::Debug for RenderedNode<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Element(element) => f
				.debug_struct("RenderedElement")
				.field("tag", &element.tag)
				.field("attributes", &element.attributes)
				.field("events", &element.events)
				.field("children", &element.children)
				.finish(),
			Self::Text(text) => f.debug_tuple("RenderedText").field(text).finish(),
		}
	}
}

/// Builds a fresh rendered subtree for `node`, allocating a new [`EventCell`] per event binding.
///
/// `wrap` is applied to every raw handler. Host-side attachment is left to the host
/// (see [`Host::insert_child`](`crate::apply::Host::insert_child`)).
#[instrument(skip_all)]
pub fn materialize<E, M, W>(node: &DeclaredNode<E, M>, wrap: &mut W) -> RenderedNode<E>
where
	W: FnMut(&Handler<E, M>) -> Listener<E>,
{
	materialize_node(node, wrap)
}

pub(crate) fn materialize_node<E, M, W>(node: &DeclaredNode<E, M>, wrap: &mut W) -> RenderedNode<E>
where
	W: FnMut(&Handler<E, M>) -> Listener<E>,
{
	match node {
		DeclaredNode::Text(text) => RenderedNode::Text(Rc::clone(text)),
		DeclaredNode::Element(element) => {
			let span = trace_span!("Materializing element", tag = &*element.tag, "children.len()" = element.children.len());
			let _enter = span.enter();

			let mut events = EventTable::new();
			for (name, handler) in &element.events {
				events.insert(name.clone(), EventCell::new(wrap(handler)));
			}

			RenderedNode::Element(Rc::new(RenderedElement {
				tag: Rc::clone(&element.tag),
				attributes: element.attributes.clone(),
				events,
				children: element.children.iter().map(|child| materialize_node(child, wrap)).collect(),
			}))
		}
	}
}
