//! The declared tree: an immutable description of the desired UI, rebuilt on every render pass.
//!
//! Nodes are only constructed through [`element`] and [`text`], so every [`DeclaredElement`]
//! has unique attribute and event names and no nested fragments.

use crate::event::Handler;
use core::fmt;
use hashbrown::{hash_map::Entry, HashMap};
use std::rc::Rc;
use thiserror::Error;

/// Rejected declared tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclareError {
	#[error("element tag name must not be empty")]
	EmptyTagName,
	#[error("duplicate attribute {name:?} on <{tag}>")]
	DuplicateAttribute { tag: String, name: String },
	#[error("duplicate event binding {name:?} on <{tag}>")]
	DuplicateEvent { tag: String, name: String },
}

pub enum DeclaredNode<E, M> {
	Element(Rc<DeclaredElement<E, M>>),
	Text(Rc<str>),
}

pub struct DeclaredElement<E, M> {
	pub(crate) tag: Rc<str>,
	pub(crate) attributes: HashMap<String, String>,
	pub(crate) events: HashMap<String, Handler<E, M>>,
	pub(crate) children: Vec<DeclaredNode<E, M>>,
}

impl<E, M> DeclaredElement<E, M> {
	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn attributes(&self) -> &HashMap<String, String> {
		&self.attributes
	}

	#[must_use]
	pub fn events(&self) -> &HashMap<String, Handler<E, M>> {
		&self.events
	}

	#[must_use]
	pub fn children(&self) -> &[DeclaredNode<E, M>] {
		&self.children
	}
}

impl<E, M> Clone for DeclaredNode<E, M> {
	fn clone(&self) -> Self {
		match self {
			Self::Element(element) => Self::Element(Rc::clone(element)),
			Self::Text(text) => Self::Text(Rc::clone(text)),
		}
	}
}

impl<E, M> fmt::Debug for DeclaredNode<E, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Element(element) => {
				let mut events: Vec<_> = element.events.keys().collect();
				events.sort_unstable();
				f.debug_struct("Element")
					.field("tag", &element.tag)
					.field("attributes", &element.attributes)
					.field("events", &events)
					.field("children", &element.children)
					.finish()
			}
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
		}
	}
}

/// A text node.
pub fn text<E, M>(content: impl Into<String>) -> DeclaredNode<E, M> {
	DeclaredNode::Text(content.into().into())
}

/// Starts an element declaration. Nothing is validated until [`ElementBuilder::build`].
pub fn element<E, M>(tag: impl Into<String>) -> ElementBuilder<E, M> {
	ElementBuilder {
		tag: tag.into(),
		attributes: Vec::new(),
		events: Vec::new(),
		children: Vec::new(),
	}
}

/// Child content before normalization. Lists and empties are flattened into siblings by [`ElementBuilder::build`].
pub enum Fragment<E, M> {
	Node(DeclaredNode<E, M>),
	List(Vec<Fragment<E, M>>),
	Empty,
}

impl<E, M> Fragment<E, M> {
	fn flatten_into(self, siblings: &mut Vec<DeclaredNode<E, M>>) {
		match self {
			Self::Node(node) => siblings.push(node),
			Self::List(fragments) => {
				for fragment in fragments {
					fragment.flatten_into(siblings)
				}
			}
			Self::Empty => (),
		}
	}
}

impl<E, M> From<DeclaredNode<E, M>> for Fragment<E, M> {
	fn from(node: DeclaredNode<E, M>) -> Self {
		Self::Node(node)
	}
}

impl<E, M> From<Option<DeclaredNode<E, M>>> for Fragment<E, M> {
	fn from(node: Option<DeclaredNode<E, M>>) -> Self {
		node.map_or(Self::Empty, Self::Node)
	}
}

impl<E, M> From<Vec<DeclaredNode<E, M>>> for Fragment<E, M> {
	fn from(nodes: Vec<DeclaredNode<E, M>>) -> Self {
		Self::List(nodes.into_iter().map(Self::Node).collect())
	}
}

pub struct ElementBuilder<E, M> {
	tag: String,
	attributes: Vec<(String, String)>,
	events: Vec<(String, Handler<E, M>)>,
	children: Vec<Fragment<E, M>>,
}

impl<E, M> ElementBuilder<E, M> {
	#[must_use]
	pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.push((name.into(), value.into()));
		self
	}

	#[must_use]
	pub fn on(mut self, name: impl Into<String>, handler: impl 'static + Fn(&E) -> M) -> Self {
		self.events.push((name.into(), Rc::new(handler)));
		self
	}

	/// Binds an already shared handler, e.g. one reused across renders.
	#[must_use]
	pub fn on_shared(mut self, name: impl Into<String>, handler: Handler<E, M>) -> Self {
		self.events.push((name.into(), handler));
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<Fragment<E, M>>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn children(mut self, children: impl IntoIterator<Item = DeclaredNode<E, M>>) -> Self {
		self.children.extend(children.into_iter().map(Fragment::Node));
		self
	}

	/// # Errors
	///
	/// Iff the tag name is empty or an attribute or event name repeats.
	pub fn build(self) -> Result<DeclaredNode<E, M>, DeclareError> {
		let ElementBuilder { tag, attributes: attribute_list, events: event_list, children: fragments } = self;
		if tag.is_empty() {
			return Err(DeclareError::EmptyTagName);
		}

		let mut attributes = HashMap::with_capacity(attribute_list.len());
		for (name, value) in attribute_list {
			match attributes.entry(name) {
				Entry::Occupied(occupied) => {
					return Err(DeclareError::DuplicateAttribute {
						tag,
						name: occupied.key().clone(),
					})
				}
				Entry::Vacant(vacant) => {
					vacant.insert(value);
				}
			}
		}

		let mut events = HashMap::with_capacity(event_list.len());
		for (name, handler) in event_list {
			match events.entry(name) {
				Entry::Occupied(occupied) => {
					return Err(DeclareError::DuplicateEvent {
						tag,
						name: occupied.key().clone(),
					})
				}
				Entry::Vacant(vacant) => {
					vacant.insert(handler);
				}
			}
		}

		let mut children = Vec::with_capacity(fragments.len());
		for fragment in fragments {
			fragment.flatten_into(&mut children)
		}

		Ok(DeclaredNode::Element(Rc::new(DeclaredElement {
			tag: tag.into(),
			attributes,
			events,
			children,
		})))
	}
}
