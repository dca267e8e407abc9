//! Browser host over [`web_sys`].
//!
//! [`DomHost`] implements [`Host`] for [`web_sys::Node`]s. Each bound event gets one [`Closure`] that
//! invokes the element's [`EventCell`] and applies whatever patch that produces at the [`Mount`] point.
//!
//! Listener closures are kept per element. Elements are identified through a [`js_sys::WeakMap`],
//! so the map never keeps detached DOM nodes alive.
//!
//! Patches produced by events are queued and applied in dispatch order. An event that fires while
//! the DOM is being patched (e.g. a `load` of an inserted `<iframe>`) is still dispatched right away,
//! but its patch is only applied once the running one is done.
//!
//! Child indices count element and text nodes only. Comments and other node kinds in the DOM are
//! left in place and skipped, like [`load`](`crate::load`) skips them.

use crate::{
	apply::{apply, Host},
	dispatch::Program,
	event::EventCell,
	load::{is_loadable, load_node},
	patch::Patch,
	rendered::RenderedNode,
};
use core::cell::RefCell;
use hashbrown::HashMap;
use js_sys::{Function, WeakMap};
use std::{
	collections::VecDeque,
	rc::{Rc, Weak},
};
use tracing::{error, info, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, Event, Node};

type ListenerClosure = Closure<dyn Fn(Event)>;
type PendingPatches = Rc<RefCell<VecDeque<Patch<Event>>>>;

/// An element with at least one listener closure bound to it.
struct Bound {
	element: Element,
	closures: HashMap<String, ListenerClosure>,
}

impl Bound {
	fn unbind(self) {
		for (name, closure) in self.closures {
			if let Err(error) = self.element.remove_event_listener_with_callback(&name, closure.as_ref().unchecked_ref::<Function>()) {
				error!("Failed to remove event listener {:?}: {:?}", name, error)
			}
		}
	}
}

/// [`Host`] implementation that patches the DOM below one [`Mount`] point.
pub struct DomHost {
	document: Document,
	mount_parent: Node,
	mount_index: usize,
	element_ids: WeakMap,
	next_element_id: u32,
	listeners: HashMap<u32, Bound>,
	pending: PendingPatches,
	this: Weak<RefCell<DomHost>>,
}

impl DomHost {
	fn existing_element_id(&self, element: &Element) -> Option<u32> {
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		self.element_ids.get(element.as_ref()).as_f64().map(|id| id as u32)
	}

	fn element_id(&mut self, element: &Element) -> u32 {
		if let Some(id) = self.existing_element_id(element) {
			return id;
		}
		let id = self.next_element_id;
		self.next_element_id = self.next_element_id.wrapping_add(1);
		self.element_ids.set(element.as_ref(), &JsValue::from(id));
		id
	}

	/// Number of live listener closures.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.listeners.values().map(|bound| bound.closures.len()).sum()
	}

	fn listener_closure(&self, cell: &EventCell<Event>) -> ListenerClosure {
		let cell = cell.clone();
		let pending = Rc::clone(&self.pending);
		let host = self.this.clone();
		Closure::wrap(Box::new(move |event: Event| {
			let span = trace_span!("Delivering DOM event", event_type = event.type_().as_str());
			let _enter = span.enter();

			let patch = cell.invoke(&event);
			if patch.is_skip() {
				return trace!("Nothing to patch.");
			}

			let host = match host.upgrade() {
				Some(host) => host,
				None => return warn!("DOM event delivered after its `DomHost` was dropped. Ignoring the resulting patch."),
			};
			pending.borrow_mut().push_back(patch);
			let mut host = match host.try_borrow_mut() {
				Ok(host) => host,
				Err(_) => return trace!("The DOM is being patched. Deferring the resulting patch."),
			};
			if let Err(error) = host.flush() {
				error!("Failed to apply patch after DOM event: {:?}", error)
			}
		}) as Box<dyn Fn(Event)>)
	}

	/// Applies queued patches in order, including any queued by events that fire meanwhile.
	fn flush(&mut self) -> Result<(), JsValue> {
		let (mount, mount_index) = (self.mount_parent.clone(), self.mount_index);
		loop {
			let next = self.pending.borrow_mut().pop_front();
			match next {
				Some(patch) => apply(self, &mount, mount_index, &patch)?,
				None => return Ok(()),
			}
		}
	}

	#[instrument(skip(self, subtree))]
	fn create(&mut self, subtree: &RenderedNode<Event>) -> Result<Node, JsValue> {
		match subtree {
			RenderedNode::Text(text) => Ok(self.document.create_text_node(text).into()),
			RenderedNode::Element(rendered) => {
				let element = self.document.create_element(rendered.tag())?;
				for (name, value) in rendered.attributes() {
					element.set_attribute(name, value)?;
				}
				let node: Node = element.into();
				for (name, cell) in rendered.events().iter() {
					self.add_event_listener(&node, name, cell)?;
				}
				for child in rendered.children() {
					let child = self.create(child)?;
					node.append_child(&child)?;
				}
				Ok(node)
			}
		}
	}

	fn release_element(&mut self, element: &Element) {
		let id = match self.existing_element_id(element) {
			Some(id) => id,
			None => return,
		};
		if let Some(bound) = self.listeners.remove(&id) {
			bound.unbind()
		}
	}

	/// Drops all listener closures bound in `node`'s subtree.
	fn release_subtree(&mut self, node: &Node) {
		let element = match node.dyn_ref::<Element>() {
			Some(element) => element,
			None => return,
		};
		self.release_element(element);
		match element.query_selector_all("*") {
			Ok(descendants) => {
				for descendant in (0..descendants.length()).filter_map(|i| descendants.item(i)) {
					if let Some(descendant) = descendant.dyn_ref::<Element>() {
						self.release_element(descendant)
					}
				}
			}
			Err(error) => error!("Could not enumerate descendants to release listeners: {:?}", error),
		}
	}
}

/// Detaches every remaining listener, since their closures are invalidated along with the host.
impl Drop for DomHost {
	fn drop(&mut self) {
		for (_, bound) in self.listeners.drain() {
			bound.unbind()
		}
	}
}

/// The `index`th element or text child of `parent`.
fn nth_child(parent: &Node, index: usize) -> Option<Node> {
	let child_nodes = parent.child_nodes();
	(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).filter(is_loadable).nth(index)
}

fn expect_element(node: &Node) -> Result<&Element, JsValue> {
	node.dyn_ref::<Element>().ok_or_else(|| JsValue::from_str("expected an element"))
}

impl Host<Event> for DomHost {
	type Node = Node;
	type Error = JsValue;

	fn child(&mut self, parent: &Node, index: usize) -> Result<Node, JsValue> {
		nth_child(parent, index).ok_or_else(|| JsValue::from_str("expected child beyond the last element or text node"))
	}

	fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), JsValue> {
		expect_element(node)?.set_attribute(name, value)
	}

	fn remove_attribute(&mut self, node: &Node, name: &str) -> Result<(), JsValue> {
		expect_element(node)?.remove_attribute(name)
	}

	fn add_event_listener(&mut self, node: &Node, name: &str, cell: &EventCell<Event>) -> Result<(), JsValue> {
		let element = expect_element(node)?;
		self.remove_event_listener(node, name)?;
		let closure = self.listener_closure(cell);
		element.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
		let id = self.element_id(element);
		self.listeners
			.entry(id)
			.or_insert_with(|| Bound {
				element: element.clone(),
				closures: HashMap::new(),
			})
			.closures
			.insert(name.to_owned(), closure);
		Ok(())
	}

	fn remove_event_listener(&mut self, node: &Node, name: &str) -> Result<(), JsValue> {
		let element = expect_element(node)?;
		let closure = match self.existing_element_id(element).and_then(|id| self.listeners.get_mut(&id)).and_then(|bound| bound.closures.remove(name)) {
			Some(closure) => closure,
			None => {
				trace!(name, "No listener to remove.");
				return Ok(());
			}
		};
		element.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
	}

	fn insert_child(&mut self, parent: &Node, index: usize, subtree: &RenderedNode<Event>) -> Result<(), JsValue> {
		let node = self.create(subtree)?;
		let next_sibling = nth_child(parent, index);
		parent.insert_before(&node, next_sibling.as_ref())?;
		Ok(())
	}

	fn remove_child(&mut self, parent: &Node, index: usize) -> Result<(), JsValue> {
		let node = self.child(parent, index)?;
		self.release_subtree(&node);
		parent.remove_child(&node)?;
		Ok(())
	}

	fn replace_child(&mut self, parent: &Node, index: usize, subtree: &RenderedNode<Event>) -> Result<(), JsValue> {
		let old = self.child(parent, index)?;
		let new = self.create(subtree)?;
		self.release_subtree(&old);
		parent.replace_child(&new, &old)?;
		Ok(())
	}
}

/// A [`Program`]'s location in the DOM: the element or text child of `parent` at `index`.
pub struct Mount {
	host: Rc<RefCell<DomHost>>,
}

impl Mount {
	/// # Errors
	///
	/// Iff `parent` has no owner document.
	pub fn new(parent: &Element, index: usize) -> Result<Self, JsValue> {
		let document = parent.owner_document().ok_or_else(|| JsValue::from_str("no owner document found for mount parent"))?;
		let mount_parent: Node = parent.clone().into();
		Ok(Self {
			host: Rc::new_cyclic(|this| {
				RefCell::new(DomHost {
					document,
					mount_parent,
					mount_index: index,
					element_ids: WeakMap::new(),
					next_element_id: 0,
					listeners: HashMap::new(),
					pending: PendingPatches::default(),
					this: this.clone(),
				})
			}),
		})
	}

	/// Renders `program` and applies the result at this mount point.
	///
	/// # Errors
	///
	/// Iff the DOM rejects a mutation or is being patched already.
	pub fn render<S: 'static, M: 'static>(&self, program: &Program<S, M, Event>) -> Result<(), JsValue> {
		let patch = program.render();
		self.apply(&patch)
	}

	/// Like [`Mount::render`], but reuses DOM content already present at the mount point.
	///
	/// # Errors
	///
	/// Iff the DOM rejects a mutation or is being patched already.
	pub fn hydrate<S: 'static, M: 'static>(&self, program: &Program<S, M, Event>) -> Result<(), JsValue> {
		let existing = {
			let host = self.host.try_borrow().map_err(|_| JsValue::from_str("the DOM is being patched"))?;
			nth_child(&host.mount_parent, host.mount_index).and_then(|node| load_node(&node))
		};
		let patch = match existing {
			Some(existing) => program.hydrate(&existing),
			None => {
				info!("Nothing to hydrate at the mount point. Rendering from scratch.");
				program.render()
			}
		};
		self.apply(&patch)
	}

	/// # Errors
	///
	/// Iff the DOM rejects a mutation or is being patched already.
	#[instrument(skip(self, patch), fields(changes = patch.change_count()))]
	pub fn apply(&self, patch: &Patch<Event>) -> Result<(), JsValue> {
		let mut host = self.host.try_borrow_mut().map_err(|_| JsValue::from_str("the DOM is being patched"))?;
		let (mount, mount_index) = (host.mount_parent.clone(), host.mount_index);
		apply(&mut *host, &mount, mount_index, patch)?;
		host.flush()?;
		info!("Event listener count: {}", host.listener_count());
		Ok(())
	}

	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.host.borrow().listener_count()
	}
}
