//! The diff engine.
//!
//! Children are matched **by position only**. Moving a child is seen as a change at every index from the
//! move point onward, and prepending is as expensive as rewriting the whole list. There is no key-based matching.

use crate::{
	declared::{DeclaredElement, DeclaredNode},
	event::{EventCell, EventTable, Handler, Listener},
	patch::{AttributeDelta, EventDelta, Patch, Update},
	rendered::{materialize_node, RenderedElement, RenderedNode},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{info, instrument, trace, trace_span};

/// Diffs a rendered tree against a new declaration.
///
/// Returns the patch and the rendered tree that results from applying it. `old` is not modified,
/// though [`EventCell`]s shared with the result have their listener swapped for the newly wrapped handler.
///
/// `wrap` is called once for each raw handler that ends up in a cell, new or reused.
#[instrument(skip_all)]
pub fn diff<E, M, W>(old: &RenderedNode<E>, new: &DeclaredNode<E, M>, wrap: &mut W) -> (Patch<E>, RenderedNode<E>)
where
	W: FnMut(&Handler<E, M>) -> Listener<E>,
{
	let (patch, rendered) = diff_node(old, new, wrap);
	info!("Diff done with {} change(s).", patch.change_count());
	(patch, rendered)
}

fn diff_node<E, M, W>(old: &RenderedNode<E>, new: &DeclaredNode<E, M>, wrap: &mut W) -> (Patch<E>, RenderedNode<E>)
where
	W: FnMut(&Handler<E, M>) -> Listener<E>,
{
	match (old, new) {
		(RenderedNode::Text(t_1), DeclaredNode::Text(t_2)) => {
			let span = if cfg!(feature = "dangerous-logging") {
				trace_span!("Diffing text node", t_1 = &**t_1, t_2 = &**t_2)
			} else {
				trace_span!("Diffing text node")
			};
			let _enter = span.enter();

			if t_1 == t_2 {
				(Patch::Skip, old.clone())
			} else {
				let rendered = RenderedNode::Text(Rc::clone(t_2));
				(Patch::Replace(rendered.clone()), rendered)
			}
		}

		(RenderedNode::Element(e_1), DeclaredNode::Element(e_2)) if e_1.tag == e_2.tag => {
			let span = trace_span!("Diffing element", tag = &*e_1.tag);
			let _enter = span.enter();
			diff_element(old, e_1, e_2, wrap)
		}

		// Mismatching kinds or tags: rebuild without any partial reuse.
		_ => {
			let span = trace_span!("Replace mismatching");
			let _enter = span.enter();
			release_subtree(old);
			let rendered = materialize_node(new, wrap);
			(Patch::Replace(rendered.clone()), rendered)
		}
	}
}

fn diff_element<E, M, W>(old: &RenderedNode<E>, e_1: &RenderedElement<E>, e_2: &DeclaredElement<E, M>, wrap: &mut W) -> (Patch<E>, RenderedNode<E>)
where
	W: FnMut(&Handler<E, M>) -> Listener<E>,
{
	let attributes = diff_attributes(&e_1.attributes, &e_2.attributes);
	let (events, event_table) = diff_events(&e_1.events, &e_2.events, wrap);

	let child_count = e_1.children.len().max(e_2.children.len());
	let mut child_patches = Vec::with_capacity(child_count);
	let mut children = Vec::with_capacity(e_2.children.len());
	for i in 0..child_count {
		match (e_1.children.get(i), e_2.children.get(i)) {
			(Some(c_1), Some(c_2)) => {
				let (patch, rendered) = diff_node(c_1, c_2, wrap);
				child_patches.push(patch);
				children.push(rendered);
			}
			(None, Some(c_2)) => {
				let span = trace_span!("Inserting child", i);
				let _enter = span.enter();
				let rendered = materialize_node(c_2, wrap);
				child_patches.push(Patch::Insert(rendered.clone()));
				children.push(rendered);
			}
			(Some(c_1), None) => {
				trace!(i, "Deleting trailing child.");
				release_subtree(c_1);
				child_patches.push(Patch::Delete);
			}
			(None, None) => unreachable!("index below both child counts"),
		}
	}

	if attributes.is_empty() && events.is_empty() && child_patches.iter().all(Patch::is_skip) {
		trace!("No net change. Collapsing to `Skip`.");
		// Reused cells were already swapped, so the old node is equivalent to the new one.
		return (Patch::Skip, old.clone());
	}

	let rendered = RenderedNode::Element(Rc::new(RenderedElement {
		tag: Rc::clone(&e_1.tag),
		attributes: e_2.attributes.clone(),
		events: event_table,
		children,
	}));
	let patch = Patch::Update(Update {
		attributes,
		events,
		children: child_patches,
	});
	(patch, rendered)
}

/// Exact string comparison, no normalization.
fn diff_attributes(a_1: &HashMap<String, String>, a_2: &HashMap<String, String>) -> AttributeDelta {
	let mut delta = AttributeDelta::new();
	for (name, value) in a_2 {
		if a_1.get(name) != Some(value) {
			if cfg!(feature = "dangerous-logging") {
				trace!(name = name.as_str(), value = value.as_str(), "Setting attribute.");
			} else {
				trace!(name = name.as_str(), "Setting attribute.");
			}
			delta.insert(name.clone(), Some(value.clone()));
		}
	}
	for name in a_1.keys() {
		if !a_2.contains_key(name) {
			trace!(name = name.as_str(), "Removing attribute.");
			delta.insert(name.clone(), None);
		}
	}
	delta
}

fn diff_events<E, M, W>(eb_1: &EventTable<E>, eb_2: &HashMap<String, Handler<E, M>>, wrap: &mut W) -> (EventDelta<E>, EventTable<E>)
where
	W: FnMut(&Handler<E, M>) -> Listener<E>,
{
	let mut delta = EventDelta::new();
	let mut table = EventTable::new();
	for (name, handler) in eb_2 {
		let cell = match eb_1.get(name) {
			Some(cell) => {
				trace!(name = name.as_str(), "Reusing event cell.");
				drop(cell.replace(wrap(handler)));
				cell.clone()
			}
			None => {
				trace!(name = name.as_str(), "Adding event cell.");
				let cell = EventCell::new(wrap(handler));
				delta.insert(name.clone(), Some(cell.clone()));
				cell
			}
		};
		table.insert(name.clone(), cell);
	}
	for (name, cell) in eb_1.iter() {
		if !eb_2.contains_key(name) {
			trace!(name, "Removing event cell.");
			cell.release();
			delta.insert(name.to_owned(), None);
		}
	}
	(delta, table)
}

/// Releases every event cell in a subtree that is going away, so stale host listeners turn inert.
pub(crate) fn release_subtree<E>(node: &RenderedNode<E>) {
	if let RenderedNode::Element(element) = node {
		for (_, cell) in element.events.iter() {
			cell.release()
		}
		for child in &element.children {
			release_subtree(child)
		}
	}
}
