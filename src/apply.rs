//! Host side of the contract: the mutation primitives a display surface provides, and [`apply`], which drives them from a [`Patch`].

use crate::{
	event::EventCell,
	patch::{Patch, Update},
	rendered::RenderedNode,
};
use tracing::{instrument, trace, trace_span};

/// Mutation primitives of a display surface.
///
/// `Node` is the host's handle to a materialized node. Child positions are indices into the current child list.
/// Every primitive fails with the host's own `Error`.
#[allow(clippy::missing_errors_doc)]
pub trait Host<E> {
	type Node: Clone;
	type Error;

	/// The materialized child of `parent` at `index`.
	///
	/// # Errors
	///
	/// Iff there is no such child or it can't be accessed.
	fn child(&mut self, parent: &Self::Node, index: usize) -> Result<Self::Node, Self::Error>;

	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error>;

	/// Unsets the attribute. This is not the same as setting it to an empty string.
	fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), Self::Error>;

	/// Subscribes `cell` to `name` events on `node`. The host must call [`EventCell::invoke`] on delivery,
	/// not a listener extracted from it, so later swaps take effect.
	fn add_event_listener(&mut self, node: &Self::Node, name: &str, cell: &EventCell<E>) -> Result<(), Self::Error>;

	/// Removing an event that was never registered should be a no-op.
	fn remove_event_listener(&mut self, node: &Self::Node, name: &str) -> Result<(), Self::Error>;

	/// Materializes `subtree` (including its listeners) and inserts it so that it becomes the child at `index`.
	fn insert_child(&mut self, parent: &Self::Node, index: usize, subtree: &RenderedNode<E>) -> Result<(), Self::Error>;

	/// Removes the child at `index`, detaching all listeners in its subtree.
	fn remove_child(&mut self, parent: &Self::Node, index: usize) -> Result<(), Self::Error>;

	/// Like [`Host::remove_child`] followed by [`Host::insert_child`] at the same `index`.
	fn replace_child(&mut self, parent: &Self::Node, index: usize, subtree: &RenderedNode<E>) -> Result<(), Self::Error>;
}

/// Applies `patch` to the child of `parent` at `index`.
///
/// Child patches are applied in index order. [`Patch::Delete`] entries don't advance the child cursor,
/// so each one removes the first trailing old child.
///
/// # Errors
///
/// The first error returned by `host`. The host is then out of sync and should recover from
/// a full replacement (see [`Program::resync`](`crate::dispatch::Program::resync`)).
#[instrument(skip(host, parent, patch))]
pub fn apply<E, H: Host<E>>(host: &mut H, parent: &H::Node, index: usize, patch: &Patch<E>) -> Result<(), H::Error> {
	match patch {
		Patch::Skip => Ok(()),
		Patch::Delete => {
			trace!("Removing child.");
			host.remove_child(parent, index)
		}
		Patch::Replace(subtree) => {
			trace!("Replacing child.");
			host.replace_child(parent, index, subtree)
		}
		Patch::Insert(subtree) => {
			trace!("Inserting child.");
			host.insert_child(parent, index, subtree)
		}
		Patch::Update(update) => {
			let node = host.child(parent, index)?;
			apply_update(host, &node, update)
		}
	}
}

fn apply_update<E, H: Host<E>>(host: &mut H, node: &H::Node, Update { attributes, events, children }: &Update<E>) -> Result<(), H::Error> {
	let span = trace_span!("Updating node", "attributes.len()" = attributes.len(), "events.len()" = events.len(), "children.len()" = children.len());
	let _enter = span.enter();

	for (name, value) in attributes {
		match value {
			Some(value) => host.set_attribute(node, name, value)?,
			None => host.remove_attribute(node, name)?,
		}
	}

	for (name, cell) in events {
		match cell {
			Some(cell) => host.add_event_listener(node, name, cell)?,
			None => host.remove_event_listener(node, name)?,
		}
	}

	let mut cursor = 0;
	for patch in children {
		match patch {
			Patch::Delete => host.remove_child(node, cursor)?,
			patch => {
				apply(host, node, cursor, patch)?;
				cursor += 1;
			}
		}
	}
	Ok(())
}
