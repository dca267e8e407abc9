//! Event cells and the per-element registration table.
//!
//! A rendered element never holds user handlers directly. It holds one [`EventCell`] per event name,
//! and each cell holds the current *wrapped* [`Listener`]. Diffing an element that persists swaps the
//! listener inside the cell, so whatever the host subscribed to the cell keeps working.

use crate::patch::Patch;
use core::{cell::RefCell, fmt};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

/// A raw user handler: turns a host event payload into a user message.
pub type Handler<E, M> = Rc<dyn Fn(&E) -> M>;

/// A wrapped handler as stored in an [`EventCell`]. Invoking it produces the patch for the follow-up render.
pub type Listener<E> = Rc<dyn Fn(&E) -> Patch<E>>;

/// Reassignable single-slot holder for one event's current [`Listener`].
///
/// Clones share the slot. Equality is identity.
pub struct EventCell<E>(Rc<RefCell<Option<Listener<E>>>>);

impl<E> EventCell<E> {
	#[must_use]
	pub fn new(listener: Listener<E>) -> Self {
		Self(Rc::new(RefCell::new(Some(listener))))
	}

	/// Swaps in `listener` and returns the previous one, if the cell wasn't released.
	pub fn replace(&self, listener: Listener<E>) -> Option<Listener<E>> {
		self.0.replace(Some(listener))
	}

	/// Drops the current listener. Later invocations produce [`Patch::Skip`].
	pub fn release(&self) {
		trace!("Releasing event cell listener.");
		drop(self.0.take());
	}

	#[must_use]
	pub fn is_released(&self) -> bool {
		self.0.borrow().is_none()
	}

	/// Calls the *current* listener.
	///
	/// The listener is cloned out of the slot first, so it may itself cause this cell to be reassigned.
	pub fn invoke(&self, payload: &E) -> Patch<E> {
		let listener = self.0.borrow().clone();
		match listener {
			Some(listener) => listener(payload),
			None => {
				trace!("Invoked released event cell.");
				Patch::Skip
			}
		}
	}

	#[must_use]
	pub fn same_cell(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// A stable address for the lifetime of this cell, usable as a map key by hosts.
	#[must_use]
	pub fn key(&self) -> usize {
		Rc::as_ptr(&self.0) as *const () as usize
	}
}

impl<E> Clone for EventCell<E> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<E> PartialEq for EventCell<E> {
	fn eq(&self, other: &Self) -> bool {
		self.same_cell(other)
	}
}

impl<E> fmt::Debug for EventCell<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("EventCell").field(&format_args!("{:#x}", self.key())).finish()
	}
}

/// Event name to [`EventCell`] map of one rendered element.
///
/// Compares by registered event *names*, which is the structural view hosts care about.
pub struct EventTable<E>(HashMap<String, EventCell<E>>);

impl<E> EventTable<E> {
	#[must_use]
	pub fn new() -> Self {
		Self(HashMap::new())
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&EventCell<E>> {
		self.0.get(name)
	}

	pub fn insert(&mut self, name: String, cell: EventCell<E>) -> Option<EventCell<E>> {
		self.0.insert(name, cell)
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &EventCell<E>)> {
		self.0.iter().map(|(name, cell)| (name.as_str(), cell))
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}
}

impl<E> Default for EventTable<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E> Clone for EventTable<E> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<E> PartialEq for EventTable<E> {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.names().all(|name| other.contains(name))
	}
}

impl<E> fmt::Debug for EventTable<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.names().collect();
		names.sort_unstable();
		f.debug_set().entries(names).finish()
	}
}
