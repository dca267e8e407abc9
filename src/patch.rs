use crate::{event::EventCell, rendered::RenderedNode};
use core::fmt;
use hashbrown::HashMap;

/// Changed or added attributes map to `Some(value)`, removed ones to `None`. Unchanged keys are absent.
pub type AttributeDelta = HashMap<String, Option<String>>;

/// Newly registered events map to `Some(cell)`, removed ones to `None`.
///
/// Events present before and after never appear here: their cell is reused and only its listener is swapped.
pub type EventDelta<E> = HashMap<String, Option<EventCell<E>>>;

/// Instruction for one diffed node position. See [`apply`](`crate::apply::apply`) for how hosts execute it.
pub enum Patch<E> {
	/// The subtree is unchanged.
	Skip,
	/// The node existed before and is absent now.
	///
	/// Only emitted for trailing child positions, after every positional and [`Patch::Insert`] entry.
	/// Hosts remove the child at the first trailing index once per entry.
	Delete,
	/// Discard the old node entirely and materialize this subtree in its place.
	Replace(RenderedNode<E>),
	/// Materialize this subtree at a position beyond the old child count.
	Insert(RenderedNode<E>),
	/// Same tag at the same position.
	Update(Update<E>),
}

pub struct Update<E> {
	pub attributes: AttributeDelta,
	pub events: EventDelta<E>,
	/// One entry per child position, `max(old.len(), new.len())` in total.
	pub children: Vec<Patch<E>>,
}

impl<E> Patch<E> {
	#[must_use]
	pub fn is_skip(&self) -> bool {
		matches!(self, Self::Skip)
	}

	/// Number of host operations this patch asks for, counting a whole inserted or replaced subtree once.
	#[must_use]
	pub fn change_count(&self) -> usize {
		match self {
			Self::Skip => 0,
			Self::Delete | Self::Replace(_) | Self::Insert(_) => 1,
			Self::Update(update) => update.attributes.len() + update.events.len() + update.children.iter().map(Self::change_count).sum::<usize>(),
		}
	}

	#[must_use]
	pub fn as_update(&self) -> Option<&Update<E>> {
		match self {
			Self::Update(update) => Some(update),
			_ => None,
		}
	}
}

impl<E> PartialEq for Patch<E> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Skip, Self::Skip) | (Self::Delete, Self::Delete) => true,
			(Self::Replace(a), Self::Replace(b)) | (Self::Insert(a), Self::Insert(b)) => a == b,
			(Self::Update(a), Self::Update(b)) => a == b,
			_ => false,
		}
	}
}

impl<E> PartialEq for Update<E> {
	fn eq(&self, other: &Self) -> bool {
		self.attributes == other.attributes && self.events == other.events && self.children == other.children
	}
}

impl<E> fmt::Debug for Patch<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Skip => f.write_str("Skip"),
			Self::Delete => f.write_str("Delete"),
			Self::Replace(node) => f.debug_tuple("Replace").field(node).finish(),
			Self::Insert(node) => f.debug_tuple("Insert").field(node).finish(),
			Self::Update(update) => fmt::Debug::fmt(update, f),
		}
	}
}

impl<E> fmt::Debug for Update<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Update")
			.field("attributes", &self.attributes)
			.field("events", &self.events)
			.field("children", &self.children)
			.finish()
	}
}
