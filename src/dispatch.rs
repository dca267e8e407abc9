//! Elm-style update loop on top of the diff engine.
//!
//! A [`Program`] owns the current state and the current rendered tree in one cell. Every raw handler that
//! reaches the rendered tree is wrapped by [`Program::wrap`], so invoking an [`EventCell`](`crate::event::EventCell`)
//! runs `update`, `view` and [`diff`] and returns the resulting root patch for the host to apply.
//!
//! Wrapped listeners only hold a [`Weak`] reference to the program. Dropping the [`Program`] turns them inert.

use crate::{
	declared::DeclaredNode,
	diff::{diff, release_subtree},
	event::{Handler, Listener},
	patch::Patch,
	rendered::{materialize, RenderedNode},
};
use core::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{error, instrument, trace, warn};

type Update<S, M> = Box<dyn Fn(&S, M) -> S>;
type View<S, E, M> = Box<dyn Fn(&S) -> DeclaredNode<E, M>>;

struct Current<S, E> {
	state: Rc<S>,
	rendered: Option<RenderedNode<E>>,
}

struct Shared<S, M, E> {
	update: Update<S, M>,
	view: View<S, E, M>,
	current: RefCell<Current<S, E>>,
}

/// State, `update` and `view` of one UI, plus the tree it last rendered.
pub struct Program<S, M, E> {
	shared: Rc<Shared<S, M, E>>,
}

impl<S, M, E> Clone for Program<S, M, E> {
	fn clone(&self) -> Self {
		Self { shared: Rc::clone(&self.shared) }
	}
}

impl<S: 'static, M: 'static, E: 'static> Program<S, M, E> {
	pub fn new(initial: S, update: impl 'static + Fn(&S, M) -> S, view: impl 'static + Fn(&S) -> DeclaredNode<E, M>) -> Self {
		Self {
			shared: Rc::new(Shared {
				update: Box::new(update),
				view: Box::new(view),
				current: RefCell::new(Current {
					state: Rc::new(initial),
					rendered: None,
				}),
			}),
		}
	}

	/// The current state.
	///
	/// # Panics
	///
	/// Iff called from within `update` or `view`.
	#[must_use]
	pub fn state(&self) -> Rc<S> {
		Rc::clone(&self.shared.current.borrow().state)
	}

	/// The current rendered tree, if [`Program::render`] ran at least once.
	///
	/// # Panics
	///
	/// Iff called from within `update` or `view`.
	#[must_use]
	pub fn rendered(&self) -> Option<RenderedNode<E>> {
		self.shared.current.borrow().rendered.clone()
	}

	/// Wraps a raw handler so that invoking it dispatches the produced message into this program.
	pub fn wrap(&self, handler: &Handler<E, M>) -> Listener<E> {
		let program = Rc::downgrade(&self.shared);
		let handler = Rc::clone(handler);
		Rc::new(move |payload: &E| {
			let message = handler(payload);
			match Weak::upgrade(&program) {
				Some(shared) => Program { shared }.dispatch(message),
				None => {
					warn!("Event dispatched into a dropped `Program`. Ignoring.");
					Patch::Skip
				}
			}
		})
	}

	/// Renders the current state.
	///
	/// The first call yields [`Patch::Insert`] with the whole tree. Later calls diff against the current tree.
	#[instrument(skip(self))]
	pub fn render(&self) -> Patch<E> {
		self.transition(|_, state| Rc::clone(state), |current| current)
	}

	/// Renders the current state against a tree the host already shows, e.g. one read back with [`load`](`crate::load`).
	///
	/// A previously rendered tree is superseded and its event cells are released.
	#[instrument(skip(self, existing))]
	pub fn hydrate(&self, existing: &DeclaredNode<E, M>) -> Patch<E> {
		let baseline = materialize(existing, &mut |handler| self.wrap(handler));
		self.transition(
			|_, state| Rc::clone(state),
			move |superseded| {
				if let Some(superseded) = superseded {
					release_subtree(&superseded)
				}
				Some(baseline)
			},
		)
	}

	/// Runs `update` with `message`, renders the new state and diffs it against the current tree.
	///
	/// Returns [`Patch::Skip`] and logs an error if another update of this program is still running.
	#[instrument(skip(self, message))]
	pub fn dispatch(&self, message: M) -> Patch<E> {
		self.transition(move |shared, state| Rc::new((shared.update)(&**state, message)), |current| current)
	}

	/// Forces a full [`Patch::Replace`] of the root with a freshly materialized tree.
	///
	/// This is the way back for hosts that suspect they fell out of sync with the rendered tree.
	/// Event cells of the previous tree are released, so listeners the host still holds on to turn inert.
	#[instrument(skip(self))]
	pub fn resync(&self) -> Patch<E> {
		let mut current = match self.shared.current.try_borrow_mut() {
			Ok(current) => current,
			Err(_) => {
				error!("Re-entrant resync while the program is updating. Ignoring.");
				return Patch::Skip;
			}
		};
		let declared = (self.shared.view)(&*current.state);
		let rendered = materialize(&declared, &mut |handler| self.wrap(handler));
		if let Some(superseded) = current.rendered.replace(rendered.clone()) {
			release_subtree(&superseded)
		}
		Patch::Replace(rendered)
	}

	fn transition(
		&self,
		next_state: impl FnOnce(&Shared<S, M, E>, &Rc<S>) -> Rc<S>,
		baseline: impl FnOnce(Option<RenderedNode<E>>) -> Option<RenderedNode<E>>,
	) -> Patch<E> {
		let mut current = match self.shared.current.try_borrow_mut() {
			Ok(current) => current,
			Err(_) => {
				error!("Re-entrant dispatch while the program is updating. Ignoring.");
				return Patch::Skip;
			}
		};

		let state = next_state(&*self.shared, &current.state);
		let declared = (self.shared.view)(&*state);
		let mut wrap = |handler: &Handler<E, M>| self.wrap(handler);
		let (patch, rendered) = match baseline(current.rendered.take()) {
			Some(old) => diff(&old, &declared, &mut wrap),
			None => {
				trace!("No rendered tree yet. Materializing.");
				let rendered = materialize(&declared, &mut wrap);
				(Patch::Insert(rendered.clone()), rendered)
			}
		};

		current.state = state;
		current.rendered = Some(rendered);
		patch
	}
}
