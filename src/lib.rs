#![doc(html_root_url = "https://docs.rs/arbor-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A positional virtual DOM differ.
//!
//! [`diff`] compares a [`RenderedNode`] (what was last materialized) with a fresh [`DeclaredNode`] and returns a
//! [`Patch`] plus the new rendered tree. Hosts execute patches through the [`Host`] primitives via [`apply`].
//! [`Program`] closes the loop: event handlers dispatch messages, which run `update`, `view` and [`diff`] again.
//!
//! Children are compared by index only. There is no key-based reordering.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod apply;
pub mod declared;
pub mod diff;
pub mod dispatch;
pub mod event;
pub mod load;
pub mod patch;
pub mod rendered;
pub mod web;

pub use crate::{
	apply::{apply, Host},
	declared::{element, text, DeclareError, DeclaredElement, DeclaredNode, ElementBuilder, Fragment},
	diff::diff,
	dispatch::Program,
	event::{EventCell, EventTable, Handler, Listener},
	patch::{AttributeDelta, EventDelta, Patch, Update},
	rendered::{materialize, RenderedElement, RenderedNode},
};
