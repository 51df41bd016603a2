//! Pointer input mapped to high-level camera actions.
//!
//! # Invariants
//! - The camera rig consumes [`Action`]s, never raw window events.
//! - A press always selects exactly one camera slot.

pub mod action;
pub mod pointer;

pub use action::Action;
pub use pointer::{PointerTracker, slot_at};
