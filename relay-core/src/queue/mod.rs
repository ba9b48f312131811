//! Priority Action Queue
//!
//! This module serializes UI-visible side effects such as alerts and sheets.
//! Producers enqueue actions from anywhere; only the head is ever shown, and
//! the next action is promoted when the head is finished or dismissed.
//!
//! # Concepts
//!
//! ## Actions and Priorities
//!
//! An action is any value implementing [`QueueAction`]: it has a stable id
//! and a [`Priority`]. Ids are unique within a queue. Priority decides where a
//! new action lands; it never reorders actions that are already queued.
//!
//! ## Queue and Presenter
//!
//! [`ActionsQueue::new`] returns the queue handle together with its only
//! [`Presenter`]. The presenter mirrors the head into a presentation slot and
//! turns a dismissal of that slot into `finish_current`.

mod action;
mod actions;
mod cache;

pub use action::{Priority, QueueAction};
pub use actions::{ActionsQueue, Presenter};
