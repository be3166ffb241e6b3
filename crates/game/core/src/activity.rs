//! Per-actor activity queue items.
//!
//! The world ticks the front activity of every in-world actor once per tick,
//! before trait ticks. A non-queued order supersedes the queue; a queued one
//! appends.
use std::fmt;

use crate::world::TraitContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityState {
    /// Keep this activity at the front of the queue.
    Running,
    /// Pop it; the next one starts on the following tick.
    Done,
}

pub trait Activity: fmt::Debug + Send {
    fn name(&self) -> &str;

    fn tick(&mut self, ctx: &mut TraitContext<'_>) -> ActivityState;

    /// Called when the activity is dropped without completing.
    fn cancel(&mut self) {}
}
