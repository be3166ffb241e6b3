//! Lockstep order exchange.
//!
//! Every peer runs the same simulation. Clients submit their orders for a
//! net frame; frame N executes only once every registered client has
//! delivered frame N, after which peers compare sync hashes.

mod frame;
mod manager;

pub use frame::{ExecutedFrame, FrameBatch, OrderFrame, SyncReport, execute_frame};
pub use manager::OrderManager;
