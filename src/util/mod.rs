//! Small shared utilities that don't deserve their own top-level module.

pub mod events;

pub use events::{Event, EventBus};
