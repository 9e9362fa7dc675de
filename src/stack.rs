//! Stack administration: records, validation, storage and the admin panel.

pub mod command;
pub mod error;
pub mod form;
pub mod message;
pub mod modal;
pub mod model;
pub mod panel;
pub mod store;
pub mod view;

pub use panel::StackAdminPanel;
pub use store::{MemoryStore, StackStore};
