//! Betting table runtime: configuration, actor messages, and the actor
//! that drives one table against a store.

pub mod actor;
pub mod config;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use config::TableConfig;
pub use messages::{TableMessage, TableResponse};
