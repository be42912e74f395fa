//! Common utilities and types shared across the application.

pub mod error;
pub mod messages;
pub mod resources;

pub use messages::{split_message, Reply, MAX_MESSAGE_LEN};
pub use resources::{LookupTable, ResourceTables};
