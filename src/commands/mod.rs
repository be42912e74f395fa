//! Chat commands: parsing, help and dispatch.

pub mod dispatch;
pub mod help;
pub mod parser;

pub use dispatch::{Dispatcher, Invocation};
pub use parser::{Command, CommandParser, SheetCommand};
