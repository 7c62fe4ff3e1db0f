//! HTTP API module.
//!
//! Query endpoints over the sales table, response types and the log stream.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{load_for_serving, router, start_server, AppState};
pub use types::*;
