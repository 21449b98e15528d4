//! Toolbelt - a user-declared catalog of tools and workflows served over MCP
//!
//! Tools are shell commands or HTTP requests declared in a YAML catalog;
//! workflows chain tools together with template-based argument wiring. A
//! long-lived server answers MCP requests (JSON-RPC 2.0 over newline-delimited
//! frames) and hot-reloads the catalog when the file on disk changes.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod rpc;
pub mod watcher;

pub use error::{ExecError, ExecResult};
