//! cursor25x: an MCP stdio server that runs an interactive task loop with
//! user feedback.
//!
//! This crate provides the core functionality for scaffolding the loop
//! artifacts, capturing one line of user input via a short-lived subprocess,
//! and classifying that input into a canned task message.

pub mod bootstrap;
pub mod capture;
pub mod classify;
pub mod config;
pub mod error;
pub mod server;
pub mod task_loop;

pub use capture::{InputCapture, ScriptCapture};
pub use classify::{classify, TaskCategory};
pub use config::Config;
pub use error::{Cursor25xError, Result};
pub use server::McpServer;
pub use task_loop::{IterationResult, TaskLoop};
