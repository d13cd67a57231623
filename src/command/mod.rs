// src/command/mod.rs

//! What to run and how to invoke it.
//!
//! - [`spec`] holds the immutable [`CommandSpec`].
//! - [`platform`] classifies the OS into a closed [`Platform`] set.
//! - [`interpreter`] turns a [`CommandSpec`] into the final argument vector.

pub mod interpreter;
pub mod platform;
pub mod spec;

pub use interpreter::InterpreterResolver;
pub use platform::Platform;
pub use spec::CommandSpec;
