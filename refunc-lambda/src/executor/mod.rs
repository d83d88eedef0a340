//! Invocation of lambda functions.
//!
//! [`LocalExecutor`] turns a function definition into an `invoke` command
//! line, runs it through the [`InvocationRunner`] and feeds it the event as
//! JSON on standard input. [`ExecutorRegistry`] maps each [`ExecutorKind`] to
//! its executor and is built once at startup.
//!
//! [`ExecutorKind`]: refunc_config::shared::ExecutorKind

mod base;
mod function;
mod local;
mod registry;
mod runner;

pub use base::*;
pub use function::*;
pub use local::*;
pub use registry::*;
pub use runner::*;
