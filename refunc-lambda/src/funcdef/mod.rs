//! Function definitions and the client managing their lifecycle in the cluster.

mod client;
mod model;

pub use client::*;
pub use model::*;
