//! Lambda emulation backed by refunc.
//!
//! Lambda functions are `Funcdef` custom resources in a Kubernetes cluster.
//! [`funcdef::FuncdefClient`] manages their lifecycle and
//! [`executor::LocalExecutor`] runs them through the `invoke` tool.
//! [`startup::Application`] wires everything together from a
//! [`refunc_config::shared::RefuncConfig`].

pub mod config;
pub mod executor;
pub mod funcdef;
pub mod k8s;
pub mod services;
pub mod startup;
