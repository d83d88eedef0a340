//! Kubernetes integration for the refunc lambda emulator.
//!
//! Function definitions live in the cluster as `Funcdef` custom resources
//! (`k8s.refunc.io/v1beta3`, plural `funcdeves`). Consumers should depend on
//! the [`FuncdefApi`] trait, which is the raw RPC boundary to the API server,
//! and not on a specific transport.
//!
//! The default implementation, [`http::HttpFuncdefApi`], is backed by the
//! [`kube`] crate and talks to the cluster using the ambient configuration
//! (local `~/.kube/config` or in-cluster). Tests swap in an in-memory fake.

mod base;
pub mod http;

pub use base::*;
