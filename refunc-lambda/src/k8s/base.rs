use async_trait::async_trait;
use thiserror::Error;

use crate::funcdef::FunctionDefinition;

/// API group of the function definition custom resource.
pub const FUNCDEF_GROUP: &str = "k8s.refunc.io";

/// Served version of the function definition custom resource.
pub const FUNCDEF_VERSION: &str = "v1beta3";

/// `apiVersion` written on function definitions submitted without one.
pub const FUNCDEF_API_VERSION: &str = "k8s.refunc.io/v1beta3";

/// `kind` written on function definitions submitted without one.
pub const FUNCDEF_KIND: &str = "Funcdef";

/// Plural resource name used in the REST path.
pub const FUNCDEF_PLURAL: &str = "funcdeves";

/// Returns the collection path of function definitions in `namespace`.
pub fn funcdef_collection_path(namespace: &str) -> String {
    format!("/apis/{FUNCDEF_GROUP}/{FUNCDEF_VERSION}/namespaces/{namespace}/{FUNCDEF_PLURAL}")
}

/// Errors emitted by the Kubernetes integration.
#[derive(Debug, Error)]
pub enum K8sError {
    /// The requested function definition doesn't exist in the cluster.
    #[error("function definition {namespace}/{name} was not found")]
    NotFound { namespace: String, name: String },

    /// An error returned by the [`kube`] client when talking to the API
    /// server (connectivity, TLS, authentication or a non-404 API error).
    #[error("An error occurred with kube when dealing with K8s: {0}")]
    Kube(#[from] kube::Error),

    /// The request to the API server could not be built.
    #[error("failed to build a K8s request: {0}")]
    BuildRequest(#[from] kube::core::request::Error),

    /// A serialization or deserialization error while building requests or
    /// parsing responses.
    #[error("An error occurred in serde when dealing with K8s: {0}")]
    Serde(#[from] serde_json::Error),

    /// A delete call answered with something other than `{"status": "Success"}`.
    #[error("Bad status: {0}")]
    UnexpectedStatus(serde_json::Value),

    /// The function definition lacks a field required by the operation.
    #[error("function definition is missing `{0}`")]
    MissingField(&'static str),
}

impl K8sError {
    /// Returns `true` when the error means the object is absent from the cluster.
    pub fn is_not_found(&self) -> bool {
        matches!(self, K8sError::NotFound { .. })
    }

    /// Returns `true` for connectivity, authentication and malformed response failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            K8sError::Kube(_) | K8sError::BuildRequest(_) | K8sError::Serde(_)
        )
    }
}

/// Raw operations on the function definition collection.
///
/// Implementations return objects exactly as stored by the API server and
/// must map a missing object to [`K8sError::NotFound`]. Normalization and
/// reconciliation live in [`crate::funcdef::FuncdefClient`].
#[async_trait]
pub trait FuncdefApi: Send + Sync {
    /// Fetches `namespace/name`.
    async fn get(&self, namespace: &str, name: &str) -> Result<FunctionDefinition, K8sError>;

    /// Submits `funcdef` to the collection of `namespace` (`POST`).
    async fn create(
        &self,
        namespace: &str,
        funcdef: &FunctionDefinition,
    ) -> Result<FunctionDefinition, K8sError>;

    /// Replaces `namespace/name` with `funcdef` (`PUT`).
    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        funcdef: &FunctionDefinition,
    ) -> Result<FunctionDefinition, K8sError>;

    /// Deletes `namespace/name` and returns the raw response body.
    async fn delete(&self, namespace: &str, name: &str) -> Result<serde_json::Value, K8sError>;

    /// Lists the collection of `namespace`, filtered server side when a label
    /// selector is given.
    async fn list(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<FunctionDefinition>, K8sError>;
}
