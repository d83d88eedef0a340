use async_trait::async_trait;
use kube::Client;
use kube::api::{DeleteParams, GetParams, ListParams, PostParams};
use kube::core::Request;
use tracing::debug;

use crate::funcdef::{FunctionDefinition, FunctionDefinitionList};
use crate::k8s::{FuncdefApi, K8sError, funcdef_collection_path};

/// HTTP status the API server answers with when an object doesn't exist.
const NOT_FOUND_STATUS: u16 = 404;

/// [`FuncdefApi`] backed by a [`kube::Client`].
///
/// Requests go to `/apis/k8s.refunc.io/v1beta3/namespaces/{namespace}/funcdeves`
/// with JSON bodies; authentication is whatever the client was configured
/// with (bearer token for in-cluster and most kubeconfig setups).
///
/// The client is cheap to clone and safe to share between tasks, so a single
/// instance is built at startup and handed to every consumer.
#[derive(Clone)]
pub struct HttpFuncdefApi {
    client: Client,
}

impl HttpFuncdefApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the ambient configuration.
    ///
    /// Uses `~/.kube/config` when present and falls back to the in-cluster
    /// service account otherwise.
    pub async fn try_default() -> Result<Self, K8sError> {
        let client = Client::try_default().await?;

        Ok(Self::new(client))
    }

    fn collection(namespace: &str) -> Request {
        Request::new(funcdef_collection_path(namespace))
    }
}

/// Maps a 404 on a named object to [`K8sError::NotFound`].
fn into_k8s_error(err: kube::Error, namespace: &str, name: &str) -> K8sError {
    match err {
        kube::Error::Api(response) if response.code == NOT_FOUND_STATUS => K8sError::NotFound {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        },
        err => K8sError::Kube(err),
    }
}

#[async_trait]
impl FuncdefApi for HttpFuncdefApi {
    async fn get(&self, namespace: &str, name: &str) -> Result<FunctionDefinition, K8sError> {
        let request = Self::collection(namespace).get(name, &GetParams::default())?;

        self.client
            .request::<FunctionDefinition>(request)
            .await
            .map_err(|err| into_k8s_error(err, namespace, name))
    }

    async fn create(
        &self,
        namespace: &str,
        funcdef: &FunctionDefinition,
    ) -> Result<FunctionDefinition, K8sError> {
        let body = serde_json::to_vec(funcdef)?;
        let request = Self::collection(namespace).create(&PostParams::default(), body)?;

        Ok(self.client.request::<FunctionDefinition>(request).await?)
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        funcdef: &FunctionDefinition,
    ) -> Result<FunctionDefinition, K8sError> {
        let body = serde_json::to_vec(funcdef)?;
        let request = Self::collection(namespace).replace(name, &PostParams::default(), body)?;

        self.client
            .request::<FunctionDefinition>(request)
            .await
            .map_err(|err| into_k8s_error(err, namespace, name))
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<serde_json::Value, K8sError> {
        let request = Self::collection(namespace).delete(name, &DeleteParams::default())?;

        self.client
            .request::<serde_json::Value>(request)
            .await
            .map_err(|err| into_k8s_error(err, namespace, name))
    }

    async fn list(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<FunctionDefinition>, K8sError> {
        let mut params = ListParams::default();
        if let Some(label_selector) = label_selector {
            params = params.labels(label_selector);
        }
        let request = Self::collection(namespace).list(&params)?;

        let list = self.client.request::<FunctionDefinitionList>(request).await?;
        debug!(namespace, count = list.items.len(), "listed function definitions");

        Ok(list.items)
    }
}
