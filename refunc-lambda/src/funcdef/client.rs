use std::sync::Arc;
use tracing::{info, warn};

use crate::funcdef::FunctionDefinition;
use crate::k8s::{FUNCDEF_API_VERSION, FUNCDEF_KIND, FuncdefApi, K8sError};

/// `status` of a successful delete response.
const DELETE_SUCCESS_STATUS: &str = "Success";

/// Lifecycle operations on function definitions.
///
/// Holds no state besides the transport: every read goes to the cluster and
/// every object handed back has been through [`FunctionDefinition::cleaned`].
#[derive(Clone)]
pub struct FuncdefClient {
    api: Arc<dyn FuncdefApi>,
}

impl FuncdefClient {
    pub fn new(api: Arc<dyn FuncdefApi>) -> Self {
        Self { api }
    }

    /// Fetches `namespace/name`.
    pub async fn get(&self, namespace: &str, name: &str) -> Result<FunctionDefinition, K8sError> {
        let funcdef = self.api.get(namespace, name).await?;

        Ok(funcdef.cleaned())
    }

    /// Creates a new function definition.
    ///
    /// The definition needs a namespace and either a name or a
    /// `generateName` prefix. With a prefix only, the name is left empty and
    /// the API server assigns one. The caller's value is never modified.
    pub async fn create(
        &self,
        funcdef: &FunctionDefinition,
    ) -> Result<FunctionDefinition, K8sError> {
        let namespace = funcdef.namespace()?;
        let name = funcdef.name_or_prefix()?;

        let mut request = funcdef.clone();
        request
            .api_version
            .get_or_insert_with(|| FUNCDEF_API_VERSION.to_owned());
        request.kind.get_or_insert_with(|| FUNCDEF_KIND.to_owned());
        request.annotations_mut();

        let created = self.api.create(namespace, &request).await?;
        info!(
            namespace,
            name = created.metadata.name.as_deref().unwrap_or(name),
            "created function definition"
        );

        Ok(created.cleaned())
    }

    /// Updates an existing function definition.
    ///
    /// The stored `spec` is replaced wholesale while the incoming annotations
    /// are merged into the stored ones, so keys absent from `funcdef` are
    /// kept. Fails with [`K8sError::NotFound`] instead of creating the object.
    pub async fn update(
        &self,
        funcdef: &FunctionDefinition,
    ) -> Result<FunctionDefinition, K8sError> {
        let namespace = funcdef.namespace()?;
        let name = funcdef.name()?;

        // The raw object keeps its `resourceVersion`, which makes the replace
        // fail on a concurrent modification instead of overwriting it.
        let mut stored = self.api.get(namespace, name).await?;
        stored.spec = funcdef.spec.clone();

        let annotations = stored.annotations_mut();
        if let Some(incoming) = &funcdef.metadata.annotations {
            annotations.extend(
                incoming
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
        }

        let updated = self.api.replace(namespace, name, &stored).await?;
        info!(namespace, name, "updated function definition");

        Ok(updated.cleaned())
    }

    /// Deletes `namespace/name`.
    ///
    /// Only a response whose `status` is exactly `"Success"` counts as a
    /// success, anything else is returned as [`K8sError::UnexpectedStatus`].
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<(), K8sError> {
        let response = self.api.delete(namespace, name).await?;

        if response.get("status").and_then(|status| status.as_str()) != Some(DELETE_SUCCESS_STATUS)
        {
            return Err(K8sError::UnexpectedStatus(response));
        }

        info!(namespace, name, "deleted function definition");

        Ok(())
    }

    /// Lists the function definitions of `namespace` in a single round trip.
    ///
    /// An empty `label_selector` lists the whole collection.
    pub async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<FunctionDefinition>, K8sError> {
        let label_selector = Some(label_selector).filter(|selector| !selector.is_empty());
        let funcdefs = self.api.list(namespace, label_selector).await?;

        Ok(funcdefs.into_iter().map(FunctionDefinition::cleaned).collect())
    }

    /// Creates or updates `funcdef`.
    ///
    /// Tries [`FuncdefClient::update`] first and falls back to
    /// [`FuncdefClient::create`] only when the object doesn't exist. Any other
    /// error is returned unchanged.
    pub async fn ensure(
        &self,
        funcdef: &FunctionDefinition,
    ) -> Result<FunctionDefinition, K8sError> {
        match self.update(funcdef).await {
            Err(err) if err.is_not_found() => {
                warn!(%err, "function definition missing, creating it");
                self.create(funcdef).await
            }
            result => result,
        }
    }
}
