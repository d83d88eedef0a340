use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::k8s::K8sError;

/// Bookkeeping fields the API server maintains on every object.
///
/// None of them survive [`FunctionDefinition::cleaned`]. `clusterName` is no
/// longer part of [`ObjectMeta`] and is already dropped when parsing.
pub const CLUSTER_INTERNAL_FIELDS: &[&str] = &[
    "clusterName",
    "deletionGracePeriodSeconds",
    "deletionTimestamp",
    "generation",
    "resourceVersion",
    "selfLink",
    "uid",
];

/// A `Funcdef` custom resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: FuncdefSpec,
}

/// Spec of a function definition.
///
/// Only the runtime timeout is interpreted here, every other field is carried
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuncdefSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSpec {
    /// Execution timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response body of a list call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDefinitionList {
    #[serde(default)]
    pub items: Vec<FunctionDefinition>,
}

impl FunctionDefinition {
    /// Creates a definition named `name` in `namespace` with the given spec.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: FuncdefSpec) -> Self {
        Self {
            metadata: ObjectMeta {
                namespace: Some(namespace.into()),
                name: Some(name.into()),
                ..ObjectMeta::default()
            },
            spec,
            ..Self::default()
        }
    }

    pub fn namespace(&self) -> Result<&str, K8sError> {
        non_empty(self.metadata.namespace.as_deref())
            .ok_or(K8sError::MissingField("metadata.namespace"))
    }

    pub fn name(&self) -> Result<&str, K8sError> {
        non_empty(self.metadata.name.as_deref()).ok_or(K8sError::MissingField("metadata.name"))
    }

    /// Returns the explicit name, or the generation prefix when no name is set.
    ///
    /// With a prefix only, the API server picks the final name on creation.
    pub fn name_or_prefix(&self) -> Result<&str, K8sError> {
        non_empty(self.metadata.name.as_deref())
            .or_else(|| non_empty(self.metadata.generate_name.as_deref()))
            .ok_or(K8sError::MissingField("metadata.name"))
    }

    /// Runtime timeout in seconds, if the spec sets one.
    pub fn timeout_secs(&self) -> Option<u64> {
        self.spec.runtime.as_ref().and_then(|runtime| runtime.timeout)
    }

    /// Returns the annotations map, inserting an empty one if absent.
    pub fn annotations_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.metadata.annotations.get_or_insert_with(BTreeMap::new)
    }

    /// Strips the [`CLUSTER_INTERNAL_FIELDS`] from the metadata.
    pub fn clean(&mut self) {
        let metadata = &mut self.metadata;
        metadata.deletion_grace_period_seconds = None;
        metadata.deletion_timestamp = None;
        metadata.generation = None;
        metadata.resource_version = None;
        metadata.self_link = None;
        metadata.uid = None;
    }

    /// Consuming variant of [`FunctionDefinition::clean`].
    pub fn cleaned(mut self) -> Self {
        self.clean();
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
