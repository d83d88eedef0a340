use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use refunc_lambda::funcdef::FunctionDefinition;
use refunc_lambda::k8s::{FuncdefApi, K8sError, funcdef_collection_path};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A call received by [`FakeFuncdefApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get { namespace: String, name: String },
    Create { namespace: String, body: FunctionDefinition },
    Replace { namespace: String, name: String, body: FunctionDefinition },
    Delete { namespace: String, name: String },
    List { namespace: String, label_selector: Option<String> },
}

#[derive(Default)]
struct State {
    objects: BTreeMap<(String, String), FunctionDefinition>,
    calls: Vec<Call>,
    next_id: u64,
    delete_response: Option<Value>,
}

/// In-memory function definition collection behaving like the API server:
/// it assigns names for `generateName`, bumps `resourceVersion` and
/// `generation`, and fills in every other bookkeeping field.
#[derive(Default)]
pub struct FakeFuncdefApi {
    state: Mutex<State>,
}

impl FakeFuncdefApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `funcdef` as if it had been created earlier.
    pub fn seed(&self, funcdef: FunctionDefinition) -> FunctionDefinition {
        let mut state = self.state.lock().unwrap();
        let namespace = funcdef.metadata.namespace.clone().unwrap();
        let name = funcdef.metadata.name.clone().unwrap();
        let stored = stamp(&mut state, funcdef, &namespace, &name);
        state.objects.insert((namespace, name), stored.clone());

        stored
    }

    /// Makes every following delete answer with `response`.
    pub fn respond_to_delete_with(&self, response: Value) {
        self.state.lock().unwrap().delete_response = Some(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_creates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Create { .. }))
            .count()
    }

    pub fn count_replaces(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Replace { .. }))
            .count()
    }

    /// Returns the object as stored, bookkeeping fields included.
    pub fn stored(&self, namespace: &str, name: &str) -> Option<FunctionDefinition> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&(namespace.to_owned(), name.to_owned()))
            .cloned()
    }
}

fn stamp(
    state: &mut State,
    mut funcdef: FunctionDefinition,
    namespace: &str,
    name: &str,
) -> FunctionDefinition {
    state.next_id += 1;
    let metadata = &mut funcdef.metadata;
    metadata.name = Some(name.to_owned());
    metadata.namespace = Some(namespace.to_owned());
    metadata.resource_version = Some(state.next_id.to_string());
    metadata.generation = Some(metadata.generation.unwrap_or(0) + 1);
    metadata.uid.get_or_insert_with(|| format!("uid-{namespace}-{name}"));
    metadata.self_link = Some(format!("{}/{name}", funcdef_collection_path(namespace)));
    metadata.deletion_grace_period_seconds = Some(30);
    metadata
        .creation_timestamp
        .get_or_insert_with(|| Time(Default::default()));

    funcdef
}

fn not_found(namespace: &str, name: &str) -> K8sError {
    K8sError::NotFound {
        namespace: namespace.to_owned(),
        name: name.to_owned(),
    }
}

#[async_trait]
impl FuncdefApi for FakeFuncdefApi {
    async fn get(&self, namespace: &str, name: &str) -> Result<FunctionDefinition, K8sError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        });

        state
            .objects
            .get(&(namespace.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| not_found(namespace, name))
    }

    async fn create(
        &self,
        namespace: &str,
        funcdef: &FunctionDefinition,
    ) -> Result<FunctionDefinition, K8sError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            namespace: namespace.to_owned(),
            body: funcdef.clone(),
        });

        let name = match funcdef.metadata.name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => name.to_owned(),
            None => format!(
                "{}{}",
                funcdef.metadata.generate_name.clone().unwrap_or_default(),
                state.next_id + 1
            ),
        };

        let stored = stamp(&mut state, funcdef.clone(), namespace, &name);
        state
            .objects
            .insert((namespace.to_owned(), name), stored.clone());

        Ok(stored)
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        funcdef: &FunctionDefinition,
    ) -> Result<FunctionDefinition, K8sError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Replace {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            body: funcdef.clone(),
        });

        let key = (namespace.to_owned(), name.to_owned());
        let Some(current) = state.objects.get(&key) else {
            return Err(not_found(namespace, name));
        };
        // The API server rejects replaces based on a stale version.
        assert_eq!(
            current.metadata.resource_version, funcdef.metadata.resource_version,
            "replace sent with a stale resourceVersion"
        );

        let stored = stamp(&mut state, funcdef.clone(), namespace, name);
        state.objects.insert(key, stored.clone());

        Ok(stored)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<Value, K8sError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        });

        if let Some(response) = state.delete_response.clone() {
            return Ok(response);
        }

        state
            .objects
            .remove(&(namespace.to_owned(), name.to_owned()))
            .ok_or_else(|| not_found(namespace, name))?;

        Ok(json!({"kind": "Status", "apiVersion": "v1", "status": "Success"}))
    }

    async fn list(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<FunctionDefinition>, K8sError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List {
            namespace: namespace.to_owned(),
            label_selector: label_selector.map(str::to_owned),
        });

        // Only `key=value` selectors are supported.
        let selector = label_selector.and_then(|selector| selector.split_once('='));

        Ok(state
            .objects
            .iter()
            .filter(|((object_namespace, _), _)| object_namespace == namespace)
            .map(|(_, funcdef)| funcdef)
            .filter(|funcdef| match selector {
                Some((key, value)) => funcdef
                    .metadata
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.get(key))
                    .is_some_and(|label| label == value),
                None => true,
            })
            .cloned()
            .collect())
    }
}
