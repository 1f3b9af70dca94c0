

#[cfg(test)]
pub mod test_helpers {
    use crate::orchestrator::registry::{DeleteOp, OperationRegistry};
    use crate::orchestrator::{DeployError, RemoteError, RemoteObject};
    use crate::resources::{Kind, ResourceDefinition};
    use futures::future::BoxFuture;
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret, Service};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Action {
        Create,
        Delete,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Phase {
        Start,
        End,
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Call {
        pub action: Action,
        pub phase: Phase,
        pub kind: Kind,
        pub name: String,
        pub namespace: String,
    }

    // In-memory cluster recording every call it receives
    #[derive(Default)]
    pub struct RecordingClient {
        existing: Mutex<HashSet<(Kind, String, String)>>,
        failing: HashSet<Kind>,
        calls: Mutex<Vec<Call>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl RecordingClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(kinds: &[Kind]) -> Self {
            Self {
                failing: kinds.iter().copied().collect(),
                ..Self::default()
            }
        }

        pub fn with_existing(self, kind: Kind, name: &str, namespace: &str) -> Self {
            self.existing
                .lock()
                .unwrap()
                .insert((kind, name.to_string(), namespace.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        /// Start events only, as (action, kind, name).
        pub fn started(&self) -> Vec<(Action, Kind, String)> {
            self.calls()
                .into_iter()
                .filter(|call| call.phase == Phase::Start)
                .map(|call| (call.action, call.kind, call.name))
                .collect()
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        pub fn exists(&self, kind: Kind, name: &str, namespace: &str) -> bool {
            self.existing
                .lock()
                .unwrap()
                .contains(&(kind, name.to_string(), namespace.to_string()))
        }

        fn record(&self, action: Action, phase: Phase, kind: Kind, name: &str, namespace: &str) {
            self.calls.lock().unwrap().push(Call {
                action,
                phase,
                kind,
                name: name.to_string(),
                namespace: namespace.to_string(),
            });
        }

        fn apply(
            &self,
            action: Action,
            kind: Kind,
            name: &str,
            namespace: &str,
        ) -> Result<RemoteObject, DeployError> {
            if self.failing.contains(&kind) {
                return Err(RemoteError::from_code(500, "internal error").into());
            }
            let key = (kind, name.to_string(), namespace.to_string());
            let mut existing = self.existing.lock().unwrap();
            let applied = match action {
                Action::Create => existing.insert(key),
                Action::Delete => existing.remove(&key),
            };
            match (action, applied) {
                (_, true) => Ok(RemoteObject {
                    kind,
                    name: name.to_string(),
                    uid: None,
                }),
                (Action::Create, false) => {
                    Err(RemoteError::from_code(409, format!("{} {} already exists", kind, name)).into())
                }
                (Action::Delete, false) => {
                    Err(RemoteError::from_code(404, format!("{} {} not found", kind, name)).into())
                }
            }
        }

        async fn call(
            &self,
            action: Action,
            kind: Kind,
            name: &str,
            namespace: &str,
            cancellation: &CancellationToken,
        ) -> Result<RemoteObject, DeployError> {
            if cancellation.is_cancelled() {
                return Err(DeployError::Cancelled);
            }
            self.record(action, Phase::Start, kind, name, namespace);
            let active = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(active, Ordering::SeqCst);
            // Suspension point, like a network round trip
            tokio::task::yield_now().await;
            let result = self.apply(action, kind, name, namespace);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.record(action, Phase::End, kind, name, namespace);
            result
        }
    }

    pub fn fake_create<'a>(
        client: &'a RecordingClient,
        definition: &'a ResourceDefinition,
        namespace: &'a str,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<RemoteObject, DeployError>> {
        Box::pin(async move {
            let name = definition.name()?;
            client
                .call(Action::Create, definition.kind(), name, namespace, cancellation)
                .await
        })
    }

    macro_rules! fake_delete {
        ($name:ident, $kind:expr) => {
            pub fn $name<'a>(
                client: &'a RecordingClient,
                name: &'a str,
                namespace: &'a str,
                cancellation: &'a CancellationToken,
            ) -> BoxFuture<'a, Result<RemoteObject, DeployError>> {
                Box::pin(client.call(Action::Delete, $kind, name, namespace, cancellation))
            }
        };
    }

    fake_delete!(fake_delete_secret, Kind::Secret);
    fake_delete!(fake_delete_config_map, Kind::ConfigMap);
    fake_delete!(fake_delete_deployment, Kind::Deployment);
    fake_delete!(fake_delete_service, Kind::Service);
    fake_delete!(fake_delete_pod, Kind::Pod);

    pub fn fake_registry(kinds: &[Kind]) -> OperationRegistry<RecordingClient> {
        let mut registry = OperationRegistry::new();
        for kind in kinds {
            let delete: DeleteOp<RecordingClient> = match kind {
                Kind::Secret => fake_delete_secret,
                Kind::ConfigMap => fake_delete_config_map,
                Kind::Deployment => fake_delete_deployment,
                Kind::Service => fake_delete_service,
                Kind::Pod => fake_delete_pod,
            };
            registry.register(*kind, fake_create, delete);
        }
        registry
    }

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn secret(name: &str) -> ResourceDefinition {
        Secret {
            metadata: meta(name),
            ..Default::default()
        }
        .into()
    }

    pub fn config_map(name: &str) -> ResourceDefinition {
        ConfigMap {
            metadata: meta(name),
            ..Default::default()
        }
        .into()
    }

    pub fn deployment(name: &str) -> ResourceDefinition {
        Deployment {
            metadata: meta(name),
            ..Default::default()
        }
        .into()
    }

    pub fn service(name: &str) -> ResourceDefinition {
        Service {
            metadata: meta(name),
            ..Default::default()
        }
        .into()
    }

    pub fn pod(name: &str) -> ResourceDefinition {
        Pod {
            metadata: meta(name),
            ..Default::default()
        }
        .into()
    }

    pub fn unnamed_pod() -> ResourceDefinition {
        Pod::default().into()
    }
}
