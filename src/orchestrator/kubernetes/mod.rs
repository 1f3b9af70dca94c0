use crate::orchestrator::registry::OperationRegistry;
use crate::orchestrator::{DeployError, RemoteError, RemoteObject};
use crate::resources::{Kind, ResourceDefinition};
use futures::future::BoxFuture;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret, Service};
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

impl From<kube::Error> for RemoteError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => RemoteError::from_code(response.code, response.message),
            other => RemoteError::other(other.to_string()),
        }
    }
}

// Fails fast on an already cancelled token, otherwise races the call against it.
async fn guarded<T, F>(cancellation: &CancellationToken, call: F) -> Result<T, DeployError>
where
    F: Future<Output = Result<T, kube::Error>>,
{
    if cancellation.is_cancelled() {
        return Err(DeployError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(DeployError::Cancelled),
        result = call => result.map_err(|e| DeployError::Remote(e.into())),
    }
}

fn remote_object<K: Resource>(kind: Kind, resource: &K) -> RemoteObject {
    RemoteObject {
        kind,
        name: resource.name_any(),
        uid: resource.uid(),
    }
}

async fn create_namespaced<K>(
    client: &Client,
    kind: Kind,
    resource: &K,
    namespace: &str,
    cancellation: &CancellationToken,
) -> Result<RemoteObject, DeployError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + Debug + Serialize + DeserializeOwned,
    K: Send + Sync,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    debug!(kind = %kind, namespace, "Creating resource");
    let created = guarded(cancellation, api.create(&PostParams::default(), resource)).await?;
    Ok(remote_object(kind, &created))
}

async fn delete_namespaced<K>(
    client: &Client,
    kind: Kind,
    name: &str,
    namespace: &str,
    cancellation: &CancellationToken,
) -> Result<RemoteObject, DeployError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + Debug + DeserializeOwned,
    K: Send + Sync,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    debug!(kind = %kind, name, namespace, "Deleting resource");
    let deleted = guarded(cancellation, api.delete(name, &DeleteParams::default())).await?;
    // Right(status) means the deletion was accepted but is still in progress.
    Ok(deleted.either(
        |resource| remote_object(kind, &resource),
        |_| RemoteObject {
            kind,
            name: name.to_string(),
            uid: None,
        },
    ))
}

macro_rules! kind_operations {
    ($create:ident, $delete:ident, $variant:ident, $resource:ty) => {
        fn $create<'a>(
            client: &'a Client,
            definition: &'a ResourceDefinition,
            namespace: &'a str,
            cancellation: &'a CancellationToken,
        ) -> BoxFuture<'a, Result<RemoteObject, DeployError>> {
            Box::pin(async move {
                match definition {
                    ResourceDefinition::$variant(resource) => {
                        create_namespaced(client, Kind::$variant, resource, namespace, cancellation)
                            .await
                    }
                    other => Err(DeployError::InvalidDefinition {
                        kind: other.kind(),
                        reason: format!("dispatched to the {} create operation", Kind::$variant),
                    }),
                }
            })
        }

        fn $delete<'a>(
            client: &'a Client,
            name: &'a str,
            namespace: &'a str,
            cancellation: &'a CancellationToken,
        ) -> BoxFuture<'a, Result<RemoteObject, DeployError>> {
            Box::pin(delete_namespaced::<$resource>(
                client,
                Kind::$variant,
                name,
                namespace,
                cancellation,
            ))
        }
    };
}

kind_operations!(create_secret, delete_secret, Secret, Secret);
kind_operations!(create_config_map, delete_config_map, ConfigMap, ConfigMap);
kind_operations!(create_deployment, delete_deployment, Deployment, Deployment);
kind_operations!(create_service, delete_service, Service, Service);
kind_operations!(create_pod, delete_pod, Pod, Pod);

pub fn build_registry() -> OperationRegistry<Client> {
    let mut registry = OperationRegistry::new();
    registry
        .register(Kind::Secret, create_secret, delete_secret)
        .register(Kind::ConfigMap, create_config_map, delete_config_map)
        .register(Kind::Deployment, create_deployment, delete_deployment)
        .register(Kind::Service, create_service, delete_service)
        .register(Kind::Pod, create_pod, delete_pod);
    registry
}

// Singleton registry for all application
pub fn registry() -> &'static OperationRegistry<Client> {
    static REGISTRY: OnceLock<OperationRegistry<Client>> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}
