use crate::orchestrator::{DeployError, RemoteObject};
use crate::resources::{Kind, ResourceDefinition};
use futures::future::BoxFuture;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Creates the definition's payload in the given namespace.
pub type CreateOp<C> = for<'a> fn(
    &'a C,
    &'a ResourceDefinition,
    &'a str,
    &'a CancellationToken,
) -> BoxFuture<'a, Result<RemoteObject, DeployError>>;

/// Deletes the named resource from the given namespace.
pub type DeleteOp<C> = for<'a> fn(
    &'a C,
    &'a str,
    &'a str,
    &'a CancellationToken,
) -> BoxFuture<'a, Result<RemoteObject, DeployError>>;

/// Kind-indexed create and delete tables. Filled once at startup, then only
/// read, so a shared reference can be used from any number of runs.
pub struct OperationRegistry<C> {
    create: HashMap<Kind, CreateOp<C>>,
    delete: HashMap<Kind, DeleteOp<C>>,
}

impl<C> OperationRegistry<C> {
    pub fn new() -> Self {
        Self {
            create: HashMap::new(),
            delete: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: Kind, create: CreateOp<C>, delete: DeleteOp<C>) -> &mut Self {
        self.create.insert(kind, create);
        self.delete.insert(kind, delete);
        self
    }

    pub fn lookup_create(&self, kind: Kind) -> Result<CreateOp<C>, DeployError> {
        self.create
            .get(&kind)
            .copied()
            .ok_or(DeployError::UnregisteredKind(kind))
    }

    pub fn lookup_delete(&self, kind: Kind) -> Result<DeleteOp<C>, DeployError> {
        self.delete
            .get(&kind)
            .copied()
            .ok_or(DeployError::UnregisteredKind(kind))
    }

    pub fn is_registered(&self, kind: Kind) -> bool {
        self.create.contains_key(&kind) && self.delete.contains_key(&kind)
    }
}

impl<C> Default for OperationRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
