use crate::orchestrator::registry::OperationRegistry;
use crate::orchestrator::{
    BatchReport, CancellationPolicy, DeployError, ItemOutcome, Outcome, Pass, RemoteStatus,
};
use crate::resources::ResourceDefinition;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Everything a run shares across its calls. Owned by the host and never
/// mutated by the orchestrator.
#[derive(Clone)]
pub struct DeployContext<C> {
    pub client: C,
    pub namespace: String,
    pub cancellation: CancellationToken,
    pub policy: CancellationPolicy,
}

/// Drives a batch through delete-then-create, one item at a time, in batch order.
pub struct Orchestrator<'r, C> {
    registry: &'r OperationRegistry<C>,
    context: DeployContext<C>,
}

impl<'r, C> Orchestrator<'r, C> {
    pub fn new(registry: &'r OperationRegistry<C>, context: DeployContext<C>) -> Self {
        Self { registry, context }
    }

    pub fn context(&self) -> &DeployContext<C> {
        &self.context
    }

    /// Deletes every item. A resource that is already gone counts as deleted.
    pub async fn cleanup(&self, batch: &[ResourceDefinition]) -> BatchReport {
        self.run(Pass::Cleanup, batch).await
    }

    /// Creates every item. A resource that already exists counts as created.
    pub async fn deploy(&self, batch: &[ResourceDefinition]) -> BatchReport {
        self.run(Pass::Deploy, batch).await
    }

    async fn run(&self, pass: Pass, batch: &[ResourceDefinition]) -> BatchReport {
        let started_at = Utc::now();
        let mut items = Vec::with_capacity(batch.len());
        let mut aborted = false;
        for definition in batch {
            let outcome = if aborted {
                Outcome::Skipped
            } else {
                match pass {
                    Pass::Cleanup => self.delete_entity(definition).await,
                    Pass::Deploy => self.deploy_entity(definition).await,
                }
            };
            if outcome.is_cancelled() && self.context.policy == CancellationPolicy::AbortBatch {
                warn!(pass = %pass, "Run cancelled, skipping the rest of the batch");
                aborted = true;
            }
            items.push(ItemOutcome {
                kind: definition.kind(),
                name: definition.name().ok().map(String::from),
                outcome,
            });
        }
        let report = BatchReport {
            pass,
            started_at,
            finished_at: Utc::now(),
            items,
            aborted,
        };
        report.log_summary();
        report
    }

    async fn delete_entity(&self, definition: &ResourceDefinition) -> Outcome {
        let kind = definition.kind();
        let name = match definition.name() {
            Ok(name) => name,
            Err(e) => {
                error!(kind = %kind, error = %e, "An error occurred while trying to delete resource");
                return Outcome::Failed(e);
            }
        };
        let ctx = &self.context;
        let result = match self.dispatchable().and_then(|()| self.registry.lookup_delete(kind)) {
            Ok(delete) => delete(&ctx.client, name, &ctx.namespace, &ctx.cancellation).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(_) => {
                info!(kind = %kind, name, "{} {} deleted", kind, name);
                Outcome::Deleted
            }
            Err(e) if e.remote_status() == Some(RemoteStatus::NotFound) => {
                info!(kind = %kind, name, "{} already deleted", kind);
                Outcome::AlreadyDeleted
            }
            Err(e) => {
                error!(
                    kind = %kind,
                    name,
                    error = %e,
                    "An error occurred while trying to delete {} resource", kind
                );
                Outcome::Failed(e)
            }
        }
    }

    async fn deploy_entity(&self, definition: &ResourceDefinition) -> Outcome {
        let kind = definition.kind();
        // Creation does not need the name; it is only carried for logging.
        let name = definition.name().unwrap_or("<unnamed>");
        let ctx = &self.context;
        let result = match self.dispatchable().and_then(|()| self.registry.lookup_create(kind)) {
            Ok(create) => create(&ctx.client, definition, &ctx.namespace, &ctx.cancellation).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(_) => {
                info!(kind = %kind, name, "{} created", kind);
                Outcome::Created
            }
            Err(e) if e.remote_status() == Some(RemoteStatus::Conflict) => {
                info!(kind = %kind, name, "{} already exists", kind);
                Outcome::AlreadyExists
            }
            Err(e) => {
                error!(
                    kind = %kind,
                    name,
                    error = %e,
                    "An error occurred while trying to create {} resource", kind
                );
                Outcome::Failed(e)
            }
        }
    }

    // A cancelled run never dispatches, whatever the operation itself checks.
    fn dispatchable(&self) -> Result<(), DeployError> {
        if self.context.cancellation.is_cancelled() {
            Err(DeployError::Cancelled)
        } else {
            Ok(())
        }
    }
}
