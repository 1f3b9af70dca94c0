use crate::resources::Kind;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use tracing::{info, warn};

pub mod deployer;
pub mod kubernetes;
pub mod registry;

#[cfg(test)]
mod tests;

/// Status classification of a failed remote call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteStatus {
    NotFound,
    Conflict,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("remote call failed ({status:?}, code {code:?}): {message}")]
pub struct RemoteError {
    pub status: RemoteStatus,
    pub code: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        let status = match code {
            404 => RemoteStatus::NotFound,
            409 => RemoteStatus::Conflict,
            _ => RemoteStatus::Other,
        };
        Self {
            status,
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            status: RemoteStatus::Other,
            code: None,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    #[error("no operation registered for kind {0}")]
    UnregisteredKind(Kind),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("invalid {kind} definition: {reason}")]
    InvalidDefinition { kind: Kind, reason: String },
    #[error("operation cancelled")]
    Cancelled,
}

impl DeployError {
    pub fn remote_status(&self) -> Option<RemoteStatus> {
        match self {
            DeployError::Remote(remote) => Some(remote.status),
            _ => None,
        }
    }
}

/// What the remote system handed back for a successful call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteObject {
    pub kind: Kind,
    pub name: String,
    pub uid: Option<String>,
}

/// What the host does when a run is cancelled mid-batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    /// Record `Cancelled` for the item and move on to the next one.
    #[default]
    Continue,
    /// Stop at the first cancelled item; every remaining item is skipped.
    AbortBatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    Cleanup,
    Deploy,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Cleanup => f.write_str("cleanup"),
            Pass::Deploy => f.write_str("deploy"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Deleted,
    AlreadyDeleted,
    Created,
    AlreadyExists,
    Failed(DeployError),
    Skipped,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_) | Outcome::Skipped)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Failed(DeployError::Cancelled))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemOutcome {
    pub kind: Kind,
    pub name: Option<String>,
    pub outcome: Outcome,
}

#[derive(Clone, Debug)]
pub struct BatchReport {
    pub pass: Pass,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items: Vec<ItemOutcome>,
    pub aborted: bool,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|item| item.outcome.is_failure())
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failures().next().is_none()
    }

    pub fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.items.iter().filter(|item| predicate(&item.outcome)).count()
    }

    pub fn log_summary(&self) {
        let failed = self.failures().count();
        let elapsed_ms = (self.finished_at - self.started_at).num_milliseconds();
        if self.is_success() {
            info!(
                pass = %self.pass,
                items = self.items.len(),
                elapsed_ms,
                "Batch pass completed"
            );
        } else {
            warn!(
                pass = %self.pass,
                items = self.items.len(),
                failed,
                aborted = self.aborted,
                elapsed_ms,
                "Batch pass completed with failures"
            );
        }
    }
}
