//! Provisioning error taxonomy.
//!
//! Every failure the engine reports maps onto an [`ErrorKind`], which is what
//! ends up in the provisioning manifest next to the human-readable message.

use roster_client::{ApiError, ReferenceKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A remote call failed at the network or HTTP level.
    #[error("remote call failed: {0}")]
    RemoteTransport(#[source] ApiError),

    /// The platform refused to create the account.
    #[error("failed to create account for '{name}': {source}")]
    RemoteCreate {
        name: String,
        #[source]
        source: ApiError,
    },

    /// A logical name is absent from the catalog after a full enumeration.
    #[error("{kind} '{name}' not found in catalog")]
    ReferenceNotFound { kind: ReferenceKind, name: String },

    /// A versioned write was rejected because the version was stale.
    #[error("write rejected, version is stale: {0}")]
    ConcurrencyConflict(String),

    /// The retry budget ran out; wraps the error from the last attempt.
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<ProvisionError>,
    },

    /// The station search index has not caught up with a created device.
    #[error("no station indexed yet for user {user_id}")]
    StationNotYetIndexed { user_id: String },

    /// A required input field is absent or blank.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// The input source produced something that is not a record.
    #[error("invalid input record: {0}")]
    InvalidInput(String),

    /// The phone base has no line template to build a device from.
    #[error("phone base '{phone_base}' declares no line templates")]
    MissingLineTemplate { phone_base: String },

    /// A provisioning task ended without producing an outcome.
    #[error("provisioning task failed: {0}")]
    TaskFailed(String),
}

impl From<ApiError> for ProvisionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Conflict(detail) => Self::ConcurrencyConflict(detail),
            other => Self::RemoteTransport(other),
        }
    }
}

impl ProvisionError {
    /// Whether another attempt might succeed without any change on our side.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RemoteTransport(err) => err.is_transient(),
            Self::ConcurrencyConflict(_) | Self::StationNotYetIndexed { .. } => true,
            _ => false,
        }
    }

    /// Classification reported in the manifest.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RemoteTransport(_) => ErrorKind::RemoteTransport,
            Self::RemoteCreate { .. } => ErrorKind::RemoteCreate,
            Self::ReferenceNotFound { .. } => ErrorKind::ReferenceNotFound,
            Self::ConcurrencyConflict(_) => ErrorKind::ConcurrencyConflict,
            Self::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            Self::StationNotYetIndexed { .. } => ErrorKind::StationNotYetIndexed,
            Self::MissingField(_) | Self::InvalidInput(_) => ErrorKind::InvalidRecord,
            Self::MissingLineTemplate { .. } => ErrorKind::MissingLineTemplate,
            Self::TaskFailed(_) => ErrorKind::TaskFailed,
        }
    }
}

/// Serializable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RemoteTransport,
    RemoteCreate,
    ReferenceNotFound,
    ConcurrencyConflict,
    RetryExhausted,
    StationNotYetIndexed,
    InvalidRecord,
    MissingLineTemplate,
    TaskFailed,
}
