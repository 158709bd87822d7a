use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{CampaignStatus, DeliveryStatus};

pub type CrmResult<T> = Result<T, CrmError>;

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No customers match the specified rules")]
    NoMatch,

    #[error("Segment {0} has no customers")]
    EmptySegment(Uuid),

    #[error("No customers to create message logs for (campaign {0})")]
    EmptyRecipientList(Uuid),

    #[error("Campaign {id} is already {status}")]
    AlreadyStarted { id: Uuid, status: CampaignStatus },

    #[error("Campaign {id} is scheduled for a future date ({scheduled_for})")]
    NotYetDue {
        id: Uuid,
        scheduled_for: DateTime<Utc>,
    },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Fan-out for campaign {campaign_id} failed after deleting {deleted} logs: {reason}")]
    PartialFailure {
        campaign_id: Uuid,
        deleted: u64,
        reason: String,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Coarse classification used to separate business rejections from faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    BusinessRule,
    StateGuard,
    Internal,
}

impl CrmError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        CrmError::NotFound { entity, id }
    }

    pub fn campaign_transition(from: CampaignStatus, to: CampaignStatus) -> Self {
        CrmError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn delivery_transition(from: DeliveryStatus, to: DeliveryStatus) -> Self {
        CrmError::InvalidTransition {
            from: format!("{from:?}").to_lowercase(),
            to: format!("{to:?}").to_lowercase(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CrmError::NotFound { .. } => ErrorKind::NotFound,
            CrmError::Validation(_) => ErrorKind::Validation,
            CrmError::NoMatch | CrmError::EmptySegment(_) | CrmError::EmptyRecipientList(_) => {
                ErrorKind::BusinessRule
            }
            CrmError::AlreadyStarted { .. }
            | CrmError::NotYetDue { .. }
            | CrmError::InvalidTransition { .. } => ErrorKind::StateGuard,
            CrmError::PartialFailure { .. }
            | CrmError::Store(_)
            | CrmError::Config(_)
            | CrmError::Serialization(_)
            | CrmError::Io(_)
            | CrmError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand to an untrusted caller.
    pub fn public_message(&self, expose_internal: bool) -> String {
        if self.kind() == ErrorKind::Internal && !expose_internal {
            "Internal error".to_string()
        } else {
            self.to_string()
        }
    }
}
