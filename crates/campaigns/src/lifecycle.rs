//! Campaign lifecycle guards.
//!
//! ```text
//! draft --(start)--> sending --(finish)--> completed | failed
//! ```
//!
//! Transitions only move forward; the table lives on
//! [`CampaignStatus::can_transition_to`].

use chrono::{DateTime, Utc};
use crm_core::types::{Campaign, CampaignStatus};
use crm_core::{CrmError, CrmResult};
use serde::{Deserialize, Serialize};

/// Terminal result reported by whatever drives delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignOutcome {
    Completed,
    Failed,
}

impl From<CampaignOutcome> for CampaignStatus {
    fn from(outcome: CampaignOutcome) -> Self {
        match outcome {
            CampaignOutcome::Completed => CampaignStatus::Completed,
            CampaignOutcome::Failed => CampaignStatus::Failed,
        }
    }
}

/// Guards checked before a campaign may start, in this order:
/// already started, not yet due, then the lifecycle table.
pub fn ensure_startable(campaign: &Campaign, now: DateTime<Utc>) -> CrmResult<()> {
    if campaign.status.is_started() {
        return Err(CrmError::AlreadyStarted {
            id: campaign.id,
            status: campaign.status,
        });
    }
    if campaign.scheduled_for > now {
        return Err(CrmError::NotYetDue {
            id: campaign.id,
            scheduled_for: campaign.scheduled_for,
        });
    }
    if !campaign.status.can_transition_to(CampaignStatus::Sending) {
        return Err(CrmError::campaign_transition(
            campaign.status,
            CampaignStatus::Sending,
        ));
    }
    Ok(())
}

/// Move `campaign` to `next`, stamping `updated_at`.
pub fn advance(
    campaign: &mut Campaign,
    next: CampaignStatus,
    now: DateTime<Utc>,
) -> CrmResult<()> {
    if !campaign.status.can_transition_to(next) {
        return Err(CrmError::campaign_transition(campaign.status, next));
    }
    campaign.status = next;
    campaign.updated_at = now;
    Ok(())
}
