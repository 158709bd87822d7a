//! Campaign progress reporting.

use chrono::{DateTime, Utc};
use crm_core::types::{Campaign, CampaignStatus, MessageStats};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::CampaignMessageLog;

/// `round(100 * delivered / total_recipients)` with halves rounded up, or 0
/// when there are no recipients.
pub fn delivered_percentage(delivered: u64, total_recipients: u64) -> u64 {
    if total_recipients == 0 {
        return 0;
    }
    let num = 200 * delivered as u128 + total_recipients as u128;
    (num / (2 * total_recipients as u128)) as u64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    pub id: Uuid,
    pub name: String,
    pub status: CampaignStatus,
    pub total_recipients: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub scheduled_for: DateTime<Utc>,
}

impl From<&Campaign> for CampaignSummary {
    fn from(c: &Campaign) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            status: c.status,
            total_recipients: c.total_recipients,
            started_at: c.started_at,
            scheduled_for: c.scheduled_for,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub percentage: u64,
    pub stats: MessageStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub campaign: CampaignSummary,
    pub progress: Progress,
    pub recent_messages: Vec<CampaignMessageLog>,
}

impl ProgressReport {
    pub fn build(
        campaign: &Campaign,
        stats: MessageStats,
        recent_messages: Vec<CampaignMessageLog>,
    ) -> Self {
        Self {
            campaign: CampaignSummary::from(campaign),
            progress: Progress {
                percentage: delivered_percentage(stats.delivered, campaign.total_recipients),
                stats,
            },
            recent_messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percentage_examples() {
        assert_eq!(delivered_percentage(0, 0), 0);
        assert_eq!(delivered_percentage(5, 0), 0);
        assert_eq!(delivered_percentage(0, 2), 0);
        assert_eq!(delivered_percentage(1, 2), 50);
        assert_eq!(delivered_percentage(1, 3), 33);
        assert_eq!(delivered_percentage(2, 3), 67);
        assert_eq!(delivered_percentage(1, 8), 13);
        assert_eq!(delivered_percentage(2, 2), 100);
    }

    proptest! {
        #[test]
        fn prop_percentage_matches_rounded_ratio(
            total in 0u64..1_000_000,
            delivered in 0u64..1_000_000,
        ) {
            let expected = if total > 0 {
                (100.0 * delivered as f64 / total as f64).round() as u64
            } else {
                0
            };
            prop_assert_eq!(delivered_percentage(delivered, total), expected);
        }
    }
}
