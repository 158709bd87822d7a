//! Campaign engine: creation, start, progress and listing of campaigns.
//!
//! Fan-out runs on create and again on start. The first batch gives a draft
//! campaign its recipient logs; start discards it and regenerates from the
//! segment snapshot, resetting any delivery progress recorded in between.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use crm_core::config::CampaignConfig;
use crm_core::store::{CampaignQuery, CampaignStore, CustomerStore, MessageLogStore, SegmentStore};
use crm_core::types::{Campaign, CampaignStatus, DeliveryStats, MessageStats, Segment};
use crm_core::{CrmError, CrmResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::ledger::{CampaignMessageLog, MessageLogLedger};
use crate::lifecycle::{self, CampaignOutcome};
use crate::progress::ProgressReport;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub segment_id: Uuid,
    pub message: String,
    pub scheduled_for: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCampaignsQuery {
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub status: Option<CampaignStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Segment fields shown next to a listed campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRef {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub estimated_size: u64,
}

impl From<Segment> for SegmentRef {
    fn from(s: Segment) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
            estimated_size: s.estimated_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignListing {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub segment: Option<SegmentRef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPage {
    pub data: Vec<CampaignListing>,
    pub pagination: Pagination,
}

/// Result of a successful start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedCampaign {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub message_logs: Vec<CampaignMessageLog>,
    pub stats: MessageStats,
}

pub struct CampaignEngine {
    campaigns: Arc<dyn CampaignStore>,
    segments: Arc<dyn SegmentStore>,
    ledger: MessageLogLedger,
    config: CampaignConfig,
}

impl CampaignEngine {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        segments: Arc<dyn SegmentStore>,
        logs: Arc<dyn MessageLogStore>,
        customers: Arc<dyn CustomerStore>,
        config: CampaignConfig,
    ) -> Self {
        Self {
            campaigns,
            segments,
            ledger: MessageLogLedger::new(logs, customers),
            config,
        }
    }

    pub fn ledger(&self) -> &MessageLogLedger {
        &self.ledger
    }

    pub fn get_campaign(&self, id: Uuid) -> CrmResult<Campaign> {
        self.campaigns
            .get(id)?
            .ok_or_else(|| CrmError::not_found("Campaign", id))
    }

    /// Create a draft campaign for a non-empty segment and fan out one
    /// pending log per member.
    ///
    /// If fan-out fails the draft stays persisted; starting it later
    /// regenerates the logs.
    pub fn create_campaign(
        &self,
        req: CreateCampaignRequest,
        actor_id: Uuid,
    ) -> CrmResult<Campaign> {
        let now = Utc::now();
        let (name, message) = self.validate_create(&req, now)?;

        let segment = self
            .segments
            .get(req.segment_id)?
            .ok_or_else(|| CrmError::not_found("Segment", req.segment_id))?;
        if segment.customer_ids.is_empty() {
            return Err(CrmError::EmptySegment(segment.id));
        }

        let campaign = Campaign {
            id: Uuid::new_v4(),
            name,
            description: req
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            segment_id: segment.id,
            message,
            status: CampaignStatus::Draft,
            scheduled_for: req.scheduled_for,
            total_recipients: segment.customer_ids.len() as u64,
            delivery_stats: DeliveryStats::default(),
            started_at: None,
            created_by: actor_id,
            created_at: now,
            updated_at: now,
        };
        self.campaigns.insert(campaign.clone())?;

        self.ledger
            .fan_out(campaign.id, &segment.customer_ids, &campaign.message)?;

        info!(
            campaign_id = %campaign.id,
            segment_id = %segment.id,
            recipients = campaign.total_recipients,
            "Campaign created"
        );
        metrics::counter!("crm.campaigns.created").increment(1);
        Ok(campaign)
    }

    /// Move a due draft campaign to `sending`, regenerating its logs.
    pub fn start_campaign(&self, id: Uuid) -> CrmResult<StartedCampaign> {
        let mut campaign = self.get_campaign(id)?;
        let now = Utc::now();
        if let Err(e) = lifecycle::ensure_startable(&campaign, now) {
            warn!(campaign_id = %id, status = %campaign.status, error = %e, "Campaign start rejected");
            return Err(e);
        }

        let segment = self
            .segments
            .get(campaign.segment_id)?
            .ok_or_else(|| CrmError::not_found("Segment", campaign.segment_id))?;
        if segment.customer_ids.is_empty() {
            return Err(CrmError::EmptySegment(segment.id));
        }

        self.ledger
            .fan_out(campaign.id, &segment.customer_ids, &campaign.message)?;

        lifecycle::advance(&mut campaign, CampaignStatus::Sending, now)?;
        campaign.started_at = Some(now);
        campaign.total_recipients = segment.customer_ids.len() as u64;
        campaign.delivery_stats = DeliveryStats::default();
        self.campaigns.save(&campaign)?;

        let message_logs = self.ledger.campaign_logs(campaign.id)?;
        let stats = self.ledger.stats(campaign.id)?;

        info!(
            campaign_id = %campaign.id,
            recipients = campaign.total_recipients,
            "Campaign started"
        );
        metrics::counter!("crm.campaigns.started").increment(1);
        Ok(StartedCampaign {
            campaign,
            message_logs,
            stats,
        })
    }

    pub fn get_campaign_progress(&self, id: Uuid) -> CrmResult<ProgressReport> {
        let campaign = self.get_campaign(id)?;
        let stats = self.ledger.stats(id)?;
        let recent = self
            .ledger
            .recent_logs(id, self.config.recent_messages_limit)?;
        Ok(ProgressReport::build(&campaign, stats, recent))
    }

    pub fn list_campaigns(&self, query: ListCampaignsQuery) -> CrmResult<CampaignPage> {
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(self.config.default_page_size);
        if page == 0 {
            return Err(CrmError::Validation("Page must be a positive integer".to_string()));
        }
        if limit == 0 || limit > self.config.max_page_size {
            return Err(CrmError::Validation(format!(
                "Limit must be between 1 and {}",
                self.config.max_page_size
            )));
        }
        let search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(s) = &search {
            if s.chars().count() < self.config.min_search_len {
                return Err(CrmError::Validation(format!(
                    "Search term must be at least {} characters",
                    self.config.min_search_len
                )));
            }
        }

        let (campaigns, total) = self.campaigns.query(&CampaignQuery {
            status: query.status,
            search,
            offset: (page - 1).saturating_mul(limit),
            limit,
        })?;

        let data = campaigns
            .into_iter()
            .map(|campaign| -> CrmResult<CampaignListing> {
                let segment = self.segments.get(campaign.segment_id)?.map(SegmentRef::from);
                Ok(CampaignListing { campaign, segment })
            })
            .collect::<CrmResult<Vec<_>>>()?;

        Ok(CampaignPage {
            data,
            pagination: Pagination {
                total,
                page,
                pages: total.div_ceil(limit),
            },
        })
    }

    /// Copy the ledger's sent/delivered/failed counts onto the campaign.
    pub fn refresh_delivery_stats(&self, id: Uuid) -> CrmResult<Campaign> {
        let mut campaign = self.get_campaign(id)?;
        let stats = self.ledger.stats(id)?;
        campaign.delivery_stats = DeliveryStats {
            sent: stats.sent,
            delivered: stats.delivered,
            failed: stats.failed,
        };
        campaign.updated_at = Utc::now();
        self.campaigns.save(&campaign)?;
        Ok(campaign)
    }

    /// External completion hook: `sending -> completed | failed`.
    pub fn finish_campaign(&self, id: Uuid, outcome: CampaignOutcome) -> CrmResult<Campaign> {
        let mut campaign = self.get_campaign(id)?;
        lifecycle::advance(&mut campaign, outcome.into(), Utc::now())?;
        self.campaigns.save(&campaign)?;
        info!(campaign_id = %id, status = %campaign.status, "Campaign finished");
        Ok(campaign)
    }

    fn validate_create(
        &self,
        req: &CreateCampaignRequest,
        now: DateTime<Utc>,
    ) -> CrmResult<(String, String)> {
        let name = req.name.trim();
        let name_len = name.chars().count();
        if name_len == 0 {
            return Err(CrmError::Validation("Campaign name is required".to_string()));
        }
        if name_len < self.config.name_min_len || name_len > self.config.name_max_len {
            return Err(CrmError::Validation(format!(
                "Campaign name must be between {} and {} characters",
                self.config.name_min_len, self.config.name_max_len
            )));
        }

        let message = req.message.trim();
        if message.is_empty() {
            return Err(CrmError::Validation("Message is required".to_string()));
        }
        if message.chars().count() > self.config.message_max_len {
            return Err(CrmError::Validation(format!(
                "Message must be at most {} characters",
                self.config.message_max_len
            )));
        }

        if req.scheduled_for < now - Duration::seconds(self.config.schedule_grace_secs) {
            return Err(CrmError::Validation(
                "Scheduled date must be in the future".to_string(),
            ));
        }
        Ok((name.to_string(), message.to_string()))
    }
}
