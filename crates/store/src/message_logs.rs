use std::collections::HashMap;

use crm_core::store::MessageLogStore;
use crm_core::types::{DeliveryStatus, MessageLog};
use crm_core::{CrmError, CrmResult};
use dashmap::DashMap;
use uuid::Uuid;

/// Message logs grouped per campaign, the in-memory analogue of the
/// `(campaignId, customerId)` index.
#[derive(Default)]
pub struct InMemoryMessageLogStore {
    by_campaign: DashMap<Uuid, Vec<MessageLog>>,
    /// log id -> campaign id
    index: DashMap<Uuid, Uuid>,
}

impl InMemoryMessageLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_logs(&self) -> usize {
        self.index.len()
    }
}

impl MessageLogStore for InMemoryMessageLogStore {
    fn delete_by_campaign(&self, campaign_id: Uuid) -> CrmResult<u64> {
        let removed = self
            .by_campaign
            .remove(&campaign_id)
            .map(|(_, logs)| logs)
            .unwrap_or_default();
        for log in &removed {
            self.index.remove(&log.id);
        }
        Ok(removed.len() as u64)
    }

    fn insert_many(&self, logs: Vec<MessageLog>) -> CrmResult<usize> {
        let inserted = logs.len();
        for log in logs {
            self.index.insert(log.id, log.campaign_id);
            self.by_campaign.entry(log.campaign_id).or_default().push(log);
        }
        Ok(inserted)
    }

    fn find_by_campaign(&self, campaign_id: Uuid) -> CrmResult<Vec<MessageLog>> {
        let mut logs = self
            .by_campaign
            .get(&campaign_id)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(logs)
    }

    fn count_by_status(&self, campaign_id: Uuid) -> CrmResult<Vec<(DeliveryStatus, u64)>> {
        let mut counts: HashMap<DeliveryStatus, u64> = HashMap::new();
        if let Some(logs) = self.by_campaign.get(&campaign_id) {
            for log in logs.value() {
                *counts.entry(log.status).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    fn get(&self, id: Uuid) -> CrmResult<Option<MessageLog>> {
        let Some(campaign_id) = self.index.get(&id).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self
            .by_campaign
            .get(&campaign_id)
            .and_then(|logs| logs.iter().find(|l| l.id == id).cloned()))
    }

    fn save(&self, log: &MessageLog) -> CrmResult<()> {
        let mut logs = self
            .by_campaign
            .get_mut(&log.campaign_id)
            .ok_or_else(|| CrmError::not_found("MessageLog", log.id))?;
        let slot = logs
            .iter_mut()
            .find(|l| l.id == log.id)
            .ok_or_else(|| CrmError::not_found("MessageLog", log.id))?;
        *slot = log.clone();
        Ok(())
    }
}
