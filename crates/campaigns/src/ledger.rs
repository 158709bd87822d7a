//! Message log ledger: per-recipient delivery records for campaigns.
//!
//! Fan-out is a two-phase operation: delete every log for the campaign, then
//! bulk-insert one pending log per recipient. The phases are not atomic. A
//! failure between them leaves the campaign with zero logs, and re-running
//! fan-out with the same input restores the full set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use crm_core::store::{CustomerStore, MessageLogStore};
use crm_core::types::{Customer, DeliveryStatus, MessageLog, MessageStats};
use crm_core::{CrmError, CrmResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Recipient details joined onto a log for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMessageLog {
    #[serde(flatten)]
    pub log: MessageLog,
    pub customer: Option<Recipient>,
}

pub struct MessageLogLedger {
    logs: Arc<dyn MessageLogStore>,
    customers: Arc<dyn CustomerStore>,
}

impl MessageLogLedger {
    pub fn new(logs: Arc<dyn MessageLogStore>, customers: Arc<dyn CustomerStore>) -> Self {
        Self { logs, customers }
    }

    /// Replace every log for `campaign_id` with one pending log per recipient.
    ///
    /// `message` is copied into each log. Duplicate recipient ids collapse to
    /// a single log.
    pub fn fan_out(
        &self,
        campaign_id: Uuid,
        customer_ids: &[Uuid],
        message: &str,
    ) -> CrmResult<Vec<MessageLog>> {
        let deleted = self.logs.delete_by_campaign(campaign_id)?;
        debug!(campaign_id = %campaign_id, deleted, "Cleared existing message logs");

        if customer_ids.is_empty() {
            return Err(CrmError::EmptyRecipientList(campaign_id));
        }

        let now = Utc::now();
        let mut seen = HashSet::with_capacity(customer_ids.len());
        let logs: Vec<MessageLog> = customer_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .map(|&customer_id| MessageLog {
                id: Uuid::new_v4(),
                campaign_id,
                customer_id,
                message: message.to_string(),
                status: DeliveryStatus::Pending,
                sent_at: None,
                delivered_at: None,
                error: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        match self.logs.insert_many(logs.clone()) {
            Ok(inserted) => {
                info!(campaign_id = %campaign_id, deleted, inserted, "Created message logs");
                metrics::counter!("crm.fanout.logs_inserted").increment(inserted as u64);
                Ok(logs)
            }
            Err(e) => {
                error!(campaign_id = %campaign_id, deleted, error = %e, "Message log insert failed after delete");
                Err(CrmError::PartialFailure {
                    campaign_id,
                    deleted,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Per-status counts; statuses without logs report zero.
    pub fn stats(&self, campaign_id: Uuid) -> CrmResult<MessageStats> {
        Ok(MessageStats::from_counts(self.logs.count_by_status(campaign_id)?))
    }

    /// All logs for a campaign, newest first, joined with recipient details.
    pub fn campaign_logs(&self, campaign_id: Uuid) -> CrmResult<Vec<CampaignMessageLog>> {
        self.recent_logs(campaign_id, usize::MAX)
    }

    /// The `limit` most recently created logs for a campaign.
    pub fn recent_logs(
        &self,
        campaign_id: Uuid,
        limit: usize,
    ) -> CrmResult<Vec<CampaignMessageLog>> {
        let logs: Vec<MessageLog> = self
            .logs
            .find_by_campaign(campaign_id)?
            .into_iter()
            .take(limit)
            .collect();
        let ids: Vec<Uuid> = logs.iter().map(|l| l.customer_id).collect();
        let customers = self.customers.find_many(&ids)?;
        let by_id: HashMap<Uuid, &Customer> = customers.iter().map(|c| (c.id, c)).collect();

        Ok(logs
            .into_iter()
            .map(|log| {
                let customer = by_id.get(&log.customer_id).map(|c| Recipient {
                    name: c.name.clone(),
                    email: c.email.clone(),
                });
                CampaignMessageLog { log, customer }
            })
            .collect())
    }

    /// Apply a delivery status update reported for one log.
    ///
    /// `error` is required for `failed` and dropped for every other status.
    pub fn record_delivery(
        &self,
        log_id: Uuid,
        status: DeliveryStatus,
        error: Option<String>,
    ) -> CrmResult<MessageLog> {
        let mut log = self
            .logs
            .get(log_id)?
            .ok_or_else(|| CrmError::not_found("MessageLog", log_id))?;

        if !log.status.can_transition_to(status) {
            return Err(CrmError::delivery_transition(log.status, status));
        }
        let error = match status {
            DeliveryStatus::Failed => {
                let error = error.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
                if error.is_none() {
                    return Err(CrmError::Validation(
                        "an error description is required for failed deliveries".to_string(),
                    ));
                }
                error
            }
            _ => None,
        };

        let now = Utc::now();
        match status {
            DeliveryStatus::Sent => log.sent_at = Some(now),
            DeliveryStatus::Delivered => log.delivered_at = Some(now),
            DeliveryStatus::Failed | DeliveryStatus::Pending => {}
        }
        log.status = status;
        log.error = error;
        log.updated_at = now;
        self.logs.save(&log)?;

        debug!(log_id = %log_id, status = ?status, "Message log status updated");
        metrics::counter!("crm.message_logs.status_updates").increment(1);
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_store::{InMemoryCustomerStore, InMemoryMessageLogStore};

    fn ledger() -> (MessageLogLedger, Arc<InMemoryCustomerStore>) {
        let customers = Arc::new(InMemoryCustomerStore::new());
        let ledger = MessageLogLedger::new(Arc::new(InMemoryMessageLogStore::new()), customers.clone());
        (ledger, customers)
    }

    #[test]
    fn test_fan_out_creates_pending_logs() {
        let (ledger, customers) = ledger();
        let a = customers.add_customer("A", "a@example.com", 0.0).unwrap();
        let b = customers.add_customer("B", "b@example.com", 0.0).unwrap();
        let campaign = Uuid::new_v4();

        let logs = ledger.fan_out(campaign, &[a.id, b.id], "Sale!").unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.status == DeliveryStatus::Pending));
        assert!(logs.iter().all(|l| l.message == "Sale!"));
        assert!(logs.iter().all(|l| l.error.is_none()));
    }

    #[test]
    fn test_fan_out_is_idempotent() {
        let (ledger, _) = ledger();
        let campaign = Uuid::new_v4();
        let ids = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        ledger.fan_out(campaign, &ids, "hello").unwrap();
        ledger.fan_out(campaign, &ids, "hello").unwrap();
        assert_eq!(ledger.stats(campaign).unwrap().total, 3);
    }

    #[test]
    fn test_fan_out_dedupes_recipients() {
        let (ledger, _) = ledger();
        let campaign = Uuid::new_v4();
        let id = Uuid::new_v4();
        let logs = ledger.fan_out(campaign, &[id, id], "hello").unwrap();
        assert_eq!(logs.len(), 1);
    }

    #[test]
    fn test_empty_fan_out_still_clears() {
        let (ledger, _) = ledger();
        let campaign = Uuid::new_v4();
        ledger.fan_out(campaign, &[Uuid::new_v4()], "hello").unwrap();

        let err = ledger.fan_out(campaign, &[], "hello").unwrap_err();
        assert!(matches!(err, CrmError::EmptyRecipientList(id) if id == campaign));
        assert_eq!(ledger.stats(campaign).unwrap().total, 0);
    }

    #[test]
    fn test_campaign_logs_join_recipients() {
        let (ledger, customers) = ledger();
        let a = customers.add_customer("Anita", "anita@example.com", 0.0).unwrap();
        let ghost = Uuid::new_v4();
        let campaign = Uuid::new_v4();
        ledger.fan_out(campaign, &[a.id, ghost], "hello").unwrap();

        let logs = ledger.campaign_logs(campaign).unwrap();
        assert_eq!(logs.len(), 2);
        let anita = logs.iter().find(|l| l.log.customer_id == a.id).unwrap();
        assert_eq!(anita.customer.as_ref().unwrap().name, "Anita");
        let missing = logs.iter().find(|l| l.log.customer_id == ghost).unwrap();
        assert!(missing.customer.is_none());

        assert_eq!(ledger.recent_logs(campaign, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_campaign_logs_join_every_recipient() {
        let (ledger, customers) = ledger();
        let ids: Vec<Uuid> = (0..3000)
            .map(|i| {
                customers
                    .add_customer(&format!("C{i}"), &format!("c{i}@example.com"), 0.0)
                    .unwrap()
                    .id
            })
            .collect();
        let campaign = Uuid::new_v4();
        ledger.fan_out(campaign, &ids, "hello").unwrap();

        let logs = ledger.campaign_logs(campaign).unwrap();
        assert_eq!(logs.len(), ids.len());
        for entry in &logs {
            let recipient = entry.customer.as_ref().unwrap();
            let expected = customers.find_by_id(entry.log.customer_id).unwrap().unwrap();
            assert_eq!(recipient.email, expected.email);
        }
    }

    #[test]
    fn test_record_delivery_lifecycle() {
        let (ledger, _) = ledger();
        let campaign = Uuid::new_v4();
        let logs = ledger
            .fan_out(campaign, &[Uuid::new_v4(), Uuid::new_v4()], "hello")
            .unwrap();

        let sent = ledger.record_delivery(logs[0].id, DeliveryStatus::Sent, None).unwrap();
        assert!(sent.sent_at.is_some());
        let delivered = ledger
            .record_delivery(logs[0].id, DeliveryStatus::Delivered, None)
            .unwrap();
        assert!(delivered.delivered_at.is_some());

        let failed = ledger
            .record_delivery(logs[1].id, DeliveryStatus::Failed, Some("carrier rejected".to_string()))
            .unwrap();
        assert_eq!(failed.error.as_deref(), Some("carrier rejected"));

        let stats = ledger.stats(campaign).unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn test_record_delivery_rejections() {
        let (ledger, _) = ledger();
        let campaign = Uuid::new_v4();
        let logs = ledger.fan_out(campaign, &[Uuid::new_v4()], "hello").unwrap();
        let id = logs[0].id;

        assert!(matches!(
            ledger.record_delivery(id, DeliveryStatus::Failed, None),
            Err(CrmError::Validation(_))
        ));
        assert!(matches!(
            ledger.record_delivery(id, DeliveryStatus::Failed, Some("  ".to_string())),
            Err(CrmError::Validation(_))
        ));
        assert!(matches!(
            ledger.record_delivery(id, DeliveryStatus::Delivered, None),
            Err(CrmError::InvalidTransition { .. })
        ));

        let sent = ledger
            .record_delivery(id, DeliveryStatus::Sent, Some("ignored".to_string()))
            .unwrap();
        assert!(sent.error.is_none());
        assert!(matches!(
            ledger.record_delivery(id, DeliveryStatus::Pending, None),
            Err(CrmError::InvalidTransition { .. })
        ));
        assert!(matches!(
            ledger.record_delivery(Uuid::new_v4(), DeliveryStatus::Sent, None),
            Err(CrmError::NotFound { .. })
        ));
    }
}
