//! Repository seams between the core components and the persistence layer.
//!
//! Every component receives its stores as `Arc<dyn ...>` handles so tests can
//! swap in fakes. Implementations provide read-your-writes per handle; none of
//! these traits promise multi-document atomicity.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::CrmResult;
use crate::filter::CustomerFilter;
use crate::types::{Campaign, CampaignStatus, Customer, DeliveryStatus, MessageLog, OrderAggregate, Segment};

pub trait CustomerStore: Send + Sync {
    fn find(&self, filter: &CustomerFilter) -> CrmResult<Vec<Customer>>;
    fn find_by_id(&self, id: Uuid) -> CrmResult<Option<Customer>>;
    /// Customers among `ids`; unknown ids are skipped.
    fn find_many(&self, ids: &[Uuid]) -> CrmResult<Vec<Customer>>;
    fn count_documents(&self, filter: &CustomerFilter) -> CrmResult<u64>;
}

pub trait OrderStore: Send + Sync {
    /// Group orders by customer. Customers without orders are absent.
    fn aggregate_by_customer(&self, customer_ids: &[Uuid])
        -> CrmResult<HashMap<Uuid, OrderAggregate>>;
}

pub trait SegmentStore: Send + Sync {
    fn insert(&self, segment: Segment) -> CrmResult<()>;
    fn get(&self, id: Uuid) -> CrmResult<Option<Segment>>;
    fn list(&self) -> CrmResult<Vec<Segment>>;
}

/// Campaign listing query. Results are sorted newest-first.
#[derive(Debug, Clone, Default)]
pub struct CampaignQuery {
    pub status: Option<CampaignStatus>,
    /// Case-insensitive substring matched against name or description.
    pub search: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

impl CampaignQuery {
    pub fn matches(&self, campaign: &Campaign) -> bool {
        if let Some(status) = self.status {
            if campaign.status != status {
                return false;
            }
        }
        match &self.search {
            Some(needle) => {
                let needle = needle.to_lowercase();
                campaign.name.to_lowercase().contains(&needle)
                    || campaign
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

pub trait CampaignStore: Send + Sync {
    fn insert(&self, campaign: Campaign) -> CrmResult<()>;
    fn get(&self, id: Uuid) -> CrmResult<Option<Campaign>>;
    /// Replace the stored campaign with the same id.
    fn save(&self, campaign: &Campaign) -> CrmResult<()>;
    /// Returns one page of matching campaigns plus the total match count.
    fn query(&self, query: &CampaignQuery) -> CrmResult<(Vec<Campaign>, u64)>;
}

pub trait MessageLogStore: Send + Sync {
    /// Returns the number of deleted logs.
    fn delete_by_campaign(&self, campaign_id: Uuid) -> CrmResult<u64>;
    fn insert_many(&self, logs: Vec<MessageLog>) -> CrmResult<usize>;
    /// Logs for a campaign, most recently created first.
    fn find_by_campaign(&self, campaign_id: Uuid) -> CrmResult<Vec<MessageLog>>;
    /// Group-by-status counts. Statuses without logs may be omitted.
    fn count_by_status(&self, campaign_id: Uuid) -> CrmResult<Vec<(DeliveryStatus, u64)>>;
    fn get(&self, id: Uuid) -> CrmResult<Option<MessageLog>>;
    fn save(&self, log: &MessageLog) -> CrmResult<()>;
}
