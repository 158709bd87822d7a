//! Shared wiring for the campaign scenario tests.

#![allow(dead_code)]

use std::sync::Arc;

use crm_campaigns::CampaignEngine;
use crm_core::config::{CampaignConfig, SegmentConfig};
use crm_core::store::{CampaignStore, MessageLogStore};
use crm_segmentation::SegmentManager;
use crm_store::{
    InMemoryCampaignStore, InMemoryCustomerStore, InMemoryMessageLogStore, InMemorySegmentStore,
};

pub struct Harness {
    pub customers: Arc<InMemoryCustomerStore>,
    pub segments: Arc<InMemorySegmentStore>,
    pub campaigns: Arc<InMemoryCampaignStore>,
    pub logs: Arc<InMemoryMessageLogStore>,
    pub manager: SegmentManager,
    pub engine: CampaignEngine,
}

impl Harness {
    pub fn new() -> Self {
        let campaigns = Arc::new(InMemoryCampaignStore::new());
        let logs = Arc::new(InMemoryMessageLogStore::new());
        Self::with_stores(campaigns.clone(), campaigns, logs.clone(), logs)
    }

    /// Build a harness whose engine talks to `engine_campaigns` and
    /// `engine_logs`, which may wrap the plain in-memory stores.
    pub fn with_stores(
        campaigns: Arc<InMemoryCampaignStore>,
        engine_campaigns: Arc<dyn CampaignStore>,
        logs: Arc<InMemoryMessageLogStore>,
        engine_logs: Arc<dyn MessageLogStore>,
    ) -> Self {
        let customers = Arc::new(InMemoryCustomerStore::new());
        let segments = Arc::new(InMemorySegmentStore::new());
        let manager = SegmentManager::new(
            customers.clone(),
            customers.clone(),
            segments.clone(),
            SegmentConfig::default(),
        );
        let engine = CampaignEngine::new(
            engine_campaigns,
            segments.clone(),
            engine_logs,
            customers.clone(),
            CampaignConfig::default(),
        );
        Self {
            customers,
            segments,
            campaigns,
            logs,
            manager,
            engine,
        }
    }

    /// Customers spending 5000, 7500 and 12000.
    pub fn seed_spenders(&self) {
        for (i, spent) in [5000.0, 7500.0, 12000.0].into_iter().enumerate() {
            self.customers
                .add_customer(&format!("Customer {i}"), &format!("c{i}@example.com"), spent)
                .unwrap();
        }
    }
}
