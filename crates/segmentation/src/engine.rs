//! Segment manager: evaluates rules against the customer store and freezes
//! the matching customer ids into a persisted segment.

use std::sync::Arc;

use chrono::Utc;
use crm_core::config::SegmentConfig;
use crm_core::store::{CustomerStore, OrderStore, SegmentStore};
use crm_core::types::{LogicalOperator, Rule, Segment};
use crm_core::{CrmError, CrmResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::computed::{rank_by_spend, SegmentMember};
use crate::predicates;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSegmentRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub logical_operator: Option<LogicalOperator>,
}

/// A freshly persisted segment together with its match count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSegment {
    #[serde(flatten)]
    pub segment: Segment,
    pub customer_count: u64,
}

/// Listing view of a segment; member ids are left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub estimated_size: u64,
    pub rules: Vec<Rule>,
}

impl From<&Segment> for SegmentSummary {
    fn from(segment: &Segment) -> Self {
        Self {
            id: segment.id,
            name: segment.name.clone(),
            description: segment.description.clone(),
            estimated_size: segment.estimated_size,
            rules: segment.rules.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentOverview {
    pub name: String,
    pub description: Option<String>,
    pub estimated_size: u64,
    pub rules: Vec<Rule>,
    pub logical_operator: LogicalOperator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMembers {
    pub segment: SegmentOverview,
    /// Sorted by descending total spend.
    pub customers: Vec<SegmentMember>,
    pub total_customers: u64,
}

pub struct SegmentManager {
    customers: Arc<dyn CustomerStore>,
    orders: Arc<dyn OrderStore>,
    segments: Arc<dyn SegmentStore>,
    config: SegmentConfig,
}

impl SegmentManager {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        orders: Arc<dyn OrderStore>,
        segments: Arc<dyn SegmentStore>,
        config: SegmentConfig,
    ) -> Self {
        Self {
            customers,
            orders,
            segments,
            config,
        }
    }

    /// Evaluate the rules against every customer and persist the matches as
    /// an immutable snapshot. Nothing is persisted when no customer matches.
    pub fn create_segment(
        &self,
        req: CreateSegmentRequest,
        actor_id: Uuid,
    ) -> CrmResult<CreatedSegment> {
        self.validate(&req)?;
        let operator = req.logical_operator.unwrap_or_default();

        let filter = predicates::evaluate(&req.rules, operator);
        let matched = self.customers.find(&filter)?;
        info!(
            rules = req.rules.len(),
            operator = ?operator,
            matched = matched.len(),
            "Evaluated segment rules"
        );

        if matched.is_empty() {
            warn!(name = %req.name.trim(), "No customers match the specified rules");
            metrics::counter!("crm.segments.rejected_no_match").increment(1);
            return Err(CrmError::NoMatch);
        }

        let customer_count = self.customers.count_documents(&filter)?;
        let now = Utc::now();
        let customer_ids: Vec<Uuid> = matched.iter().map(|c| c.id).collect();
        let segment = Segment {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            description: req
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            rules: req.rules,
            logical_operator: operator,
            estimated_size: customer_ids.len() as u64,
            customer_ids,
            created_by: actor_id,
            created_at: now,
            updated_at: now,
        };
        self.segments.insert(segment.clone())?;

        info!(segment_id = %segment.id, size = segment.estimated_size, "Segment created");
        metrics::counter!("crm.segments.created").increment(1);

        Ok(CreatedSegment {
            customer_count,
            segment,
        })
    }

    pub fn list_segments(&self) -> CrmResult<Vec<SegmentSummary>> {
        Ok(self
            .segments
            .list()?
            .iter()
            .map(SegmentSummary::from)
            .collect())
    }

    pub fn get_segment(&self, id: Uuid) -> CrmResult<Segment> {
        self.segments
            .get(id)?
            .ok_or_else(|| CrmError::not_found("Segment", id))
    }

    /// Re-hydrate the snapshot into full customer records with order stats.
    pub fn get_segment_members(&self, id: Uuid) -> CrmResult<SegmentMembers> {
        let segment = self.get_segment(id)?;
        let customers = self.customers.find_many(&segment.customer_ids)?;
        let aggregates = self.orders.aggregate_by_customer(&segment.customer_ids)?;

        let mut members: Vec<SegmentMember> = customers
            .into_iter()
            .map(|c| {
                let orders = aggregates.get(&c.id);
                SegmentMember::compute(c, orders)
            })
            .collect();
        rank_by_spend(&mut members);

        Ok(SegmentMembers {
            total_customers: members.len() as u64,
            customers: members,
            segment: SegmentOverview {
                name: segment.name,
                description: segment.description,
                estimated_size: segment.estimated_size,
                rules: segment.rules,
                logical_operator: segment.logical_operator,
            },
        })
    }

    fn validate(&self, req: &CreateSegmentRequest) -> CrmResult<()> {
        if req.name.trim().is_empty() {
            return Err(CrmError::Validation("Segment name is required".to_string()));
        }
        predicates::validate_rules(&req.rules, &self.config)
    }
}
