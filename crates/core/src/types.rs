use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Customer ──────────────────────────────────────────────────────────────

/// A customer record with spend aggregates maintained by the order workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub last_purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(CustomerStatus::Active),
            "inactive" => Some(CustomerStatus::Inactive),
            _ => None,
        }
    }
}

// ─── Order ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: f64,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

/// Per-customer order statistics computed by the order collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAggregate {
    pub count: u64,
    pub total_amount: f64,
    pub first_order_at: Option<DateTime<Utc>>,
    pub last_order_at: Option<DateTime<Utc>>,
}

// ─── Rules ─────────────────────────────────────────────────────────────────

/// Customer attributes a segment rule may address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CustomerField {
    Name,
    Email,
    Phone,
    Address,
    TotalSpent,
    LastPurchaseDate,
    Status,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RuleOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "==")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// One `field operator value` condition of a segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    pub field: CustomerField,
    pub operator: RuleOperator,
    pub value: serde_json::Value,
}

impl Rule {
    pub fn new(field: CustomerField, operator: RuleOperator, value: serde_json::Value) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }
}

// ─── Segment ───────────────────────────────────────────────────────────────

/// A named snapshot of the customers that matched a rule set at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub logical_operator: LogicalOperator,
    pub customer_ids: Vec<Uuid>,
    pub estimated_size: u64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Campaign ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub segment_id: Uuid,
    pub message: String,
    pub status: CampaignStatus,
    pub scheduled_for: DateTime<Utc>,
    pub total_recipients: u64,
    #[serde(default)]
    pub delivery_stats: DeliveryStats,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Scheduled,
    Sending,
    Completed,
    Failed,
}

impl CampaignStatus {
    /// Forward-only lifecycle table.
    pub fn can_transition_to(self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, next),
            (Draft, Scheduled)
                | (Draft, Sending)
                | (Scheduled, Sending)
                | (Sending, Completed)
                | (Sending, Failed)
        )
    }

    pub fn is_started(self) -> bool {
        matches!(self, CampaignStatus::Sending | CampaignStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Sending => "sending",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery counters mirrored onto the campaign document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sent: u64,
    pub delivered: u64,
    pub failed: u64,
}

// ─── Message Log ───────────────────────────────────────────────────────────

/// Delivery-state record for one (campaign, customer) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageLog {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub customer_id: Uuid,
    pub message: String,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Sent,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    /// `pending -> sent -> delivered`, and `pending | sent -> failed`.
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Pending, Sent) | (Sent, Delivered) | (Pending, Failed) | (Sent, Failed)
        )
    }
}

/// Per-status message counts for a campaign. Zero counts are always present.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageStats {
    pub total: u64,
    pub pending: u64,
    pub sent: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl MessageStats {
    pub fn from_counts(counts: impl IntoIterator<Item = (DeliveryStatus, u64)>) -> Self {
        let mut stats = Self::default();
        for (status, count) in counts {
            match status {
                DeliveryStatus::Pending => stats.pending += count,
                DeliveryStatus::Sent => stats.sent += count,
                DeliveryStatus::Delivered => stats.delivered += count,
                DeliveryStatus::Failed => stats.failed += count,
            }
            stats.total += count;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_wire_format() {
        let rule: Rule = serde_json::from_str(
            r#"{"field": "totalSpent", "operator": ">=", "value": "5000"}"#,
        )
        .unwrap();
        assert_eq!(rule.field, CustomerField::TotalSpent);
        assert_eq!(rule.operator, RuleOperator::GreaterThanOrEqual);
        assert_eq!(rule.value, serde_json::json!("5000"));
    }

    #[test]
    fn test_unrecognised_field_and_operator() {
        let rule: Rule = serde_json::from_str(
            r#"{"field": "password", "operator": "=~", "value": 1}"#,
        )
        .unwrap();
        assert_eq!(rule.field, CustomerField::Unknown);
        assert_eq!(rule.operator, RuleOperator::Unsupported);
    }

    #[test]
    fn test_logical_operator_defaults_to_and() {
        assert_eq!(LogicalOperator::default(), LogicalOperator::And);
        let op: LogicalOperator = serde_json::from_str(r#""OR""#).unwrap();
        assert_eq!(op, LogicalOperator::Or);
    }

    #[test]
    fn test_campaign_lifecycle_is_forward_only() {
        use CampaignStatus::*;
        assert!(Draft.can_transition_to(Sending));
        assert!(Sending.can_transition_to(Completed));
        assert!(Sending.can_transition_to(Failed));
        assert!(!Sending.can_transition_to(Draft));
        assert!(!Completed.can_transition_to(Sending));
        assert!(!Failed.can_transition_to(Sending));
        assert!(!Draft.can_transition_to(Completed));
    }

    #[test]
    fn test_delivery_transitions() {
        use DeliveryStatus::*;
        assert!(Pending.can_transition_to(Sent));
        assert!(Sent.can_transition_to(Delivered));
        assert!(Sent.can_transition_to(Failed));
        assert!(!Delivered.can_transition_to(Failed));
        assert!(!Sent.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Sent));
    }

    #[test]
    fn test_message_stats_zero_filled() {
        let stats = MessageStats::from_counts(vec![(DeliveryStatus::Pending, 3)]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.sent, 0);
        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.failed, 0);
    }
}
