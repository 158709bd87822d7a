//! Computed member properties: per-customer order statistics joined onto
//! segment members.

use chrono::{DateTime, Utc};
use crm_core::types::{Customer, OrderAggregate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A segment member enriched with order statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub total_spent: f64,
    pub total_orders: u64,
    pub average_order_value: f64,
    pub first_order_date: Option<DateTime<Utc>>,
    pub last_order_date: Option<DateTime<Utc>>,
}

impl SegmentMember {
    /// Join a customer with its order aggregate. `average_order_value` divides
    /// the customer's running `total_spent` by the order count and is zero for
    /// customers without orders.
    pub fn compute(customer: Customer, orders: Option<&OrderAggregate>) -> Self {
        let total_orders = orders.map_or(0, |o| o.count);
        let average_order_value = if total_orders == 0 {
            0.0
        } else {
            customer.total_spent / total_orders as f64
        };
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            address: customer.address,
            total_spent: customer.total_spent,
            total_orders,
            average_order_value,
            first_order_date: orders.and_then(|o| o.first_order_at),
            last_order_date: orders.and_then(|o| o.last_order_at),
        }
    }
}

/// Sort members by descending total spend.
pub fn rank_by_spend(members: &mut [SegmentMember]) {
    members.sort_by(|a, b| {
        b.total_spent
            .partial_cmp(&a.total_spent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
