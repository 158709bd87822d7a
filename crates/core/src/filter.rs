//! Declarative customer filter produced by the rule evaluator.
//!
//! Stores may evaluate a filter in memory through [`CustomerFilter::matches`]
//! or translate the tree into their own query language.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Customer, CustomerStatus, RuleOperator};

/// Comparison operators a compiled filter can carry. Unsupported operators
/// never reach this type; they compile to [`CustomerFilter::Nothing`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Ne,
}

impl Comparison {
    pub fn from_operator(op: RuleOperator) -> Option<Self> {
        match op {
            RuleOperator::GreaterThan => Some(Comparison::Gt),
            RuleOperator::LessThan => Some(Comparison::Lt),
            RuleOperator::GreaterThanOrEqual => Some(Comparison::Gte),
            RuleOperator::LessThanOrEqual => Some(Comparison::Lte),
            RuleOperator::Equals => Some(Comparison::Eq),
            RuleOperator::NotEquals => Some(Comparison::Ne),
            RuleOperator::Unsupported => None,
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, Comparison::Eq | Comparison::Ne)
    }

    fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Comparison::Gt => ordering == Greater,
            Comparison::Lt => ordering == Less,
            Comparison::Gte => ordering != Less,
            Comparison::Lte => ordering != Greater,
            Comparison::Eq => ordering == Equal,
            Comparison::Ne => ordering != Equal,
        }
    }
}

/// A typed comparison against one customer attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum FieldCondition {
    Name { cmp: Comparison, value: String },
    Email { cmp: Comparison, value: String },
    Phone { cmp: Comparison, value: String },
    Address { cmp: Comparison, value: String },
    TotalSpent { cmp: Comparison, value: f64 },
    LastPurchaseDate { cmp: Comparison, value: DateTime<Utc> },
    Status { cmp: Comparison, value: CustomerStatus },
}

impl FieldCondition {
    pub fn matches(&self, customer: &Customer) -> bool {
        match self {
            FieldCondition::Name { cmp, value } => compare_text(Some(&customer.name), *cmp, value),
            FieldCondition::Email { cmp, value } => {
                compare_text(Some(&customer.email), *cmp, value)
            }
            FieldCondition::Phone { cmp, value } => {
                compare_text(customer.phone.as_deref(), *cmp, value)
            }
            FieldCondition::Address { cmp, value } => {
                compare_text(customer.address.as_deref(), *cmp, value)
            }
            FieldCondition::TotalSpent { cmp, value } => customer
                .total_spent
                .partial_cmp(value)
                .is_some_and(|o| cmp.holds(o)),
            FieldCondition::LastPurchaseDate { cmp, value } => match customer.last_purchase_date {
                Some(date) => cmp.holds(date.cmp(value)),
                None => *cmp == Comparison::Ne,
            },
            FieldCondition::Status { cmp, value } => match cmp {
                Comparison::Eq => customer.status == *value,
                Comparison::Ne => customer.status != *value,
                _ => false,
            },
        }
    }
}

fn compare_text(actual: Option<&str>, cmp: Comparison, expected: &str) -> bool {
    match actual {
        Some(actual) => cmp.holds(actual.cmp(expected)),
        None => cmp == Comparison::Ne,
    }
}

/// Filter tree over customer records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CustomerFilter {
    /// Matches no customer.
    Nothing,
    Condition(FieldCondition),
    All(Vec<CustomerFilter>),
    Any(Vec<CustomerFilter>),
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        match self {
            CustomerFilter::Nothing => false,
            CustomerFilter::Condition(condition) => condition.matches(customer),
            CustomerFilter::All(filters) => filters.iter().all(|f| f.matches(customer)),
            CustomerFilter::Any(filters) => filters.iter().any(|f| f.matches(customer)),
        }
    }

    /// True when the filter can be proven to match nothing without a scan.
    pub fn is_nothing(&self) -> bool {
        match self {
            CustomerFilter::Nothing => true,
            CustomerFilter::Condition(_) => false,
            CustomerFilter::All(filters) => filters.iter().any(|f| f.is_nothing()),
            CustomerFilter::Any(filters) => filters.iter().all(|f| f.is_nothing()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn customer(spent: f64) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: None,
            address: Some("12 MG Road".to_string()),
            total_spent: spent,
            last_purchase_date: None,
            status: CustomerStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_nothing_never_matches() {
        assert!(!CustomerFilter::Nothing.matches(&customer(100.0)));
        assert!(CustomerFilter::Nothing.is_nothing());
    }

    #[test]
    fn test_missing_optional_field_only_matches_ne() {
        let c = customer(0.0);
        let eq = FieldCondition::Phone {
            cmp: Comparison::Eq,
            value: "+911234".to_string(),
        };
        let ne = FieldCondition::Phone {
            cmp: Comparison::Ne,
            value: "+911234".to_string(),
        };
        assert!(!eq.matches(&c));
        assert!(ne.matches(&c));
    }

    #[test]
    fn test_status_ordering_matches_nothing() {
        let gt = FieldCondition::Status {
            cmp: Comparison::Gt,
            value: CustomerStatus::Inactive,
        };
        assert!(!gt.matches(&customer(0.0)));
    }

    #[test]
    fn test_nested_groups() {
        let c = customer(7500.0);
        let over = CustomerFilter::Condition(FieldCondition::TotalSpent {
            cmp: Comparison::Gt,
            value: 5000.0,
        });
        let under = CustomerFilter::Condition(FieldCondition::TotalSpent {
            cmp: Comparison::Lt,
            value: 1000.0,
        });
        assert!(!CustomerFilter::All(vec![over.clone(), under.clone()]).matches(&c));
        assert!(CustomerFilter::Any(vec![over, under]).matches(&c));
        assert!(CustomerFilter::Any(vec![CustomerFilter::Nothing]).is_nothing());
    }
}
