//! Segment builder: fluent API for constructing segment requests.

use crm_core::types::{CustomerField, LogicalOperator, Rule, RuleOperator};
use serde_json::Value;

use crate::engine::CreateSegmentRequest;

pub struct SegmentBuilder {
    name: String,
    description: Option<String>,
    rules: Vec<Rule>,
    operator: LogicalOperator,
}

impl SegmentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            rules: Vec::new(),
            operator: LogicalOperator::And,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_or(mut self) -> Self {
        self.operator = LogicalOperator::Or;
        self
    }

    pub fn rule(mut self, field: CustomerField, operator: RuleOperator, value: Value) -> Self {
        self.rules.push(Rule::new(field, operator, value));
        self
    }

    pub fn spent_over(self, amount: f64) -> Self {
        self.rule(CustomerField::TotalSpent, RuleOperator::GreaterThan, amount.into())
    }

    pub fn spent_under(self, amount: f64) -> Self {
        self.rule(CustomerField::TotalSpent, RuleOperator::LessThan, amount.into())
    }

    pub fn status_is(self, status: &str) -> Self {
        self.rule(CustomerField::Status, RuleOperator::Equals, status.into())
    }

    pub fn purchased_since(self, rfc3339: &str) -> Self {
        self.rule(
            CustomerField::LastPurchaseDate,
            RuleOperator::GreaterThanOrEqual,
            rfc3339.into(),
        )
    }

    pub fn build(self) -> CreateSegmentRequest {
        CreateSegmentRequest {
            name: self.name,
            description: self.description,
            rules: self.rules,
            logical_operator: Some(self.operator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_rules_in_order() {
        let req = SegmentBuilder::new("Lapsed VIPs")
            .description("High spenders who went quiet")
            .spent_over(5000.0)
            .status_is("inactive")
            .with_or()
            .build();

        assert_eq!(req.name, "Lapsed VIPs");
        assert_eq!(req.logical_operator, Some(LogicalOperator::Or));
        assert_eq!(req.rules.len(), 2);
        assert_eq!(req.rules[0].field, CustomerField::TotalSpent);
        assert_eq!(req.rules[0].value, serde_json::json!(5000.0));
        assert_eq!(req.rules[1].field, CustomerField::Status);
    }
}
