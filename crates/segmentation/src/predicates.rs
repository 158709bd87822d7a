//! Rule evaluation: compiles segment rules into a [`CustomerFilter`].
//!
//! Compilation is pure and total: a rule that cannot be evaluated (unknown
//! field, unsupported operator, value that does not coerce to the field's
//! type) becomes [`CustomerFilter::Nothing`] instead of an error, so a bad
//! rule under-selects rather than over-selects.

use chrono::{DateTime, Utc};
use crm_core::config::SegmentConfig;
use crm_core::types::{CustomerField, CustomerStatus, LogicalOperator, Rule};
use crm_core::{Comparison, CrmError, CrmResult, CustomerFilter, FieldCondition};
use serde_json::Value;

/// Compile an ordered rule list combined with `operator`.
///
/// An empty rule list matches no customers.
pub fn evaluate(rules: &[Rule], operator: LogicalOperator) -> CustomerFilter {
    if rules.is_empty() {
        return CustomerFilter::Nothing;
    }
    let filters: Vec<CustomerFilter> = rules.iter().map(compile_rule).collect();
    match operator {
        LogicalOperator::And => CustomerFilter::All(filters),
        LogicalOperator::Or => CustomerFilter::Any(filters),
    }
}

/// Compile a single rule into an atomic filter.
pub fn compile_rule(rule: &Rule) -> CustomerFilter {
    let Some(cmp) = Comparison::from_operator(rule.operator) else {
        return CustomerFilter::Nothing;
    };
    let condition = match rule.field {
        CustomerField::Name => text(&rule.value).map(|value| FieldCondition::Name { cmp, value }),
        CustomerField::Email => {
            text(&rule.value).map(|value| FieldCondition::Email { cmp, value })
        }
        CustomerField::Phone => {
            text(&rule.value).map(|value| FieldCondition::Phone { cmp, value })
        }
        CustomerField::Address => {
            text(&rule.value).map(|value| FieldCondition::Address { cmp, value })
        }
        CustomerField::TotalSpent => {
            number(&rule.value).map(|value| FieldCondition::TotalSpent { cmp, value })
        }
        CustomerField::LastPurchaseDate => {
            date(&rule.value).map(|value| FieldCondition::LastPurchaseDate { cmp, value })
        }
        CustomerField::Status if cmp.is_equality() => rule
            .value
            .as_str()
            .and_then(CustomerStatus::parse)
            .map(|value| FieldCondition::Status { cmp, value }),
        CustomerField::Status | CustomerField::Unknown => None,
    };
    condition.map_or(CustomerFilter::Nothing, CustomerFilter::Condition)
}

/// Check a whole rule set before it is evaluated on the write path: at least
/// one rule, at most `max_rules`, and every rule evaluable.
pub fn validate_rules(rules: &[Rule], config: &SegmentConfig) -> CrmResult<()> {
    if rules.is_empty() {
        return Err(CrmError::Validation("At least one rule is required".to_string()));
    }
    if rules.len() > config.max_rules {
        return Err(CrmError::Validation(format!(
            "At most {} rules are allowed",
            config.max_rules
        )));
    }
    for (i, rule) in rules.iter().enumerate() {
        validate_rule(i, rule)?;
    }
    Ok(())
}

/// Reject rules that could never be evaluated. Used on the write path so
/// callers get a `Validation` error instead of a silently empty segment.
pub fn validate_rule(index: usize, rule: &Rule) -> CrmResult<()> {
    if rule.field == CustomerField::Unknown {
        return Err(CrmError::Validation(format!("rule {index}: unknown field")));
    }
    if rule.operator == crm_core::types::RuleOperator::Unsupported {
        return Err(CrmError::Validation(format!("rule {index}: invalid operator")));
    }
    match &rule.value {
        Value::Null => Err(CrmError::Validation(format!("rule {index}: value is required"))),
        Value::Array(_) | Value::Object(_) => Err(CrmError::Validation(format!(
            "rule {index}: value must be a scalar"
        ))),
        _ => Ok(()),
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// `totalSpent` values may arrive as JSON numbers or numeric strings.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn date(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|d| d.with_timezone(&Utc))
}
