//! Customers and their orders. One store implements both collaborator traits
//! because recording an order mutates the customer's spend aggregates.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use crm_core::store::{CustomerStore, OrderStore};
use crm_core::types::{Customer, CustomerStatus, Order, OrderAggregate, OrderStatus};
use crm_core::{CrmError, CrmResult, CustomerFilter};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

pub struct InMemoryCustomerStore {
    customers: DashMap<Uuid, Customer>,
    /// email -> customer id, enforces unique email addresses.
    email_index: DashMap<String, Uuid>,
    orders: DashMap<Uuid, Order>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        info!("Customer store initialized (in-memory)");
        Self {
            customers: DashMap::new(),
            email_index: DashMap::new(),
            orders: DashMap::new(),
        }
    }

    /// Insert or replace a customer. The email claim is atomic, and a
    /// replaced customer's previous address is released.
    pub fn insert_customer(&self, customer: Customer) -> CrmResult<()> {
        let id = customer.id;
        let email = normalize_email(&customer.email);
        match self.email_index.entry(email.clone()) {
            Entry::Occupied(owner) if *owner.get() != id => {
                return Err(CrmError::Validation(format!(
                    "email {} is already registered",
                    customer.email
                )));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        if let Some(previous) = self.customers.insert(id, customer) {
            let old_email = normalize_email(&previous.email);
            if old_email != email {
                self.email_index.remove_if(&old_email, |_, owner| *owner == id);
            }
        }
        Ok(())
    }

    /// Convenience constructor for a fresh active customer.
    pub fn add_customer(&self, name: &str, email: &str, total_spent: f64) -> CrmResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            address: None,
            total_spent,
            last_purchase_date: None,
            status: CustomerStatus::Active,
            created_at: Utc::now(),
        };
        self.insert_customer(customer.clone())?;
        Ok(customer)
    }

    /// Store an order and roll it into the customer's `total_spent` and
    /// `last_purchase_date`.
    pub fn record_order(&self, order: Order) -> CrmResult<()> {
        if order.amount < 0.0 {
            return Err(CrmError::Validation("order amount must be non-negative".to_string()));
        }
        let mut customer = self
            .customers
            .get_mut(&order.customer_id)
            .ok_or_else(|| CrmError::not_found("Customer", order.customer_id))?;
        customer.total_spent += order.amount;
        customer.last_purchase_date = Some(
            customer
                .last_purchase_date
                .map_or(order.created_at, |d| d.max(order.created_at)),
        );
        drop(customer);

        debug!(order_id = %order.id, customer_id = %order.customer_id, amount = order.amount, "Order recorded");
        self.orders.insert(order.id, order);
        Ok(())
    }

    /// Convenience wrapper around [`record_order`](Self::record_order).
    pub fn add_order(
        &self,
        customer_id: Uuid,
        amount: f64,
        created_at: DateTime<Utc>,
    ) -> CrmResult<Order> {
        let order = Order {
            id: Uuid::new_v4(),
            customer_id,
            amount,
            items: Vec::new(),
            status: OrderStatus::Completed,
            created_at,
        };
        self.record_order(order.clone())?;
        Ok(order)
    }

    fn sorted(mut customers: Vec<Customer>) -> Vec<Customer> {
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        customers
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Default for InMemoryCustomerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerStore for InMemoryCustomerStore {
    fn find(&self, filter: &CustomerFilter) -> CrmResult<Vec<Customer>> {
        if filter.is_nothing() {
            return Ok(Vec::new());
        }
        let matched = self
            .customers
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        Ok(Self::sorted(matched))
    }

    fn find_by_id(&self, id: Uuid) -> CrmResult<Option<Customer>> {
        Ok(self.customers.get(&id).map(|r| r.value().clone()))
    }

    fn find_many(&self, ids: &[Uuid]) -> CrmResult<Vec<Customer>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.customers.get(id).map(|r| r.value().clone()))
            .collect())
    }

    fn count_documents(&self, filter: &CustomerFilter) -> CrmResult<u64> {
        Ok(self
            .customers
            .iter()
            .filter(|r| filter.matches(r.value()))
            .count() as u64)
    }
}

impl OrderStore for InMemoryCustomerStore {
    fn aggregate_by_customer(
        &self,
        customer_ids: &[Uuid],
    ) -> CrmResult<HashMap<Uuid, OrderAggregate>> {
        let wanted: HashSet<&Uuid> = customer_ids.iter().collect();
        let mut result: HashMap<Uuid, OrderAggregate> = HashMap::new();
        for order in self.orders.iter() {
            let order = order.value();
            if !wanted.contains(&order.customer_id) {
                continue;
            }
            let agg = result.entry(order.customer_id).or_insert(OrderAggregate {
                count: 0,
                total_amount: 0.0,
                first_order_at: None,
                last_order_at: None,
            });
            agg.count += 1;
            agg.total_amount += order.amount;
            agg.first_order_at = Some(agg.first_order_at.map_or(order.created_at, |d| d.min(order.created_at)));
            agg.last_order_at = Some(agg.last_order_at.map_or(order.created_at, |d| d.max(order.created_at)));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crm_core::{Comparison, FieldCondition};

    #[test]
    fn test_duplicate_email_rejected() {
        let store = InMemoryCustomerStore::new();
        store.add_customer("Asha", "asha@example.com", 0.0).unwrap();
        let err = store.add_customer("Asha Two", "ASHA@example.com", 0.0).unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        let named_two = CustomerFilter::Condition(FieldCondition::Name {
            cmp: Comparison::Eq,
            value: "Asha Two".to_string(),
        });
        assert_eq!(store.count_documents(&named_two).unwrap(), 0);
    }

    #[test]
    fn test_concurrent_inserts_claim_email_once() {
        let store = std::sync::Arc::new(InMemoryCustomerStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .add_customer(&format!("Dup {i}"), "dup@example.com", 0.0)
                        .is_ok()
                })
            })
            .collect();
        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(inserted, 1);

        let by_email = CustomerFilter::Condition(FieldCondition::Email {
            cmp: Comparison::Eq,
            value: "dup@example.com".to_string(),
        });
        assert_eq!(store.count_documents(&by_email).unwrap(), 1);
    }

    #[test]
    fn test_email_change_releases_old_address() {
        let store = InMemoryCustomerStore::new();
        let mut asha = store.add_customer("Asha", "asha@example.com", 0.0).unwrap();
        asha.email = "asha.rao@example.com".to_string();
        store.insert_customer(asha.clone()).unwrap();

        // Re-saving under the same address is not a conflict.
        store.insert_customer(asha).unwrap();
        assert!(store.add_customer("Other", "asha@example.com", 0.0).is_ok());
        let err = store
            .add_customer("Other", "ASHA.RAO@example.com", 0.0)
            .unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
    }

    #[test]
    fn test_record_order_updates_aggregates() {
        let store = InMemoryCustomerStore::new();
        let c = store.add_customer("Ravi", "ravi@example.com", 100.0).unwrap();
        let t = Utc::now() - Duration::days(3);
        store.add_order(c.id, 250.0, t).unwrap();

        let updated = store.find_by_id(c.id).unwrap().unwrap();
        assert_eq!(updated.total_spent, 350.0);
        assert_eq!(updated.last_purchase_date, Some(t));
    }

    #[test]
    fn test_order_for_unknown_customer() {
        let store = InMemoryCustomerStore::new();
        let err = store.add_order(Uuid::new_v4(), 10.0, Utc::now()).unwrap_err();
        assert!(matches!(err, CrmError::NotFound { entity: "Customer", .. }));
    }

    #[test]
    fn test_aggregate_by_customer() {
        let store = InMemoryCustomerStore::new();
        let a = store.add_customer("A", "a@example.com", 0.0).unwrap();
        let b = store.add_customer("B", "b@example.com", 0.0).unwrap();
        let first = Utc::now() - Duration::days(10);
        let last = Utc::now() - Duration::days(1);
        store.add_order(a.id, 100.0, last).unwrap();
        store.add_order(a.id, 50.0, first).unwrap();

        let aggs = store.aggregate_by_customer(&[a.id, b.id]).unwrap();
        let agg = aggs.get(&a.id).unwrap();
        assert_eq!(agg.count, 2);
        assert_eq!(agg.total_amount, 150.0);
        assert_eq!(agg.first_order_at, Some(first));
        assert_eq!(agg.last_order_at, Some(last));
        assert!(!aggs.contains_key(&b.id));
    }

    #[test]
    fn test_find_and_count() {
        let store = InMemoryCustomerStore::new();
        store.add_customer("A", "a@example.com", 10.0).unwrap();
        store.add_customer("B", "b@example.com", 90.0).unwrap();
        let filter = CustomerFilter::Condition(FieldCondition::TotalSpent {
            cmp: Comparison::Gte,
            value: 50.0,
        });
        assert_eq!(store.find(&filter).unwrap().len(), 1);
        assert_eq!(store.count_documents(&filter).unwrap(), 1);
        assert!(store.find(&CustomerFilter::Nothing).unwrap().is_empty());
    }
}
