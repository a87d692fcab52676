// ==========================================
// Bedna workflow - numbering service
// ==========================================
// Crate numbers: customer-scoped, seeded from numbering_range.
// Shipment sequence: per (customer, direction, calendar year), from 1.
// The ledger is read inside the creating transaction; the store
// serializes writers per scope (see repository::number_ledger).
// ==========================================

use crate::domain::customer::Customer;
use crate::domain::types::{BlastState, ShipmentDirection};
use crate::repository::error::RepositoryResult;

// ==========================================
// NumberLedger - last issued numbers per scope
// ==========================================
pub trait NumberLedger {
    /// Highest crate number ever issued for the customer
    fn last_crate_number(&self, customer_id: i64) -> RepositoryResult<Option<i64>>;

    /// Highest shipment sequence issued in the scope
    fn last_shipment_sequence(
        &self,
        customer_id: i64,
        direction: ShipmentDirection,
        year: i32,
    ) -> RepositoryResult<Option<i64>>;
}

// ==========================================
// NumberingService
// ==========================================
pub struct NumberingService;

impl NumberingService {
    /// last issued + 1, or numbering_range + 1 for the customer's first crate
    pub fn next_crate_number(ledger: &dyn NumberLedger, customer: &Customer) -> RepositoryResult<i64> {
        let next = match ledger.last_crate_number(customer.id)? {
            Some(last) => last + 1,
            None => customer.numbering_range + 1,
        };
        Ok(next)
    }

    /// last issued + 1, or 1 for the first shipment of the scope
    pub fn next_shipment_sequence(
        ledger: &dyn NumberLedger,
        customer_id: i64,
        direction: ShipmentDirection,
        year: i32,
    ) -> RepositoryResult<i64> {
        Ok(ledger
            .last_shipment_sequence(customer_id, direction, year)?
            .map_or(1, |last| last + 1))
    }

    /// Blast state a new crate starts with unless set explicitly
    pub fn default_blast(customer: &Customer) -> BlastState {
        if customer.blast_all {
            BlastState::Dirty
        } else {
            BlastState::Unspecified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::PricingModel;
    use std::cell::RefCell;
    use std::collections::HashMap;

    // In-memory ledger standing in for the crate/shipment tables
    #[derive(Default)]
    struct MemoryLedger {
        crates: RefCell<HashMap<i64, Vec<i64>>>,
        shipments: RefCell<HashMap<(i64, ShipmentDirection, i32), Vec<i64>>>,
    }

    impl MemoryLedger {
        fn issue_crate(&self, customer: &Customer) -> i64 {
            let n = NumberingService::next_crate_number(self, customer).unwrap();
            self.crates.borrow_mut().entry(customer.id).or_default().push(n);
            n
        }
    }

    impl NumberLedger for MemoryLedger {
        fn last_crate_number(&self, customer_id: i64) -> RepositoryResult<Option<i64>> {
            Ok(self
                .crates
                .borrow()
                .get(&customer_id)
                .and_then(|v| v.iter().max().copied()))
        }

        fn last_shipment_sequence(
            &self,
            customer_id: i64,
            direction: ShipmentDirection,
            year: i32,
        ) -> RepositoryResult<Option<i64>> {
            Ok(self
                .shipments
                .borrow()
                .get(&(customer_id, direction, year))
                .and_then(|v| v.iter().max().copied()))
        }
    }

    fn customer(id: i64, range: i64) -> Customer {
        Customer {
            id,
            code: format!("C{}", id),
            name: "Test".to_string(),
            blast_all: false,
            complete_only: false,
            numbering_range: range,
            pricing_model: PricingModel::None,
        }
    }

    #[test]
    fn test_first_crate_number_starts_after_range() {
        let ledger = MemoryLedger::default();
        let c = customer(1, 100000);
        assert_eq!(ledger.issue_crate(&c), 100001);
        assert_eq!(ledger.issue_crate(&c), 100002);
    }

    #[test]
    fn test_crate_numbers_strictly_increase_per_customer() {
        let ledger = MemoryLedger::default();
        let a = customer(1, 100000);
        let b = customer(2, 200000);

        let mut issued_a = Vec::new();
        for _ in 0..5 {
            issued_a.push(ledger.issue_crate(&a));
            ledger.issue_crate(&b);
        }
        assert!(issued_a.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ledger.issue_crate(&b), 200006);
    }

    #[test]
    fn test_shipment_sequence_scoped_by_direction_and_year() {
        let ledger = MemoryLedger::default();
        ledger
            .shipments
            .borrow_mut()
            .insert((1, ShipmentDirection::Inbound, 2024), vec![1, 2, 3]);

        let next_in =
            NumberingService::next_shipment_sequence(&ledger, 1, ShipmentDirection::Inbound, 2024)
                .unwrap();
        let next_out =
            NumberingService::next_shipment_sequence(&ledger, 1, ShipmentDirection::Outbound, 2024)
                .unwrap();
        let next_year =
            NumberingService::next_shipment_sequence(&ledger, 1, ShipmentDirection::Inbound, 2025)
                .unwrap();

        assert_eq!(next_in, 4);
        assert_eq!(next_out, 1);
        assert_eq!(next_year, 1);
    }

    #[test]
    fn test_default_blast_follows_customer_flag() {
        let mut c = customer(1, 0);
        assert_eq!(NumberingService::default_blast(&c), BlastState::Unspecified);
        c.blast_all = true;
        assert_eq!(NumberingService::default_blast(&c), BlastState::Dirty);
    }
}
