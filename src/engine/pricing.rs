// ==========================================
// Bedna workflow - pricing resolver
// ==========================================
// unit_price: customer + specification + half-open length bracket.
// Costs are rounded to 2 dp, half away from zero (round-half-up for
// non-negative amounts). The rounding boundary is per customer.
// ==========================================

use crate::domain::catalog::Price;
use crate::domain::crates::Crate;
use crate::domain::customer::Customer;
use crate::domain::order::Order;
use crate::domain::types::PricingModel;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

const COST_SCALE: u32 = 2;

// ==========================================
// RoundingPolicy
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingPolicy {
    #[default]
    Aggregate, // round only the final cost
    UnitPrice, // round the unit price first, then the product
}

impl RoundingPolicy {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "AGGREGATE" => Some(RoundingPolicy::Aggregate),
            "UNIT_PRICE" => Some(RoundingPolicy::UnitPrice),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RoundingPolicy::Aggregate => "AGGREGATE",
            RoundingPolicy::UnitPrice => "UNIT_PRICE",
        }
    }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

fn round_cost(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

// ==========================================
// PricingResolver
// ==========================================
/// Stateless; the caller supplies the customer's price rows.
pub struct PricingResolver;

impl PricingResolver {
    /// Rate per kg for (specification, length), None when the customer
    /// has no pricing model or no row matches.
    pub fn unit_price(
        customer: &Customer,
        prices: &[Price],
        specification_id: i64,
        length: Decimal,
    ) -> Option<Decimal> {
        if customer.pricing_model == PricingModel::None {
            return None;
        }
        prices
            .iter()
            .filter(|p| p.customer_id == customer.id)
            .find(|p| p.matches(specification_id, length))
            .map(|p| p.rate_per_kg)
    }

    /// Cost of a net weight at the order's unit price; zero when unpriced
    pub fn cost_for_weight(
        customer: &Customer,
        prices: &[Price],
        order: &Order,
        net_weight: Decimal,
        policy: RoundingPolicy,
    ) -> Decimal {
        let Some(rate) = Self::unit_price(customer, prices, order.specification_id, order.length)
        else {
            return Decimal::ZERO;
        };
        let rate = match policy {
            RoundingPolicy::Aggregate => rate,
            RoundingPolicy::UnitPrice => round_cost(rate),
        };
        round_cost(rate * net_weight)
    }

    /// unit price * sum of the order's crate net weights
    pub fn order_cost(
        customer: &Customer,
        prices: &[Price],
        order: &Order,
        crates: &[Crate],
        policy: RoundingPolicy,
    ) -> Decimal {
        let total: Decimal = crates
            .iter()
            .filter(|c| c.order_id == order.id)
            .map(|c| c.net_weight)
            .sum();
        Self::cost_for_weight(customer, prices, order, total, policy)
    }

    pub fn crate_cost(
        customer: &Customer,
        prices: &[Price],
        order: &Order,
        item: &Crate,
        policy: RoundingPolicy,
    ) -> Decimal {
        Self::cost_for_weight(customer, prices, order, item.net_weight, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{BlastState, CrateState, Priority, StraightenState};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn priced_customer() -> Customer {
        Customer {
            id: 1,
            code: "EUR".to_string(),
            name: "Eurotec".to_string(),
            blast_all: false,
            complete_only: false,
            numbering_range: 100000,
            pricing_model: PricingModel::LengthBracket,
        }
    }

    fn price(rate: &str) -> Price {
        Price {
            id: 1,
            customer_id: 1,
            length_min: dec("50"),
            length_max: dec("150"),
            rate_per_kg: dec(rate),
            specification_ids: vec![10],
        }
    }

    fn order(length: &str) -> Order {
        Order {
            id: 5,
            shipment_in_id: 1,
            shipment_out_id: None,
            article: "A-1".to_string(),
            diameter: dec("8"),
            length: dec(length),
            specification_id: 10,
            head_type_id: None,
            full_thread: false,
            description: None,
            priority: Priority::Low,
            consignee_id: None,
            dispatched: false,
        }
    }

    fn crate_with(net: &str) -> Crate {
        Crate {
            id: 1,
            order_id: 5,
            crate_number: 100001,
            net_weight: dec(net),
            tare_weight: dec("1"),
            quantity: None,
            material: None,
            batch: None,
            customer_container_no: None,
            supplier: None,
            notes: None,
            state: CrateState::Received,
            blast: BlastState::Unspecified,
            straighten: StraightenState::Unspecified,
            phosphate: false,
        }
    }

    #[test]
    fn test_unit_price_bracket_is_half_open() {
        let customer = priced_customer();
        let prices = vec![price("2.00")];

        assert_eq!(
            PricingResolver::unit_price(&customer, &prices, 10, dec("100")),
            Some(dec("2.00"))
        );
        assert_eq!(
            PricingResolver::unit_price(&customer, &prices, 10, dec("50")),
            Some(dec("2.00"))
        );
        assert_eq!(PricingResolver::unit_price(&customer, &prices, 10, dec("150")), None);
        assert_eq!(PricingResolver::unit_price(&customer, &prices, 11, dec("100")), None);
    }

    #[test]
    fn test_order_cost_sums_net_weights() {
        let customer = priced_customer();
        let prices = vec![price("2.00")];
        let crates = vec![crate_with("2"), crate_with("2")];

        let cost = PricingResolver::order_cost(
            &customer,
            &prices,
            &order("100"),
            &crates,
            RoundingPolicy::Aggregate,
        );
        assert_eq!(cost, dec("8.00"));

        let at_boundary = PricingResolver::order_cost(
            &customer,
            &prices,
            &order("150"),
            &crates,
            RoundingPolicy::Aggregate,
        );
        assert_eq!(at_boundary, Decimal::ZERO);
    }

    #[test]
    fn test_customer_without_model_costs_nothing() {
        let mut customer = priced_customer();
        customer.pricing_model = PricingModel::None;
        let cost = PricingResolver::crate_cost(
            &customer,
            &[price("2.00")],
            &order("100"),
            &crate_with("4"),
            RoundingPolicy::Aggregate,
        );
        assert_eq!(cost, Decimal::ZERO);
    }

    #[test]
    fn test_rounding_boundary_changes_result() {
        let customer = priced_customer();
        let prices = vec![price("1.005")];
        let item = crate_with("10");

        // 1.005 * 10 = 10.05
        let aggregate =
            PricingResolver::crate_cost(&customer, &prices, &order("100"), &item, RoundingPolicy::Aggregate);
        // round(1.005) = 1.01, * 10 = 10.10
        let unit =
            PricingResolver::crate_cost(&customer, &prices, &order("100"), &item, RoundingPolicy::UnitPrice);

        assert_eq!(aggregate, dec("10.05"));
        assert_eq!(unit, dec("10.10"));
    }

    #[test]
    fn test_half_up_rounding() {
        let customer = priced_customer();
        let prices = vec![price("0.125")];
        let cost = PricingResolver::crate_cost(
            &customer,
            &prices,
            &order("100"),
            &crate_with("1"),
            RoundingPolicy::Aggregate,
        );
        assert_eq!(cost, dec("0.13"));
    }
}
