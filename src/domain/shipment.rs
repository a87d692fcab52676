// ==========================================
// Bedna workflow - shipment (kamion)
// ==========================================
// One truck movement. sequence_no is scoped to
// (customer, direction, calendar year of date) and never reassigned.
// ==========================================

use crate::domain::types::ShipmentDirection;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: i64,
    pub customer_id: i64,
    pub customer_code: String,
    pub consignee_id: Option<i64>, // OUTBOUND only
    pub date: NaiveDate,
    pub delivery_note: Option<String>, // external delivery-note number
    pub direction: ShipmentDirection,
    pub sequence_no: i64,
}

impl Shipment {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Delivery-note style label, e.g. "3. OUT EUR 2024"
    pub fn label(&self) -> String {
        format!(
            "{}. {} {} {}",
            self.sequence_no,
            self.direction.short_tag(),
            self.customer_code,
            self.year()
        )
    }
}

/// Shipment before sequence assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShipment {
    pub customer_id: i64,
    pub consignee_id: Option<i64>,
    pub date: NaiveDate,
    pub delivery_note: Option<String>,
    pub direction: ShipmentDirection,
}

impl NewShipment {
    pub fn inbound(customer_id: i64, date: NaiveDate) -> Self {
        Self {
            customer_id,
            consignee_id: None,
            date,
            delivery_note: None,
            direction: ShipmentDirection::Inbound,
        }
    }

    pub fn outbound(customer_id: i64, date: NaiveDate, consignee_id: Option<i64>) -> Self {
        Self {
            customer_id,
            consignee_id,
            date,
            delivery_note: None,
            direction: ShipmentDirection::Outbound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let shipment = Shipment {
            id: 1,
            customer_id: 1,
            customer_code: "EUR".to_string(),
            consignee_id: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            delivery_note: None,
            direction: ShipmentDirection::Outbound,
            sequence_no: 3,
        };
        assert_eq!(shipment.label(), "3. OUT EUR 2024");
    }
}
