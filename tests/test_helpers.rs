// ==========================================
// Test helpers
// ==========================================
// Temporary databases, seeded reference data and crate walkers
// shared by the integration tests.
// ==========================================

#![allow(dead_code)]

use std::error::Error;
use std::str::FromStr;

use bedna_workflow::app::AppState;
use bedna_workflow::domain::catalog::{HeadType, NewSpecification, Specification};
use bedna_workflow::domain::crates::{Crate, CrateUpdate, NewCrate};
use bedna_workflow::domain::customer::{Customer, NewCustomer};
use bedna_workflow::domain::order::{NewOrder, Order};
use bedna_workflow::domain::shipment::{NewShipment, Shipment};
use bedna_workflow::domain::types::{BlastState, CrateState, PricingModel, Priority, StraightenState};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::NamedTempFile;

pub const ACTOR: &str = "tester";

/// Create a temporary database file
///
/// # Returns
/// - NamedTempFile: keep alive for the duration of the test
/// - String: database path
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("temp path is not UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

/// AppState over a fresh temporary database
pub fn create_test_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("temp db");
    let state = AppState::new(db_path).expect("app state");
    (temp_file, state)
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==========================================
// Seed data
// ==========================================

/// One customer with a specification, a head type and one shipment per direction
pub struct Seed {
    pub customer: Customer,
    pub specification: Specification,
    pub head_type: HeadType,
    pub inbound: Shipment,
    pub outbound: Shipment,
}

pub fn seed_customer(state: &AppState, code: &str, range: i64, complete_only: bool) -> Seed {
    let mut new = NewCustomer::new(code, &format!("{} GmbH", code), range);
    new.complete_only = complete_only;
    new.pricing_model = PricingModel::LengthBracket;
    let customer = state.catalog_api.create_customer(&new, ACTOR).unwrap();

    let specification = state
        .catalog_api
        .create_specification(
            &NewSpecification {
                customer_id: customer.id,
                name: "V-100".to_string(),
                group: 1,
                active: true,
            },
            ACTOR,
        )
        .unwrap();
    let head_type = state
        .catalog_api
        .create_head_type(&format!("{}-HEX", code), Some("hexagon"), ACTOR)
        .unwrap();

    let inbound = state
        .shipment_api
        .create_shipment(&NewShipment::inbound(customer.id, date(2024, 3, 4)), ACTOR)
        .unwrap();
    let outbound = state
        .shipment_api
        .create_shipment(&NewShipment::outbound(customer.id, date(2024, 3, 11), None), ACTOR)
        .unwrap();

    Seed {
        customer,
        specification,
        head_type,
        inbound,
        outbound,
    }
}

pub fn new_order(seed: &Seed, article: &str, length: &str) -> NewOrder {
    NewOrder {
        shipment_in_id: seed.inbound.id,
        article: article.to_string(),
        diameter: dec("8"),
        length: dec(length),
        specification_id: seed.specification.id,
        head_type_id: Some(seed.head_type.id),
        full_thread: false,
        description: None,
        priority: Priority::Low,
        consignee_id: None,
    }
}

/// Order with `count` crates of 100 kg net / 10 kg tare
pub fn order_with_crates(state: &AppState, seed: &Seed, article: &str, count: usize) -> (Order, Vec<Crate>) {
    let order = state
        .order_api
        .create_order(&new_order(seed, article, "100"), ACTOR)
        .unwrap();
    let crates = (0..count)
        .map(|_| NewCrate::with_weights(dec("100"), dec("10")))
        .collect();
    let created = state.crate_api.create_crates(order.id, crates, ACTOR).unwrap();
    (order, created)
}

/// Drive a crate through the workflow to READY_TO_SHIP using legal single steps
pub fn walk_to_ready(state: &AppState, crate_id: i64) -> Crate {
    let mut update = CrateUpdate::default();
    update.blast = Some(BlastState::Clean);
    update.straighten = Some(StraightenState::Straight);
    state.crate_api.update_crate(crate_id, &update, ACTOR).unwrap();

    let mut current = state.crate_api.get_crate(crate_id).unwrap();
    while current.state != CrateState::ReadyToShip {
        let next = current.state.next().unwrap();
        current = state
            .crate_api
            .update_crate(crate_id, &CrateUpdate::state(next), ACTOR)
            .unwrap();
    }
    current
}
