// ==========================================
// Crate workflow tests
// ==========================================
// Numbering, transition validation through the api, bulk updates,
// pricing and the audit trail.
// ==========================================

mod test_helpers;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use bedna_workflow::api::ApiError;
use bedna_workflow::config::config_keys;
use bedna_workflow::domain::action_log::{ActionType, EntityKind};
use bedna_workflow::domain::catalog::{NewPrice, NewSpecification};
use bedna_workflow::domain::crates::{CrateUpdate, NewCrate};
use bedna_workflow::domain::customer::NewCustomer;
use bedna_workflow::domain::shipment::NewShipment;
use bedna_workflow::domain::types::{BlastState, CrateState, ShipmentDirection};
use bedna_workflow::engine::pricing::RoundingPolicy;
use bedna_workflow::engine::FieldChange;
use test_helpers::*;

#[test]
fn test_crate_numbers_start_above_range_and_increase() {
    let (_db, state) = create_test_state();
    let eur = seed_customer(&state, "EUR", 100000, false);
    let spx = seed_customer(&state, "SPX", 200000, false);

    let (_, first) = order_with_crates(&state, &eur, "A-1", 2);
    let (_, second) = order_with_crates(&state, &eur, "A-2", 1);
    let (_, other) = order_with_crates(&state, &spx, "S-1", 1);

    let numbers: Vec<i64> = first.iter().chain(second.iter()).map(|c| c.crate_number).collect();
    assert_eq!(numbers, vec![100001, 100002, 100003]);
    assert_eq!(other[0].crate_number, 200001);

    // returned crates address the stored rows
    let stored = state.crate_api.get_crate(other[0].id).unwrap();
    assert_eq!(stored, other[0]);
    assert_eq!(state.crate_api.find_by_number(100002).unwrap().id, first[1].id);
}

#[test]
fn test_concurrent_crate_creation_never_duplicates_numbers() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let order = state
        .order_api
        .create_order(&new_order(&seed, "A-1", "100"), ACTOR)
        .unwrap();

    let crate_api = state.crate_api.clone();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let api = Arc::clone(&crate_api);
            let order_id = order.id;
            thread::spawn(move || {
                let batch = (0..5)
                    .map(|_| NewCrate::with_weights(dec("50"), dec("5")))
                    .collect();
                api.create_crates(order_id, batch, ACTOR).unwrap()
            })
        })
        .collect();

    let mut numbers = HashSet::new();
    for handle in handles {
        for c in handle.join().unwrap() {
            assert!(numbers.insert(c.crate_number), "duplicate crate number {}", c.crate_number);
        }
    }
    assert_eq!(numbers.len(), 20);
    assert_eq!(numbers.iter().min(), Some(&100001));
    assert_eq!(numbers.iter().max(), Some(&100020));
}

#[test]
fn test_blast_all_customer_defaults_crates_to_dirty() {
    let (_db, state) = create_test_state();
    let mut new = NewCustomer::new("RCH", "Richter", 300000);
    new.blast_all = true;
    let customer = state.catalog_api.create_customer(&new, ACTOR).unwrap();
    let spec = state
        .catalog_api
        .create_specification(
            &NewSpecification {
                customer_id: customer.id,
                name: "R-1".to_string(),
                group: 2,
                active: true,
            },
            ACTOR,
        )
        .unwrap();
    let inbound = state
        .shipment_api
        .create_shipment(&NewShipment::inbound(customer.id, date(2024, 1, 8)), ACTOR)
        .unwrap();

    let mut order = new_order_for(inbound.id, spec.id);
    order.article = "R-100".to_string();
    let order = state.order_api.create_order(&order, ACTOR).unwrap();

    let mut explicit = NewCrate::with_weights(dec("10"), dec("1"));
    explicit.blast = Some(BlastState::Clean);
    let created = state
        .crate_api
        .create_crates(
            order.id,
            vec![NewCrate::with_weights(dec("10"), dec("1")), explicit],
            ACTOR,
        )
        .unwrap();
    assert_eq!(created[0].blast, BlastState::Dirty);
    assert_eq!(created[1].blast, BlastState::Clean);
    assert_eq!(created[0].state, CrateState::Received);
}

fn new_order_for(shipment_in_id: i64, specification_id: i64) -> bedna_workflow::domain::order::NewOrder {
    bedna_workflow::domain::order::NewOrder {
        shipment_in_id,
        article: String::new(),
        diameter: dec("6"),
        length: dec("60"),
        specification_id,
        head_type_id: None,
        full_thread: true,
        description: None,
        priority: bedna_workflow::domain::types::Priority::Medium,
        consignee_id: None,
    }
}

#[test]
fn test_invalid_weights_are_rejected_before_numbering() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (order, _) = order_with_crates(&state, &seed, "A-1", 0);

    let err = state
        .crate_api
        .create_crates(order.id, vec![NewCrate::with_weights(dec("0"), dec("1"))], ACTOR)
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    // the failed attempt consumed no number
    let (_, created) = order_with_crates(&state, &seed, "A-2", 1);
    assert_eq!(created[0].crate_number, 100001);
}

#[test]
fn test_illegal_transition_is_rejected_with_reason() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (_, crates) = order_with_crates(&state, &seed, "A-1", 1);

    // RECEIVED cannot jump two stages
    let err = state
        .crate_api
        .update_crate(crates[0].id, &CrateUpdate::state(CrateState::Moved), ACTOR)
        .unwrap_err();
    match err {
        ApiError::TransitionRejected { violations, .. } => {
            assert_eq!(violations.len(), 1);
            assert!(violations[0].reason.contains("MOVED"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(state.crate_api.get_crate(crates[0].id).unwrap().state, CrateState::Received);
}

#[test]
fn test_inspected_waits_for_secondary_processes() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (_, crates) = order_with_crates(&state, &seed, "A-1", 1);
    let id = crates[0].id;

    for next in [
        CrateState::ToBeMoved,
        CrateState::Moved,
        CrateState::InProcess,
        CrateState::HeatTreated,
        CrateState::Inspected,
    ] {
        state.crate_api.update_crate(id, &CrateUpdate::state(next), ACTOR).unwrap();
    }
    let choices = state.crate_api.allowed_choices(id).unwrap();
    assert_eq!(choices.state, vec![CrateState::HeatTreated, CrateState::Inspected]);

    let ready = walk_to_ready(&state, id);
    assert_eq!(ready.state, CrateState::ReadyToShip);
    // secondary fields are frozen once ready
    let frozen = state.crate_api.allowed_choices(id).unwrap();
    assert_eq!(frozen.blast, vec![BlastState::Clean]);
}

#[test]
fn test_bulk_update_requires_uniform_state() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (order, crates) = order_with_crates(&state, &seed, "A-1", 3);

    let moved = state
        .crate_api
        .bulk_update_order(order.id, FieldChange::State(CrateState::ToBeMoved), ACTOR)
        .unwrap();
    assert_eq!(moved.len(), 3);
    assert!(moved.iter().all(|c| c.state == CrateState::ToBeMoved));

    state
        .crate_api
        .update_crate(crates[0].id, &CrateUpdate::state(CrateState::Moved), ACTOR)
        .unwrap();
    let err = state
        .crate_api
        .bulk_update_order(order.id, FieldChange::State(CrateState::Moved), ACTOR)
        .unwrap_err();
    assert!(matches!(err, ApiError::TransitionRejected { .. }));
}

#[test]
fn test_order_cost_uses_half_open_bracket() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    state
        .catalog_api
        .create_price(
            &NewPrice {
                customer_id: seed.customer.id,
                length_min: dec("50"),
                length_max: dec("150"),
                rate_per_kg: dec("2.00"),
                specification_ids: vec![seed.specification.id],
            },
            ACTOR,
        )
        .unwrap();

    let inside = state
        .order_api
        .create_order(&new_order(&seed, "A-1", "100"), ACTOR)
        .unwrap();
    let created = state
        .crate_api
        .create_crates(inside.id, vec![NewCrate::with_weights(dec("4"), dec("1"))], ACTOR)
        .unwrap();
    let cost = state.order_api.order_cost(inside.id).unwrap();
    assert_eq!(cost.unit_price, Some(dec("2.00")));
    assert_eq!(cost.cost, dec("8.00"));
    assert_eq!(cost.rounding, RoundingPolicy::Aggregate);
    assert_eq!(state.crate_api.crate_cost(created[0].id).unwrap(), dec("8.00"));

    let boundary = state
        .order_api
        .create_order(&new_order(&seed, "A-2", "150"), ACTOR)
        .unwrap();
    state
        .crate_api
        .create_crates(boundary.id, vec![NewCrate::with_weights(dec("4"), dec("1"))], ACTOR)
        .unwrap();
    let cost = state.order_api.order_cost(boundary.id).unwrap();
    assert_eq!(cost.unit_price, None);
    assert_eq!(cost.cost, dec("0"));
}

#[test]
fn test_rounding_policy_comes_from_config() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    state
        .config
        .set_value(&config_keys::pricing_rounding("EUR"), "UNIT_PRICE")
        .unwrap();
    state
        .catalog_api
        .create_price(
            &NewPrice {
                customer_id: seed.customer.id,
                length_min: dec("0"),
                length_max: dec("1000"),
                rate_per_kg: dec("0.125"),
                specification_ids: vec![seed.specification.id],
            },
            ACTOR,
        )
        .unwrap();
    let order = state
        .order_api
        .create_order(&new_order(&seed, "A-1", "100"), ACTOR)
        .unwrap();
    state
        .crate_api
        .create_crates(order.id, vec![NewCrate::with_weights(dec("10"), dec("1"))], ACTOR)
        .unwrap();

    let cost = state.order_api.order_cost(order.id).unwrap();
    assert_eq!(cost.rounding, RoundingPolicy::UnitPrice);
    // 0.125 -> 0.13 per kg before multiplying
    assert_eq!(cost.cost, dec("1.30"));
}

#[test]
fn test_order_references_are_validated() {
    let (_db, state) = create_test_state();
    let eur = seed_customer(&state, "EUR", 100000, false);
    let spx = seed_customer(&state, "SPX", 200000, false);

    // specification of another customer
    let mut foreign = new_order(&eur, "A-1", "100");
    foreign.specification_id = spx.specification.id;
    assert!(matches!(
        state.order_api.create_order(&foreign, ACTOR),
        Err(ApiError::BusinessRuleViolation(_))
    ));

    // outbound shipment as receipt
    let mut outbound = new_order(&eur, "A-1", "100");
    outbound.shipment_in_id = eur.outbound.id;
    assert!(matches!(
        state.order_api.create_order(&outbound, ACTOR),
        Err(ApiError::InvalidInput(_))
    ));

    // inactive specification
    state
        .catalog_api
        .set_specification_active(eur.specification.id, false, ACTOR)
        .unwrap();
    assert!(matches!(
        state.order_api.create_order(&new_order(&eur, "A-1", "100"), ACTOR),
        Err(ApiError::BusinessRuleViolation(_))
    ));
}

#[test]
fn test_shipment_sequences_are_scoped_by_direction_and_year() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    assert_eq!(seed.inbound.sequence_no, 1);
    assert_eq!(seed.outbound.sequence_no, 1);

    let second_in = state
        .shipment_api
        .create_shipment(&NewShipment::inbound(seed.customer.id, date(2024, 6, 1)), ACTOR)
        .unwrap();
    let next_year = state
        .shipment_api
        .create_shipment(&NewShipment::inbound(seed.customer.id, date(2025, 1, 2)), ACTOR)
        .unwrap();
    assert_eq!(second_in.sequence_no, 2);
    assert_eq!(second_in.label(), "2. IN EUR 2024");
    assert_eq!(next_year.sequence_no, 1);

    let listed = state
        .shipment_api
        .list_shipments(seed.customer.id, ShipmentDirection::Inbound, 2024)
        .unwrap();
    assert_eq!(listed.len(), 2);

    // consignee only on outbound
    let consignee = state.catalog_api.create_consignee("Lager Nord", None, ACTOR).unwrap();
    let mut bad = NewShipment::inbound(seed.customer.id, date(2024, 6, 3));
    bad.consignee_id = Some(consignee.id);
    assert!(matches!(
        state.shipment_api.create_shipment(&bad, ACTOR),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_crate_history_records_every_change() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (_, crates) = order_with_crates(&state, &seed, "A-1", 1);
    state
        .crate_api
        .update_crate(crates[0].id, &CrateUpdate::state(CrateState::ToBeMoved), ACTOR)
        .unwrap();

    let history = state
        .history_api
        .history_by_name("crate", crates[0].id)
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action_type, ActionType::Create);
    assert_eq!(history[1].action_type, ActionType::Update);
    assert_eq!(history[1].actor, ACTOR);
    assert_eq!(history[1].entity, EntityKind::Crate);
    let after = history[1].after().unwrap();
    assert_eq!(after["state"], "TO_BE_MOVED");
}
