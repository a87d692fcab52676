// ==========================================
// Dispatch workflow tests
// ==========================================
// Split on partial dispatch, in-place full dispatch, reversal,
// complete-only customers and rejected requests.
// ==========================================

mod test_helpers;

use bedna_workflow::api::ApiError;
use bedna_workflow::domain::action_log::{ActionType, EntityKind};
use bedna_workflow::domain::shipment::NewShipment;
use bedna_workflow::domain::types::CrateState;
use bedna_workflow::logging;
use test_helpers::*;

#[test]
fn test_partial_dispatch_splits_order() {
    logging::init_test();
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (order, crates) = order_with_crates(&state, &seed, "A-100", 3);

    walk_to_ready(&state, crates[0].id);
    walk_to_ready(&state, crates[1].id);

    let outcomes = state
        .dispatch_api
        .dispatch_orders(&[order.id], seed.outbound.id, ACTOR)
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert!(outcome.split);
    assert_ne!(outcome.shipped_order_id, order.id);

    // source order keeps the unfinished crate and stays open
    let source = state.order_api.get_order(order.id).unwrap();
    assert!(!source.dispatched);
    assert_eq!(source.shipment_out_id, None);
    let remaining = state.crate_api.list_crates(order.id).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, crates[2].id);
    assert_eq!(remaining[0].state, CrateState::Received);

    // split-off order copies the descriptive fields and carries the shipped crates
    let shipped = state.order_api.get_order(outcome.shipped_order_id).unwrap();
    assert!(shipped.dispatched);
    assert_eq!(shipped.shipment_out_id, Some(seed.outbound.id));
    assert_eq!(shipped.shipment_in_id, order.shipment_in_id);
    assert_eq!(shipped.article, order.article);
    assert_eq!(shipped.specification_id, order.specification_id);
    assert_eq!(shipped.head_type_id, order.head_type_id);

    let moved = state.crate_api.list_crates(shipped.id).unwrap();
    assert_eq!(moved.len(), 2);
    assert!(moved.iter().all(|c| c.state == CrateState::Shipped));
    // crate numbers survive re-parenting
    let mut numbers: Vec<i64> = moved.iter().map(|c| c.crate_number).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![crates[0].crate_number, crates[1].crate_number]);
}

#[test]
fn test_fully_ready_order_ships_in_place() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (order, crates) = order_with_crates(&state, &seed, "A-200", 2);
    for c in &crates {
        walk_to_ready(&state, c.id);
    }

    let outcomes = state
        .dispatch_api
        .dispatch_orders(&[order.id], seed.outbound.id, ACTOR)
        .unwrap();
    assert!(!outcomes[0].split);
    assert_eq!(outcomes[0].shipped_order_id, order.id);

    let shipped = state.order_api.get_order(order.id).unwrap();
    assert!(shipped.dispatched);
    assert!(state
        .crate_api
        .list_crates(order.id)
        .unwrap()
        .iter()
        .all(|c| c.state == CrateState::Shipped));
    assert_eq!(
        state.order_api.list_orders_for_shipment(seed.inbound.id).unwrap().len(),
        1
    );
}

#[test]
fn test_return_from_dispatch_and_repeat_is_noop() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (order, crates) = order_with_crates(&state, &seed, "A-300", 2);
    for c in &crates {
        walk_to_ready(&state, c.id);
    }
    state
        .dispatch_api
        .dispatch_orders(&[order.id], seed.outbound.id, ACTOR)
        .unwrap();

    let returned = state.dispatch_api.return_from_dispatch(order.id, ACTOR).unwrap();
    assert!(!returned.dispatched);
    assert_eq!(returned.shipment_out_id, None);
    assert!(state
        .crate_api
        .list_crates(order.id)
        .unwrap()
        .iter()
        .all(|c| c.state == CrateState::ReadyToShip));

    let again = state.dispatch_api.return_from_dispatch(order.id, ACTOR).unwrap();
    assert_eq!(again, returned);

    let history = state.history_api.history(EntityKind::Order, order.id).unwrap();
    let returns = history
        .iter()
        .filter(|h| h.action_type == ActionType::ReturnFromDispatch)
        .count();
    assert_eq!(returns, 1);
}

#[test]
fn test_complete_only_customer_rejects_partial_dispatch() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "SPX", 200000, true);
    let (order, crates) = order_with_crates(&state, &seed, "S-1", 2);
    walk_to_ready(&state, crates[0].id);

    let err = state
        .dispatch_api
        .dispatch_orders(&[order.id], seed.outbound.id, ACTOR)
        .unwrap_err();
    match err {
        ApiError::DispatchRejected { violations, .. } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].entity_id, Some(order.id));
        }
        other => panic!("unexpected {:?}", other),
    }

    // nothing moved
    assert!(!state.order_api.get_order(order.id).unwrap().dispatched);
    assert_eq!(state.crate_api.get_crate(crates[0].id).unwrap().state, CrateState::ReadyToShip);
}

#[test]
fn test_rejection_names_every_failing_order_and_writes_nothing() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (ready, ready_crates) = order_with_crates(&state, &seed, "A-1", 1);
    walk_to_ready(&state, ready_crates[0].id);
    let (idle, _) = order_with_crates(&state, &seed, "A-2", 1);

    let err = state
        .dispatch_api
        .dispatch_orders(&[ready.id, idle.id], seed.outbound.id, ACTOR)
        .unwrap_err();
    match &err {
        ApiError::DispatchRejected { reason, violations } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].entity_id, Some(idle.id));
            assert!(reason.contains(&format!("order {}", idle.id)));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(!state.order_api.get_order(ready.id).unwrap().dispatched);
}

#[test]
fn test_dispatch_needs_outbound_shipment_of_same_customer() {
    let (_db, state) = create_test_state();
    let eur = seed_customer(&state, "EUR", 100000, false);
    let spx = seed_customer(&state, "SPX", 200000, false);
    let (order, crates) = order_with_crates(&state, &eur, "A-1", 1);
    walk_to_ready(&state, crates[0].id);

    let inbound_err = state
        .dispatch_api
        .dispatch_orders(&[order.id], eur.inbound.id, ACTOR)
        .unwrap_err();
    assert!(matches!(inbound_err, ApiError::DispatchRejected { .. }));

    let foreign_err = state
        .dispatch_api
        .dispatch_orders(&[order.id], spx.outbound.id, ACTOR)
        .unwrap_err();
    assert!(foreign_err.to_string().contains("another customer"));
}

#[test]
fn test_dispatch_selected_crates_groups_by_order() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (first, first_crates) = order_with_crates(&state, &seed, "A-1", 2);
    let (second, second_crates) = order_with_crates(&state, &seed, "A-2", 1);
    for c in first_crates.iter().chain(second_crates.iter()) {
        walk_to_ready(&state, c.id);
    }

    let outcomes = state
        .dispatch_api
        .dispatch_crates(&[first_crates[0].id, second_crates[0].id], seed.outbound.id, ACTOR)
        .unwrap();
    assert_eq!(outcomes.len(), 2);

    let first_outcome = outcomes.iter().find(|o| o.source_order_id == first.id).unwrap();
    assert!(first_outcome.split);
    let second_outcome = outcomes.iter().find(|o| o.source_order_id == second.id).unwrap();
    assert!(!second_outcome.split);

    // the unselected ready crate stays behind
    let left = state.crate_api.list_crates(first.id).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].state, CrateState::ReadyToShip);
}

#[test]
fn test_dispatched_order_is_read_only() {
    let (_db, state) = create_test_state();
    let seed = seed_customer(&state, "EUR", 100000, false);
    let (order, crates) = order_with_crates(&state, &seed, "A-1", 1);
    walk_to_ready(&state, crates[0].id);
    state
        .dispatch_api
        .dispatch_orders(&[order.id], seed.outbound.id, ACTOR)
        .unwrap();

    let edit = bedna_workflow::domain::order::OrderUpdate {
        article: Some("A-9".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        state.order_api.update_order(order.id, &edit, ACTOR),
        Err(ApiError::OrderDispatched { .. })
    ));
    assert!(matches!(
        state.dispatch_api.dispatch_orders(&[order.id], seed.outbound.id, ACTOR),
        Err(ApiError::DispatchRejected { .. })
    ));

    // a second outbound truck for the same customer gets the next sequence
    let next = state
        .shipment_api
        .create_shipment(&NewShipment::outbound(seed.customer.id, date(2024, 5, 2), None), ACTOR)
        .unwrap();
    assert_eq!(next.sequence_no, seed.outbound.sequence_no + 1);
}
