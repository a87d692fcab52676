use super::OrderRepository;
use crate::domain::action_log::EntityKind;
use crate::domain::catalog::NewSpecification;
use crate::domain::crates::{CrateUpdate, NewCrate};
use crate::domain::customer::NewCustomer;
use crate::domain::import::{ImportPlan, PlannedOrder, SpecificationRef};
use crate::domain::order::NewOrder;
use crate::domain::shipment::NewShipment;
use crate::domain::types::{BlastState, CrateState, Priority, StraightenState};
use crate::engine::dispatch::{DispatchPlan, ReturnPlan};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::customer_repo::CustomerRepository;
use crate::repository::error::RepositoryError;
use crate::repository::shipment_repo::ShipmentRepository;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

struct Fixture {
    conn: Arc<Mutex<Connection>>,
    repo: OrderRepository,
    customer_id: i64,
    spec_id: i64,
    shipment_in_id: i64,
    shipment_out_id: i64,
}

fn setup(blast_all: bool) -> Fixture {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    let conn = Arc::new(Mutex::new(conn));

    let mut new_customer = NewCustomer::new("EUR", "Eurotec", 100000);
    new_customer.blast_all = blast_all;
    let customer = CustomerRepository::new(conn.clone())
        .create_customer(&new_customer, "admin")
        .unwrap();
    let spec = CatalogRepository::new(conn.clone())
        .create_specification(
            &NewSpecification {
                customer_id: customer.id,
                name: "ZN".to_string(),
                group: 1,
                active: true,
            },
            "admin",
        )
        .unwrap();
    let shipments = ShipmentRepository::new(conn.clone());
    let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let shipment_in = shipments
        .create_shipment(&NewShipment::inbound(customer.id, date), "admin")
        .unwrap();
    let shipment_out = shipments
        .create_shipment(&NewShipment::outbound(customer.id, date, None), "admin")
        .unwrap();

    Fixture {
        repo: OrderRepository::new(conn.clone()),
        conn,
        customer_id: customer.id,
        spec_id: spec.id,
        shipment_in_id: shipment_in.id,
        shipment_out_id: shipment_out.id,
    }
}

fn new_order(f: &Fixture) -> NewOrder {
    NewOrder {
        shipment_in_id: f.shipment_in_id,
        article: "SCREW-8".to_string(),
        diameter: Decimal::from(8),
        length: Decimal::from(120),
        specification_id: f.spec_id,
        head_type_id: None,
        full_thread: false,
        description: Some("bright".to_string()),
        priority: Priority::Medium,
        consignee_id: None,
    }
}

fn weights() -> NewCrate {
    NewCrate::with_weights(Decimal::from(250), Decimal::from(20))
}

/// Put crates straight into a workflow position, bypassing the transition rules
fn force_workflow(f: &Fixture, ids: &[i64], state: CrateState, blast: BlastState, straighten: StraightenState) {
    let conn = f.conn.lock().unwrap();
    for id in ids {
        conn.execute(
            "UPDATE crate_unit SET state = ?1, blast = ?2, straighten = ?3 WHERE id = ?4",
            params![state.to_db_str(), blast.to_db_str(), straighten.to_db_str(), id],
        )
        .unwrap();
    }
}

fn mark_ready(f: &Fixture, ids: &[i64]) {
    force_workflow(f, ids, CrateState::ReadyToShip, BlastState::Clean, StraightenState::Straight);
}

#[test]
fn test_crate_numbers_continue_from_range() {
    let f = setup(true);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();

    let first = f.repo.create_crates(order.id, vec![weights(), weights()], "op").unwrap();
    let second = f.repo.create_crates(order.id, vec![weights()], "op").unwrap();

    let numbers: Vec<i64> = first.iter().chain(second.iter()).map(|c| c.crate_number).collect();
    assert_eq!(numbers, vec![100001, 100002, 100003]);
    assert!(first.iter().all(|c| c.blast == BlastState::Dirty));
    assert!(first.iter().all(|c| c.state == CrateState::Received));
}

#[test]
fn test_created_crates_carry_their_stored_ids() {
    // the fixture's shipments already hold ledger rows; the first crate adds one more
    let f = setup(false);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();
    let created = f.repo.create_crates(order.id, vec![weights(), weights()], "op").unwrap();

    let stored = f.repo.list_crates(order.id).unwrap();
    let created_ids: Vec<i64> = created.iter().map(|c| c.id).collect();
    let stored_ids: Vec<i64> = stored.iter().map(|c| c.id).collect();
    assert_eq!(created_ids, stored_ids);
    assert_eq!(created[0].crate_number, stored[0].crate_number);

    let history = ActionLogRepository::new(f.conn.clone())
        .list_for_entity(EntityKind::Crate, created[0].id)
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[test]
fn test_update_is_checked_against_the_stored_row() {
    let f = setup(false);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();
    let crates = f.repo.create_crates(order.id, vec![weights()], "op").unwrap();
    let id = crates[0].id;
    force_workflow(&f, &[id], CrateState::Inspected, BlastState::Blasted, StraightenState::Straight);

    // both edits are legal for the INSPECTED row; the second arrives after the first landed
    f.repo
        .update_crate(id, &CrateUpdate::state(CrateState::ReadyToShip), "op")
        .unwrap();
    let mut dirty = CrateUpdate::default();
    dirty.blast = Some(BlastState::Dirty);
    let err = f.repo.update_crate(id, &dirty, "op").unwrap_err();
    assert!(matches!(err, RepositoryError::TransitionRejected { .. }));

    let stored = f.repo.find_crate(id).unwrap().unwrap();
    assert_eq!(stored.state, CrateState::ReadyToShip);
    assert_eq!(stored.blast, BlastState::Blasted);
}

#[test]
fn test_crates_of_dispatched_order_reject_updates() {
    let f = setup(false);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();
    let crates = f.repo.create_crates(order.id, vec![weights()], "op").unwrap();
    mark_ready(&f, &[crates[0].id]);
    f.repo
        .apply_dispatch(
            &[DispatchPlan::FullOrder {
                order_id: order.id,
                shipment_out_id: f.shipment_out_id,
                crate_ids: vec![crates[0].id],
            }],
            "op",
        )
        .unwrap();

    let err = f
        .repo
        .update_crate(crates[0].id, &CrateUpdate::state(CrateState::ReadyToShip), "op")
        .unwrap_err();
    assert!(matches!(err, RepositoryError::OrderDispatched { order_id } if order_id == order.id));
}

#[test]
fn test_deleted_crate_numbers_are_not_reused() {
    let f = setup(false);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();
    f.repo.create_crates(order.id, vec![weights(), weights()], "op").unwrap();
    f.repo.delete_order(order.id, "op").unwrap();

    let again = f.repo.create_order(&new_order(&f), "op").unwrap();
    let created = f.repo.create_crates(again.id, vec![weights()], "op").unwrap();
    assert_eq!(created[0].crate_number, 100003);
}

#[test]
fn test_invalid_weights_write_nothing() {
    let f = setup(false);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();
    let bad = NewCrate::with_weights(Decimal::ZERO, Decimal::ONE);

    let err = f.repo.create_crates(order.id, vec![weights(), bad], "op").unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError(_)));
    assert!(f.repo.list_crates(order.id).unwrap().is_empty());
}

#[test]
fn test_split_dispatch_reparents_crates() {
    let f = setup(false);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();
    let crates = f.repo.create_crates(order.id, vec![weights(), weights(), weights()], "op").unwrap();
    mark_ready(&f, &[crates[0].id, crates[1].id]);

    let plan = DispatchPlan::Split {
        source_order_id: order.id,
        shipment_out_id: f.shipment_out_id,
        new_order: order.descriptive_copy(),
        crate_ids: vec![crates[0].id, crates[1].id],
    };
    let outcome = f.repo.apply_dispatch(&[plan], "op").unwrap().remove(0);
    assert!(outcome.split);

    let shipped = f.repo.find_order(outcome.shipped_order_id).unwrap().unwrap();
    assert!(shipped.dispatched);
    assert_eq!(shipped.shipment_out_id, Some(f.shipment_out_id));
    assert_eq!(shipped.shipment_in_id, f.shipment_in_id);
    assert_eq!(shipped.description.as_deref(), Some("bright"));

    let moved = f.repo.list_crates(shipped.id).unwrap();
    assert_eq!(moved.len(), 2);
    assert!(moved.iter().all(|c| c.state == CrateState::Shipped));

    let source = f.repo.find_order(order.id).unwrap().unwrap();
    assert!(!source.dispatched);
    assert_eq!(source.shipment_out_id, None);
    assert_eq!(f.repo.list_crates(order.id).unwrap().len(), 1);
}

#[test]
fn test_stale_dispatch_plan_is_rejected() {
    let f = setup(false);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();
    let crates = f.repo.create_crates(order.id, vec![weights()], "op").unwrap();
    // planned while ready, then moved back before the dispatch ran
    let plan = DispatchPlan::FullOrder {
        order_id: order.id,
        shipment_out_id: f.shipment_out_id,
        crate_ids: vec![crates[0].id],
    };

    let err = f.repo.apply_dispatch(&[plan], "op").unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError(_)));
    assert!(!f.repo.find_order(order.id).unwrap().unwrap().dispatched);
}

#[test]
fn test_return_resets_order_and_crates() {
    let f = setup(false);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();
    let crates = f.repo.create_crates(order.id, vec![weights()], "op").unwrap();
    mark_ready(&f, &[crates[0].id]);
    f.repo
        .apply_dispatch(
            &[DispatchPlan::FullOrder {
                order_id: order.id,
                shipment_out_id: f.shipment_out_id,
                crate_ids: vec![crates[0].id],
            }],
            "op",
        )
        .unwrap();

    let returned = f
        .repo
        .apply_return(
            &ReturnPlan {
                order_id: order.id,
                crate_ids: vec![crates[0].id],
            },
            "op",
        )
        .unwrap();
    assert!(!returned.dispatched);
    assert_eq!(returned.shipment_out_id, None);
    assert_eq!(
        f.repo.find_crate(crates[0].id).unwrap().unwrap().state,
        CrateState::ReadyToShip
    );

    let history = ActionLogRepository::new(f.conn.clone())
        .list_for_entity(EntityKind::Order, order.id)
        .unwrap();
    assert_eq!(history.len(), 3); // create, dispatch, return

    // a second return of the same plan leaves the order untouched
    let again = f
        .repo
        .apply_return(
            &ReturnPlan {
                order_id: order.id,
                crate_ids: vec![crates[0].id],
            },
            "op",
        )
        .unwrap();
    assert_eq!(again, returned);
    let history = ActionLogRepository::new(f.conn.clone())
        .list_for_entity(EntityKind::Order, order.id)
        .unwrap();
    assert_eq!(history.len(), 3);
}

#[test]
fn test_bulk_updates_are_atomic() {
    let f = setup(false);
    let order = f.repo.create_order(&new_order(&f), "op").unwrap();
    let crates = f.repo.create_crates(order.id, vec![weights(), weights()], "op").unwrap();

    let updates = vec![
        (crates[0].id, CrateUpdate::state(CrateState::ToBeMoved)),
        (9999, CrateUpdate::state(CrateState::ToBeMoved)),
    ];
    assert!(f.repo.apply_crate_updates(&updates, "op").is_err());
    assert_eq!(
        f.repo.find_crate(crates[0].id).unwrap().unwrap().state,
        CrateState::Received
    );
}

#[test]
fn test_commit_import_creates_placeholder_specification() {
    let f = setup(false);
    let planned = PlannedOrder {
        article: "BOLT-10".to_string(),
        batch: Some("B1".to_string()),
        diameter: Decimal::from(10),
        length: Decimal::from(80),
        specification: SpecificationRef::UnknownPlaceholder,
        head_type_id: None,
        full_thread: true,
        description: None,
        priority: Priority::Low,
        crates: vec![weights(), weights()],
        row_numbers: vec![1, 2],
    };
    let plan = ImportPlan {
        batch_id: "batch-1".to_string(),
        customer_id: f.customer_id,
        shipment_in_id: f.shipment_in_id,
        orders: vec![planned],
    };

    let commit = f.repo.commit_import(&plan, "import").unwrap();
    assert_eq!(commit.order_ids.len(), 1);
    assert_eq!(commit.crate_ids.len(), 2);

    let order = f.repo.find_order(commit.order_ids[0]).unwrap().unwrap();
    assert_ne!(order.specification_id, f.spec_id);
    let summary = f.repo.order_summary(order.id).unwrap();
    assert_eq!(summary.crate_count, 2);
    assert_eq!(summary.total_net_weight, Decimal::from(500));
    assert_eq!(summary.counts_by_state.get(&CrateState::Received), Some(&2));
}
