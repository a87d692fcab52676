use super::core::OrderRepository;
use crate::db::begin_immediate;
use crate::domain::action_log::ActionType;
use crate::domain::import::{ImportCommit, ImportPlan, SpecificationRef};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::customer_repo::CustomerRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::number_ledger::SqliteNumberLedger;
use tracing::info;

impl OrderRepository {
    /// Persist a reconciled import in one transaction.
    ///
    /// Any failure (validation, numbering, constraint) rolls back the
    /// whole batch.
    pub fn commit_import(&self, plan: &ImportPlan, actor: &str) -> RepositoryResult<ImportCommit> {
        let conn = self.get_conn()?;
        let customer = CustomerRepository::find_customer_tx(&conn, plan.customer_id)?
            .ok_or_else(|| RepositoryError::not_found("Customer", plan.customer_id))?;
        let scope = SqliteNumberLedger::crate_scope(customer.id);

        let tx = begin_immediate(&conn)
            .map_err(|e| RepositoryError::from(e).into_numbering_conflict(&scope))?;

        let mut commit = ImportCommit::default();
        for planned in &plan.orders {
            let specification_id = match planned.specification {
                SpecificationRef::Existing(id) => id,
                SpecificationRef::UnknownPlaceholder => {
                    CatalogRepository::ensure_unknown_specification_tx(&tx, customer.id, actor)?.id
                }
            };
            let new_order = planned.to_new_order(plan.shipment_in_id, specification_id);
            let order = Self::create_order_tx(&tx, &new_order, actor, ActionType::Import)?;
            let crates = Self::create_crates_tx(
                &tx,
                &customer,
                order.id,
                planned.crates.clone(),
                actor,
                ActionType::Import,
            )?;

            commit.order_ids.push(order.id);
            commit.crate_ids.extend(crates.iter().map(|c| c.id));
        }

        tx.commit()
            .map_err(|e| RepositoryError::from(e).into_numbering_conflict(&scope))?;
        info!(
            batch_id = %plan.batch_id,
            orders = commit.order_ids.len(),
            crates = commit.crate_ids.len(),
            "import committed"
        );
        Ok(commit)
    }
}
