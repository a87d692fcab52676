// ==========================================
// Bedna workflow - import reconciler
// ==========================================
// Turns canonical rows into an ImportPlan:
// - rows sharing (article, batch) become crates of one order,
//   orders kept in first-seen order
// - specification / head-type names resolved against the catalog
// - crate weights validated
// Nothing is written here; the plan is committed by the order
// repository in a single transaction.
// ==========================================

use crate::domain::catalog::{HeadType, Specification};
use crate::domain::crates::NewCrate;
use crate::domain::customer::Customer;
use crate::domain::import::{ImportIssue, ImportPlan, ImportRow, PlannedOrder, SpecificationRef};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::RepositoryResult;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Read-only catalog access needed to resolve imported names
pub trait CatalogLookup {
    fn specification_by_name(&self, customer_id: i64, name: &str) -> RepositoryResult<Option<Specification>>;
    fn head_type_by_name(&self, name: &str) -> RepositoryResult<Option<HeadType>>;
}

impl CatalogLookup for CatalogRepository {
    fn specification_by_name(&self, customer_id: i64, name: &str) -> RepositoryResult<Option<Specification>> {
        self.find_specification_by_name(customer_id, name)
    }

    fn head_type_by_name(&self, name: &str) -> RepositoryResult<Option<HeadType>> {
        self.find_head_type_by_name(name)
    }
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub plan: ImportPlan,
    pub errors: Vec<ImportIssue>,
    pub warnings: Vec<ImportIssue>,
}

impl Reconciliation {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub struct ImportReconciler<'a> {
    lookup: &'a dyn CatalogLookup,
    allow_placeholder: bool,
}

impl<'a> ImportReconciler<'a> {
    pub fn new(lookup: &'a dyn CatalogLookup, allow_placeholder: bool) -> Self {
        Self {
            lookup,
            allow_placeholder,
        }
    }

    /// Group and resolve rows
    ///
    /// # Errors
    /// Only repository failures; row problems are collected in the
    /// returned Reconciliation.
    pub fn build_plan(
        &self,
        batch_id: &str,
        customer: &Customer,
        shipment_in_id: i64,
        rows: &[ImportRow],
    ) -> ImportResult<Reconciliation> {
        let mut orders: Vec<PlannedOrder> = Vec::new();
        // key -> (slot in orders, first row number)
        let mut index: HashMap<(String, String), (usize, usize)> = HashMap::new();
        let mut rejected: HashSet<(String, String)> = HashSet::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for row in rows {
            let key = row.order_key();
            if rejected.contains(&key) {
                continue;
            }

            let slot = match index.get(&key).copied() {
                Some((slot, first_row)) => {
                    let first = &orders[slot];
                    if row.diameter.is_some()
                        && (row.diameter != Some(first.diameter) || row.length != Some(first.length))
                    {
                        warnings.push(ImportIssue::warning(
                            Some(row.row_number),
                            Some("dimension"),
                            format!(
                                "differs from row {} of the same article and batch, the first row wins",
                                first_row
                            ),
                        ));
                    }
                    slot
                }
                None => match self.plan_order(customer, row, &mut errors, &mut warnings)? {
                    Some(planned) => {
                        orders.push(planned);
                        index.insert(key, (orders.len() - 1, row.row_number));
                        orders.len() - 1
                    }
                    None => {
                        rejected.insert(key);
                        continue;
                    }
                },
            };

            if let Some(new_crate) = Self::plan_crate(row, &mut errors) {
                let order = &mut orders[slot];
                // an urgent row raises the whole order
                order.priority = order.priority.max(row.priority);
                order.crates.push(new_crate);
                order.row_numbers.push(row.row_number);
            }
        }

        orders.retain(|o| !o.crates.is_empty());
        debug!(
            batch_id,
            orders = orders.len(),
            errors = errors.len(),
            warnings = warnings.len(),
            "import rows reconciled"
        );

        Ok(Reconciliation {
            plan: ImportPlan {
                batch_id: batch_id.to_string(),
                customer_id: customer.id,
                shipment_in_id,
                orders,
            },
            errors,
            warnings,
        })
    }

    /// Order-level fields from the first row of a group
    fn plan_order(
        &self,
        customer: &Customer,
        row: &ImportRow,
        errors: &mut Vec<ImportIssue>,
        warnings: &mut Vec<ImportIssue>,
    ) -> ImportResult<Option<PlannedOrder>> {
        // unparseable dimensions were already reported by the strategy
        let (Some(diameter), Some(length)) = (row.diameter, row.length) else {
            return Ok(None);
        };

        let Some(specification) = self.resolve_specification(customer, row, errors, warnings)? else {
            return Ok(None);
        };

        let head_type_id = match row.head_type_name.as_deref() {
            None => None,
            Some(name) => match self.lookup.head_type_by_name(name)? {
                Some(head_type) => Some(head_type.id),
                None => {
                    let error = ImportError::UnknownHeadType {
                        row: row.row_number,
                        name: name.to_string(),
                    };
                    errors.push(ImportIssue::error(
                        Some(row.row_number),
                        Some("head type"),
                        error.to_string(),
                    ));
                    return Ok(None);
                }
            },
        };

        Ok(Some(PlannedOrder {
            article: row.article.clone(),
            batch: row.batch.clone(),
            diameter,
            length,
            specification,
            head_type_id,
            full_thread: row.full_thread,
            description: row.description.clone(),
            priority: row.priority,
            crates: Vec::new(),
            row_numbers: Vec::new(),
        }))
    }

    fn resolve_specification(
        &self,
        customer: &Customer,
        row: &ImportRow,
        errors: &mut Vec<ImportIssue>,
        warnings: &mut Vec<ImportIssue>,
    ) -> ImportResult<Option<SpecificationRef>> {
        let name = row.specification_name.as_deref().unwrap_or("");
        let problem = if name.is_empty() {
            if self.allow_placeholder {
                // the strategy already warned about the blank cell
                return Ok(Some(SpecificationRef::UnknownPlaceholder));
            }
            ImportError::UnknownSpecification {
                row: row.row_number,
                name: String::new(),
            }
        } else {
            match self.lookup.specification_by_name(customer.id, name)? {
                Some(spec) if spec.active => return Ok(Some(SpecificationRef::Existing(spec.id))),
                Some(_) => ImportError::InactiveSpecification {
                    row: row.row_number,
                    name: name.to_string(),
                },
                None => ImportError::UnknownSpecification {
                    row: row.row_number,
                    name: name.to_string(),
                },
            }
        };

        if self.allow_placeholder {
            warnings.push(ImportIssue::warning(
                Some(row.row_number),
                Some("specification"),
                format!("{}, the UNKNOWN placeholder will be used", problem),
            ));
            Ok(Some(SpecificationRef::UnknownPlaceholder))
        } else {
            errors.push(ImportIssue::error(
                Some(row.row_number),
                Some("specification"),
                problem.to_string(),
            ));
            Ok(None)
        }
    }

    fn plan_crate(row: &ImportRow, errors: &mut Vec<ImportIssue>) -> Option<NewCrate> {
        // a missing net weight was already reported by the strategy
        let net_weight = row.net_weight?;
        let mut new_crate = NewCrate::with_weights(net_weight, row.tare_weight.unwrap_or(Decimal::ZERO));
        new_crate.quantity = row.quantity;
        new_crate.material = row.material.clone();
        new_crate.batch = row.batch.clone();
        new_crate.customer_container_no = row.customer_container_no.clone();
        new_crate.notes = row.notes.clone();
        new_crate.phosphate = row.phosphate;

        match new_crate.validate() {
            Ok(()) => Some(new_crate),
            Err(reasons) => {
                errors.extend(
                    reasons
                        .into_iter()
                        .map(|reason| ImportIssue::error(Some(row.row_number), None, reason)),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::PricingModel;
    use std::str::FromStr;

    struct FakeCatalog {
        specifications: Vec<Specification>,
        head_types: Vec<HeadType>,
    }

    impl CatalogLookup for FakeCatalog {
        fn specification_by_name(&self, customer_id: i64, name: &str) -> RepositoryResult<Option<Specification>> {
            Ok(self
                .specifications
                .iter()
                .find(|s| s.customer_id == customer_id && s.name.eq_ignore_ascii_case(name))
                .cloned())
        }

        fn head_type_by_name(&self, name: &str) -> RepositoryResult<Option<HeadType>> {
            Ok(self.head_types.iter().find(|h| h.name.eq_ignore_ascii_case(name)).cloned())
        }
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog {
            specifications: vec![
                Specification { id: 10, customer_id: 1, name: "ZN-12".into(), group: 1, active: true },
                Specification { id: 11, customer_id: 1, name: "OLD".into(), group: 1, active: false },
            ],
            head_types: vec![HeadType { id: 3, name: "Sechskant".into(), description: None }],
        }
    }

    fn customer() -> Customer {
        Customer {
            id: 1,
            code: "EUR".into(),
            name: "Eurotec".into(),
            blast_all: false,
            complete_only: false,
            numbering_range: 100000,
            pricing_model: PricingModel::LengthBracket,
        }
    }

    fn row(n: usize, article: &str, batch: &str, net: &str) -> ImportRow {
        let mut row = ImportRow::new(n, article);
        row.batch = Some(batch.to_string());
        row.diameter = Some(Decimal::from(8));
        row.length = Some(Decimal::from(120));
        row.specification_name = Some("zn-12".into());
        row.net_weight = Some(Decimal::from_str(net).unwrap());
        row
    }

    #[test]
    fn test_same_article_and_batch_become_one_order() {
        let catalog = catalog();
        let rows = vec![
            row(1, "A-1", "C1", "100"),
            row(2, "A-2", "C1", "50"),
            row(3, "A-1", "C1", "80"),
        ];
        let result = ImportReconciler::new(&catalog, false)
            .build_plan("b1", &customer(), 7, &rows)
            .unwrap();

        assert!(!result.has_errors());
        assert_eq!(result.plan.orders.len(), 2);
        let first = &result.plan.orders[0];
        assert_eq!(first.article, "A-1");
        assert_eq!(first.crates.len(), 2);
        assert_eq!(first.row_numbers, vec![1, 3]);
        assert_eq!(first.specification, SpecificationRef::Existing(10));
        assert_eq!(result.plan.crate_count(), 3);
    }

    #[test]
    fn test_reference_errors_are_collected() {
        let catalog = catalog();
        let mut unknown = row(1, "A-1", "C1", "100");
        unknown.specification_name = Some("NOPE".into());
        let mut inactive = row(2, "A-2", "C1", "100");
        inactive.specification_name = Some("old".into());
        let mut head = row(3, "A-3", "C1", "100");
        head.head_type_name = Some("Linsen".into());
        let bad_weight = row(4, "A-4", "C1", "0");

        let result = ImportReconciler::new(&catalog, false)
            .build_plan("b1", &customer(), 7, &[unknown, inactive, head, bad_weight])
            .unwrap();

        let rows: Vec<_> = result.errors.iter().map(|e| e.row_number).collect();
        assert_eq!(rows, vec![Some(1), Some(2), Some(3), Some(4)]);
        assert!(result.errors[1].message.contains("inactive"));
        assert!(result.plan.orders.is_empty());
    }

    #[test]
    fn test_placeholder_downgrades_to_warning() {
        let catalog = catalog();
        let mut unknown = row(1, "R-1", "88", "100");
        unknown.specification_name = Some("NOPE".into());

        let result = ImportReconciler::new(&catalog, true)
            .build_plan("b1", &customer(), 7, &[unknown])
            .unwrap();

        assert!(!result.has_errors());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(
            result.plan.orders[0].specification,
            SpecificationRef::UnknownPlaceholder
        );
    }
}
