// ==========================================
// SPX - English packing list
// ==========================================
// Separate diameter / length columns, explicit tare per box and
// explicit priority / phosphate / full-thread columns.
// ==========================================

use crate::domain::import::{ImportIssue, ImportRow};
use crate::domain::types::Priority;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::import_strategy::{ColumnSpec, ImportStrategy, SheetRow, URGENT_KEYWORDS};

const ARTICLE: &[&str] = &["part number", "article", "artikel"];
const BATCH: &[&str] = &["lot", "batch", "charge"];
const DIAMETER: &[&str] = &["diameter", "durchmesser", "d"];
const LENGTH: &[&str] = &["length", "länge", "l"];
const SPECIFICATION: &[&str] = &["specification", "coating", "vorschrift"];
const HEAD_TYPE: &[&str] = &["head", "head type", "kopf"];
const DESCRIPTION: &[&str] = &["description", "bezeichnung"];
const NET: &[&str] = &["net", "net weight", "netto"];
const TARE: &[&str] = &["tare", "tare weight", "tara"];
const QUANTITY: &[&str] = &["pcs", "quantity", "stück"];
const CONTAINER: &[&str] = &["box", "box no", "container"];
const PRIORITY: &[&str] = &["priority", "priorität"];
const PHOSPHATE: &[&str] = &["phosphate", "phosphatieren"];
const FULL_THREAD: &[&str] = &["full thread", "vollgewinde"];
const NOTES: &[&str] = &["remarks", "notes", "bemerkung"];

const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { field: "article", aliases: ARTICLE, required: true },
    ColumnSpec { field: "batch", aliases: BATCH, required: false },
    ColumnSpec { field: "diameter", aliases: DIAMETER, required: true },
    ColumnSpec { field: "length", aliases: LENGTH, required: true },
    ColumnSpec { field: "specification", aliases: SPECIFICATION, required: true },
    ColumnSpec { field: "head type", aliases: HEAD_TYPE, required: false },
    ColumnSpec { field: "description", aliases: DESCRIPTION, required: false },
    ColumnSpec { field: "net weight", aliases: NET, required: true },
    ColumnSpec { field: "tare weight", aliases: TARE, required: true },
    ColumnSpec { field: "quantity", aliases: QUANTITY, required: false },
    ColumnSpec { field: "container", aliases: CONTAINER, required: false },
    ColumnSpec { field: "priority", aliases: PRIORITY, required: false },
    ColumnSpec { field: "phosphate", aliases: PHOSPHATE, required: false },
    ColumnSpec { field: "full thread", aliases: FULL_THREAD, required: false },
    ColumnSpec { field: "notes", aliases: NOTES, required: false },
];

pub struct SpxStrategy;

impl SpxStrategy {
    fn priority(row: &SheetRow, notes: Option<&str>) -> Priority {
        let explicit = row.get(PRIORITY).map(str::to_lowercase);
        match explicit.as_deref() {
            Some("high" | "hoch" | "urgent" | "eilig") => Priority::High,
            Some("medium" | "mittel") => Priority::Medium,
            _ if DataCleaner::contains_keyword(notes, URGENT_KEYWORDS) => Priority::High,
            _ => Priority::Low,
        }
    }

    fn dimension_part(
        row: &SheetRow,
        field: &str,
        aliases: &[&str],
        issues: &mut Vec<ImportIssue>,
    ) -> Option<rust_decimal::Decimal> {
        let value = row.required_decimal(field, aliases, issues)?;
        if value.is_sign_positive() && !value.is_zero() {
            Some(value)
        } else {
            issues.push(ImportIssue::error(
                Some(row.row_number),
                Some(field),
                format!("{} must be positive", field),
            ));
            None
        }
    }
}

impl ImportStrategy for SpxStrategy {
    fn code(&self) -> &'static str {
        "SPX"
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        COLUMNS
    }

    fn map_row(&self, row: &SheetRow, issues: &mut Vec<ImportIssue>) -> Option<ImportRow> {
        let article = row.article(ARTICLE, issues)?;
        let mut mapped = ImportRow::new(row.row_number, &article);

        mapped.diameter = Self::dimension_part(row, "diameter", DIAMETER, issues);
        mapped.length = Self::dimension_part(row, "length", LENGTH, issues);
        mapped.batch = row.text(BATCH);
        mapped.specification_name = row.text(SPECIFICATION);
        mapped.head_type_name = row.text(HEAD_TYPE);
        mapped.description = row.text(DESCRIPTION);
        mapped.net_weight = row.required_decimal("net weight", NET, issues);
        mapped.tare_weight = row.required_decimal("tare weight", TARE, issues);
        mapped.quantity = row.quantity(QUANTITY, issues);
        mapped.customer_container_no = row.text(CONTAINER);
        mapped.notes = row.text(NOTES);
        mapped.priority = Self::priority(row, mapped.notes.as_deref());
        mapped.phosphate = row.flag(PHOSPHATE);
        mapped.full_thread = row.flag(FULL_THREAD);

        Some(mapped)
    }
}
