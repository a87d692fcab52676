// ==========================================
// EUR - German delivery list, combined dimension column
// ==========================================
// Priority and phosphating are not columns here; they are read
// from the free-text remark / description.
// ==========================================

use crate::domain::import::{ImportIssue, ImportRow};
use crate::domain::types::Priority;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::import_strategy::{
    ColumnSpec, ImportStrategy, SheetRow, PHOSPHATE_KEYWORDS, URGENT_KEYWORDS,
};

const ARTICLE: &[&str] = &["artikel", "artikelnummer", "artikel-nr.", "article"];
const BATCH: &[&str] = &["charge", "charge-nr.", "batch"];
const DIMENSION: &[&str] = &["abmessung", "maß", "dimension"];
const SPECIFICATION: &[&str] = &["vorschrift", "spezifikation", "specification"];
const HEAD_TYPE: &[&str] = &["kopfform", "kopf", "head type"];
const DESCRIPTION: &[&str] = &["bezeichnung", "description"];
const NET: &[&str] = &["netto", "nettogewicht", "net weight"];
const TARE: &[&str] = &["tara", "tare"];
const QUANTITY: &[&str] = &["stück", "stückzahl", "quantity"];
const MATERIAL: &[&str] = &["werkstoff", "material"];
const CONTAINER: &[&str] = &["behälter", "behälter-nr.", "container"];
const NOTES: &[&str] = &["bemerkung", "notes"];

const FULL_THREAD_KEYWORDS: &[&str] = &["vollgewinde"];

const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { field: "article", aliases: ARTICLE, required: true },
    ColumnSpec { field: "batch", aliases: BATCH, required: false },
    ColumnSpec { field: "dimension", aliases: DIMENSION, required: true },
    ColumnSpec { field: "specification", aliases: SPECIFICATION, required: true },
    ColumnSpec { field: "head type", aliases: HEAD_TYPE, required: false },
    ColumnSpec { field: "description", aliases: DESCRIPTION, required: false },
    ColumnSpec { field: "net weight", aliases: NET, required: true },
    ColumnSpec { field: "tare weight", aliases: TARE, required: false },
    ColumnSpec { field: "quantity", aliases: QUANTITY, required: false },
    ColumnSpec { field: "material", aliases: MATERIAL, required: false },
    ColumnSpec { field: "container", aliases: CONTAINER, required: false },
    ColumnSpec { field: "notes", aliases: NOTES, required: false },
];

pub struct EurStrategy;

impl ImportStrategy for EurStrategy {
    fn code(&self) -> &'static str {
        "EUR"
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        COLUMNS
    }

    fn map_row(&self, row: &SheetRow, issues: &mut Vec<ImportIssue>) -> Option<ImportRow> {
        let article = row.article(ARTICLE, issues)?;
        let mut mapped = ImportRow::new(row.row_number, &article);

        (mapped.diameter, mapped.length) = row.dimension(DIMENSION, issues);
        mapped.batch = row.text(BATCH);
        mapped.specification_name = row.text(SPECIFICATION);
        mapped.head_type_name = row.text(HEAD_TYPE);
        mapped.description = row.text(DESCRIPTION);
        mapped.net_weight = row.required_decimal("net weight", NET, issues);
        mapped.tare_weight = row.decimal("tare weight", TARE, issues);
        mapped.quantity = row.quantity(QUANTITY, issues);
        mapped.material = row.text(MATERIAL);
        mapped.customer_container_no = row.text(CONTAINER);
        mapped.notes = row.text(NOTES);

        let free_text = [mapped.notes.as_deref(), mapped.description.as_deref()];
        if free_text
            .iter()
            .any(|t| DataCleaner::contains_keyword(*t, URGENT_KEYWORDS))
        {
            mapped.priority = Priority::High;
        }
        mapped.phosphate = free_text
            .iter()
            .any(|t| DataCleaner::contains_keyword(*t, PHOSPHATE_KEYWORDS));
        mapped.full_thread = free_text
            .iter()
            .any(|t| DataCleaner::contains_keyword(*t, FULL_THREAD_KEYWORDS));

        Some(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::CsvParser;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const SHEET: &str = "\
Artikel;Charge;Abmessung;Vorschrift;Kopfform;Netto;Tara;Stück;Bemerkung
A-100;C1;8 x 120;ZN-12;Sechskant;500,5;35;1200;
A-100;C1;8x120;ZN-12;Sechskant;480;35;1100;EILIG bitte
A-200;;10 / 80;ZN-12;;300;30;;Phosphatieren
";

    #[test]
    fn test_parse_maps_rows_and_flags() {
        let sheet = CsvParser.parse_text(SHEET, 250).unwrap();
        let outcome = EurStrategy.parse(&sheet, 10);

        assert_eq!(outcome.rows.len(), 3);
        let first = &outcome.rows[0];
        assert_eq!(first.article, "A-100");
        assert_eq!(first.batch.as_deref(), Some("C1"));
        assert_eq!((first.diameter, first.length), (Some(dec("8")), Some(dec("120"))));
        assert_eq!(first.net_weight, Some(dec("500.5")));
        assert_eq!(first.quantity, Some(1200));
        assert_eq!(first.priority, Priority::Low);

        assert_eq!(outcome.rows[1].priority, Priority::High);
        assert!(outcome.rows[2].phosphate);
        assert_eq!(outcome.preview.rows.len(), 3);
    }

    #[test]
    fn test_bad_dimension_is_collected_not_fatal() {
        let sheet = CsvParser.parse_text(SHEET, 250).unwrap();
        let outcome = EurStrategy.parse(&sheet, 10);

        assert_eq!(outcome.errors.len(), 1);
        let error = &outcome.errors[0];
        assert_eq!(error.row_number, Some(3));
        assert_eq!(error.field.as_deref(), Some("dimension"));
        // the row itself survives without numeric dimensions
        assert_eq!(outcome.rows[2].diameter, None);
        assert_eq!(outcome.rows[2].net_weight, Some(dec("300")));
    }

    #[test]
    fn test_missing_required_columns_yield_no_rows() {
        let sheet = CsvParser
            .parse_text("Artikel;Netto\nA-1;10\n", 250)
            .unwrap();
        let outcome = EurStrategy.parse(&sheet, 10);

        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("dimension"));
        assert!(outcome.errors[0].message.contains("specification"));
    }
}
