// ==========================================
// RCH - legacy layout
// ==========================================
// Exported from an old ERP with merged header cells: the weight
// header spans net and tare ("Gewicht", "Gewicht" -> gewicht,
// gewicht.1), the remark header spans two columns. Specification
// names are often stale, so unknown or inactive specifications fall
// back to the UNKNOWN placeholder instead of failing the row.
// ==========================================

use crate::domain::import::{ImportIssue, ImportRow};
use crate::domain::types::Priority;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::import_strategy::{
    ColumnSpec, ImportStrategy, SheetRow, PHOSPHATE_KEYWORDS, URGENT_KEYWORDS,
};

const ARTICLE: &[&str] = &["art.-nr.", "art.nr.", "artikel"];
const BATCH: &[&str] = &["los", "charge"];
const DIMENSION: &[&str] = &["abmessung", "dim"];
const SPECIFICATION: &[&str] = &["vorschrift", "oberfläche"];
const HEAD_TYPE: &[&str] = &["kopf"];
const NET: &[&str] = &["gewicht", "netto"];
const TARE: &[&str] = &["gewicht.1", "tara"];
const QUANTITY: &[&str] = &["stück", "stk"];
const NOTES: &[&str] = &["bemerkung"];
const NOTES_OVERFLOW: &[&str] = &["bemerkung.1"];

const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { field: "article", aliases: ARTICLE, required: true },
    ColumnSpec { field: "batch", aliases: BATCH, required: false },
    ColumnSpec { field: "dimension", aliases: DIMENSION, required: true },
    ColumnSpec { field: "specification", aliases: SPECIFICATION, required: false },
    ColumnSpec { field: "head type", aliases: HEAD_TYPE, required: false },
    ColumnSpec { field: "net weight", aliases: NET, required: true },
    ColumnSpec { field: "tare weight", aliases: TARE, required: false },
    ColumnSpec { field: "quantity", aliases: QUANTITY, required: false },
    ColumnSpec { field: "notes", aliases: NOTES, required: false },
];

pub struct RchStrategy;

impl ImportStrategy for RchStrategy {
    fn code(&self) -> &'static str {
        "RCH"
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        COLUMNS
    }

    fn allows_unknown_specification(&self) -> bool {
        true
    }

    fn map_row(&self, row: &SheetRow, issues: &mut Vec<ImportIssue>) -> Option<ImportRow> {
        let article = row.article(ARTICLE, issues)?;
        let mut mapped = ImportRow::new(row.row_number, &article);

        (mapped.diameter, mapped.length) = row.dimension(DIMENSION, issues);
        mapped.batch = row.text(BATCH);
        mapped.specification_name = row.text(SPECIFICATION);
        mapped.head_type_name = row.text(HEAD_TYPE);
        mapped.net_weight = row.required_decimal("net weight", NET, issues);
        mapped.tare_weight = row.decimal("tare weight", TARE, issues);
        mapped.quantity = row.quantity(QUANTITY, issues);

        let notes: Vec<String> = [row.text(NOTES), row.text(NOTES_OVERFLOW)]
            .into_iter()
            .flatten()
            .collect();
        mapped.notes = (!notes.is_empty()).then(|| notes.join(" "));

        if DataCleaner::contains_keyword(mapped.notes.as_deref(), URGENT_KEYWORDS) {
            mapped.priority = Priority::High;
        }
        mapped.phosphate = DataCleaner::contains_keyword(mapped.notes.as_deref(), PHOSPHATE_KEYWORDS);

        if mapped.specification_name.is_none() {
            issues.push(ImportIssue::warning(
                Some(row.row_number),
                Some("specification"),
                "no specification given, the UNKNOWN placeholder will be used",
            ));
        }

        Some(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::CsvParser;

    #[test]
    fn test_merged_headers_map_to_net_tare_and_notes() {
        let text = "\
Art.-Nr.;Los;Abmessung;Vorschrift;Gewicht;Gewicht;Bemerkung;Bemerkung;
R-1;88;M10x200;;812;40;eilig;phosphatiert;
";
        let sheet = CsvParser.parse_text(text, 250).unwrap();
        let outcome = RchStrategy.parse(&sheet, 10);

        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        let row = &outcome.rows[0];
        assert_eq!(row.net_weight.map(|d| d.to_string()), Some("812".to_string()));
        assert_eq!(row.tare_weight.map(|d| d.to_string()), Some("40".to_string()));
        assert_eq!(row.notes.as_deref(), Some("eilig phosphatiert"));
        assert_eq!(row.priority, Priority::High);
        assert!(row.phosphate);

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].field.as_deref(), Some("specification"));
        assert!(RchStrategy.allows_unknown_specification());
    }
}
