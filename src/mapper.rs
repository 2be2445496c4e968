//! Entity mappers: pure functions that shape standardized rows into
//! mapping-ready records. They never touch persistence; write order and
//! transaction boundaries belong to the orchestrator.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::model::{
    CatalogItemRecord, ConsolidationCategory, DurationType, FactRecord, ItemId,
    OrganizationRecord, ReportId, ReportRecord,
};
use crate::period::{extract_fiscal_year, extract_quarter};
use crate::table::{locate_fact, FactValue, StandardRow};
use chrono::NaiveDate;
use log::{error, warn};
use std::collections::{HashMap, HashSet};

/// Namespace prefix carried by statement-fact element ids.
pub const STATEMENT_FACT_PREFIX: &str = "jppfs_cor:";

/// The exact source label that classifies a row as consolidated.
pub const CONSOLIDATED_LABEL: &str = "連結";

/// Substring of a context id that marks a flow-over-a-period fact.
const DURATION_CONTEXT_MARKER: &str = "Duration";

/// Extracts organization data according to `[xbrl_mapping.company]`.
///
/// The external identifier and display name are mandatory; if either is
/// missing from the rows the document is rejected wholesale.
pub fn map_organization(
    rows: &[StandardRow],
    config: &PipelineConfig,
) -> Result<OrganizationRecord> {
    let mapping = config.company_mapping()?;

    let edinet_code = locate_text(rows, &mapping.edinet_code);
    let name = locate_text(rows, &mapping.company_name);
    let security_code = mapping
        .security_code
        .as_deref()
        .and_then(|id| locate_text(rows, id));
    let industry_code = mapping
        .industry_code
        .as_deref()
        .and_then(|id| locate_text(rows, id));

    match (edinet_code, name) {
        (Some(edinet_code), Some(name)) => Ok(OrganizationRecord {
            edinet_code,
            security_code,
            industry_code,
            name,
        }),
        (edinet_code, name) => {
            let mut missing = Vec::new();
            if edinet_code.is_none() {
                missing.push("edinet_code");
            }
            if name.is_none() {
                missing.push("company_name");
            }
            let joined = missing.join(", ");
            error!("Required organization fields not found: {}", joined);
            Err(PipelineError::MissingRequiredFields(joined))
        }
    }
}

/// Extracts report data according to `[xbrl_mapping.financial_report]`,
/// resolving the composite fiscal-period label into a fiscal year and a
/// quarter code.
///
/// An absent or empty label is rejected with a distinct error from a
/// label that is present but unparsable, so operators can tell a missing
/// filing from a malformed one.
pub fn map_report(rows: &[StandardRow], config: &PipelineConfig) -> Result<ReportRecord> {
    let mapping = config.report_mapping()?;

    let label = match locate_text(rows, &mapping.fiscal_year_and_quarter) {
        Some(label) if !label.trim().is_empty() => label,
        _ => {
            error!("Fiscal period label is missing or empty; aborting document");
            return Err(PipelineError::EmptyPeriodLabel);
        }
    };

    let fiscal_year = extract_fiscal_year(&label).ok_or_else(|| {
        error!("Fiscal year extraction failed for '{}'", label);
        PipelineError::UnparsableFiscalYear(label.clone())
    })?;

    let quarter = extract_quarter(&label).ok_or_else(|| {
        error!("Quarter extraction failed for '{}'", label);
        PipelineError::UnparsableQuarter(label.clone())
    })?;

    let document_type = mapping
        .document_type
        .as_deref()
        .and_then(|id| locate_text(rows, id));
    let period_end = mapping
        .fiscal_year_end
        .as_deref()
        .and_then(|id| locate_text(rows, id))
        .and_then(|text| parse_date_lenient(&text));
    let filing_date = mapping
        .filing_date
        .as_deref()
        .and_then(|id| locate_text(rows, id))
        .and_then(|text| parse_date_lenient(&text));

    Ok(ReportRecord {
        document_type,
        fiscal_year,
        quarter: Some(quarter),
        period_end,
        filing_date,
    })
}

/// Filters statement-fact rows and shapes them into the global catalog
/// master list: one candidate per distinct element id (keep-first).
///
/// The consolidation category is a closed two-way classification: exactly
/// the consolidated label maps to `Consolidated`, everything else to
/// `Non-consolidated`.
pub fn map_catalog_items(rows: &[StandardRow]) -> Vec<CatalogItemRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut items = Vec::new();

    for row in statement_fact_rows(rows) {
        if !seen.insert(row.element_id.as_str()) {
            continue;
        }

        let category = if row.consolidated_type == CONSOLIDATED_LABEL {
            ConsolidationCategory::Consolidated
        } else {
            ConsolidationCategory::NonConsolidated
        };

        items.push(CatalogItemRecord {
            element_id: row.element_id.clone(),
            item_name: row.item_name_jp.clone(),
            category,
            unit_type: non_empty(&row.unit_id),
        });
    }

    items
}

/// Shapes statement-fact rows into fact records for one report.
///
/// The item-id map must be pre-populated with every element id present in
/// the filtered rows; a missing entry means the orchestrator flushed the
/// catalog incompletely and the document must not be persisted.
pub fn map_facts(
    rows: &[StandardRow],
    report_id: ReportId,
    item_id_map: &HashMap<String, ItemId>,
) -> Result<Vec<FactRecord>> {
    let mut facts = Vec::new();

    for row in statement_fact_rows(rows) {
        let item_id = *item_id_map
            .get(&row.element_id)
            .ok_or_else(|| PipelineError::UnmappedElementId(row.element_id.clone()))?;

        let duration_type = if row.context_id.contains(DURATION_CONTEXT_MARKER) {
            DurationType::Duration
        } else {
            DurationType::Instant
        };

        facts.push(FactRecord {
            report_id,
            item_id,
            duration_type,
            context_id: row.context_id.clone(),
            period_type: row.period_type.clone(),
            consolidated_type: row.consolidated_type.clone(),
            value: row.value,
            value_text: row.value_text.clone(),
            is_numeric: row.is_numeric,
        });
    }

    Ok(facts)
}

fn statement_fact_rows(rows: &[StandardRow]) -> impl Iterator<Item = &StandardRow> {
    rows.iter()
        .filter(|r| r.element_id.starts_with(STATEMENT_FACT_PREFIX))
}

fn locate_text(rows: &[StandardRow], element_id: &str) -> Option<String> {
    locate_fact(rows, element_id, None).map(FactValue::into_text)
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_date_lenient(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    warn!("Could not parse date '{}'; storing as absent", trimmed);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompanyMapping, PipelineConfig, ReportMapping, XbrlMapping};
    use crate::model::Quarter;

    fn row(element_id: &str, item_name: &str, context_id: &str, value: &str) -> StandardRow {
        let parsed = value.trim().parse::<f64>().ok();
        StandardRow {
            element_id: element_id.to_string(),
            item_name_jp: item_name.to_string(),
            context_id: context_id.to_string(),
            fiscal_year_relative: "当期".to_string(),
            consolidated_type: "連結".to_string(),
            period_type: "期間".to_string(),
            unit_id: "JPY".to_string(),
            unit_name: "円".to_string(),
            value: parsed,
            value_text: if parsed.is_some() {
                None
            } else {
                Some(value.to_string())
            },
            is_numeric: parsed.is_some(),
        }
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            xbrl_mapping: XbrlMapping {
                company: Some(CompanyMapping {
                    edinet_code: "jpdei_cor:EDINETCodeDEI".to_string(),
                    company_name: "jpdei_cor:FilerNameInJapaneseDEI".to_string(),
                    security_code: Some("jpdei_cor:SecurityCodeDEI".to_string()),
                    industry_code: None,
                }),
                financial_report: Some(ReportMapping {
                    fiscal_year_and_quarter: "jpcrp_cor:FiscalYearCoverPage".to_string(),
                    document_type: Some("jpdei_cor:DocumentTypeDEI".to_string()),
                    fiscal_year_end: Some("jpdei_cor:CurrentPeriodEndDateDEI".to_string()),
                    filing_date: None,
                }),
            },
        }
    }

    fn document_rows() -> Vec<StandardRow> {
        vec![
            row("jpdei_cor:EDINETCodeDEI", "EDINETコード", "FilingDateInstant", "E01234"),
            row("jpdei_cor:FilerNameInJapaneseDEI", "提出者名", "FilingDateInstant", "テスト株式会社"),
            row("jpdei_cor:SecurityCodeDEI", "証券コード", "FilingDateInstant", "13010"),
            row("jpdei_cor:DocumentTypeDEI", "様式", "FilingDateInstant", "四半期報告書"),
            row("jpdei_cor:CurrentPeriodEndDateDEI", "当会計期間終了日", "FilingDateInstant", "2023-12-31"),
            row(
                "jpcrp_cor:FiscalYearCoverPage",
                "事業年度",
                "FilingDateInstant",
                "第121期 第３四半期(自 2023年10月1日 至 2023年12月31日)",
            ),
            row("jppfs_cor:NetSales", "売上高", "CurrentYTDDuration", "1000"),
            row("jppfs_cor:CashAndDeposits", "現金及び預金", "CurrentQuarterInstant", "500"),
        ]
    }

    #[test]
    fn test_map_organization() {
        let record = map_organization(&document_rows(), &test_config()).unwrap();
        assert_eq!(record.edinet_code, "E01234");
        assert_eq!(record.name, "テスト株式会社");
        assert_eq!(record.security_code.as_deref(), Some("13010"));
        assert!(record.industry_code.is_none());
    }

    #[test]
    fn test_map_organization_missing_required_fields() {
        let rows: Vec<StandardRow> = document_rows()
            .into_iter()
            .filter(|r| r.element_id != "jpdei_cor:FilerNameInJapaneseDEI")
            .collect();

        let err = map_organization(&rows, &test_config()).unwrap_err();
        match err {
            PipelineError::MissingRequiredFields(fields) => {
                assert!(fields.contains("company_name"));
                assert!(!fields.contains("edinet_code"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_organization_missing_config_section() {
        let mut config = test_config();
        config.xbrl_mapping.company = None;

        assert!(matches!(
            map_organization(&document_rows(), &config),
            Err(PipelineError::MissingConfigSection("xbrl_mapping.company"))
        ));
    }

    #[test]
    fn test_map_report() {
        let record = map_report(&document_rows(), &test_config()).unwrap();
        assert_eq!(record.fiscal_year, "2023");
        assert_eq!(record.quarter, Some(Quarter::Q3));
        assert_eq!(record.document_type.as_deref(), Some("四半期報告書"));
        assert_eq!(
            record.period_end,
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
        assert!(record.filing_date.is_none());
    }

    #[test]
    fn test_map_report_empty_label_vs_gibberish() {
        // Label row absent entirely: missing-required style error.
        let rows: Vec<StandardRow> = document_rows()
            .into_iter()
            .filter(|r| r.element_id != "jpcrp_cor:FiscalYearCoverPage")
            .collect();
        assert!(matches!(
            map_report(&rows, &test_config()),
            Err(PipelineError::EmptyPeriodLabel)
        ));

        // Label present but gibberish: distinct unparsable error.
        let mut rows = document_rows();
        for row in rows.iter_mut() {
            if row.element_id == "jpcrp_cor:FiscalYearCoverPage" {
                row.value_text = Some("意味不明なラベル".to_string());
            }
        }
        assert!(matches!(
            map_report(&rows, &test_config()),
            Err(PipelineError::UnparsableFiscalYear(_))
        ));
    }

    #[test]
    fn test_map_report_year_ok_but_quarter_missing() {
        let mut rows = document_rows();
        for row in rows.iter_mut() {
            if row.element_id == "jpcrp_cor:FiscalYearCoverPage" {
                row.value_text = Some("(自 2023年4月1日 至 2024年3月31日)".to_string());
            }
        }
        assert!(matches!(
            map_report(&rows, &test_config()),
            Err(PipelineError::UnparsableQuarter(_))
        ));
    }

    #[test]
    fn test_map_catalog_items_filters_and_dedups() {
        let mut rows = document_rows();
        // Duplicate element id with a different context: keep-first.
        rows.push(row("jppfs_cor:NetSales", "売上高", "PriorYTDDuration", "900"));

        let items = map_catalog_items(&rows);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].element_id, "jppfs_cor:NetSales");
        assert_eq!(items[0].item_name, "売上高");
        assert_eq!(items[0].category, ConsolidationCategory::Consolidated);
        assert_eq!(items[0].unit_type.as_deref(), Some("JPY"));
    }

    #[test]
    fn test_map_catalog_items_empty_input() {
        assert!(map_catalog_items(&[]).is_empty());

        // Rows without the statement-fact prefix also yield nothing.
        let rows = vec![row("jpdei_cor:EDINETCodeDEI", "EDINETコード", "c", "E01234")];
        assert!(map_catalog_items(&rows).is_empty());
    }

    #[test]
    fn test_map_catalog_items_category_classification() {
        let mut consolidated = row("jppfs_cor:A", "a", "c", "1");
        consolidated.consolidated_type = "連結".to_string();
        let mut individual = row("jppfs_cor:B", "b", "c", "1");
        individual.consolidated_type = "個別".to_string();
        let mut other = row("jppfs_cor:C", "c", "c", "1");
        other.consolidated_type = "その他".to_string();
        let mut absent = row("jppfs_cor:D", "d", "c", "1");
        absent.consolidated_type = String::new();

        let items = map_catalog_items(&[consolidated, individual, other, absent]);
        assert_eq!(items[0].category, ConsolidationCategory::Consolidated);
        assert_eq!(items[1].category, ConsolidationCategory::NonConsolidated);
        assert_eq!(items[2].category, ConsolidationCategory::NonConsolidated);
        assert_eq!(items[3].category, ConsolidationCategory::NonConsolidated);
    }

    #[test]
    fn test_map_facts() {
        let rows = document_rows();
        let mut item_ids = HashMap::new();
        item_ids.insert("jppfs_cor:NetSales".to_string(), ItemId(1));
        item_ids.insert("jppfs_cor:CashAndDeposits".to_string(), ItemId(2));

        let facts = map_facts(&rows, ReportId(9), &item_ids).unwrap();
        assert_eq!(facts.len(), 2);

        assert_eq!(facts[0].report_id, ReportId(9));
        assert_eq!(facts[0].item_id, ItemId(1));
        assert_eq!(facts[0].duration_type, DurationType::Duration);
        assert_eq!(facts[0].value, Some(1000.0));
        assert!(facts[0].is_numeric);

        assert_eq!(facts[1].duration_type, DurationType::Instant);
    }

    #[test]
    fn test_map_facts_unmapped_element_id() {
        let rows = document_rows();
        let item_ids = HashMap::new();

        assert!(matches!(
            map_facts(&rows, ReportId(1), &item_ids),
            Err(PipelineError::UnmappedElementId(id)) if id == "jppfs_cor:NetSales"
        ));
    }
}
