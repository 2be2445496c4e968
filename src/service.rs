//! Persistence orchestration: sequences the entity writes of one document
//! inside a single transactional scope, resolving id dependencies in the
//! order organization -> catalog items -> report -> facts. Also carries
//! the read-side summary queries built on the same boundary.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::mapper::{map_catalog_items, map_facts, map_organization, map_report};
use crate::model::{ItemId, OrganizationId, Quarter, ReportId};
use crate::repository::UnitOfWork;
use crate::table::{standardize_rows, RawTable};
use log::{debug, error, info};
use serde::Serialize;
use std::collections::HashMap;

/// What one successful ingestion wrote.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub organization_id: OrganizationId,
    pub report_id: ReportId,
    pub items_created: usize,
    pub facts_written: usize,
}

/// Ingests one source document atomically.
///
/// All steps run inside the supplied unit of work: on success the scope is
/// committed once at the end; any error anywhere rolls the whole sequence
/// back and the document is considered not ingested. Partial writes for a
/// document are never visible.
pub fn ingest_document<U: UnitOfWork>(
    uow: &mut U,
    table: &RawTable,
    config: &PipelineConfig,
) -> Result<IngestOutcome> {
    match run_pipeline(uow, table, config) {
        Ok(outcome) => {
            uow.commit()?;
            info!(
                "Document ingested: organization {:?}, report {:?}, {} new items, {} facts",
                outcome.organization_id,
                outcome.report_id,
                outcome.items_created,
                outcome.facts_written
            );
            Ok(outcome)
        }
        Err(err) => {
            error!("Document failed to ingest: {}", err);
            if let Err(rollback_err) = uow.rollback() {
                error!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

fn run_pipeline<U: UnitOfWork>(
    uow: &mut U,
    table: &RawTable,
    config: &PipelineConfig,
) -> Result<IngestOutcome> {
    // 1. Standardize raw rows.
    let rows = standardize_rows(table)?;

    // 2. Upsert the organization: found -> field-level overwrite, absent
    //    -> create. Flushing yields the id either way.
    let organization_record = map_organization(&rows, config)?;
    let organization_id = match uow
        .organizations()
        .find_by_edinet_code(&organization_record.edinet_code)?
    {
        Some(mut existing) => {
            existing.merge(&organization_record);
            let id = existing.id;
            uow.organizations().update(existing)?;
            debug!("Organization {:?} updated", id);
            id
        }
        None => {
            let id = uow.organizations().add(organization_record)?;
            debug!("Organization {:?} created", id);
            id
        }
    };

    // 3-4. Create catalog items only where absent (existing entries are
    //      never overwritten), and collect the element-id -> item-id map.
    let mut item_id_map: HashMap<String, ItemId> = HashMap::new();
    let mut items_created = 0;
    for record in map_catalog_items(&rows) {
        let element_id = record.element_id.clone();
        let item_id = match uow.catalog_items().find_by_element_id(&element_id)? {
            Some(existing) => existing.id,
            None => {
                items_created += 1;
                uow.catalog_items().add(record)?
            }
        };
        item_id_map.insert(element_id, item_id);
    }

    // 5. Upsert the report under its logical key (organization, fiscal
    //    year, quarter).
    let report_record = map_report(&rows, config)?;
    let report_id = match uow.reports().find_by_organization_and_period(
        organization_id,
        &report_record.fiscal_year,
        report_record.quarter,
    )? {
        Some(mut existing) => {
            existing.merge(&report_record);
            let id = existing.id;
            uow.reports().update(existing)?;
            debug!("Report {:?} updated", id);
            id
        }
        None => {
            let id = uow.reports().add(organization_id, report_record)?;
            debug!("Report {:?} created", id);
            id
        }
    };

    // 6. Append the report's facts as one batch. Facts are never updated
    //    in place; a re-ingested document appends a fresh batch.
    let fact_records = map_facts(&rows, report_id, &item_id_map)?;
    let facts_written = uow.facts().add_batch(fact_records)?;

    Ok(IngestOutcome {
        organization_id,
        report_id,
        items_created,
        facts_written,
    })
}

/// Item names that make up the headline summary.
pub const SUMMARY_ITEMS: &[&str] = &["売上高", "営業利益", "経常利益", "当期純利益"];

/// Headline figures for an organization's latest report, with profit
/// rates computed against net sales.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialSummary {
    pub company_name: String,
    pub period_name: String,
    pub fiscal_year: String,
    pub quarter: Option<Quarter>,

    pub net_sales: Option<f64>,
    pub operating_income: Option<f64>,
    pub ordinary_income: Option<f64>,
    pub net_income: Option<f64>,

    pub operating_profit_rate: Option<f64>,
    pub ordinary_profit_rate: Option<f64>,
    pub net_profit_rate: Option<f64>,
}

impl FinancialSummary {
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds the latest financial summary for the organization with the
/// given EDINET code, or `None` when the organization (or any report of
/// it) is unknown.
pub fn financial_summary<U: UnitOfWork>(
    uow: &mut U,
    edinet_code: &str,
) -> Result<Option<FinancialSummary>> {
    let organization = match uow.organizations().find_by_edinet_code(edinet_code)? {
        Some(organization) => organization,
        None => return Ok(None),
    };

    let report = match uow.reports().find_latest_by_organization(organization.id)? {
        Some(report) => report,
        None => return Ok(None),
    };

    let facts = uow.facts().find_by_report(report.id)?;

    let mut values: HashMap<String, f64> = HashMap::new();
    for fact in &facts {
        let value = match fact.value {
            Some(value) => value,
            None => continue,
        };
        if let Some(item) = uow.catalog_items().get(fact.item_id)? {
            if SUMMARY_ITEMS.contains(&item.item_name.as_str()) {
                // Keep the first sighting per item; a report may carry
                // prior-period contexts for the same line item.
                values.entry(item.item_name).or_insert(value);
            }
        }
    }

    let net_sales = values.get("売上高").copied();
    let operating_income = values.get("営業利益").copied();
    let ordinary_income = values.get("経常利益").copied();
    let net_income = values.get("当期純利益").copied();

    let quarter_label = report
        .quarter
        .map(|q| q.as_str().to_string())
        .unwrap_or_default();

    Ok(Some(FinancialSummary {
        company_name: organization.name,
        period_name: format!("{} {}", report.fiscal_year, quarter_label),
        fiscal_year: report.fiscal_year,
        quarter: report.quarter,
        net_sales,
        operating_income,
        ordinary_income,
        net_income,
        operating_profit_rate: profit_rate(operating_income, net_sales),
        ordinary_profit_rate: profit_rate(ordinary_income, net_sales),
        net_profit_rate: profit_rate(net_income, net_sales),
    }))
}

/// All known organizations as (name, EDINET code) pairs, for selection
/// lists.
pub fn organization_choices<U: UnitOfWork>(uow: &mut U) -> Result<Vec<(String, String)>> {
    uow.organizations().list_names_and_codes()
}

fn profit_rate(income: Option<f64>, net_sales: Option<f64>) -> Option<f64> {
    match (income, net_sales) {
        (Some(income), Some(net_sales)) if net_sales != 0.0 => Some(income / net_sales * 100.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::model::{CatalogItemRecord, ConsolidationCategory, FactRecord, ReportRecord};
    use crate::repository::UnitOfWork;

    fn seed_summary_data(store: &mut MemoryStore) {
        let mut uow = store.begin();

        let org_id = uow
            .organizations()
            .add(crate::model::OrganizationRecord {
                edinet_code: "E01234".to_string(),
                security_code: None,
                industry_code: None,
                name: "テスト株式会社".to_string(),
            })
            .unwrap();

        let report_id = uow
            .reports()
            .add(
                org_id,
                ReportRecord {
                    document_type: Some("四半期報告書".to_string()),
                    fiscal_year: "2023".to_string(),
                    quarter: Some(Quarter::Q3),
                    period_end: None,
                    filing_date: None,
                },
            )
            .unwrap();

        let mut item_ids = HashMap::new();
        for (element_id, name) in [
            ("jppfs_cor:NetSales", "売上高"),
            ("jppfs_cor:OperatingIncome", "営業利益"),
            ("jppfs_cor:OrdinaryIncome", "経常利益"),
        ] {
            let id = uow
                .catalog_items()
                .add(CatalogItemRecord {
                    element_id: element_id.to_string(),
                    item_name: name.to_string(),
                    category: ConsolidationCategory::Consolidated,
                    unit_type: Some("JPY".to_string()),
                })
                .unwrap();
            item_ids.insert(element_id, id);
        }

        let facts = [
            ("jppfs_cor:NetSales", 2000.0),
            ("jppfs_cor:OperatingIncome", 300.0),
            ("jppfs_cor:OrdinaryIncome", 250.0),
        ]
        .iter()
        .map(|(element_id, value)| FactRecord {
            report_id,
            item_id: item_ids[element_id],
            duration_type: crate::model::DurationType::Duration,
            context_id: "CurrentYTDDuration".to_string(),
            period_type: "期間".to_string(),
            consolidated_type: "連結".to_string(),
            value: Some(*value),
            value_text: None,
            is_numeric: true,
        })
        .collect();

        uow.facts().add_batch(facts).unwrap();
        uow.commit().unwrap();
    }

    #[test]
    fn test_financial_summary() {
        let mut store = MemoryStore::new();
        seed_summary_data(&mut store);

        let mut uow = store.begin();
        let summary = financial_summary(&mut uow, "E01234").unwrap().unwrap();

        assert_eq!(summary.company_name, "テスト株式会社");
        assert_eq!(summary.period_name, "2023 Q3");
        assert_eq!(summary.net_sales, Some(2000.0));
        assert_eq!(summary.operating_income, Some(300.0));
        assert_eq!(summary.operating_profit_rate, Some(15.0));
        assert_eq!(summary.ordinary_profit_rate, Some(12.5));
        // 当期純利益 was never disclosed.
        assert_eq!(summary.net_income, None);
        assert_eq!(summary.net_profit_rate, None);
    }

    #[test]
    fn test_financial_summary_unknown_organization() {
        let mut store = MemoryStore::new();
        let mut uow = store.begin();
        assert!(financial_summary(&mut uow, "E99999").unwrap().is_none());
    }

    #[test]
    fn test_organization_choices() {
        let mut store = MemoryStore::new();
        seed_summary_data(&mut store);

        let mut uow = store.begin();
        let choices = organization_choices(&mut uow).unwrap();
        assert_eq!(
            choices,
            vec![("テスト株式会社".to_string(), "E01234".to_string())]
        );
    }
}
