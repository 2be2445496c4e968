use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Surrogate id for a persisted organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub i64);

/// Surrogate id for a catalog item (master list of disclosure line items).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub i64);

/// Surrogate id for a filed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportId(pub i64);

/// Surrogate id for a single disclosed fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactId(pub i64);

/// Quarter code of a periodic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Quarter::Q1),
            2 => Some(Quarter::Q2),
            3 => Some(Quarter::Q3),
            4 => Some(Quarter::Q4),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consolidation category of a catalog item.
///
/// This is a closed two-way classification: the exact consolidated label
/// maps to `Consolidated`, every other value (including absent) maps to
/// `NonConsolidated`. There is no third "unknown" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsolidationCategory {
    Consolidated,
    #[serde(rename = "Non-consolidated")]
    NonConsolidated,
}

impl ConsolidationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsolidationCategory::Consolidated => "Consolidated",
            ConsolidationCategory::NonConsolidated => "Non-consolidated",
        }
    }
}

/// Whether a fact is a flow over a period or a snapshot at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationType {
    Duration,
    Instant,
}

/// Mapping-ready organization data extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub edinet_code: String,
    pub security_code: Option<String>,
    pub industry_code: Option<String>,
    pub name: String,
}

/// Mapping-ready report data extracted from one document.
///
/// The owning organization id is attached by the orchestrator once the
/// organization row has been flushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub document_type: Option<String>,
    pub fiscal_year: String,
    pub quarter: Option<Quarter>,
    pub period_end: Option<NaiveDate>,
    pub filing_date: Option<NaiveDate>,
}

/// Mapping-ready catalog item candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemRecord {
    pub element_id: String,
    pub item_name: String,
    pub category: ConsolidationCategory,
    pub unit_type: Option<String>,
}

/// Mapping-ready fact row, fully resolved against persisted ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    pub report_id: ReportId,
    pub item_id: ItemId,
    pub duration_type: DurationType,
    pub context_id: String,
    pub period_type: String,
    pub consolidated_type: String,
    pub value: Option<f64>,
    pub value_text: Option<String>,
    pub is_numeric: bool,
}

/// A persisted organization. Identity is the EDINET code; the record is
/// created on first sighting and field-overwritten on later sightings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub edinet_code: String,
    pub security_code: Option<String>,
    pub industry_code: Option<String>,
    pub name: String,
}

impl Organization {
    /// Field-level overwrite from a freshly mapped record (upsert-in-place).
    pub fn merge(&mut self, record: &OrganizationRecord) {
        self.security_code = record.security_code.clone();
        self.industry_code = record.industry_code.clone();
        self.name = record.name.clone();
    }
}

/// A persisted report. Logically unique per (organization, fiscal year,
/// quarter), enforced by lookup-then-upsert rather than a declared
/// constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub organization_id: OrganizationId,
    pub document_type: Option<String>,
    pub fiscal_year: String,
    pub quarter: Option<Quarter>,
    pub period_end: Option<NaiveDate>,
    pub filing_date: Option<NaiveDate>,
}

impl Report {
    /// Merge-by-identity: overwrite the mutable fields, keep id and owner.
    pub fn merge(&mut self, record: &ReportRecord) {
        self.document_type = record.document_type.clone();
        self.period_end = record.period_end;
        self.filing_date = record.filing_date;
    }
}

/// A persisted catalog item. Created once per distinct element id across
/// all documents ever processed; never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub element_id: String,
    pub item_name: String,
    pub category: ConsolidationCategory,
    pub unit_type: Option<String>,
}

/// A persisted fact. Append-only per report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub report_id: ReportId,
    pub item_id: ItemId,
    pub duration_type: DurationType,
    pub context_id: String,
    pub period_type: String,
    pub consolidated_type: String,
    pub value: Option<f64>,
    pub value_text: Option<String>,
    pub is_numeric: bool,
}
