use crate::error::{PipelineError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// A decoded tab-delimited disclosure extract, one row per disclosed fact.
///
/// Encoding detection and decompression are the caller's responsibility;
/// this type only carries already-decoded text cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One standardized row with canonical field names.
///
/// Invariant: exactly one of `value` / `value_text` is set, and
/// `is_numeric` agrees with which one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardRow {
    pub element_id: String,
    pub item_name_jp: String,
    pub context_id: String,
    pub fiscal_year_relative: String,
    pub consolidated_type: String,
    pub period_type: String,
    pub unit_id: String,
    pub unit_name: String,
    pub value: Option<f64>,
    pub value_text: Option<String>,
    pub is_numeric: bool,
}

/// Japanese source headers, in the order the extracts carry them.
const COLUMN_ELEMENT_ID: &str = "要素ID";
const COLUMN_ITEM_NAME: &str = "項目名";
const COLUMN_CONTEXT_ID: &str = "コンテキストID";
const COLUMN_FISCAL_YEAR_RELATIVE: &str = "相対年度";
const COLUMN_CONSOLIDATED_TYPE: &str = "連結・個別";
const COLUMN_PERIOD_TYPE: &str = "期間・時点";
const COLUMN_UNIT_ID: &str = "ユニットID";
const COLUMN_UNIT_NAME: &str = "単位";
const COLUMN_VALUE: &str = "値";

struct ColumnIndex {
    element_id: usize,
    item_name: usize,
    context_id: usize,
    fiscal_year_relative: usize,
    consolidated_type: usize,
    period_type: usize,
    unit_id: usize,
    unit_name: usize,
    value: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            element_id: find(COLUMN_ELEMENT_ID)?,
            item_name: find(COLUMN_ITEM_NAME)?,
            context_id: find(COLUMN_CONTEXT_ID)?,
            fiscal_year_relative: find(COLUMN_FISCAL_YEAR_RELATIVE)?,
            consolidated_type: find(COLUMN_CONSOLIDATED_TYPE)?,
            period_type: find(COLUMN_PERIOD_TYPE)?,
            unit_id: find(COLUMN_UNIT_ID)?,
            unit_name: find(COLUMN_UNIT_NAME)?,
            value: find(COLUMN_VALUE)?,
        })
    }
}

/// Renames raw columns to canonical names and classifies every value as
/// numeric or textual. No row is dropped; the only failure mode is a
/// missing expected column.
///
/// The placeholder dash `－` used for "no value" never parses as a number
/// and therefore lands in `value_text`.
pub fn standardize_rows(table: &RawTable) -> Result<Vec<StandardRow>> {
    let idx = ColumnIndex::resolve(&table.headers)?;

    let mut standardized = Vec::with_capacity(table.rows.len());
    for raw in &table.rows {
        let cell = |i: usize| raw.get(i).map(String::as_str).unwrap_or("").to_string();

        let original_value = cell(idx.value);
        let parsed = parse_numeric(&original_value);
        let is_numeric = parsed.is_some();

        standardized.push(StandardRow {
            element_id: cell(idx.element_id),
            item_name_jp: cell(idx.item_name),
            context_id: cell(idx.context_id),
            fiscal_year_relative: cell(idx.fiscal_year_relative),
            consolidated_type: cell(idx.consolidated_type),
            period_type: cell(idx.period_type),
            unit_id: cell(idx.unit_id),
            unit_name: cell(idx.unit_name),
            value: parsed,
            value_text: if is_numeric { None } else { Some(original_value) },
            is_numeric,
        });
    }

    info!("Standardized {} rows", standardized.len());
    Ok(standardized)
}

fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A single located fact value: numeric or textual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactValue {
    Number(f64),
    Text(String),
}

impl FactValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FactValue::Number(n) => Some(*n),
            FactValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactValue::Number(_) => None,
            FactValue::Text(s) => Some(s),
        }
    }

    /// Renders the value as a plain string. Integral numbers print without
    /// a decimal point, matching how the source encodes them.
    pub fn into_text(self) -> String {
        match self {
            FactValue::Number(n) => format!("{}", n),
            FactValue::Text(s) => s,
        }
    }
}

/// Looks up a single fact by element id from a standardized row set.
///
/// If more than one row matches and a context id was supplied, the match
/// set is narrowed by context id; the first remaining row wins. A miss is
/// not an error: the locator logs and returns `None`, leaving the
/// fatal/non-fatal decision to the caller.
pub fn locate_fact(
    rows: &[StandardRow],
    element_id: &str,
    context_id: Option<&str>,
) -> Option<FactValue> {
    let mut matches: Vec<&StandardRow> = rows.iter().filter(|r| r.element_id == element_id).collect();

    if matches.len() > 1 {
        if let Some(ctx) = context_id {
            matches.retain(|r| r.context_id == ctx);
        }
    }

    let row = match matches.first() {
        Some(row) => row,
        None => {
            warn!("No row found for element id '{}'", element_id);
            return None;
        }
    };

    if row.is_numeric {
        debug!("Located numeric value for element id '{}'", element_id);
        row.value.map(FactValue::Number)
    } else {
        debug!("Located text value for element id '{}'", element_id);
        row.value_text.clone().map(FactValue::Text)
    }
}
