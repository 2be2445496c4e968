//! # Disclosure Pipeline
//!
//! A library for normalizing machine-readable Japanese corporate
//! disclosure extracts (tab-separated tables with Japanese headers, one
//! row per disclosed fact) into four related entities — organization,
//! report, catalog item, fact — written through a single idempotent
//! transactional scope.
//!
//! ## Core Concepts
//!
//! - **Row standardization**: raw Japanese columns become canonical field
//!   names, and every value is classified as numeric or textual.
//! - **Fact location**: single facts are looked up by element id,
//!   optionally disambiguated by context id.
//! - **Period parsing**: free-text fiscal-period labels (Gregorian or
//!   era-based dates, three numeral scripts) resolve to a fiscal year and
//!   a quarter code.
//! - **Orchestrated persistence**: one unit of work per document, with
//!   upserts for organizations and reports, create-if-absent for catalog
//!   items, and append-only fact batches.
//!
//! ## Example
//!
//! ```rust,ignore
//! use disclosure_pipeline::*;
//!
//! let config = PipelineConfig::from_path("config/config.toml")?;
//! let table = read_tsv_str(&decoded_text)?;
//!
//! let mut store = MemoryStore::new();
//! let mut uow = store.begin();
//! let outcome = ingest_document(&mut uow, &table, &config)?;
//! println!("wrote {} facts", outcome.facts_written);
//! ```

pub mod config;
pub mod error;
pub mod ingestion;
pub mod mapper;
pub mod memory;
pub mod model;
pub mod period;
pub mod repository;
pub mod service;
pub mod table;

pub use config::{CompanyMapping, PipelineConfig, ReportMapping, XbrlMapping};
pub use error::{PipelineError, Result};
pub use ingestion::read_tsv_str;
pub use mapper::{
    map_catalog_items, map_facts, map_organization, map_report, CONSOLIDATED_LABEL,
    STATEMENT_FACT_PREFIX,
};
pub use memory::{MemoryStore, MemoryUnitOfWork};
pub use model::{
    CatalogItem, CatalogItemRecord, ConsolidationCategory, DurationType, Fact, FactId,
    FactRecord, ItemId, Organization, OrganizationId, OrganizationRecord, Quarter, Report,
    ReportId, ReportRecord,
};
pub use period::{extract_fiscal_year, extract_quarter, ERA_EPOCHS, ERA_FIRST_YEAR_TOKEN};
pub use repository::{
    CatalogItemRepository, FactRepository, OrganizationRepository, ReportRepository, UnitOfWork,
};
pub use service::{
    financial_summary, ingest_document, organization_choices, FinancialSummary, IngestOutcome,
    SUMMARY_ITEMS,
};
pub use table::{locate_fact, standardize_rows, FactValue, RawTable, StandardRow};
