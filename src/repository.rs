//! Persistence boundary: one read/write collaborator per entity plus a
//! transactional scope. The pipeline owns only these contracts; concrete
//! stores live behind them (see `memory` for the in-process one).
//!
//! `add` assigns and returns the surrogate id immediately (flush-on-add),
//! so id dependencies between entities can be resolved mid-scope. Nothing
//! is durable until the unit of work commits.

use crate::error::Result;
use crate::model::{
    CatalogItem, CatalogItemRecord, Fact, FactRecord, ItemId, Organization, OrganizationId,
    OrganizationRecord, Quarter, Report, ReportId, ReportRecord,
};

pub trait OrganizationRepository {
    fn get(&self, id: OrganizationId) -> Result<Option<Organization>>;

    /// Natural-key lookup by the unique external EDINET code.
    fn find_by_edinet_code(&self, edinet_code: &str) -> Result<Option<Organization>>;

    fn add(&mut self, record: OrganizationRecord) -> Result<OrganizationId>;

    fn update(&mut self, organization: Organization) -> Result<()>;

    /// All (name, edinet_code) pairs, for selection lists.
    fn list_names_and_codes(&self) -> Result<Vec<(String, String)>>;
}

pub trait CatalogItemRepository {
    fn get(&self, id: ItemId) -> Result<Option<CatalogItem>>;

    /// Natural-key lookup by the unique element identifier.
    fn find_by_element_id(&self, element_id: &str) -> Result<Option<CatalogItem>>;

    fn add(&mut self, record: CatalogItemRecord) -> Result<ItemId>;
}

pub trait ReportRepository {
    fn get(&self, id: ReportId) -> Result<Option<Report>>;

    /// Natural-key lookup by the logical uniqueness constraint
    /// (organization, fiscal year, quarter).
    fn find_by_organization_and_period(
        &self,
        organization_id: OrganizationId,
        fiscal_year: &str,
        quarter: Option<Quarter>,
    ) -> Result<Option<Report>>;

    /// The most recent report for an organization, ordered by fiscal year
    /// then quarter.
    fn find_latest_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Report>>;

    fn add(&mut self, organization_id: OrganizationId, record: ReportRecord) -> Result<ReportId>;

    fn update(&mut self, report: Report) -> Result<()>;
}

pub trait FactRepository {
    /// Appends a report's facts as one batch; facts are never updated in
    /// place. Returns the number of rows written.
    fn add_batch(&mut self, records: Vec<FactRecord>) -> Result<usize>;

    fn find_by_report(&self, report_id: ReportId) -> Result<Vec<Fact>>;
}

/// Transactional scope over the four repositories.
///
/// All reads and writes of one document ingestion happen inside a single
/// unit of work: `commit` makes them durable as one unit, `rollback`
/// discards every pending write. After either call the scope is clean and
/// may be reused for the next document.
pub trait UnitOfWork {
    fn organizations(&mut self) -> &mut dyn OrganizationRepository;
    fn catalog_items(&mut self) -> &mut dyn CatalogItemRepository;
    fn reports(&mut self) -> &mut dyn ReportRepository;
    fn facts(&mut self) -> &mut dyn FactRepository;

    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
}
