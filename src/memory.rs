//! In-memory implementation of the persistence boundary.
//!
//! `MemoryStore` holds the committed state. A unit of work clones that
//! state on entry, works on the copy, and writes it back only on commit;
//! rollback simply re-clones the committed state. Id counters live inside
//! the state so a rollback also rewinds id assignment.

use crate::error::Result;
use crate::model::{
    CatalogItem, CatalogItemRecord, Fact, FactId, FactRecord, ItemId, Organization,
    OrganizationId, OrganizationRecord, Quarter, Report, ReportId, ReportRecord,
};
use crate::repository::{
    CatalogItemRepository, FactRepository, OrganizationRepository, ReportRepository, UnitOfWork,
};
use log::debug;

#[derive(Debug, Clone, Default)]
struct OrganizationTable {
    rows: Vec<Organization>,
    next_id: i64,
}

impl OrganizationTable {
    fn allocate(&mut self) -> OrganizationId {
        self.next_id += 1;
        OrganizationId(self.next_id)
    }
}

impl OrganizationRepository for OrganizationTable {
    fn get(&self, id: OrganizationId) -> Result<Option<Organization>> {
        Ok(self.rows.iter().find(|o| o.id == id).cloned())
    }

    fn find_by_edinet_code(&self, edinet_code: &str) -> Result<Option<Organization>> {
        Ok(self
            .rows
            .iter()
            .find(|o| o.edinet_code == edinet_code)
            .cloned())
    }

    fn add(&mut self, record: OrganizationRecord) -> Result<OrganizationId> {
        let id = self.allocate();
        self.rows.push(Organization {
            id,
            edinet_code: record.edinet_code,
            security_code: record.security_code,
            industry_code: record.industry_code,
            name: record.name,
        });
        Ok(id)
    }

    fn update(&mut self, organization: Organization) -> Result<()> {
        if let Some(existing) = self.rows.iter_mut().find(|o| o.id == organization.id) {
            *existing = organization;
        }
        Ok(())
    }

    fn list_names_and_codes(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .rows
            .iter()
            .map(|o| (o.name.clone(), o.edinet_code.clone()))
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
struct CatalogItemTable {
    rows: Vec<CatalogItem>,
    next_id: i64,
}

impl CatalogItemTable {
    fn allocate(&mut self) -> ItemId {
        self.next_id += 1;
        ItemId(self.next_id)
    }
}

impl CatalogItemRepository for CatalogItemTable {
    fn get(&self, id: ItemId) -> Result<Option<CatalogItem>> {
        Ok(self.rows.iter().find(|i| i.id == id).cloned())
    }

    fn find_by_element_id(&self, element_id: &str) -> Result<Option<CatalogItem>> {
        Ok(self
            .rows
            .iter()
            .find(|i| i.element_id == element_id)
            .cloned())
    }

    fn add(&mut self, record: CatalogItemRecord) -> Result<ItemId> {
        let id = self.allocate();
        self.rows.push(CatalogItem {
            id,
            element_id: record.element_id,
            item_name: record.item_name,
            category: record.category,
            unit_type: record.unit_type,
        });
        Ok(id)
    }
}

#[derive(Debug, Clone, Default)]
struct ReportTable {
    rows: Vec<Report>,
    next_id: i64,
}

impl ReportTable {
    fn allocate(&mut self) -> ReportId {
        self.next_id += 1;
        ReportId(self.next_id)
    }
}

impl ReportRepository for ReportTable {
    fn get(&self, id: ReportId) -> Result<Option<Report>> {
        Ok(self.rows.iter().find(|r| r.id == id).cloned())
    }

    fn find_by_organization_and_period(
        &self,
        organization_id: OrganizationId,
        fiscal_year: &str,
        quarter: Option<Quarter>,
    ) -> Result<Option<Report>> {
        Ok(self
            .rows
            .iter()
            .find(|r| {
                r.organization_id == organization_id
                    && r.fiscal_year == fiscal_year
                    && r.quarter == quarter
            })
            .cloned())
    }

    fn find_latest_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Report>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.organization_id == organization_id)
            .max_by_key(|r| (r.fiscal_year.clone(), r.quarter))
            .cloned())
    }

    fn add(&mut self, organization_id: OrganizationId, record: ReportRecord) -> Result<ReportId> {
        let id = self.allocate();
        self.rows.push(Report {
            id,
            organization_id,
            document_type: record.document_type,
            fiscal_year: record.fiscal_year,
            quarter: record.quarter,
            period_end: record.period_end,
            filing_date: record.filing_date,
        });
        Ok(id)
    }

    fn update(&mut self, report: Report) -> Result<()> {
        if let Some(existing) = self.rows.iter_mut().find(|r| r.id == report.id) {
            *existing = report;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct FactTable {
    rows: Vec<Fact>,
    next_id: i64,
}

impl FactRepository for FactTable {
    fn add_batch(&mut self, records: Vec<FactRecord>) -> Result<usize> {
        let count = records.len();
        for record in records {
            self.next_id += 1;
            self.rows.push(Fact {
                id: FactId(self.next_id),
                report_id: record.report_id,
                item_id: record.item_id,
                duration_type: record.duration_type,
                context_id: record.context_id,
                period_type: record.period_type,
                consolidated_type: record.consolidated_type,
                value: record.value,
                value_text: record.value_text,
                is_numeric: record.is_numeric,
            });
        }
        Ok(count)
    }

    fn find_by_report(&self, report_id: ReportId) -> Result<Vec<Fact>> {
        Ok(self
            .rows
            .iter()
            .filter(|f| f.report_id == report_id)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    organizations: OrganizationTable,
    catalog_items: CatalogItemTable,
    reports: ReportTable,
    facts: FactTable,
}

/// Committed in-memory state, the durable side of the boundary.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: MemoryState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a transactional scope over this store.
    pub fn begin(&mut self) -> MemoryUnitOfWork<'_> {
        let work = self.state.clone();
        MemoryUnitOfWork { store: self, work }
    }

    pub fn organizations(&self) -> &[Organization] {
        &self.state.organizations.rows
    }

    pub fn catalog_items(&self) -> &[CatalogItem] {
        &self.state.catalog_items.rows
    }

    pub fn reports(&self) -> &[Report] {
        &self.state.reports.rows
    }

    pub fn facts(&self) -> &[Fact] {
        &self.state.facts.rows
    }
}

/// Unit of work over a `MemoryStore`: all writes land in a working copy
/// and become visible in the store only on commit.
pub struct MemoryUnitOfWork<'a> {
    store: &'a mut MemoryStore,
    work: MemoryState,
}

impl UnitOfWork for MemoryUnitOfWork<'_> {
    fn organizations(&mut self) -> &mut dyn OrganizationRepository {
        &mut self.work.organizations
    }

    fn catalog_items(&mut self) -> &mut dyn CatalogItemRepository {
        &mut self.work.catalog_items
    }

    fn reports(&mut self) -> &mut dyn ReportRepository {
        &mut self.work.reports
    }

    fn facts(&mut self) -> &mut dyn FactRepository {
        &mut self.work.facts
    }

    fn commit(&mut self) -> Result<()> {
        self.store.state = self.work.clone();
        debug!("Unit of work committed");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.work = self.store.state.clone();
        debug!("Unit of work rolled back");
        Ok(())
    }
}
