//! Reads embeddable HR records for one organization and renders them to text


pub mod render;

use chrono::NaiveDateTime;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

use crate::database::sqlite::models::{
    AttendanceRecord, DocumentFilter, DocumentType, Employee, ShiftAllocation,
};
use crate::database::sqlite::queries::{
    DepartmentQueries, DocumentQueries, EmployeeQueries, ShiftQueries,
};
use crate::database::{Database, DbPool};
use crate::{HrError, Result};

/// One embeddable HR record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Employee(Employee),
    Attendance(AttendanceRecord),
    Shift(ShiftAllocation),
}

impl Document {
    #[inline]
    pub fn document_type(&self) -> DocumentType {
        match self {
            Document::Employee(_) => DocumentType::Employee,
            Document::Attendance(_) => DocumentType::Attendance,
            Document::Shift(_) => DocumentType::Shift,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        match self {
            Document::Employee(e) => &e.id,
            Document::Attendance(a) => &a.id,
            Document::Shift(s) => &s.id,
        }
    }

    #[inline]
    pub fn organization_id(&self) -> &str {
        match self {
            Document::Employee(e) => &e.organization_id,
            Document::Attendance(a) => &a.organization_id,
            Document::Shift(s) => &s.organization_id,
        }
    }

    #[inline]
    pub fn updated_at(&self) -> NaiveDateTime {
        match self {
            Document::Employee(e) => e.updated_at,
            Document::Attendance(a) => a.updated_at,
            Document::Shift(s) => s.updated_at,
        }
    }
}

/// Read-only adapter over the HR store
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pool: DbPool,
    page_size: u32,
}

async fn fetch_page(
    pool: &DbPool,
    document_type: DocumentType,
    organization_id: &str,
    after: &str,
    page_size: u32,
    filter: &DocumentFilter,
) -> Result<Vec<Document>> {
    let documents = match document_type {
        DocumentType::Employee => {
            DocumentQueries::page::<Employee>(
                pool,
                document_type,
                organization_id,
                after,
                page_size,
                filter,
            )
            .await
            .map_err(HrError::store)?
            .into_iter()
            .map(Document::Employee)
            .collect()
        }
        DocumentType::Attendance => DocumentQueries::page::<AttendanceRecord>(
            pool,
            document_type,
            organization_id,
            after,
            page_size,
            filter,
        )
        .await
        .map_err(HrError::store)?
        .into_iter()
        .map(Document::Attendance)
        .collect(),
        DocumentType::Shift => DocumentQueries::page::<ShiftAllocation>(
            pool,
            document_type,
            organization_id,
            after,
            page_size,
            filter,
        )
        .await
        .map_err(HrError::store)?
        .into_iter()
        .map(Document::Shift)
        .collect(),
    };
    Ok(documents)
}

impl DocumentSource {
    #[inline]
    pub fn new(database: &Database, page_size: u32) -> Self {
        Self {
            pool: database.pool().clone(),
            page_size: page_size.max(1),
        }
    }

    /// Lazily page through the documents of one type, ordered by id
    ///
    /// Pages are keyed on the last id seen, so rows that stop matching the
    /// filter mid-run (for example because they were just re-embedded) never
    /// shift later pages.
    #[inline]
    pub fn list_documents(
        &self,
        document_type: DocumentType,
        organization_id: &str,
        filter: DocumentFilter,
    ) -> BoxStream<'static, Result<Document>> {
        let pool = self.pool.clone();
        let page_size = self.page_size;
        let organization_id = organization_id.to_string();

        stream::try_unfold(Some(String::new()), move |cursor| {
            let pool = pool.clone();
            let organization_id = organization_id.clone();
            let filter = filter.clone();
            async move {
                let Some(after) = cursor else {
                    return Ok(None);
                };

                let page = fetch_page(
                    &pool,
                    document_type,
                    &organization_id,
                    &after,
                    page_size,
                    &filter,
                )
                .await?;
                debug!("Fetched page of {} {} documents", page.len(), document_type);

                if page.is_empty() {
                    return Ok(None);
                }
                let next = if page.len() < page_size as usize {
                    None
                } else {
                    page.last().map(|d| d.id().to_string())
                };

                Ok::<_, HrError>(Some((
                    stream::iter(page.into_iter().map(Ok::<Document, HrError>)),
                    next,
                )))
            }
        })
        .try_flatten()
        .boxed()
    }

    #[inline]
    pub async fn count_documents(
        &self,
        document_type: DocumentType,
        organization_id: &str,
        filter: &DocumentFilter,
    ) -> Result<u64> {
        let count = DocumentQueries::count(&self.pool, document_type, organization_id, filter)
            .await
            .map_err(HrError::store)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Render a document, resolving the records it refers to
    #[inline]
    pub async fn render_for_embedding(&self, document: &Document) -> Result<String> {
        match document {
            Document::Employee(employee) => {
                let department = match &employee.department_id {
                    Some(department_id) => Some(
                        DepartmentQueries::get_by_id(&self.pool, department_id)
                            .await
                            .map_err(HrError::store)?
                            .ok_or_else(|| HrError::not_found("Department", department_id))?,
                    ),
                    None => None,
                };
                Ok(render::render_employee(employee, department.as_ref()))
            }
            Document::Attendance(record) => {
                let employee = self.employee(&record.employee_id).await?;
                Ok(render::render_attendance(record, &employee))
            }
            Document::Shift(allocation) => {
                let employee = self.employee(&allocation.employee_id).await?;
                let shift = ShiftQueries::get_by_id(&self.pool, &allocation.shift_id)
                    .await
                    .map_err(HrError::store)?
                    .ok_or_else(|| HrError::not_found("Shift", &allocation.shift_id))?;
                Ok(render::render_shift_allocation(allocation, &employee, &shift))
            }
        }
    }

    async fn employee(&self, employee_id: &str) -> Result<Employee> {
        EmployeeQueries::get_by_id(&self.pool, employee_id)
            .await
            .map_err(HrError::store)?
            .ok_or_else(|| HrError::not_found("Employee", employee_id))
    }
}
