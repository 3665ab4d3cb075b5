
use super::models::*;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub struct OrganizationQueries;

impl OrganizationQueries {
    #[inline]
    pub async fn create<'e, E>(
        executor: E,
        name: &str,
        slug: &str,
    ) -> Result<Organization>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = new_id();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (id, name, slug, created_at) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(&id)
        .bind(name)
        .bind(slug)
        .bind(now)
        .fetch_one(executor)
        .await
        .context("Failed to create organization")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Organization>> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get organization by id")
    }

    #[inline]
    pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Organization>> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE slug = ?")
            .bind(slug)
            .fetch_optional(pool)
            .await
            .context("Failed to get organization by slug")
    }

    /// Resolve a user-supplied identifier that may be either a slug or an id
    #[inline]
    pub async fn find(pool: &SqlitePool, slug_or_id: &str) -> Result<Option<Organization>> {
        if let Some(organization) = Self::get_by_slug(pool, slug_or_id).await? {
            return Ok(Some(organization));
        }
        Self::get_by_id(pool, slug_or_id).await
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Organization>> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations ORDER BY name")
            .fetch_all(pool)
            .await
            .context("Failed to list organizations")
    }
}

pub struct DepartmentQueries;

impl DepartmentQueries {
    #[inline]
    pub async fn create<'e, E>(
        executor: E,
        new_department: NewDepartment,
    ) -> Result<Department>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = new_id();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Department>(
            "INSERT INTO departments (id, organization_id, name, created_at) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(&id)
        .bind(&new_department.organization_id)
        .bind(&new_department.name)
        .bind(now)
        .fetch_one(executor)
        .await
        .context("Failed to create department")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Department>> {
        sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get department by id")
    }

    #[inline]
    pub async fn list_by_organization(
        pool: &SqlitePool,
        organization_id: &str,
    ) -> Result<Vec<Department>> {
        sqlx::query_as::<_, Department>(
            "SELECT * FROM departments WHERE organization_id = ? ORDER BY name",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
        .context("Failed to list departments")
    }
}

pub struct EmployeeQueries;

impl EmployeeQueries {
    #[inline]
    pub async fn create<'e, E>(
        executor: E,
        new_employee: NewEmployee,
    ) -> Result<Employee>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = new_id();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (
                id, organization_id, department_id, employee_code, full_name, email, phone,
                position, employment_type, gender, join_date, base_salary, is_active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&new_employee.organization_id)
        .bind(&new_employee.department_id)
        .bind(&new_employee.employee_code)
        .bind(&new_employee.full_name)
        .bind(&new_employee.email)
        .bind(&new_employee.phone)
        .bind(&new_employee.position)
        .bind(new_employee.employment_type)
        .bind(new_employee.gender)
        .bind(new_employee.join_date)
        .bind(new_employee.base_salary)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .context("Failed to create employee")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Employee>> {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get employee by id")
    }

    /// Apply a partial update and advance `updated_at`
    #[inline]
    pub async fn update(
        pool: &SqlitePool,
        id: &str,
        update: EmployeeUpdate,
    ) -> Result<Option<Employee>> {
        let mut query_parts = vec!["updated_at = ?"];
        if update.position.is_some() {
            query_parts.push("position = ?");
        }
        if update.department_id.is_some() {
            query_parts.push("department_id = ?");
        }
        if update.base_salary.is_some() {
            query_parts.push("base_salary = ?");
        }
        if update.employment_type.is_some() {
            query_parts.push("employment_type = ?");
        }
        if update.is_active.is_some() {
            query_parts.push("is_active = ?");
        }

        let query_str = format!(
            "UPDATE employees SET {} WHERE id = ?",
            query_parts.join(", ")
        );

        let mut query = sqlx::query(&query_str).bind(Utc::now().naive_utc());
        if let Some(position) = update.position {
            query = query.bind(position);
        }
        if let Some(department_id) = update.department_id {
            query = query.bind(department_id);
        }
        if let Some(base_salary) = update.base_salary {
            query = query.bind(base_salary);
        }
        if let Some(employment_type) = update.employment_type {
            query = query.bind(employment_type);
        }
        if let Some(is_active) = update.is_active {
            query = query.bind(is_active);
        }

        query
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to update employee")?;

        Self::get_by_id(pool, id).await
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete employee")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn list_by_organization(
        pool: &SqlitePool,
        organization_id: &str,
    ) -> Result<Vec<Employee>> {
        sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE organization_id = ? ORDER BY employee_code",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
        .context("Failed to list employees")
    }
}

pub struct ShiftQueries;

impl ShiftQueries {
    #[inline]
    pub async fn create<'e, E>(
        executor: E,
        new_shift: NewShift,
    ) -> Result<Shift>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = new_id();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Shift>(
            r#"
            INSERT INTO shifts (id, organization_id, name, start_time, end_time, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&new_shift.organization_id)
        .bind(&new_shift.name)
        .bind(new_shift.start_time)
        .bind(new_shift.end_time)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .context("Failed to create shift")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Shift>> {
        sqlx::query_as::<_, Shift>("SELECT * FROM shifts WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get shift by id")
    }
}

pub struct ShiftAllocationQueries;

impl ShiftAllocationQueries {
    #[inline]
    pub async fn create<'e, E>(
        executor: E,
        new_allocation: NewShiftAllocation,
    ) -> Result<ShiftAllocation>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = new_id();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, ShiftAllocation>(
            r#"
            INSERT INTO shift_allocations (
                id, organization_id, employee_id, shift_id, date, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&new_allocation.organization_id)
        .bind(&new_allocation.employee_id)
        .bind(&new_allocation.shift_id)
        .bind(new_allocation.date)
        .bind(&new_allocation.notes)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .context("Failed to create shift allocation")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<ShiftAllocation>> {
        sqlx::query_as::<_, ShiftAllocation>("SELECT * FROM shift_allocations WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get shift allocation by id")
    }
}

pub struct AttendanceQueries;

impl AttendanceQueries {
    #[inline]
    pub async fn create<'e, E>(
        executor: E,
        new_record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = new_id();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO attendance_records (
                id, organization_id, employee_id, date, check_in, check_out, status, notes,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&new_record.organization_id)
        .bind(&new_record.employee_id)
        .bind(new_record.date)
        .bind(new_record.check_in)
        .bind(new_record.check_out)
        .bind(new_record.status)
        .bind(&new_record.notes)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .context("Failed to create attendance record")
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<AttendanceRecord>> {
        sqlx::query_as::<_, AttendanceRecord>("SELECT * FROM attendance_records WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get attendance record by id")
    }
}

/// Paged reads over the three embeddable tables
pub struct DocumentQueries;

impl DocumentQueries {
    fn filter_clause(filter: &DocumentFilter) -> String {
        let mut clause = String::new();
        if filter.stale_only {
            clause.push_str(
                " AND NOT EXISTS (SELECT 1 FROM embeddings e \
                 WHERE e.document_type = ? AND e.document_id = t.id \
                 AND e.updated_at >= t.updated_at)",
            );
        }
        if filter.updated_since.is_some() {
            clause.push_str(" AND t.updated_at >= ?");
        }
        clause
    }

    /// Fetch up to `limit` rows with `id > after`, ordered by id
    #[inline]
    pub async fn page<T>(
        pool: &SqlitePool,
        document_type: DocumentType,
        organization_id: &str,
        after: &str,
        limit: u32,
        filter: &DocumentFilter,
    ) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT t.* FROM {} t WHERE t.organization_id = ? AND t.id > ?{} ORDER BY t.id LIMIT ?",
            document_type.table_name(),
            Self::filter_clause(filter)
        );

        let mut query = sqlx::query_as::<_, T>(&sql)
            .bind(organization_id)
            .bind(after);
        if filter.stale_only {
            query = query.bind(document_type);
        }
        if let Some(since) = filter.updated_since {
            query = query.bind(since);
        }

        let rows = query
            .bind(i64::from(limit))
            .fetch_all(pool)
            .await
            .with_context(|| format!("Failed to fetch {} page", document_type))?;

        debug!(
            "Fetched {} {} rows after '{}'",
            rows.len(),
            document_type,
            after
        );
        Ok(rows)
    }

    #[inline]
    pub async fn count(
        pool: &SqlitePool,
        document_type: DocumentType,
        organization_id: &str,
        filter: &DocumentFilter,
    ) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} t WHERE t.organization_id = ?{}",
            document_type.table_name(),
            Self::filter_clause(filter)
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(organization_id);
        if filter.stale_only {
            query = query.bind(document_type);
        }
        if let Some(since) = filter.updated_since {
            query = query.bind(since);
        }

        query
            .fetch_one(pool)
            .await
            .with_context(|| format!("Failed to count {} documents", document_type))
    }
}

pub struct EmbeddingQueries;

impl EmbeddingQueries {
    /// Insert or replace the ledger row for one document
    #[inline]
    pub async fn upsert(pool: &SqlitePool, entry: NewEmbeddingEntry) -> Result<EmbeddingEntry> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO embeddings (
                document_type, document_id, organization_id, vector_id, dimension, content, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (document_type, document_id) DO UPDATE SET
                organization_id = excluded.organization_id,
                vector_id = excluded.vector_id,
                dimension = excluded.dimension,
                content = excluded.content,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entry.document_type)
        .bind(&entry.document_id)
        .bind(&entry.organization_id)
        .bind(&entry.vector_id)
        .bind(entry.dimension)
        .bind(&entry.content)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to upsert embedding entry")?;

        Self::get(pool, entry.document_type, &entry.document_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve upserted embedding entry"))
    }

    #[inline]
    pub async fn get(
        pool: &SqlitePool,
        document_type: DocumentType,
        document_id: &str,
    ) -> Result<Option<EmbeddingEntry>> {
        sqlx::query_as::<_, EmbeddingEntry>(
            "SELECT * FROM embeddings WHERE document_type = ? AND document_id = ?",
        )
        .bind(document_type)
        .bind(document_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get embedding entry")
    }

    #[inline]
    pub async fn count_by_type(
        pool: &SqlitePool,
        document_type: DocumentType,
        organization_id: &str,
    ) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM embeddings WHERE organization_id = ? AND document_type = ?",
        )
        .bind(organization_id)
        .bind(document_type)
        .fetch_one(pool)
        .await
        .context("Failed to count embeddings")
    }

    #[inline]
    pub async fn list_by_type(
        pool: &SqlitePool,
        document_type: DocumentType,
        organization_id: &str,
    ) -> Result<Vec<EmbeddingEntry>> {
        sqlx::query_as::<_, EmbeddingEntry>(
            "SELECT * FROM embeddings WHERE organization_id = ? AND document_type = ? ORDER BY document_id",
        )
        .bind(organization_id)
        .bind(document_type)
        .fetch_all(pool)
        .await
        .context("Failed to list embeddings")
    }

    /// Document, embedding, freshness and orphan counts for one type
    #[inline]
    pub async fn counts(
        pool: &SqlitePool,
        document_type: DocumentType,
        organization_id: &str,
    ) -> Result<EmbeddingCounts> {
        let table = document_type.table_name();
        let sql = format!(
            r#"
            SELECT
                (SELECT COUNT(*) FROM {table} t WHERE t.organization_id = ?),
                (SELECT COUNT(*) FROM embeddings e
                    WHERE e.organization_id = ? AND e.document_type = ?),
                (SELECT COUNT(*) FROM {table} t
                    JOIN embeddings e ON e.document_type = ? AND e.document_id = t.id
                    WHERE t.organization_id = ? AND e.updated_at >= t.updated_at),
                (SELECT COUNT(*) FROM embeddings e
                    WHERE e.organization_id = ? AND e.document_type = ?
                    AND NOT EXISTS (SELECT 1 FROM {table} t WHERE t.id = e.document_id)),
                (SELECT MAX(e.updated_at) FROM embeddings e
                    WHERE e.organization_id = ? AND e.document_type = ?)
            "#
        );

        let (total_documents, total_embeddings, up_to_date, orphaned, last_updated) =
            sqlx::query_as::<_, (i64, i64, i64, i64, Option<chrono::NaiveDateTime>)>(&sql)
                .bind(organization_id)
                .bind(organization_id)
                .bind(document_type)
                .bind(document_type)
                .bind(organization_id)
                .bind(organization_id)
                .bind(document_type)
                .bind(organization_id)
                .bind(document_type)
                .fetch_one(pool)
                .await
                .with_context(|| format!("Failed to compute {} embedding counts", document_type))?;

        Ok(EmbeddingCounts {
            total_documents,
            total_embeddings,
            up_to_date,
            orphaned,
            last_updated,
        })
    }

    /// Ledger rows whose source document no longer exists
    #[inline]
    pub async fn list_orphaned(
        pool: &SqlitePool,
        document_type: DocumentType,
        organization_id: &str,
    ) -> Result<Vec<EmbeddingEntry>> {
        let sql = format!(
            r#"
            SELECT e.* FROM embeddings e
            WHERE e.organization_id = ? AND e.document_type = ?
            AND NOT EXISTS (SELECT 1 FROM {} t WHERE t.id = e.document_id)
            ORDER BY e.document_id
            "#,
            document_type.table_name()
        );

        sqlx::query_as::<_, EmbeddingEntry>(&sql)
            .bind(organization_id)
            .bind(document_type)
            .fetch_all(pool)
            .await
            .context("Failed to list orphaned embeddings")
    }

    #[inline]
    pub async fn delete(
        pool: &SqlitePool,
        document_type: DocumentType,
        document_id: &str,
    ) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM embeddings WHERE document_type = ? AND document_id = ?")
                .bind(document_type)
                .bind(document_id)
                .execute(pool)
                .await
                .context("Failed to delete embedding entry")?;

        Ok(result.rows_affected() > 0)
    }

    /// Clear the whole ledger; returns the number of rows removed
    #[inline]
    pub async fn delete_all(pool: &SqlitePool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM embeddings")
            .execute(pool)
            .await
            .context("Failed to clear embedding entries")?;

        Ok(result.rows_affected())
    }
}

pub struct StatisticsQueries;

impl StatisticsQueries {
    /// Aggregates for the chat context; `None` when the organization is unknown
    #[inline]
    pub async fn organization_statistics(
        pool: &SqlitePool,
        organization_id: &str,
        attendance_since: NaiveDate,
        attendance_window_days: u32,
    ) -> Result<Option<OrganizationStatistics>> {
        let Some(organization) = OrganizationQueries::get_by_id(pool, organization_id).await?
        else {
            return Ok(None);
        };

        let (total_employees, active_employees, monthly_payroll) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(is_active), 0),
                       COALESCE(SUM(CASE WHEN is_active = 1 THEN base_salary ELSE 0 END), 0)
                FROM employees WHERE organization_id = ?
                "#,
            )
            .bind(organization_id)
            .fetch_one(pool)
            .await
            .context("Failed to compute headcount")?;

        let by_department = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT COALESCE(d.name, 'Unassigned'), COUNT(*)
            FROM employees e LEFT JOIN departments d ON d.id = e.department_id
            WHERE e.organization_id = ? AND e.is_active = 1
            GROUP BY COALESCE(d.name, 'Unassigned')
            ORDER BY COUNT(*) DESC, COALESCE(d.name, 'Unassigned')
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
        .context("Failed to compute headcount per department")?;

        let by_employment_type = sqlx::query_as::<_, (EmploymentType, i64)>(
            r#"
            SELECT employment_type, COUNT(*) FROM employees
            WHERE organization_id = ? AND is_active = 1
            GROUP BY employment_type ORDER BY employment_type
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
        .context("Failed to compute headcount per employment type")?;

        let attendance_by_status = sqlx::query_as::<_, (AttendanceStatus, i64)>(
            r#"
            SELECT status, COUNT(*) FROM attendance_records
            WHERE organization_id = ? AND date >= ?
            GROUP BY status ORDER BY status
            "#,
        )
        .bind(organization_id)
        .bind(attendance_since)
        .fetch_all(pool)
        .await
        .context("Failed to compute attendance summary")?;

        Ok(Some(OrganizationStatistics {
            organization_name: organization.name,
            total_employees,
            active_employees,
            by_department,
            by_employment_type,
            monthly_payroll,
            attendance_window_days,
            attendance_since,
            attendance_by_status,
        }))
    }
}
