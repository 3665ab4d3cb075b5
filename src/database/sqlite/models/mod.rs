
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use crate::HrError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EmploymentType {
    Permanent,
    Contract,
    Probation,
    Intern,
}

impl EmploymentType {
    /// Natural-language label used in rendered documents and statistics
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            EmploymentType::Permanent => "Permanent employee",
            EmploymentType::Contract => "Contract employee",
            EmploymentType::Probation => "Employee on probation",
            EmploymentType::Intern => "Intern",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: String,
    pub organization_id: String,
    pub department_id: Option<String>,
    pub employee_code: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: String,
    pub employment_type: EmploymentType,
    pub gender: Option<Gender>,
    pub join_date: NaiveDate,
    /// Monthly base salary in whole Rupiah
    pub base_salary: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Shift {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShiftAllocation {
    pub id: String,
    pub organization_id: String,
    pub employee_id: String,
    pub shift_id: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Leave,
    Sick,
    Permission,
}

impl AttendanceStatus {
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Absent => "Absent without notice",
            AttendanceStatus::Leave => "On leave",
            AttendanceStatus::Sick => "Sick leave",
            AttendanceStatus::Permission => "Excused with permission",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: String,
    pub organization_id: String,
    pub employee_id: String,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Kind of HR record that is embedded as one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    Employee,
    Attendance,
    Shift,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::Employee,
        DocumentType::Attendance,
        DocumentType::Shift,
    ];

    /// The given type, or every type in indexing order
    #[inline]
    pub fn selection(document_type: Option<Self>) -> Vec<Self> {
        document_type.map_or_else(|| Self::ALL.to_vec(), |t| vec![t])
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Employee => "EMPLOYEE",
            DocumentType::Attendance => "ATTENDANCE",
            DocumentType::Shift => "SHIFT",
        }
    }

    /// Source table holding documents of this type
    #[inline]
    pub fn table_name(self) -> &'static str {
        match self {
            DocumentType::Employee => "employees",
            DocumentType::Attendance => "attendance_records",
            DocumentType::Shift => "shift_allocations",
        }
    }
}

impl std::fmt::Display for DocumentType {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = HrError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EMPLOYEE" | "EMPLOYEES" => Ok(DocumentType::Employee),
            "ATTENDANCE" | "ATTENDANCES" => Ok(DocumentType::Attendance),
            "SHIFT" | "SHIFTS" | "SHIFT_ALLOCATION" => Ok(DocumentType::Shift),
            _ => Err(HrError::InvalidInput(format!(
                "unknown document type '{}' (expected employee, attendance or shift)",
                s
            ))),
        }
    }
}

/// Ledger row for one embedded document; the vector itself lives in LanceDB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EmbeddingEntry {
    pub document_type: DocumentType,
    pub document_id: String,
    pub organization_id: String,
    pub vector_id: String,
    pub dimension: i64,
    pub content: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmbeddingEntry {
    pub document_type: DocumentType,
    pub document_id: String,
    pub organization_id: String,
    pub vector_id: String,
    pub dimension: i64,
    pub content: String,
}

/// Narrows which documents are listed for reindexing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Only documents modified at or after this instant
    pub updated_since: Option<NaiveDateTime>,
    /// Only documents without an up-to-date embedding
    pub stale_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
    pub organization_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub organization_id: String,
    pub department_id: Option<String>,
    pub employee_code: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: String,
    pub employment_type: EmploymentType,
    pub gender: Option<Gender>,
    pub join_date: NaiveDate,
    pub base_salary: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmployeeUpdate {
    pub position: Option<String>,
    pub department_id: Option<String>,
    pub base_salary: Option<i64>,
    pub employment_type: Option<EmploymentType>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShift {
    pub organization_id: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShiftAllocation {
    pub organization_id: String,
    pub employee_id: String,
    pub shift_id: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendanceRecord {
    pub organization_id: String,
    pub employee_id: String,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Raw per-type embedding counts for one organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingCounts {
    pub total_documents: i64,
    pub total_embeddings: i64,
    pub up_to_date: i64,
    pub orphaned: i64,
    pub last_updated: Option<NaiveDateTime>,
}

/// Aggregates fed to the chat context
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationStatistics {
    pub organization_name: String,
    pub total_employees: i64,
    pub active_employees: i64,
    pub by_department: Vec<(String, i64)>,
    pub by_employment_type: Vec<(EmploymentType, i64)>,
    /// Sum of base salaries of active employees
    pub monthly_payroll: i64,
    pub attendance_window_days: u32,
    pub attendance_since: NaiveDate,
    pub attendance_by_status: Vec<(AttendanceStatus, i64)>,
}

impl Employee {
    #[inline]
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.full_name, self.employee_code)
    }
}
