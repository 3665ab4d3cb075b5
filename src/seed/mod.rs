//! Demo data for trying the assistant end to end


use chrono::{Days, NaiveDate, NaiveTime, TimeDelta};
use tracing::info;

use crate::database::Database;
use crate::database::sqlite::models::{
    AttendanceStatus, EmploymentType, Gender, NewAttendanceRecord, NewDepartment, NewEmployee,
    NewShift, NewShiftAllocation, Organization, Shift,
};
use crate::database::sqlite::queries::{
    AttendanceQueries, DepartmentQueries, EmployeeQueries, OrganizationQueries,
    ShiftAllocationQueries, ShiftQueries,
};
use crate::{HrError, Result};

pub const DEMO_SLUG: &str = "demo-company";
pub const DEMO_NAME: &str = "Demo Company";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOptions {
    pub slug: String,
    pub name: String,
    /// Days of attendance and shift history ending at `today`
    pub days: u32,
    pub today: NaiveDate,
}

impl SeedOptions {
    #[inline]
    pub fn demo(today: NaiveDate) -> Self {
        Self {
            slug: DEMO_SLUG.to_string(),
            name: DEMO_NAME.to_string(),
            days: 14,
            today,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub organization: Organization,
    pub departments: usize,
    pub employees: usize,
    pub shifts: usize,
    pub shift_allocations: usize,
    pub attendance_records: usize,
}

struct DemoEmployee {
    code: &'static str,
    name: &'static str,
    department: &'static str,
    position: &'static str,
    employment_type: EmploymentType,
    gender: Gender,
    join_date: (i32, u32, u32),
    salary: i64,
}

const DEPARTMENTS: [&str; 3] = ["Engineering", "Human Resources", "Finance"];

const EMPLOYEES: [DemoEmployee; 3] = [
    DemoEmployee {
        code: "EMP-001",
        name: "Budi Santoso",
        department: "Engineering",
        position: "Software Engineer",
        employment_type: EmploymentType::Permanent,
        gender: Gender::Male,
        join_date: (2021, 3, 15),
        salary: 15_000_000,
    },
    DemoEmployee {
        code: "EMP-002",
        name: "Siti Rahmawati",
        department: "Human Resources",
        position: "HR Generalist",
        employment_type: EmploymentType::Contract,
        gender: Gender::Female,
        join_date: (2022, 7, 1),
        salary: 9_500_000,
    },
    DemoEmployee {
        code: "EMP-003",
        name: "Andi Wijaya",
        department: "Finance",
        position: "Accountant",
        employment_type: EmploymentType::Probation,
        gender: Gender::Male,
        join_date: (2024, 1, 8),
        salary: 8_000_000,
    },
];

fn time(hour: u32, minute: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| HrError::InvalidInput(format!("invalid time {:02}:{:02}", hour, minute)))
}

fn email_for(name: &str, slug: &str) -> String {
    let local = name.to_lowercase().replace(' ', ".");
    format!("{}@{}.example", local, slug)
}

/// Deterministic attendance for one employee on one day
fn attendance_for(
    day_index: u64,
    employee_index: u64,
    shift: &Shift,
) -> (AttendanceStatus, Option<NaiveTime>, Option<NaiveTime>, Option<String>) {
    match (day_index + employee_index * 3) % 10 {
        7 => (
            AttendanceStatus::Late,
            Some(shift.start_time + TimeDelta::minutes(35)),
            Some(shift.end_time),
            Some("Traffic jam".to_string()),
        ),
        9 if employee_index == 1 => (
            AttendanceStatus::Sick,
            None,
            None,
            Some("Doctor's note submitted".to_string()),
        ),
        9 => (
            AttendanceStatus::Leave,
            None,
            None,
            Some("Annual leave".to_string()),
        ),
        _ => (
            AttendanceStatus::Present,
            Some(shift.start_time - TimeDelta::minutes(5)),
            Some(shift.end_time),
            None,
        ),
    }
}

/// Create a demo organization with departments, shifts, employees and history
///
/// Fails with `InvalidInput` when the slug is already taken. The inserts run
/// in one transaction, so a failed seed leaves no partial organization.
#[inline]
pub async fn seed_demo(database: &Database, options: &SeedOptions) -> Result<SeedSummary> {
    let pool = database.pool();

    if OrganizationQueries::get_by_slug(pool, &options.slug)
        .await
        .map_err(HrError::store)?
        .is_some()
    {
        return Err(HrError::InvalidInput(format!(
            "organization '{}' already exists",
            options.slug
        )));
    }

    let mut tx = pool.begin().await.map_err(HrError::store)?;

    let organization = OrganizationQueries::create(&mut *tx, &options.name, &options.slug)
        .await
        .map_err(HrError::store)?;
    info!("Seeding organization {}", organization.slug);

    let mut departments = Vec::new();
    for name in DEPARTMENTS {
        departments.push(
            DepartmentQueries::create(
                &mut *tx,
                NewDepartment {
                    organization_id: organization.id.clone(),
                    name: name.to_string(),
                },
            )
            .await
            .map_err(HrError::store)?,
        );
    }

    let mut shifts = Vec::new();
    for (name, start, end) in [
        ("Morning", time(7, 0)?, time(15, 0)?),
        ("Afternoon", time(15, 0)?, time(23, 0)?),
    ] {
        shifts.push(
            ShiftQueries::create(
                &mut *tx,
                NewShift {
                    organization_id: organization.id.clone(),
                    name: name.to_string(),
                    start_time: start,
                    end_time: end,
                },
            )
            .await
            .map_err(HrError::store)?,
        );
    }

    let mut employees = Vec::new();
    for demo in &EMPLOYEES {
        let (year, month, day) = demo.join_date;
        let join_date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| HrError::InvalidInput(format!("invalid join date for {}", demo.code)))?;
        let department_id = departments
            .iter()
            .find(|d| d.name == demo.department)
            .map(|d| d.id.clone());

        employees.push(
            EmployeeQueries::create(
                &mut *tx,
                NewEmployee {
                    organization_id: organization.id.clone(),
                    department_id,
                    employee_code: demo.code.to_string(),
                    full_name: demo.name.to_string(),
                    email: Some(email_for(demo.name, &options.slug)),
                    phone: None,
                    position: demo.position.to_string(),
                    employment_type: demo.employment_type,
                    gender: Some(demo.gender),
                    join_date,
                    base_salary: demo.salary,
                },
            )
            .await
            .map_err(HrError::store)?,
        );
    }

    let mut shift_allocations = 0;
    let mut attendance_records = 0;
    for day_index in 0..u64::from(options.days) {
        let Some(date) = options.today.checked_sub_days(Days::new(day_index)) else {
            break;
        };

        for (employee_index, employee) in (0u64..).zip(&employees) {
            let Some(shift) = shifts.get(((day_index + employee_index) % 2) as usize) else {
                continue;
            };

            ShiftAllocationQueries::create(
                &mut *tx,
                NewShiftAllocation {
                    organization_id: organization.id.clone(),
                    employee_id: employee.id.clone(),
                    shift_id: shift.id.clone(),
                    date,
                    notes: None,
                },
            )
            .await
            .map_err(HrError::store)?;
            shift_allocations += 1;

            let (status, check_in, check_out, notes) =
                attendance_for(day_index, employee_index, shift);
            AttendanceQueries::create(
                &mut *tx,
                NewAttendanceRecord {
                    organization_id: organization.id.clone(),
                    employee_id: employee.id.clone(),
                    date,
                    check_in,
                    check_out,
                    status,
                    notes,
                },
            )
            .await
            .map_err(HrError::store)?;
            attendance_records += 1;
        }
    }

    tx.commit().await.map_err(HrError::store)?;

    info!(
        "Seeded {} employees, {} shift allocations and {} attendance records",
        employees.len(),
        shift_allocations,
        attendance_records
    );

    Ok(SeedSummary {
        organization,
        departments: departments.len(),
        employees: employees.len(),
        shifts: shifts.len(),
        shift_allocations,
        attendance_records,
    })
}
