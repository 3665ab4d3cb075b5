use super::*;
use crate::database::sqlite::models::{AttendanceStatus, EmploymentType, Gender};
use chrono::NaiveDateTime;

fn timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("valid timestamp")
}

fn employee() -> Employee {
    Employee {
        id: "e1".to_string(),
        organization_id: "o1".to_string(),
        department_id: Some("d1".to_string()),
        employee_code: "EMP-001".to_string(),
        full_name: "Budi Santoso".to_string(),
        email: Some("budi@demo.co.id".to_string()),
        phone: None,
        position: "Software Engineer".to_string(),
        employment_type: EmploymentType::Permanent,
        gender: Some(Gender::Male),
        join_date: NaiveDate::from_ymd_opt(2022, 1, 10).expect("valid date"),
        base_salary: 15_000_000,
        is_active: true,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

#[test]
fn rupiah_formatting() {
    assert_eq!(format_rupiah(0), "Rp 0");
    assert_eq!(format_rupiah(999), "Rp 999");
    assert_eq!(format_rupiah(1_000), "Rp 1.000");
    assert_eq!(format_rupiah(15_000_000), "Rp 15.000.000");
    assert_eq!(format_rupiah(1_234_567_890), "Rp 1.234.567.890");
    assert_eq!(format_rupiah(-250_000), "-Rp 250.000");
}

#[test]
fn employee_rendering() {
    let department = Department {
        id: "d1".to_string(),
        organization_id: "o1".to_string(),
        name: "Engineering".to_string(),
        created_at: timestamp(),
    };

    let text = render_employee(&employee(), Some(&department));
    assert_eq!(
        text,
        "Employee: Budi Santoso (EMP-001)\n\
         Position: Software Engineer\n\
         Department: Engineering\n\
         Employment type: Permanent employee\n\
         Gender: Male\n\
         Join date: 2022-01-10\n\
         Monthly base salary: Rp 15.000.000\n\
         Status: Active\n\
         Email: budi@demo.co.id"
    );
}

#[test]
fn employee_without_department() {
    let mut employee = employee();
    employee.department_id = None;
    employee.is_active = false;

    let text = render_employee(&employee, None);
    assert!(text.contains("Department: Unassigned"));
    assert!(text.contains("Status: Inactive"));
}

#[test]
fn attendance_rendering_uses_labels() {
    let record = AttendanceRecord {
        id: "a1".to_string(),
        organization_id: "o1".to_string(),
        employee_id: "e1".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date"),
        check_in: Some(time(8, 15)),
        check_out: Some(time(17, 0)),
        status: AttendanceStatus::Late,
        notes: Some("  Traffic jam ".to_string()),
        created_at: timestamp(),
        updated_at: timestamp(),
    };

    let text = render_attendance(&record, &employee());
    assert_eq!(
        text,
        "Attendance record for Budi Santoso (EMP-001)\n\
         Date: 2024-03-04 (Monday)\n\
         Status: Late\n\
         Check-in: 08:15\n\
         Check-out: 17:00\n\
         Notes: Traffic jam"
    );
}

#[test]
fn sick_leave_without_times() {
    let record = AttendanceRecord {
        id: "a2".to_string(),
        organization_id: "o1".to_string(),
        employee_id: "e1".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date"),
        check_in: None,
        check_out: None,
        status: AttendanceStatus::Sick,
        notes: Some("   ".to_string()),
        created_at: timestamp(),
        updated_at: timestamp(),
    };

    let text = render_attendance(&record, &employee());
    assert!(text.contains("Status: Sick leave"));
    assert!(!text.contains("Check-in"));
    assert!(!text.contains("Notes"));
}

#[test]
fn shift_allocation_rendering() {
    let shift = Shift {
        id: "s1".to_string(),
        organization_id: "o1".to_string(),
        name: "Morning".to_string(),
        start_time: time(7, 0),
        end_time: time(15, 0),
        created_at: timestamp(),
        updated_at: timestamp(),
    };
    let allocation = ShiftAllocation {
        id: "sa1".to_string(),
        organization_id: "o1".to_string(),
        employee_id: "e1".to_string(),
        shift_id: "s1".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 3, 6).expect("valid date"),
        notes: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    };

    assert_eq!(
        render_shift_allocation(&allocation, &employee(), &shift),
        "Shift allocation for Budi Santoso (EMP-001)\n\
         Date: 2024-03-06 (Wednesday)\n\
         Shift: Morning (07:00 - 15:00)"
    );
}

#[test]
fn rendering_is_deterministic() {
    let a = render_employee(&employee(), None);
    let b = render_employee(&employee(), None);
    assert_eq!(a, b);
}
