//! Pure text renderings of HR records for embedding

#[cfg(test)]
mod tests;

use chrono::{NaiveDate, NaiveTime};
use itertools::Itertools;

use crate::database::sqlite::models::{
    AttendanceRecord, Department, Employee, Shift, ShiftAllocation,
};

/// Format whole Rupiah with dot thousands separators, e.g. `Rp 15.000.000`
#[inline]
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(String::from_utf8_lossy)
        .join(".");

    if amount < 0 {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d (%A)").to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[inline]
pub fn render_employee(employee: &Employee, department: Option<&Department>) -> String {
    let mut lines = vec![
        format!("Employee: {}", employee.display_name()),
        format!("Position: {}", employee.position),
        format!(
            "Department: {}",
            department.map_or("Unassigned", |d| d.name.as_str())
        ),
        format!("Employment type: {}", employee.employment_type.label()),
    ];

    if let Some(gender) = employee.gender {
        lines.push(format!("Gender: {}", gender.label()));
    }
    lines.push(format!("Join date: {}", employee.join_date.format("%Y-%m-%d")));
    lines.push(format!(
        "Monthly base salary: {}",
        format_rupiah(employee.base_salary)
    ));
    lines.push(format!(
        "Status: {}",
        if employee.is_active {
            "Active"
        } else {
            "Inactive"
        }
    ));
    if let Some(email) = &employee.email {
        lines.push(format!("Email: {}", email));
    }
    if let Some(phone) = &employee.phone {
        lines.push(format!("Phone: {}", phone));
    }

    lines.join("\n")
}

#[inline]
pub fn render_attendance(record: &AttendanceRecord, employee: &Employee) -> String {
    let mut lines = vec![
        format!("Attendance record for {}", employee.display_name()),
        format!("Date: {}", format_date(record.date)),
        format!("Status: {}", record.status.label()),
    ];

    if let Some(check_in) = record.check_in {
        lines.push(format!("Check-in: {}", format_time(check_in)));
    }
    if let Some(check_out) = record.check_out {
        lines.push(format!("Check-out: {}", format_time(check_out)));
    }
    if let Some(notes) = record.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(format!("Notes: {}", notes.trim()));
    }

    lines.join("\n")
}

#[inline]
pub fn render_shift_allocation(
    allocation: &ShiftAllocation,
    employee: &Employee,
    shift: &Shift,
) -> String {
    let mut lines = vec![
        format!("Shift allocation for {}", employee.display_name()),
        format!("Date: {}", format_date(allocation.date)),
        format!(
            "Shift: {} ({} - {})",
            shift.name,
            format_time(shift.start_time),
            format_time(shift.end_time)
        ),
    ];

    if let Some(notes) = allocation.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(format!("Notes: {}", notes.trim()));
    }

    lines.join("\n")
}
