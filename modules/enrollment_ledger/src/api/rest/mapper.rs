//! Mapper implementations for converting between DTOs and contract models
//!
//! This module contains all From/Into implementations for bidirectional
//! conversion between REST DTOs and transport-agnostic contract models.

use super::dto::*;
use crate::contract;
use crate::contract::{AttendanceStatus, AuditAction, EnrollmentStatus, Shift};
use chrono::NaiveDate;

// ===== Enumerations =====

impl From<Shift> for ShiftDto {
    fn from(shift: Shift) -> Self {
        match shift {
            Shift::Morning => Self::Morning,
            Shift::Afternoon => Self::Afternoon,
            Shift::Evening => Self::Evening,
        }
    }
}

impl From<ShiftDto> for Shift {
    fn from(shift: ShiftDto) -> Self {
        match shift {
            ShiftDto::Morning => Self::Morning,
            ShiftDto::Afternoon => Self::Afternoon,
            ShiftDto::Evening => Self::Evening,
        }
    }
}

impl From<EnrollmentStatus> for EnrollmentStatusDto {
    fn from(status: EnrollmentStatus) -> Self {
        match status {
            EnrollmentStatus::Active => Self::Active,
            EnrollmentStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<EnrollmentStatusDto> for EnrollmentStatus {
    fn from(status: EnrollmentStatusDto) -> Self {
        match status {
            EnrollmentStatusDto::Active => Self::Active,
            EnrollmentStatusDto::Cancelled => Self::Cancelled,
        }
    }
}

impl From<AttendanceStatus> for AttendanceStatusDto {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Present => Self::Present,
            AttendanceStatus::Absent => Self::Absent,
            AttendanceStatus::Justified => Self::Justified,
        }
    }
}

impl From<AttendanceStatusDto> for AttendanceStatus {
    fn from(status: AttendanceStatusDto) -> Self {
        match status {
            AttendanceStatusDto::Present => Self::Present,
            AttendanceStatusDto::Absent => Self::Absent,
            AttendanceStatusDto::Justified => Self::Justified,
        }
    }
}

impl From<AuditAction> for AuditActionDto {
    fn from(action: AuditAction) -> Self {
        match action {
            AuditAction::Create => Self::Create,
            AuditAction::Update => Self::Update,
            AuditAction::Delete => Self::Delete,
            AuditAction::Login => Self::Login,
            AuditAction::Logout => Self::Logout,
            AuditAction::Approve => Self::Approve,
            AuditAction::Reject => Self::Reject,
        }
    }
}

impl From<AuditActionDto> for AuditAction {
    fn from(action: AuditActionDto) -> Self {
        match action {
            AuditActionDto::Create => Self::Create,
            AuditActionDto::Update => Self::Update,
            AuditActionDto::Delete => Self::Delete,
            AuditActionDto::Login => Self::Login,
            AuditActionDto::Logout => Self::Logout,
            AuditActionDto::Approve => Self::Approve,
            AuditActionDto::Reject => Self::Reject,
        }
    }
}

// ===== Catalog conversions =====

impl From<contract::Class> for ClassDto {
    fn from(class: contract::Class) -> Self {
        Self {
            id: class.id,
            name: class.name,
            shift: class.shift.into(),
            start_date: class.start_date,
            end_date: class.end_date,
            capacity: class.capacity,
            seats_available: class.seats_available,
            created_at: class.created_at,
            updated_at: class.updated_at,
        }
    }
}

impl From<CreateClassRequest> for contract::NewClass {
    fn from(req: CreateClassRequest) -> Self {
        Self {
            name: req.name,
            shift: req.shift.into(),
            start_date: req.start_date,
            end_date: req.end_date,
            capacity: req.capacity,
        }
    }
}

impl From<contract::Student> for StudentDto {
    fn from(student: contract::Student) -> Self {
        Self {
            id: student.id,
            first_name: student.first_name,
            last_name: student.last_name,
            email: student.email,
            phone: student.phone,
            created_at: student.created_at,
            updated_at: student.updated_at,
        }
    }
}

impl From<CreateStudentRequest> for contract::NewStudent {
    fn from(req: CreateStudentRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
        }
    }
}

// ===== Enrollment conversions =====

impl From<contract::Enrollment> for EnrollmentDto {
    fn from(enrollment: contract::Enrollment) -> Self {
        Self {
            student_id: enrollment.student_id,
            class_id: enrollment.class_id,
            status: enrollment.status.into(),
            enrolled_at: enrollment.enrolled_at,
            updated_at: enrollment.updated_at,
            cancelled_at: enrollment.cancelled_at,
        }
    }
}

impl From<contract::SeatLedger> for SeatLedgerDto {
    fn from(ledger: contract::SeatLedger) -> Self {
        Self {
            class_id: ledger.class_id,
            capacity: ledger.capacity,
            seats_available: ledger.seats_available,
            active_enrollments: ledger.active_enrollments,
            balanced: ledger.is_balanced(),
        }
    }
}

// ===== Attendance conversions =====

impl From<contract::AttendanceRecord> for AttendanceDto {
    fn from(record: contract::AttendanceRecord) -> Self {
        Self {
            id: record.id,
            student_id: record.student_id,
            class_id: record.class_id,
            date: record.date,
            status: record.status.into(),
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<AttendanceEntryDto> for contract::AttendanceEntry {
    fn from(entry: AttendanceEntryDto) -> Self {
        Self {
            student_id: entry.student_id,
            status: entry.status.into(),
            notes: entry.notes,
        }
    }
}

impl AttendanceReportDto {
    pub fn new(class_id: i32, date: NaiveDate, report: contract::AttendanceReport) -> Self {
        Self {
            class_id,
            date,
            present: report.present,
            absent: report.absent,
            justified: report.justified,
            total_students: report.total_students,
        }
    }
}

// ===== Audit conversions =====

impl From<contract::AuditLogEntry> for AuditLogDto {
    fn from(entry: contract::AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            actor_id: entry.actor_id,
            action: entry.action.into(),
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            before_state: entry.before_state,
            after_state: entry.after_state,
            origin_address: entry.origin_address,
            origin_agent: entry.origin_agent,
            created_at: entry.created_at,
        }
    }
}

impl From<&AuditListQuery> for contract::AuditLogFilter {
    fn from(query: &AuditListQuery) -> Self {
        Self {
            actor_id: query.actor_id,
            action: query.action.map(Into::into),
            entity_type: query.entity_type.clone(),
            entity_id: query.entity_id.clone(),
            from: query.from,
            to: query.to,
        }
    }
}

impl From<contract::AuditStats> for AuditStatsDto {
    fn from(stats: contract::AuditStats) -> Self {
        Self {
            total: stats.total,
            by_action: stats
                .by_action
                .into_iter()
                .map(|(action, count)| (action.as_str().to_string(), count))
                .collect(),
            by_entity_type: stats.by_entity_type,
            distinct_actors: stats.distinct_actors,
        }
    }
}

// ===== List conversions =====

impl<T, M: Into<T>> From<contract::Page<M>> for PageResponse<T> {
    fn from(page: contract::Page<M>) -> Self {
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}
