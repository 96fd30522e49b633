//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models. Enum columns are
//! stored as lowercase text; an unknown value in a row is a data error.

use super::entity::{attendance_record, audit_log, class, enrollment, student};
use crate::contract::{
    AttendanceRecord, AuditLogEntry, Class, Enrollment, NewAuditLog, NewClass, NewStudent,
    Student,
};
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};

// ===== Class Conversions =====

impl TryFrom<class::Model> for Class {
    type Error = anyhow::Error;

    fn try_from(entity: class::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            name: entity.name,
            shift: entity.shift.parse()?,
            start_date: entity.start_date,
            end_date: entity.end_date,
            capacity: entity.capacity,
            seats_available: entity.seats_available,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

impl From<&NewClass> for class::ActiveModel {
    fn from(model: &NewClass) -> Self {
        let now = Utc::now();
        Self {
            id: NotSet,
            name: Set(model.name.clone()),
            shift: Set(model.shift.as_str().to_string()),
            start_date: Set(model.start_date),
            end_date: Set(model.end_date),
            capacity: Set(model.capacity),
            seats_available: Set(model.capacity),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

// ===== Student Conversions =====

impl From<student::Model> for Student {
    fn from(entity: student::Model) -> Self {
        Self {
            id: entity.id,
            first_name: entity.first_name,
            last_name: entity.last_name,
            email: entity.email,
            phone: entity.phone,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&NewStudent> for student::ActiveModel {
    fn from(model: &NewStudent) -> Self {
        let now = Utc::now();
        Self {
            id: NotSet,
            first_name: Set(model.first_name.clone()),
            last_name: Set(model.last_name.clone()),
            email: Set(model.email.clone()),
            phone: Set(model.phone.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

// ===== Enrollment Conversions =====

impl TryFrom<enrollment::Model> for Enrollment {
    type Error = anyhow::Error;

    fn try_from(entity: enrollment::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            student_id: entity.student_id,
            class_id: entity.class_id,
            status: entity.status.parse()?,
            enrolled_at: entity.enrolled_at,
            updated_at: entity.updated_at,
            cancelled_at: entity.cancelled_at,
        })
    }
}

// ===== Attendance Conversions =====

impl TryFrom<attendance_record::Model> for AttendanceRecord {
    type Error = anyhow::Error;

    fn try_from(entity: attendance_record::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            student_id: entity.student_id,
            class_id: entity.class_id,
            date: entity.date,
            status: entity.status.parse()?,
            notes: entity.notes,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

// ===== Audit Conversions =====

impl TryFrom<audit_log::Model> for AuditLogEntry {
    type Error = anyhow::Error;

    fn try_from(entity: audit_log::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            actor_id: entity.actor_id,
            action: entity.action.parse()?,
            entity_type: entity.entity_type,
            entity_id: entity.entity_id,
            before_state: entity.before_state,
            after_state: entity.after_state,
            origin_address: entity.origin_address,
            origin_agent: entity.origin_agent,
            created_at: entity.created_at,
        })
    }
}

impl From<&NewAuditLog> for audit_log::ActiveModel {
    fn from(model: &NewAuditLog) -> Self {
        Self {
            id: NotSet,
            actor_id: Set(model.actor_id),
            action: Set(model.action.as_str().to_string()),
            entity_type: Set(model.entity_type.clone()),
            entity_id: Set(model.entity_id.clone()),
            before_state: Set(model.before_state.clone()),
            after_state: Set(model.after_state.clone()),
            origin_address: Set(model.origin_address.clone()),
            origin_agent: Set(model.origin_agent.clone()),
            created_at: Set(Utc::now()),
        }
    }
}

/// Convert a batch of rows, failing on the first malformed one
pub fn try_collect<E, M>(rows: Vec<E>) -> anyhow::Result<Vec<M>>
where
    M: TryFrom<E, Error = anyhow::Error>,
{
    rows.into_iter().map(M::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{EnrollmentStatus, Shift};
    use chrono::NaiveDate;

    #[test]
    fn test_new_class_starts_with_full_seats() {
        let new_class = NewClass {
            name: "Welding".to_string(),
            shift: Shift::Evening,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 29).unwrap(),
            capacity: 12,
        };
        let active: class::ActiveModel = (&new_class).into();
        assert_eq!(active.capacity, Set(12));
        assert_eq!(active.seats_available, Set(12));
        assert_eq!(active.shift, Set("evening".to_string()));
    }

    #[test]
    fn test_enrollment_row_with_unknown_status_is_rejected() {
        let row = enrollment::Model {
            student_id: 1,
            class_id: 2,
            status: "waitlisted".to_string(),
            enrolled_at: Utc::now(),
            updated_at: Utc::now(),
            cancelled_at: None,
        };
        assert!(Enrollment::try_from(row.clone()).is_err());

        let ok = enrollment::Model {
            status: "active".to_string(),
            ..row
        };
        assert_eq!(
            Enrollment::try_from(ok).unwrap().status,
            EnrollmentStatus::Active
        );
    }
}
