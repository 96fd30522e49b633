//! Contract models for the enrollment ledger
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ===== Catalog =====

/// Class (cohort) with its seat counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub id: i32,
    pub name: String,
    pub shift: Shift,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Seat count fixed at creation
    pub capacity: i32,
    /// Seats not held by an active enrollment
    pub seats_available: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for class creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClass {
    pub name: String,
    pub shift: Shift,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub capacity: i32,
}

/// Time-of-day slot a class runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    Morning,
    Afternoon,
    Evening,
}

/// Student
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for student creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

// ===== Enrollment =====

/// Enrollment of a student in a class, keyed by the pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub student_id: i32,
    pub class_id: i32,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }
}

/// Enrollment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrollmentStatus {
    /// Holds a seat
    Active,
    /// Seat already returned to the class
    Cancelled,
}

/// Snapshot of a class's seat accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatLedger {
    pub class_id: i32,
    pub capacity: i32,
    pub seats_available: i32,
    pub active_enrollments: u64,
}

impl SeatLedger {
    /// `seats_available + active == capacity`
    pub fn is_balanced(&self) -> bool {
        i64::from(self.seats_available) + self.active_enrollments as i64
            == i64::from(self.capacity)
    }
}

// ===== Attendance =====

/// One student's presence in one class on one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub id: i32,
    pub student_id: i32,
    pub class_id: i32,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attendance mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Justified,
}

/// Single entry of a bulk attendance call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub student_id: i32,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Per-day attendance totals for a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttendanceReport {
    pub present: u64,
    pub absent: u64,
    pub justified: u64,
    /// Roster size (active enrollments)
    pub total_students: u64,
}

// ===== Actor =====

/// Authenticated caller, supplied by the authentication collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub role: String,
}

// ===== Audit =====

/// Kind of action recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    Approve,
    Reject,
}

/// Persisted audit log row. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    pub id: i64,
    pub actor_id: Option<i32>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub origin_address: Option<String>,
    pub origin_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit log row before persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditLog {
    pub actor_id: Option<i32>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub origin_address: Option<String>,
    pub origin_agent: Option<String>,
}

impl NewAuditLog {
    pub fn new(action: AuditAction, entity_type: impl Into<String>) -> Self {
        Self {
            actor_id: None,
            action,
            entity_type: entity_type.into(),
            entity_id: None,
            before_state: None,
            after_state: None,
            origin_address: None,
            origin_agent: None,
        }
    }

    pub fn with_actor(mut self, actor_id: Option<i32>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn with_entity_id(mut self, entity_id: Option<String>) -> Self {
        self.entity_id = entity_id;
        self
    }

    pub fn with_states(
        mut self,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        self.before_state = before;
        self.after_state = after;
        self
    }

    pub fn with_origin(mut self, address: Option<String>, agent: Option<String>) -> Self {
        self.origin_address = address;
        self.origin_agent = agent;
        self
    }
}

/// Filters for listing audit log rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilter {
    pub actor_id: Option<i32>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    /// 1-based page number
    pub page: u64,
    pub page_size: u64,
}

/// Aggregated audit counts over a time window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditStats {
    pub total: u64,
    pub by_action: BTreeMap<AuditAction, u64>,
    pub by_entity_type: BTreeMap<String, u64>,
    pub distinct_actors: u64,
}

// ===== Text forms =====

/// Error for unknown enum text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(Shift, "shift", {
    Morning => "morning",
    Afternoon => "afternoon",
    Evening => "evening",
});

text_enum!(EnrollmentStatus, "enrollment status", {
    Active => "active",
    Cancelled => "cancelled",
});

text_enum!(AttendanceStatus, "attendance status", {
    Present => "present",
    Absent => "absent",
    Justified => "justified",
});

text_enum!(AuditAction, "audit action", {
    Create => "create",
    Update => "update",
    Delete => "delete",
    Login => "login",
    Logout => "logout",
    Approve => "approve",
    Reject => "reject",
});
