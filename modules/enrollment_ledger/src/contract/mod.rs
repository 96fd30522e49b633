//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::LedgerApi;
pub use error::LedgerError;
pub use model::{
    Actor, AttendanceEntry, AttendanceRecord, AttendanceReport, AttendanceStatus, AuditAction,
    AuditLogEntry, AuditLogFilter, AuditStats, Class, Enrollment, EnrollmentStatus,
    NewAuditLog, NewClass, NewStudent, Page, SeatLedger, Shift, Student, UnknownVariant,
};
