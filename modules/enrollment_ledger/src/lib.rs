//! Enrollment Ledger Module
//!
//! Seat-capacity accounting for class enrollments, per-day attendance and an
//! append-only audit trail fed by an HTTP interception layer.

// Public exports
pub mod contract;
pub use contract::{
    client::LedgerApi, error::LedgerError, Actor, AttendanceRecord, AttendanceStatus, AuditAction,
    AuditLogEntry, Class, Enrollment, EnrollmentStatus, SeatLedger, Student,
};

pub mod config;
pub use config::Config;

pub mod module;
pub use module::EnrollmentLedgerModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
