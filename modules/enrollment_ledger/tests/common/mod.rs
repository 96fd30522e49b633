//! Common test utilities: in-memory and on-disk databases, catalog fixtures
#![allow(dead_code)]

use chrono::NaiveDate;
use enrollment_ledger::contract::{Class, NewClass, NewStudent, Shift, Student};
use enrollment_ledger::domain::Services;
use enrollment_ledger::infra::storage::migrations::Migrator;
use enrollment_ledger::infra::storage::repositories::SeaOrmAuditLogRepository;
use enrollment_ledger::Config;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tempfile::TempDir;

/// Fresh in-memory SQLite database with all migrations applied.
///
/// A single pooled connection keeps the in-memory database alive and
/// serialises transactions the way row locks do on Postgres.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");
    db
}

/// On-disk SQLite database behind a pool of `connections`, so transactions
/// really run side by side. The database lives as long as the `TempDir`.
pub async fn setup_file_db(connections: u32) -> (TempDir, DatabaseConnection) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("ledger.db").display());
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(connections)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open file database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");
    (dir, db)
}

pub async fn setup_pooled_services(connections: u32) -> (TempDir, Arc<Services>) {
    let (dir, db) = setup_file_db(connections).await;
    (dir, services_with(db, Config::default()))
}

pub fn services_with(db: DatabaseConnection, config: Config) -> Arc<Services> {
    let db = Arc::new(db);
    let audit_repo = Arc::new(SeaOrmAuditLogRepository::new(db.clone()));
    Arc::new(Services::new(db, audit_repo, config))
}

pub async fn setup_services() -> Arc<Services> {
    services_with(setup_db().await, Config::default())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Class running April to June 2024
pub async fn create_class(services: &Services, name: &str, capacity: i32) -> Class {
    services
        .catalog
        .create_class(NewClass {
            name: name.to_string(),
            shift: Shift::Morning,
            start_date: date(2024, 4, 1),
            end_date: date(2024, 6, 30),
            capacity,
        })
        .await
        .expect("Failed to create class")
}

pub async fn create_student(services: &Services, tag: &str) -> Student {
    services
        .catalog
        .create_student(NewStudent {
            first_name: "Student".to_string(),
            last_name: tag.to_string(),
            email: format!("{tag}@example.org"),
            phone: None,
        })
        .await
        .expect("Failed to create student")
}

pub async fn create_students(services: &Services, count: usize) -> Vec<Student> {
    let mut students = Vec::with_capacity(count);
    for i in 0..count {
        students.push(create_student(services, &format!("student{i}")).await);
    }
    students
}

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}
