//! Class and student catalog
//!
//! The minimal CRUD the ledger depends on. A class's seat counter is
//! initialised here and never touched again outside `EnrollmentService`.

use super::{decode_err, store_err};
use crate::contract::{Class, LedgerError, NewClass, NewStudent, Student};
use crate::infra::storage::entity::{class, student};
use crate::infra::storage::mapper::try_collect;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};
use std::sync::Arc;

pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ===== Classes =====

    pub async fn create_class(&self, new_class: NewClass) -> Result<Class, LedgerError> {
        if new_class.name.trim().is_empty() {
            return Err(LedgerError::validation("class name cannot be empty"));
        }
        if new_class.capacity < 0 {
            return Err(LedgerError::validation(format!(
                "capacity must be non-negative, got {}",
                new_class.capacity
            )));
        }
        if new_class.start_date > new_class.end_date {
            return Err(LedgerError::validation(format!(
                "start_date {} is after end_date {}",
                new_class.start_date, new_class.end_date
            )));
        }

        let active: class::ActiveModel = (&new_class).into();
        let row = active
            .insert(&*self.db)
            .await
            .map_err(store_err("create class"))?;

        tracing::info!(class_id = row.id, capacity = row.capacity, "class created");
        Class::try_from(row).map_err(decode_err("create class"))
    }

    pub async fn get_class(&self, class_id: i32) -> Result<Class, LedgerError> {
        class::Entity::find_by_id(class_id)
            .one(&*self.db)
            .await
            .map_err(store_err("get class"))?
            .ok_or_else(|| LedgerError::not_found("class", class_id))
            .and_then(|row| Class::try_from(row).map_err(decode_err("get class")))
    }

    pub async fn list_classes(&self) -> Result<Vec<Class>, LedgerError> {
        let rows = class::Entity::find()
            .order_by_asc(class::Column::StartDate)
            .order_by_asc(class::Column::Id)
            .all(&*self.db)
            .await
            .map_err(store_err("list classes"))?;

        try_collect(rows).map_err(decode_err("list classes"))
    }

    // ===== Students =====

    pub async fn create_student(&self, new_student: NewStudent) -> Result<Student, LedgerError> {
        if new_student.first_name.trim().is_empty() || new_student.last_name.trim().is_empty() {
            return Err(LedgerError::validation("student name cannot be empty"));
        }
        if !new_student.email.contains('@') {
            return Err(LedgerError::validation(format!(
                "'{}' is not an email address",
                new_student.email
            )));
        }

        let active: student::ActiveModel = (&new_student).into();
        let row = active.insert(&*self.db).await.map_err(|err| {
            match store_err("create student")(err) {
                LedgerError::Conflict { .. } => LedgerError::conflict(format!(
                    "a student with email '{}' already exists",
                    new_student.email
                )),
                other => other,
            }
        })?;

        tracing::info!(student_id = row.id, "student created");
        Ok(row.into())
    }

    pub async fn get_student(&self, student_id: i32) -> Result<Student, LedgerError> {
        student::Entity::find_by_id(student_id)
            .one(&*self.db)
            .await
            .map_err(store_err("get student"))?
            .map(Student::from)
            .ok_or_else(|| LedgerError::not_found("student", student_id))
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, LedgerError> {
        let rows = student::Entity::find()
            .order_by_asc(student::Column::LastName)
            .order_by_asc(student::Column::FirstName)
            .all(&*self.db)
            .await
            .map_err(store_err("list students"))?;

        Ok(rows.into_iter().map(Student::from).collect())
    }
}
