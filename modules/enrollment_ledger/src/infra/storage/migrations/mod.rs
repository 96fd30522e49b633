//! Database migrations for the enrollment ledger

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240501_000001_create_catalog::Migration),
            Box::new(m20240501_000002_create_enrollments::Migration),
            Box::new(m20240501_000003_create_attendance_records::Migration),
            Box::new(m20240501_000004_create_audit_logs::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Classes {
    Table,
    Id,
    Name,
    Shift,
    StartDate,
    EndDate,
    Capacity,
    SeatsAvailable,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    CreatedAt,
    UpdatedAt,
}

fn timestamp_now(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

mod m20240501_000001_create_catalog {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000001_create_catalog"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Classes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Classes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Classes::Name).string().not_null())
                        .col(ColumnDef::new(Classes::Shift).string_len(16).not_null())
                        .col(ColumnDef::new(Classes::StartDate).date().not_null())
                        .col(ColumnDef::new(Classes::EndDate).date().not_null())
                        .col(ColumnDef::new(Classes::Capacity).integer().not_null())
                        .col(
                            ColumnDef::new(Classes::SeatsAvailable)
                                .integer()
                                .not_null()
                                .check(Expr::col(Classes::SeatsAvailable).gte(0)),
                        )
                        .col(timestamp_now(Classes::CreatedAt))
                        .col(timestamp_now(Classes::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Students::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Students::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Students::FirstName).string().not_null())
                        .col(ColumnDef::new(Students::LastName).string().not_null())
                        .col(
                            ColumnDef::new(Students::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Students::Phone).string())
                        .col(timestamp_now(Students::CreatedAt))
                        .col(timestamp_now(Students::UpdatedAt))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Students::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Classes::Table).to_owned())
                .await
        }
    }
}

mod m20240501_000002_create_enrollments {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000002_create_enrollments"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Enrollments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Enrollments::StudentId).integer().not_null())
                        .col(ColumnDef::new(Enrollments::ClassId).integer().not_null())
                        .col(ColumnDef::new(Enrollments::Status).string_len(16).not_null())
                        .col(timestamp_now(Enrollments::EnrolledAt))
                        .col(timestamp_now(Enrollments::UpdatedAt))
                        .col(ColumnDef::new(Enrollments::CancelledAt).timestamp_with_time_zone())
                        // One row per (student, class); re-enrollment needs a hard delete first
                        .primary_key(
                            Index::create()
                                .col(Enrollments::StudentId)
                                .col(Enrollments::ClassId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_enrollments_student")
                                .from(Enrollments::Table, Enrollments::StudentId)
                                .to(Students::Table, Students::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_enrollments_class")
                                .from(Enrollments::Table, Enrollments::ClassId)
                                .to(Classes::Table, Classes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_enrollments_class_status")
                        .table(Enrollments::Table)
                        .col(Enrollments::ClassId)
                        .col(Enrollments::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Enrollments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Enrollments {
        Table,
        StudentId,
        ClassId,
        Status,
        EnrolledAt,
        UpdatedAt,
        CancelledAt,
    }
}

mod m20240501_000003_create_attendance_records {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000003_create_attendance_records"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AttendanceRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AttendanceRecords::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(AttendanceRecords::StudentId).integer().not_null())
                        .col(ColumnDef::new(AttendanceRecords::ClassId).integer().not_null())
                        .col(ColumnDef::new(AttendanceRecords::Date).date().not_null())
                        .col(
                            ColumnDef::new(AttendanceRecords::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(AttendanceRecords::Notes).text())
                        .col(timestamp_now(AttendanceRecords::CreatedAt))
                        .col(timestamp_now(AttendanceRecords::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_attendance_records_student")
                                .from(AttendanceRecords::Table, AttendanceRecords::StudentId)
                                .to(Students::Table, Students::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_attendance_records_class")
                                .from(AttendanceRecords::Table, AttendanceRecords::ClassId)
                                .to(Classes::Table, Classes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Final arbiter against concurrent duplicate inserts
            manager
                .create_index(
                    Index::create()
                        .name("uq_attendance_student_class_date")
                        .table(AttendanceRecords::Table)
                        .col(AttendanceRecords::StudentId)
                        .col(AttendanceRecords::ClassId)
                        .col(AttendanceRecords::Date)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_attendance_class_date")
                        .table(AttendanceRecords::Table)
                        .col(AttendanceRecords::ClassId)
                        .col(AttendanceRecords::Date)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AttendanceRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AttendanceRecords {
        Table,
        Id,
        StudentId,
        ClassId,
        Date,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240501_000004_create_audit_logs {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000004_create_audit_logs"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AuditLogs::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(AuditLogs::ActorId).integer())
                        .col(ColumnDef::new(AuditLogs::Action).string_len(16).not_null())
                        .col(ColumnDef::new(AuditLogs::EntityType).string().not_null())
                        .col(ColumnDef::new(AuditLogs::EntityId).string())
                        .col(ColumnDef::new(AuditLogs::BeforeState).json())
                        .col(ColumnDef::new(AuditLogs::AfterState).json())
                        .col(ColumnDef::new(AuditLogs::OriginAddress).string())
                        .col(ColumnDef::new(AuditLogs::OriginAgent).text())
                        .col(timestamp_now(AuditLogs::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_audit_logs_entity")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::EntityType)
                        .col(AuditLogs::EntityId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_audit_logs_actor_id")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::ActorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_audit_logs_created_at")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::CreatedAt)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AuditLogs {
        Table,
        Id,
        ActorId,
        Action,
        EntityType,
        EntityId,
        BeforeState,
        AfterState,
        OriginAddress,
        OriginAgent,
        CreatedAt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn migration_versions_are_distinct() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        assert_eq!(
            names,
            [
                "m20240501_000001_create_catalog",
                "m20240501_000002_create_enrollments",
                "m20240501_000003_create_attendance_records",
                "m20240501_000004_create_audit_logs",
            ]
        );
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), names.len());
    }
}
