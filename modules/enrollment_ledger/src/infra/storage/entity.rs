//! SeaORM entities for database tables

/// Class (cohort) table entity
pub mod class {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "classes")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,

        pub name: String,

        /// morning / afternoon / evening
        pub shift: String,

        pub start_date: Date,

        pub end_date: Date,

        /// Seat count fixed at creation
        pub capacity: i32,

        /// Mutated only inside enrollment transactions
        pub seats_available: i32,

        pub created_at: DateTimeUtc,

        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::enrollment::Entity")]
        Enrollments,
        #[sea_orm(has_many = "super::attendance_record::Entity")]
        AttendanceRecords,
    }

    impl Related<super::enrollment::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Enrollments.def()
        }
    }

    impl Related<super::attendance_record::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::AttendanceRecords.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Student table entity
pub mod student {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "students")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,

        pub first_name: String,

        pub last_name: String,

        #[sea_orm(unique)]
        pub email: String,

        pub phone: Option<String>,

        pub created_at: DateTimeUtc,

        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::enrollment::Entity")]
        Enrollments,
    }

    impl Related<super::enrollment::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Enrollments.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Enrollment join table entity
pub mod enrollment {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "enrollments")]
    pub struct Model {
        /// Student ID (part of composite primary key)
        #[sea_orm(primary_key, auto_increment = false)]
        pub student_id: i32,

        /// Class ID (part of composite primary key)
        #[sea_orm(primary_key, auto_increment = false)]
        pub class_id: i32,

        /// active / cancelled
        pub status: String,

        pub enrolled_at: DateTimeUtc,

        pub updated_at: DateTimeUtc,

        pub cancelled_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::student::Entity",
            from = "Column::StudentId",
            to = "super::student::Column::Id"
        )]
        Student,
        #[sea_orm(
            belongs_to = "super::class::Entity",
            from = "Column::ClassId",
            to = "super::class::Column::Id"
        )]
        Class,
    }

    impl Related<super::student::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Student.def()
        }
    }

    impl Related<super::class::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Class.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Attendance table entity
pub mod attendance_record {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "attendance_records")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,

        pub student_id: i32,

        pub class_id: i32,

        /// Unique together with student_id and class_id
        pub date: Date,

        /// present / absent / justified
        pub status: String,

        pub notes: Option<String>,

        pub created_at: DateTimeUtc,

        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::class::Entity",
            from = "Column::ClassId",
            to = "super::class::Column::Id"
        )]
        Class,
    }

    impl Related<super::class::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Class.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Append-only audit trail table entity
pub mod audit_log {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "audit_logs")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,

        /// Null for system actions
        pub actor_id: Option<i32>,

        pub action: String,

        pub entity_type: String,

        pub entity_id: Option<String>,

        pub before_state: Option<Json>,

        pub after_state: Option<Json>,

        pub origin_address: Option<String>,

        pub origin_agent: Option<String>,

        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
