//! Attendance tests: per-day uniqueness, roster checks and bulk atomicity

use enrollment_ledger::contract::{AttendanceEntry, AttendanceStatus, LedgerError};

mod common;
use common::{
    create_class, create_student, create_students, date, print_test_header,
    setup_pooled_services, setup_services,
};

#[tokio::test]
async fn test_second_record_for_same_day_conflicts() {
    print_test_header(
        "test_second_record_for_same_day_conflicts",
        &[
            "Recording Present then Absent for the same student, class and day.",
            "The second call is a conflict and the first record stays unchanged.",
        ],
    );
    let services = setup_services().await;
    let class = create_class(&services, "Welding A", 10).await;
    let student = create_student(&services, "ana").await;
    services.enrollments.create(student.id, class.id, None).await.unwrap();
    let day = date(2024, 5, 1);

    println!("\n📝 Stage 1: Record Present");
    let first = services
        .attendance
        .record_one(student.id, class.id, day, AttendanceStatus::Present, None)
        .await
        .expect("first record succeeds");

    println!("\n📝 Stage 2: Record Absent for the same day");
    let err = services
        .attendance
        .record_one(student.id, class.id, day, AttendanceStatus::Absent, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict { .. }));

    let stored = services.attendance.get(first.id).await.unwrap();
    assert_eq!(stored.status, AttendanceStatus::Present);
    let day_records = services
        .attendance
        .list_for_class(class.id, Some(day))
        .await
        .unwrap();
    assert_eq!(day_records.len(), 1);
}

#[tokio::test]
async fn test_record_requires_active_enrollment() {
    let services = setup_services().await;
    let class = create_class(&services, "Welding A", 10).await;
    let outsider = create_student(&services, "bruno").await;
    let former = create_student(&services, "carla").await;
    services.enrollments.create(former.id, class.id, None).await.unwrap();
    services.enrollments.cancel(former.id, class.id).await.unwrap();
    let day = date(2024, 5, 2);

    for student_id in [outsider.id, former.id] {
        let err = services
            .attendance
            .record_one(student_id, class.id, day, AttendanceStatus::Present, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }

    let err = services
        .attendance
        .record_one(outsider.id, 9999, day, AttendanceStatus::Present, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

#[tokio::test]
async fn test_record_outside_class_dates_is_rejected() {
    let services = setup_services().await;
    let class = create_class(&services, "Welding A", 10).await;
    let student = create_student(&services, "dora").await;
    services.enrollments.create(student.id, class.id, None).await.unwrap();

    let err = services
        .attendance
        .record_one(student.id, class.id, date(2024, 7, 1), AttendanceStatus::Present, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));
}

#[tokio::test]
async fn test_bulk_is_all_or_nothing() {
    print_test_header(
        "test_bulk_is_all_or_nothing",
        &["Five entries where the fourth student is not enrolled: nothing is stored."],
    );
    let services = setup_services().await;
    let class = create_class(&services, "Electrical B", 10).await;
    let students = create_students(&services, 5).await;
    for (i, s) in students.iter().enumerate() {
        if i != 3 {
            services.enrollments.create(s.id, class.id, None).await.unwrap();
        }
    }
    let day = date(2024, 5, 6);

    let entries: Vec<AttendanceEntry> = students
        .iter()
        .map(|s| AttendanceEntry {
            student_id: s.id,
            status: AttendanceStatus::Present,
            notes: None,
        })
        .collect();

    let err = services
        .attendance
        .record_bulk(class.id, day, entries)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));

    let stored = services
        .attendance
        .list_for_class(class.id, Some(day))
        .await
        .unwrap();
    assert!(stored.is_empty(), "no record may survive a failed batch");
}

#[tokio::test]
async fn test_bulk_records_whole_day_and_reports() {
    let services = setup_services().await;
    let class = create_class(&services, "Electrical B", 10).await;
    let students = create_students(&services, 4).await;
    for s in &students {
        services.enrollments.create(s.id, class.id, None).await.unwrap();
    }
    let day = date(2024, 5, 7);

    let statuses = [
        AttendanceStatus::Present,
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
    ];
    let entries = students
        .iter()
        .zip(statuses)
        .map(|(s, status)| AttendanceEntry {
            student_id: s.id,
            status,
            notes: None,
        })
        .collect();

    let records = services
        .attendance
        .record_bulk(class.id, day, entries)
        .await
        .expect("bulk succeeds");
    assert_eq!(records.len(), 3);

    let report = services.attendance.class_report(class.id, day).await.unwrap();
    assert_eq!(report.present, 2);
    assert_eq!(report.absent, 1);
    assert_eq!(report.justified, 0);
    assert_eq!(report.total_students, 4);

    let other_day = services
        .attendance
        .class_report(class.id, date(2024, 5, 8))
        .await
        .unwrap();
    assert_eq!(other_day.present + other_day.absent + other_day.justified, 0);
}

#[tokio::test]
async fn test_bulk_rejects_empty_and_duplicate_entries() {
    let services = setup_services().await;
    let class = create_class(&services, "Electrical B", 10).await;
    let student = create_student(&services, "eva").await;
    services.enrollments.create(student.id, class.id, None).await.unwrap();
    let day = date(2024, 5, 9);

    let err = services
        .attendance
        .record_bulk(class.id, day, Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));

    let entry = AttendanceEntry {
        student_id: student.id,
        status: AttendanceStatus::Present,
        notes: None,
    };
    let err = services
        .attendance
        .record_bulk(class.id, day, vec![entry.clone(), entry])
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict { .. }));
}

#[tokio::test]
async fn test_update_and_delete_record() {
    let services = setup_services().await;
    let class = create_class(&services, "Welding A", 10).await;
    let student = create_student(&services, "fabio").await;
    services.enrollments.create(student.id, class.id, None).await.unwrap();

    let record = services
        .attendance
        .record_one(student.id, class.id, date(2024, 5, 10), AttendanceStatus::Absent, None)
        .await
        .unwrap();

    let updated = services
        .attendance
        .update(
            record.id,
            AttendanceStatus::Justified,
            Some("medical certificate".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, AttendanceStatus::Justified);
    assert_eq!(updated.notes.as_deref(), Some("medical certificate"));
    assert_eq!(updated.date, record.date);

    let err = services
        .attendance
        .update(9999, AttendanceStatus::Present, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));

    services.attendance.delete(record.id).await.unwrap();
    assert!(matches!(
        services.attendance.get(record.id).await,
        Err(LedgerError::NotFound { .. })
    ));
    assert!(matches!(
        services.attendance.delete(record.id).await,
        Err(LedgerError::NotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_records_for_same_day_store_one() {
    print_test_header(
        "test_racing_records_for_same_day_store_one",
        &[
            "Six concurrent records for one student-day on a pooled on-disk store.",
            "The unique index admits one; every other writer gets a conflict.",
        ],
    );
    let (_dir, services) = setup_pooled_services(6).await;
    let class = create_class(&services, "Welding A", 5).await;
    let student = create_student(&services, "ana").await;
    services.enrollments.create(student.id, class.id, None).await.unwrap();
    let day = date(2024, 5, 6);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let services = services.clone();
            let (student_id, class_id) = (student.id, class.id);
            tokio::spawn(async move {
                services
                    .attendance
                    .record_one(student_id, class_id, day, AttendanceStatus::Present, None)
                    .await
            })
        })
        .collect();

    let mut stored = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => stored += 1,
            Err(LedgerError::Conflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(stored, 1);
    assert_eq!(conflicts, 5);
    let records = services
        .attendance
        .list_for_class(class.id, Some(day))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}
