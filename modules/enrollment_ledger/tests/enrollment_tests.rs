//! Seat ledger tests: capacity accounting across create/cancel/delete/transfer

use enrollment_ledger::contract::{EnrollmentStatus, LedgerError};
use enrollment_ledger::domain::Services;
use std::sync::Arc;

mod common;
use common::{
    create_class, create_student, create_students, print_test_header, setup_pooled_services,
    setup_services,
};

#[tokio::test]
async fn test_capacity_one_class_fills_then_frees() {
    print_test_header(
        "test_capacity_one_class_fills_then_frees",
        &["A single-seat class admits one student, rejects the next, and reopens on cancel."],
    );
    let services = setup_services().await;
    let class = create_class(&services, "Welding A", 1).await;
    let s1 = create_student(&services, "ana").await;
    let s2 = create_student(&services, "bruno").await;

    println!("\n📝 Stage 1: First enrollment takes the only seat");
    let enrollment = services
        .enrollments
        .create(s1.id, class.id, None)
        .await
        .expect("first enrollment succeeds");
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    let ledger = services.enrollments.seat_ledger(class.id).await.unwrap();
    assert_eq!(ledger.seats_available, 0);

    println!("\n📝 Stage 2: Second enrollment is rejected");
    let err = services
        .enrollments
        .create(s2.id, class.id, None)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::CapacityExceeded { class_id: class.id });
    let ledger = services.enrollments.seat_ledger(class.id).await.unwrap();
    assert_eq!(ledger.seats_available, 0);
    assert!(services.enrollments.get(s2.id, class.id).await.is_err());

    println!("\n📝 Stage 3: Cancel frees the seat for the second student");
    let cancelled = services.enrollments.cancel(s1.id, class.id).await.unwrap();
    assert_eq!(cancelled.status, EnrollmentStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(
        services.enrollments.seat_ledger(class.id).await.unwrap().seats_available,
        1
    );

    services
        .enrollments
        .create(s2.id, class.id, None)
        .await
        .expect("seat is free again");
    let ledger = services.enrollments.seat_ledger(class.id).await.unwrap();
    assert_eq!(ledger.seats_available, 0);
    assert!(ledger.is_balanced());
}

#[tokio::test]
async fn test_concurrent_enrollments_never_oversell() {
    print_test_header(
        "test_concurrent_enrollments_never_oversell",
        &["Ten concurrent enrollments into a three-seat class: exactly three succeed."],
    );
    let services = setup_services().await;
    enroll_ten_into_three_seats(&services).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enrollments_on_pooled_store() {
    print_test_header(
        "test_concurrent_enrollments_on_pooled_store",
        &[
            "Same race against an on-disk database with eight pooled connections.",
            "Losers must see CapacityExceeded, never a store error.",
        ],
    );
    let (_dir, services) = setup_pooled_services(8).await;
    enroll_ten_into_three_seats(&services).await;
}

async fn enroll_ten_into_three_seats(services: &Arc<Services>) {
    let class = create_class(services, "Electrical B", 3).await;
    let students = create_students(services, 10).await;

    let handles: Vec<_> = students
        .iter()
        .map(|student| {
            let services = services.clone();
            let (student_id, class_id) = (student.id, class.id);
            tokio::spawn(async move { services.enrollments.create(student_id, class_id, None).await })
        })
        .collect();

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => admitted += 1,
            Err(LedgerError::CapacityExceeded { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    println!("   admitted={admitted} rejected={rejected}");

    assert_eq!(admitted, 3);
    assert_eq!(rejected, 7);
    let ledger = services.enrollments.seat_ledger(class.id).await.unwrap();
    assert_eq!(ledger.seats_available, 0);
    assert_eq!(ledger.active_enrollments, 3);
    assert!(ledger.is_balanced());
}

#[tokio::test]
async fn test_cancel_twice_is_invalid_state() {
    let services = setup_services().await;
    let class = create_class(&services, "Plumbing", 2).await;
    let student = create_student(&services, "carla").await;

    services.enrollments.create(student.id, class.id, None).await.unwrap();
    services.enrollments.cancel(student.id, class.id).await.unwrap();

    let err = services.enrollments.cancel(student.id, class.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState { .. }));

    // The second cancel must not release another seat
    let ledger = services.enrollments.seat_ledger(class.id).await.unwrap();
    assert_eq!(ledger.seats_available, 2);
    assert!(ledger.is_balanced());
}

#[tokio::test]
async fn test_cancel_missing_enrollment_is_not_found() {
    let services = setup_services().await;
    let class = create_class(&services, "Plumbing", 2).await;
    let student = create_student(&services, "dora").await;

    let err = services.enrollments.cancel(student.id, class.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_active_returns_seat_but_cancelled_does_not() {
    print_test_header(
        "test_delete_active_returns_seat_but_cancelled_does_not",
        &["Hard delete gives back a seat only when the removed row was active."],
    );
    let services = setup_services().await;
    let class = create_class(&services, "Carpentry", 2).await;
    let s1 = create_student(&services, "edu").await;
    let s2 = create_student(&services, "fabi").await;

    services.enrollments.create(s1.id, class.id, None).await.unwrap();
    services.enrollments.create(s2.id, class.id, None).await.unwrap();
    assert_eq!(
        services.enrollments.seat_ledger(class.id).await.unwrap().seats_available,
        0
    );

    println!("\n📝 Stage 1: Delete an active enrollment");
    services.enrollments.delete(s1.id, class.id).await.unwrap();
    assert_eq!(
        services.enrollments.seat_ledger(class.id).await.unwrap().seats_available,
        1
    );

    println!("\n📝 Stage 2: Cancel, then delete the cancelled row");
    services.enrollments.cancel(s2.id, class.id).await.unwrap();
    services.enrollments.delete(s2.id, class.id).await.unwrap();
    let ledger = services.enrollments.seat_ledger(class.id).await.unwrap();
    assert_eq!(ledger.seats_available, 2);
    assert_eq!(ledger.active_enrollments, 0);
    assert!(ledger.is_balanced());

    let err = services.enrollments.delete(s2.id, class.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

#[tokio::test]
async fn test_reenroll_after_cancel_requires_delete() {
    let services = setup_services().await;
    let class = create_class(&services, "Masonry", 3).await;
    let student = create_student(&services, "gabi").await;

    services.enrollments.create(student.id, class.id, None).await.unwrap();
    services.enrollments.cancel(student.id, class.id).await.unwrap();

    let err = services
        .enrollments
        .create(student.id, class.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict { .. }));

    services.enrollments.delete(student.id, class.id).await.unwrap();
    let enrollment = services
        .enrollments
        .create(student.id, class.id, None)
        .await
        .expect("enrolling again after delete");
    assert!(enrollment.is_active());
    assert!(services.enrollments.seat_ledger(class.id).await.unwrap().is_balanced());
}

#[tokio::test]
async fn test_duplicate_active_enrollment_is_conflict() {
    let services = setup_services().await;
    let class = create_class(&services, "Masonry", 3).await;
    let student = create_student(&services, "hugo").await;

    services.enrollments.create(student.id, class.id, None).await.unwrap();
    let err = services
        .enrollments
        .create(student.id, class.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict { .. }));
    assert_eq!(
        services.enrollments.seat_ledger(class.id).await.unwrap().seats_available,
        2
    );
}

#[tokio::test]
async fn test_create_rejects_unknown_refs_and_cancelled_status() {
    let services = setup_services().await;
    let class = create_class(&services, "Masonry", 3).await;
    let student = create_student(&services, "iris").await;

    let err = services.enrollments.create(9999, class.id, None).await.unwrap_err();
    assert_eq!(err, LedgerError::not_found("student", 9999));

    let err = services.enrollments.create(student.id, 9999, None).await.unwrap_err();
    assert_eq!(err, LedgerError::not_found("class", 9999));

    let err = services
        .enrollments
        .create(student.id, class.id, Some(EnrollmentStatus::Cancelled))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));

    assert_eq!(
        services.enrollments.seat_ledger(class.id).await.unwrap().seats_available,
        3
    );
}

#[tokio::test]
async fn test_transfer_moves_one_seat() {
    print_test_header(
        "test_transfer_moves_one_seat",
        &["A transfer cancels the source enrollment and activates the target in one step."],
    );
    let services = setup_services().await;
    let from = create_class(&services, "Morning cohort", 2).await;
    let to = create_class(&services, "Evening cohort", 1).await;
    let student = create_student(&services, "joao").await;

    services.enrollments.create(student.id, from.id, None).await.unwrap();
    let moved = services
        .enrollments
        .transfer(student.id, from.id, to.id)
        .await
        .expect("transfer succeeds");
    assert_eq!(moved.class_id, to.id);
    assert!(moved.is_active());

    let source = services.enrollments.get(student.id, from.id).await.unwrap();
    assert_eq!(source.status, EnrollmentStatus::Cancelled);

    let from_ledger = services.enrollments.seat_ledger(from.id).await.unwrap();
    let to_ledger = services.enrollments.seat_ledger(to.id).await.unwrap();
    assert_eq!(from_ledger.seats_available, 2);
    assert_eq!(to_ledger.seats_available, 0);
    assert!(from_ledger.is_balanced() && to_ledger.is_balanced());
}

#[tokio::test]
async fn test_failed_transfer_leaves_both_classes_untouched() {
    let services = setup_services().await;
    let from = create_class(&services, "Morning cohort", 2).await;
    let full = create_class(&services, "Full cohort", 1).await;
    let student = create_student(&services, "kai").await;
    let other = create_student(&services, "lia").await;

    services.enrollments.create(student.id, from.id, None).await.unwrap();
    services.enrollments.create(other.id, full.id, None).await.unwrap();

    let err = services
        .enrollments
        .transfer(student.id, from.id, full.id)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::CapacityExceeded { class_id: full.id });

    // Rolled back: the source enrollment is still active
    let source = services.enrollments.get(student.id, from.id).await.unwrap();
    assert!(source.is_active());
    assert_eq!(
        services.enrollments.seat_ledger(from.id).await.unwrap().seats_available,
        1
    );

    let err = services
        .enrollments
        .transfer(student.id, from.id, from.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));
}

#[tokio::test]
async fn test_listings_by_class_and_student() {
    let services = setup_services().await;
    let a = create_class(&services, "A", 5).await;
    let b = create_class(&services, "B", 5).await;
    let students = create_students(&services, 3).await;

    for s in &students {
        services.enrollments.create(s.id, a.id, None).await.unwrap();
    }
    services.enrollments.create(students[0].id, b.id, None).await.unwrap();
    services.enrollments.cancel(students[1].id, a.id).await.unwrap();

    let all = services.enrollments.list_by_class(a.id, None).await.unwrap();
    assert_eq!(all.len(), 3);
    let roster = services
        .enrollments
        .list_by_class(a.id, Some(EnrollmentStatus::Active))
        .await
        .unwrap();
    assert_eq!(roster.len(), 2);
    assert!(roster.iter().all(|e| e.is_active()));

    let of_first = services.enrollments.list_by_student(students[0].id).await.unwrap();
    assert_eq!(of_first.len(), 2);

    assert!(matches!(
        services.enrollments.list_by_class(424242, None).await,
        Err(LedgerError::NotFound { .. })
    ));
    assert!(matches!(
        services.enrollments.list_by_student(424242).await,
        Err(LedgerError::NotFound { .. })
    ));
}
