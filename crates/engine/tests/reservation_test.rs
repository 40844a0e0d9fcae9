mod test_utils;

use courtside_core::{
    BookingError, ErrorKind,
    models::{
        reservation::{ReservationStatus, ResourceClaim},
        resource::ResourceKind,
    },
};
use pretty_assertions::assert_eq;
use test_utils::*;

fn quantities(claims: &[ResourceClaim], kind: ResourceKind) -> Vec<(i64, u32)> {
    claims
        .iter()
        .filter(|claim| claim.kind == kind)
        .map(|claim| (claim.resource_id, claim.quantity))
        .collect()
}

#[test_log::test(tokio::test)]
async fn booking_confirms_and_records_one_claim_per_resource() {
    let ctx = TestContext::new().await;
    let request = ctx
        .outdoor_booking(monday(), hours(10, 11))
        .with_equipment(ctx.rackets.id, 2)
        .with_coach(ctx.coach.id);

    let receipt = ctx
        .engine
        .create_reservation(&ctx.member, &request)
        .await
        .unwrap();
    let reservation = &receipt.reservation;

    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert_eq!(reservation.owner_id, ctx.member.id);
    assert_eq!(reservation.total_price, dec("145.00"));
    assert_eq!(receipt.price_breakdown.total, reservation.total_price);
    assert_eq!(receipt.message, "Reservation confirmed");

    assert_eq!(quantities(&reservation.claims, ResourceKind::Court), vec![(ctx.outdoor.id, 1)]);
    assert_eq!(quantities(&reservation.claims, ResourceKind::Equipment), vec![(ctx.rackets.id, 2)]);
    assert_eq!(quantities(&reservation.claims, ResourceKind::Coach), vec![(ctx.coach.id, 1)]);
}

#[tokio::test]
async fn booking_today_is_allowed_but_yesterday_is_not() {
    let ctx = TestContext::new().await;

    let today_request = ctx.outdoor_booking(today(), hours(15, 16));
    assert!(ctx.engine.create_reservation(&ctx.member, &today_request).await.is_ok());

    let yesterday = today().pred_opt().unwrap();
    let error = ctx
        .engine
        .create_reservation(&ctx.member, &ctx.outdoor_booking(yesterday, hours(15, 16)))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn zero_quantity_equipment_is_rejected() {
    let ctx = TestContext::new().await;
    let request = ctx
        .outdoor_booking(monday(), hours(10, 11))
        .with_equipment(ctx.rackets.id, 0);

    let error = ctx
        .engine
        .create_reservation(&ctx.member, &request)
        .await
        .unwrap_err();
    assert!(matches!(error, BookingError::Validation(_)));
}

#[tokio::test]
async fn overflowing_duplicate_lines_are_rejected_before_booking_or_pricing() {
    let ctx = TestContext::new().await;
    let request = ctx
        .outdoor_booking(monday(), hours(10, 11))
        .with_equipment(ctx.rackets.id, u32::MAX)
        .with_equipment(ctx.rackets.id, 2);

    let error = ctx
        .engine
        .create_reservation(&ctx.member, &request)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);

    let error = ctx.engine.calculate_booking_price(&request).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);

    let listed = ctx
        .engine
        .list_reservations(&ctx.member, None, None)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn unknown_or_inactive_court_is_not_found() {
    let ctx = TestContext::new().await;

    let missing = courtside_core::models::reservation::BookingRequest::court(monday(), hours(10, 11), 9_999);
    let error = ctx.engine.create_reservation(&ctx.member, &missing).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);

    ctx.store
        .set_active(ResourceKind::Court, ctx.indoor.id, false)
        .await
        .unwrap();
    let error = ctx
        .engine
        .create_reservation(&ctx.member, &ctx.indoor_booking(monday(), hours(10, 11)))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn overlapping_court_booking_conflicts_but_touching_one_succeeds() {
    let ctx = TestContext::new().await;
    ctx.engine
        .create_reservation(&ctx.member, &ctx.indoor_booking(monday(), hours(10, 12)))
        .await
        .unwrap();

    let overlapping = ctx.indoor_booking(monday(), window(at(11, 30), at(12, 30)));
    let error = ctx
        .engine
        .create_reservation(&ctx.other_member, &overlapping)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert!(error.is_retryable());

    let touching = ctx.indoor_booking(monday(), hours(12, 13));
    assert!(ctx.engine.create_reservation(&ctx.other_member, &touching).await.is_ok());

    let other_court = ctx.outdoor_booking(monday(), hours(10, 12));
    assert!(ctx.engine.create_reservation(&ctx.other_member, &other_court).await.is_ok());
}

#[tokio::test]
async fn equipment_stock_is_never_overbooked() {
    let ctx = TestContext::new().await;

    let all_five = ctx
        .indoor_booking(monday(), hours(10, 11))
        .with_equipment(ctx.rackets.id, 5);
    ctx.engine.create_reservation(&ctx.member, &all_five).await.unwrap();

    let overlapping = ctx
        .outdoor_booking(monday(), window(at(10, 30), at(11, 30)))
        .with_equipment(ctx.rackets.id, 1);
    let error = ctx
        .engine
        .create_reservation(&ctx.other_member, &overlapping)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);

    let later = ctx
        .outdoor_booking(monday(), hours(11, 12))
        .with_equipment(ctx.rackets.id, 1);
    assert!(ctx.engine.create_reservation(&ctx.other_member, &later).await.is_ok());
}

#[tokio::test]
async fn requesting_more_than_total_stock_conflicts() {
    let ctx = TestContext::new().await;
    let request = ctx
        .outdoor_booking(monday(), hours(10, 11))
        .with_equipment(ctx.rackets.id, 6);

    let error = ctx
        .engine
        .create_reservation(&ctx.member, &request)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn duplicate_equipment_lines_are_checked_as_one() {
    let ctx = TestContext::new().await;

    let too_many = ctx
        .outdoor_booking(monday(), hours(10, 11))
        .with_equipment(ctx.rackets.id, 3)
        .with_equipment(ctx.rackets.id, 3);
    let error = ctx
        .engine
        .create_reservation(&ctx.member, &too_many)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);

    let split = ctx
        .outdoor_booking(monday(), hours(10, 11))
        .with_equipment(ctx.rackets.id, 2)
        .with_equipment(ctx.rackets.id, 2);
    let receipt = ctx.engine.create_reservation(&ctx.member, &split).await.unwrap();
    assert_eq!(
        quantities(&receipt.reservation.claims, ResourceKind::Equipment),
        vec![(ctx.rackets.id, 4)]
    );
}

#[tokio::test]
async fn coach_must_be_on_duty_for_the_whole_session() {
    let ctx = TestContext::new().await;
    ctx.store
        .add_coach_window(ctx.coach.id, monday(), hours(8, 12))
        .await
        .unwrap();

    let contained = ctx
        .indoor_booking(monday(), hours(9, 10))
        .with_coach(ctx.coach.id);
    assert!(ctx.engine.create_reservation(&ctx.member, &contained).await.is_ok());

    let straddling = ctx
        .indoor_booking(monday(), window(at(11, 30), at(12, 30)))
        .with_coach(ctx.coach.id);
    let error = ctx
        .engine
        .create_reservation(&ctx.member, &straddling)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn failed_booking_leaves_no_partial_claims() {
    let ctx = TestContext::new().await;
    let request = ctx
        .indoor_booking(monday(), hours(10, 11))
        .with_equipment(ctx.rackets.id, 2)
        .with_equipment(9_999, 1);

    let error = ctx
        .engine
        .create_reservation(&ctx.member, &request)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);

    assert!(ctx.engine.court_available(ctx.indoor.id, monday(), hours(10, 11)).await.unwrap());
    assert!(ctx
        .engine
        .equipment_available(ctx.rackets.id, 5, monday(), hours(10, 11))
        .await
        .unwrap());
    assert!(ctx
        .engine
        .list_reservations(&ctx.staff, None, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn inactive_coach_is_not_found_at_commit() {
    let ctx = TestContext::new().await;
    ctx.store
        .set_active(ResourceKind::Coach, ctx.coach.id, false)
        .await
        .unwrap();

    let request = ctx
        .indoor_booking(monday(), hours(10, 11))
        .with_coach(ctx.coach.id);
    let error = ctx
        .engine
        .create_reservation(&ctx.member, &request)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_of_one_court_confirm_exactly_once() {
    let ctx = TestContext::new().await;

    let mut handles = Vec::new();
    for caller in [ctx.member, ctx.other_member, ctx.staff] {
        let engine = ctx.engine.clone();
        let request = ctx.indoor_booking(saturday(), hours(17, 19));
        handles.push(tokio::spawn(async move {
            engine.create_reservation(&caller, &request).await
        }));
    }

    let mut confirmed = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(error) => {
                assert_eq!(error.kind(), ErrorKind::Conflict);
                conflicts += 1;
            }
        }
    }
    assert_eq!((confirmed, conflicts), (1, 2));

    let stored = ctx
        .engine
        .list_reservations(&ctx.staff, None, Some(ReservationStatus::Confirmed))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn cancelling_frees_the_exact_window() {
    let ctx = TestContext::new().await;
    let request = ctx
        .indoor_booking(monday(), hours(10, 12))
        .with_equipment(ctx.rackets.id, 5)
        .with_coach(ctx.coach.id);
    let receipt = ctx.engine.create_reservation(&ctx.member, &request).await.unwrap();

    assert!(!ctx.engine.court_available(ctx.indoor.id, monday(), hours(10, 12)).await.unwrap());

    let cancelled = ctx
        .engine
        .cancel_reservation(&ctx.member, receipt.reservation.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);

    assert!(ctx.engine.court_available(ctx.indoor.id, monday(), hours(10, 12)).await.unwrap());
    assert!(ctx.engine.coach_available(ctx.coach.id, monday(), hours(10, 12)).await.unwrap());
    assert!(ctx
        .engine
        .equipment_available(ctx.rackets.id, 5, monday(), hours(10, 12))
        .await
        .unwrap());

    // The same slot can be booked again.
    assert!(ctx.engine.create_reservation(&ctx.other_member, &request).await.is_ok());
}

#[tokio::test]
async fn cancelling_twice_is_a_conflict() {
    let ctx = TestContext::new().await;
    let receipt = ctx
        .engine
        .create_reservation(&ctx.member, &ctx.indoor_booking(monday(), hours(10, 11)))
        .await
        .unwrap();

    ctx.engine
        .cancel_reservation(&ctx.member, receipt.reservation.id)
        .await
        .unwrap();
    let error = ctx
        .engine
        .cancel_reservation(&ctx.member, receipt.reservation.id)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert_eq!(error.to_string(), "Conflict: Reservation is already cancelled");
}

#[tokio::test]
async fn started_reservations_cannot_be_cancelled() {
    let ctx = TestContext::new().await;
    // Today 08:00 has already started at the fixed "now" of 09:00.
    let receipt = ctx
        .engine
        .create_reservation(&ctx.member, &ctx.indoor_booking(today(), hours(8, 9)))
        .await
        .unwrap();

    let error = ctx
        .engine
        .cancel_reservation(&ctx.member, receipt.reservation.id)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert_eq!(error.to_string(), "Conflict: Cannot cancel past reservations");
}

#[tokio::test]
async fn only_the_owner_or_staff_may_cancel() {
    let ctx = TestContext::new().await;
    let receipt = ctx
        .engine
        .create_reservation(&ctx.member, &ctx.indoor_booking(monday(), hours(10, 11)))
        .await
        .unwrap();

    let error = ctx
        .engine
        .cancel_reservation(&ctx.other_member, receipt.reservation.id)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Forbidden);

    let cancelled = ctx
        .engine
        .cancel_reservation(&ctx.staff, receipt.reservation.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
}

#[tokio::test]
async fn cancelling_an_unknown_reservation_is_not_found() {
    let ctx = TestContext::new().await;
    let error = ctx
        .engine
        .cancel_reservation(&ctx.staff, 424_242)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn listings_are_scoped_filtered_and_newest_first() {
    let ctx = TestContext::new().await;
    let early = ctx
        .engine
        .create_reservation(&ctx.member, &ctx.indoor_booking(monday(), hours(9, 10)))
        .await
        .unwrap()
        .reservation;
    let late = ctx
        .engine
        .create_reservation(&ctx.member, &ctx.indoor_booking(monday(), hours(15, 16)))
        .await
        .unwrap()
        .reservation;
    let weekend = ctx
        .engine
        .create_reservation(&ctx.member, &ctx.indoor_booking(saturday(), hours(9, 10)))
        .await
        .unwrap()
        .reservation;
    let foreign = ctx
        .engine
        .create_reservation(&ctx.other_member, &ctx.outdoor_booking(monday(), hours(9, 10)))
        .await
        .unwrap()
        .reservation;
    ctx.engine.cancel_reservation(&ctx.member, early.id).await.unwrap();

    // A member asking for someone else's bookings still only sees their own.
    let own: Vec<i64> = ctx
        .engine
        .list_reservations(&ctx.member, Some(ctx.other_member.id), None)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(own, vec![late.id, early.id, weekend.id]);

    let confirmed: Vec<i64> = ctx
        .engine
        .list_reservations(&ctx.member, None, Some(ReservationStatus::Confirmed))
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(confirmed, vec![late.id, weekend.id]);

    let everyone = ctx
        .engine
        .list_reservations(&ctx.staff, None, None)
        .await
        .unwrap();
    assert_eq!(everyone.len(), 4);

    let theirs = ctx
        .engine
        .list_reservations(&ctx.staff, Some(ctx.other_member.id), None)
        .await
        .unwrap();
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].id, foreign.id);
    assert_eq!(theirs[0].claims.len(), 1);
}
