mod test_utils;

use courtside_core::models::resource::ResourceKind;
use pretty_assertions::assert_eq;
use rstest::rstest;
use test_utils::*;

#[tokio::test]
async fn courts_are_free_until_booked() {
    let ctx = TestContext::new().await;
    assert!(ctx.engine.court_available(ctx.indoor.id, monday(), hours(10, 12)).await.unwrap());

    ctx.engine
        .create_reservation(&ctx.member, &ctx.indoor_booking(monday(), hours(10, 12)))
        .await
        .unwrap();

    assert!(!ctx.engine.court_available(ctx.indoor.id, monday(), hours(11, 13)).await.unwrap());
    assert!(ctx.engine.court_available(ctx.indoor.id, monday(), hours(12, 13)).await.unwrap());
    assert!(ctx.engine.court_available(ctx.indoor.id, saturday(), hours(10, 12)).await.unwrap());
}

#[tokio::test]
async fn missing_and_inactive_resources_are_unavailable() {
    let ctx = TestContext::new().await;
    assert!(!ctx.engine.court_available(9_999, monday(), hours(10, 11)).await.unwrap());
    assert!(!ctx.engine.coach_available(9_999, monday(), hours(10, 11)).await.unwrap());
    assert!(!ctx
        .engine
        .equipment_available(9_999, 1, monday(), hours(10, 11))
        .await
        .unwrap());

    ctx.store
        .set_active(ResourceKind::Equipment, ctx.rackets.id, false)
        .await
        .unwrap();
    assert!(!ctx
        .engine
        .equipment_available(ctx.rackets.id, 1, monday(), hours(10, 11))
        .await
        .unwrap());
    let listed = ctx
        .engine
        .equipment_availability(monday(), hours(10, 11))
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[rstest]
#[case(5, 6, false)]
#[case(6, 7, true)]
#[case(21, 22, true)]
#[case(21, 23, false)]
#[tokio::test]
async fn coaches_without_rows_work_the_default_day(
    #[case] start: u32,
    #[case] end: u32,
    #[case] expected: bool,
) {
    let ctx = TestContext::new().await;
    let available = ctx
        .engine
        .coach_available(ctx.coach.id, monday(), hours(start, end))
        .await
        .unwrap();
    assert_eq!(available, expected);
}

#[tokio::test]
async fn explicit_coach_rows_require_containment() {
    let ctx = TestContext::new().await;
    ctx.store
        .add_coach_window(ctx.coach.id, monday(), hours(8, 12))
        .await
        .unwrap();
    ctx.store
        .add_coach_window(ctx.coach.id, monday(), hours(14, 16))
        .await
        .unwrap();

    let check = |slot| ctx.engine.coach_available(ctx.coach.id, monday(), slot);
    assert!(check(hours(9, 10)).await.unwrap());
    assert!(check(hours(14, 16)).await.unwrap());
    assert!(!check(window(at(11, 30), at(12, 30))).await.unwrap());
    assert!(!check(hours(11, 15)).await.unwrap());
    // Rows replace the default day: 18:00 falls outside both.
    assert!(!check(hours(18, 19)).await.unwrap());
    // Other dates keep the default day.
    assert!(ctx
        .engine
        .coach_available(ctx.coach.id, saturday(), hours(18, 19))
        .await
        .unwrap());
}

#[tokio::test]
async fn equipment_counts_overlapping_claims_against_total_stock() {
    let ctx = TestContext::new().await;
    ctx.engine
        .create_reservation(
            &ctx.member,
            &ctx.indoor_booking(monday(), hours(10, 11))
                .with_equipment(ctx.rackets.id, 3),
        )
        .await
        .unwrap();

    let engine = &ctx.engine;
    assert!(engine.equipment_available(ctx.rackets.id, 2, monday(), hours(10, 11)).await.unwrap());
    assert!(!engine.equipment_available(ctx.rackets.id, 3, monday(), hours(10, 11)).await.unwrap());
    assert!(engine.equipment_available(ctx.rackets.id, 5, monday(), hours(11, 12)).await.unwrap());
    assert!(!engine.equipment_available(ctx.rackets.id, 6, monday(), hours(11, 12)).await.unwrap());

    let report = engine.equipment_availability(monday(), hours(10, 11)).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].available_quantity, 2);
    assert_eq!(report[0].total_quantity, 5);
}

#[tokio::test]
async fn display_counter_does_not_gate_availability() {
    let ctx = TestContext::new().await;
    let unit = ctx
        .store
        .set_equipment_stock(ctx.rackets.id, 4, 9)
        .await
        .unwrap();
    assert_eq!(unit.available_quantity, 4);

    ctx.store
        .set_equipment_stock(ctx.rackets.id, 4, 0)
        .await
        .unwrap();
    assert!(ctx
        .engine
        .equipment_available(ctx.rackets.id, 4, monday(), hours(10, 11))
        .await
        .unwrap());
}

#[tokio::test]
async fn batch_queries_skip_booked_resources() {
    let ctx = TestContext::new().await;
    ctx.engine
        .create_reservation(
            &ctx.member,
            &ctx.indoor_booking(monday(), hours(10, 11)).with_coach(ctx.coach.id),
        )
        .await
        .unwrap();

    let courts = ctx.engine.available_courts(monday(), hours(10, 11)).await.unwrap();
    assert_eq!(courts, vec![ctx.outdoor.clone()]);

    let courts = ctx.engine.available_courts(monday(), hours(11, 12)).await.unwrap();
    assert_eq!(courts.len(), 2);

    assert!(ctx
        .engine
        .available_coaches(monday(), hours(10, 11))
        .await
        .unwrap()
        .is_empty());

    let addons = ctx.engine.addon_availability(monday(), hours(11, 12)).await.unwrap();
    assert_eq!(addons.coaches, vec![ctx.coach.clone()]);
    assert_eq!(addons.equipment[0].available_quantity, 5);
}

#[tokio::test]
async fn cancelled_reservations_do_not_hold_capacity() {
    let ctx = TestContext::new().await;
    let receipt = ctx
        .engine
        .create_reservation(
            &ctx.member,
            &ctx.outdoor_booking(monday(), hours(10, 11)).with_equipment(ctx.rackets.id, 5),
        )
        .await
        .unwrap();
    ctx.engine
        .cancel_reservation(&ctx.member, receipt.reservation.id)
        .await
        .unwrap();

    let report = ctx
        .engine
        .equipment_availability(monday(), hours(10, 11))
        .await
        .unwrap();
    assert_eq!(report[0].available_quantity, 5);
    assert!(ctx.engine.court_available(ctx.outdoor.id, monday(), hours(10, 11)).await.unwrap());
}
