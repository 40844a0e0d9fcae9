use async_trait::async_trait;
use chrono::NaiveDate;
use courtside_core::{
    BookingResult, TimeWindow,
    ledger::Ledger,
    models::{
        pricing::{BasePrice, PriceClass, PricingRule},
        reservation::{ClaimedSlot, Reservation, ReservationId, ReservationStatus},
        resource::{Coach, CoachId, CoachWindow, Court, CourtId, EquipmentId, EquipmentUnit, ResourceKind},
    },
};
use mockall::mock;
use uuid::Uuid;

// Mock of the read contract, used to inject storage faults and canned rows.
mock! {
    pub Ledger {}

    #[async_trait]
    impl Ledger for Ledger {
        async fn court(&mut self, id: CourtId) -> BookingResult<Option<Court>>;

        async fn coach(&mut self, id: CoachId) -> BookingResult<Option<Coach>>;

        async fn equipment(&mut self, id: EquipmentId) -> BookingResult<Option<EquipmentUnit>>;

        async fn active_courts(&mut self) -> BookingResult<Vec<Court>>;

        async fn active_coaches(&mut self) -> BookingResult<Vec<Coach>>;

        async fn active_equipment(&mut self) -> BookingResult<Vec<EquipmentUnit>>;

        async fn coach_windows(
            &mut self,
            coach_id: CoachId,
            date: NaiveDate,
        ) -> BookingResult<Vec<CoachWindow>>;

        async fn overlapping_claims(
            &mut self,
            kind: ResourceKind,
            resource_id: i64,
            date: NaiveDate,
            window: TimeWindow,
            exclude: Option<ReservationId>,
        ) -> BookingResult<Vec<ClaimedSlot>>;

        async fn confirmed_claims_on(
            &mut self,
            kind: ResourceKind,
            date: NaiveDate,
        ) -> BookingResult<Vec<ClaimedSlot>>;

        async fn reservation(&mut self, id: ReservationId) -> BookingResult<Option<Reservation>>;

        async fn reservations(
            &mut self,
            owner_id: Option<Uuid>,
            status: Option<ReservationStatus>,
        ) -> BookingResult<Vec<Reservation>>;

        async fn active_pricing_rules(&mut self) -> BookingResult<Vec<PricingRule>>;

        async fn active_base_price(&mut self, class: PriceClass) -> BookingResult<Option<BasePrice>>;

        async fn active_base_prices(&mut self) -> BookingResult<Vec<BasePrice>>;
    }
}
