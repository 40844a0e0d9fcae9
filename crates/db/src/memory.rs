//! In-memory ledger for single-process deployments and tests.
//!
//! Row locks are emulated with one Tokio mutex per resource, looked up in a
//! shared lock table. A transaction keeps the owned guards until it commits
//! or is dropped, and stages its writes so that nothing is visible to other
//! handles before commit.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{
        Arc, Mutex as StdMutex, PoisonError,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use courtside_core::{
    BookingError, BookingResult, TimeWindow,
    ledger::{Ledger, LedgerStore, LedgerTx},
    models::{
        pricing::{BasePrice, PriceClass, PricingRule, RuleKind},
        reservation::{
            ClaimedSlot, NewReservation, Reservation, ReservationId, ReservationStatus, ResourceClaim,
        },
        resource::{
            Coach, CoachId, CoachWindow, Court, CourtId, CourtType, EquipmentId, EquipmentUnit,
            ResourceKind,
        },
    },
};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LockKey {
    Court(CourtId),
    Equipment(EquipmentId),
    Coach(CoachId),
    Reservation(ReservationId),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKey::Court(id) => write!(f, "court {id}"),
            LockKey::Equipment(id) => write!(f, "equipment {id}"),
            LockKey::Coach(id) => write!(f, "coach {id}"),
            LockKey::Reservation(id) => write!(f, "reservation {id}"),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    courts: BTreeMap<CourtId, Court>,
    coaches: BTreeMap<CoachId, Coach>,
    coach_windows: Vec<CoachWindow>,
    equipment: BTreeMap<EquipmentId, EquipmentUnit>,
    reservations: BTreeMap<ReservationId, Reservation>,
    pricing_rules: BTreeMap<RuleKind, PricingRule>,
    base_prices: BTreeMap<PriceClass, BasePrice>,
}

impl MemoryState {
    /// Committed reservations with this handle's staged versions layered on top.
    fn visible<'a>(
        &'a self,
        staged: &'a BTreeMap<ReservationId, Reservation>,
    ) -> impl Iterator<Item = &'a Reservation> {
        self.reservations
            .values()
            .filter(|reservation| !staged.contains_key(&reservation.id))
            .chain(staged.values())
    }

    fn claimed_slots(
        &self,
        staged: &BTreeMap<ReservationId, Reservation>,
        kind: ResourceKind,
        date: NaiveDate,
    ) -> Vec<ClaimedSlot> {
        let mut slots: Vec<ClaimedSlot> = self
            .visible(staged)
            .filter(|reservation| reservation.is_confirmed() && reservation.date == date)
            .flat_map(|reservation| {
                reservation.claims_of(kind).map(move |claim| ClaimedSlot {
                    reservation_id: reservation.id,
                    owner_id: reservation.owner_id,
                    resource_id: claim.resource_id,
                    quantity: claim.quantity,
                    window: reservation.window,
                })
            })
            .collect();

        slots.sort_by_key(|slot| (slot.resource_id, slot.window.start(), slot.reservation_id));
        slots
    }
}

struct Shared {
    state: RwLock<MemoryState>,
    locks: StdMutex<HashMap<LockKey, Arc<Mutex<()>>>>,
    next_id: AtomicI64,
    lock_timeout: Duration,
}

impl Shared {
    fn lock_for(&self, key: LockKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key).or_default().clone()
    }

    /// Removes the entry for `key` once no session holds or waits on it.
    fn prune(&self, key: LockKey) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&key).is_some_and(|mutex| Arc::strong_count(mutex) == 1) {
            locks.remove(&key);
        }
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Ledger kept entirely in process memory.
///
/// Cloning yields another handle onto the same ledger.
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("lock_timeout", &self.shared.lock_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl MemoryStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(MemoryState::default()),
                locks: StdMutex::new(HashMap::new()),
                next_id: AtomicI64::new(1),
                lock_timeout,
            }),
        }
    }

    pub async fn add_court(&self, name: &str, court_type: CourtType) -> Court {
        let court = Court {
            id: self.shared.next_id(),
            name: name.to_string(),
            court_type,
            is_active: true,
        };
        let mut state = self.shared.state.write().await;
        state.courts.insert(court.id, court.clone());
        info!(court_id = court.id, "Court added");
        court
    }

    pub async fn add_coach(&self, name: &str) -> Coach {
        let coach = Coach {
            id: self.shared.next_id(),
            name: name.to_string(),
            is_active: true,
        };
        let mut state = self.shared.state.write().await;
        state.coaches.insert(coach.id, coach.clone());
        info!(coach_id = coach.id, "Coach added");
        coach
    }

    pub async fn add_coach_window(
        &self,
        coach_id: CoachId,
        date: NaiveDate,
        window: TimeWindow,
    ) -> BookingResult<CoachWindow> {
        let mut state = self.shared.state.write().await;
        if !state.coaches.contains_key(&coach_id) {
            return Err(BookingError::NotFound(format!("Coach {coach_id}")));
        }

        let row = CoachWindow {
            id: self.shared.next_id(),
            coach_id,
            date,
            window,
        };
        state.coach_windows.push(row.clone());
        Ok(row)
    }

    pub async fn add_equipment(&self, name: &str, total_quantity: u32) -> EquipmentUnit {
        let unit = EquipmentUnit::new(self.shared.next_id(), name, total_quantity);
        let mut state = self.shared.state.write().await;
        state.equipment.insert(unit.id, unit.clone());
        info!(equipment_id = unit.id, total_quantity, "Equipment added");
        unit
    }

    pub async fn set_equipment_stock(
        &self,
        id: EquipmentId,
        total_quantity: u32,
        available_quantity: u32,
    ) -> BookingResult<EquipmentUnit> {
        let mut state = self.shared.state.write().await;
        let unit = state
            .equipment
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound(format!("Equipment {id}")))?;
        unit.set_stock(total_quantity, available_quantity);
        Ok(unit.clone())
    }

    /// Toggles the active flag of any catalog entry.
    pub async fn set_active(&self, kind: ResourceKind, id: i64, is_active: bool) -> BookingResult<()> {
        let mut state = self.shared.state.write().await;
        let flag = match kind {
            ResourceKind::Court => state.courts.get_mut(&id).map(|court| &mut court.is_active),
            ResourceKind::Coach => state.coaches.get_mut(&id).map(|coach| &mut coach.is_active),
            ResourceKind::Equipment => state.equipment.get_mut(&id).map(|unit| &mut unit.is_active),
        };

        match flag {
            Some(flag) => {
                *flag = is_active;
                Ok(())
            }
            None => Err(BookingError::NotFound(format!("{} {id}", kind.as_str()))),
        }
    }

    pub async fn put_base_price(&self, class: PriceClass, price: Decimal) -> BasePrice {
        let base = BasePrice {
            class,
            price,
            is_active: true,
        };
        let mut state = self.shared.state.write().await;
        state.base_prices.insert(class, base.clone());
        base
    }

    /// Creates or replaces the rule of the given kind.
    pub async fn put_pricing_rule(
        &self,
        kind: RuleKind,
        value: Decimal,
        is_percentage: bool,
        is_active: bool,
    ) -> PricingRule {
        let mut state = self.shared.state.write().await;
        let id = match state.pricing_rules.get(&kind) {
            Some(existing) => existing.id,
            None => self.shared.next_id(),
        };

        let rule = PricingRule {
            id,
            kind,
            value,
            is_percentage,
            description: kind.label().to_string(),
            is_active,
        };
        state.pricing_rules.insert(kind, rule.clone());
        rule
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn snapshot(&self) -> BookingResult<Box<dyn Ledger + '_>> {
        Ok(Box::new(MemorySession::new(&self.shared)))
    }

    async fn begin(&self) -> BookingResult<Box<dyn LedgerTx + '_>> {
        Ok(Box::new(MemorySession::new(&self.shared)))
    }
}

/// One handle onto the store: a snapshot when boxed as [`Ledger`], a
/// transaction when boxed as [`LedgerTx`].
struct MemorySession<'a> {
    shared: &'a Shared,
    held: HashMap<LockKey, OwnedMutexGuard<()>>,
    staged: BTreeMap<ReservationId, Reservation>,
}

impl<'a> MemorySession<'a> {
    fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            held: HashMap::new(),
            staged: BTreeMap::new(),
        }
    }

    async fn acquire(&mut self, key: LockKey) -> BookingResult<()> {
        if self.held.contains_key(&key) {
            return Ok(());
        }

        let mutex = self.shared.lock_for(key);
        match tokio::time::timeout(self.shared.lock_timeout, mutex.lock_owned()).await {
            Ok(guard) => {
                debug!("Locked {}", key);
                self.held.insert(key, guard);
                Ok(())
            }
            Err(_) => {
                self.shared.prune(key);
                warn!("Timed out waiting for lock on {}", key);
                Err(BookingError::Conflict(format!(
                    "Timed out waiting for {key}, please retry"
                )))
            }
        }
    }
}

impl Drop for MemorySession<'_> {
    fn drop(&mut self) {
        for (key, guard) in self.held.drain() {
            drop(guard);
            self.shared.prune(key);
        }
    }
}

#[async_trait]
impl Ledger for MemorySession<'_> {
    async fn court(&mut self, id: CourtId) -> BookingResult<Option<Court>> {
        Ok(self.shared.state.read().await.courts.get(&id).cloned())
    }

    async fn coach(&mut self, id: CoachId) -> BookingResult<Option<Coach>> {
        Ok(self.shared.state.read().await.coaches.get(&id).cloned())
    }

    async fn equipment(&mut self, id: EquipmentId) -> BookingResult<Option<EquipmentUnit>> {
        Ok(self.shared.state.read().await.equipment.get(&id).cloned())
    }

    async fn active_courts(&mut self) -> BookingResult<Vec<Court>> {
        let state = self.shared.state.read().await;
        Ok(state.courts.values().filter(|c| c.is_active).cloned().collect())
    }

    async fn active_coaches(&mut self) -> BookingResult<Vec<Coach>> {
        let state = self.shared.state.read().await;
        Ok(state.coaches.values().filter(|c| c.is_active).cloned().collect())
    }

    async fn active_equipment(&mut self) -> BookingResult<Vec<EquipmentUnit>> {
        let state = self.shared.state.read().await;
        Ok(state.equipment.values().filter(|e| e.is_active).cloned().collect())
    }

    async fn coach_windows(
        &mut self,
        coach_id: CoachId,
        date: NaiveDate,
    ) -> BookingResult<Vec<CoachWindow>> {
        let state = self.shared.state.read().await;
        let mut windows: Vec<CoachWindow> = state
            .coach_windows
            .iter()
            .filter(|row| row.coach_id == coach_id && row.date == date)
            .cloned()
            .collect();
        windows.sort_by_key(|row| row.window.start());
        Ok(windows)
    }

    async fn overlapping_claims(
        &mut self,
        kind: ResourceKind,
        resource_id: i64,
        date: NaiveDate,
        window: TimeWindow,
        exclude: Option<ReservationId>,
    ) -> BookingResult<Vec<ClaimedSlot>> {
        let state = self.shared.state.read().await;
        Ok(state
            .claimed_slots(&self.staged, kind, date)
            .into_iter()
            .filter(|slot| slot.resource_id == resource_id)
            .filter(|slot| Some(slot.reservation_id) != exclude)
            .filter(|slot| slot.window.overlaps(&window))
            .collect())
    }

    async fn confirmed_claims_on(
        &mut self,
        kind: ResourceKind,
        date: NaiveDate,
    ) -> BookingResult<Vec<ClaimedSlot>> {
        let state = self.shared.state.read().await;
        Ok(state.claimed_slots(&self.staged, kind, date))
    }

    async fn reservation(&mut self, id: ReservationId) -> BookingResult<Option<Reservation>> {
        if let Some(staged) = self.staged.get(&id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.shared.state.read().await.reservations.get(&id).cloned())
    }

    async fn reservations(
        &mut self,
        owner_id: Option<Uuid>,
        status: Option<ReservationStatus>,
    ) -> BookingResult<Vec<Reservation>> {
        let state = self.shared.state.read().await;
        let mut listed: Vec<Reservation> = state
            .visible(&self.staged)
            .filter(|r| owner_id.is_none_or(|owner| r.owner_id == owner))
            .filter(|r| status.is_none_or(|status| r.status == status))
            .cloned()
            .collect();

        listed.sort_by(|a, b| {
            (b.date, b.window.start(), b.id).cmp(&(a.date, a.window.start(), a.id))
        });
        Ok(listed)
    }

    async fn active_pricing_rules(&mut self) -> BookingResult<Vec<PricingRule>> {
        let state = self.shared.state.read().await;
        let mut rules: Vec<PricingRule> = state
            .pricing_rules
            .values()
            .filter(|rule| rule.is_active)
            .cloned()
            .collect();
        // Same order as the rule_type column sorts in PostgreSQL.
        rules.sort_by_key(|rule| rule.kind.as_str());
        Ok(rules)
    }

    async fn active_base_price(&mut self, class: PriceClass) -> BookingResult<Option<BasePrice>> {
        let state = self.shared.state.read().await;
        Ok(state
            .base_prices
            .get(&class)
            .filter(|price| price.is_active)
            .cloned())
    }

    async fn active_base_prices(&mut self) -> BookingResult<Vec<BasePrice>> {
        let state = self.shared.state.read().await;
        Ok(state
            .base_prices
            .values()
            .filter(|price| price.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerTx for MemorySession<'_> {
    async fn lock_court(&mut self, id: CourtId) -> BookingResult<Option<Court>> {
        self.acquire(LockKey::Court(id)).await?;
        self.court(id).await
    }

    async fn lock_equipment(&mut self, id: EquipmentId) -> BookingResult<Option<EquipmentUnit>> {
        self.acquire(LockKey::Equipment(id)).await?;
        self.equipment(id).await
    }

    async fn lock_coach(&mut self, id: CoachId) -> BookingResult<Option<Coach>> {
        self.acquire(LockKey::Coach(id)).await?;
        self.coach(id).await
    }

    async fn lock_reservation(&mut self, id: ReservationId) -> BookingResult<Option<Reservation>> {
        self.acquire(LockKey::Reservation(id)).await?;
        self.reservation(id).await
    }

    async fn insert_reservation(&mut self, new: NewReservation) -> BookingResult<Reservation> {
        let id = self.shared.next_id();
        let claims = new
            .claims
            .into_iter()
            .map(|claim| ResourceClaim {
                id: self.shared.next_id(),
                reservation_id: id,
                kind: claim.kind,
                resource_id: claim.resource_id,
                quantity: claim.quantity,
            })
            .collect();

        let reservation = Reservation {
            id,
            owner_id: new.owner_id,
            date: new.date,
            window: new.window,
            total_price: new.total_price,
            status: ReservationStatus::Confirmed,
            claims,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        self.staged.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn update_status(
        &mut self,
        id: ReservationId,
        status: ReservationStatus,
        updated_at: DateTime<Utc>,
    ) -> BookingResult<Reservation> {
        let mut reservation = self
            .reservation(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Reservation {id}")))?;
        reservation.status = status;
        reservation.updated_at = updated_at;
        self.staged.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        let mut session = *self;
        let staged = std::mem::take(&mut session.staged);
        let written = staged.len();
        let mut state = session.shared.state.write().await;
        state.reservations.extend(staged);
        drop(state);

        debug!("Committed {} reservation writes, releasing {} locks", written, session.held.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use pretty_assertions::assert_eq;

    fn window(start: u32, end: u32) -> TimeWindow {
        TimeWindow::new(
            NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn new_reservation(court_id: CourtId, date: NaiveDate, slot: TimeWindow) -> NewReservation {
        NewReservation {
            owner_id: Uuid::new_v4(),
            date,
            window: slot,
            total_price: Decimal::new(5000, 2),
            claims: vec![courtside_core::models::reservation::NewClaim {
                kind: ResourceKind::Court,
                resource_id: court_id,
                quantity: 1,
            }],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn staged_writes_are_invisible_until_commit() {
        let store = MemoryStore::default();
        let court = store.add_court("Court 1", CourtType::Outdoor).await;
        let date = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.lock_court(court.id).await.unwrap();
        let created = tx
            .insert_reservation(new_reservation(court.id, date, window(10, 12)))
            .await
            .unwrap();

        let mut snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.reservation(created.id).await.unwrap(), None);

        tx.commit().await.unwrap();
        let stored = snapshot.reservation(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back_and_releases_locks() {
        let store = MemoryStore::new(Duration::from_millis(50));
        let court = store.add_court("Court 1", CourtType::Indoor).await;
        let date = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.lock_court(court.id).await.unwrap();
            tx.insert_reservation(new_reservation(court.id, date, window(10, 12)))
                .await
                .unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.lock_court(court.id).await.unwrap().is_some());
        let claims = tx
            .overlapping_claims(ResourceKind::Court, court.id, date, window(9, 13), None)
            .await
            .unwrap();
        assert!(claims.is_empty());
    }

    #[tokio::test]
    async fn lock_wait_past_timeout_is_a_conflict() {
        let store = MemoryStore::new(Duration::from_millis(20));
        let court = store.add_court("Court 1", CourtType::Outdoor).await;

        let mut first = store.begin().await.unwrap();
        first.lock_court(court.id).await.unwrap();

        let mut second = store.begin().await.unwrap();
        let error = second.lock_court(court.id).await.unwrap_err();
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn finished_sessions_leave_the_lock_table_empty() {
        let store = MemoryStore::new(Duration::from_millis(20));
        let court = store.add_court("Court 1", CourtType::Outdoor).await;
        let date = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();

        for id in 1_000..2_000 {
            let mut tx = store.begin().await.unwrap();
            assert!(tx.lock_reservation(id).await.unwrap().is_none());
        }
        assert_eq!(store.shared.lock_table_len(), 0);

        let mut tx = store.begin().await.unwrap();
        tx.lock_court(court.id).await.unwrap();
        tx.insert_reservation(new_reservation(court.id, date, window(10, 11)))
            .await
            .unwrap();

        let mut waiter = store.begin().await.unwrap();
        assert!(waiter.lock_court(court.id).await.is_err());
        assert_eq!(store.shared.lock_table_len(), 1);

        tx.commit().await.unwrap();
        drop(waiter);
        assert_eq!(store.shared.lock_table_len(), 0);
    }

    #[tokio::test]
    async fn relocking_a_held_key_does_not_deadlock() {
        let store = MemoryStore::new(Duration::from_millis(20));
        let unit = store.add_equipment("Racket", 4).await;

        let mut tx = store.begin().await.unwrap();
        tx.lock_equipment(unit.id).await.unwrap();
        assert!(tx.lock_equipment(unit.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rule_upsert_keeps_one_row_per_kind() {
        let store = MemoryStore::default();
        let first = store
            .put_pricing_rule(RuleKind::Weekend, Decimal::new(15, 0), true, true)
            .await;
        let second = store
            .put_pricing_rule(RuleKind::Weekend, Decimal::new(20, 0), true, true)
            .await;

        let mut snapshot = store.snapshot().await.unwrap();
        let rules = snapshot.active_pricing_rules().await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].value, Decimal::new(20, 0));
    }
}
