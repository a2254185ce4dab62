//! In-memory stall registry.

use crate::mocks::FixedClock;
use chrono::{DateTime, Utc};
use nativenest_core::capacity::check_capacity;
use nativenest_core::error::{Result, StallError};
use nativenest_core::interest::{CheckInDecision, decide_check_in};
use nativenest_core::pool::SeedPlan;
use nativenest_core::registry::{Directory, StallRegistry};
use nativenest_core::types::{
    Builder, BuilderId, Buyer, BuyerId, BuyerStallInterest, Event, EventId, InterestRecord,
    NewStallType, Stall, StallBooking, StallDetail, StallId, StallType, StallTypeAvailability,
    StallTypeId, StallTypeListing,
};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

type InterestKey = (BuyerId, EventId, StallTypeId);

#[derive(Debug, Default)]
struct State {
    events: HashMap<EventId, Event>,
    builders: HashMap<BuilderId, Builder>,
    buyers: HashMap<BuyerId, Buyer>,
    stall_types: BTreeMap<StallTypeId, StallType>,
    stalls: BTreeMap<StallId, Stall>,
    interests: BTreeMap<InterestKey, BuyerStallInterest>,
    last_id: i64,
}

/// In-memory [`StallRegistry`] with the same semantics as the Postgres store.
///
/// Every operation runs under a single mutex, which gives each one the
/// all-or-nothing behaviour of a database transaction. Events, builders and
/// buyers are seeded directly with [`insert_event`](Self::insert_event) and
/// friends.
///
/// # Example
///
/// ```
/// use nativenest_testing::InMemoryStallStore;
///
/// let store = InMemoryStallStore::new();
/// let event_id = store.insert_event("Handloom Expo", 20);
/// let builder_id = store.insert_builder("Acme Stalls");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStallStore {
    state: Arc<Mutex<State>>,
    clock: Option<FixedClock>,
}

fn lock(state: &Mutex<State>) -> Result<MutexGuard<'_, State>> {
    state
        .lock()
        .map_err(|_| StallError::Database("in-memory store lock poisoned".to_string()))
}

impl InMemoryStallStore {
    /// Create an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose timestamps all come from `clock`.
    #[must_use]
    pub fn with_clock(clock: FixedClock) -> Self {
        Self {
            state: Arc::default(),
            clock: Some(clock),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.as_ref().map_or_else(Utc::now, FixedClock::now)
    }

    // ═══════════════════════════════════════════════════════════
    // Directory Seeding
    // ═══════════════════════════════════════════════════════════

    /// Add an event with the given stall count.
    ///
    /// # Panics
    ///
    /// Panics if the store's lock is poisoned.
    #[allow(clippy::expect_used)]
    pub fn insert_event(&self, title: &str, stall_count: u32) -> EventId {
        let mut state = lock(&self.state).expect("store lock poisoned");
        let event_id = EventId::new(state.next_id());
        state.events.insert(
            event_id,
            Event {
                event_id,
                title: title.to_string(),
                stall_count,
            },
        );
        event_id
    }

    /// Add a builder.
    ///
    /// # Panics
    ///
    /// Panics if the store's lock is poisoned.
    #[allow(clippy::expect_used)]
    pub fn insert_builder(&self, company_name: &str) -> BuilderId {
        let mut state = lock(&self.state).expect("store lock poisoned");
        let builder_id = BuilderId::new(state.next_id());
        state.builders.insert(
            builder_id,
            Builder {
                builder_id,
                company_name: company_name.to_string(),
            },
        );
        builder_id
    }

    /// Add a buyer.
    ///
    /// # Panics
    ///
    /// Panics if the store's lock is poisoned.
    #[allow(clippy::expect_used)]
    pub fn insert_buyer(&self, name: &str, mobile_number: &str) -> BuyerId {
        let mut state = lock(&self.state).expect("store lock poisoned");
        let buyer_id = BuyerId::new(state.next_id());
        state.buyers.insert(
            buyer_id,
            Buyer {
                buyer_id,
                name: name.to_string(),
                mobile_number: mobile_number.to_string(),
            },
        );
        buyer_id
    }

    /// All stalls of an event ordered by stall number.
    ///
    /// # Panics
    ///
    /// Panics if the store's lock is poisoned.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn stalls(&self, event_id: EventId) -> Vec<Stall> {
        let state = lock(&self.state).expect("store lock poisoned");
        let mut stalls: Vec<Stall> = state
            .stalls
            .values()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect();
        stalls.sort_by_key(|s| s.stall_number);
        stalls
    }
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn event(&self, event_id: EventId) -> Result<&Event> {
        self.events
            .get(&event_id)
            .ok_or_else(|| StallError::not_found("Event", event_id))
    }

    fn stall_type_in(&self, event_id: EventId, stall_type_id: StallTypeId) -> Result<&StallType> {
        self.event(event_id)?;
        self.stall_types
            .get(&stall_type_id)
            .filter(|t| t.event_id == event_id)
            .ok_or_else(|| StallError::not_found("Stall type", stall_type_id))
    }

    fn allocated(&self, event_id: EventId, excluding: Option<StallTypeId>) -> u64 {
        self.stall_types
            .values()
            .filter(|t| t.event_id == event_id && Some(t.stall_type_id) != excluding)
            .map(|t| u64::from(t.no_of_stalls))
            .sum()
    }

    fn buyer_by_mobile(&self, mobile_number: &str) -> Result<Buyer> {
        self.buyers
            .values()
            .find(|b| b.mobile_number == mobile_number)
            .cloned()
            .ok_or_else(|| StallError::not_found("Buyer with mobile number", mobile_number))
    }

    fn create_stall_type(
        &mut self,
        event_id: EventId,
        input: &NewStallType,
        now: DateTime<Utc>,
    ) -> Result<StallType> {
        let spec = input.validate()?;
        let stall_count = self.event(event_id)?.stall_count;
        check_capacity(stall_count, self.allocated(event_id, None), spec.quantity)?;

        let stall_type_id = StallTypeId::new(self.last_id + 1);
        let max_existing = self
            .stalls
            .values()
            .filter(|s| s.event_id == event_id)
            .map(|s| s.stall_number)
            .max();
        let plan = SeedPlan::new(event_id, stall_type_id, max_existing, spec.quantity)?;

        // Validation is complete; from here the writes cannot fail.
        self.last_id += 1;
        let stall_type = StallType {
            stall_type_id,
            event_id,
            name: spec.name,
            no_of_stalls: spec.quantity,
            stall_price: spec.price,
            created_at: now,
        };
        self.stall_types.insert(stall_type_id, stall_type.clone());

        for row in plan.rows() {
            let stall_id = StallId::new(self.next_id());
            self.stalls.insert(
                stall_id,
                Stall {
                    stall_id,
                    event_id: row.event_id,
                    stall_type_id: row.stall_type_id,
                    stall_number: row.stall_number,
                    builder_id: None,
                    booked_at: None,
                },
            );
        }

        Ok(stall_type)
    }

    fn update_stall_type(
        &mut self,
        event_id: EventId,
        stall_type_id: StallTypeId,
        input: &NewStallType,
    ) -> Result<StallType> {
        let spec = input.validate()?;
        let stall_count = self.event(event_id)?.stall_count;
        self.stall_type_in(event_id, stall_type_id)?;
        check_capacity(
            stall_count,
            self.allocated(event_id, Some(stall_type_id)),
            spec.quantity,
        )?;

        let stall_type = self
            .stall_types
            .get_mut(&stall_type_id)
            .ok_or_else(|| StallError::not_found("Stall type", stall_type_id))?;
        stall_type.name = spec.name;
        stall_type.no_of_stalls = spec.quantity;
        stall_type.stall_price = spec.price;
        Ok(stall_type.clone())
    }

    fn delete_stall_type(&mut self, event_id: EventId, stall_type_id: StallTypeId) -> Result<()> {
        match self.stall_types.get(&stall_type_id) {
            Some(t) if t.event_id == event_id => {
                self.stall_types.remove(&stall_type_id);
                Ok(())
            }
            _ => Err(StallError::not_found("Stall type", stall_type_id)),
        }
    }

    fn sorted_types(&self, event_id: EventId) -> Vec<StallType> {
        let mut types: Vec<StallType> = self
            .stall_types
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        types.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.stall_type_id.cmp(&b.stall_type_id))
        });
        types
    }

    fn availability(&self, event_id: EventId) -> Result<Vec<StallTypeAvailability>> {
        self.event(event_id)?;
        Ok(self
            .sorted_types(event_id)
            .into_iter()
            .map(|t| {
                let booked = self
                    .stalls
                    .values()
                    .filter(|s| s.stall_type_id == t.stall_type_id && s.is_booked())
                    .count();
                StallTypeAvailability::new(t, u32::try_from(booked).unwrap_or(u32::MAX))
            })
            .collect())
    }

    fn book(
        &mut self,
        event_id: EventId,
        stall_type_id: StallTypeId,
        builder_id: BuilderId,
        now: DateTime<Utc>,
    ) -> Result<Stall> {
        self.stall_type_in(event_id, stall_type_id)?;

        let stall = self
            .stalls
            .values_mut()
            .filter(|s| {
                s.event_id == event_id && s.stall_type_id == stall_type_id && !s.is_booked()
            })
            .min_by_key(|s| s.stall_number)
            .ok_or(StallError::NoAvailableStall {
                event_id,
                stall_type_id,
            })?;

        if !self.builders.contains_key(&builder_id) {
            return Err(StallError::not_found("Builder", builder_id));
        }

        stall.builder_id = Some(builder_id);
        stall.booked_at = Some(now);
        Ok(stall.clone())
    }

    fn register_interest(
        &mut self,
        buyer_id: BuyerId,
        event_id: EventId,
        stall_type_id: StallTypeId,
    ) -> Result<bool> {
        self.stall_type_in(event_id, stall_type_id)?;
        if !self.buyers.contains_key(&buyer_id) {
            return Err(StallError::not_found("Buyer", buyer_id));
        }

        let key = (buyer_id, event_id, stall_type_id);
        if self.interests.contains_key(&key) {
            return Ok(false);
        }
        self.interests
            .insert(key, BuyerStallInterest::new(buyer_id, event_id, stall_type_id));
        Ok(true)
    }

    fn check_in(
        &mut self,
        event_id: EventId,
        stall_id: StallId,
        mobile_number: &str,
    ) -> Result<BuyerStallInterest> {
        let buyer = self.buyer_by_mobile(mobile_number)?;
        let stall_type_id = self
            .stalls
            .get(&stall_id)
            .filter(|s| s.event_id == event_id)
            .map(|s| s.stall_type_id)
            .ok_or_else(|| StallError::not_found("Stall", stall_id))?;

        let interest = self
            .interests
            .get_mut(&(buyer.buyer_id, event_id, stall_type_id))
            .ok_or_else(|| {
                StallError::not_found(
                    "Interest registration",
                    format!("for buyer {} and stall type {stall_type_id}", buyer.buyer_id),
                )
            })?;

        if decide_check_in(interest, stall_id)? == CheckInDecision::Record {
            interest.is_attended = true;
            interest.stall_id = Some(stall_id);
        }
        Ok(interest.clone())
    }

    fn detail(&self, stall: &Stall) -> StallDetail {
        StallDetail {
            stall: stall.clone(),
            stall_type_name: self
                .stall_types
                .get(&stall.stall_type_id)
                .map(|t| t.name.clone()),
            company_name: stall
                .builder_id
                .and_then(|id| self.builders.get(&id))
                .map(|b| b.company_name.clone()),
        }
    }

    fn booking(&self, stall: &Stall, builder_id: BuilderId) -> StallBooking {
        let detail = self.detail(stall);
        StallBooking {
            stall_id: stall.stall_id,
            event_id: stall.event_id,
            stall_number: stall.stall_number,
            stall_type_id: stall.stall_type_id,
            stall_type_name: detail.stall_type_name,
            builder_id,
            company_name: detail.company_name,
            booked_at: stall.booked_at,
        }
    }

    fn bookings_where(&self, keep: impl Fn(&Stall) -> bool) -> Vec<StallBooking> {
        let mut bookings: Vec<StallBooking> = self
            .stalls
            .values()
            .filter(|s| keep(s))
            .filter_map(|s| s.builder_id.map(|b| self.booking(s, b)))
            .collect();
        bookings.sort_by(|a, b| {
            b.event_id
                .cmp(&a.event_id)
                .then(a.stall_number.cmp(&b.stall_number))
        });
        bookings
    }

    fn builder_interests(
        &self,
        builder_id: BuilderId,
        event_id: Option<EventId>,
    ) -> Vec<InterestRecord> {
        let holds = |event: EventId, stall_type: StallTypeId| {
            self.stalls.values().any(|s| {
                s.builder_id == Some(builder_id)
                    && s.event_id == event
                    && s.stall_type_id == stall_type
            })
        };

        let mut records: Vec<InterestRecord> = self
            .interests
            .values()
            .filter(|i| event_id.is_none_or(|e| e == i.event_id))
            .filter(|i| holds(i.event_id, i.stall_type_id))
            .filter_map(|i| {
                let buyer = self.buyers.get(&i.buyer_id)?;
                let stall_type = self.stall_types.get(&i.stall_type_id)?;
                Some(InterestRecord {
                    buyer_id: i.buyer_id,
                    buyer_name: buyer.name.clone(),
                    mobile_number: buyer.mobile_number.clone(),
                    event_id: i.event_id,
                    stall_type_id: i.stall_type_id,
                    stall_type_name: stall_type.name.clone(),
                    stall_id: i.stall_id,
                    is_attended: i.is_attended,
                })
            })
            .collect();
        records.sort_by(|a, b| {
            b.event_id
                .cmp(&a.event_id)
                .then_with(|| a.stall_type_name.cmp(&b.stall_type_name))
                .then_with(|| a.buyer_name.cmp(&b.buyer_name))
        });
        records
    }
}

impl Directory for InMemoryStallStore {
    fn get_event(&self, event_id: EventId) -> impl Future<Output = Result<Event>> + Send {
        let state = Arc::clone(&self.state);
        async move { lock(&state)?.event(event_id).cloned() }
    }

    fn find_buyer_by_mobile(
        &self,
        mobile_number: &str,
    ) -> impl Future<Output = Result<Buyer>> + Send {
        let state = Arc::clone(&self.state);
        let mobile_number = mobile_number.to_string();
        async move { lock(&state)?.buyer_by_mobile(&mobile_number) }
    }

    fn ping(&self) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        async move { lock(&state).map(|_| ()) }
    }
}

impl StallRegistry for InMemoryStallStore {
    fn create_stall_type(
        &self,
        event_id: EventId,
        input: &NewStallType,
    ) -> impl Future<Output = Result<StallType>> + Send {
        let state = Arc::clone(&self.state);
        let input = input.clone();
        let now = self.now();
        async move { lock(&state)?.create_stall_type(event_id, &input, now) }
    }

    fn update_stall_type(
        &self,
        event_id: EventId,
        stall_type_id: StallTypeId,
        input: &NewStallType,
    ) -> impl Future<Output = Result<StallType>> + Send {
        let state = Arc::clone(&self.state);
        let input = input.clone();
        async move { lock(&state)?.update_stall_type(event_id, stall_type_id, &input) }
    }

    fn delete_stall_type(
        &self,
        event_id: EventId,
        stall_type_id: StallTypeId,
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        async move { lock(&state)?.delete_stall_type(event_id, stall_type_id) }
    }

    fn list_stall_types(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<StallTypeListing>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            let state = lock(&state)?;
            let event_stall_count = state.event(event_id)?.stall_count;
            Ok(StallTypeListing {
                stall_types: state.sorted_types(event_id),
                event_stall_count,
            })
        }
    }

    fn list_availability(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Vec<StallTypeAvailability>>> + Send {
        let state = Arc::clone(&self.state);
        async move { lock(&state)?.availability(event_id) }
    }

    fn book_stall(
        &self,
        event_id: EventId,
        stall_type_id: StallTypeId,
        builder_id: BuilderId,
    ) -> impl Future<Output = Result<Stall>> + Send {
        let state = Arc::clone(&self.state);
        let now = self.now();
        async move {
            let result = lock(&state)?.book(event_id, stall_type_id, builder_id, now);
            if let Ok(stall) = &result {
                tracing::debug!(
                    stall_id = %stall.stall_id,
                    stall_number = stall.stall_number,
                    "Stall booked (in-memory)"
                );
            }
            result
        }
    }

    fn register_interest(
        &self,
        buyer_id: BuyerId,
        event_id: EventId,
        stall_type_id: StallTypeId,
    ) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);
        async move { lock(&state)?.register_interest(buyer_id, event_id, stall_type_id) }
    }

    fn check_in(
        &self,
        event_id: EventId,
        stall_id: StallId,
        mobile_number: &str,
    ) -> impl Future<Output = Result<BuyerStallInterest>> + Send {
        let state = Arc::clone(&self.state);
        let mobile_number = mobile_number.to_string();
        async move { lock(&state)?.check_in(event_id, stall_id, &mobile_number) }
    }

    fn get_stall(&self, stall_id: StallId) -> impl Future<Output = Result<StallDetail>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            let state = lock(&state)?;
            state
                .stalls
                .get(&stall_id)
                .map(|s| state.detail(s))
                .ok_or_else(|| StallError::not_found("Stall", stall_id))
        }
    }

    fn list_bookings(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Vec<StallBooking>>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            let state = lock(&state)?;
            state.event(event_id)?;
            Ok(state.bookings_where(|s| s.event_id == event_id))
        }
    }

    fn list_builder_bookings(
        &self,
        builder_id: BuilderId,
        event_id: Option<EventId>,
    ) -> impl Future<Output = Result<Vec<StallBooking>>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            let state = lock(&state)?;
            Ok(state.bookings_where(|s| {
                s.builder_id == Some(builder_id) && event_id.is_none_or(|e| e == s.event_id)
            }))
        }
    }

    fn list_builder_interests(
        &self,
        builder_id: BuilderId,
        event_id: Option<EventId>,
    ) -> impl Future<Output = Result<Vec<InterestRecord>>> + Send {
        let state = Arc::clone(&self.state);
        async move { Ok(lock(&state)?.builder_interests(builder_id, event_id)) }
    }
}
