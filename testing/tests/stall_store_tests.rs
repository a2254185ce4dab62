//! Behavioural tests for the in-memory stall registry.
//!
//! These walk the booking lifecycle end to end: stall type setup, capacity
//! rejection, concurrent booking and venue check-in.
//!
//! Run with: `cargo test -p nativenest-testing -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use futures::future::join_all;
use nativenest_core::error::StallError;
use nativenest_core::registry::{Directory, StallRegistry};
use nativenest_core::types::{EventId, NewStallType, StallTypeId};
use nativenest_testing::{InMemoryStallStore, test_clock};
use proptest::prelude::*;
use std::collections::HashSet;

fn gold() -> NewStallType {
    NewStallType::new("Gold", 6, 500_000)
}

fn silver() -> NewStallType {
    NewStallType::new("Silver", 10, 250_000)
}

#[tokio::test]
async fn test_stall_types_seed_contiguous_numbers() {
    let store = InMemoryStallStore::with_clock(test_clock());
    let event_id = store.insert_event("Handloom Expo", 20);

    let gold = store.create_stall_type(event_id, &gold()).await.unwrap();
    let silver = store.create_stall_type(event_id, &silver()).await.unwrap();
    assert_eq!(gold.created_at, test_clock().now());

    let stalls = store.stalls(event_id);
    assert_eq!(stalls.len(), 16);

    let gold_numbers: Vec<u32> = stalls
        .iter()
        .filter(|s| s.stall_type_id == gold.stall_type_id)
        .map(|s| s.stall_number)
        .collect();
    let silver_numbers: Vec<u32> = stalls
        .iter()
        .filter(|s| s.stall_type_id == silver.stall_type_id)
        .map(|s| s.stall_number)
        .collect();
    assert_eq!(gold_numbers, (1..=6).collect::<Vec<_>>());
    assert_eq!(silver_numbers, (7..=16).collect::<Vec<_>>());
    assert!(stalls.iter().all(|s| s.builder_id.is_none()));

    let listing = store.list_stall_types(event_id).await.unwrap();
    let names: Vec<&str> = listing.stall_types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Gold", "Silver"]);
    assert_eq!(listing.allocated(), 16);
    assert_eq!(listing.event_stall_count, 20);
}

#[tokio::test]
async fn test_capacity_exceeded_is_atomic() {
    let store = InMemoryStallStore::new();
    let event_id = store.insert_event("Handloom Expo", 20);
    store.create_stall_type(event_id, &gold()).await.unwrap();
    store.create_stall_type(event_id, &silver()).await.unwrap();

    let err = store
        .create_stall_type(event_id, &NewStallType::new("Bronze", 5, 100_000))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StallError::CapacityExceeded {
            requested: 5,
            remaining: 4
        }
    );
    assert_eq!(store.stalls(event_id).len(), 16);
    assert_eq!(store.list_stall_types(event_id).await.unwrap().stall_types.len(), 2);
}

#[tokio::test]
async fn test_update_checks_capacity_against_other_types() {
    let store = InMemoryStallStore::new();
    let event_id = store.insert_event("Handloom Expo", 20);
    let gold = store.create_stall_type(event_id, &gold()).await.unwrap();
    store.create_stall_type(event_id, &silver()).await.unwrap();

    let updated = store
        .update_stall_type(event_id, gold.stall_type_id, &NewStallType::new("Gold+", 10, 1))
        .await
        .unwrap();
    assert_eq!(updated.name, "Gold+");
    assert_eq!(updated.no_of_stalls, 10);

    let err = store
        .update_stall_type(event_id, gold.stall_type_id, &NewStallType::new("Gold+", 11, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StallError::CapacityExceeded { requested: 11, remaining: 10 }));

    // A rejected update leaves the record as it was.
    let listing = store.list_stall_types(event_id).await.unwrap();
    let stored = listing
        .stall_types
        .iter()
        .find(|t| t.stall_type_id == gold.stall_type_id)
        .unwrap();
    assert_eq!(stored.name, "Gold+");
    assert_eq!(stored.no_of_stalls, 10);
    assert_eq!(listing.allocated(), 20);

    // Pool untouched by updates.
    assert_eq!(store.stalls(event_id).len(), 16);
}

#[tokio::test]
async fn test_event_of_ten_stalls_rejects_platinum_then_fits_silver() {
    let store = InMemoryStallStore::new();
    let event_id = store.insert_event("Handloom Expo", 10);

    let gold = store
        .create_stall_type(event_id, &NewStallType::new("Gold", 6, 500_000))
        .await
        .unwrap();

    let err = store
        .create_stall_type(event_id, &NewStallType::new("Platinum", 5, 900_000))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StallError::CapacityExceeded {
            requested: 5,
            remaining: 4
        }
    );

    let silver = store
        .create_stall_type(event_id, &NewStallType::new("Silver", 4, 250_000))
        .await
        .unwrap();

    let stalls = store.stalls(event_id);
    let numbers_of = |stall_type_id: StallTypeId| -> Vec<u32> {
        stalls
            .iter()
            .filter(|s| s.stall_type_id == stall_type_id)
            .map(|s| s.stall_number)
            .collect()
    };
    assert_eq!(numbers_of(gold.stall_type_id), (1..=6).collect::<Vec<_>>());
    assert_eq!(numbers_of(silver.stall_type_id), (7..=10).collect::<Vec<_>>());
    assert_eq!(stalls.len(), 10);

    let listing = store.list_stall_types(event_id).await.unwrap();
    let names: Vec<&str> = listing.stall_types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Gold", "Silver"]);
    assert_eq!(listing.allocated(), 10);
}

#[tokio::test]
async fn test_delete_leaves_orphaned_stalls_unbookable() {
    let store = InMemoryStallStore::new();
    let event_id = store.insert_event("Handloom Expo", 20);
    let builder_id = store.insert_builder("Acme Stalls");
    let gold = store.create_stall_type(event_id, &gold()).await.unwrap();

    store.delete_stall_type(event_id, gold.stall_type_id).await.unwrap();
    assert_eq!(store.stalls(event_id).len(), 6);

    let err = store
        .book_stall(event_id, gold.stall_type_id, builder_id)
        .await
        .unwrap_err();
    assert!(matches!(err, StallError::NotFound { resource: "Stall type", .. }));

    let err = store
        .delete_stall_type(event_id, gold.stall_type_id)
        .await
        .unwrap_err();
    assert!(matches!(err, StallError::NotFound { .. }));

    // Numbering continues after the orphaned rows.
    let silver = store.create_stall_type(event_id, &silver()).await.unwrap();
    let first_silver = store
        .stalls(event_id)
        .into_iter()
        .find(|s| s.stall_type_id == silver.stall_type_id)
        .unwrap();
    assert_eq!(first_silver.stall_number, 7);
}

#[tokio::test]
async fn test_concurrent_bookings_exhaust_pool_without_double_booking() {
    let store = InMemoryStallStore::new();
    let event_id = store.insert_event("Handloom Expo", 20);
    let gold = store.create_stall_type(event_id, &gold()).await.unwrap();
    let builders: Vec<_> = (0..8)
        .map(|i| store.insert_builder(&format!("Builder {i}")))
        .collect();

    println!("\n🎯 8 builders racing for 6 Gold stalls");

    let handles: Vec<_> = builders
        .into_iter()
        .map(|builder_id| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .book_stall(event_id, gold.stall_type_id, builder_id)
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("booking task panicked"))
        .collect();

    let booked: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let sold_out = results
        .iter()
        .filter(|r| matches!(r, Err(StallError::NoAvailableStall { .. })))
        .count();

    println!("✅ booked: {}, sold out: {sold_out}", booked.len());

    assert_eq!(booked.len(), 6);
    assert_eq!(sold_out, 2);
    let numbers: HashSet<u32> = booked.iter().map(|s| s.stall_number).collect();
    assert_eq!(numbers, (1..=6).collect::<HashSet<_>>());

    let availability = store.list_availability(event_id).await.unwrap();
    assert_eq!(availability[0].booked_count, 6);
    assert_eq!(availability[0].available_count, 0);
}

#[tokio::test]
async fn test_booking_requires_type_in_event() {
    let store = InMemoryStallStore::new();
    let event_a = store.insert_event("Expo A", 10);
    let event_b = store.insert_event("Expo B", 10);
    let builder_id = store.insert_builder("Acme Stalls");
    let gold = store.create_stall_type(event_a, &gold()).await.unwrap();

    let err = store
        .book_stall(event_b, gold.stall_type_id, builder_id)
        .await
        .unwrap_err();
    assert!(matches!(err, StallError::NotFound { resource: "Stall type", .. }));

    let err = store
        .book_stall(EventId::new(9_999), gold.stall_type_id, builder_id)
        .await
        .unwrap_err();
    assert!(matches!(err, StallError::NotFound { resource: "Event", .. }));

    let err = store
        .book_stall(event_a, StallTypeId::new(9_999), builder_id)
        .await
        .unwrap_err();
    assert!(matches!(err, StallError::NotFound { .. }));
}

#[tokio::test]
async fn test_interest_and_check_in_lifecycle() {
    let store = InMemoryStallStore::new();
    let event_id = store.insert_event("Handloom Expo", 20);
    let builder_id = store.insert_builder("Acme Stalls");
    let buyer_id = store.insert_buyer("Asha", "9876543210");
    let gold = store.create_stall_type(event_id, &gold()).await.unwrap();
    let silver = store.create_stall_type(event_id, &silver()).await.unwrap();
    let stall = store
        .book_stall(event_id, gold.stall_type_id, builder_id)
        .await
        .unwrap();

    assert!(store.register_interest(buyer_id, event_id, gold.stall_type_id).await.unwrap());
    assert!(!store.register_interest(buyer_id, event_id, gold.stall_type_id).await.unwrap());

    let interest = store.check_in(event_id, stall.stall_id, "9876543210").await.unwrap();
    assert!(interest.is_attended);
    assert_eq!(interest.stall_id, Some(stall.stall_id));

    let repeat = store.check_in(event_id, stall.stall_id, "9876543210").await.unwrap();
    assert_eq!(repeat, interest);

    let stalls = store.stalls(event_id);
    let other_gold = stalls
        .iter()
        .find(|s| s.stall_type_id == gold.stall_type_id && s.stall_id != stall.stall_id)
        .unwrap();
    let err = store
        .check_in(event_id, other_gold.stall_id, "9876543210")
        .await
        .unwrap_err();
    assert_eq!(err, StallError::AlreadyCheckedIn { stall_id: stall.stall_id });

    let silver_stall = stalls
        .iter()
        .find(|s| s.stall_type_id == silver.stall_type_id)
        .unwrap();
    let err = store
        .check_in(event_id, silver_stall.stall_id, "9876543210")
        .await
        .unwrap_err();
    assert!(matches!(err, StallError::NotFound { resource: "Interest registration", .. }));

    let err = store
        .check_in(event_id, stall.stall_id, "0000000000")
        .await
        .unwrap_err();
    assert!(matches!(err, StallError::NotFound { .. }));

    let records = store.list_builder_interests(builder_id, None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].buyer_name, "Asha");
    assert_eq!(records[0].stall_type_name, "Gold");
    assert!(records[0].is_attended);
}

#[tokio::test]
async fn test_reports_and_lookups() {
    let store = InMemoryStallStore::with_clock(test_clock());
    let event_id = store.insert_event("Handloom Expo", 20);
    let builder_id = store.insert_builder("Acme Stalls");
    let gold = store.create_stall_type(event_id, &gold()).await.unwrap();
    let stall = store
        .book_stall(event_id, gold.stall_type_id, builder_id)
        .await
        .unwrap();
    assert_eq!(stall.booked_at, Some(test_clock().now()));

    let detail = store.get_stall(stall.stall_id).await.unwrap();
    assert_eq!(detail.stall_type_name.as_deref(), Some("Gold"));
    assert_eq!(detail.company_name.as_deref(), Some("Acme Stalls"));

    let bookings = store.list_bookings(event_id).await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].stall_number, 1);

    assert_eq!(store.list_builder_bookings(builder_id, Some(event_id)).await.unwrap().len(), 1);
    assert!(store
        .list_builder_bookings(builder_id, Some(EventId::new(9_999)))
        .await
        .unwrap()
        .is_empty());

    assert!(matches!(
        store.list_bookings(EventId::new(9_999)).await,
        Err(StallError::NotFound { .. })
    ));
    assert_eq!(store.get_event(event_id).await.unwrap().stall_count, 20);
    store.ping().await.unwrap();
}

proptest! {
    #[test]
    fn prop_declared_total_never_exceeds_stall_count(
        stall_count in 0u32..50,
        quantities in prop::collection::vec(1i64..20, 0..10),
    ) {
        let store = InMemoryStallStore::new();
        let event_id = store.insert_event("Expo", stall_count);

        for (i, quantity) in quantities.into_iter().enumerate() {
            let input = NewStallType::new(format!("Type {i}"), quantity, 100);
            let _ = futures::executor::block_on(store.create_stall_type(event_id, &input));
        }

        let listing = futures::executor::block_on(store.list_stall_types(event_id)).unwrap();
        prop_assert!(listing.allocated() <= u64::from(stall_count));

        let stalls = store.stalls(event_id);
        prop_assert_eq!(stalls.len() as u64, listing.allocated());
        let numbers: HashSet<u32> = stalls.iter().map(|s| s.stall_number).collect();
        prop_assert_eq!(numbers.len(), stalls.len());
    }
}
