//! Property and scenario tests for the Subscription Scheduler.
//!
//! # Running
//!
//! These exercise the scheduler's pure partitioning/rotation logic and need
//! no broker credentials or network access — they run under plain
//! `cargo test --test scheduler_properties`, always.
//!
//! # What is tested
//!
//! - **Invariants** — priority/rotation disjointness, capacity bounds,
//!   idempotent tick replay, rotation batch bounds.
//! - **Boundary cases** — empty priority, priority exactly at capacity,
//!   priority overflow, rotation queue exactly at the capacity window.
//! - **End-to-end scenarios** — representative S1/S2/S3/S4/S6 cases
//!   spanning priority overflow, rotation halving, and tick derivation.

use std::collections::HashSet;

use tick_relay::scheduler::plan;
use tick_relay::store::TickStore;
use tick_relay::types::enums::{Exchange, Segment};
use tick_relay::types::instrument::Instrument;
use tick_relay::types::tick::Tick;

fn instrument(id: u32, segment: Segment) -> Instrument {
    Instrument::new(id, format!("SYM{id}"), Exchange::NSE, segment)
}

fn catalog_of(priority: usize, rotation: usize) -> Vec<Instrument> {
    (1..=priority as u32)
        .map(|id| instrument(id, Segment::INDICES))
        .chain((1..=rotation as u32).map(|id| instrument(priority as u32 + id, Segment::NSE)))
        .collect()
}

// ===================================================================
// Invariants
// ===================================================================

#[test]
fn invariant_priority_and_rotation_are_disjoint() {
    let catalog = catalog_of(10, 50);
    let result = plan(&catalog, 20);

    let priority: HashSet<u32> = result.permanent.iter().copied().collect();
    let rotation: HashSet<u32> = result.rotation.iter().flatten().copied().collect();
    assert!(priority.is_disjoint(&rotation));
}

#[test]
fn invariant_priority_never_exceeds_n() {
    let catalog = catalog_of(5_000, 1_000);
    let result = plan(&catalog, 3_000);
    assert!(result.permanent.len() <= 3_000);
}

#[test]
fn invariant_rotation_sets_are_pairwise_disjoint() {
    let catalog = catalog_of(0, 97);
    let result = plan(&catalog, 10);
    let r2: HashSet<u32> = result.rotation[1].iter().copied().collect();
    let r3: HashSet<u32> = result.rotation[2].iter().copied().collect();
    assert!(r2.is_disjoint(&r3));
    assert_eq!(r2.len() + r3.len(), 97 - result.rotation[0].len());
}

// ===================================================================
// Boundary cases
// ===================================================================

#[test]
fn boundary_zero_priority_gives_connection_one_full_capacity() {
    let catalog = catalog_of(0, 30);
    let result = plan(&catalog, 10);
    assert!(result.permanent.is_empty());
    assert_eq!(result.rotation[0].len(), 10);
}

#[test]
fn boundary_priority_exactly_at_capacity_leaves_no_leftover() {
    let catalog = catalog_of(10, 10);
    let result = plan(&catalog, 10);
    assert_eq!(result.permanent.len(), 10);
    assert!(result.rotation[0].is_empty());
}

#[test]
fn boundary_priority_overflow_is_demoted_to_rotation() {
    // 3001 priority ids, N=3000: connection #1's permanent set is capped at
    // 3000 and the single overflow id is demoted into the rotation split.
    let catalog = catalog_of(3_001, 0);
    let result = plan(&catalog, 3_000);
    assert_eq!(result.permanent.len(), 3_000);
    assert!(result.rotation[0].is_empty());
    let demoted: Vec<u32> = result.rotation[1]
        .iter()
        .chain(result.rotation[2].iter())
        .copied()
        .collect();
    assert_eq!(demoted, vec![3_001]);
}

#[test]
fn boundary_empty_catalog_produces_empty_plan() {
    let result = plan(&[], 3_000);
    assert!(result.permanent.is_empty());
    assert!(result.rotation.iter().all(Vec::is_empty));
}

// ===================================================================
// End-to-end scenarios
// ===================================================================

#[test]
fn scenario_s1_small_priority_and_rotation_set() {
    // 2 priority ids, 5 rotation ids, N=4: WS1 subscribes {p1,p2,r1,r2}.
    let catalog = catalog_of(2, 5);
    let result = plan(&catalog, 4);
    assert_eq!(result.permanent, vec![1, 2]);
    // leftover = 4 - 2 = 2, so r1,r2 (ids 3,4) join connection #1's queue
    assert_eq!(result.rotation[0], vec![3, 4]);
}

#[test]
fn scenario_s2_remaining_rotation_ids_split_evenly_across_connections() {
    // 10 rotation ids, N=4: connection #1 takes 4 (its full leftover
    // capacity with no priority set), leaving 6 to split between
    // connections #2 and #3.
    let catalog = catalog_of(0, 10);
    let result = plan(&catalog, 4);
    assert_eq!(result.rotation[0].len(), 4);
    assert_eq!(result.rotation[1].len() + result.rotation[2].len(), 6);
    assert!(result.rotation[2].len() as i64 - result.rotation[1].len() as i64 <= 1);
}

#[test]
fn scenario_s3_tick_with_full_ohlc_derives_rounded_fields() {
    let store = TickStore::new();
    store.update(&[Tick {
        instrument_id: 7,
        last_price: 100.0,
        close_price: Some(95.0),
        change: Some(5.12345),
    }]);
    let entry = store.get(7).unwrap();
    assert_eq!(entry.last_price, 100.0);
    assert_eq!(entry.change, 5.12);
    assert_eq!(entry.net_change, 5.00);
}

#[test]
fn scenario_s4_tick_with_missing_ohlc_defaults_to_zero_changes() {
    let store = TickStore::new();
    store.update(&[Tick {
        instrument_id: 8,
        last_price: 42.0,
        close_price: None,
        change: None,
    }]);
    let entry = store.get(8).unwrap();
    assert_eq!(entry.net_change, 0.0);
    assert_eq!(entry.change, 0.0);
}

#[test]
fn scenario_s6_overflowing_priority_promotes_the_excess() {
    let catalog = catalog_of(3_001, 0);
    let result = plan(&catalog, 3_000);
    assert_eq!(result.permanent.len(), 3_000);
    let total_rotation: usize = result.rotation.iter().map(Vec::len).sum();
    assert_eq!(total_rotation, 1);
}

// ===================================================================
// Idempotence
// ===================================================================

#[test]
fn idempotence_replaying_the_same_batch_is_a_no_op() {
    let store = TickStore::new();
    let batch = [Tick {
        instrument_id: 1,
        last_price: 10.0,
        close_price: Some(9.5),
        change: Some(0.5),
    }];
    store.update(&batch);
    let first = store.snapshot();
    store.update(&batch);
    let second = store.snapshot();
    assert_eq!(*first, *second);
}
