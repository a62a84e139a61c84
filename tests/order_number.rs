use std::{collections::HashSet, sync::Arc, thread};

use axum_takeout_api::order_number::{
    MAX_WORKER_ID, OrderNumberError, OrderNumberGenerator, SnowflakeGenerator,
};

#[test]
fn numbers_increase_within_one_generator() {
    let generator = SnowflakeGenerator::new(7).expect("worker id");
    let ids: Vec<u64> = (0..10_000).map(|_| generator.next_id()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

// 2025-03-01T12:00:00Z, standing still.
fn frozen_ms() -> i64 {
    1_740_830_400_000
}

#[test]
fn stalled_clock_does_not_block_issuing() {
    let generator = SnowflakeGenerator::with_time_source(1, frozen_ms).expect("worker id");
    // Well past the 4096 numbers one millisecond can hold.
    let ids: Vec<u64> = (0..20_000).map(|_| generator.next_id()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
}

#[test]
fn concurrent_submissions_never_share_a_number() {
    let generator = Arc::new(SnowflakeGenerator::new(3).expect("worker id"));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let generator = generator.clone();
            thread::spawn(move || {
                (0..2_000)
                    .map(|_| generator.next_number())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for number in handle.join().expect("worker thread") {
            assert!(seen.insert(number), "duplicate order number");
        }
    }
    assert_eq!(seen.len(), 16_000);
}

#[test]
fn workers_produce_disjoint_numbers() {
    let a = SnowflakeGenerator::new(1).expect("worker id");
    let b = SnowflakeGenerator::new(2).expect("worker id");
    let from_a: HashSet<u64> = (0..1_000).map(|_| a.next_id()).collect();
    assert!((0..1_000).all(|_| !from_a.contains(&b.next_id())));
}

#[test]
fn worker_id_is_bounded() {
    assert!(SnowflakeGenerator::new(MAX_WORKER_ID).is_ok());
    assert_eq!(
        SnowflakeGenerator::new(MAX_WORKER_ID + 1).err(),
        Some(OrderNumberError::WorkerIdOutOfRange(MAX_WORKER_ID + 1))
    );
}

#[test]
fn numbers_are_plain_decimal() {
    let generator = SnowflakeGenerator::new(0).expect("worker id");
    let number = generator.next_number();
    assert!(number.chars().all(|c| c.is_ascii_digit()));
    assert!(number.len() >= 16);
}
