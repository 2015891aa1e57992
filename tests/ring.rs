// tests/ring.rs
use std::sync::Arc;
use std::thread;

use feedbook::ring::SpscRing;

#[test]
fn basic_fifo() {
    let ring: SpscRing<i32> = SpscRing::with_capacity(4);
    assert!(ring.is_empty());
    assert_eq!(ring.len(), 0);
    assert_eq!(ring.capacity(), 4);

    assert!(ring.try_push(1).is_ok());
    assert!(ring.try_push(2).is_ok());
    assert!(ring.try_push(3).is_ok());
    assert!(!ring.is_empty());
    assert_eq!(ring.len(), 3);

    assert_eq!(ring.try_pop(), Some(1));
    assert_eq!(ring.try_pop(), Some(2));
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.try_pop(), Some(3));
    assert!(ring.is_empty());
    assert_eq!(ring.try_pop(), None);
}

#[test]
fn full_ring_rejects_push_unchanged() {
    // One slot is sacrificed: capacity 4 holds 3 elements.
    let ring: SpscRing<i32> = SpscRing::with_capacity(4);
    assert!(ring.try_push(1).is_ok());
    assert!(ring.try_push(2).is_ok());
    assert!(ring.try_push(3).is_ok());

    assert_eq!(ring.try_push(4), Err(4));
    assert_eq!(ring.len(), 3);

    assert_eq!(ring.try_pop(), Some(1));
    assert!(ring.try_push(4).is_ok());
    assert_eq!(ring.try_pop(), Some(2));
    assert_eq!(ring.try_pop(), Some(3));
    assert_eq!(ring.try_pop(), Some(4));
}

#[test]
fn empty_pop_leaves_ring_unchanged() {
    let ring: SpscRing<u64> = SpscRing::with_capacity(8);
    assert_eq!(ring.try_pop(), None);
    assert!(ring.try_push(42).is_ok());
    assert_eq!(ring.try_pop(), Some(42));
    assert_eq!(ring.try_pop(), None);
}

#[test]
#[should_panic(expected = "power of two")]
fn non_power_of_two_capacity_is_fatal() {
    let _ = SpscRing::<i32>::with_capacity(6);
}

#[test]
#[should_panic(expected = "power of two")]
fn zero_capacity_is_fatal() {
    let _ = SpscRing::<i32>::with_capacity(0);
}

#[test]
fn wraps_around_many_times() {
    let ring: SpscRing<usize> = SpscRing::with_capacity(8);
    for i in 0..1000 {
        assert!(ring.try_push(i).is_ok());
        assert_eq!(ring.try_pop(), Some(i));
    }
    assert!(ring.is_empty());
}

#[test]
fn drop_releases_remaining_elements() {
    let ring: SpscRing<String> = SpscRing::with_capacity(8);
    for i in 0..5 {
        assert!(ring.try_push(format!("value-{i}")).is_ok());
    }
    drop(ring);
}

#[test]
fn spsc_stress_preserves_order() {
    // Producer pushes 10_000 sequential integers while the consumer pops
    // concurrently; the consumed sequence must be exact.
    const N: u64 = 10_000;
    let ring: Arc<SpscRing<u64>> = Arc::new(SpscRing::with_capacity(64));

    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            for i in 0..N {
                let mut v = i;
                loop {
                    match ring.try_push(v) {
                        Ok(()) => break,
                        Err(back) => {
                            v = back;
                            thread::yield_now();
                        }
                    }
                }
            }
        })
    };

    let mut seen = Vec::with_capacity(N as usize);
    while seen.len() < N as usize {
        match ring.try_pop() {
            Some(v) => seen.push(v),
            None => thread::yield_now(),
        }
    }
    producer.join().unwrap();

    assert!(ring.is_empty());
    let expected: Vec<u64> = (0..N).collect();
    assert_eq!(seen, expected);
}
