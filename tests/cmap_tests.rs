//! Stress tests for `cmap` driven by real OS threads.
//!
//! Loom cannot afford the full state space of a segment-striped hopscotch
//! table (see DESIGN.md), so its concurrent properties — linearizability
//! under interleaved mutation, and reader handles surviving a concurrent
//! remove — are instead checked here by racing real threads against a
//! shared table and verifying the observable outcomes are consistent with
//! *some* sequential order, rather than by exploring every interleaving.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use hopcore::{CMap, CMapConfig};

fn new_map<K: std::hash::Hash + Eq, V>(expected_buckets: usize) -> CMap<K, V> {
    let (map, _capacity) = CMap::new(CMapConfig {
        expected_buckets,
        expected_segments: 0,
        store_hash: true,
    });
    map
}

/// S1: single-thread round trip.
#[test]
fn single_thread_set_get_contains_remove() {
    let map = new_map::<u64, &'static str>(4096);
    assert!(map.set(1, "one"));
    assert!(map.set(2, "two"));
    assert_eq!(map.get(&1).map(|v| *v), Some("one"));
    assert!(map.contains(&2));
    assert!(map.remove(&1));
    assert!(!map.contains(&1));
    assert!(map.contains(&2));
}

/// S2: duplicate insert is rejected and leaves the original value intact.
#[test]
fn duplicate_insert_rejected() {
    let map = new_map::<u64, u64>(4096);
    assert!(map.set(7, 100));
    assert!(!map.set(7, 200));
    assert_eq!(map.get(&7).map(|v| *v), Some(100));
}

/// S3: forcing many entries into the same small table exercises
/// displacement (closer-free-bucket search) repeatedly, not just the
/// direct-hit path.
#[test]
fn dense_insertion_exercises_displacement() {
    let map = new_map::<u64, u64>(4096);
    let mut inserted = 0u64;
    for k in 0..3_400u64 {
        if map.set(k, k + 1) {
            inserted += 1;
        }
    }
    // Past the advisory load factor some inserts are expected to fail as
    // the neighborhood saturates; the ones that succeeded must all still
    // be readable.
    assert!(inserted > 0);
    let mut verified = 0u64;
    for k in 0..3_400u64 {
        if let Some(v) = map.get(&k) {
            assert_eq!(*v, k + 1);
            verified += 1;
        }
    }
    assert_eq!(inserted, verified);
}

/// Property 5: a handle returned by `get` stays valid across a concurrent
/// `remove` of the same key — the `Arc<V>` keeps the value alive
/// independent of the table slot.
#[test]
fn reader_handle_survives_concurrent_remove() {
    let map = Arc::new(new_map::<u64, String>(4096));
    map.set(1, "durable".to_string());
    let barrier = Arc::new(Barrier::new(2));

    let reader_map = Arc::clone(&map);
    let reader_barrier = Arc::clone(&barrier);
    let reader = thread::spawn(move || {
        let handle = reader_map.get(&1).unwrap();
        reader_barrier.wait();
        // However the remove below interleaves, this handle must remain
        // readable and unchanged: cmap never mutates a value in place.
        thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(*handle, "durable");
    });

    let remover_map = Arc::clone(&map);
    let remover_barrier = Arc::clone(&barrier);
    let remover = thread::spawn(move || {
        remover_barrier.wait();
        assert!(remover_map.remove(&1));
    });

    reader.join().unwrap();
    remover.join().unwrap();
    assert!(!map.contains(&1));
}

/// Property 4: interleaved set/remove/get from many threads over disjoint
/// keys must end in a state consistent with some sequential execution —
/// every surviving key holds exactly the value its (unique) inserting
/// thread gave it, and nothing is ever observed with a mutated value
/// (cmap's `set` never overwrites) or torn (partially written) value.
#[test]
fn concurrent_disjoint_key_mutation_is_linearizable() {
    let map = Arc::new(new_map::<u64, u64>(1 << 16));
    let threads = 8u64;
    let per_thread = 2_000u64;

    let mut handles = Vec::new();
    for t in 0..threads {
        let map = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            for i in 0..per_thread {
                let key = t * per_thread + i;
                assert!(map.set(key, key));
                assert_eq!(map.get(&key).map(|v| *v), Some(key));
                if key % 3 == 0 {
                    assert!(map.remove(&key));
                    assert!(!map.contains(&key));
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    for t in 0..threads {
        for i in 0..per_thread {
            let key = t * per_thread + i;
            if key % 3 == 0 {
                assert!(!map.contains(&key));
            } else {
                assert_eq!(map.get(&key).map(|v| *v), Some(key));
            }
        }
    }
}

/// Many threads racing to insert the *same* keys: exactly one `set` per
/// key may succeed, and every thread's view of whether its own call won
/// must add up to that single success.
#[test]
fn concurrent_contended_inserts_each_key_wins_exactly_once() {
    let map = Arc::new(new_map::<u64, u64>(4096));
    let threads = 6u64;
    let keys = 200u64;
    let wins = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for t in 0..threads {
        let map = Arc::clone(&map);
        let wins = Arc::clone(&wins);
        handles.push(thread::spawn(move || {
            for k in 0..keys {
                if map.set(k, t) {
                    wins.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(wins.load(Ordering::Relaxed), keys as usize);
    let mut winners = HashSet::new();
    for k in 0..keys {
        let winner = map.get(&k).expect("every key must have exactly one winner");
        winners.insert(*winner);
    }
}
