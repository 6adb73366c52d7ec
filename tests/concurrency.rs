// ============================================================================
// spark-aggregates - Concurrency tests
// Many writer threads, one collection
// ============================================================================

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use spark_aggregates::policy::{by_field1, Field1Extract, Field2Extract};
use spark_aggregates::{ElemId, LockPolicy, TotalPolicy, TwoFieldCollection};
use tracing_subscriber::EnvFilter;

const THREADS: usize = 8;
const PER_THREAD: usize = 250;

type Book = TwoFieldCollection<i64, i64, i64, i64, u64>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn book(policy: LockPolicy) -> Book {
    TwoFieldCollection::builder(
        TotalPolicy::field2_sum(),
        TotalPolicy::max(Field2Extract).with_empty(-1),
    )
    .lock_policy(policy)
    .order_by(by_field1())
    .build()
}

fn spawn_all<R: Send + 'static>(
    f: impl Fn(usize) -> R + Send + Sync + 'static,
) -> Vec<R> {
    let f = Arc::new(f);
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let f = f.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                f(t)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

fn concurrent_inserts_are_unique(policy: LockPolicy) {
    init_tracing();
    let c = book(policy);

    let per_thread = spawn_all({
        let c = c.clone();
        move |t| {
            (0..PER_THREAD)
                .map(|i| c.insert_with_key((t * PER_THREAD + i) as i64, 1, (t * PER_THREAD + i) as u64))
                .collect::<Vec<ElemId>>()
        }
    });

    let all: Vec<ElemId> = per_thread.into_iter().flatten().collect();
    let distinct: HashSet<ElemId> = all.iter().copied().collect();
    assert_eq!(distinct.len(), THREADS * PER_THREAD);
    assert_eq!(c.len(), THREADS * PER_THREAD);
    assert_eq!(c.total1(), (THREADS * PER_THREAD) as i64);
    assert_eq!(c.bottom_k(usize::MAX).unwrap().len(), THREADS * PER_THREAD);

    for k in [0u64, 17, (THREADS * PER_THREAD - 1) as u64] {
        let id = c.find_by_key(&k).unwrap();
        assert_eq!(c.snapshot(id).unwrap().field1, k as i64);
    }
}

#[test]
fn concurrent_inserts_fine() {
    concurrent_inserts_are_unique(LockPolicy::Fine);
}

#[test]
fn concurrent_inserts_coarse() {
    concurrent_inserts_are_unique(LockPolicy::Coarse);
}

#[test]
fn size_tracks_inserts_minus_removes() {
    init_tracing();
    let c = book(LockPolicy::Fine);

    spawn_all({
        let c = c.clone();
        move |_| {
            for i in 0..PER_THREAD {
                let id = c.insert(i as i64, 2);
                if i % 2 == 0 {
                    assert!(c.remove(id));
                }
            }
        }
    });

    let expected = THREADS * PER_THREAD / 2;
    assert_eq!(c.len(), expected);
    assert_eq!(c.ids().len(), expected);
    assert_eq!(c.total1(), 2 * expected as i64);
}

#[test]
fn single_writer_per_element_keeps_totals_exact() {
    init_tracing();
    let c = book(LockPolicy::Fine);
    let ids: Vec<ElemId> = (0..THREADS).map(|_| c.insert(0, 0)).collect();
    let ids = Arc::new(ids);

    // Each thread owns one element and rewrites it many times
    spawn_all({
        let c = c.clone();
        let ids = ids.clone();
        move |t| {
            let qty = c.field2(ids[t]).unwrap();
            let price = c.field1(ids[t]).unwrap();
            for i in 0..PER_THREAD as i64 {
                qty.set(i);
                price.set(-i);
            }
        }
    });

    let last = PER_THREAD as i64 - 1;
    assert_eq!(c.total1(), THREADS as i64 * last);
    assert_eq!(c.total2(), last);
    for &id in ids.iter() {
        let snap = c.snapshot(id).unwrap();
        assert_eq!((snap.field1, snap.field2), (-last, last));
    }
}

#[test]
fn readers_run_alongside_writers() {
    init_tracing();
    let c: TwoFieldCollection<i64, i64, i64, i64> = TwoFieldCollection::builder(
        TotalPolicy::field2_sum(),
        TotalPolicy::min(Field1Extract),
    )
    .order_by(by_field1())
    .combined_atomic(true)
    .build();

    spawn_all({
        let c = c.clone();
        move |t| {
            if t % 2 == 0 {
                for i in 0..PER_THREAD as i64 {
                    let id = c.insert(i, 1);
                    c.field1(id).unwrap().set(i + 1);
                    if i % 3 == 0 {
                        c.remove(id);
                    }
                }
            } else {
                for _ in 0..50 {
                    let walked: Vec<_> = c.iter_ordered().unwrap().collect();
                    // Every step lands strictly after the previous cursor
                    assert!(walked.windows(2).all(|w| w[0].1.field1 <= w[1].1.field1));
                    let _ = c.top_k(5).unwrap();
                    let _ = c.totals();
                }
            }
        }
    });

    let live = c.len() as i64;
    assert_eq!(c.total1(), live);
    let snapshots: Vec<_> = c.iter_ordered().unwrap().collect();
    assert_eq!(snapshots.len() as i64, live);
    assert!(snapshots.windows(2).all(|w| w[0].1.field1 <= w[1].1.field1));
}
