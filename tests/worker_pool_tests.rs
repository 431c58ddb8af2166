use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cascade_ocr::inference::WorkerPool;

#[test]
fn test_map_preserves_input_order() {
    let pool = WorkerPool::new(Some(4)).unwrap();
    let items: Vec<u64> = (0..64).collect();

    let results = pool.map(&items, |&i| {
        thread::sleep(Duration::from_millis((64 - i) % 7));
        i * 10
    });

    assert_eq!(results, items.iter().map(|i| i * 10).collect::<Vec<_>>());
}

#[test]
fn test_map_empty_batch() {
    let pool = WorkerPool::new(Some(2)).unwrap();
    let items: Vec<u32> = Vec::new();
    assert!(pool.map(&items, |&i| i).is_empty());
}

#[test]
fn test_pool_size() {
    assert_eq!(WorkerPool::new(Some(3)).unwrap().size(), 3);

    let default = WorkerPool::new(None).unwrap();
    assert_eq!(default.size(), WorkerPool::default_size());
    assert!(default.size() >= 1);

    assert_eq!(WorkerPool::new(Some(0)).unwrap().size(), WorkerPool::default_size());
}

#[test]
fn test_runs_on_named_workers() {
    let pool = WorkerPool::new(Some(2)).unwrap();
    let names = pool.map(&[0, 1, 2, 3], |_| {
        thread::current().name().unwrap_or_default().to_string()
    });
    assert!(names.iter().all(|name| name.starts_with("ocr-worker-")));
}

#[test]
fn test_concurrent_batches_share_the_pool() {
    let pool = Arc::new(WorkerPool::new(Some(2)).unwrap());

    let handles: Vec<_> = (0..4u64)
        .map(|batch| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let items: Vec<u64> = (0..16).map(|i| batch * 100 + i).collect();
                let results = pool.map(&items, |&i| {
                    thread::sleep(Duration::from_millis(1));
                    i + 1
                });
                (items, results)
            })
        })
        .collect();

    for handle in handles {
        let (items, results) = handle.join().unwrap();
        assert_eq!(results, items.iter().map(|i| i + 1).collect::<Vec<_>>());
    }
}
