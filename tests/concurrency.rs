#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Concurrent queue behavior under contention: nothing lost, nothing
//! duplicated, and waiters wake as pushes arrive.

use netframe::ConcurrentQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn no_items_lost_or_duplicated_under_contention() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 3;
    const PER_PRODUCER: usize = 2_500;
    const TOTAL: usize = PRODUCERS * PER_PRODUCER;

    let queue = Arc::new(ConcurrentQueue::new());
    let drained = Arc::new(AtomicUsize::new(0));
    let collected = Arc::new(Mutex::new(Vec::with_capacity(TOTAL)));

    let mut producers = Vec::new();
    for producer in 0..PRODUCERS {
        let queue = Arc::clone(&queue);
        producers.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                queue.push_back(producer * PER_PRODUCER + i);
            }
        }));
    }

    let mut consumers = Vec::new();
    for _ in 0..CONSUMERS {
        let queue = Arc::clone(&queue);
        let drained = Arc::clone(&drained);
        let collected = Arc::clone(&collected);
        consumers.push(thread::spawn(move || loop {
            if drained.load(Ordering::SeqCst) >= TOTAL {
                break;
            }
            match queue.pop_front() {
                Some(item) => {
                    drained.fetch_add(1, Ordering::SeqCst);
                    collected.lock().unwrap().push(item);
                }
                None => thread::sleep(Duration::from_millis(1)),
            }
        }));
    }

    for handle in producers {
        handle.join().unwrap();
    }
    for handle in consumers {
        handle.join().unwrap();
    }

    let mut items = collected.lock().unwrap().clone();
    items.sort_unstable();
    assert_eq!(items.len(), TOTAL);
    // Sorted and exactly 0..TOTAL means every item arrived exactly once
    assert!(items.iter().enumerate().all(|(i, item)| i == *item));
    assert!(queue.is_empty());
}

#[test]
fn wait_blocks_until_a_push_arrives() {
    let queue = Arc::new(ConcurrentQueue::new());

    let waiter = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            queue.wait();
            queue.pop_front()
        })
    };

    // Give the waiter time to actually block
    thread::sleep(Duration::from_millis(100));
    queue.push_back(42);

    assert_eq!(waiter.join().unwrap(), Some(42));
}

#[test]
fn each_push_wakes_one_waiter() {
    let queue = Arc::new(ConcurrentQueue::<u32>::new());

    let mut waiters = Vec::new();
    for _ in 0..2 {
        let queue = Arc::clone(&queue);
        waiters.push(thread::spawn(move || loop {
            queue.wait();
            if let Some(item) = queue.pop_front() {
                return item;
            }
            // Another waiter won the race for this push; block again
        }));
    }

    thread::sleep(Duration::from_millis(50));
    queue.push_back(1);
    thread::sleep(Duration::from_millis(50));
    queue.push_back(2);

    let mut items: Vec<u32> = waiters
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    items.sort_unstable();
    assert_eq!(items, vec![1, 2]);
}

#[test]
fn front_and_back_operations_interleave_safely() {
    let queue = Arc::new(ConcurrentQueue::new());
    let front_pusher = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..1_000 {
                queue.push_front(i);
            }
        })
    };
    let back_pusher = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 1_000..2_000 {
                queue.push_back(i);
            }
        })
    };
    front_pusher.join().unwrap();
    back_pusher.join().unwrap();

    let mut items = Vec::new();
    while let Some(item) = queue.pop_back() {
        items.push(item);
    }
    items.sort_unstable();
    assert_eq!(items.len(), 2_000);
    assert!(items.iter().enumerate().all(|(i, item)| i == *item));
}
