//! End-to-end tests driving the in-memory backend through the `Backend`
//! trait, the way the API server does.
//!
//! Covered:
//! 1. Create, run, and wait under a paused clock
//! 2. Attach from a second caller and signal
//! 3. Destroy discarding containers and their processes
//! 4. Concurrent create and destroy of the same handle

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use mirage_common::constants::SIGNALED_EXIT_CODE;
use mirage_common::types::{Capacity, ContainerSpec, ProcessSpec, Signal};
use mirage_runtime::backend::{Backend, InMemoryBackend};

fn backend() -> Arc<dyn Backend> {
    Arc::new(InMemoryBackend::new(Capacity::default(), Duration::from_secs(1)))
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

// ── Process lifecycle ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn scenario_run_waits_for_encoded_duration() {
    let backend = backend();
    let container = backend.create(ContainerSpec::with_handle("box1")).unwrap();
    let process = container
        .run(&ProcessSpec::with_payload(
            r#"{"duration_in_seconds":120,"exit_code":27}"#,
        ))
        .unwrap();

    let waiter = {
        let process = Arc::clone(&process);
        tokio::spawn(async move { process.wait().await })
    };

    settle().await;
    tokio::time::advance(Duration::from_secs(119)).await;
    settle().await;
    assert!(!waiter.is_finished(), "exited before its duration elapsed");

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(waiter.await.unwrap().unwrap(), 27);
}

#[tokio::test(start_paused = true)]
async fn scenario_empty_spec_exits_immediately() {
    let backend = backend();
    let container = backend.create(ContainerSpec::with_handle("box1")).unwrap();
    let start = tokio::time::Instant::now();
    let process = container.run(&ProcessSpec::default()).unwrap();
    assert_eq!(process.wait().await.unwrap(), 0);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn scenario_attach_from_lookup_and_signal() {
    let backend = backend();
    let container = backend.create(ContainerSpec::with_handle("box1")).unwrap();
    let process = container
        .run(&ProcessSpec::with_payload(
            r#"{"duration_in_seconds":3600,"exit_code":0}"#,
        ))
        .unwrap();
    let process_id = process.id().to_string();
    drop(process);

    // A second caller finds the process by handle and id alone.
    let attached = backend.lookup("box1").unwrap().attach(&process_id).unwrap();
    let waiter = {
        let attached = Arc::clone(&attached);
        tokio::spawn(async move { attached.wait().await })
    };
    settle().await;
    attached.signal(Signal::Kill);

    assert_eq!(waiter.await.unwrap().unwrap(), SIGNALED_EXIT_CODE);
    assert_eq!(attached.wait().await.unwrap(), SIGNALED_EXIT_CODE);
}

#[tokio::test(start_paused = true)]
async fn scenario_processes_are_scoped_to_their_container() {
    let backend = backend();
    let one = backend.create(ContainerSpec::with_handle("one")).unwrap();
    let two = backend.create(ContainerSpec::with_handle("two")).unwrap();
    let process = one.run(&ProcessSpec::default()).unwrap();

    assert!(two.attach(process.id().as_str()).unwrap_err().is_not_found());
}

#[tokio::test(start_paused = true)]
async fn scenario_destroy_discards_processes() {
    let backend = backend();
    let container = backend.create(ContainerSpec::with_handle("box1")).unwrap();
    let process_id = container
        .run(&ProcessSpec::with_payload(r#"{"duration_in_seconds":10}"#))
        .unwrap()
        .id()
        .to_string();
    drop(container);

    backend.destroy("box1").unwrap();
    assert!(backend.lookup("box1").unwrap_err().is_not_found());

    let recreated = backend.create(ContainerSpec::with_handle("box1")).unwrap();
    assert!(recreated.attach(&process_id).unwrap_err().is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_waiters_observe_one_exit_code() {
    let backend = backend();
    let container = backend.create(ContainerSpec::with_handle("box1")).unwrap();
    let process = container
        .run(&ProcessSpec::with_payload(
            r#"{"duration_in_seconds":1,"exit_code":13}"#,
        ))
        .unwrap();

    let waiters: Vec<_> = (0..16)
        .map(|_| {
            let process = Arc::clone(&process);
            tokio::spawn(async move { process.wait().await })
        })
        .collect();

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap().unwrap(), 13);
    }
}

// ── Registry concurrency ─────────────────────────────────────────────

#[test]
fn concurrent_create_of_one_handle_has_one_winner() {
    let backend = backend();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let backend = Arc::clone(&backend);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let _ = barrier.wait();
                backend.create(ContainerSpec::with_handle("contested"))
            })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => wins += 1,
            Err(e) => assert!(e.is_already_exists()),
        }
    }
    assert_eq!(wins, 1);
}

#[test]
fn concurrent_destroy_of_one_handle_has_one_winner() {
    let backend = backend();
    let _ = backend.create(ContainerSpec::with_handle("doomed")).unwrap();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let backend = Arc::clone(&backend);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let _ = barrier.wait();
                backend.destroy("doomed")
            })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(()) => wins += 1,
            Err(e) => assert!(e.is_not_found()),
        }
    }
    assert_eq!(wins, 1);
}
