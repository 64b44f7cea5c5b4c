//! Plan queue concurrency and admission.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ada::domain::errors::DomainError;
use ada::domain::models::AdmissionPolicy;
use ada::services::PlanQueue;
use tokio::sync::oneshot;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_ceiling_is_never_exceeded() {
    let queue = Arc::new(PlanQueue::new(3, 50, AdmissionPolicy::Block));
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..12 {
        let running = running.clone();
        let peak = peak.clone();
        let job = async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            running.fetch_sub(1, Ordering::SeqCst);
        };
        let queue = queue.clone();
        handles.push(tokio::spawn(async move { queue.run(job).await }));
    }
    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    assert!(peak.load(Ordering::SeqCst) <= 3);
    let status = queue.status();
    assert_eq!(status.completed, 12);
    assert_eq!(status.active, 0);
    assert_eq!(status.queued, 0);
}

#[tokio::test]
async fn test_wait_capacity_bounds_waiters() {
    let queue = Arc::new(PlanQueue::new(1, 1, AdmissionPolicy::Block));
    let (release, gate) = oneshot::channel::<()>();
    let first = queue.submit(async move { gate.await.ok() }).await.unwrap();

    // One waiter fits.
    let waiter = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.run(async { "second" }).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(queue.status().queued, 1);

    // A second waiter does not.
    let err = queue.submit(async {}).await.unwrap_err();
    assert!(matches!(err, DomainError::QueueFull(1)));

    release.send(()).unwrap();
    first.await.unwrap();
    assert_eq!(waiter.await.unwrap().unwrap(), "second");
    assert_eq!(queue.status().queued, 0);
}

#[tokio::test]
async fn test_reject_policy_fails_fast() {
    let queue = PlanQueue::new(2, 10, AdmissionPolicy::Reject);
    let (release_a, gate_a) = oneshot::channel::<()>();
    let (release_b, gate_b) = oneshot::channel::<()>();
    let a = queue.submit(async move { gate_a.await.ok() }).await.unwrap();
    let b = queue.submit(async move { gate_b.await.ok() }).await.unwrap();

    assert_eq!(queue.status().active, 2);
    assert_err!(queue.submit(async {}).await);

    release_a.send(()).unwrap();
    release_b.send(()).unwrap();
    a.await.unwrap();
    b.await.unwrap();
    assert_ok!(queue.run(async {}).await);
}

#[tokio::test]
async fn test_shutdown_drains_then_closes() {
    let queue = Arc::new(PlanQueue::new(2, 10, AdmissionPolicy::Block));
    let finished = Arc::new(AtomicUsize::new(0));
    let handle = {
        let finished = finished.clone();
        queue
            .submit(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap()
    };

    queue.shutdown().await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert!(queue.is_closed());
    assert!(matches!(
        queue.submit(async {}).await.unwrap_err(),
        DomainError::QueueClosed
    ));
    handle.await.unwrap();

    // Repeated shutdown is a no-op.
    queue.shutdown().await;
}

#[tokio::test]
async fn test_panicking_job_releases_its_slot() {
    let queue = PlanQueue::new(1, 10, AdmissionPolicy::Block);
    let handle = queue
        .submit(async {
            panic!("plan blew up");
        })
        .await
        .unwrap();
    assert!(handle.await.unwrap_err().is_panic());

    let status = queue.status();
    assert_eq!(status.active, 0);
    assert_eq!(status.completed, 1);

    // The single slot is free again.
    assert_eq!(queue.run(async { 7 }).await.unwrap(), 7);
    assert_eq!(queue.status().active, 0);
}
