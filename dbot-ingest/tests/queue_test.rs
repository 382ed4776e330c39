//! Integration tests for [`dbot_ingest::IngestQueue`].
//!
//! Covers: FIFO order, requeue to the tail, rejection of envelopes without sender,
//! blocking pop woken by push, and cancellation of a blocked pop.

use std::sync::Arc;
use std::time::Duration;

use dbot_ingest::{Envelope, IngestError, IngestQueue};
use tokio_util::sync::CancellationToken;

fn payloads(queue: &IngestQueue<&'static str>) -> Vec<&'static str> {
    queue.drain_pending().into_iter().map(|e| e.payload).collect()
}

/// **Test: push appends to the tail; pop returns the head.**
#[tokio::test]
async fn test_fifo_order() {
    let queue = IngestQueue::new();
    queue.push(Envelope::new("a", "first")).unwrap();
    queue.push(Envelope::new("b", "second")).unwrap();
    queue.push(Envelope::new("a", "third")).unwrap();

    assert_eq!(queue.len(), 3);
    assert_eq!(queue.pop().await.payload, "first");
    assert_eq!(payloads(&queue), vec!["second", "third"]);
    assert!(queue.is_empty());
}

/// **Test: requeue puts an envelope behind everything already waiting, never at the head.**
#[tokio::test]
async fn test_requeue_goes_to_tail() {
    let queue = IngestQueue::new();
    queue.push(Envelope::new("a", "a1")).unwrap();
    queue.push(Envelope::new("b", "b1")).unwrap();

    let head = queue.pop().await;
    assert_eq!(head.payload, "a1");
    queue.requeue(head);

    assert_eq!(payloads(&queue), vec!["b1", "a1"]);
}

/// **Test: envelopes without a sender id are rejected and never enqueued.**
#[tokio::test]
async fn test_push_rejects_missing_sender() {
    let queue = IngestQueue::new();
    assert_eq!(
        queue.push(Envelope::new("", "x")),
        Err(IngestError::MissingSender)
    );
    assert_eq!(
        queue.push(Envelope::new("   ", "y")),
        Err(IngestError::MissingSender)
    );
    assert!(queue.is_empty());
}

/// **Test: pop suspends on an empty queue and resumes when a producer pushes.**
#[tokio::test]
async fn test_pop_waits_for_push() {
    let queue = Arc::new(IngestQueue::new());
    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.pop().await.payload })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!consumer.is_finished());

    queue.push(Envelope::new("u1", "late")).unwrap();
    let payload = tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .expect("pop should wake up")
        .unwrap();
    assert_eq!(payload, "late");
}

/// **Test: many producers pushing concurrently lose nothing.**
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers() {
    let queue = Arc::new(IngestQueue::new());
    let mut producers = Vec::new();
    for p in 0..8 {
        let queue = Arc::clone(&queue);
        producers.push(tokio::spawn(async move {
            for i in 0..100 {
                queue
                    .push(Envelope::new(format!("sender-{}", p), i))
                    .unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }
    assert_eq!(queue.len(), 800);
}

/// **Test: cancelling while blocked in pop returns None without removing anything.**
#[tokio::test]
async fn test_pop_or_cancel_on_empty_queue() {
    let queue: Arc<IngestQueue<&'static str>> = Arc::new(IngestQueue::new());
    let token = CancellationToken::new();
    let waiter = {
        let queue = Arc::clone(&queue);
        let token = token.clone();
        tokio::spawn(async move { queue.pop_or_cancel(&token).await.map(|e| e.payload) })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("cancelled pop should return")
        .unwrap();
    assert!(result.is_none());
}

/// **Test: a cancelled token wins over a ready item, and the item stays queued.**
#[tokio::test]
async fn test_pop_or_cancel_keeps_items() {
    let queue = IngestQueue::new();
    queue.push(Envelope::new("u1", "kept")).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    assert!(queue.pop_or_cancel(&token).await.is_none());
    assert_eq!(queue.len(), 1);
}
