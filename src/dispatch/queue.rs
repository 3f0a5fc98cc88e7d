//! Bounded dispatch queue.
//!
//! # Responsibilities
//! - Buffer accepted packets in FIFO order up to a fixed capacity
//! - Reject, never block, when saturated (the backpressure contract)
//! - Wake a worker on enqueue; hand out batches without blocking
//!
//! Ingress handlers must never wait on the queue; the rejection path is
//! the whole point of the bound.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

use crate::error::GatewayError;
use crate::model::LogPacket;

/// Bounded FIFO of pending packets, shared by ingress handlers (producers)
/// and dispatch workers (consumers).
#[derive(Debug)]
pub struct DispatchQueue {
    packets: Mutex<VecDeque<LogPacket>>,
    capacity: usize,
    closed: AtomicBool,
    notify: Notify,
}

impl DispatchQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            packets: Mutex::new(VecDeque::new()),
            capacity,
            closed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Accept a packet, or reject it when the queue is saturated or closed.
    pub fn try_enqueue(&self, packet: LogPacket) -> Result<(), GatewayError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::Shutdown);
        }
        {
            let mut packets = self.packets.lock().expect("queue lock poisoned");
            if packets.len() >= self.capacity {
                return Err(GatewayError::QueueFull {
                    capacity: self.capacity,
                });
            }
            packets.push_back(packet);
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Remove up to `max_n` packets in FIFO order. Never blocks.
    pub fn drain_batch(&self, max_n: usize) -> Vec<LogPacket> {
        let mut packets = self.packets.lock().expect("queue lock poisoned");
        let n = max_n.min(packets.len());
        packets.drain(..n).collect()
    }

    /// Remove everything still queued; used at shutdown grace expiry.
    pub fn drain_remaining(&self) -> Vec<LogPacket> {
        let mut packets = self.packets.lock().expect("queue lock poisoned");
        packets.drain(..).collect()
    }

    /// Wait until an enqueue signals new work.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Stop accepting new packets. Already-queued packets remain drainable.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // Wake idle workers so they observe the closed flag.
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.packets.lock().expect("queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogLevel, LogMessage};
    use std::time::Instant;

    fn packet(id: &str) -> LogPacket {
        LogPacket {
            id: id.to_string(),
            agent_id: None,
            messages: vec![LogMessage {
                id: format!("{id}-m0"),
                timestamp: chrono::Utc::now(),
                level: LogLevel::Info,
                source: "test".to_string(),
                message: "hello".to_string(),
                metadata: None,
            }],
            enqueued_at: Instant::now(),
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = DispatchQueue::new(10);
        queue.try_enqueue(packet("p1")).unwrap();
        queue.try_enqueue(packet("p2")).unwrap();
        queue.try_enqueue(packet("p3")).unwrap();

        let batch = queue.drain_batch(2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, "p1");
        assert_eq!(batch[1].id, "p2");

        let rest = queue.drain_batch(10);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, "p3");
        assert!(queue.drain_batch(10).is_empty());
    }

    #[test]
    fn test_rejects_at_capacity() {
        let queue = DispatchQueue::new(2);
        queue.try_enqueue(packet("p1")).unwrap();
        queue.try_enqueue(packet("p2")).unwrap();

        let err = queue.try_enqueue(packet("p3")).unwrap_err();
        assert!(matches!(err, GatewayError::QueueFull { capacity: 2 }));
        assert_eq!(queue.len(), 2);

        // Draining one slot makes room again.
        queue.drain_batch(1);
        assert!(queue.try_enqueue(packet("p4")).is_ok());
    }

    #[test]
    fn test_closed_queue_rejects_but_drains() {
        let queue = DispatchQueue::new(10);
        queue.try_enqueue(packet("p1")).unwrap();
        queue.close();

        assert!(matches!(
            queue.try_enqueue(packet("p2")),
            Err(GatewayError::Shutdown)
        ));
        assert_eq!(queue.drain_remaining().len(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_wakes_waiter() {
        let queue = std::sync::Arc::new(DispatchQueue::new(10));
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue.notified().await;
                queue.drain_batch(1).len()
            })
        };
        tokio::task::yield_now().await;

        queue.try_enqueue(packet("p1")).unwrap();
        let drained = tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(drained, 1);
    }
}
