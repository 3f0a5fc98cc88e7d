//! Dispatch worker loop.
//!
//! # Responsibilities
//! - Drain the queue in bounded batches
//! - Select a healthy analyzer per message and POST the wire envelope
//! - Classify the response and feed the outcome recorder
//!
//! Message failures are isolated: one failing message never aborts its
//! packet, and packet failures never abort the worker loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::dispatch::queue::DispatchQueue;
use crate::dispatch::selector::WeightedSelector;
use crate::error::GatewayError;
use crate::health::recorder::OutcomeRecorder;
use crate::model::{LogMessage, LogPacket};
use crate::observability::metrics;
use crate::registry::{AnalyzerRegistry, AnalyzerSnapshot, OutcomeKind};
use crate::stats::GatewayStats;

/// Shared dependencies and tunables handed to every worker.
#[derive(Clone)]
pub struct DispatchContext {
    pub queue: Arc<DispatchQueue>,
    pub registry: Arc<AnalyzerRegistry>,
    pub selector: Arc<WeightedSelector>,
    pub recorder: Arc<OutcomeRecorder>,
    pub client: reqwest::Client,
    pub stats: Arc<GatewayStats>,
    pub batch_size: usize,
    pub processing_interval: Duration,
    pub send_timeout: Duration,
    pub retry_on_failure: bool,
}

/// Result of one send attempt against one analyzer.
enum SendResult {
    Delivered,
    /// 4xx: the analyzer answered and refused the message. Not a health
    /// signal.
    Rejected,
    /// 5xx, connection failure, or timeout on the named analyzer.
    Failed(String),
    /// No healthy analyzer was available to try.
    NoTarget,
}

/// One queue consumer. Several run concurrently; the queue hands each
/// packet to exactly one of them.
pub struct DispatchWorker {
    id: usize,
    ctx: DispatchContext,
}

impl DispatchWorker {
    pub fn new(id: usize, ctx: DispatchContext) -> Self {
        Self { id, ctx }
    }

    /// Drive the worker until stop is signalled or the queue is closed and
    /// fully drained.
    pub async fn run(self, mut stop: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.ctx.processing_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::debug!(worker = self.id, "Dispatch worker started");

        loop {
            tokio::select! {
                _ = stop.recv() => break,
                _ = self.ctx.queue.notified() => {}
                _ = ticker.tick() => {}
            }

            loop {
                let batch = self.ctx.queue.drain_batch(self.ctx.batch_size);
                if batch.is_empty() {
                    break;
                }
                metrics::record_queue_depth(self.ctx.queue.len());
                for packet in batch {
                    self.process_packet(packet).await;
                }
            }

            if self.ctx.queue.is_closed() && self.ctx.queue.is_empty() {
                break;
            }
        }

        tracing::debug!(worker = self.id, "Dispatch worker stopped");
    }

    /// Attempt every message of the packet, concurrently within the packet,
    /// then account its latency.
    async fn process_packet(&self, packet: LogPacket) {
        let attempts = packet
            .messages
            .iter()
            .map(|message| self.dispatch_message(message));
        futures_util::future::join_all(attempts).await;

        let latency_ms = packet.enqueued_at.elapsed().as_millis() as u64;
        self.ctx.stats.record_packet_processed(latency_ms);
        tracing::debug!(
            packet = %packet.id,
            messages = packet.messages.len(),
            latency_ms,
            "Packet processed"
        );
    }

    async fn dispatch_message(&self, message: &LogMessage) {
        match self.attempt(message, None).await {
            SendResult::Failed(failed_id) if self.ctx.retry_on_failure => {
                // One re-selection excluding the failed analyzer; its
                // outcome is recorded like any other.
                self.attempt(message, Some(&failed_id)).await;
            }
            _ => {}
        }
    }

    /// One select-send-record cycle for a single message.
    async fn attempt(&self, message: &LogMessage, exclude: Option<&str>) -> SendResult {
        let snapshot = self.ctx.registry.snapshot();
        let target = match self.ctx.selector.select_excluding(&snapshot, exclude) {
            Ok(target) => target,
            Err(error) => {
                self.ctx.stats.record_error();
                tracing::warn!(message = %message.id, %error, "Message not dispatched");
                return SendResult::NoTarget;
            }
        };

        let start = Instant::now();
        let (rtt_ms, outcome) = self.send(&target, message).await;

        match outcome {
            Ok(()) => {
                self.ctx
                    .recorder
                    .record_outcome(&target.id, OutcomeKind::Dispatch, true, rtt_ms);
                metrics::record_dispatch(&target.id, "delivered", start);
                SendResult::Delivered
            }
            Err(error @ GatewayError::AnalyzerRejected(_)) => {
                // The analyzer answered promptly, so it counts as alive;
                // the message itself is lost.
                self.ctx
                    .recorder
                    .record_outcome(&target.id, OutcomeKind::Dispatch, true, rtt_ms);
                self.ctx.stats.record_error();
                metrics::record_dispatch(&target.id, "rejected", start);
                tracing::debug!(analyzer = %target.id, message = %message.id, %error, "Analyzer rejected message");
                SendResult::Rejected
            }
            Err(error) => {
                self.ctx
                    .recorder
                    .record_outcome(&target.id, OutcomeKind::Dispatch, false, rtt_ms);
                self.ctx.stats.record_error();
                metrics::record_dispatch(&target.id, "failed", start);
                tracing::warn!(analyzer = %target.id, message = %message.id, %error, "Dispatch failed");
                SendResult::Failed(target.id)
            }
        }
    }

    /// POST the wire envelope to one analyzer and classify the response.
    async fn send(
        &self,
        target: &AnalyzerSnapshot,
        message: &LogMessage,
    ) -> (u64, Result<(), GatewayError>) {
        let start = Instant::now();
        let response = self
            .ctx
            .client
            .post(target.analyze_url())
            .timeout(self.ctx.send_timeout)
            .json(message)
            .send()
            .await;
        let rtt_ms = start.elapsed().as_millis() as u64;

        let outcome = match response {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) if resp.status().is_client_error() => {
                Err(GatewayError::AnalyzerRejected(resp.status().as_u16()))
            }
            Ok(resp) => Err(GatewayError::AnalyzerFailure(format!(
                "status {}",
                resp.status()
            ))),
            Err(error) => Err(GatewayError::AnalyzerFailure(error.to_string())),
        };
        (rtt_ms, outcome)
    }
}
