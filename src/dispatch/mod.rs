//! Dispatch engine.
//!
//! # Data Flow
//! ```text
//! Ingress packet → queue.rs (bounded FIFO, rejection on saturation)
//!     → worker.rs (drain in bounded batches)
//!     → selector.rs (weighted pick among healthy analyzers)
//!     → HTTP POST {endpoint}/analyze
//!     → outcome recorded into the health state machine
//! ```
//!
//! # Design Decisions
//! - The queue is the only place flow control is exercised; once a packet
//!   is accepted the gateway attempts delivery of every message in it
//! - Workers wake on enqueue signal or a short tick, whichever is first
//! - Message failures are isolated; a packet counts processed once every
//!   message has been attempted

pub mod queue;
pub mod selector;
pub mod worker;

pub use queue::DispatchQueue;
pub use selector::WeightedSelector;
pub use worker::DispatchWorker;
