//! Process lifecycle.
//!
//! # Design Decisions
//! - Shutdown is modelled as an explicit cancellation handle passed into
//!   every long-running component, not a process-global flag
//! - OS signals translate to one trigger on the shared handle

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
