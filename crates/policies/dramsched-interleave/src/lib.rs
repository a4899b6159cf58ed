//! Bank-interleaving scheduling policy.
//!
//! This crate provides a policy that serves bank queues round-robin at row group
//! granularity instead of draining one bank before moving to the next. While one bank
//! waits for tRAS/tRP, another bank can already be activated, which shortens the
//! makespan of batches that touch several banks.
//!
//! Implements the [`dramsched_core::policy::SchedulingPolicy`] trait.
//!
//! # Use Cases
//!
//! - Batches spread over many banks
//! - Comparing makespans against the in-order baseline

#![warn(missing_docs)]

mod interleave;

pub use interleave::Interleave;
