//! # dramsched
//!
//! Timing-aware DRAM command scheduling. This crate bundles the scheduling core with
//! the optional policy crates.
//!
//! - [`Scheduler`] turns a batch of [`ColumnRequest`]s into a sorted
//!   [`ScheduledCommand`] sequence.
//! - [`policy::InOrder`] is the default policy; enable the `dramsched-interleave`
//!   feature for [`interleave::Interleave`].
//! - [`verify::verify_schedule`] re-checks any command stream against a
//!   [`TimingParams`] set.

pub use dramsched_core::*;

#[cfg(feature = "dramsched-interleave")]
pub use dramsched_interleave as interleave;
