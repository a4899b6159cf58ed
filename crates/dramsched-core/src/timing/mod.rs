//! DRAM timing constraints.
//!
//! [`TimingParams`] names the spacing rules between device commands, and
//! [`TimingTracker`] turns a channel's command history into the earliest legal
//! issue cycle of the next ACTIVATE, READ or PRECHARGE.

mod params;
mod tracker;

pub use self::params::{ConfigError, Result, TimingParams};
pub(crate) use self::params::Spacing;
pub use self::tracker::TimingTracker;

/// Controller clock cycle.
pub type Cycle = u64;
