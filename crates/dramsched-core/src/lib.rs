//! # dramsched Core
//!
//! `dramsched-core` is the command-scheduling core of a DRAM memory controller.
//! Given a batch of pending column reads it decides which device commands
//! (ACTIVATE, READ, PRECHARGE) to issue and at which cycle, such that every
//! device timing constraint holds.
//!
//! ## Architecture Overview
//!
//! A batch flows through the following stages:
//!
//! - [`request`] - Ingestion of raw [`ColumnRequest`]s into validated [`DRAMAddr`]s.
//!   Malformed entries are rejected individually with a [`RequestError`].
//!
//! - [`alias`] - The row aliaser. Requests that hit the same row of the same bank
//!   collapse into one [`RowGroup`], so the row is opened only once.
//!
//! - [`bank_queue`] - The bank conflict grouper. Row groups that compete for the same
//!   row buffer are collected into one [`BankQueue`].
//!
//! - [`timing`] - The [`TimingParams`] set and the [`TimingTracker`] which computes the
//!   earliest legal cycle for the next command from the command history.
//!
//! - [`policy::SchedulingPolicy`] - Defines the order in which row groups are
//!   turned into commands. [`policy::InOrder`] is the default.
//!
//! ## Main Components
//!
//! - [`Scheduler`] - Combines timing parameters, batch configuration and a policy and
//!   turns a batch of requests into a [`Schedule`].
//!
//! - [`verify`] module - Independent checker for command streams, useful to validate
//!   schedules produced by any policy.
//!
//! - [`util`] module - Grouping helpers, constants and a seedable RNG.

#![warn(missing_docs)]

pub mod alias;
pub mod bank_queue;
mod command;
mod dram_addr;
pub mod policy;
pub mod request;
mod scheduler;
pub mod timing;
pub mod util;
pub mod verify;

pub use crate::alias::{RowGroup, RowGroupId};
pub use crate::bank_queue::BankQueue;
pub use crate::command::{CommandKind, ScheduledCommand};
pub use crate::dram_addr::DRAMAddr;
pub use crate::request::{ColumnRequest, RequestError};
pub use crate::timing::{Cycle, TimingParams, TimingTracker};

pub use scheduler::{Error, Schedule, Scheduler, SchedulerBuilder};
