use crate::alias::{RowGroup, alias_rows};
use crate::bank_queue::{BankQueue, group_banks};
use crate::policy::{InOrder, SchedulingPolicy};
use crate::request::{ColumnRequest, RequestError, ingest, valid_count};
use crate::timing::{ConfigError, Cycle, TimingParams, TimingTracker};
use crate::util::DEFAULT_BATCH_SIZE;
use crate::{CommandKind, ScheduledCommand};
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Turns batches of column requests into timed DRAM command sequences.
///
/// The `Scheduler` combines a [`TimingParams`] set, a batch capacity, a start cycle and a
/// [`SchedulingPolicy`]. One call processes one batch:
///
/// 1. Capacity check of the batch
/// 2. Ingestion, rejecting malformed entries one by one
/// 3. Row aliasing and bank conflict grouping
/// 4. Command emission by the policy against a [`TimingTracker`]
/// 5. Stable sort of the emitted commands by issue cycle
///
/// # Examples
///
/// Use [`Scheduler::builder()`] to construct a `Scheduler`.
pub struct Scheduler {
    blank: TimingTracker,
    policy: Box<dyn SchedulingPolicy>,
    config: SchedulerConfig,
}

/// Batch parameters of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SchedulerConfig {
    /// Maximum number of valid requests in one batch
    capacity: usize,
    /// Start cycle of [`Scheduler::schedule`]
    start_cycle: Cycle,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BATCH_SIZE,
            start_cycle: 0,
        }
    }
}

/// Errors that reject a whole batch.
#[derive(Debug, Error)]
pub enum Error {
    /// The batch holds more valid requests than the configured capacity.
    #[error("Batch holds {valid} valid requests, capacity is {capacity}")]
    CapacityExceeded {
        /// Number of valid requests in the batch
        valid: usize,
        /// Configured capacity
        capacity: usize,
    },
    /// The timing parameters or the batch configuration are invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

/// Result of scheduling one batch.
#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    /// Commands sorted by issue cycle; ties keep emission order
    pub commands: Vec<ScheduledCommand>,
    /// Batch entries rejected during ingestion
    pub rejected: Vec<RequestError>,
    /// Row groups formed by the aliaser
    pub row_groups: Vec<RowGroup>,
    /// Bank queues formed by the conflict grouper
    pub bank_queues: Vec<BankQueue>,
    /// Policy that produced the commands
    pub policy: &'static str,
    start_cycle: Cycle,
    t_cl: Cycle,
}

impl Schedule {
    /// One past the issue cycle of the last command, or the start cycle for an empty
    /// schedule.
    pub fn makespan(&self) -> Cycle {
        self.commands
            .last()
            .map_or(self.start_cycle, |c| c.issue_cycle.saturating_add(1))
    }

    /// Cycle at which the data burst of the last READ starts.
    pub fn completion_cycle(&self) -> Option<Cycle> {
        self.commands
            .iter()
            .filter(|c| c.kind == CommandKind::Read)
            .map(|c| c.issue_cycle.saturating_add(self.t_cl))
            .max()
    }

    /// Number of commands of `kind`.
    pub fn count(&self, kind: CommandKind) -> usize {
        self.commands.iter().filter(|c| c.kind == kind).count()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "ALIASED BATCH")?;
        for group in &self.row_groups {
            writeln!(f, "{}", group)?;
        }
        writeln!(f, "BANK REQUESTS BATCH")?;
        for (i, queue) in self.bank_queues.iter().enumerate() {
            writeln!(f, "{}: {}", i + 1, queue)?;
        }
        writeln!(f, "SCHEDULE:")?;
        for command in &self.commands {
            writeln!(f, "{}", command)?;
        }
        Ok(())
    }
}

impl Scheduler {
    /// Creates a new Scheduler builder.
    ///
    /// # Returns
    ///
    /// A builder with reference timings, default batch configuration and the
    /// [`InOrder`] policy
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::default()
    }

    /// The timing parameters this scheduler enforces.
    pub fn params(&self) -> &TimingParams {
        self.blank.params()
    }

    /// Name of the configured policy.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Creates a tracker with an empty history for this scheduler's timings.
    ///
    /// Keep one tracker per channel to schedule consecutive batches with
    /// [`schedule_with`](Scheduler::schedule_with).
    pub fn new_tracker(&self) -> TimingTracker {
        self.blank.clone()
    }

    /// Schedules one batch on a fresh channel, starting at the configured start cycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the batch holds more valid requests than
    /// the configured capacity. Malformed entries do not fail the call; they are
    /// reported in [`Schedule::rejected`].
    pub fn schedule(&self, batch: &[ColumnRequest]) -> Result<Schedule, Error> {
        let mut tracker = self.new_tracker();
        self.schedule_with(batch, &mut tracker, self.config.start_cycle)
    }

    /// Schedules one batch against the command history in `tracker`.
    ///
    /// No command issues before `start`. The tracker is only modified if the batch
    /// is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TrackerMismatch`] if `tracker` enforces other timing
    /// parameters than this scheduler, use [`new_tracker`](Scheduler::new_tracker)
    /// to create one. Otherwise see [`schedule`](Scheduler::schedule).
    pub fn schedule_with(
        &self,
        batch: &[ColumnRequest],
        tracker: &mut TimingTracker,
        start: Cycle,
    ) -> Result<Schedule, Error> {
        if tracker.params() != self.params() {
            return Err(ConfigError::TrackerMismatch.into());
        }
        let valid = valid_count(batch);
        if valid > self.config.capacity {
            return Err(Error::CapacityExceeded {
                valid,
                capacity: self.config.capacity,
            });
        }

        let (addrs, rejected) = ingest(batch);
        let row_groups = alias_rows(&addrs);
        let bank_queues = group_banks(&row_groups);
        debug!(
            "{} requests aliased into {} row groups in {} banks",
            addrs.len(),
            row_groups.len(),
            bank_queues.len()
        );

        let mut commands =
            self.policy
                .schedule(&row_groups, &bank_queues, tracker, start);
        // stable: equal cycles keep emission order
        commands.sort_by_key(|c| c.issue_cycle);

        let schedule = Schedule {
            commands,
            rejected,
            row_groups,
            bank_queues,
            policy: self.policy.name(),
            start_cycle: start,
            t_cl: self.params().t_cl.unsigned_abs(),
        };
        info!(
            "Scheduled {} commands ({} ACT, {} RD, {} PRE) with {} policy, makespan {}",
            schedule.commands.len(),
            schedule.count(CommandKind::Activate),
            schedule.count(CommandKind::Read),
            schedule.count(CommandKind::Precharge),
            schedule.policy,
            schedule.makespan()
        );
        Ok(schedule)
    }
}

/// Builder for [`Scheduler`].
pub struct SchedulerBuilder {
    params: TimingParams,
    policy: Box<dyn SchedulingPolicy>,
    config: SchedulerConfig,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        SchedulerBuilder {
            params: TimingParams::default(),
            policy: Box::new(InOrder),
            config: SchedulerConfig::default(),
        }
    }
}

impl SchedulerBuilder {
    /// Sets the timing parameters.
    pub fn params(mut self, params: TimingParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the scheduling policy.
    pub fn policy(mut self, policy: impl SchedulingPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Sets an already boxed scheduling policy.
    pub fn boxed_policy(mut self, policy: Box<dyn SchedulingPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the batch capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Sets the start cycle of [`Scheduler::schedule`].
    pub fn start_cycle(mut self, start_cycle: Cycle) -> Self {
        self.config.start_cycle = start_cycle;
        self
    }

    /// Validates the configuration and builds the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a timing parameter is invalid or the
    /// capacity is zero.
    pub fn build(self) -> Result<Scheduler, Error> {
        if self.config.capacity == 0 {
            return Err(ConfigError::ZeroCapacity.into());
        }
        Ok(Scheduler {
            blank: TimingTracker::new(self.params)?,
            policy: self.policy,
            config: self.config,
        })
    }
}
