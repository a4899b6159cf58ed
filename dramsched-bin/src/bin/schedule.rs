use std::{
    fs::File,
    io::{BufWriter, Write},
};

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use dramsched_bin::batch::{Geometry, load_batches, random_batch};
use dramsched_bin::init_logging_with_progress;
use dramsched_bin::progress::NamedProgress;
use dramsched_core::policy::{InOrder, SchedulingPolicy};
use dramsched_core::util::Rng;
use dramsched_core::verify::verify_schedule;
use dramsched_core::{ColumnRequest, Cycle, Schedule, Scheduler, TimingParams};
use dramsched_interleave::Interleave;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
enum Policy {
    InOrder,
    Interleave,
}

impl Policy {
    fn boxed(self) -> Box<dyn SchedulingPolicy> {
        match self {
            Policy::InOrder => Box::new(InOrder),
            Policy::Interleave => Box::new(Interleave),
        }
    }
}

/// CLI arguments for the `schedule` binary.
///
/// Schedules one or more request batches on a single DRAM channel. Consecutive batches
/// share the channel's command history; each batch starts at the makespan of the
/// previous one.
#[derive(Debug, Parser, Serialize, Clone)]
struct CliArgs {
    /// The timing parameter file.
    #[clap(long = "timing", default_value = "config/ddr4-reference.json")]
    timing: String,
    /// The batch file: one batch or a list of batches.
    #[clap(long = "batch", default_value = "config/reference-batch.json")]
    batch: String,
    /// Maximum number of valid requests per batch.
    #[clap(long = "capacity", default_value = "5")]
    capacity: usize,
    /// Cycle at which the first batch may start.
    #[clap(long = "start-cycle", default_value = "0")]
    start_cycle: Cycle,
    /// The scheduling policy.
    #[clap(long = "policy", value_enum, default_value = "in-order")]
    policy: Policy,
    /// Schedule this many random batches instead of reading the batch file.
    #[clap(long = "random")]
    random: Option<usize>,
    /// Seed for random batches.
    #[clap(long = "seed", default_value = "0")]
    seed: u64,
    /// Re-check every schedule against the timing parameters.
    #[clap(long = "verify")]
    verify: bool,
    /// Output file for results (JSON format).
    #[clap(long = "output")]
    output: Option<String>,
    /// Print every schedule.
    #[clap(long = "verbose", short = 'v')]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct BatchResult {
    batch: usize,
    schedule: Option<Schedule>,
    verified: Option<bool>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScheduleReport {
    /// RFC 3339 timestamp of the run
    date: String,
    args: CliArgs,
    timing: TimingParams,
    seed: Option<u64>,
    scheduled_batches: usize,
    failed_batches: usize,
    total_commands: usize,
    makespan: Cycle,
    batches: Vec<BatchResult>,
}

impl ScheduleReport {
    fn new(args: CliArgs, timing: TimingParams, seed: Option<u64>) -> Self {
        Self {
            date: chrono::Local::now().to_rfc3339(),
            makespan: args.start_cycle,
            args,
            timing,
            seed,
            scheduled_batches: 0,
            failed_batches: 0,
            total_commands: 0,
            batches: Vec::new(),
        }
    }

    fn add_batch(&mut self, result: BatchResult) {
        match &result.schedule {
            Some(schedule) => {
                self.scheduled_batches += 1;
                self.total_commands += schedule.commands.len();
                self.makespan = schedule.makespan();
            }
            None => self.failed_batches += 1,
        }
        self.batches.push(result);
    }

    fn save_to_file(&self, filename: &str) -> Result<()> {
        let file = File::create(filename)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!("Results saved to {}", filename);
        Ok(())
    }
}

fn read_batches(args: &CliArgs) -> Result<(Vec<Vec<ColumnRequest>>, Option<u64>)> {
    match args.random {
        Some(count) => {
            let mut rng = Rng::from_seed(args.seed);
            info!("Generating {} random batches with seed {}", count, rng.seed());
            let batches = (0..count)
                .map(|_| random_batch(&mut rng, args.capacity, Geometry::default()))
                .collect();
            Ok((batches, Some(args.seed)))
        }
        None => Ok((load_batches(&args.batch)?, None)),
    }
}

fn main() -> Result<()> {
    let progress = init_logging_with_progress()?;

    let args = CliArgs::parse();
    info!("CLI args: {:?}", args);

    let timing = TimingParams::from_jsonfile(&args.timing)?;
    let (batches, seed) = read_batches(&args)?;
    if batches.is_empty() {
        bail!("No batches to schedule");
    }

    let scheduler = Scheduler::builder()
        .params(timing)
        .capacity(args.capacity)
        .boxed_policy(args.policy.boxed())
        .build()?;
    // one tracker for the whole channel
    let mut tracker = scheduler.new_tracker();
    let mut report = ScheduleReport::new(args.clone(), timing, seed);

    let p = progress.add(ProgressBar::new(batches.len() as u64));
    p.set_style(ProgressStyle::named_bar("Batches"));
    for (index, batch) in batches.iter().enumerate() {
        let result = match scheduler.schedule_with(batch, &mut tracker, report.makespan) {
            Ok(schedule) => {
                for rejected in &schedule.rejected {
                    warn!("Batch {}: {}", index, rejected);
                }
                let verified = args.verify.then(|| {
                    match verify_schedule(&schedule.commands, &timing) {
                        Ok(()) => true,
                        Err(e) => {
                            warn!("Batch {}: schedule violates timing: {}", index, e);
                            false
                        }
                    }
                });
                if args.verbose || batches.len() == 1 {
                    progress.suspend(|| print!("{}", schedule));
                }
                BatchResult {
                    batch: index,
                    schedule: Some(schedule),
                    verified,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Batch {} rejected: {}", index, e);
                BatchResult {
                    batch: index,
                    schedule: None,
                    verified: None,
                    error: Some(e.to_string()),
                }
            }
        };
        report.add_batch(result);
        p.inc(1);
    }
    p.finish_and_clear();

    if let Some(output_file) = &args.output {
        report.save_to_file(output_file)?;
    }

    info!("=== SCHEDULE SUMMARY ===");
    info!("Policy: {}", scheduler.policy_name());
    info!(
        "Scheduled batches: {}/{}",
        report.scheduled_batches,
        batches.len()
    );
    info!("Total commands: {}", report.total_commands);
    info!("Makespan: {} cycles", report.makespan);
    let failed_checks = report
        .batches
        .iter()
        .filter(|b| b.verified == Some(false))
        .count();
    if failed_checks > 0 {
        bail!("{} schedules failed verification", failed_checks);
    }
    Ok(())
}
