//! # dramsched-bin
//!
//! Command line front end for the DRAM command scheduler.
//!
//! ## Quickstart guide
//!
//! ```sh
//! cargo run --release --bin=schedule -- --batch config/reference-batch.json
//! ```
//!
//! This schedules the reference batch with the reference DDR4 timings in
//! `config/ddr4-reference.json` and prints the aliased batch, the bank queues and the
//! resulting command schedule. Use `--policy interleave` to switch the policy and
//! `--random <n> --seed <seed>` to schedule generated batches instead of a file.
//!
//! ## Modules
//!
//! - `batch`: Loading and generating request batches.
//! - `progress`: Named progress bar styles.
pub mod batch;
pub mod progress;

#[macro_use]
extern crate log;

use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

pub fn init_logging_with_progress() -> anyhow::Result<MultiProgress> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let progress = MultiProgress::new();
    LogWrapper::new(progress.clone(), logger).try_init()?;
    debug!("Logging initialized");
    Ok(progress)
}
