use std::fs::File;
use std::io::BufReader;

use dramsched_core::ColumnRequest;
use dramsched_core::util::Rng;
use rand::Rng as _;
use serde::Deserialize;

/// Contents of a batch file: one batch or a list of batches.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchFile {
    Single(Vec<ColumnRequest>),
    Many(Vec<Vec<ColumnRequest>>),
}

impl From<BatchFile> for Vec<Vec<ColumnRequest>> {
    fn from(file: BatchFile) -> Self {
        match file {
            BatchFile::Single(batch) => vec![batch],
            BatchFile::Many(batches) => batches,
        }
    }
}

/// Reads the batches stored in a JSON file.
///
/// The file holds either a single array of requests or an array of such arrays.
pub fn load_batches(filepath: &str) -> anyhow::Result<Vec<Vec<ColumnRequest>>> {
    let file = File::open(filepath)?;
    let reader = BufReader::new(file);
    let batches: BatchFile = serde_json::from_reader(reader)?;
    let batches: Vec<Vec<ColumnRequest>> = batches.into();
    info!("Loaded {} batches from {}", batches.len(), filepath);
    Ok(batches)
}

/// Address ranges for generated requests.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub bank_groups: i64,
    pub banks: i64,
    pub rows: i64,
    pub columns: i64,
}

impl Default for Geometry {
    /// Small DDR4-like channel. Few rows per bank so generated batches hit
    /// repeated rows and bank conflicts.
    fn default() -> Self {
        Self {
            bank_groups: 4,
            banks: 4,
            rows: 8,
            columns: 16,
        }
    }
}

/// Generates a batch of `size` valid requests spread over `geometry`.
pub fn random_batch(rng: &mut Rng, size: usize, geometry: Geometry) -> Vec<ColumnRequest> {
    (0..size)
        .map(|_| {
            ColumnRequest::new(
                rng.random_range(0..geometry.bank_groups),
                rng.random_range(0..geometry.banks),
                rng.random_range(0..geometry.rows),
                rng.random_range(0..geometry.columns),
            )
        })
        .collect()
}
