//! Request ingestion.
//!
//! Column requests arrive from the admission stage as signed integers with a validity
//! flag. Ingestion drops entries marked invalid and converts the remaining ones into
//! [`DRAMAddr`]s. Entries with a negative field are rejected one by one; the rest of
//! the batch is still scheduled.

use crate::DRAMAddr;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A pending column read as delivered by the admission stage.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRequest {
    /// Whether this slot of the batch holds a request
    #[serde(default = "valid_by_default")]
    pub valid: bool,
    /// Bank group number
    pub bank_group: i64,
    /// Bank number within the bank group
    pub bank: i64,
    /// Row number
    pub row: i64,
    /// Column number
    pub col: i64,
}

fn valid_by_default() -> bool {
    true
}

impl ColumnRequest {
    /// Creates a valid request.
    pub fn new(bank_group: i64, bank: i64, row: i64, col: i64) -> Self {
        ColumnRequest {
            valid: true,
            bank_group,
            bank,
            row,
            col,
        }
    }

    /// Creates an empty batch slot.
    pub fn invalid() -> Self {
        ColumnRequest {
            valid: false,
            bank_group: 0,
            bank: 0,
            row: 0,
            col: 0,
        }
    }
}

/// Field of a [`ColumnRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RequestField {
    BankGroup,
    Bank,
    Row,
    Col,
}

impl fmt::Display for RequestField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RequestField::BankGroup => write!(f, "bank group"),
            RequestField::Bank => write!(f, "bank"),
            RequestField::Row => write!(f, "row"),
            RequestField::Col => write!(f, "column"),
        }
    }
}

/// Errors raised for individual batch entries during ingestion.
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A request field holds a value that cannot address DRAM.
    #[error("Invalid request at index {index}: {field} is {value}")]
    InvalidRequest {
        /// Position of the entry in the batch
        index: usize,
        /// Offending field
        field: RequestField,
        /// Offending value
        value: i64,
    },
}

impl TryFrom<(usize, &ColumnRequest)> for DRAMAddr {
    type Error = RequestError;

    fn try_from((index, req): (usize, &ColumnRequest)) -> Result<Self, Self::Error> {
        let field = |field: RequestField, value: i64| {
            usize::try_from(value).map_err(|_| RequestError::InvalidRequest {
                index,
                field,
                value,
            })
        };
        Ok(DRAMAddr {
            bank_group: field(RequestField::BankGroup, req.bank_group)?,
            bank: field(RequestField::Bank, req.bank)?,
            row: field(RequestField::Row, req.row)?,
            col: field(RequestField::Col, req.col)?,
        })
    }
}

/// Converts a raw batch into DRAM addresses in arrival order.
///
/// Invalid slots are skipped silently. Malformed entries are skipped and reported in
/// the second element of the returned tuple.
pub fn ingest(batch: &[ColumnRequest]) -> (Vec<DRAMAddr>, Vec<RequestError>) {
    let mut addrs = Vec::with_capacity(batch.len());
    let mut rejected = vec![];
    for (index, req) in batch.iter().enumerate().filter(|(_, r)| r.valid) {
        match DRAMAddr::try_from((index, req)) {
            Ok(addr) => addrs.push(addr),
            Err(e) => {
                warn!("Rejecting request: {}", e);
                rejected.push(e);
            }
        }
    }
    (addrs, rejected)
}

/// Number of batch slots that hold a request.
pub fn valid_count(batch: &[ColumnRequest]) -> usize {
    batch.iter().filter(|r| r.valid).count()
}
