/// Default number of request slots in one batch
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Number of most recent ACTIVATE commands covered by the four-activate window
pub const FAW_ACTIVATES: usize = 4;
