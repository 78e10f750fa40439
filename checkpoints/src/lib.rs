//! Historical voting-power accounting.
//!
//! Every balance change appends a checkpoint to the affected account's
//! power history; queries answer "what was X's power as of point T" for any
//! finalized point via binary search. The same snapshot discipline covers
//! the global total, so quorum denominators and individual weights are
//! always computed against a consistent historical state.
//!
//! Checkpoint histories are a monotone structure, not a cache: entries are
//! never evicted or compacted.

pub mod error;
pub mod history;
pub mod ledger;

pub use error::CheckpointError;
pub use history::{Checkpoint, CheckpointHistory};
pub use ledger::{PowerLedger, PowerLedgerSnapshot};
