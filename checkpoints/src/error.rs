use covenant_types::SequencePoint;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("cannot query point {queried}: not finalized (current point is {current})")]
    FutureQuery {
        queried: SequencePoint,
        current: SequencePoint,
    },

    #[error("power arithmetic overflow")]
    Overflow,
}
