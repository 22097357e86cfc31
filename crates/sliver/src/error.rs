use thiserror::Error;

use crate::annotation::Direction;
use crate::store::lattice::Conflict;

/// Everything that can go wrong while building, evaluating or slicing a program.
///
/// All variants are fatal to the operation that raised them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("demand mismatch: {demand} demanded, found {found}")]
    DemandMismatch { demand: String, found: String },

    #[error("name not found: `{0}`")]
    NameNotFound(String),

    #[error("address collision at {address}: {conflict}")]
    AddressCollision { address: String, conflict: Conflict },

    #[error("incompatible {direction} annotation update on {target}")]
    DirectionViolation { direction: Direction, target: String },

    #[error("primitive `{op}` expects {expected}, found {found}")]
    PrimitiveType {
        op: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("{0}")]
    UserError(String),

    #[error("constructor `{tag}` takes {expected} argument(s), given {found}")]
    ArityMismatch {
        tag: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown constructor `{0}`")]
    UnknownConstructor(String),

    #[error("overlapping clauses: {0}")]
    OverlappingClauses(String),

    #[error("{0} has no value and no way to compute one")]
    Unevaluated(String),

    #[error("unknown revision {0}")]
    UnknownRevision(u32),

    #[error("evaluation exceeded the maximum depth of {0}")]
    DepthExceeded(usize),

    #[error("external identities exhausted: {0}")]
    FreshExhausted(#[from] ulid::MonotonicError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
