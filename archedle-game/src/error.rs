//! Error types shared across the engine.
use thiserror::Error;

use crate::round::RoundId;

/// Errors surfaced by persistence backends.
///
/// `Conflict` is load-bearing: the round registry, the attempt ledger, and
/// the clue generator all race on first insert and resolve a losing insert by
/// re-reading the winner's row instead of failing the request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(&'static str),
    /// The backend could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by engine operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// Requested mode key is outside the configured set.
    #[error("unknown game mode: {0}")]
    UnknownMode(String),
    /// The student catalog has no rows; the game cannot run without seed data.
    #[error("student catalog is empty")]
    EmptyCatalog,
    /// A round references a student that is missing from the catalog.
    #[error("round {0} has no target student")]
    MissingTarget(RoundId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
