//! Error types for the zerocash protocol layer
//!
//! Construction operations fail fast with a categorized error. Transaction
//! `verify` methods never propagate errors: every failure collapses into a
//! `false` verdict so that verifiers stay robust against hostile input.

use thiserror::Error;

/// Errors that can occur while building or decoding protocol objects
#[derive(Error, Debug)]
pub enum ZerocashError {
    #[error("wrong length for {what}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("a pour consumes at most two coins")]
    TooManyInputs,

    #[error("a pour produces at most two coins")]
    TooManyOutputs,

    #[error("tree depth {0} is outside the supported range")]
    TreeDepthOutOfRange(usize),

    #[error("commitment tree is full")]
    TreeFull,

    #[error("no leaf was inserted at index {0}")]
    LeafNotPresent(u64),

    #[error("witness for leaf {0} was discarded by pruning")]
    WitnessPruned(u64),

    #[error("unexpected end of input while reading {what}")]
    Truncated { what: &'static str },

    #[error("{extra} trailing bytes after deserialization")]
    TrailingGarbage { extra: usize },

    #[error("proof blob is malformed")]
    MalformedProof,

    #[error("key encoding is invalid")]
    InvalidKey,

    #[error("proving key is not loaded")]
    ParamsNotLoaded,

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed")]
    Decryption,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ZerocashResult<T> = Result<T, ZerocashError>;
