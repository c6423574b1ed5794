//! Zerocash core protocol
//!
//! This crate implements the transaction layer of a decentralized anonymous
//! payment scheme over a shared public ledger. Value is carried by *coins*
//! whose contents are hidden behind hash commitments:
//!
//! - A **mint** moves public basecoin value into a fresh commitment and
//!   reveals just enough of the commitment opening to prove it is
//!   well-formed.
//! - A **pour** consumes two prior coins and produces two new ones, proving
//!   under zero knowledge that the consumed coins exist in the commitment
//!   accumulator, that no value was created or destroyed, and that the
//!   spender was authorized — while revealing neither the coins spent nor
//!   the destinations.
//!
//! Published commitments accumulate in an append-only incremental Merkle
//! tree ([`IncrementalMerkleTree`]); a pour proves membership against one of
//! its historical roots (the *anchor*). Double spends are prevented by the
//! unique serial number each pour reveals for every consumed coin.
//!
//! The proving system is deliberately opaque: pours talk to it through the
//! [`ProofBackend`](crypto::proof::ProofBackend) trait, and any zk-SNARK
//! with preprocessed verification keys can be plugged in. The bundled
//! [`SimulationBackend`](crypto::proof::SimulationBackend) checks the pour
//! statement natively and emits keyed digests instead of proofs; it is
//! transparent (not zero knowledge, forgeable by anyone holding the
//! verification key) and exists for development and tests.
//!
//! # Version 0 transactions
//!
//! A pour built with `version == 0` carries a fixed placeholder blob instead
//! of a proof, and [`PourTransaction::verify`] accepts it *unconditionally*.
//! This is a testing shortcut: it lets the transaction layer be exercised
//! without generating proofs. Production validators MUST reject version-0
//! pours before calling `verify`.

#![forbid(unsafe_code)]

pub mod address;
pub mod bits;
pub mod coin;
pub mod commitment_tree;
pub mod crypto;
pub mod error;
pub mod mint;
pub mod params;
pub mod pour;

mod encoding;

pub use address::{Address, PublicAddress};
pub use coin::{Coin, CoinCommitment};
pub use commitment_tree::{IncrementalMerkleTree, IncrementalMerkleTreeCompact};
pub use crypto::proof::{PourStatement, PourWitness, ProofBackend, SimulationBackend};
pub use error::{ZerocashError, ZerocashResult};
pub use mint::MintTransaction;
pub use params::PourParams;
pub use pour::{PourInput, PourOutput, PourTransaction};

/// Size of the private address secret `a_sk` in bytes.
pub const A_SK_SIZE: usize = 32;

/// Size of the public address secret `a_pk` in bytes.
pub const A_PK_SIZE: usize = 32;

/// Size of the serial-number seed `rho` in bytes.
pub const RHO_SIZE: usize = 32;

/// Size of the commitment randomness `r` in bytes.
pub const R_SIZE: usize = 48;

/// Size of a coin value in its big-endian byte form.
pub const V_SIZE: usize = 8;

/// Size of a serial number in bytes.
pub const SN_SIZE: usize = 32;

/// Size of a coin commitment in bytes.
pub const CM_SIZE: usize = 32;

/// Size of a SHA-256 output in bytes.
pub const H_SIZE: usize = 32;

/// Size of a Merkle root in bytes.
pub const ROOT_SIZE: usize = 32;

/// Size of the hash of the enclosing signature key bound by a pour.
pub const SIG_PK_SIZE: usize = 32;

/// Size of the coin-secret plaintext `v || r || rho` transmitted to a
/// pour recipient.
pub const COIN_PLAINTEXT_SIZE: usize = V_SIZE + R_SIZE + RHO_SIZE;

/// Maximum supported depth of the commitment accumulator.
pub const MAX_TREE_DEPTH: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(A_SK_SIZE, 32);
        assert_eq!(A_PK_SIZE, 32);
        assert_eq!(RHO_SIZE, 32);
        assert_eq!(R_SIZE, 48);
        assert_eq!(V_SIZE, 8);
        assert_eq!(COIN_PLAINTEXT_SIZE, 88);
        // The inner commitment layer hashes a_pk || rho as one 512-bit block.
        assert_eq!((A_PK_SIZE + RHO_SIZE) * 8, 512);
        // The serial-number PRF hashes a_sk || tagged rho as one 512-bit block.
        assert_eq!((A_SK_SIZE + RHO_SIZE) * 8, 512);
    }
}
