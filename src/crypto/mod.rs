//! Cryptographic primitives for the zerocash protocol
//!
//! This module provides:
//! - The SHA-256 collision-resistant hash and its domain-separated PRF
//!   call sites (addresses, serial numbers, commitments, MACs)
//! - ECIES-style encryption of coin secrets to recipients
//! - The statement adapter and backend trait for the pour proof system

pub mod ecies;
pub mod hash;
pub mod proof;

pub use ecies::{EncryptionPublicKey, EncryptionSecretKey};
pub use proof::{PourStatement, PourWitness, ProofBackend, SimulationBackend};
