//! Mint transactions
//!
//! A mint moves publicly visible basecoin value into the shielded pool. It
//! publishes the new coin's commitment together with the value, the inner
//! commitment layer `k` and the outer randomness `s`, which is exactly
//! enough for anyone to recompute the outer commitment and check that `cm`
//! really commits to `v_public` — without learning the recipient, who hides
//! behind `k`.

use crate::coin::{Coin, CoinCommitment};
use crate::crypto::hash::commitment_outer;
use crate::encoding::ByteReader;
use crate::error::ZerocashResult;
use crate::{CM_SIZE, H_SIZE, R_SIZE};

/// A mint: value entering the shielded pool.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MintTransaction {
    commitment: CoinCommitment,
    value: u64,
    inner_commitment: [u8; H_SIZE],
    randomness: [u8; R_SIZE],
}

impl MintTransaction {
    /// Mint `coin`, revealing its value and commitment opening layers.
    pub fn new(coin: &Coin) -> Self {
        Self {
            commitment: *coin.commitment(),
            value: coin.value(),
            inner_commitment: coin.inner_commitment(),
            randomness: *coin.randomness(),
        }
    }

    /// Check that the published commitment opens to the published value.
    pub fn verify(&self) -> bool {
        commitment_outer(&self.inner_commitment, self.value) == self.commitment.to_bytes()
    }

    pub fn commitment(&self) -> &CoinCommitment {
        &self.commitment
    }

    /// The publicly revealed value entering the pool.
    pub fn public_value(&self) -> u64 {
        self.value
    }

    /// The inner commitment layer `k`.
    pub fn inner_commitment(&self) -> &[u8; H_SIZE] {
        &self.inner_commitment
    }

    /// The outer randomness `s`.
    pub fn randomness(&self) -> &[u8; R_SIZE] {
        &self.randomness
    }

    /// Fixed-width concatenation: `cm || v || k || s`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CM_SIZE + 8 + H_SIZE + R_SIZE);
        out.extend_from_slice(&self.commitment.to_bytes());
        out.extend_from_slice(&self.value.to_be_bytes());
        out.extend_from_slice(&self.inner_commitment);
        out.extend_from_slice(&self.randomness);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> ZerocashResult<Self> {
        let mut reader = ByteReader::new(bytes, "mint transaction");
        let commitment = CoinCommitment::from_bytes(reader.take_array::<CM_SIZE>()?);
        let value = reader.take_u64_be()?;
        let inner_commitment = reader.take_array::<H_SIZE>()?;
        let randomness = reader.take_array::<R_SIZE>()?;
        reader.finish()?;

        Ok(Self {
            commitment,
            value,
            inner_commitment,
            randomness,
        })
    }
}
