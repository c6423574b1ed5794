//! Protocol parameters: the pour proving and verification keys
//!
//! A [`PourParams`] bundles the preprocessed keys of a proof backend with
//! the tree depth they were generated for. Provers need the full set;
//! verifiers can run with the verification key alone. Keys are read-only
//! after construction and may be shared by reference across parallel
//! verifiers.
//!
//! Files written here contain the backend's own canonical key encoding
//! with no additional framing.

use std::fs;
use std::path::Path;

use rand::{CryptoRng, RngCore};

use crate::crypto::proof::ProofBackend;
use crate::error::{ZerocashError, ZerocashResult};

pub struct PourParams<B: ProofBackend> {
    tree_depth: usize,
    proving_key: Option<B::ProvingKey>,
    verification_key: B::VerificationKey,
}

impl<B: ProofBackend> PourParams<B> {
    /// Generate a fresh keypair for trees of the given depth.
    pub fn generate<R: RngCore + CryptoRng>(
        tree_depth: usize,
        rng: &mut R,
    ) -> ZerocashResult<Self> {
        let (proving_key, verification_key) = B::generate_keypair(tree_depth, rng)?;
        Ok(Self {
            tree_depth,
            proving_key: Some(proving_key),
            verification_key,
        })
    }

    /// Wrap existing keys.
    pub fn from_keypair(
        tree_depth: usize,
        proving_key: B::ProvingKey,
        verification_key: B::VerificationKey,
    ) -> Self {
        Self {
            tree_depth,
            proving_key: Some(proving_key),
            verification_key,
        }
    }

    /// Verifier-side parameters: no proving key, proofs cannot be created.
    pub fn verifier_only(tree_depth: usize, verification_key: B::VerificationKey) -> Self {
        Self {
            tree_depth,
            proving_key: None,
            verification_key,
        }
    }

    /// Load both keys from their files.
    pub fn load(
        tree_depth: usize,
        proving_key_path: impl AsRef<Path>,
        verification_key_path: impl AsRef<Path>,
    ) -> ZerocashResult<Self> {
        let proving_key = B::deserialize_proving_key(&fs::read(proving_key_path)?)?;
        let verification_key =
            B::deserialize_verification_key(&fs::read(verification_key_path)?)?;
        Ok(Self::from_keypair(tree_depth, proving_key, verification_key))
    }

    pub fn tree_depth(&self) -> usize {
        self.tree_depth
    }

    pub fn proving_key(&self) -> ZerocashResult<&B::ProvingKey> {
        self.proving_key.as_ref().ok_or(ZerocashError::ParamsNotLoaded)
    }

    pub fn verification_key(&self) -> &B::VerificationKey {
        &self.verification_key
    }

    pub fn save_proving_key(&self, path: impl AsRef<Path>) -> ZerocashResult<()> {
        let key = self.proving_key()?;
        fs::write(path, B::serialize_proving_key(key)?)?;
        Ok(())
    }

    pub fn save_verification_key(&self, path: impl AsRef<Path>) -> ZerocashResult<()> {
        fs::write(path, B::serialize_verification_key(&self.verification_key)?)?;
        Ok(())
    }
}
