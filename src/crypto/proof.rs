//! Statement adapter for the pour proof system
//!
//! The proving system is an external collaborator: pours hand it a
//! [`PourStatement`] (the public inputs published on the ledger) and a
//! [`PourWitness`] (the spender's secrets) and get back an opaque proof
//! blob. Any zk-SNARK with sound non-interactive verification under a
//! preprocessed key can implement [`ProofBackend`]; the transaction types
//! never name a concrete backend.
//!
//! The bundled [`SimulationBackend`] stands in for a real prover during
//! development and tests. At proving time it checks the statement natively
//! — commitment openings, Merkle membership, serial/MAC derivation, value
//! conservation — and emits a blob of digests keyed by a secret shared
//! between the proving and verification keys. It is **transparent**:
//! holding the verification key is enough to forge, and nothing is zero
//! knowledge. Do not deploy it.

use borsh::{BorshDeserialize, BorshSerialize};
use log::debug;
use rand::{CryptoRng, RngCore};

use crate::address::Address;
use crate::coin::Coin;
use crate::commitment_tree::verify_witness;
use crate::crypto::hash::{crh, prf_addr, prf_mac, prf_sn};
use crate::error::{ZerocashError, ZerocashResult};
use crate::{CM_SIZE, H_SIZE, ROOT_SIZE, SN_SIZE};

/// Public inputs of the pour statement, exactly as published.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PourStatement {
    pub anchor: [u8; ROOT_SIZE],
    pub serials: [[u8; SN_SIZE]; 2],
    pub new_commitments: [[u8; CM_SIZE]; 2],
    pub public_in_value: u64,
    pub public_out_value: u64,
    pub h_sig: [u8; H_SIZE],
    pub macs: [[u8; H_SIZE]; 2],
}

impl PourStatement {
    /// Canonical fixed-width encoding, the binding target for proofs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ROOT_SIZE + 2 * SN_SIZE + 2 * CM_SIZE + 16 + 3 * H_SIZE);
        out.extend_from_slice(&self.anchor);
        out.extend_from_slice(&self.serials[0]);
        out.extend_from_slice(&self.serials[1]);
        out.extend_from_slice(&self.new_commitments[0]);
        out.extend_from_slice(&self.new_commitments[1]);
        out.extend_from_slice(&self.public_in_value.to_be_bytes());
        out.extend_from_slice(&self.public_out_value.to_be_bytes());
        out.extend_from_slice(&self.h_sig);
        out.extend_from_slice(&self.macs[0]);
        out.extend_from_slice(&self.macs[1]);
        out
    }
}

/// The spender-side secrets the statement quantifies over.
#[derive(Clone)]
pub struct PourWitness {
    pub old_coins: [Coin; 2],
    pub old_addresses: [Address; 2],
    pub merkle_indices: [u64; 2],
    pub paths: [Vec<[u8; H_SIZE]>; 2],
    pub new_coins: [Coin; 2],
}

/// Capability set a proving system must offer to back pour transactions.
///
/// `verify` must be deterministic. Key types own their canonical encoding;
/// the serialization functions add no framing of their own.
pub trait ProofBackend {
    type ProvingKey;
    type VerificationKey;

    /// Preprocess keys for a circuit over trees of the given depth.
    fn generate_keypair<R: RngCore + CryptoRng>(
        tree_depth: usize,
        rng: &mut R,
    ) -> ZerocashResult<(Self::ProvingKey, Self::VerificationKey)>;

    /// Produce a proof for `statement` from `witness`.
    ///
    /// A witness that does not satisfy the statement yields a blob that
    /// will fail verification, not an error — the behavior of a SNARK
    /// prover run on an unsatisfiable assignment.
    fn prove(
        proving_key: &Self::ProvingKey,
        statement: &PourStatement,
        witness: &PourWitness,
    ) -> ZerocashResult<Vec<u8>>;

    /// Check a proof against the public inputs.
    fn verify(
        verification_key: &Self::VerificationKey,
        statement: &PourStatement,
        proof: &[u8],
    ) -> ZerocashResult<bool>;

    fn serialize_proving_key(key: &Self::ProvingKey) -> ZerocashResult<Vec<u8>>;
    fn deserialize_proving_key(bytes: &[u8]) -> ZerocashResult<Self::ProvingKey>;
    fn serialize_verification_key(key: &Self::VerificationKey) -> ZerocashResult<Vec<u8>>;
    fn deserialize_verification_key(bytes: &[u8]) -> ZerocashResult<Self::VerificationKey>;
}

/// Size of a simulation proof blob.
pub const SIMULATION_PROOF_SIZE: usize = 192;

/// Domain byte folded into satisfied proofs.
const STATEMENT_HOLDS: u8 = 0x01;
/// Domain byte folded into proofs of unsatisfiable assignments.
const STATEMENT_BROKEN: u8 = 0x00;

/// Proving key of the simulation backend.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
pub struct SimulationProvingKey {
    tree_depth: u32,
    binding_secret: [u8; 32],
}

/// Verification key of the simulation backend.
///
/// Shares the binding secret with the proving key; that is what makes the
/// scheme transparent and simulation-only.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
pub struct SimulationVerificationKey {
    tree_depth: u32,
    binding_secret: [u8; 32],
}

/// Native-checking stand-in for a zk-SNARK. See the module docs for the
/// security caveats.
pub struct SimulationBackend;

impl SimulationBackend {
    /// The keyed digest chain standing in for a proof.
    fn binding_blob(secret: &[u8; 32], domain: u8, statement: &PourStatement) -> Vec<u8> {
        let mut seed_input = Vec::with_capacity(33 + 272);
        seed_input.extend_from_slice(secret);
        seed_input.push(domain);
        seed_input.extend_from_slice(&statement.to_bytes());
        let seed = crh(&seed_input);

        let mut blob = Vec::with_capacity(SIMULATION_PROOF_SIZE);
        let mut block_input = [0u8; 33];
        block_input[..32].copy_from_slice(&seed);
        for counter in 0..(SIMULATION_PROOF_SIZE / 32) as u8 {
            block_input[32] = counter;
            blob.extend_from_slice(&crh(&block_input));
        }
        blob
    }

    /// Native evaluation of the pour statement over the witness.
    fn statement_holds(tree_depth: usize, statement: &PourStatement, witness: &PourWitness) -> bool {
        for j in 0..2 {
            let coin = &witness.old_coins[j];
            let address = &witness.old_addresses[j];
            let a_sk = address.address_secret();

            // The witness address must open the coin's recipient key.
            if coin.public_address() != address.public_address() {
                return false;
            }
            if &prf_addr(a_sk) != coin.public_address().address_public() {
                return false;
            }

            // Membership of the consumed commitment under the anchor.
            // Zero-valued inputs are dummies and carry no membership claim.
            if coin.value() > 0 {
                if witness.paths[j].len() != tree_depth {
                    return false;
                }
                if !verify_witness(
                    coin.commitment().as_bytes(),
                    witness.merkle_indices[j],
                    &witness.paths[j],
                    &statement.anchor,
                ) {
                    return false;
                }
            }

            if prf_sn(a_sk, coin.rho()) != statement.serials[j] {
                return false;
            }
            if prf_mac(j, a_sk, &statement.h_sig) != statement.macs[j] {
                return false;
            }
            if witness.new_coins[j].commitment().to_bytes() != statement.new_commitments[j] {
                return false;
            }
        }

        // Conservation of value in 64-bit arithmetic, overflow included.
        let consumed = witness.old_coins[0]
            .value()
            .checked_add(witness.old_coins[1].value())
            .and_then(|sum| sum.checked_add(statement.public_in_value));
        let produced = witness.new_coins[0]
            .value()
            .checked_add(witness.new_coins[1].value())
            .and_then(|sum| sum.checked_add(statement.public_out_value));
        matches!((consumed, produced), (Some(lhs), Some(rhs)) if lhs == rhs)
    }
}

impl ProofBackend for SimulationBackend {
    type ProvingKey = SimulationProvingKey;
    type VerificationKey = SimulationVerificationKey;

    fn generate_keypair<R: RngCore + CryptoRng>(
        tree_depth: usize,
        rng: &mut R,
    ) -> ZerocashResult<(Self::ProvingKey, Self::VerificationKey)> {
        let mut binding_secret = [0u8; 32];
        rng.fill_bytes(&mut binding_secret);
        Ok((
            SimulationProvingKey {
                tree_depth: tree_depth as u32,
                binding_secret,
            },
            SimulationVerificationKey {
                tree_depth: tree_depth as u32,
                binding_secret,
            },
        ))
    }

    fn prove(
        proving_key: &Self::ProvingKey,
        statement: &PourStatement,
        witness: &PourWitness,
    ) -> ZerocashResult<Vec<u8>> {
        let satisfied =
            Self::statement_holds(proving_key.tree_depth as usize, statement, witness);
        debug!("simulation pour proof: statement satisfied = {satisfied}");

        let domain = if satisfied {
            STATEMENT_HOLDS
        } else {
            STATEMENT_BROKEN
        };
        Ok(Self::binding_blob(
            &proving_key.binding_secret,
            domain,
            statement,
        ))
    }

    fn verify(
        verification_key: &Self::VerificationKey,
        statement: &PourStatement,
        proof: &[u8],
    ) -> ZerocashResult<bool> {
        if proof.len() != SIMULATION_PROOF_SIZE {
            return Err(ZerocashError::MalformedProof);
        }
        let expected = Self::binding_blob(
            &verification_key.binding_secret,
            STATEMENT_HOLDS,
            statement,
        );
        Ok(proof == expected.as_slice())
    }

    fn serialize_proving_key(key: &Self::ProvingKey) -> ZerocashResult<Vec<u8>> {
        borsh::to_vec(key).map_err(|_| ZerocashError::InvalidKey)
    }

    fn deserialize_proving_key(bytes: &[u8]) -> ZerocashResult<Self::ProvingKey> {
        SimulationProvingKey::try_from_slice(bytes).map_err(|_| ZerocashError::InvalidKey)
    }

    fn serialize_verification_key(key: &Self::VerificationKey) -> ZerocashResult<Vec<u8>> {
        borsh::to_vec(key).map_err(|_| ZerocashError::InvalidKey)
    }

    fn deserialize_verification_key(bytes: &[u8]) -> ZerocashResult<Self::VerificationKey> {
        SimulationVerificationKey::try_from_slice(bytes).map_err(|_| ZerocashError::InvalidKey)
    }
}
