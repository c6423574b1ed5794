//! Coins and coin commitments
//!
//! A coin is the unit of shielded value: a recipient address, a 64-bit
//! value, the serial-number seed `rho` and the commitment randomness `r`.
//! Its commitment `cm` is the only part that ever appears on the ledger;
//! `cm` is a deterministic function of the coin's contents, so two coins
//! with the same fields commit identically.

use rand::{CryptoRng, RngCore};

use crate::address::PublicAddress;
use crate::crypto::ecies::{EncryptionPublicKey, ENC_PK_SIZE};
use crate::crypto::hash::{commitment_inner, commitment_outer};
use crate::encoding::ByteReader;
use crate::error::ZerocashResult;
use crate::{A_PK_SIZE, CM_SIZE, RHO_SIZE, R_SIZE};

/// A hiding, binding commitment to a coin's contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoinCommitment([u8; CM_SIZE]);

impl CoinCommitment {
    pub fn from_bytes(bytes: [u8; CM_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; CM_SIZE] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; CM_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for CoinCommitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CoinCommitment")
            .field(&hex::encode(self.0))
            .finish()
    }
}

/// A value-bearing coin.
#[derive(Clone)]
pub struct Coin {
    pub_addr: PublicAddress,
    value: u64,
    rho: [u8; RHO_SIZE],
    r: [u8; R_SIZE],
    commitment: CoinCommitment,
}

impl Coin {
    /// Create a coin paid to `pub_addr` with fresh uniform `rho` and `r`.
    pub fn random<R: RngCore + CryptoRng>(
        pub_addr: &PublicAddress,
        value: u64,
        rng: &mut R,
    ) -> Self {
        let mut rho = [0u8; RHO_SIZE];
        rng.fill_bytes(&mut rho);
        let mut r = [0u8; R_SIZE];
        rng.fill_bytes(&mut r);
        Self::from_parts(pub_addr.clone(), value, rho, r)
    }

    /// Rebuild a coin from its opening; the commitment is recomputed, never
    /// trusted from the wire.
    pub fn from_parts(
        pub_addr: PublicAddress,
        value: u64,
        rho: [u8; RHO_SIZE],
        r: [u8; R_SIZE],
    ) -> Self {
        let k = commitment_inner(pub_addr.address_public(), &rho);
        let commitment = CoinCommitment(commitment_outer(&k, value));
        Self {
            pub_addr,
            value,
            rho,
            r,
            commitment,
        }
    }

    pub fn public_address(&self) -> &PublicAddress {
        &self.pub_addr
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// The serial-number seed.
    pub fn rho(&self) -> &[u8; RHO_SIZE] {
        &self.rho
    }

    /// The commitment randomness.
    pub fn randomness(&self) -> &[u8; R_SIZE] {
        &self.r
    }

    pub fn commitment(&self) -> &CoinCommitment {
        &self.commitment
    }

    /// The inner commitment layer `k`, revealed by mint transactions.
    pub fn inner_commitment(&self) -> [u8; CM_SIZE] {
        commitment_inner(self.pub_addr.address_public(), &self.rho)
    }

    /// Fixed-width concatenation: `a_pk || enc_pk || v || rho || r`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(A_PK_SIZE + ENC_PK_SIZE + 8 + RHO_SIZE + R_SIZE);
        out.extend_from_slice(&self.pub_addr.to_bytes());
        out.extend_from_slice(&self.value.to_be_bytes());
        out.extend_from_slice(&self.rho);
        out.extend_from_slice(&self.r);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> ZerocashResult<Self> {
        let mut reader = ByteReader::new(bytes, "coin");
        let a_pk = reader.take_array::<A_PK_SIZE>()?;
        let enc_pk = reader.take_array::<ENC_PK_SIZE>()?;
        let value = reader.take_u64_be()?;
        let rho = reader.take_array::<RHO_SIZE>()?;
        let r = reader.take_array::<R_SIZE>()?;
        reader.finish()?;

        let pub_addr = PublicAddress::new(a_pk, EncryptionPublicKey::from_bytes(enc_pk));
        Ok(Self::from_parts(pub_addr, value, rho, r))
    }
}

impl std::fmt::Debug for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // rho and r open the commitment; keep them out of logs.
        f.debug_struct("Coin")
            .field("value", &self.value)
            .field("commitment", &self.commitment)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    #[test]
    fn test_commitment_is_deterministic() {
        let mut rng = rand::thread_rng();
        let address = Address::random(&mut rng);
        let coin = Coin::random(address.public_address(), 42, &mut rng);

        let rebuilt = Coin::from_parts(
            coin.public_address().clone(),
            coin.value(),
            *coin.rho(),
            *coin.randomness(),
        );
        assert_eq!(rebuilt.commitment(), coin.commitment());
    }

    #[test]
    fn test_commitment_binds_value() {
        let mut rng = rand::thread_rng();
        let address = Address::random(&mut rng);
        let coin = Coin::random(address.public_address(), 1, &mut rng);

        let other = Coin::from_parts(
            coin.public_address().clone(),
            2,
            *coin.rho(),
            *coin.randomness(),
        );
        assert_ne!(other.commitment(), coin.commitment());
    }

    #[test]
    fn test_fresh_coins_have_distinct_commitments() {
        let mut rng = rand::thread_rng();
        let address = Address::random(&mut rng);

        let first = Coin::random(address.public_address(), 7, &mut rng);
        let second = Coin::random(address.public_address(), 7, &mut rng);
        assert_ne!(first.commitment(), second.commitment());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut rng = rand::thread_rng();
        let address = Address::random(&mut rng);
        let coin = Coin::random(address.public_address(), 9000, &mut rng);

        let restored = Coin::from_bytes(&coin.to_bytes()).unwrap();
        assert_eq!(restored.value(), coin.value());
        assert_eq!(restored.commitment(), coin.commitment());
        assert_eq!(restored.public_address(), coin.public_address());
    }
}
