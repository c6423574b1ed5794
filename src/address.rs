//! Addresses and spending authority
//!
//! An [`Address`] binds two secrets: the private address secret `a_sk`
//! (spending authority — serial numbers and MACs are PRF outputs under it)
//! and the ECIES decryption key for coin secrets sent by pours. The
//! [`PublicAddress`] half is what coin senders see: `a_pk = PRF_addr(a_sk)`
//! plus the encryption public key.

use rand::{CryptoRng, RngCore};

use crate::coin::Coin;
use crate::crypto::ecies::{EncryptionPublicKey, EncryptionSecretKey, ENC_PK_SIZE, ENC_SK_SIZE};
use crate::crypto::hash::prf_addr;
use crate::encoding::ByteReader;
use crate::error::{ZerocashError, ZerocashResult};
use crate::{A_PK_SIZE, A_SK_SIZE, COIN_PLAINTEXT_SIZE, RHO_SIZE, R_SIZE, V_SIZE};

/// The public half of an address: where coins are paid.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicAddress {
    a_pk: [u8; A_PK_SIZE],
    enc_pk: EncryptionPublicKey,
}

impl PublicAddress {
    pub fn new(a_pk: [u8; A_PK_SIZE], enc_pk: EncryptionPublicKey) -> Self {
        Self { a_pk, enc_pk }
    }

    /// The public address secret, `a_pk`.
    pub fn address_public(&self) -> &[u8; A_PK_SIZE] {
        &self.a_pk
    }

    /// The key coin secrets are encrypted under.
    pub fn encryption_key(&self) -> &EncryptionPublicKey {
        &self.enc_pk
    }

    /// Fixed-width concatenation: `a_pk || enc_pk`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(A_PK_SIZE + ENC_PK_SIZE);
        out.extend_from_slice(&self.a_pk);
        out.extend_from_slice(&self.enc_pk.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> ZerocashResult<Self> {
        let mut reader = ByteReader::new(bytes, "public address");
        let a_pk = reader.take_array::<A_PK_SIZE>()?;
        let enc_pk = EncryptionPublicKey::from_bytes(reader.take_array::<ENC_PK_SIZE>()?);
        reader.finish()?;
        Ok(Self { a_pk, enc_pk })
    }
}

impl std::fmt::Debug for PublicAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicAddress")
            .field("a_pk", &hex::encode(self.a_pk))
            .field("enc_pk", &self.enc_pk)
            .finish()
    }
}

/// A full address: public half plus both secrets.
#[derive(Clone)]
pub struct Address {
    public: PublicAddress,
    a_sk: [u8; A_SK_SIZE],
    dec_key: EncryptionSecretKey,
}

impl Address {
    /// Sample a fresh address: uniform `a_sk`, fresh encryption keypair,
    /// `a_pk` derived through the address PRF.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut a_sk = [0u8; A_SK_SIZE];
        rng.fill_bytes(&mut a_sk);
        let dec_key = EncryptionSecretKey::random(rng);

        Self {
            public: PublicAddress::new(prf_addr(&a_sk), dec_key.public_key()),
            a_sk,
            dec_key,
        }
    }

    pub fn public_address(&self) -> &PublicAddress {
        &self.public
    }

    /// The private address secret, `a_sk`.
    pub fn address_secret(&self) -> &[u8; A_SK_SIZE] {
        &self.a_sk
    }

    /// Try to decrypt a pour ciphertext addressed to this address and
    /// rebuild the coin it transmits.
    pub fn try_decrypt_coin(&self, ciphertext: &[u8]) -> ZerocashResult<Coin> {
        let plaintext = self.dec_key.decrypt(ciphertext)?;
        if plaintext.len() != COIN_PLAINTEXT_SIZE {
            return Err(ZerocashError::InvalidLength {
                what: "coin plaintext",
                expected: COIN_PLAINTEXT_SIZE,
                actual: plaintext.len(),
            });
        }

        let mut value_bytes = [0u8; V_SIZE];
        value_bytes.copy_from_slice(&plaintext[..V_SIZE]);
        let value = u64::from_be_bytes(value_bytes);
        let mut r = [0u8; R_SIZE];
        r.copy_from_slice(&plaintext[V_SIZE..V_SIZE + R_SIZE]);
        let mut rho = [0u8; RHO_SIZE];
        rho.copy_from_slice(&plaintext[V_SIZE + R_SIZE..]);

        Ok(Coin::from_parts(self.public.clone(), value, rho, r))
    }

    /// Fixed-width concatenation of the secrets: `a_sk || enc_sk`. The
    /// public half is re-derived on load.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(A_SK_SIZE + ENC_SK_SIZE);
        out.extend_from_slice(&self.a_sk);
        out.extend_from_slice(&self.dec_key.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> ZerocashResult<Self> {
        let mut reader = ByteReader::new(bytes, "address");
        let a_sk = reader.take_array::<A_SK_SIZE>()?;
        let dec_key = EncryptionSecretKey::from_bytes(&reader.take_array::<ENC_SK_SIZE>()?)?;
        reader.finish()?;

        Ok(Self {
            public: PublicAddress::new(prf_addr(&a_sk), dec_key.public_key()),
            a_sk,
            dec_key,
        })
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets stay out of logs.
        f.debug_struct("Address")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::prf_addr;

    #[test]
    fn test_a_pk_derivation() {
        let mut rng = rand::thread_rng();
        let address = Address::random(&mut rng);

        assert_eq!(
            address.public_address().address_public(),
            &prf_addr(address.address_secret())
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut rng = rand::thread_rng();
        let address = Address::random(&mut rng);

        let restored = Address::from_bytes(&address.to_bytes()).unwrap();
        assert_eq!(restored.public_address(), address.public_address());
        assert_eq!(restored.address_secret(), address.address_secret());

        let public = PublicAddress::from_bytes(&address.public_address().to_bytes()).unwrap();
        assert_eq!(&public, address.public_address());
    }

    #[test]
    fn test_serialization_rejects_bad_lengths() {
        let mut rng = rand::thread_rng();
        let bytes = Address::random(&mut rng).to_bytes();

        assert!(matches!(
            Address::from_bytes(&bytes[..bytes.len() - 1]),
            Err(ZerocashError::Truncated { .. })
        ));

        let mut extended = bytes;
        extended.push(0);
        assert!(matches!(
            Address::from_bytes(&extended),
            Err(ZerocashError::TrailingGarbage { .. })
        ));
    }

    #[test]
    fn test_addresses_are_distinct() {
        let mut rng = rand::thread_rng();
        let first = Address::random(&mut rng);
        let second = Address::random(&mut rng);
        assert_ne!(first.public_address(), second.public_address());
    }
}
