//! ECIES-style encryption of coin secrets
//!
//! Pour transactions transmit `(v, r, rho)` of each new coin to its
//! recipient inside the transaction itself. The construction is a standard
//! hybrid scheme over the Jubjub curve: an ephemeral Diffie-Hellman key
//! encapsulation, a personalized BLAKE2b-256 KDF, and ChaCha20-Poly1305 as
//! the data encapsulation layer. The nonce is all zeros because every
//! ciphertext uses a fresh ephemeral key.
//!
//! Ciphertext layout: `epk (32) || aead(plaintext)`.

use blake2b_simd::Params as Blake2bParams;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use group::cofactor::CofactorGroup;
use group::ff::Field;
use group::Group;
use jubjub::{AffinePoint, ExtendedPoint, Fr, SubgroupPoint};
use rand::{CryptoRng, RngCore};

use crate::error::{ZerocashError, ZerocashResult};

/// Size of a serialized encryption public key (compressed point).
pub const ENC_PK_SIZE: usize = 32;

/// Size of a serialized decryption key (scalar).
pub const ENC_SK_SIZE: usize = 32;

/// Poly1305 authentication tag size.
const AEAD_TAG_SIZE: usize = 16;

/// Ciphertext size for a plaintext of `plaintext_len` bytes.
pub const fn ciphertext_length(plaintext_len: usize) -> usize {
    ENC_PK_SIZE + plaintext_len + AEAD_TAG_SIZE
}

/// Helper to compress a subgroup point to its affine byte form.
fn point_bytes(point: &SubgroupPoint) -> [u8; ENC_PK_SIZE] {
    let extended: ExtendedPoint = (*point).into();
    AffinePoint::from(extended).to_bytes()
}

/// Parse a compressed point, clearing the cofactor.
fn parse_point(bytes: &[u8; ENC_PK_SIZE]) -> Option<SubgroupPoint> {
    let affine = AffinePoint::from_bytes(*bytes);
    if affine.is_none().into() {
        return None;
    }
    let extended: ExtendedPoint = affine.unwrap().into();
    Some(extended.clear_cofactor())
}

/// Shared-secret KDF: personalized BLAKE2b over `(ss, epk)`.
fn derive_key(shared_secret: &[u8; 32], epk: &[u8; 32]) -> [u8; 32] {
    let hash = Blake2bParams::new()
        .hash_length(32)
        .personal(b"ZerocashECIESKDF")
        .to_state()
        .update(shared_secret)
        .update(epk)
        .finalize();

    let mut key = [0u8; 32];
    key.copy_from_slice(hash.as_bytes());
    key
}

/// Public half of an encryption keypair, carried inside a public address.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionPublicKey([u8; ENC_PK_SIZE]);

impl EncryptionPublicKey {
    pub fn from_bytes(bytes: [u8; ENC_PK_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; ENC_PK_SIZE] {
        self.0
    }

    /// Encrypt `plaintext` under this key with a fresh ephemeral scalar.
    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        plaintext: &[u8],
        rng: &mut R,
    ) -> ZerocashResult<Vec<u8>> {
        let recipient = parse_point(&self.0).ok_or(ZerocashError::Encryption)?;

        let esk = Fr::random(&mut *rng);
        let epk = SubgroupPoint::generator() * esk;
        let epk_bytes = point_bytes(&epk);

        let shared_secret = point_bytes(&(recipient * esk));
        let key = derive_key(&shared_secret, &epk_bytes);

        let cipher =
            ChaCha20Poly1305::new_from_slice(&key).map_err(|_| ZerocashError::Encryption)?;
        let nonce = Nonce::from([0u8; 12]);
        let sealed = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| ZerocashError::Encryption)?;

        let mut ciphertext = Vec::with_capacity(ciphertext_length(plaintext.len()));
        ciphertext.extend_from_slice(&epk_bytes);
        ciphertext.extend_from_slice(&sealed);
        Ok(ciphertext)
    }
}

impl std::fmt::Debug for EncryptionPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncryptionPublicKey")
            .field(&hex::encode(self.0))
            .finish()
    }
}

/// Secret half of an encryption keypair.
#[derive(Clone)]
pub struct EncryptionSecretKey(Fr);

impl EncryptionSecretKey {
    /// Sample a fresh keypair.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(Fr::random(rng))
    }

    /// The matching public key.
    pub fn public_key(&self) -> EncryptionPublicKey {
        EncryptionPublicKey(point_bytes(&(SubgroupPoint::generator() * self.0)))
    }

    pub fn to_bytes(&self) -> [u8; ENC_SK_SIZE] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8; ENC_SK_SIZE]) -> ZerocashResult<Self> {
        let scalar = Fr::from_bytes(bytes);
        if scalar.is_none().into() {
            return Err(ZerocashError::InvalidKey);
        }
        Ok(Self(scalar.unwrap()))
    }

    /// Decrypt a ciphertext produced by [`EncryptionPublicKey::encrypt`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> ZerocashResult<Vec<u8>> {
        if ciphertext.len() < ENC_PK_SIZE + AEAD_TAG_SIZE {
            return Err(ZerocashError::Decryption);
        }

        let mut epk_bytes = [0u8; ENC_PK_SIZE];
        epk_bytes.copy_from_slice(&ciphertext[..ENC_PK_SIZE]);
        let epk = parse_point(&epk_bytes).ok_or(ZerocashError::Decryption)?;

        let shared_secret = point_bytes(&(epk * self.0));
        let key = derive_key(&shared_secret, &epk_bytes);

        let cipher =
            ChaCha20Poly1305::new_from_slice(&key).map_err(|_| ZerocashError::Decryption)?;
        let nonce = Nonce::from([0u8; 12]);
        cipher
            .decrypt(&nonce, &ciphertext[ENC_PK_SIZE..])
            .map_err(|_| ZerocashError::Decryption)
    }
}

impl std::fmt::Debug for EncryptionSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionSecretKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let mut rng = rand::thread_rng();
        let sk = EncryptionSecretKey::random(&mut rng);
        let pk = sk.public_key();

        let plaintext = b"pour coin secrets";
        let ciphertext = pk.encrypt(plaintext, &mut rng).unwrap();

        assert_eq!(ciphertext.len(), ciphertext_length(plaintext.len()));
        assert_eq!(sk.decrypt(&ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let mut rng = rand::thread_rng();
        let sk = EncryptionSecretKey::random(&mut rng);
        let other = EncryptionSecretKey::random(&mut rng);

        let ciphertext = sk.public_key().encrypt(b"secret", &mut rng).unwrap();
        assert!(other.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let mut rng = rand::thread_rng();
        let sk = EncryptionSecretKey::random(&mut rng);

        let mut ciphertext = sk.public_key().encrypt(b"secret", &mut rng).unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;
        assert!(sk.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn test_key_serialization_roundtrip() {
        let mut rng = rand::thread_rng();
        let sk = EncryptionSecretKey::random(&mut rng);

        let restored = EncryptionSecretKey::from_bytes(&sk.to_bytes()).unwrap();
        assert_eq!(restored.public_key(), sk.public_key());
    }
}
